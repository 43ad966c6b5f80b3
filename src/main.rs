use clap::Parser;

mod cli;

use cli::{Cli, Commands};
use regpm::config::Roots;
use regpm::installer::InstallOptions;
use regpm::manifest;
use regpm::reporter::Reporter;
use regpm::{commands, identifier, orchestrator};

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let output = std::env::current_dir().expect("current directory must be readable");
    let roots = Roots::new(output);

    if let Err(err) = run(cli, &roots).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, roots: &Roots) -> regpm::Result<()> {
    match cli.command {
        Commands::Add { spec } => {
            let (name, range) = identifier::parse_spec(&spec)
                .ok_or_else(|| regpm::Error::Usage(format!("invalid package spec '{spec}'")))?;
            manifest::add_dependency(&roots.manifest_path(), name, range)?;
            println!("added {name}@{range} to {}", roots.manifest_path().display());
            Ok(())
        }
        Commands::Install { ignore_scripts, verbose, quiet } => {
            let reporter = Reporter::new(verbose, quiet);
            let options = InstallOptions { ignore_scripts };
            let report = orchestrator::install(roots, options, &reporter).await?;
            reporter.success(&format!(
                "installed {} package(s), removed {} stray director{ies}{reused}",
                report.installed,
                report.removed.len(),
                ies = if report.removed.len() == 1 { "y" } else { "ies" },
                reused = if report.reused_lock { " (reused lock file)" } else { "" },
            ));
            Ok(())
        }
        Commands::Uninstall { quiet, packages } => {
            let reporter = Reporter::new(false, quiet);
            commands::uninstall::run(roots, &packages, &reporter)
        }
        Commands::Run { script, args } => commands::run::run(roots, &script, &args),
        Commands::Audit => commands::audit::run(roots).await,
    }
}
