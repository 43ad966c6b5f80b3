//! CLI argument surface (spec §6, plus the supplemented commands from
//! SPEC_FULL.md §4).

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "regpm")]
#[command(about = "A minimal npm-registry-compatible package manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a dependency to package.json: `name` or `name@rangeOrTag`.
    Add { spec: String },

    /// Resolve, fetch, and extract every dependency (spec §4.9).
    #[command(visible_alias = "i")]
    Install {
        #[arg(long)]
        ignore_scripts: bool,
        #[arg(short, long)]
        verbose: bool,
        #[arg(short, long)]
        quiet: bool,
    },

    /// Remove one or more packages from the manifest, lock file, and disk.
    Uninstall {
        #[arg(short, long)]
        quiet: bool,
        #[arg(required = true, num_args = 1..)]
        packages: Vec<String>,
    },

    /// Run a `package.json` "scripts" entry.
    Run {
        script: String,
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Query the registry's advisory endpoint for every locked package.
    Audit,
}
