//! Human-facing output, generalized from the teacher's `InstallOptions`
//! info/success/warn/debug quartet into something every module can hold a
//! reference to instead of a single command owning it. `log::debug!`/
//! `log::trace!` carry the same events at the diagnostic layer (spec
//! SPEC_FULL.md §5); this is strictly the `colored` terminal summary.

use colored::Colorize;

#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    pub verbose: bool,
    pub quiet: bool,
}

impl Reporter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.cyan());
        }
        log::debug!("{message}");
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.green());
        }
        log::debug!("{message}");
    }

    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message.yellow());
        }
        log::warn!("{message}");
    }

    pub fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{}", message.dimmed());
        }
        log::trace!("{message}");
    }
}
