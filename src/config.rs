//! Compile-time constants and the `Roots` value threaded through the
//! install pipeline instead of hard-coded relative paths.

use std::path::{Path, PathBuf};

pub const REGISTRY_BASE_URL: &str = "https://registry.npmjs.org";

/// Capacity of each metadata LRU cache (spec §2).
pub const METADATA_CACHE_CAPACITY: usize = 500;

/// How long a cached tarball is trusted without re-validating its checksum.
pub const CACHE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Upper bound on simultaneous tarball downloads during install.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 15;

pub const MANIFEST_FILE: &str = "package.json";
pub const LOCKFILE_FILE: &str = "package-lock.json";
pub const NODE_MODULES_DIR: &str = "node_modules";
pub const CACHE_DIR: &str = ".cache";

/// The three filesystem roots the installer operates under (spec §4.9
/// step 1: "ensure output, module, and cache roots exist"). Kept explicit
/// rather than implied by `std::env::current_dir()` so the whole pipeline
/// is testable against a temporary directory.
#[derive(Debug, Clone)]
pub struct Roots {
    pub output: PathBuf,
    pub module: PathBuf,
    pub cache: PathBuf,
}

impl Roots {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        Self {
            module: output.join(NODE_MODULES_DIR),
            cache: output.join(CACHE_DIR),
            output,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output.join(MANIFEST_FILE)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.output.join(LOCKFILE_FILE)
    }

    pub fn ensure_exist(&self) -> crate::error::Result<()> {
        for dir in [&self.output, &self.module, &self.cache] {
            ensure_dir(dir)?;
        }
        Ok(())
    }
}

fn ensure_dir(path: &Path) -> crate::error::Result<()> {
    use crate::error::IoResultExt;
    std::fs::create_dir_all(path).fs_err(path.display().to_string())
}
