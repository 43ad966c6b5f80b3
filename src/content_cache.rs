//! On-disk content cache for downloaded tarballs (spec §4.5, C5).
//!
//! A flat directory under `cacheRoot` holding files named
//! `{name.replace("/","-")}-{exactVersion}.tgz`. Unlike the teacher's
//! `PackageCache`, which hashes `name@version` with SHA-256 into an
//! opaque filename under `~/.rnp/cache`, this filename is predictable —
//! the spec's install-pipeline contract treats the cache's on-disk state
//! as directly observable (S1/S5 in spec §8 assert exact filenames).

use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};
use crate::identifier::cache_safe_name;

pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn tarball_path(&self, name: &str, version: &str) -> PathBuf {
        self.root
            .join(format!("{}-{}.tgz", cache_safe_name(name), version))
    }

    /// Read a cached tarball's raw bytes, or `None` on `ENOENT`.
    pub fn read(&self, name: &str, version: &str) -> Result<Option<Vec<u8>>> {
        let path = self.tarball_path(name, version);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).fs_err(path.display().to_string()),
        }
    }

    /// Write tarball bytes to the cache. Writes to a sibling temp file
    /// first and renames into place so a partial write is never observed
    /// as a valid cache entry (spec §4.5: "atomically enough").
    pub fn write(&self, name: &str, version: &str, data: &[u8]) -> Result<()> {
        let path = self.tarball_path(name, version);
        let tmp_path = path.with_extension("tgz.partial");
        std::fs::write(&tmp_path, data).fs_err(tmp_path.display().to_string())?;
        std::fs::rename(&tmp_path, &path).fs_err(path.display().to_string())?;
        Ok(())
    }

    /// Delete a cached tarball, e.g. after an integrity failure.
    pub fn invalidate(&self, name: &str, version: &str) -> Result<()> {
        let path = self.tarball_path(name, version);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).fs_err(path.display().to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn filename_uses_predictable_naming() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        assert_eq!(
            cache.tarball_path("is-thirteen", "2.0.0"),
            dir.path().join("is-thirteen-2.0.0.tgz")
        );
        assert_eq!(
            cache.tarball_path("@scope/x", "1.0.0"),
            dir.path().join("@scope-x-1.0.0.tgz")
        );
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        cache.write("lodash", "4.17.21", b"tarball-bytes").unwrap();
        assert_eq!(
            cache.read("lodash", "4.17.21").unwrap(),
            Some(b"tarball-bytes".to_vec())
        );
    }

    #[test]
    fn read_missing_entry_is_none() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        assert_eq!(cache.read("lodash", "4.17.21").unwrap(), None);
    }

    #[test]
    fn invalidate_removes_entry() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        cache.write("lodash", "4.17.21", b"data").unwrap();
        cache.invalidate("lodash", "4.17.21").unwrap();
        assert_eq!(cache.read("lodash", "4.17.21").unwrap(), None);
    }

    #[test]
    fn invalidate_missing_entry_is_ok() {
        let dir = tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        assert!(cache.invalidate("lodash", "4.17.21").is_ok());
    }
}
