//! File reading collaborator
//!
//! The index and the file memory cache never touch the filesystem directly;
//! both go through [`FileReader`] so loads are observable and replaceable in
//! tests.

use crate::error::{CodeQueryError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Bounded file access over a snapshot root
pub trait FileReader: Send + Sync {
    /// Read at most `max_bytes` from the start of a file.
    ///
    /// Used for index previews; must never read the whole file.
    fn read_prefix(&self, path: &str, max_bytes: usize) -> Result<String>;

    /// Read the full content of a file
    fn read_full(&self, path: &str) -> Result<String>;
}

/// Filesystem-backed reader rooted at a snapshot directory
pub struct FsReader {
    root: PathBuf,
}

impl FsReader {
    /// Create a reader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Snapshot root this reader resolves paths against
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

fn read_error(path: &str, source: std::io::Error) -> CodeQueryError {
    CodeQueryError::FileRead {
        path: path.to_string(),
        source,
    }
}

impl FileReader for FsReader {
    fn read_prefix(&self, path: &str, max_bytes: usize) -> Result<String> {
        let file = std::fs::File::open(self.resolve(path)).map_err(|e| read_error(path, e))?;
        let mut buf = Vec::with_capacity(max_bytes);
        file.take(max_bytes as u64)
            .read_to_end(&mut buf)
            .map_err(|e| read_error(path, e))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn read_full(&self, path: &str) -> Result<String> {
        let bytes = std::fs::read(self.resolve(path)).map_err(|e| read_error(path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_prefix_bounded() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("big.txt"), "a".repeat(1000)).unwrap();

        let reader = FsReader::new(temp.path());
        let prefix = reader.read_prefix("big.txt", 100).unwrap();
        assert_eq!(prefix.len(), 100);
    }

    #[test]
    fn test_read_prefix_short_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("small.txt"), "hello").unwrap();

        let reader = FsReader::new(temp.path());
        assert_eq!(reader.read_prefix("small.txt", 100).unwrap(), "hello");
    }

    #[test]
    fn test_read_full() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f.rs"), "fn main() {}\n").unwrap();

        let reader = FsReader::new(temp.path());
        assert_eq!(reader.read_full("f.rs").unwrap(), "fn main() {}\n");
    }

    #[test]
    fn test_missing_file_is_file_read_error() {
        let temp = TempDir::new().unwrap();
        let reader = FsReader::new(temp.path());

        let err = reader.read_full("nope.txt").unwrap_err();
        match err {
            CodeQueryError::FileRead { path, .. } => assert_eq!(path, "nope.txt"),
            other => panic!("Expected FileRead, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_lossy_not_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bin.dat"), [0x66, 0x6f, 0xff, 0x6f]).unwrap();

        let reader = FsReader::new(temp.path());
        let content = reader.read_full("bin.dat").unwrap();
        assert!(content.starts_with("fo"));
    }
}
