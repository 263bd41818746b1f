//! Temporary directory trees for unit tests.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::discovery::CONFIG_FILENAME;

/// A scratch directory tree that config files can be dropped into.
pub struct ConfigTree {
    /// Removed on drop.
    root: TempDir,
}

impl ConfigTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates `rel` (and its parents) and returns its absolute path.
    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let dir = self.root.path().join(rel);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes `contents` to `rel/.facet.toml`; an empty `rel` is the root.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let file = self.mkdir(rel).join(CONFIG_FILENAME);
        fs::write(&file, contents).unwrap();
        file
    }
}
