//! Finding `.facet.toml` files.
//!
//! Search starts in the working directory and climbs towards the filesystem
//! root, then falls back to `~/.facet.toml`.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::parse::is_root_config;

/// Name of a facet configuration file.
pub const CONFIG_FILENAME: &str = ".facet.toml";

/// Lists the configuration files that apply to `cwd`, nearest first.
///
/// A file with `root = true` ends the climb and also shuts out the global
/// file. The global file appears at most once, even when `cwd` is inside the
/// home directory.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for dir in cwd.ancestors() {
        let candidate = dir.join(CONFIG_FILENAME);
        if !candidate.is_file() {
            continue;
        }
        let stop = is_root_config(&candidate);
        files.push(candidate);
        if stop {
            return files;
        }
    }

    if let Some(global) = global_config_path().filter(|p| p.is_file())
        && !files.contains(&global)
    {
        files.push(global);
    }
    files
}

/// Location of `~/.facet.toml`, if a home directory is known.
pub fn global_config_path() -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    Some(dirs.home_dir().join(CONFIG_FILENAME))
}

/// True when `path` is the global configuration file.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| global == path)
}
