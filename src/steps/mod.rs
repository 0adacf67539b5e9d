//! Script-generating pipeline stages.
//!
//! Each stage reads the config fresh from disk, derives absolute paths, and
//! writes one shell script; actually running the scripts (and therefore the
//! ordering between stages) is left to the operator.
pub mod contbin;
pub mod crop;
pub mod deflare;
pub mod fluxmap;
pub mod merge;
pub mod regions;
pub mod reprocess;
pub mod setup;
pub mod spectra;

use crate::config::{ConfigStore, PipelineConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Load the store and a fresh config document for a stage command.
pub(crate) fn load(root: &Path) -> Result<(ConfigStore, PipelineConfig)> {
    let store = ConfigStore::new(root);
    let config = store.load()?;
    Ok((store, config))
}

/// Zero-pad an observation id to the five digits used in archival file names.
pub(crate) fn pad_obs_id(obs_id: &str) -> String {
    format!("{obs_id:0>5}")
}

/// Sorted names of the subdirectories of `dir`.
pub(crate) fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// First file in `dir` whose name contains `needle`, if any.
pub(crate) fn find_file_containing(dir: &Path, needle: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.contains(needle))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}
