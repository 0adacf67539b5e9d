//! Pipeline configuration store.
//!
//! `config.json` is the single source of truth shared by every stage. Each
//! subcommand runs as its own short-lived process, so anything that must
//! survive between stages lives in this one document and nowhere else.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File name of the config document inside the pipeline root.
pub const CONFIG_FILE: &str = "config.json";

/// Failures raised by the config store. All of them are fatal for the
/// invoking stage; there is no retry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no pipeline config at {} (run `acispipe setup` first)", .path.display())]
    NotFound { path: PathBuf },

    #[error("pipeline config at {} is not valid JSON", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialize pipeline config")]
    Serialize(#[source] serde_json::Error),

    #[error("{action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The persisted config document: cluster parameters plus stage flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "info_dict")]
    pub info: InfoDict,
    pub flags: BTreeMap<String, bool>,
}

/// Cluster parameters and the derived output layout.
///
/// Directory fields hold normalized paths, either absolute or relative to
/// the pipeline root; readers resolve them through [`ConfigStore::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoDict {
    pub name: String,
    pub sn_per_region: u32,
    pub reg_smoothness: f64,
    pub cluster_directory: String,
    pub parent_directory: String,
    #[serde(default)]
    pub obs_ids: Vec<String>,
    pub reppro_dir: String,
    pub merge_dir: String,
    pub spec_file_dir: String,
    pub region_file_dir: String,
    pub map_file_dir: String,
    pub script_dir: String,
}

/// Durable whole-document store for [`PipelineConfig`].
///
/// Writes replace the full document; the surrounding orchestration runs
/// stages one at a time, so no locking is layered on top.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    /// Create a store rooted at the pipeline root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Return the pipeline root used for path resolution.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `config.json` path inside the root.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Read the config document fresh from disk.
    pub fn load(&self) -> Result<PipelineConfig, ConfigError> {
        let path = self.config_path();
        let bytes = fs::read(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound { path: path.clone() }
            } else {
                ConfigError::Io {
                    action: "read",
                    path: path.clone(),
                    source,
                }
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Corrupt { path, source })
    }

    /// Persist the full document, replacing any previous content.
    ///
    /// The write goes to a temp file first and is renamed into place so an
    /// interrupted save never leaves a truncated document behind.
    pub fn save(&self, config: &PipelineConfig) -> Result<(), ConfigError> {
        let path = self.config_path();
        let text = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        let tmp = self.root.join(format!(".{CONFIG_FILE}.tmp"));
        fs::write(&tmp, text.as_bytes()).map_err(|source| ConfigError::Io {
            action: "write",
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| ConfigError::Io {
            action: "replace",
            path,
            source,
        })?;
        Ok(())
    }

    /// Resolve a config-stored path against the pipeline root.
    ///
    /// Absolute paths are returned unchanged; relative paths are joined to
    /// the root and lexically normalized. This is the one path-resolution
    /// policy every consumer goes through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            return path.to_path_buf();
        }
        normalize(&self.root.join(path))
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component where possible. No filesystem access.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !matches!(out.components().next_back(), Some(Component::RootDir)) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Render a path for storage in the config document.
pub fn stored_path(path: &Path) -> String {
    normalize(path).to_string_lossy().to_string()
}


#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
