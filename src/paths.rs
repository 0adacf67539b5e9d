//! Typed paths into the cluster output layout.
//!
//! Centralizing layout derivation keeps setup, the config document, and the
//! generated scripts pointing at the same directories as the layout evolves.
use std::path::{Path, PathBuf};

/// Convenience wrapper for the per-cluster output directories.
///
/// The merge directory name encodes the binning parameters so runs with
/// different tunings land side by side instead of overwriting each other.
#[derive(Debug, Clone)]
pub struct ClusterPaths {
    cluster_root: PathBuf,
    merge_name: String,
}

impl ClusterPaths {
    /// Derive the layout from the parent directory and cluster parameters.
    pub fn new(parent_dir: &Path, name: &str, reg_smoothness: f64, sn_per_region: u32) -> Self {
        Self {
            cluster_root: parent_dir.join(name),
            merge_name: format!("merge_{name}_{reg_smoothness}_{sn_per_region}"),
        }
    }

    /// Return the per-cluster root under the parent directory.
    pub fn cluster_root(&self) -> &Path {
        &self.cluster_root
    }

    /// Return the `reprocessed_data/` directory path.
    pub fn reppro_dir(&self) -> PathBuf {
        self.cluster_root.join("reprocessed_data")
    }

    /// Return the parameter-stamped merge directory path.
    pub fn merge_dir(&self) -> PathBuf {
        self.cluster_root.join(&self.merge_name)
    }

    /// Return the `spec_files/` directory path.
    pub fn spec_file_dir(&self) -> PathBuf {
        self.cluster_root.join("spec_files")
    }

    /// Return the `region_files/` directory path.
    pub fn region_file_dir(&self) -> PathBuf {
        self.cluster_root.join("region_files")
    }

    /// Return the `map_files/` directory path.
    pub fn map_file_dir(&self) -> PathBuf {
        self.cluster_root.join("map_files")
    }

    /// Return the `scripts/` directory path for generated shell scripts.
    pub fn script_dir(&self) -> PathBuf {
        self.cluster_root.join("scripts")
    }

    /// Every directory setup must create, in creation order.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.reppro_dir(),
            self.merge_dir(),
            self.spec_file_dir(),
            self.region_file_dir(),
            self.map_file_dir(),
            self.script_dir(),
        ]
    }
}
