//! Pipeline setup: create or refresh the config document and output layout.
//!
//! Without `--force`, an existing config keeps its cluster parameters and
//! only the derived pieces are rebuilt: the output directories, the
//! observation list, and the flag table (every stage back to pending).
use crate::cli::SetupArgs;
use crate::config::{stored_path, ConfigStore, InfoDict, PipelineConfig};
use crate::flags;
use crate::paths::ClusterPaths;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

pub fn run(args: &SetupArgs) -> Result<()> {
    let store = ConfigStore::new(&args.root);
    let fresh = args.force || !store.config_path().is_file();
    let mut config = if fresh {
        fresh_config(args)?
    } else {
        store.load()?
    };

    let layout = ClusterPaths::new(
        Path::new(&config.info.parent_directory),
        &config.info.name,
        config.info.reg_smoothness,
        config.info.sn_per_region,
    );
    for dir in layout.all_dirs() {
        let resolved = store.resolve(&dir);
        fs::create_dir_all(&resolved)
            .with_context(|| format!("create {}", resolved.display()))?;
    }
    config.info.reppro_dir = stored_path(&layout.reppro_dir());
    config.info.merge_dir = stored_path(&layout.merge_dir());
    config.info.spec_file_dir = stored_path(&layout.spec_file_dir());
    config.info.region_file_dir = stored_path(&layout.region_file_dir());
    config.info.map_file_dir = stored_path(&layout.map_file_dir());
    config.info.script_dir = stored_path(&layout.script_dir());

    config.info.obs_ids = scan_obs_ids(&store.resolve(&config.info.cluster_directory))?;
    config.flags = flags::initial_flags();

    store.save(&config)?;
    tracing::info!(
        cluster = %config.info.name,
        observations = config.info.obs_ids.len(),
        "pipeline configured"
    );
    println!("wrote {}", store.config_path().display());
    Ok(())
}

fn fresh_config(args: &SetupArgs) -> Result<PipelineConfig> {
    let name = required(args.name.clone(), "--name")?;
    let sn_per_region = required(args.sn_per_region, "--sn-per-region")?;
    let reg_smoothness = required(args.smoothness, "--smoothness")?;
    let cluster_dir = required(args.cluster_dir.clone(), "--cluster-dir")?;
    let parent_dir = required(args.parent_dir.clone(), "--parent-dir")?;
    Ok(PipelineConfig {
        info: InfoDict {
            name,
            sn_per_region,
            reg_smoothness,
            cluster_directory: stored_path(&cluster_dir),
            parent_directory: stored_path(&parent_dir),
            obs_ids: Vec::new(),
            reppro_dir: String::new(),
            merge_dir: String::new(),
            spec_file_dir: String::new(),
            region_file_dir: String::new(),
            map_file_dir: String::new(),
            script_dir: String::new(),
        },
        flags: flags::initial_flags(),
    })
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("{flag} is required when creating a new config"))
}

/// Observation ids are the downloaded directory names, first token only.
fn scan_obs_ids(cluster_dir: &Path) -> Result<Vec<String>> {
    let names = super::list_subdirs(cluster_dir)
        .with_context(|| format!("scan observations in {}", cluster_dir.display()))?;
    Ok(names
        .iter()
        .map(|name| {
            name.split_whitespace()
                .next()
                .unwrap_or(name.as_str())
                .to_string()
        })
        .collect())
}
