//! Stage-completion flags.
//!
//! Every generated script invokes `acispipe flag <name>` as its final action,
//! so "which stage has run" is recorded in the same document the stages read.
//! The flag set is fixed when the config is created; unknown names fail
//! without touching the on-disk document.
use crate::cli::FlagArgs;
use crate::config::{ConfigError, ConfigStore};
use std::collections::BTreeMap;
use thiserror::Error;

/// The closed set of stage flags. `xspec_fitting`, `parse_results`, and
/// `maps_created` are flipped by tooling outside this binary; they are
/// registered here so those scripts can report through the same entry point.
pub const STAGE_FLAGS: [&str; 11] = [
    "reprocessed",
    "flare_filtered",
    "merge_data",
    "flux_maps",
    "remove_point_source",
    "contour_binning",
    "convert_region_coordinates",
    "extract_spectra",
    "xspec_fitting",
    "parse_results",
    "maps_created",
];

/// Failures raised by the flag updater.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("unknown stage flag {name:?} (not present in config.json)")]
    Unknown { name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Build the flag table for a fresh config: every stage pending.
pub fn initial_flags() -> BTreeMap<String, bool> {
    STAGE_FLAGS
        .iter()
        .map(|name| (name.to_string(), false))
        .collect()
}

/// Set one stage flag to true and persist the full document.
///
/// The name must already exist in the document's flag table; an unknown name
/// fails before anything is written.
pub fn mark_complete(store: &ConfigStore, name: &str) -> Result<(), FlagError> {
    let mut config = store.load()?;
    match config.flags.get_mut(name) {
        Some(done) => *done = true,
        None => {
            return Err(FlagError::Unknown {
                name: name.to_string(),
            })
        }
    }
    store.save(&config)?;
    Ok(())
}

/// CLI entrypoint for `acispipe flag <name>`.
pub fn run(args: &FlagArgs) -> anyhow::Result<()> {
    let store = ConfigStore::new(&args.root);
    mark_complete(&store, &args.name)?;
    println!("flag {} set", args.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{initial_flags, mark_complete, FlagError};
    use crate::config::test_support::sample_config;
    use crate::config::ConfigStore;
    use tempfile::TempDir;

    #[test]
    fn fresh_flag_table_is_all_pending() {
        let flags = initial_flags();
        assert_eq!(flags.len(), super::STAGE_FLAGS.len());
        assert!(flags.values().all(|done| !done));
    }

    #[test]
    fn mark_complete_flips_exactly_one_flag() {
        let root = TempDir::new().expect("create temp root");
        let store = ConfigStore::new(root.path());
        let config = sample_config();
        store.save(&config).expect("save config");

        mark_complete(&store, "merge_data").expect("mark flag");

        let updated = store.load().expect("reload config");
        assert_eq!(updated.info, config.info);
        for (name, done) in &updated.flags {
            assert_eq!(*done, name == "merge_data", "flag {name}");
        }
    }

    #[test]
    fn unknown_flag_leaves_document_untouched() {
        let root = TempDir::new().expect("create temp root");
        let store = ConfigStore::new(root.path());
        store.save(&sample_config()).expect("save config");
        let before = std::fs::read(store.config_path()).expect("read config");

        let err = mark_complete(&store, "no_such_stage").expect_err("mark should fail");
        assert!(
            matches!(&err, FlagError::Unknown { name } if name == "no_such_stage"),
            "got {err:?}"
        );

        let after = std::fs::read(store.config_path()).expect("reread config");
        assert_eq!(before, after);
    }
}
