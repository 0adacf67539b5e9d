//! Spectral-extraction script: one spectrum per observation per
//! contour-binned region, with per-observation blank-sky backgrounds.
//!
//! The `ccd_id` filter comes from the chip-array probe on each cleaned
//! event file, so mixed ACIS-I/ACIS-S samples extract from the right chips.
use crate::cli::StepArgs;
use crate::probe;
use crate::script::{quote_path, ScriptFile};
use anyhow::{anyhow, Result};

pub fn run(args: &StepArgs) -> Result<()> {
    let (store, config) = super::load(&args.root)?;
    let reppro_dir = store.resolve(&config.info.reppro_dir);
    let region_dir = store.resolve(&config.info.region_file_dir);
    let spec_dir = store.resolve(&config.info.spec_file_dir);
    let sex_outreg = region_dir.join("sex_outreg");

    let region_count = super::regions::count_bin_regions(&region_dir.join("outreg"));
    if region_count == 0 {
        return Err(anyhow!(
            "no region files in {} (run the contour-binning script first)",
            region_dir.join("outreg").display()
        ));
    }

    let mut script = ScriptFile::new("extract_spectra.sh");
    for obs_id in super::list_subdirs(&reppro_dir)? {
        let obs_dir = reppro_dir.join(&obs_id);
        let evt = obs_dir.join(format!(
            "acisf{}_clean_evt.fits",
            super::pad_obs_id(&obs_id)
        ));
        let chips = probe::chip_range(&evt);
        if let Some(reason) = chips.fallback_reason() {
            tracing::debug!(%obs_id, ?reason, "chip range defaulted");
        }
        let ccd_filter = chips.value().ccd_filter();

        script.line(format!("echo \"Extracting spectra for {obs_id}\""));
        for i in 0..region_count {
            script.line("punlearn specextract");
            script.line(format!(
                "specextract infile=\"{evt}[ccd_id={ccd_filter}][sky=region({region})]\" \
outroot={outroot} bkgfile={bkg} weight=yes clobber=yes",
                evt = quote_path(&evt),
                region = quote_path(&sex_outreg.join(format!("xaf_{i}_sex.reg"))),
                outroot = quote_path(&spec_dir.join(format!("{obs_id}_reg{i}"))),
                bkg = quote_path(&obs_dir.join(format!("{obs_id}_background_clean.evt"))),
            ));
        }
        script.divider();
    }
    script.mark_complete(store.root(), "extract_spectra");

    let path = script.write_to(&store.resolve(&config.info.script_dir))?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::cli::StepArgs;
    use crate::config::test_support::sample_config;
    use crate::config::ConfigStore;
    use tempfile::TempDir;

    #[test]
    fn spectra_script_crosses_observations_with_regions() {
        let root = TempDir::new().expect("create temp root");
        let store = ConfigStore::new(root.path());
        let config = sample_config();
        store.save(&config).expect("save config");

        let outreg = store.resolve(&config.info.region_file_dir).join("outreg");
        std::fs::create_dir_all(&outreg).expect("create outreg");
        for i in 0..2 {
            std::fs::write(outreg.join(format!("xaf_{i}.reg")), b"").expect("write region");
        }
        let reppro = store.resolve(&config.info.reppro_dir);
        for obs in ["4977", "10434"] {
            std::fs::create_dir_all(reppro.join(obs)).expect("seed obs dir");
        }

        run(&StepArgs {
            root: root.path().to_path_buf(),
        })
        .expect("run spectra");

        let text = std::fs::read_to_string(
            store
                .resolve(&config.info.script_dir)
                .join("extract_spectra.sh"),
        )
        .expect("read script");
        // 2 observations x 2 regions.
        assert_eq!(text.matches("punlearn specextract").count(), 4);
        assert!(text.contains("acisf04977_clean_evt.fits"));
        assert!(text.contains("ccd_id="));
        assert!(text.contains("4977_reg1"));
        assert!(text.trim_end().ends_with("extract_spectra"));
    }

    #[test]
    fn spectra_without_regions_is_an_error() {
        let root = TempDir::new().expect("create temp root");
        let store = ConfigStore::new(root.path());
        store.save(&sample_config()).expect("save config");

        let err = run(&StepArgs {
            root: root.path().to_path_buf(),
        })
        .expect_err("run should fail");
        assert!(err.to_string().contains("contour-binning"), "got {err}");
    }
}
