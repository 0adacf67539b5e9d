//! Contour-binning script: bin the final map into regions of equal
//! signal-to-noise and export one region file per bin.
//!
//! Binning runs on the cropped map, so the region files come out in that
//! image's physical coordinates; the lower-left corner from `min_xy.reg`
//! anchors them back onto the merged frame.
use crate::cli::StepArgs;
use crate::script::{quote_path, ScriptFile};
use anyhow::Result;

pub fn run(args: &StepArgs) -> Result<()> {
    let (store, config) = super::load(&args.root)?;
    let map_dir = store.resolve(&config.info.map_file_dir);
    let region_dir = store.resolve(&config.info.region_file_dir);

    let bounds = super::crop::read_min_xy(&region_dir.join("min_xy.reg"))?;

    let mut script = ScriptFile::new("contour_binning.sh");
    script.line(format!("cd {}", quote_path(&map_dir)));
    script.line(format!(
        "contbin --sn={} --smoothsn={} --constrainfill --constrainval=2.0 scaled_broad_flux_final.fits",
        config.info.sn_per_region, config.info.reg_smoothness
    ));
    script.line(format!(
        "make_region_files --minx={} --miny={} --bin=1 --outdir={} contbin_binmap.fits",
        bounds.x_min,
        bounds.y_min,
        quote_path(&region_dir.join("outreg"))
    ));
    script.mark_complete(store.root(), "contour_binning");

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
    fn contbin_script_uses_the_binning_parameters_and_crop_corner() {
        let root = TempDir::new().expect("create temp root");
        let store = ConfigStore::new(root.path());
        let config = sample_config();
        store.save(&config).expect("save config");

        let region_dir = store.resolve(&config.info.region_file_dir);
        std::fs::create_dir_all(&region_dir).expect("create region dir");
        std::fs::write(
            region_dir.join("min_xy.reg"),
            "box(4000.0,3000.0,200.0,100.0,0)\n",
        )
        .expect("write min_xy");

        run(&StepArgs {
            root: root.path().to_path_buf(),
        })
        .expect("run contbin");

        let text = std::fs::read_to_string(
            store
                .resolve(&config.info.script_dir)
                .join("contour_binning.sh"),
        )
        .expect("read script");
        assert!(text.contains("--sn=10"));
        assert!(text.contains("--smoothsn=0.1"));
        assert!(text.contains("--minx=3900 --miny=2950"));
        assert!(text.trim_end().ends_with("contour_binning"));
    }
}
