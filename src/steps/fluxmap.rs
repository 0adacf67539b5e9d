//! Flux-map script: rescale the merged broad-band flux image so its mean
//! matches the counts image, boosted for the high-energy band.
//!
//! The scale factor depends on pixel statistics of files that exist only
//! after the merge has run, so it is computed inside the generated script
//! rather than at generation time.
use crate::cli::StepArgs;
use crate::script::{quote_path, ScriptFile};
use anyhow::Result;

const HIGH_ENERGY_BOOST: f64 = 2.5;

pub fn run(args: &StepArgs) -> Result<()> {
    let (store, config) = super::load(&args.root)?;
    let merge_dir = store.resolve(&config.info.merge_dir);

    let mut script = ScriptFile::new("flux_maps.sh");
    script.line(format!("cd {}", quote_path(&merge_dir)));
    script.line(format!(
        "echo \"Scaling broad-band flux for {}\"",
        config.info.name
    ));
    script.line("punlearn dmstat");
    script.line("thresh_mean=$(dmstat broad_thresh.img centroid=no | awk '/mean/ {print $2}')");
    script.line("flux_mean=$(dmstat broad_flux.fits centroid=no | awk '/mean/ {print $2}')");
    script.line(format!(
        "scale=$(awk -v t=\"$thresh_mean\" -v f=\"$flux_mean\" 'BEGIN {{print {HIGH_ENERGY_BOOST} * t / f}}')"
    ));
    script.line("punlearn dmimgcalc");
    script.line(
        "dmimgcalc infile=broad_flux.fits infile2=none outfile=scaled_broad_flux.fits \
operation=\"imgout=(img1*$scale)\" clobber=yes",
    );
    script.mark_complete(store.root(), "flux_maps");

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
    fn flux_script_scales_by_mean_ratio_inside_the_script() {
        let root = TempDir::new().expect("create temp root");
        let store = ConfigStore::new(root.path());
        let config = sample_config();
        store.save(&config).expect("save config");

        run(&StepArgs {
            root: root.path().to_path_buf(),
        })
        .expect("run fluxmap");

        let text = std::fs::read_to_string(
            store.resolve(&config.info.script_dir).join("flux_maps.sh"),
        )
        .expect("read script");
        assert!(text.contains("thresh_mean=$(dmstat broad_thresh.img"));
        assert!(text.contains("2.5 * t / f"));
        assert!(text.contains("dmimgcalc infile=broad_flux.fits"));
        assert!(text.trim_end().ends_with("flux_maps"));
    }
}
