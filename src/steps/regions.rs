//! Region-conversion script: rewrite the contour-bin region files from
//! physical coordinates into celestial ones, one file per bin.
use crate::cli::RegionsArgs;
use crate::script::{quote_path, ScriptFile};
use anyhow::{anyhow, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

pub fn run(args: &RegionsArgs) -> Result<()> {
    let (store, config) = super::load(&args.root)?;
    let region_dir = store.resolve(&config.info.region_file_dir);
    let map_dir = store.resolve(&config.info.map_file_dir);
    let outreg = region_dir.join("outreg");

    let count = match args.count {
        Some(count) => count,
        None => count_bin_regions(&outreg),
    };
    if count == 0 {
        return Err(anyhow!(
            "no region files in {} (run the contour-binning script first)",
            outreg.display()
        ));
    }

    let wcs_image = map_dir.join("scaled_broad_flux_final.fits");
    let sex_outreg = region_dir.join("sex_outreg");

    let mut script = ScriptFile::new("convert_regions.sh");
    script.line(format!("mkdir -p {}", quote_path(&sex_outreg)));
    for i in 0..count {
        script.line("punlearn regphystocel");
        script.line(format!(
            "regphystocel infile={} outfile={} wcsfile={} clobber=yes",
            quote_path(&outreg.join(format!("xaf_{i}.reg"))),
            quote_path(&sex_outreg.join(format!("xaf_{i}_sex.reg"))),
            quote_path(&wcs_image),
        ));
    }
    script.mark_complete(store.root(), "convert_region_coordinates");

    let path = script.write_to(&store.resolve(&config.info.script_dir))?;
    println!("wrote {} ({count} regions)", path.display());
    Ok(())
}

/// Count the `xaf_<n>.reg` files produced by the contour binning.
pub(crate) fn count_bin_regions(outreg: &Path) -> usize {
    let bin_region = Regex::new(r"^xaf_\d+\.reg$").expect("regex for bin region names");
    let Ok(entries) = fs::read_dir(outreg) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| bin_region.is_match(name))
        })
        .count()
}
