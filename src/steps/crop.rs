//! Crop script: remove point sources from the scaled flux image and crop it
//! to the region of interest.
//!
//! The operator draws `src_0.5-7-nps-noem.reg`, `square.reg`, and
//! `min_xy.reg` by hand before this stage; `min_xy.reg` (physical
//! coordinates) anchors the lower-left corner used by the later binning.
use crate::cli::StepArgs;
use crate::script::{quote_path, ScriptFile};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Lower-left corner and size of the hand-drawn crop box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoxBounds {
    pub(crate) x_min: f64,
    pub(crate) y_min: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Parse the first `box` line of a region file in physical coordinates.
pub(crate) fn read_min_xy(path: &Path) -> Result<BoxBounds> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read region {}", path.display()))?;
    let box_line = text
        .lines()
        .find(|line| line.starts_with("box"))
        .ok_or_else(|| anyhow!("no box region in {}", path.display()))?;

    let number = Regex::new(r"[+-]?\d+(?:\.\d+)?").expect("regex for region numbers");
    let values: Vec<f64> = number
        .find_iter(box_line)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    let &[x_center, y_center, width, height, ..] = values.as_slice() else {
        return Err(anyhow!(
            "box region in {} has fewer than four values",
            path.display()
        ));
    };
    Ok(BoxBounds {
        x_min: x_center - width / 2.0,
        y_min: y_center - height / 2.0,
        width,
        height,
    })
}

pub fn run(args: &StepArgs) -> Result<()> {
    let (store, config) = super::load(&args.root)?;
    let merge_dir = store.resolve(&config.info.merge_dir);
    let region_dir = store.resolve(&config.info.region_file_dir);
    let map_dir = store.resolve(&config.info.map_file_dir);

    let bounds = read_min_xy(&region_dir.join("min_xy.reg"))?;
    tracing::info!(
        x_min = bounds.x_min,
        y_min = bounds.y_min,
        width = bounds.width,
        height = bounds.height,
        "crop box"
    );

    let mut script = ScriptFile::new("crop_data.sh");
    script.line("echo \"Cropping data\"");
    script.line(format!("cd {}", quote_path(&merge_dir)));

    // Remove the extended cluster emission before redetecting point sources.
    script.line(format!(
        "dmcopy \"broad_thresh.img[exclude sky=region({})]\" broad_thresh_noem.img clobber=yes",
        quote_path(&region_dir.join("src_0.5-7-nps-noem.reg"))
    ));
    script.block(&format!(
        "punlearn wavdetect
wavdetect infile=broad_thresh_noem.img \\
psffile=none \\
expfile=broad_thresh.expmap \\
outfile=src_0.5-7.fits \\
scellfile=scell_0.5-7.fits \\
imagefile=imgfile_0.5-7.fits \\
defnbkgfile=nbkg_0.5-7.fits \\
regfile={reg} \\
scales=\"1 2 4 8 16 32\" \\
maxiter=3 sigthresh=5e-6 ellsigma=5.0 clobber=yes",
        reg = quote_path(&region_dir.join("broad_src_0.5-7.reg"))
    ));

    script.line(format!(
        "dmcopy \"scaled_broad_flux.fits[exclude sky=region({})]\" scaled_broad_flux_cropped.fits clobber=yes",
        quote_path(&region_dir.join("broad_src_0.5-7.reg"))
    ));

    // Crop to the hand-drawn square when one exists at generation time.
    let square_reg = region_dir.join("square.reg");
    if square_reg.is_file() {
        script.line(format!(
            "dmcopy \"scaled_broad_flux_cropped.fits[sky=region({})]\" scaled_broad_flux_final.fits clobber=yes",
            quote_path(&square_reg)
        ));
    } else {
        script.line("mv scaled_broad_flux_cropped.fits scaled_broad_flux_final.fits");
    }
    script.line(format!(
        "cp scaled_broad_flux_final.fits {}",
        quote_path(&map_dir.join("scaled_broad_flux_final.fits"))
    ));
    script.mark_complete(store.root(), "remove_point_source");

    let path = script.write_to(&store.resolve(&config.info.script_dir))?;
    println!("wrote {}", path.display());
    Ok(())
}
