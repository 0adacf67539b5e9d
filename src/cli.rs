//! CLI argument parsing for the reduction pipeline.
//!
//! The CLI is intentionally thin: every subcommand reads the on-disk config
//! fresh, emits one shell script (or flips one flag), and exits, so the same
//! core logic works no matter how the stages are sequenced.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for the reduction pipeline.
///
/// Keeping a single `RootArgs` type makes command routing obvious and avoids
/// hidden defaults in subcommand constructors.
#[derive(Parser, Debug)]
#[command(
    name = "acispipe",
    version,
    about = "Shell-script generator for Chandra ACIS cluster reduction",
    after_help = "Commands:\n  setup      Create or refresh config.json and the output layout\n  reprocess  Emit reprocess.sh (chandra_repro per observation)\n  deflare    Emit deflare_point_sources.sh (source detection + flare filtering)\n  merge      Emit merge_data.sh (merge cleaned event files)\n  fluxmap    Emit flux_maps.sh (high-energy rescaled flux image)\n  crop       Emit crop_data.sh (point-source removal + crop)\n  contbin    Emit contour_binning.sh (contour binning of the final map)\n  regions    Emit convert_regions.sh (physical -> celestial region files)\n  spectra    Emit extract_spectra.sh (per-region spectral extraction)\n  flag       Mark one pipeline stage complete in config.json\n  status     Summarize stage completion\n\nExamples:\n  acispipe setup --name Perseus --sn-per-region 10 --smoothness 0.1 \\\n      --cluster-dir ./cluster_data --parent-dir ./parent\n  acispipe deflare\n  acispipe flag flare_filtered\n  acispipe status --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level pipeline commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or refresh config.json and the output layout
    Setup(SetupArgs),
    /// Emit reprocess.sh: rerun the standard pipeline per observation
    Reprocess(StepArgs),
    /// Emit deflare_point_sources.sh: source detection and flare filtering
    Deflare(StepArgs),
    /// Emit merge_data.sh: merge the cleaned event files
    Merge(StepArgs),
    /// Emit flux_maps.sh: high-energy rescaled flux image
    Fluxmap(StepArgs),
    /// Emit crop_data.sh: point-source removal and crop
    Crop(StepArgs),
    /// Emit contour_binning.sh: contour binning of the final map
    Contbin(StepArgs),
    /// Emit convert_regions.sh: physical to celestial region files
    Regions(RegionsArgs),
    /// Emit extract_spectra.sh: per-region spectral extraction
    Spectra(StepArgs),
    /// Mark one pipeline stage complete in config.json
    Flag(FlagArgs),
    /// Summarize stage completion
    Status(StatusArgs),
}

/// Setup command inputs for creating or refreshing the pipeline config.
#[derive(Parser, Debug)]
#[command(about = "Create or refresh config.json and the output directory layout")]
pub struct SetupArgs {
    /// Pipeline root holding config.json and generated outputs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Cluster name (e.g. Perseus); required unless refreshing an existing config
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Signal-to-noise target per spectral region
    #[arg(long, value_name = "N")]
    pub sn_per_region: Option<u32>,

    /// Smoothness of the contour-binned regions
    #[arg(long, value_name = "F")]
    pub smoothness: Option<f64>,

    /// Directory holding the downloaded observation data
    #[arg(long, value_name = "DIR")]
    pub cluster_dir: Option<PathBuf>,

    /// Parent directory for all pipeline outputs
    #[arg(long, value_name = "DIR")]
    pub parent_dir: Option<PathBuf>,

    /// Discard an existing config.json and start from scratch
    #[arg(long)]
    pub force: bool,
}

/// Shared inputs for the script-generating stage commands.
#[derive(Parser, Debug)]
pub struct StepArgs {
    /// Pipeline root holding config.json and generated outputs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,
}

/// Regions command inputs for the coordinate-conversion script.
#[derive(Parser, Debug)]
#[command(about = "Emit convert_regions.sh for the contour-binned region files")]
pub struct RegionsArgs {
    /// Pipeline root holding config.json and generated outputs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Number of region files to convert (default: count of outreg/xaf_*.reg)
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,
}

/// Flag command inputs for marking a stage complete.
#[derive(Parser, Debug)]
#[command(about = "Mark one pipeline stage complete in config.json")]
pub struct FlagArgs {
    /// Pipeline root holding config.json and generated outputs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Stage flag to set (must already exist in the config)
    #[arg(value_name = "FLAG")]
    pub name: String,
}

/// Status command inputs for summarizing stage completion.
#[derive(Parser, Debug)]
#[command(about = "Summarize stage completion for a pipeline root")]
pub struct StatusArgs {
    /// Pipeline root holding config.json and generated outputs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Emit the full config document as JSON
    #[arg(long)]
    pub json: bool,
}
