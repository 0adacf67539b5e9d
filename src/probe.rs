//! Observation-mode and chip-selection probes.
//!
//! Both lookups read one header keyword of an archival file through the
//! external `dmkeypar` tool. A missing tool or missing data never surfaces
//! as an error: the probe resolves to a documented default, and the tagged
//! result records which path was taken so callers and tests can tell an
//! observed value from a fallback.
use crate::config::{ConfigStore, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const DMKEYPAR: &str = "dmkeypar";

/// Telemetry mode of an observation, from the `DATAMODE` header keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsMode {
    Faint,
    Vfaint,
}

impl ObsMode {
    /// Default assumed whenever the mode cannot be observed.
    pub const FALLBACK: ObsMode = ObsMode::Faint;

    /// Whether very-faint background cleaning applies.
    pub fn is_vfaint(self) -> bool {
        matches!(self, ObsMode::Vfaint)
    }
}

/// Active detector chip subset, expressed as a `ccd_id` filter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipRange {
    AcisI,
    AcisS,
}

impl ChipRange {
    /// Default assumed whenever the chip set cannot be observed.
    pub const FALLBACK: ChipRange = ChipRange::AcisI;

    /// The `ccd_id` filter covering this chip subset.
    pub fn ccd_filter(self) -> &'static str {
        match self {
            ChipRange::AcisI => "0:3",
            ChipRange::AcisS => "4:9",
        }
    }
}

/// Why a probe resolved to its default instead of an observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    ToolMissing,
    NoEventFile,
    HeaderUnreadable,
    NoRecognizedChips,
}

/// A probe result that remembers whether the value was observed or defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult<T> {
    Observed(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T: Copy> ProbeResult<T> {
    /// The usable value, observed or defaulted.
    pub fn value(&self) -> T {
        match self {
            ProbeResult::Observed(value) => *value,
            ProbeResult::Fallback { value, .. } => *value,
        }
    }

    /// The fallback reason, when the value was defaulted.
    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            ProbeResult::Observed(_) => None,
            ProbeResult::Fallback { reason, .. } => Some(*reason),
        }
    }
}

/// Look up the telemetry mode for one observation.
///
/// Reads `DATAMODE` from the first archival `*evt2.fits.gz` under the
/// observation's `primary/` directory.
pub fn observation_mode(
    store: &ConfigStore,
    config: &PipelineConfig,
    obs_id: &str,
) -> ProbeResult<ObsMode> {
    if which::which(DMKEYPAR).is_err() {
        return ProbeResult::Fallback {
            value: ObsMode::FALLBACK,
            reason: FallbackReason::ToolMissing,
        };
    }
    let primary = store
        .resolve(&config.info.cluster_directory)
        .join(obs_id)
        .join("primary");
    let Some(evt2) = find_archival_events(&primary) else {
        return ProbeResult::Fallback {
            value: ObsMode::FALLBACK,
            reason: FallbackReason::NoEventFile,
        };
    };
    match read_keyword(&evt2, "DATAMODE") {
        Some(mode) if mode == "VFAINT" => ProbeResult::Observed(ObsMode::Vfaint),
        Some(_) => ProbeResult::Observed(ObsMode::Faint),
        None => ProbeResult::Fallback {
            value: ObsMode::FALLBACK,
            reason: FallbackReason::HeaderUnreadable,
        },
    }
}

/// Pick the chip subset recorded in an event file's `DETNAM` keyword.
pub fn chip_range(evt: &Path) -> ProbeResult<ChipRange> {
    if which::which(DMKEYPAR).is_err() {
        return ProbeResult::Fallback {
            value: ChipRange::FALLBACK,
            reason: FallbackReason::ToolMissing,
        };
    }
    match read_keyword(evt, "DETNAM") {
        Some(detnam) => select_chip_range(&detnam),
        None => ProbeResult::Fallback {
            value: ChipRange::FALLBACK,
            reason: FallbackReason::HeaderUnreadable,
        },
    }
}

/// Choose between the ACIS-I chips {0..3} and the ACIS-S chips {4..9} by
/// which set contributes more active chip ids. A tie keeps ACIS-I.
pub fn select_chip_range(detnam: &str) -> ProbeResult<ChipRange> {
    let mut imaging = 0usize;
    let mut spectroscopy = 0usize;
    for chip in detnam.chars().filter_map(|c| c.to_digit(10)) {
        if chip <= 3 {
            imaging += 1;
        } else {
            spectroscopy += 1;
        }
    }
    if imaging == 0 && spectroscopy == 0 {
        return ProbeResult::Fallback {
            value: ChipRange::FALLBACK,
            reason: FallbackReason::NoRecognizedChips,
        };
    }
    if spectroscopy > imaging {
        ProbeResult::Observed(ChipRange::AcisS)
    } else {
        ProbeResult::Observed(ChipRange::AcisI)
    }
}

/// First archival event file under an observation's `primary/` directory.
fn find_archival_events(primary: &Path) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(primary)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with("evt2.fits.gz"))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Read one header keyword via `dmkeypar <file> <key> echo+`.
fn read_keyword(file: &Path, key: &str) -> Option<String> {
    let output = Command::new(DMKEYPAR)
        .arg(file)
        .arg(key)
        .arg("echo+")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .next()
        .map(|token| token.to_string())
}
