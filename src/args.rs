use crate::adb::{BackendKind, CaptureConfig, CaptureMode, DEFAULT_TARGET, DeviceConfig};
use crate::template_matching::{MatchConfig, MatchMethod, ScaleRange, Suppression};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "android-adb-match",
    version = env!("APP_VERSION_DISPLAY"),
    about = "Find a template image on an Android screen over ADB and optionally tap it"
)]
pub struct Args {
    /// Template image to look for
    pub template: PathBuf,

    /// Minimum confidence (0.0-1.0) for a match
    #[arg(short, long, default_value_t = 0.8)]
    pub threshold: f32,

    #[arg(long, default_value_t = 0.5)]
    pub min_scale: f64,

    #[arg(long, default_value_t = 1.5)]
    pub max_scale: f64,

    #[arg(long, default_value_t = 0.05)]
    pub scale_step: f64,

    /// Report every occurrence instead of the single best one
    #[arg(long)]
    pub all: bool,

    #[arg(long, default_value_t = 10)]
    pub max_results: usize,

    /// Scoring method: ccoeff, ccorr or sqdiff
    #[arg(long, default_value = "ccoeff")]
    pub method: MatchMethod,

    /// Overlap suppression for --all: distance or window
    #[arg(long, default_value = "distance")]
    pub suppression: Suppression,

    /// Save an annotated screenshot to --output
    #[arg(long)]
    pub debug: bool,

    #[arg(short, long, default_value = "debug_match.png")]
    pub output: PathBuf,

    /// TTF/OTF font used to label matches in the debug image
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Tap the center of the best match
    #[arg(long)]
    pub tap: bool,

    /// Print one JSON document instead of text
    #[arg(long)]
    pub json: bool,

    /// Device serial or host:port
    #[arg(long, env = "ADB_DEVICE", default_value = DEFAULT_TARGET)]
    pub device: String,

    #[arg(long, default_value = "adb")]
    pub adb_path: String,

    /// ADB implementation: shell (external adb binary) or rust (adb_client)
    #[arg(long = "impl", env = "ADB_IMPL", default_value = "shell")]
    pub backend: BackendKind,

    /// Screenshot transfer: staged (file + pull) or exec-out (streamed)
    #[arg(long, default_value = "staged")]
    pub capture: CaptureMode,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            threshold: self.threshold,
            scales: ScaleRange::new(self.min_scale, self.max_scale, self.scale_step),
            method: self.method,
            max_results: self.max_results,
            suppression: self.suppression,
        }
    }

    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            target: self.device.clone(),
            adb_path: self.adb_path.clone(),
            backend: self.backend,
            capture: CaptureConfig {
                mode: self.capture,
                ..CaptureConfig::default()
            },
        }
    }
}
