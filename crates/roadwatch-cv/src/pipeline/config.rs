//! Session configuration

use anyhow::Context;
use roadwatch_core::CountingLine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::sink::EvidenceFormat;

/// Which engines run on each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Counting,
    Violation,
    #[default]
    Combined,
}

impl Mode {
    pub fn counts(&self) -> bool {
        matches!(self, Self::Counting | Self::Combined)
    }

    pub fn associates(&self) -> bool {
        matches!(self, Self::Violation | Self::Combined)
    }
}

/// Main session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: Mode,
    pub counting: CountingConfig,
    pub violation: ViolationConfig,
    pub events: EventConfig,
}

/// Line counter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    pub counts_file: PathBuf,
    /// Initial line as `[x1, y1, x2, y2]`
    pub start_line: CountingLine,
    /// Forget tracks unseen for this many frames; never when unset
    pub max_idle_frames: Option<u64>,
}

/// Violation association configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolationConfig {
    pub evidence_dir: PathBuf,
    pub image_format: EvidenceFormat,
    /// Report each carrier track only once per session
    pub dedup_by_track: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub max_pending: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            counting: CountingConfig::default(),
            violation: ViolationConfig::default(),
            events: EventConfig::default(),
        }
    }
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            counts_file: "vehicle_counts.txt".into(),
            start_line: CountingLine::from_coords(100, 500, 1800, 500),
            max_idle_frames: None,
        }
    }
}

impl Default for ViolationConfig {
    fn default() -> Self {
        Self {
            evidence_dir: "violations_evidence".into(),
            image_format: EvidenceFormat::Jpg,
            dedup_by_track: false,
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { max_pending: 256 }
    }
}

impl SessionConfig {
    /// Configuration for counting only
    pub fn counting_only() -> Self {
        Self {
            mode: Mode::Counting,
            ..Self::default()
        }
    }

    /// Configuration for violation capture only
    pub fn violations_only() -> Self {
        Self {
            mode: Mode::Violation,
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {:?}", path))
    }
}
