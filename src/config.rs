// src/config.rs - Tracker configuration, persisted as JSON
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TrackingError};
use crate::exercise::{ExerciseDefinition, ExerciseKind, GateThreshold};
use crate::history::{DEFAULT_HISTORY_DEPTH, MIN_HISTORY_DEPTH};
use crate::pose::DEFAULT_CONFIDENCE_THRESHOLD;

const CONFIG_FILE: &str = "config.json";
const DEFAULT_FRAME_RATE: f64 = 20.0;

/// Evaluation rates outside this range are rejected
pub const FRAME_RATE_RANGE: std::ops::RangeInclusive<f64> = 0.1..=240.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub exercise: ExerciseKind,
    pub confidence_threshold: f64,
    /// Display only, never affects angles
    pub mirror: bool,
    pub history_depth: usize,
    /// Target evaluations per second
    pub frame_rate: f64,
    pub knee: ExerciseDefinition,
    pub shoulder: ExerciseDefinition,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            exercise: ExerciseKind::Knee,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            mirror: false,
            history_depth: DEFAULT_HISTORY_DEPTH,
            frame_rate: DEFAULT_FRAME_RATE,
            knee: ExerciseDefinition::knee(),
            shoulder: ExerciseDefinition::shoulder(),
        }
    }
}

impl TrackerConfig {
    pub fn definition(&self, kind: ExerciseKind) -> &ExerciseDefinition {
        match kind {
            ExerciseKind::Knee => &self.knee,
            ExerciseKind::Shoulder => &self.shoulder,
        }
    }

    pub fn definition_mut(&mut self, kind: ExerciseKind) -> &mut ExerciseDefinition {
        match kind {
            ExerciseKind::Knee => &mut self.knee,
            ExerciseKind::Shoulder => &mut self.shoulder,
        }
    }

    /// Recalibrate the knee posture gate
    pub fn set_knee_gate(&mut self, min_x: GateThreshold) {
        if let Some(gate) = self.knee.gate.as_mut() {
            gate.min_x = min_x;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(TrackingError::Config(format!(
                "confidence_threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if self.history_depth < MIN_HISTORY_DEPTH {
            return Err(TrackingError::Config(format!(
                "history_depth must be at least {}",
                MIN_HISTORY_DEPTH
            )));
        }
        if !FRAME_RATE_RANGE.contains(&self.frame_rate) {
            return Err(TrackingError::Config(format!(
                "frame_rate {} outside [{}, {}]",
                self.frame_rate,
                FRAME_RATE_RANGE.start(),
                FRAME_RATE_RANGE.end()
            )));
        }
        for kind in ExerciseKind::ALL {
            let definition = self.definition(kind);
            if definition.kind != kind {
                return Err(TrackingError::Config(format!(
                    "definition under '{}' is for '{}'",
                    kind, definition.kind
                )));
            }
            definition.validate()?;
        }
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "reptracker", "RepTracker")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when the file
    /// is absent or unusable
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring configuration at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Time between evaluations. Falls back to the default rate when the
    /// configured one has no representable interval.
    pub fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.frame_rate)
            .unwrap_or_else(|_| Duration::from_secs_f64(1.0 / DEFAULT_FRAME_RATE))
    }
}
