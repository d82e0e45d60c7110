// src/exercise.rs - Exercise definitions: the measured joint and its extremes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackingError};
use crate::pose::{landmarks, KeypointFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Knee,
    Shoulder,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 2] = [ExerciseKind::Knee, ExerciseKind::Shoulder];

    pub fn name(&self) -> &'static str {
        match self {
            ExerciseKind::Knee => "knee",
            ExerciseKind::Shoulder => "shoulder",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExerciseKind {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "knee" => Ok(ExerciseKind::Knee),
            "shoulder" => Ok(ExerciseKind::Shoulder),
            other => Err(TrackingError::Config(format!("unknown exercise '{}'", other))),
        }
    }
}

/// Proximal, vertex and distal landmark indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointTriplet {
    pub proximal: usize,
    pub vertex: usize,
    pub distal: usize,
}

impl JointTriplet {
    pub const fn new(proximal: usize, vertex: usize, distal: usize) -> Self {
        Self { proximal, vertex, distal }
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.proximal, self.vertex, self.distal]
    }
}

/// Calibration of a positional gate's x threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GateThreshold {
    /// Absolute source-frame pixels
    Pixels(f64),
    /// Fraction of the source frame width, needs `KeypointFrame::width`
    FractionOfWidth(f64),
}

impl GateThreshold {
    pub fn resolve(&self, frame_width: Option<u32>) -> Result<f64> {
        match *self {
            GateThreshold::Pixels(px) => Ok(px),
            GateThreshold::FractionOfWidth(fraction) => frame_width
                .map(|w| fraction * w as f64)
                .ok_or_else(|| {
                    TrackingError::Config("frame width unknown for a width-relative gate".into())
                }),
        }
    }
}

/// "Subject is in position" check: a landmark's x must lie strictly past a threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionGate {
    pub landmark: usize,
    pub min_x: GateThreshold,
}

impl PositionGate {
    pub fn is_open(&self, frame: &KeypointFrame, confidence_threshold: f64) -> Result<bool> {
        let keypoint = frame
            .confident(self.landmark, confidence_threshold)
            .ok_or(TrackingError::MissingLandmark { index: self.landmark })?;
        let threshold = self.min_x.resolve(frame.width)?;
        Ok(keypoint.x > threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub kind: ExerciseKind,
    pub triplet: JointTriplet,
    /// Angles above this count as extended
    pub extended_min: f64,
    /// Angles below this count as flexed
    pub flexed_max: f64,
    #[serde(default)]
    pub gate: Option<PositionGate>,
}

impl ExerciseDefinition {
    pub fn knee() -> Self {
        Self {
            kind: ExerciseKind::Knee,
            triplet: JointTriplet::new(
                landmarks::RIGHT_HIP,
                landmarks::RIGHT_KNEE,
                landmarks::RIGHT_ANKLE,
            ),
            extended_min: 150.0,
            flexed_max: 90.0,
            gate: Some(PositionGate {
                landmark: landmarks::LEFT_SHOULDER,
                min_x: GateThreshold::Pixels(650.0),
            }),
        }
    }

    pub fn shoulder() -> Self {
        Self {
            kind: ExerciseKind::Shoulder,
            triplet: JointTriplet::new(
                landmarks::RIGHT_SHOULDER,
                landmarks::RIGHT_ELBOW,
                landmarks::RIGHT_WRIST,
            ),
            extended_min: 170.0,
            flexed_max: 90.0,
            gate: None,
        }
    }

    pub fn for_kind(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::Knee => Self::knee(),
            ExerciseKind::Shoulder => Self::shoulder(),
        }
    }

    /// Triplet first, then the gate landmark if any
    pub fn required_landmarks(&self) -> Vec<usize> {
        let mut required = self.triplet.indices().to_vec();
        if let Some(gate) = &self.gate {
            if !required.contains(&gate.landmark) {
                required.push(gate.landmark);
            }
        }
        required
    }

    pub fn is_extended(&self, angle: f64) -> bool {
        angle > self.extended_min
    }

    pub fn is_flexed(&self, angle: f64) -> bool {
        angle < self.flexed_max
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=180.0).contains(&v);
        if !in_range(self.extended_min) || !in_range(self.flexed_max) {
            return Err(TrackingError::Config(format!(
                "{}: thresholds must lie within [0, 180]",
                self.kind
            )));
        }
        if self.flexed_max >= self.extended_min {
            return Err(TrackingError::Config(format!(
                "{}: flexed_max ({}) must be below extended_min ({})",
                self.kind, self.flexed_max, self.extended_min
            )));
        }
        if self
            .required_landmarks()
            .iter()
            .any(|&i| i >= landmarks::COUNT)
        {
            return Err(TrackingError::Config(format!(
                "{}: landmark index outside the 33-point topology",
                self.kind
            )));
        }
        if let Some(PositionGate { min_x: GateThreshold::FractionOfWidth(f), .. }) = self.gate {
            if !(0.0..=1.0).contains(&f) {
                return Err(TrackingError::Config(format!(
                    "{}: gate width fraction {} outside [0, 1]",
                    self.kind, f
                )));
            }
        }
        Ok(())
    }
}
