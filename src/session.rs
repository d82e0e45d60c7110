// src/session.rs - Frame-driven exercise session
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::counter::{RepetitionDetector, RepetitionEvent};
use crate::error::{Result, TrackingError};
use crate::exercise::{ExerciseDefinition, ExerciseKind};
use crate::geometry::joint_angle;
use crate::pose::{KeypointFrame, SkeletonOverlay};

/// Why a frame produced no angle sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingLandmark(usize),
    DegenerateGeometry,
    GateUnresolved,
    InferenceFailed,
}

impl From<&TrackingError> for SkipReason {
    fn from(e: &TrackingError) -> Self {
        match e {
            TrackingError::MissingLandmark { index } => SkipReason::MissingLandmark(*index),
            TrackingError::DegenerateGeometry => SkipReason::DegenerateGeometry,
            // A gate threshold that cannot be resolved for this frame
            TrackingError::Config(_) => SkipReason::GateUnresolved,
            TrackingError::Inference(_) | TrackingError::Io(_) | TrackingError::Serialization(_) => {
                SkipReason::InferenceFailed
            }
        }
    }
}

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Session stopped, frame not looked at
    Idle,
    Skipped(SkipReason),
    Measured {
        angle: f64,
        event: Option<RepetitionEvent>,
    },
}

impl FrameOutcome {
    pub fn event(&self) -> Option<RepetitionEvent> {
        match self {
            FrameOutcome::Measured { event, .. } => *event,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_measured: u64,
    pub frames_skipped: u64,
    pub frames_dropped: u64,
}

impl SessionStats {
    pub fn total(&self) -> u64 {
        self.frames_measured + self.frames_skipped + self.frames_dropped
    }
}

pub struct ExerciseSession {
    config: TrackerConfig,
    detector: RepetitionDetector,
    running: bool,
    last_angle: Option<f64>,
    stats: SessionStats,
}

impl ExerciseSession {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TrackerConfig) -> Self {
        let detector = Self::fresh_detector(&config, config.exercise);
        Self {
            config,
            detector,
            running: false,
            last_angle: None,
            stats: SessionStats::default(),
        }
    }

    fn fresh_detector(config: &TrackerConfig, kind: ExerciseKind) -> RepetitionDetector {
        RepetitionDetector::new(config.definition(kind).clone(), config.history_depth)
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!(exercise = %self.active_exercise(), "session started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!(
                exercise = %self.active_exercise(),
                count = self.count(),
                "session stopped"
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start counting from zero again on the current exercise
    pub fn restart(&mut self) {
        self.detector = Self::fresh_detector(&self.config, self.active_exercise());
        self.last_angle = None;
        self.stats = SessionStats::default();
        info!(exercise = %self.active_exercise(), "session restarted");
    }

    /// Exercise switches are never blended: the new detector starts at zero
    pub fn switch_exercise(&mut self, kind: ExerciseKind) {
        info!(from = %self.active_exercise(), to = %kind, "switching exercise");
        self.config.exercise = kind;
        self.detector = Self::fresh_detector(&self.config, kind);
        self.last_angle = None;
    }

    pub fn process_frame(&mut self, frame: &KeypointFrame) -> Option<RepetitionEvent> {
        self.process_frame_detailed(frame).event()
    }

    pub fn process_frame_detailed(&mut self, frame: &KeypointFrame) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Idle;
        }

        let (angle, gate_open) = match self.measure(frame) {
            Ok(measured) => measured,
            Err(e) => {
                debug!("frame skipped: {}", e);
                self.stats.frames_skipped += 1;
                return FrameOutcome::Skipped(SkipReason::from(&e));
            }
        };

        self.stats.frames_measured += 1;
        self.last_angle = Some(angle);
        let event = self.detector.observe(angle, gate_open, frame.timestamp);
        FrameOutcome::Measured { angle, event }
    }

    /// Entry point for a pose source's result, failures included
    pub fn process_estimate(&mut self, estimate: Result<KeypointFrame>) -> FrameOutcome {
        match estimate {
            Ok(frame) => self.process_frame_detailed(&frame),
            Err(e) => {
                if !self.running {
                    return FrameOutcome::Idle;
                }
                warn!("pose estimation error: {}", e);
                self.stats.frames_dropped += 1;
                FrameOutcome::Skipped(SkipReason::InferenceFailed)
            }
        }
    }

    /// Angle at the triplet vertex plus the auxiliary gate verdict.
    /// Any landmark the exercise needs must be present and confident.
    fn measure(&self, frame: &KeypointFrame) -> Result<(f64, bool)> {
        let definition = self.detector.definition();
        let threshold = self.config.confidence_threshold;

        let mut points = Vec::with_capacity(3);
        for index in definition.triplet.indices() {
            let keypoint = frame
                .confident(index, threshold)
                .ok_or(TrackingError::MissingLandmark { index })?;
            points.push(keypoint.position());
        }

        let gate_open = match &definition.gate {
            Some(gate) => gate.is_open(frame, threshold)?,
            None => true,
        };

        let angle = joint_angle(&points[0], &points[1], &points[2])?;
        Ok((angle, gate_open))
    }

    pub fn overlay(&self, frame: &KeypointFrame) -> SkeletonOverlay {
        let overlay = SkeletonOverlay::build(frame, self.config.confidence_threshold);
        match (self.config.mirror, frame.width) {
            (true, Some(width)) => overlay.mirrored(width as f64),
            _ => overlay,
        }
    }

    pub fn count(&self) -> u32 {
        self.detector.count()
    }

    pub fn active_exercise(&self) -> ExerciseKind {
        self.detector.exercise()
    }

    pub fn definition(&self) -> &ExerciseDefinition {
        self.detector.definition()
    }

    pub fn detector(&self) -> &RepetitionDetector {
        &self.detector
    }

    pub fn last_angle(&self) -> Option<f64> {
        self.last_angle
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.config.mirror = mirror;
    }

    /// Replace the configuration. The running detector is rebuilt from it,
    /// the same as an explicit restart.
    pub fn reconfigure(&mut self, config: TrackerConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.detector = Self::fresh_detector(&self.config, self.config.exercise);
        self.last_angle = None;
        info!(exercise = %self.active_exercise(), "session reconfigured");
        Ok(())
    }
}

/// Stopped session on the built-in configuration
impl Default for ExerciseSession {
    fn default() -> Self {
        Self::from_valid_config(TrackerConfig::default())
    }
}
