// src/tracking.rs - Pose sources: the seam to the external pose model
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::{Result, TrackingError};
use crate::exercise::ExerciseKind;
use crate::pose::{landmarks, Keypoint, KeypointFrame};

/// Anything that turns camera frames into BlazePose keypoints.
///
/// A failed estimate is a dropped frame, the session carries on with the next one.
pub trait PoseSource {
    fn estimate(&mut self, image: Option<&DynamicImage>) -> Result<KeypointFrame>;

    fn name(&self) -> &str;
}

/// Deterministic stand-in for a pose model: a figure performing the exercise
pub struct SimulatedPose {
    exercise: ExerciseKind,
    sim_time: f64,
    time_step: f64,
    /// Seconds per repetition
    period: f64,
    width: u32,
    height: u32,
    dropout_every: Option<u64>,
    frame_counter: u64,
}

impl SimulatedPose {
    pub fn new(exercise: ExerciseKind) -> Self {
        Self {
            exercise,
            sim_time: 0.0,
            time_step: 0.05,
            period: 2.0,
            width: 1280,
            height: 720,
            dropout_every: None,
            frame_counter: 0,
        }
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_period(mut self, period: f64) -> Self {
        self.period = period;
        self
    }

    /// Every n-th frame loses confidence on the measured joint's vertex
    pub fn with_dropouts(mut self, every: u64) -> Self {
        self.dropout_every = Some(every.max(1));
        self
    }

    pub fn set_exercise(&mut self, exercise: ExerciseKind) {
        self.exercise = exercise;
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Joint angle at time `t`: starts extended, bottoms out mid-period
    fn joint_angle_at(&self, t: f64) -> f64 {
        let (extended, flexed) = match self.exercise {
            ExerciseKind::Knee => (172.0, 70.0),
            ExerciseKind::Shoulder => (178.0, 40.0),
        };
        let mid = (extended + flexed) / 2.0;
        let amplitude = (extended - flexed) / 2.0;
        mid + amplitude * (2.0 * PI * t / self.period).cos()
    }

    fn generate_simulation_data(&self, t: f64) -> Vec<Keypoint> {
        let s = self.width as f64 / 1280.0;
        let p = |x: f64, y: f64| Keypoint::new(x * s, y * s, 0.9);

        // Standing figure facing the camera, left side on the image right
        let mut keypoints = vec![
            p(700.0, 120.0), // nose
            p(710.0, 110.0),
            p(715.0, 110.0),
            p(720.0, 110.0),
            p(690.0, 110.0),
            p(685.0, 110.0),
            p(680.0, 110.0),
            p(730.0, 115.0),
            p(670.0, 115.0),
            p(710.0, 135.0),
            p(690.0, 135.0),
            p(760.0, 200.0), // left shoulder
            p(640.0, 200.0), // right shoulder
            p(770.0, 310.0),
            p(630.0, 310.0),
            p(775.0, 410.0),
            p(625.0, 410.0),
            p(778.0, 430.0),
            p(622.0, 430.0),
            p(776.0, 435.0),
            p(624.0, 435.0),
            p(772.0, 425.0),
            p(628.0, 425.0),
            p(740.0, 420.0), // left hip
            p(660.0, 420.0), // right hip
            p(742.0, 550.0),
            p(658.0, 550.0),
            p(744.0, 680.0),
            p(656.0, 680.0),
            p(746.0, 695.0),
            p(654.0, 695.0),
            p(760.0, 705.0),
            p(640.0, 705.0),
        ];
        debug_assert_eq!(keypoints.len(), landmarks::COUNT);

        // Distal point placed so the interior angle at the vertex equals `angle`,
        // with the proximal segment pointing straight up from the vertex
        let theta = self.joint_angle_at(t).to_radians();
        let bend = |vertex: Keypoint, length: f64| {
            Keypoint::new(
                vertex.x + length * s * theta.sin(),
                vertex.y - length * s * theta.cos(),
                0.9,
            )
        };

        let vertex = match self.exercise {
            ExerciseKind::Knee => {
                let hip = keypoints[landmarks::RIGHT_HIP];
                let knee = Keypoint::new(hip.x, hip.y + 130.0 * s, 0.9);
                keypoints[landmarks::RIGHT_KNEE] = knee;
                keypoints[landmarks::RIGHT_ANKLE] = bend(knee, 130.0);
                landmarks::RIGHT_KNEE
            }
            ExerciseKind::Shoulder => {
                let shoulder = keypoints[landmarks::RIGHT_SHOULDER];
                let elbow = Keypoint::new(shoulder.x, shoulder.y + 110.0 * s, 0.9);
                keypoints[landmarks::RIGHT_ELBOW] = elbow;
                keypoints[landmarks::RIGHT_WRIST] = bend(elbow, 100.0);
                landmarks::RIGHT_ELBOW
            }
        };

        if let Some(every) = self.dropout_every {
            if self.frame_counter % every == 0 {
                keypoints[vertex].score = 0.2;
            }
        }

        keypoints
    }
}

impl PoseSource for SimulatedPose {
    fn estimate(&mut self, image: Option<&DynamicImage>) -> Result<KeypointFrame> {
        if let Some(img) = image {
            self.width = img.width();
            self.height = img.height();
        }

        let t = self.sim_time;
        self.sim_time += self.time_step;
        self.frame_counter += 1;

        Ok(KeypointFrame::new(self.generate_simulation_data(t))
            .with_size(self.width, self.height)
            .with_timestamp(t))
    }

    fn name(&self) -> &str {
        "simulation"
    }
}

/// Replays keypoint frames captured from an external model, one JSON frame per line
pub struct RecordedPose {
    frames: VecDeque<KeypointFrame>,
    total: usize,
}

impl RecordedPose {
    pub fn new(frames: Vec<KeypointFrame>) -> Self {
        let total = frames.len();
        Self {
            frames: frames.into(),
            total,
        }
    }

    pub fn from_json_lines(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let frames = data
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<KeypointFrame>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        info!("Loaded {} recorded frames from {}", frames.len(), path.display());
        Ok(Self::new(frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }
}

impl PoseSource for RecordedPose {
    fn estimate(&mut self, _image: Option<&DynamicImage>) -> Result<KeypointFrame> {
        let frame = self
            .frames
            .pop_front()
            .ok_or_else(|| TrackingError::Inference("recording exhausted".into()))?;
        if frame.is_empty() {
            // The recorder writes an empty frame when the model found nobody
            debug!("recorded frame at {:.3}s has no person", frame.timestamp);
            return Err(TrackingError::Inference("no person detected".into()));
        }
        Ok(frame)
    }

    fn name(&self) -> &str {
        "recording"
    }
}
