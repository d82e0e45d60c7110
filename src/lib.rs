// src/lib.rs - Exercise repetition counting from pose-estimation keypoints
//
// A pose source delivers BlazePose keypoint frames, an `ExerciseSession`
// measures the active exercise's joint angle and a `RepetitionDetector`
// counts extended→flexed transitions. Rendering is left to the caller, which
// gets a `SkeletonOverlay` per frame.

pub mod config;
pub mod counter;
pub mod data;
pub mod error;
pub mod exercise;
pub mod geometry;
pub mod history;
pub mod pose;
pub mod session;
pub mod tracking;

pub use config::TrackerConfig;
pub use counter::{RepetitionDetector, RepetitionEvent};
pub use data::SessionRecorder;
pub use error::{Result, TrackingError};
pub use exercise::{ExerciseDefinition, ExerciseKind, GateThreshold, JointTriplet, PositionGate};
pub use geometry::joint_angle;
pub use history::AngleHistory;
pub use pose::{Keypoint, KeypointFrame, SkeletonOverlay};
pub use session::{ExerciseSession, FrameOutcome, SessionStats, SkipReason};
pub use tracking::{PoseSource, RecordedPose, SimulatedPose};
