// src/pose.rs - BlazePose keypoint model and skeleton overlay data
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// BlazePose full-body topology (33 landmarks)
pub mod landmarks {
    pub const COUNT: usize = 33;

    pub const NOSE: usize = 0;
    pub const LEFT_EYE_INNER: usize = 1;
    pub const LEFT_EYE: usize = 2;
    pub const LEFT_EYE_OUTER: usize = 3;
    pub const RIGHT_EYE_INNER: usize = 4;
    pub const RIGHT_EYE: usize = 5;
    pub const RIGHT_EYE_OUTER: usize = 6;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const MOUTH_LEFT: usize = 9;
    pub const MOUTH_RIGHT: usize = 10;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_PINKY: usize = 17;
    pub const RIGHT_PINKY: usize = 18;
    pub const LEFT_INDEX: usize = 19;
    pub const RIGHT_INDEX: usize = 20;
    pub const LEFT_THUMB: usize = 21;
    pub const RIGHT_THUMB: usize = 22;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
    pub const LEFT_HEEL: usize = 29;
    pub const RIGHT_HEEL: usize = 30;
    pub const LEFT_FOOT_INDEX: usize = 31;
    pub const RIGHT_FOOT_INDEX: usize = 32;
}

/// Skeleton bones, matching the pose model's adjacent-pair list
pub const BLAZEPOSE_CONNECTIONS: [(usize, usize); 35] = [
    (0, 1), (0, 4), (1, 2), (2, 3), (3, 7),
    (4, 5), (5, 6), (6, 8), (9, 10), (11, 12),
    (11, 13), (11, 23), (12, 14), (14, 16), (12, 24),
    (13, 15), (15, 17), (16, 18), (16, 20), (15, 19),
    (15, 21), (16, 22), (17, 19), (18, 20), (23, 25),
    (23, 24), (24, 26), (25, 27), (26, 28), (27, 29),
    (28, 30), (27, 31), (28, 32), (29, 31), (30, 32),
];

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, score: f64) -> Self {
        Self { x, y, score }
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn is_confident(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

/// One inference result, index-addressed by the landmark scheme above
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointFrame {
    pub keypoints: Vec<Keypoint>,
    /// Source frame size in pixels, when the pose source knows it
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub timestamp: f64,
}

impl KeypointFrame {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn get(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    /// Keypoint at `index` if present and at or above `threshold`
    pub fn confident(&self, index: usize, threshold: f64) -> Option<&Keypoint> {
        self.get(index).filter(|kp| kp.is_confident(threshold))
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySegment {
    pub from: Point2<f64>,
    pub to: Point2<f64>,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayMarker {
    pub index: usize,
    pub position: Point2<f64>,
    pub visible: bool,
}

/// Everything a renderer needs to draw one frame's skeleton
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonOverlay {
    pub segments: Vec<OverlaySegment>,
    pub markers: Vec<OverlayMarker>,
}

impl SkeletonOverlay {
    pub fn build(frame: &KeypointFrame, confidence_threshold: f64) -> Self {
        // Bones whose endpoints the model did not return are left out entirely
        let segments = BLAZEPOSE_CONNECTIONS
            .iter()
            .filter_map(|&(a, b)| {
                let (from, to) = (frame.get(a)?, frame.get(b)?);
                Some(OverlaySegment {
                    from: from.position(),
                    to: to.position(),
                    visible: from.is_confident(confidence_threshold)
                        && to.is_confident(confidence_threshold),
                })
            })
            .collect();

        let markers = frame
            .keypoints
            .iter()
            .enumerate()
            .map(|(index, kp)| OverlayMarker {
                index,
                position: kp.position(),
                visible: kp.is_confident(confidence_threshold),
            })
            .collect();

        Self { segments, markers }
    }

    /// Flip horizontally for a selfie-style display. Counting never sees this.
    pub fn mirrored(mut self, frame_width: f64) -> Self {
        for segment in &mut self.segments {
            segment.from.x = frame_width - segment.from.x;
            segment.to.x = frame_width - segment.to.x;
        }
        for marker in &mut self.markers {
            marker.position.x = frame_width - marker.position.x;
        }
        self
    }

    pub fn visible_segments(&self) -> impl Iterator<Item = &OverlaySegment> {
        self.segments.iter().filter(|s| s.visible)
    }

    pub fn visible_markers(&self) -> impl Iterator<Item = &OverlayMarker> {
        self.markers.iter().filter(|m| m.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_frame(score: f64) -> KeypointFrame {
        KeypointFrame::new(
            (0..landmarks::COUNT)
                .map(|i| Keypoint::new(i as f64 * 10.0, i as f64 * 5.0, score))
                .collect(),
        )
    }

    #[test]
    fn test_connections_stay_inside_topology() {
        for (a, b) in BLAZEPOSE_CONNECTIONS {
            assert!(a < landmarks::COUNT && b < landmarks::COUNT);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_confident_lookup() {
        let mut frame = full_frame(0.9);
        frame.keypoints[landmarks::RIGHT_KNEE].score = 0.2;

        assert!(frame.confident(landmarks::RIGHT_HIP, 0.5).is_some());
        assert!(frame.confident(landmarks::RIGHT_KNEE, 0.5).is_none());
        assert!(frame.confident(40, 0.0).is_none());
        // Threshold is inclusive
        assert!(frame.confident(landmarks::RIGHT_KNEE, 0.2).is_some());
    }

    #[test]
    fn test_overlay_visibility() {
        let mut frame = full_frame(0.9);
        frame.keypoints[landmarks::RIGHT_ELBOW].score = 0.1;
        let overlay = SkeletonOverlay::build(&frame, 0.5);

        assert_eq!(overlay.segments.len(), BLAZEPOSE_CONNECTIONS.len());
        assert_eq!(overlay.markers.len(), landmarks::COUNT);
        // (12, 14) and (14, 16) both touch the elbow
        assert_eq!(overlay.visible_segments().count(), BLAZEPOSE_CONNECTIONS.len() - 2);
        assert_eq!(overlay.visible_markers().count(), landmarks::COUNT - 1);
        assert!(!overlay.markers[landmarks::RIGHT_ELBOW].visible);
    }

    #[test]
    fn test_overlay_skips_absent_landmarks() {
        // Upper body only
        let frame = KeypointFrame::new(full_frame(0.9).keypoints[..17].to_vec());
        let overlay = SkeletonOverlay::build(&frame, 0.5);

        assert!(overlay
            .segments
            .iter()
            .all(|s| s.from.x < 170.0 && s.to.x < 170.0));
        assert_eq!(overlay.markers.len(), 17);
    }

    #[test]
    fn test_mirrored_overlay() {
        let frame = KeypointFrame::new(vec![
            Keypoint::new(100.0, 50.0, 0.9),
            Keypoint::new(300.0, 60.0, 0.9),
        ]);
        let overlay = SkeletonOverlay::build(&frame, 0.5).mirrored(640.0);

        assert_eq!(overlay.markers[0].position, Point2::new(540.0, 50.0));
        assert_eq!(overlay.segments[0].from, Point2::new(540.0, 50.0));
        assert_eq!(overlay.segments[0].to.y, 60.0);
    }
}
