// src/counter.rs - Extended→flexed repetition detector
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::exercise::{ExerciseDefinition, ExerciseKind};
use crate::history::AngleHistory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepetitionEvent {
    pub exercise: ExerciseKind,
    /// Count after this repetition
    pub count: u32,
    /// Flexed angle that completed the repetition
    pub angle: f64,
    pub timestamp: f64,
}

/// Counts one repetition per extended→flexed transition of a single joint.
///
/// Only extreme samples (above `extended_min` or below `flexed_max`) enter the
/// history, so the "previous" angle is always the last extreme one. A flexed
/// sample counts when that previous extreme was extended, which makes the
/// detector immune to any number of dead-band frames in between and to a
/// sustained flexed hold.
#[derive(Debug, Clone)]
pub struct RepetitionDetector {
    definition: ExerciseDefinition,
    history: AngleHistory,
    count: u32,
}

impl RepetitionDetector {
    pub fn new(definition: ExerciseDefinition, history_depth: usize) -> Self {
        Self {
            definition,
            history: AngleHistory::new(history_depth),
            count: 0,
        }
    }

    /// Feed one resolved angle.
    ///
    /// `gate_open` is the auxiliary gate's verdict for the current frame. It is
    /// ignored for exercises without a gate.
    pub fn observe(&mut self, angle: f64, gate_open: bool, timestamp: f64) -> Option<RepetitionEvent> {
        let extended = self.definition.is_extended(angle);
        let flexed = self.definition.is_flexed(angle);

        // Dead band: nothing to evaluate, nothing recorded
        if !(extended || flexed) {
            return None;
        }

        let was_extended = self
            .history
            .latest()
            .map_or(false, |previous| self.definition.is_extended(previous));
        let gate_ok = self.definition.gate.is_none() || gate_open;

        let event = if was_extended && flexed && gate_ok {
            self.count += 1;
            info!(
                exercise = %self.definition.kind,
                count = self.count,
                angle,
                "repetition counted"
            );
            Some(RepetitionEvent {
                exercise: self.definition.kind,
                count: self.count,
                angle,
                timestamp,
            })
        } else {
            None
        };

        self.history.push(angle);
        event
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn history(&self) -> &AngleHistory {
        &self.history
    }

    pub fn definition(&self) -> &ExerciseDefinition {
        &self.definition
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.definition.kind
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shoulder() -> RepetitionDetector {
        RepetitionDetector::new(ExerciseDefinition::shoulder(), 10)
    }

    fn feed(detector: &mut RepetitionDetector, angles: &[f64]) -> Vec<usize> {
        angles
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| detector.observe(a, true, i as f64).map(|_| i))
            .collect()
    }

    #[test]
    fn test_counts_each_extended_to_flexed_edge() {
        let mut detector = shoulder();
        let hits = feed(&mut detector, &[175.0, 178.0, 85.0, 171.0, 88.0]);
        assert_eq!(hits, vec![2, 4]);
        assert_eq!(detector.count(), 2);
    }

    #[test]
    fn test_exact_extended_threshold_does_not_rearm() {
        let mut detector = shoulder();
        // 170 is not above 170, so the head is still the flexed 85 when 88 arrives
        let hits = feed(&mut detector, &[175.0, 178.0, 85.0, 170.0, 88.0]);
        assert_eq!(hits, vec![2]);
        assert_eq!(detector.history().iter().collect::<Vec<_>>(), vec![88.0, 85.0, 178.0, 175.0]);
    }

    #[test]
    fn test_dead_band_frames_between_repetitions() {
        let mut detector = shoulder();
        let hits = feed(
            &mut detector,
            &[175.0, 150.0, 120.0, 95.0, 85.0, 100.0, 140.0, 172.0, 160.0, 110.0, 80.0],
        );
        assert_eq!(hits, vec![4, 10]);
        assert_eq!(detector.count(), 2);
    }

    #[test]
    fn test_flexed_hold_counts_once() {
        let mut detector = shoulder();
        let hits = feed(&mut detector, &[175.0, 80.0, 70.0, 85.0, 60.0, 89.0]);
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_no_count_without_prior_extension() {
        let mut detector = shoulder();
        assert!(detector.observe(60.0, true, 0.0).is_none());
        assert_eq!(detector.history().latest(), Some(60.0));
        assert_eq!(detector.count(), 0);
    }

    #[test]
    fn test_threshold_values_are_not_crossings() {
        let mut detector = shoulder();
        // Exactly 170 is dead band, exactly 90 is dead band
        assert!(feed(&mut detector, &[170.0, 60.0]).is_empty());
        assert!(feed(&mut detector, &[171.0, 90.0]).is_empty());
        assert_eq!(detector.history().iter().collect::<Vec<_>>(), vec![171.0, 60.0]);
    }

    #[test]
    fn test_dead_band_never_touches_history() {
        let mut detector = shoulder();
        for i in 0..500 {
            assert!(detector.observe(130.0, true, i as f64).is_none());
        }
        assert!(detector.history().is_empty());
        assert_eq!(detector.count(), 0);
    }

    #[test]
    fn test_count_is_monotonic() {
        let mut detector = shoulder();
        let mut last = 0;
        for i in 0..400 {
            // Irregular sweep across both extremes
            let angle = 90.0 + 95.0 * ((i as f64) * 0.37).sin() * ((i as f64) * 0.05).cos();
            detector.observe(angle.clamp(0.0, 180.0), true, i as f64);
            assert!(detector.count() >= last);
            last = detector.count();
        }
        assert!(last > 0);
    }

    #[test]
    fn test_closed_gate_blocks_count_but_records_angle() {
        let mut detector = RepetitionDetector::new(ExerciseDefinition::knee(), 10);
        assert!(detector.observe(165.0, false, 0.0).is_none());
        assert!(detector.observe(70.0, false, 1.0).is_none());
        assert_eq!(detector.history().latest(), Some(70.0));
        assert_eq!(detector.count(), 0);

        assert!(detector.observe(160.0, true, 2.0).is_none());
        let event = detector.observe(75.0, true, 3.0).unwrap();
        assert_eq!(event.exercise, ExerciseKind::Knee);
        assert_eq!(event.count, 1);
        assert_eq!(event.angle, 75.0);
        assert_eq!(event.timestamp, 3.0);
    }

    #[test]
    fn test_gate_flag_ignored_without_gate() {
        let mut detector = shoulder();
        detector.observe(175.0, false, 0.0);
        assert!(detector.observe(80.0, false, 1.0).is_some());
    }

    #[test]
    fn test_reset() {
        let mut detector = shoulder();
        feed(&mut detector, &[175.0, 80.0]);
        assert_eq!(detector.count(), 1);
        detector.reset();
        assert_eq!(detector.count(), 0);
        assert!(detector.history().is_empty());
    }
}
