// tests/session_pipeline.rs - End-to-end: pose source -> session -> repetition events
//
// All frames come from the deterministic simulated pose source, so the
// expected counts follow directly from its cadence (one repetition per
// two-second period at 20 frames per second).

use rep_tracker::pose::landmarks;
use rep_tracker::{
    ExerciseKind, ExerciseSession, FrameOutcome, GateThreshold, KeypointFrame, PoseSource,
    RecordedPose, SessionRecorder, SimulatedPose, SkipReason, TrackerConfig, TrackingError,
};

const FRAMES: usize = 200; // 10 seconds

fn frames(kind: ExerciseKind, dropouts: Option<u64>) -> Vec<KeypointFrame> {
    let mut source = SimulatedPose::new(kind);
    if let Some(every) = dropouts {
        source = source.with_dropouts(every);
    }
    (0..FRAMES).map(|_| source.estimate(None).unwrap()).collect()
}

fn session(config: TrackerConfig) -> ExerciseSession {
    let mut session = ExerciseSession::new(config).unwrap();
    session.start();
    session
}

fn config_for(kind: ExerciseKind) -> TrackerConfig {
    TrackerConfig {
        exercise: kind,
        ..TrackerConfig::default()
    }
}

fn run(session: &mut ExerciseSession, frames: &[KeypointFrame]) -> Vec<u32> {
    frames
        .iter()
        .filter_map(|f| session.process_frame(f))
        .map(|e| e.count)
        .collect()
}

#[test]
fn test_simulated_squats_are_counted() {
    let mut session = session(config_for(ExerciseKind::Knee));
    let counts = run(&mut session, &frames(ExerciseKind::Knee, None));

    assert_eq!(counts, vec![1, 2, 3, 4, 5]);
    assert_eq!(session.count(), 5);
    assert_eq!(session.stats().frames_measured, FRAMES as u64);
}

#[test]
fn test_simulated_curls_are_counted() {
    let mut session = session(config_for(ExerciseKind::Shoulder));
    run(&mut session, &frames(ExerciseKind::Shoulder, None));
    assert_eq!(session.count(), 5);
}

#[test]
fn test_missing_landmark_frames_do_not_change_count() {
    let with_dropouts = frames(ExerciseKind::Knee, Some(3));
    let usable: Vec<KeypointFrame> = with_dropouts
        .iter()
        .filter(|f| {
            [24, 26, 28, 11]
                .iter()
                .all(|&i| f.confident(i, 0.5).is_some())
        })
        .cloned()
        .collect();
    assert!(usable.len() < with_dropouts.len());

    let mut interleaved = session(config_for(ExerciseKind::Knee));
    run(&mut interleaved, &with_dropouts);
    let mut filtered = session(config_for(ExerciseKind::Knee));
    run(&mut filtered, &usable);

    assert_eq!(interleaved.count(), filtered.count());
    assert_eq!(interleaved.count(), 5);
    assert_eq!(
        interleaved.detector().history().iter().collect::<Vec<_>>(),
        filtered.detector().history().iter().collect::<Vec<_>>()
    );
    assert_eq!(
        interleaved.stats().frames_skipped,
        (with_dropouts.len() - usable.len()) as u64
    );
}

#[test]
fn test_knee_gate_blocks_out_of_position_subject() {
    let mut config = config_for(ExerciseKind::Knee);
    // The simulated left shoulder sits at x = 760
    config.set_knee_gate(GateThreshold::Pixels(900.0));
    let mut session = session(config);
    run(&mut session, &frames(ExerciseKind::Knee, None));

    assert_eq!(session.count(), 0);
    assert!(!session.detector().history().is_empty());
}

#[test]
fn test_width_relative_knee_gate() {
    let mut config = config_for(ExerciseKind::Knee);
    config.set_knee_gate(GateThreshold::FractionOfWidth(0.5));
    let mut session = session(config.clone());
    run(&mut session, &frames(ExerciseKind::Knee, None));
    assert_eq!(session.count(), 5);

    // Same subject, but the gate asks for more than 60% of the width
    config.set_knee_gate(GateThreshold::FractionOfWidth(0.6));
    let mut session = self::session(config);
    run(&mut session, &frames(ExerciseKind::Knee, None));
    assert_eq!(session.count(), 0);
}

#[test]
fn test_gate_landmark_missing_skips_frame() {
    let mut session = session(config_for(ExerciseKind::Knee));
    let mut frame = frames(ExerciseKind::Knee, None).remove(0);
    frame.keypoints[landmarks::LEFT_SHOULDER].score = 0.1;

    assert_eq!(
        session.process_frame_detailed(&frame),
        FrameOutcome::Skipped(SkipReason::MissingLandmark(landmarks::LEFT_SHOULDER))
    );
    assert!(session.detector().history().is_empty());
}

#[test]
fn test_exercise_switch_mid_session() {
    let knee_frames = frames(ExerciseKind::Knee, None);
    let mut session = session(config_for(ExerciseKind::Knee));
    run(&mut session, &knee_frames[..100]);
    assert!(session.count() > 0);

    session.switch_exercise(ExerciseKind::Shoulder);
    assert_eq!(session.count(), 0);
    assert!(session.detector().history().is_empty());

    // Knee frames keep the arm still and extended, so nothing is counted
    run(&mut session, &knee_frames[100..]);
    assert_eq!(session.count(), 0);
}

#[test]
fn test_count_never_decreases_across_failures() {
    let mut session = session(config_for(ExerciseKind::Shoulder));
    let mut source = SimulatedPose::new(ExerciseKind::Shoulder).with_dropouts(4);
    let mut last = 0;

    for i in 0..FRAMES {
        let estimate = if i % 7 == 0 {
            Err(TrackingError::Inference("model busy".into()))
        } else {
            source.estimate(None)
        };
        session.process_estimate(estimate);
        assert!(session.count() >= last);
        last = session.count();
    }

    assert!(last > 0);
    assert!(session.stats().frames_dropped > 0);
}

#[test]
fn test_recorded_replay_matches_live_count() {
    let dir = std::env::temp_dir().join(format!("rep_tracker_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("squats.jsonl");

    let live_frames = frames(ExerciseKind::Knee, None);
    let lines: Vec<String> = live_frames
        .iter()
        .map(|f| serde_json::to_string(f).unwrap())
        .collect();
    std::fs::write(&path, lines.join("\n")).unwrap();

    let mut recording = RecordedPose::from_json_lines(&path).unwrap();
    let mut session = session(config_for(ExerciseKind::Knee));
    let mut recorder = SessionRecorder::new(&dir, Some("replay".to_string()));
    while !recording.is_finished() {
        let outcome = session.process_estimate(recording.estimate(None));
        recorder.add_frame(0.0, session.active_exercise(), outcome, session.count());
    }

    assert_eq!(session.count(), 5);
    assert_eq!(recorder.events().len(), 5);
    assert_eq!(recorder.frame_count(), FRAMES);

    let exported = recorder.export_csv().unwrap();
    let reps = std::fs::read_to_string(exported.join("repetitions.csv")).unwrap();
    assert_eq!(reps.lines().count(), 6);

    let _ = std::fs::remove_dir_all(&dir);
}
