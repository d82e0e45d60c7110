// src/data.rs - Session recording with CSV export and an HTML summary
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::counter::RepetitionEvent;
use crate::error::Result;
use crate::exercise::ExerciseKind;
use crate::session::{FrameOutcome, SkipReason};

#[derive(Debug, Serialize)]
struct FrameRecord {
    frame: u64,
    timestamp: f64,
    exercise: String,
    angle: Option<f64>,
    skipped: Option<String>,
    count: u32,
}

#[derive(Debug, Serialize)]
struct RepetitionRecord {
    session_id: String,
    exercise: String,
    count: u32,
    angle: f64,
    timestamp: f64,
}

#[derive(Debug, Clone)]
struct FrameSample {
    timestamp: f64,
    exercise: ExerciseKind,
    outcome: FrameOutcome,
    count: u32,
}

pub struct SessionRecorder {
    output_dir: PathBuf,
    session_name: String,
    session_id: uuid::Uuid,
    samples: Vec<FrameSample>,
    events: Vec<RepetitionEvent>,
}

impl SessionRecorder {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            session_id: uuid::Uuid::new_v4(),
            samples: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Record one processed frame. Idle frames are not part of the session.
    pub fn add_frame(&mut self, timestamp: f64, exercise: ExerciseKind, outcome: FrameOutcome, count: u32) {
        if outcome == FrameOutcome::Idle {
            return;
        }
        if let Some(event) = outcome.event() {
            self.events.push(event);
        }
        self.samples.push(FrameSample {
            timestamp,
            exercise,
            outcome,
            count,
        });
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    pub fn events(&self) -> &[RepetitionEvent] {
        &self.events
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.events.clear();
    }

    /// Writes `frames.csv` and `repetitions.csv`, returns the session directory
    pub fn export_csv(&self) -> Result<PathBuf> {
        let dir = self.session_dir();
        std::fs::create_dir_all(&dir)?;

        let mut writer = Writer::from_writer(File::create(dir.join("frames.csv"))?);
        for (i, sample) in self.samples.iter().enumerate() {
            writer.serialize(Self::create_frame_record(i as u64, sample))?;
        }
        writer.flush()?;

        let mut writer = Writer::from_writer(File::create(dir.join("repetitions.csv"))?);
        for event in &self.events {
            writer.serialize(RepetitionRecord {
                session_id: self.session_id.to_string(),
                exercise: event.exercise.to_string(),
                count: event.count,
                angle: event.angle,
                timestamp: event.timestamp,
            })?;
        }
        writer.flush()?;

        Ok(dir)
    }

    fn create_frame_record(frame: u64, sample: &FrameSample) -> FrameRecord {
        let (angle, skipped) = match sample.outcome {
            FrameOutcome::Measured { angle, .. } => (Some(angle), None),
            FrameOutcome::Skipped(reason) => (None, Some(Self::skip_label(reason))),
            FrameOutcome::Idle => (None, None),
        };

        FrameRecord {
            frame,
            timestamp: sample.timestamp,
            exercise: sample.exercise.to_string(),
            angle,
            skipped,
            count: sample.count,
        }
    }

    fn skip_label(reason: SkipReason) -> String {
        match reason {
            SkipReason::MissingLandmark(index) => format!("missing_landmark_{}", index),
            SkipReason::DegenerateGeometry => "degenerate_geometry".to_string(),
            SkipReason::GateUnresolved => "gate_unresolved".to_string(),
            SkipReason::InferenceFailed => "inference_failed".to_string(),
        }
    }

    fn repetitions_for(&self, exercise: ExerciseKind) -> usize {
        self.events.iter().filter(|e| e.exercise == exercise).count()
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let report_path = self.session_dir().join("report.html");
        std::fs::create_dir_all(self.session_dir())?;
        std::fs::write(&report_path, self.create_html_report())?;
        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let total_frames = self.samples.len();
        let measured = self
            .samples
            .iter()
            .filter(|s| matches!(s.outcome, FrameOutcome::Measured { .. }))
            .count();
        let usable_rate = if total_frames == 0 {
            0.0
        } else {
            measured as f64 / total_frames as f64 * 100.0
        };

        let rows: String = ExerciseKind::ALL
            .iter()
            .map(|kind| {
                format!(
                    r#"
        <div class="stat-item">
            <span class="stat-label">{} repetitions:</span>
            <span class="stat-value">{}</span>
        </div>"#,
                    kind,
                    self.repetitions_for(*kind)
                )
            })
            .collect();

        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <title>Repetition Report - {name}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-item {{ margin: 10px 0; }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
    </style>
</head>
<body>
    <h1>Repetition Session Report</h1>
    <div class="stats">
        <h2>Session: {name}</h2>
        <div class="stat-item">
            <span class="stat-label">Total Frames:</span>
            <span class="stat-value">{total_frames}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Usable Frames:</span>
            <span class="stat-value">{usable_rate:.1}%</span>
        </div>{rows}
    </div>
</body>
</html>
"#,
            name = self.session_name,
        )
    }
}
