// src/app.rs
use std::path::PathBuf;
use std::time::Instant;

use eframe::egui;
use image::DynamicImage;
use tracing::{error, info, warn};

use rep_tracker::{
    ExerciseKind, ExerciseSession, GateThreshold, KeypointFrame, PoseSource, RecordedPose,
    SessionRecorder, SimulatedPose, SkeletonOverlay, TrackerConfig,
};

use crate::ui::{self, Theme, VideoWidget};
use crate::video::CameraSource;

#[derive(Debug, Clone, Copy, PartialEq)]
enum GateMode {
    Pixels,
    FractionOfWidth,
}

pub struct RepTrackerApp {
    // Core components
    session: ExerciseSession,
    simulation: SimulatedPose,
    recording: Option<RecordedPose>,
    camera: Option<CameraSource>,
    recorder: SessionRecorder,

    // Frame pacing
    last_tick: Instant,
    last_timestamp: f64,

    // Latest frame for the overlay
    current_frame: Option<KeypointFrame>,
    current_overlay: Option<SkeletonOverlay>,

    // UI State
    theme: Theme,
    video: VideoWidget,
    show_settings: bool,
    status: Option<String>,

    // Settings being edited, applied on demand
    draft: TrackerConfig,
    gate_mode: GateMode,
    gate_value: f64,
    output_directory: PathBuf,
}

impl RepTrackerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: TrackerConfig) -> Self {
        let session = match ExerciseSession::new(config.clone()) {
            Ok(session) => session,
            Err(e) => {
                warn!("Invalid configuration ({}), using defaults", e);
                ExerciseSession::default()
            }
        };

        let camera = match CameraSource::open(0) {
            Ok(camera) => {
                let (w, h) = camera.resolution();
                info!("Live camera at {}x{}", w, h);
                Some(camera)
            }
            Err(e) => {
                warn!("No camera, running without video: {}", e);
                None
            }
        };

        let output_directory = directories::UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|p| p.join("RepTracker")))
            .unwrap_or_else(|| PathBuf::from("./output"));

        let draft = session.config().clone();
        let (gate_mode, gate_value) = Self::gate_settings(&draft);

        Self {
            simulation: SimulatedPose::new(session.active_exercise()),
            session,
            recording: None,
            camera,
            recorder: SessionRecorder::new(&output_directory, None),
            last_tick: Instant::now(),
            last_timestamp: 0.0,
            current_frame: None,
            current_overlay: None,
            theme: Theme::default(),
            video: VideoWidget::new(),
            show_settings: false,
            status: None,
            draft,
            gate_mode,
            gate_value,
            output_directory,
        }
    }

    fn gate_settings(config: &TrackerConfig) -> (GateMode, f64) {
        match config.knee.gate.map(|g| g.min_x) {
            Some(GateThreshold::FractionOfWidth(f)) => (GateMode::FractionOfWidth, f),
            Some(GateThreshold::Pixels(px)) => (GateMode::Pixels, px),
            None => (GateMode::Pixels, 650.0),
        }
    }

    fn pose_source(&mut self) -> &mut dyn PoseSource {
        match self.recording.as_mut() {
            Some(recording) => recording as &mut dyn PoseSource,
            None => &mut self.simulation as &mut dyn PoseSource,
        }
    }

    fn toggle_session(&mut self) {
        if self.session.is_running() {
            self.session.stop();
        } else {
            self.session.start();
            self.last_tick = Instant::now();
        }
    }

    fn select_exercise(&mut self, kind: ExerciseKind) {
        if kind != self.session.active_exercise() {
            self.session.switch_exercise(kind);
            self.simulation.set_exercise(kind);
            self.draft.exercise = kind;
            self.current_overlay = None;
        }
    }

    /// One frame step at the configured rate: capture, estimate, count
    fn tick(&mut self, ctx: &egui::Context) {
        if !self.session.is_running() {
            return;
        }
        if self.last_tick.elapsed() < self.session.config().frame_interval() {
            return;
        }
        self.last_tick = Instant::now();

        let image: Option<DynamicImage> = match self.camera.as_mut().map(|c| c.read_frame()) {
            Some(Ok(image)) => Some(image),
            Some(Err(e)) => {
                warn!("Camera frame lost: {}", e);
                None
            }
            None => None,
        };
        if let Some(image) = &image {
            self.video.update_frame(ctx, image, self.session.config().mirror);
        }

        let estimate = self.pose_source().estimate(image.as_ref());
        let outcome = match estimate {
            Ok(frame) => {
                self.last_timestamp = frame.timestamp;
                let outcome = self.session.process_frame_detailed(&frame);
                self.current_overlay = Some(self.session.overlay(&frame));
                self.current_frame = Some(frame);
                outcome
            }
            Err(e) => self.session.process_estimate(Err(e)),
        };

        self.recorder.add_frame(
            self.last_timestamp,
            self.session.active_exercise(),
            outcome,
            self.session.count(),
        );

        if self.recording.as_ref().map_or(false, |r| r.is_finished()) {
            info!("Recording finished with {} repetitions", self.session.count());
            self.session.stop();
            self.recording = None;
            self.status = Some("Recording finished".to_string());
        }
    }

    fn source_size(&self) -> Option<(u32, u32)> {
        let frame = self.current_frame.as_ref()?;
        Some((frame.width?, frame.height?))
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                ui.heading("Repetition Tracker");
                ui.separator();

                let label = if self.session.is_running() { "⏹ Stop" } else { "▶ Start" };
                let fill = if self.session.is_running() { self.theme.error } else { self.theme.success };
                if ui
                    .add_sized([100.0, 32.0], egui::Button::new(label).fill(fill))
                    .clicked()
                {
                    self.toggle_session();
                }

                if ui.button("↺ Restart").clicked() {
                    self.session.restart();
                    self.recorder.clear();
                }

                ui.separator();

                let mut selected = self.session.active_exercise();
                egui::ComboBox::from_label("Exercise")
                    .selected_text(selected.name())
                    .show_ui(ui, |ui| {
                        for kind in ExerciseKind::ALL {
                            ui.selectable_value(&mut selected, kind, kind.name());
                        }
                    });
                self.select_exercise(selected);

                let mut mirror = self.session.config().mirror;
                if ui.checkbox(&mut mirror, "Mirror").changed() {
                    self.session.set_mirror(mirror);
                    self.draft.mirror = mirror;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                });
            });
            ui.add_space(10.0);
        });
    }

    fn render_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("session").min_width(280.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui::draw_count(ui, &self.theme, self.session.count(), self.session.is_running());
            ui.separator();

            let definition = self.session.definition().clone();
            ui::draw_angle_bar(
                ui,
                &self.theme,
                self.session.last_angle(),
                definition.flexed_max,
                definition.extended_min,
            );
            ui.label(format!(
                "Extended above {:.0}°, flexed below {:.0}°",
                definition.extended_min, definition.flexed_max
            ));

            ui.separator();
            let stats = self.session.stats();
            ui.label(format!("Frames measured: {}", stats.frames_measured));
            ui.label(format!("Frames skipped: {}", stats.frames_skipped));
            ui.label(format!("Frames dropped: {}", stats.frames_dropped));
            ui.label(format!("Pose source: {}", self.pose_source().name()));

            ui.separator();
            ui.heading("Session Data");
            if ui.button("Choose Folder...").clicked() {
                if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                    self.output_directory = dir;
                    self.recorder = SessionRecorder::new(&self.output_directory, None);
                }
            }
            ui.label(self.output_directory.display().to_string());

            if ui.button("Export to CSV").clicked() {
                self.export_data_to_csv();
            }
            if ui.button("Generate Report").clicked() {
                self.generate_report();
            }
            if ui.button("Load Keypoint Recording...").clicked() {
                self.load_recording();
            }

            if let Some(status) = &self.status {
                ui.add_space(10.0);
                ui.colored_label(self.theme.text_secondary, status);
            }
        });
    }

    fn render_main_content(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let size = self.source_size();
            self.video.show(ui, &self.theme, self.current_overlay.as_ref(), size);
        });
    }

    fn render_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        let mut apply = false;
        let mut save = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(true)
            .default_size([400.0, 500.0])
            .show(ctx, |ui| {
                ui.heading("Tracking");
                ui.label("Confidence Threshold:");
                ui.add(egui::Slider::new(&mut self.draft.confidence_threshold, 0.0..=1.0).step_by(0.01));
                ui.label("Evaluations per second:");
                ui.add(egui::Slider::new(&mut self.draft.frame_rate, 1.0..=60.0));

                for kind in ExerciseKind::ALL {
                    ui.separator();
                    ui.heading(format!("{} thresholds", kind.name()));
                    let definition = self.draft.definition_mut(kind);
                    ui.add(egui::Slider::new(&mut definition.extended_min, 0.0..=180.0).text("extended above"));
                    ui.add(egui::Slider::new(&mut definition.flexed_max, 0.0..=180.0).text("flexed below"));
                }

                ui.separator();
                ui.heading("Knee posture gate");
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.gate_mode, GateMode::Pixels, "Pixels");
                    ui.selectable_value(&mut self.gate_mode, GateMode::FractionOfWidth, "Fraction of width");
                });
                match self.gate_mode {
                    GateMode::Pixels => {
                        ui.add(egui::Slider::new(&mut self.gate_value, 0.0..=3840.0).text("shoulder x above"));
                    }
                    GateMode::FractionOfWidth => {
                        self.gate_value = self.gate_value.clamp(0.0, 1.0);
                        ui.add(egui::Slider::new(&mut self.gate_value, 0.0..=1.0).text("shoulder x above"));
                    }
                }

                ui.separator();
                ui.horizontal(|ui| {
                    apply = ui.button("Apply (resets count)").clicked();
                    save = ui.button("Save as default").clicked();
                });
            });

        self.show_settings = open;

        if apply || save {
            self.draft.set_knee_gate(match self.gate_mode {
                GateMode::Pixels => GateThreshold::Pixels(self.gate_value),
                GateMode::FractionOfWidth => GateThreshold::FractionOfWidth(self.gate_value),
            });
        }
        if apply {
            self.apply_settings();
        }
        if save {
            self.save_settings();
        }
    }

    fn apply_settings(&mut self) {
        match self.session.reconfigure(self.draft.clone()) {
            Ok(()) => {
                self.simulation.set_exercise(self.session.active_exercise());
                self.status = Some("Settings applied".to_string());
            }
            Err(e) => {
                warn!("Settings rejected: {}", e);
                self.status = Some(format!("Settings rejected: {}", e));
            }
        }
    }

    fn save_settings(&mut self) {
        let Some(path) = TrackerConfig::default_path() else {
            self.status = Some("No configuration directory on this platform".to_string());
            return;
        };
        self.status = Some(match self.draft.save(&path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => format!("Save failed: {}", e),
        });
    }

    fn export_data_to_csv(&mut self) {
        self.status = Some(match self.recorder.export_csv() {
            Ok(dir) => format!("Exported to {}", dir.display()),
            Err(e) => {
                error!("CSV export failed: {}", e);
                format!("Export failed: {}", e)
            }
        });
    }

    fn generate_report(&mut self) {
        self.status = Some(match self.recorder.generate_report() {
            Ok(path) => format!("Report written to {}", path.display()),
            Err(e) => {
                error!("Report generation failed: {}", e);
                format!("Report failed: {}", e)
            }
        });
    }

    fn load_recording(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Keypoint frames", &["jsonl", "json"])
            .pick_file()
        else {
            return;
        };

        match RecordedPose::from_json_lines(&path) {
            Ok(recording) => {
                self.status = Some(format!("Loaded {} frames", recording.total()));
                self.recording = Some(recording);
                self.session.restart();
                self.recorder.clear();
            }
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                self.status = Some(format!("Load failed: {}", e));
            }
        }
    }
}

impl eframe::App for RepTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick(ctx);

        self.render_header(ctx);
        self.render_side_panel(ctx);

        if self.show_settings {
            self.render_settings_window(ctx);
        }

        self.render_main_content(ctx);

        if self.session.is_running() {
            ctx.request_repaint_after(self.session.config().frame_interval());
        }
    }
}
