// src/ui.rs - Theme and overlay painting
use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};
use image::DynamicImage;
use rep_tracker::pose::SkeletonOverlay;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub surface: Color32,
    pub error: Color32,
    pub warning: Color32,
    pub success: Color32,
    pub skeleton: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(70, 130, 240),
            surface: Color32::from_rgb(30, 30, 35),
            error: Color32::from_rgb(244, 67, 54),
            warning: Color32::from_rgb(255, 152, 0),
            success: Color32::from_rgb(76, 175, 80),
            skeleton: Color32::RED,
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(200, 200, 200),
        }
    }
}

pub fn create_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(30, 30, 35);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(45, 45, 52);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(55, 55, 65);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(70, 130, 240);

    visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(8.0);
    visuals.widgets.active.rounding = egui::Rounding::same(8.0);

    visuals.window_rounding = egui::Rounding::same(12.0);
    visuals.menu_rounding = egui::Rounding::same(8.0);

    visuals
}

/// Camera frame texture plus the skeleton drawn over it
pub struct VideoWidget {
    texture: Option<egui::TextureHandle>,
    aspect_ratio: f32,
}

impl VideoWidget {
    pub fn new() -> Self {
        Self {
            texture: None,
            aspect_ratio: 16.0 / 9.0,
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: &DynamicImage, mirror: bool) {
        let mut rgba = frame.to_rgba8();
        if mirror {
            rgba = image::imageops::flip_horizontal(&rgba);
        }
        let size = [rgba.width() as usize, rgba.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice());

        self.aspect_ratio = size[0] as f32 / size[1].max(1) as f32;
        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, Default::default()),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, Default::default()));
            }
        }
    }

    /// Draws the frame (or a placeholder) and the overlay, scaled from
    /// source pixels to the widget rect
    pub fn show(
        &self,
        ui: &mut egui::Ui,
        theme: &Theme,
        overlay: Option<&SkeletonOverlay>,
        source_size: Option<(u32, u32)>,
    ) {
        let available = ui.available_size();
        let mut width = available.x;
        let mut height = width / self.aspect_ratio;
        if height > available.y {
            height = available.y;
            width = height * self.aspect_ratio;
        }

        let (rect, _response) = ui.allocate_exact_size(Vec2::new(width, height), egui::Sense::hover());
        let painter = ui.painter_at(rect);

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        } else {
            painter.rect_filled(rect, egui::Rounding::same(4.0), Color32::from_rgb(50, 50, 55));
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No Video Signal",
                egui::FontId::proportional(16.0),
                Color32::from_rgb(150, 150, 155),
            );
        }

        if let (Some(overlay), Some((src_w, src_h))) = (overlay, source_size) {
            draw_skeleton(&painter, rect, overlay, src_w as f32, src_h as f32, theme.skeleton);
        }
    }
}

pub fn draw_skeleton(
    painter: &egui::Painter,
    rect: Rect,
    overlay: &SkeletonOverlay,
    source_width: f32,
    source_height: f32,
    color: Color32,
) {
    let sx = rect.width() / source_width.max(1.0);
    let sy = rect.height() / source_height.max(1.0);
    let to_screen = |x: f64, y: f64| Pos2::new(rect.left() + x as f32 * sx, rect.top() + y as f32 * sy);

    for segment in overlay.visible_segments() {
        painter.line_segment(
            [
                to_screen(segment.from.x, segment.from.y),
                to_screen(segment.to.x, segment.to.y),
            ],
            Stroke::new(2.0, color),
        );
    }

    for marker in overlay.visible_markers() {
        painter.circle_filled(to_screen(marker.position.x, marker.position.y), 3.0, color);
    }
}

/// Large repetition counter
pub fn draw_count(ui: &mut egui::Ui, theme: &Theme, count: u32, running: bool) {
    let color = if running { theme.success } else { theme.text_secondary };
    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new("Repetitions").size(18.0).color(theme.text_secondary));
        ui.label(egui::RichText::new(count.to_string()).size(72.0).strong().color(color));
    });
}

/// Where the current angle sits between the flexed and extended thresholds
pub fn draw_angle_bar(ui: &mut egui::Ui, theme: &Theme, angle: Option<f64>, flexed_max: f64, extended_min: f64) {
    ui.horizontal(|ui| {
        ui.label("Angle");

        let bar_width = 200.0;
        let bar_height = 20.0;
        let rect = ui.allocate_space(Vec2::new(bar_width, bar_height)).1;
        let painter = ui.painter();

        painter.rect_filled(rect, egui::Rounding::same(4.0), theme.surface);

        let x_for = |deg: f64| rect.left() + (deg / 180.0).clamp(0.0, 1.0) as f32 * bar_width;
        for threshold in [flexed_max, extended_min] {
            painter.line_segment(
                [Pos2::new(x_for(threshold), rect.top()), Pos2::new(x_for(threshold), rect.bottom())],
                Stroke::new(1.0, theme.text_secondary),
            );
        }

        let Some(angle) = angle else {
            return;
        };

        let color = if angle > extended_min {
            theme.success
        } else if angle < flexed_max {
            theme.warning
        } else {
            theme.primary
        };
        let fill_rect = Rect::from_min_max(rect.min, Pos2::new(x_for(angle), rect.bottom()));
        painter.rect_filled(fill_rect, egui::Rounding::same(4.0), color.linear_multiply(0.7));

        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            format!("{:.0}°", angle),
            egui::FontId::proportional(12.0),
            theme.text_primary,
        );
    });
}
