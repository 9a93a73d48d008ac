use std::{cell::Cell, rc::Rc};

use egui::{pos2, vec2, Color32, FontFamily, FontId, Pos2, Rect, Shape, Stroke, TextStyle};
use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use pipes::{Field, PipeColor, PipesConfig, Scene, SegmentKind, SegmentVisual, TurnOrder};

/// Renderer: isometric projection + pixel-ish quantization.
struct IsoRenderer {
    scale: f32,
    pixel: f32,
    /// Multiplier on the config's cylinder/sphere scale hints.
    girth: f32,
}

impl Default for IsoRenderer {
    fn default() -> Self {
        Self {
            scale: 18.0,
            pixel: 3.0,
            girth: 4.0,
        }
    }
}

impl IsoRenderer {
    /// World space is Y-up; the projection wants height on its third axis.
    fn project(&self, p: Vector3<f32>) -> Pos2 {
        let (x, y, z) = (p.x, p.z, p.y);
        let sx = (x - y) * self.scale;
        let sy = (x + y) * 0.5 * self.scale - z * self.scale;
        pos2(sx, sy)
    }

    fn depth(p: Vector3<f32>) -> f32 {
        p.x + p.y + p.z
    }
}

/// Parses a host-supplied config; anything missing or rejected falls back to defaults.
pub fn config_or_default(toml: Option<&str>) -> PipesConfig {
    match toml.map(PipesConfig::from_toml_str) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            log::warn!("ignoring pipes config: {}", e);
            PipesConfig::default()
        }
        None => PipesConfig::default(),
    }
}

fn color32(c: PipeColor) -> Color32 {
    let (r, g, b) = c.to_rgb8();
    Color32::from_rgb(r, g, b)
}

pub struct PipesApp {
    pub ui_visible: Rc<Cell<bool>>,
    pub pointer_over_ui: Rc<Cell<bool>>,

    renderer: IsoRenderer,
    bg: Color32,

    /// Edited by the settings window, pushed to the field when it changes.
    config: PipesConfig,
    field: Field,
    scene: Scene,

    speed: f32,
    clock: f32,
}

impl PipesApp {
    pub fn new(
        seed: u64,
        config: PipesConfig,
        ui_visible: Rc<Cell<bool>>,
        pointer_over_ui: Rc<Cell<bool>>,
    ) -> Self {
        Self {
            ui_visible,
            pointer_over_ui,
            renderer: IsoRenderer::default(),
            bg: Color32::from_rgb(8, 10, 18),
            field: Field::new(config.clone(), seed),
            config,
            scene: Scene::new(),
            speed: 1.0,
            clock: 0.0,
        }
    }

    fn iso_centered(&self, rect: Rect, p: Vector3<f32>) -> Pos2 {
        self.renderer.project(p) + rect.center().to_vec2()
    }

    fn snap(&self, p: Pos2) -> Pos2 {
        let q = self.renderer.pixel.max(1.0);
        pos2((p.x / q).round() * q, (p.y / q).round() * q)
    }

    /// Software rasterizer: draws an aliased line by stepping along the path
    /// and drawing a square (voxel) at each grid point.
    fn draw_pixel_line(
        &self,
        painter: &egui::Painter,
        p1: Pos2,
        p2: Pos2,
        color: Color32,
        thickness_in_pixels: f32,
    ) {
        let px = self.renderer.pixel.max(1.0);
        let d = p2 - p1;
        let len = d.length();
        if len < 0.1 {
            return;
        }

        // Stepping by half a pixel keeps the squares overlapping.
        let steps = (len / (px * 0.5)).ceil() as i32;
        let size = px * thickness_in_pixels;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let r = Rect::from_center_size(self.snap(p1 + d * t), vec2(size, size));
            painter.rect_filled(r, 0.0, color);
        }
    }

    /// Draws a 3D box in isometric projection; only the three faces facing the viewer.
    fn draw_iso_box(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        center: Vector3<f32>,
        half: f32,
        color: PipeColor,
    ) {
        // Corners in the projection's (x, y, height) frame.
        let corner = |dx: f32, dy: f32, dz: f32| {
            let p = center + Vector3::new(dx * half, dz * half, dy * half);
            self.snap(self.iso_centered(rect, p))
        };
        let t_back = corner(-1.0, -1.0, 1.0);
        let t_right = corner(1.0, -1.0, 1.0);
        let t_front = corner(1.0, 1.0, 1.0);
        let t_left = corner(-1.0, 1.0, 1.0);
        let b_right = corner(1.0, -1.0, -1.0);
        let b_front = corner(1.0, 1.0, -1.0);
        let b_left = corner(-1.0, 1.0, -1.0);

        painter.add(Shape::convex_polygon(
            vec![t_right, t_front, b_front, b_right],
            color32(color.darken(0.5)),
            Stroke::NONE,
        ));
        painter.add(Shape::convex_polygon(
            vec![t_left, t_front, b_front, b_left],
            color32(color),
            Stroke::NONE,
        ));
        painter.add(Shape::convex_polygon(
            vec![t_back, t_right, t_front, t_left],
            color32(color.lighten(0.3)),
            Stroke::NONE,
        ));
    }

    fn draw_tube(&self, painter: &egui::Painter, rect: Rect, visual: &SegmentVisual) {
        let (from, to) = visual.axis_endpoints();
        let a = self.iso_centered(rect, from);
        let b = self.iso_centered(rect, to);

        let px = self.renderer.pixel.max(1.0);
        let width = visual.scale.x * self.renderer.girth * self.renderer.scale;
        let base_thick = (width / px).max(1.0);
        let shadow_thick = (width * 1.3 / px).max(1.0);
        let high_thick = (width * 0.35 / px).max(1.0);

        let d = (b - a).normalized();
        let perp = vec2(-d.y, d.x);

        self.draw_pixel_line(
            painter,
            a + perp * px,
            b + perp * px,
            color32(visual.color.darken(0.5)),
            shadow_thick,
        );
        self.draw_pixel_line(painter, a, b, color32(visual.color), base_thick);
        self.draw_pixel_line(
            painter,
            a - perp * px * 0.5,
            b - perp * px * 0.5,
            color32(visual.color.lighten(0.3)),
            high_thick,
        );
    }

    fn draw_scene(&self, painter: &egui::Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, self.bg);

        // Far to near.
        let mut visuals: Vec<&SegmentVisual> = self.scene.iter().map(|(_, v)| v).collect();
        visuals.sort_by_key(|v| OrderedFloat(IsoRenderer::depth(v.position)));

        for visual in visuals {
            match visual.kind {
                SegmentKind::Straight => self.draw_tube(painter, rect, visual),
                SegmentKind::Bend => {
                    let half = visual.scale.x * self.renderer.girth * 0.5;
                    self.draw_iso_box(painter, rect, visual.position, half, visual.color);
                }
            }
        }
    }

    fn settings_ui(&mut self, ui: &mut egui::Ui) {
        ui.add(egui::Slider::new(&mut self.speed, 0.1..=8.0).text("speed"));
        ui.add(egui::Slider::new(&mut self.renderer.scale, 6.0..=40.0).text("scale"));
        ui.add(egui::Slider::new(&mut self.renderer.pixel, 1.0..=8.0).text("pixel"));
        ui.add(egui::Slider::new(&mut self.renderer.girth, 1.0..=10.0).text("girth"));
        ui.separator();

        let before = self.config.clone();
        ui.add(egui::Slider::new(&mut self.config.build_delay, 0.01..=0.5).text("build delay"));
        ui.add(egui::Slider::new(&mut self.config.pipe_lifetime, 1.0..=120.0).text("lifetime"));
        ui.add(egui::Slider::new(&mut self.config.spawn_interval, 0.5..=20.0).text("spawn interval"));
        ui.add(egui::Slider::new(&mut self.config.bend_chance, 0.0..=1.0).text("bend chance"));
        ui.add(egui::Slider::new(&mut self.config.grid_size, 1..=20).text("grid size (on reset)"));
        ui.horizontal(|ui| {
            ui.label("turns");
            ui.radio_value(&mut self.config.turn_order, TurnOrder::Declaration, "in order");
            ui.radio_value(&mut self.config.turn_order, TurnOrder::Shuffled, "shuffled");
        });
        if self.config != before {
            if let Err(e) = self.field.reconfigure(self.config.clone()) {
                log::warn!("rejected settings: {}", e);
                self.config = before;
            }
        }

        if ui.button("reset pipes").clicked() {
            self.field.reset(&mut self.scene);
        }

        let stats = self.field.stats();
        ui.separator();
        ui.label(format!("pipes {} ({} growing)", stats.pipes, stats.growing));
        ui.label(format!("segments {}", stats.live_segments));
        ui.label(format!("cells {}/{}", stats.occupied_cells, stats.capacity));
    }
}

impl eframe::App for PipesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Dark, high contrast, monospace.
        let mut style = (*ctx.style()).clone();
        style.text_styles = [
            (TextStyle::Heading, FontId::new(18.0, FontFamily::Monospace)),
            (TextStyle::Body, FontId::new(14.0, FontFamily::Monospace)),
            (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
            (TextStyle::Button, FontId::new(14.0, FontFamily::Monospace)),
            (TextStyle::Small, FontId::new(12.0, FontFamily::Monospace)),
        ]
        .into();

        let gray_text = Color32::from_gray(160);
        let gray_border = Stroke::new(1.0, gray_text);
        style.visuals.window_fill = Color32::from_rgba_unmultiplied(0, 0, 0, 120);
        style.visuals.panel_fill = Color32::from_rgba_unmultiplied(0, 0, 0, 120);
        style.visuals.window_rounding = egui::Rounding::ZERO;
        style.visuals.widgets.noninteractive.fg_stroke = gray_border;
        style.visuals.widgets.inactive.fg_stroke = gray_border;
        style.visuals.widgets.noninteractive.bg_stroke = gray_border;
        style.visuals.widgets.inactive.bg_stroke = gray_border;
        style.visuals.override_text_color = Some(gray_text);
        ctx.set_style(style);

        // Simulation clock, scaled by the speed slider.
        let dt = ctx.input(|i| i.unstable_dt).max(0.0);
        self.clock += dt * self.speed;
        let report = self.field.update(self.clock, &mut self.scene);
        if let Some(id) = report.spawned {
            log::debug!("frame spawned pipe {}", id.0);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter_at(rect);
                self.draw_scene(&painter, rect);
            });

        self.pointer_over_ui.set(ctx.is_pointer_over_area());

        if self.ui_visible.get() {
            egui::Window::new("pipes3d")
                .default_pos((16.0, 16.0))
                .frame(
                    egui::Frame::none()
                        .fill(Color32::TRANSPARENT)
                        .rounding(egui::Rounding::ZERO)
                        .stroke(gray_border),
                )
                .show(ctx, |ui| self.settings_ui(ui));
        }

        ctx.request_repaint();
    }
}
