use std::path::{Path, PathBuf};

use chrono::Utc;
use eframe::{
    egui::{self, Color32, CursorIcon, PointerButton, Pos2, Rect, RichText, Sense, Ui},
    epaint::Shadow,
    App, CreationContext, Frame,
};
use rfd::FileDialog;
use tracing::{info, warn};

use crate::{
    config::ViewerConfig,
    export::save_snapshot,
    model::ProjectRecord,
    render::{draw_frame, zoom_label, FrameInputs},
    source::load_projects,
    view::{FrameLoop, PointerEvent, ViewState},
};

pub struct TimelineApp {
    config: ViewerConfig,
    projects: Vec<ProjectRecord>,
    view: ViewState,
    frame_loop: FrameLoop,
    status: String,
    config_path: Option<PathBuf>,
    last_pointer: Option<Pos2>,
    pending_export: Option<PathBuf>,
}

impl TimelineApp {
    pub fn new(
        cc: &CreationContext<'_>,
        config: ViewerConfig,
        projects: Vec<ProjectRecord>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        cc.egui_ctx.set_pixels_per_point(config.ui_scale);
        Self::with_projects(config, projects)
    }

    /// Builds the app state without touching any window.
    pub fn with_projects(config: ViewerConfig, projects: Vec<ProjectRecord>) -> Self {
        let view = ViewState {
            show_info_banner: config.show_info_banner,
            is_fullscreen: config.start_fullscreen,
            ..ViewState::default()
        };
        let status = if projects.is_empty() {
            "No projects loaded".to_string()
        } else {
            format!("{} projects", projects.len())
        };
        Self {
            frame_loop: FrameLoop::new(config.animation_step),
            config,
            projects,
            view,
            status,
            config_path: None,
            last_pointer: None,
            pending_export: None,
        }
    }

    /// Where settings such as the last opened file are written back.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn accent(&self) -> Color32 {
        self.config.accent()
    }

    fn surface_panel() -> egui::Frame {
        egui::Frame::default()
            .fill(Color32::from_rgba_unmultiplied(18, 23, 34, 236))
            .stroke(egui::Stroke::new(
                1.0,
                Color32::from_rgba_unmultiplied(255, 255, 255, 20),
            ))
            .inner_margin(egui::Margin::symmetric(14.0, 8.0))
    }

    fn card_frame() -> egui::Frame {
        egui::Frame::default()
            .fill(Color32::from_rgba_unmultiplied(18, 23, 34, 240))
            .stroke(egui::Stroke::new(
                1.0,
                Color32::from_rgba_unmultiplied(255, 255, 255, 30),
            ))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(10.0))
            .shadow(Shadow {
                offset: egui::vec2(0.0, 6.0),
                blur: 24.0,
                spread: 0.0,
                color: Color32::from_rgba_unmultiplied(0, 0, 0, 130),
            })
    }

    fn replace_projects(&mut self, path: &Path) {
        match load_projects(path) {
            Ok(projects) => {
                self.projects = projects;
                self.view.clamp_hover(self.projects.len());
                self.status = format!(
                    "Loaded {} ({} projects)",
                    path.display(),
                    self.projects.len()
                );
                self.remember_projects_path(path);
            }
            Err(err) => {
                warn!(error = %err, "project load failed");
                self.status = format!("Load failed: {err}");
            }
        }
    }

    /// Persists the last opened file so the next launch shows it again.
    /// The stored file is re-read so command-line overrides are not saved.
    fn remember_projects_path(&mut self, path: &Path) {
        self.config.projects_path = Some(path.to_path_buf());
        let Some(config_path) = &self.config_path else {
            return;
        };
        let saved = ViewerConfig::load_from(config_path).and_then(|mut stored| {
            stored.projects_path = Some(path.to_path_buf());
            stored.save_to(config_path)
        });
        match saved {
            Ok(()) => info!(config = %config_path.display(), "remembered project file"),
            Err(err) => warn!(error = %err, "could not remember project file"),
        }
    }

    fn open_projects(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("Projects", &["json", "csv"])
            .pick_file()
        {
            self.replace_projects(&path);
        }
    }

    fn request_export(&mut self, ctx: &egui::Context) {
        let Some(path) = FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("timeline.png")
            .save_file()
        else {
            return;
        };
        self.pending_export = Some(path);
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot);
    }

    fn finish_export(&mut self, ctx: &egui::Context) {
        if self.pending_export.is_none() {
            return;
        }
        let shot = ctx.input(|i| {
            i.events.iter().find_map(|event| match event {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let (Some(image), Some(path)) = (shot, self.pending_export.take()) else {
            return;
        };
        match save_snapshot(&image, &path) {
            Ok(()) => self.status = format!("Exported {}", path.display()),
            Err(err) => {
                warn!(error = %err, "snapshot export failed");
                self.status = format!("Export failed: {err}");
            }
        }
    }

    fn toggle_fullscreen(&mut self, ctx: &egui::Context) {
        let fullscreen = self.view.toggle_fullscreen();
        info!(fullscreen, "fullscreen toggled");
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(fullscreen));
    }

    fn shortcuts(&mut self, ctx: &egui::Context) {
        let (zoom_in, zoom_out, reset, fullscreen) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Num0),
                i.key_pressed(egui::Key::F11),
            )
        });
        if zoom_in {
            self.view.zoom_in();
        }
        if zoom_out {
            self.view.zoom_out();
        }
        if reset {
            self.view.reset_view();
        }
        if fullscreen {
            self.toggle_fullscreen(ctx);
        }
    }

    fn toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(self.config.title.as_str())
                    .size(18.0)
                    .strong()
                    .color(self.accent()),
            );
            ui.separator();
            if ui.button("📂 Open…").clicked() {
                self.open_projects();
            }
            if ui
                .add_enabled(!self.projects.is_empty(), egui::Button::new("📷 Export PNG"))
                .clicked()
            {
                self.request_export(ui.ctx());
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.view.is_fullscreen {
                    "🗗 Exit fullscreen"
                } else {
                    "🗖 Fullscreen"
                };
                if ui.button(label).clicked() {
                    self.toggle_fullscreen(ui.ctx());
                }
                if ui.button("Reset").clicked() {
                    self.view.reset_view();
                }
                if ui.button("＋").on_hover_text("Zoom in").clicked() {
                    self.view.zoom_in();
                }
                ui.monospace(zoom_label(self.view.zoom));
                if ui.button("－").on_hover_text("Zoom out").clicked() {
                    self.view.zoom_out();
                }
            });
        });
    }

    fn canvas(&mut self, ui: &mut Ui) {
        let (resp, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        self.handle_canvas_input(ui, &resp);

        if self.projects.is_empty() {
            painter.text(
                resp.rect.center(),
                egui::Align2::CENTER_CENTER,
                "No projects loaded. Use Open to choose a JSON or CSV file.",
                egui::FontId::proportional(16.0),
                Color32::from_gray(160),
            );
            return;
        }

        let inputs = FrameInputs {
            projects: &self.projects,
            view: &self.view,
            now_ms: Utc::now().timestamp_millis() as f64,
            accent: self.accent(),
            title: &self.config.title,
            subtitle: &self.config.subtitle,
        };
        draw_frame(&painter, resp.rect, &inputs);
    }

    /// Feeds this frame's pointer events, in arrival order, to the view.
    fn handle_canvas_input(&mut self, ui: &Ui, resp: &egui::Response) {
        let count = self.projects.len();
        let over_canvas = resp.contains_pointer();
        let (events, scroll) = ui.input(|i| (i.events.clone(), i.raw_scroll_delta.y));

        let pointer_events =
            canvas_pointer_events(&events, resp.rect, over_canvas, &mut self.last_pointer);
        for event in pointer_events {
            self.view.handle_pointer(event, count);
        }

        if over_canvas && scroll != 0.0 {
            self.view.apply_wheel(scroll);
            ui.ctx().input_mut(|i| {
                i.raw_scroll_delta = egui::Vec2::ZERO;
                i.smooth_scroll_delta = egui::Vec2::ZERO;
            });
        }

        if over_canvas {
            let cursor = if self.view.is_dragging() {
                CursorIcon::Grabbing
            } else if self.view.hovered_row.is_some() {
                CursorIcon::PointingHand
            } else {
                CursorIcon::Grab
            };
            ui.ctx().set_cursor_icon(cursor);
        }
    }

    fn info_banner(&mut self, ctx: &egui::Context) {
        if !self.view.show_info_banner || self.projects.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("info_banner"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -56.0))
            .show(ctx, |ui| {
                Self::card_frame().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("ℹ").color(self.accent()).size(16.0));
                        ui.label(
                            "Drag to pan, scroll or use the toolbar to zoom, \
                             hover a project to see its dates.",
                        );
                        if ui.small_button("✕").clicked() {
                            self.view.dismiss_info_banner();
                        }
                    });
                });
            });
    }
}

/// Converts raw pointer events into canvas-local state-machine events.
/// A press and release inside one frame both come through, in order.
fn canvas_pointer_events(
    events: &[egui::Event],
    rect: Rect,
    over_canvas: bool,
    last_pointer: &mut Option<Pos2>,
) -> Vec<PointerEvent> {
    let mut out = Vec::new();
    let local = |pos: Pos2| (pos - rect.min).to_pos2();
    for event in events {
        match event {
            egui::Event::PointerMoved(pos) if over_canvas && rect.contains(*pos) => {
                let pos = local(*pos);
                if *last_pointer != Some(pos) {
                    out.push(PointerEvent::Move(pos));
                }
                *last_pointer = Some(pos);
            }
            egui::Event::PointerMoved(_) | egui::Event::PointerGone => {
                if last_pointer.take().is_some() {
                    out.push(PointerEvent::Leave);
                }
            }
            egui::Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed: true,
                ..
            } if over_canvas && rect.contains(*pos) => {
                let pos = local(*pos);
                out.push(PointerEvent::Down(pos));
                *last_pointer = Some(pos);
            }
            egui::Event::PointerButton {
                button: PointerButton::Primary,
                pressed: false,
                ..
            } => out.push(PointerEvent::Up),
            _ => {}
        }
    }
    if !over_canvas && last_pointer.take().is_some() {
        out.push(PointerEvent::Leave);
    }
    out
}

impl App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.finish_export(ctx);
        self.shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar")
            .frame(Self::surface_panel())
            .show(ctx, |ui| self.toolbar(ui));

        egui::TopBottomPanel::bottom("status")
            .frame(Self::surface_panel())
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(self.status.as_str());
                    ui.separator();
                    ui.monospace(format!(
                        "pan {:.0},{:.0}  zoom {}",
                        self.view.pan.x,
                        self.view.pan.y,
                        zoom_label(self.view.zoom)
                    ));
                    let hovered = self.view.hovered_row.and_then(|row| self.projects.get(row));
                    if let Some(project) = hovered {
                        ui.separator();
                        ui.label(format!("{} · {}", project.code, project.name));
                    }
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::from_rgb(10, 13, 21)))
            .show(ctx, |ui| self.canvas(ui));

        self.info_banner(ctx);

        if self
            .frame_loop
            .tick(&mut self.view.clock, !self.projects.is_empty())
        {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.frame_loop.cancel();
    }
}
