//! Per-frame drawing of the timeline onto an egui painter.
//!
//! Content is laid out in unzoomed content space (see [`crate::timeline`])
//! and mapped to the screen through [`Canvas`], which applies the current
//! pan and zoom to every position, length and font size.

use egui::{
    epaint::{Mesh, Vertex},
    pos2, vec2, Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2,
};

use crate::{
    model::{date_from_ms, ProjectRecord},
    timeline::{
        content_height, row_top, truncate_to_width, BarGeometry, DateDomain, LabelPlacement,
        TimelineLayout, BAR_HEIGHT, FOOTER_HEIGHT, HEADER_HEIGHT, INFO_COLUMN_X,
        NAME_COLUMN_WIDTH, ROW_HEIGHT,
    },
    view::ViewState,
};

pub const MIN_CONTENT_WIDTH: f32 = 960.0;
pub const HEADER_BAND_HEIGHT: f32 = 112.0;
pub const PARTICLE_COUNT: usize = 12;
pub const GRID_SPACING: f32 = 40.0;

pub const FOOTER_HINT: &str = "Drag to pan  •  Scroll to zoom  •  Hover a row for details";
pub const FOOTER_NOTE: &str = "Schedules are targets and may shift as phases complete";

const NAME_FONT: f32 = 15.0;
const BRAND_STRIPE: [Color32; 5] = [
    Color32::from_rgb(99, 102, 241),
    Color32::from_rgb(236, 72, 153),
    Color32::from_rgb(245, 158, 11),
    Color32::from_rgb(16, 185, 129),
    Color32::from_rgb(59, 130, 246),
];
const TEXT_PRIMARY: Color32 = Color32::from_rgb(226, 233, 242);
const TEXT_MUTED: Color32 = Color32::from_rgb(148, 163, 184);
const TODAY_COLOR: Color32 = Color32::from_rgb(248, 113, 113);

/// Everything a frame depends on. `now_ms` is injected so frames are
/// reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub projects: &'a [ProjectRecord],
    pub view: &'a ViewState,
    pub now_ms: f64,
    pub accent: Color32,
    pub title: &'a str,
    pub subtitle: &'a str,
}

/// Applies the view transform on top of the canvas origin.
struct Canvas<'a> {
    painter: &'a Painter,
    origin: Pos2,
    pan: Vec2,
    zoom: f32,
}

impl<'a> Canvas<'a> {
    fn pos(&self, x: f32, y: f32) -> Pos2 {
        self.origin + self.pan + vec2(x, y) * self.zoom
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(self.pos(x, y), vec2(w, h) * self.zoom)
    }

    fn len(&self, v: f32) -> f32 {
        v * self.zoom
    }

    fn stroke(&self, width: f32, color: Color32) -> Stroke {
        Stroke::new(self.len(width), color)
    }

    fn text(&self, at: Pos2, anchor: Align2, text: impl ToString, font: FontId, color: Color32) {
        let font = FontId::new(self.len(font.size), font.family);
        self.painter.text(at, anchor, text, font, color);
    }

    /// Width of `text` in content space.
    fn text_width(&self, text: &str, font: FontId) -> f32 {
        self.painter
            .layout_no_wrap(text.to_owned(), font, TEXT_PRIMARY)
            .size()
            .x
    }
}

fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

fn gradient(rect: Rect, corners: [Color32; 4]) -> Shape {
    let mut mesh = Mesh::default();
    let i = mesh.vertices.len() as u32;
    for (pos, color) in [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ]
    .into_iter()
    .zip(corners)
    {
        mesh.vertices.push(Vertex {
            pos,
            uv: Default::default(),
            color,
        });
    }
    mesh.indices
        .extend_from_slice(&[i, i + 1, i + 2, i, i + 2, i + 3]);
    Shape::mesh(mesh)
}

fn vertical_gradient(rect: Rect, top: Color32, bottom: Color32) -> Shape {
    gradient(rect, [top, top, bottom, bottom])
}

fn horizontal_gradient(rect: Rect, left: Color32, right: Color32) -> Shape {
    gradient(rect, [left, right, right, left])
}

/// Drifting glow particle center, a pure function of clock and index.
pub fn particle_position(index: usize, clock: f32, width: f32, height: f32) -> Pos2 {
    let seed = index as f32;
    let x = ((clock * 0.23 + seed * 1.731).sin() * 0.5 + 0.5) * width;
    let y = ((clock * 0.17 + seed * 2.417).cos() * 0.5 + 0.5) * height;
    pos2(x, y)
}

/// Where the brand stripe highlight sits, in [0, 1).
pub fn stripe_highlight(clock: f32) -> f32 {
    (clock * 0.35).rem_euclid(1.0)
}

/// Today-marker glow strength, in [0, 1].
pub fn pulse(clock: f32) -> f32 {
    (clock * 3.0).sin() * 0.5 + 0.5
}

/// Offset of the scrolling background grid, in [0, GRID_SPACING).
pub fn grid_offset(clock: f32) -> f32 {
    (clock * 12.0).rem_euclid(GRID_SPACING)
}

pub fn zoom_label(zoom: f32) -> String {
    format!("{}%", (zoom * 100.0).round() as i32)
}

/// Draws one frame. An empty project list draws nothing.
pub fn draw_frame(painter: &Painter, rect: Rect, inputs: &FrameInputs<'_>) {
    if inputs.projects.is_empty() {
        return;
    }
    painter.rect_filled(rect, 0.0, Color32::from_rgb(10, 13, 21));

    let canvas = Canvas {
        painter,
        origin: rect.min,
        pan: inputs.view.pan,
        zoom: inputs.view.zoom,
    };
    let clock = inputs.view.clock.value();
    let width = rect.width().max(MIN_CONTENT_WIDTH);
    let height = rect.height().max(content_height(inputs.projects.len()));
    let domain = DateDomain::from_projects(inputs.projects);
    let layout = TimelineLayout::for_content_width(width);

    draw_background(&canvas, width, height, clock);
    draw_header(&canvas, width, inputs, domain.as_ref(), clock);

    if let Some(domain) = &domain {
        draw_month_grid(&canvas, domain, &layout, height);
        draw_today_marker(&canvas, domain, &layout, inputs.now_ms, height, clock);
    }

    for (index, project) in inputs.projects.iter().enumerate() {
        let hovered = inputs.view.hovered_row == Some(index);
        draw_row(
            &canvas,
            index,
            project,
            domain.as_ref(),
            &layout,
            hovered,
            width,
            inputs.accent,
            clock,
        );
    }

    draw_footer(&canvas, width, height);
}

fn draw_background(canvas: &Canvas<'_>, width: f32, height: f32, clock: f32) {
    canvas.painter.add(vertical_gradient(
        canvas.rect(0.0, 0.0, width, height),
        Color32::from_rgb(15, 20, 31),
        Color32::from_rgb(10, 13, 21),
    ));

    let grid = canvas.stroke(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 6));
    let offset = grid_offset(clock);
    let mut x = offset - GRID_SPACING;
    while x < width {
        canvas
            .painter
            .line_segment([canvas.pos(x, 0.0), canvas.pos(x, height)], grid);
        x += GRID_SPACING;
    }
    let mut y = offset - GRID_SPACING;
    while y < height {
        canvas
            .painter
            .line_segment([canvas.pos(0.0, y), canvas.pos(width, y)], grid);
        y += GRID_SPACING;
    }

    for index in 0..PARTICLE_COUNT {
        let p = particle_position(index, clock, width, height);
        let color = BRAND_STRIPE[index % BRAND_STRIPE.len()];
        let radius = 28.0 + (index % 3) as f32 * 18.0;
        for ring in 0..3 {
            let r = radius * (1.0 - ring as f32 * 0.3);
            canvas.painter.circle_filled(
                canvas.pos(p.x, p.y),
                canvas.len(r),
                with_alpha(color, 4 + ring * 3),
            );
        }
    }
}

fn draw_emblem(canvas: &Canvas<'_>, center: Pos2, accent: Color32) {
    let radius = 22.0;
    let points: Vec<Pos2> = (0..6)
        .map(|k| {
            let angle = std::f32::consts::FRAC_PI_3 * k as f32 - std::f32::consts::FRAC_PI_2;
            canvas.pos(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect();
    canvas.painter.add(Shape::convex_polygon(
        points,
        with_alpha(accent, 60),
        canvas.stroke(1.5, accent),
    ));
    canvas.text(
        canvas.pos(center.x, center.y),
        Align2::CENTER_CENTER,
        "PT",
        FontId::proportional(15.0),
        TEXT_PRIMARY,
    );
}

fn draw_header(
    canvas: &Canvas<'_>,
    width: f32,
    inputs: &FrameInputs<'_>,
    domain: Option<&DateDomain>,
    clock: f32,
) {
    canvas.painter.rect_filled(
        canvas.rect(0.0, 0.0, width, HEADER_BAND_HEIGHT),
        0.0,
        Color32::from_rgba_unmultiplied(18, 23, 34, 220),
    );

    draw_emblem(canvas, pos2(INFO_COLUMN_X + 22.0, 48.0), inputs.accent);

    canvas.text(
        canvas.pos(INFO_COLUMN_X + 60.0, 38.0),
        Align2::LEFT_CENTER,
        inputs.title,
        FontId::proportional(26.0),
        TEXT_PRIMARY,
    );
    let range = domain
        .and_then(|d| Some((date_from_ms(d.min)?, date_from_ms(d.max)?)))
        .map(|(from, to)| format!("  •  {} – {}", from.format("%b %Y"), to.format("%b %Y")))
        .unwrap_or_default();
    canvas.text(
        canvas.pos(INFO_COLUMN_X + 60.0, 66.0),
        Align2::LEFT_CENTER,
        format!(
            "{}  •  {} projects{range}",
            inputs.subtitle,
            inputs.projects.len()
        ),
        FontId::proportional(13.0),
        TEXT_MUTED,
    );

    // Brand stripe with a travelling highlight that wraps around.
    let stripe_y = HEADER_BAND_HEIGHT - 8.0;
    let segment = width / BRAND_STRIPE.len() as f32;
    for (k, color) in BRAND_STRIPE.iter().enumerate() {
        let next = BRAND_STRIPE[(k + 1) % BRAND_STRIPE.len()];
        canvas.painter.add(horizontal_gradient(
            canvas.rect(k as f32 * segment, stripe_y, segment, 4.0),
            *color,
            next,
        ));
    }
    let stripe = canvas.rect(0.0, stripe_y, width, 4.0);
    let glint_w = 140.0;
    let glint_x = stripe_highlight(clock) * (width + glint_w) - glint_w;
    let glint = canvas
        .rect(glint_x, stripe_y, glint_w, 4.0)
        .intersect(stripe);
    if glint.is_positive() {
        canvas
            .painter
            .rect_filled(glint, 0.0, Color32::from_rgba_unmultiplied(255, 255, 255, 150));
    }

    let badge = canvas.rect(width - 128.0, 26.0, 96.0, 30.0);
    canvas.painter.rect_filled(
        badge,
        canvas.len(15.0),
        with_alpha(inputs.accent, 50),
    );
    canvas
        .painter
        .rect_stroke(badge, canvas.len(15.0), canvas.stroke(1.0, inputs.accent));
    canvas.text(
        badge.center(),
        Align2::CENTER_CENTER,
        zoom_label(inputs.view.zoom),
        FontId::monospace(13.0),
        TEXT_PRIMARY,
    );
}

fn draw_month_grid(canvas: &Canvas<'_>, domain: &DateDomain, layout: &TimelineLayout, height: f32) {
    let top = HEADER_HEIGHT - 44.0;
    let bottom = height - FOOTER_HEIGHT;
    for tick in domain.month_ticks() {
        let x = layout.x_at(tick.fraction);
        let (stroke, color) = if tick.emphasized {
            (
                canvas.stroke(2.0, Color32::from_rgba_unmultiplied(255, 255, 255, 60)),
                TEXT_PRIMARY,
            )
        } else {
            (
                canvas.stroke(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 18)),
                TEXT_MUTED,
            )
        };
        canvas
            .painter
            .line_segment([canvas.pos(x, top), canvas.pos(x, bottom)], stroke);
        canvas.text(
            canvas.pos(x, top - 12.0),
            Align2::CENTER_CENTER,
            &tick.label,
            if tick.emphasized {
                FontId::proportional(12.0)
            } else {
                FontId::proportional(11.0)
            },
            color,
        );
    }
}

fn draw_today_marker(
    canvas: &Canvas<'_>,
    domain: &DateDomain,
    layout: &TimelineLayout,
    now_ms: f64,
    height: f32,
    clock: f32,
) {
    let Some(fraction) = domain.today_fraction(now_ms) else {
        return;
    };
    let x = layout.x_at(fraction);
    let top = HEADER_HEIGHT - 20.0;
    let bottom = height - FOOTER_HEIGHT;
    let glow = pulse(clock);

    for (half_width, alpha) in [(9.0, 18.0), (5.0, 36.0)] {
        canvas.painter.rect_filled(
            canvas.rect(x - half_width, top, half_width * 2.0, bottom - top),
            canvas.len(half_width),
            with_alpha(TODAY_COLOR, (alpha * glow) as u8),
        );
    }
    canvas.painter.extend(Shape::dashed_line(
        &[canvas.pos(x, top), canvas.pos(x, bottom)],
        canvas.stroke(2.0, TODAY_COLOR),
        canvas.len(6.0),
        canvas.len(4.0),
    ));

    let badge = canvas.rect(x - 28.0, top - 22.0, 56.0, 18.0);
    canvas
        .painter
        .rect_filled(badge, canvas.len(4.0), TODAY_COLOR);
    canvas.text(
        badge.center(),
        Align2::CENTER_CENTER,
        "TODAY",
        FontId::proportional(10.0),
        Color32::WHITE,
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_row(
    canvas: &Canvas<'_>,
    index: usize,
    project: &ProjectRecord,
    domain: Option<&DateDomain>,
    layout: &TimelineLayout,
    hovered: bool,
    width: f32,
    accent: Color32,
    clock: f32,
) {
    let top = row_top(index);
    let colors = project.phase().colors();

    let row_rect = canvas.rect(12.0, top + 4.0, width - 24.0, ROW_HEIGHT - 8.0);
    if hovered {
        canvas
            .painter
            .rect_filled(row_rect, canvas.len(10.0), with_alpha(accent, 36));
        canvas
            .painter
            .rect_stroke(row_rect, canvas.len(10.0), canvas.stroke(1.0, with_alpha(accent, 140)));
    } else {
        let alpha = if index % 2 == 0 { 7 } else { 3 };
        canvas.painter.rect_filled(
            row_rect,
            canvas.len(10.0),
            Color32::from_rgba_unmultiplied(255, 255, 255, alpha),
        );
    }

    // Info panel: name and code badge.
    let name_font = FontId::proportional(NAME_FONT);
    let name = truncate_to_width(&project.name, NAME_COLUMN_WIDTH, |s| {
        canvas.text_width(s, name_font.clone())
    });
    canvas.text(
        canvas.pos(INFO_COLUMN_X, top + 26.0),
        Align2::LEFT_CENTER,
        name,
        name_font.clone(),
        TEXT_PRIMARY,
    );
    let code_font = FontId::monospace(11.0);
    let code_w = canvas.text_width(&project.code, code_font.clone()) + 14.0;
    let code_rect = canvas.rect(INFO_COLUMN_X, top + 41.0, code_w, 18.0);
    canvas
        .painter
        .rect_filled(code_rect, canvas.len(4.0), with_alpha(colors.secondary, 45));
    canvas.text(
        code_rect.center(),
        Align2::CENTER_CENTER,
        &project.code,
        code_font,
        colors.secondary,
    );

    let Some(domain) = domain else {
        return;
    };
    let bar = BarGeometry::compute(domain, layout, project);
    if !bar.is_finite() {
        return;
    }
    let bar_y = top + (ROW_HEIGHT - BAR_HEIGHT) / 2.0;
    let rounding = canvas.len(8.0);
    let track = canvas.rect(bar.x, bar_y, bar.width, BAR_HEIGHT);
    canvas
        .painter
        .rect_filled(track, rounding, Color32::from_rgba_unmultiplied(255, 255, 255, 14));
    canvas.painter.rect_stroke(
        track,
        rounding,
        canvas.stroke(1.0, with_alpha(colors.primary, 90)),
    );

    let fill = canvas.rect(bar.x, bar_y, bar.fill_width, BAR_HEIGHT);
    canvas.painter.rect_filled(fill, rounding, colors.primary);
    let inner = fill.shrink(rounding.min(fill.height() / 2.0) * 0.5);
    if inner.is_positive() {
        canvas.painter.add(horizontal_gradient(
            inner,
            with_alpha(colors.primary, 0),
            with_alpha(colors.secondary, 200),
        ));
    }
    // Shine: a soft top highlight plus a sweep band crossing the fill.
    let shine = Rect::from_min_max(fill.min, pos2(fill.max.x, fill.center().y)).shrink2(vec2(
        canvas.len(3.0),
        canvas.len(2.0),
    ));
    if shine.is_positive() {
        canvas.painter.add(vertical_gradient(
            shine,
            Color32::from_rgba_unmultiplied(255, 255, 255, 60),
            Color32::from_rgba_unmultiplied(255, 255, 255, 0),
        ));
    }
    let sweep_x = bar.x + (clock * 0.6 + index as f32 * 0.37).rem_euclid(1.0) * bar.fill_width;
    let sweep = canvas
        .rect(sweep_x - 7.0, bar_y, 14.0, BAR_HEIGHT)
        .intersect(fill);
    if sweep.is_positive() {
        canvas
            .painter
            .rect_filled(sweep, 0.0, Color32::from_rgba_unmultiplied(255, 255, 255, 40));
    }

    let pct = format!("{:.0}%", project.completion_percentage);
    match bar.label {
        LabelPlacement::InsideFill => canvas.text(
            canvas.pos(bar.x + bar.fill_width - 8.0, bar_y + BAR_HEIGHT / 2.0),
            Align2::RIGHT_CENTER,
            pct,
            FontId::proportional(12.0),
            Color32::WHITE,
        ),
        LabelPlacement::CenteredInBar => canvas.text(
            canvas.pos(bar.x + bar.width / 2.0, bar_y + BAR_HEIGHT / 2.0),
            Align2::CENTER_CENTER,
            pct,
            FontId::proportional(12.0),
            TEXT_PRIMARY,
        ),
    }

    let phase_font = FontId::proportional(11.0);
    let phase_w = canvas.text_width(&project.current_phase, phase_font.clone()) + 20.0;
    let phase_rect = canvas.rect(
        bar.right() + 12.0,
        bar_y + (BAR_HEIGHT - 22.0) / 2.0,
        phase_w,
        22.0,
    );
    canvas
        .painter
        .rect_filled(phase_rect, canvas.len(11.0), with_alpha(colors.primary, 50));
    canvas
        .painter
        .rect_stroke(phase_rect, canvas.len(11.0), canvas.stroke(1.0, colors.primary));
    canvas.text(
        phase_rect.center(),
        Align2::CENTER_CENTER,
        &project.current_phase,
        phase_font,
        colors.secondary,
    );

    if hovered {
        canvas.text(
            canvas.pos(bar.x, bar_y + BAR_HEIGHT + 8.0),
            Align2::LEFT_CENTER,
            format!(
                "{} → {}",
                project.start_date.trim(),
                project.target_completion_date.trim()
            ),
            FontId::monospace(10.0),
            TEXT_MUTED,
        );
    }
}

fn draw_footer(canvas: &Canvas<'_>, width: f32, height: f32) {
    let top = height - FOOTER_HEIGHT;
    canvas.painter.line_segment(
        [canvas.pos(24.0, top + 8.0), canvas.pos(width - 24.0, top + 8.0)],
        canvas.stroke(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 20)),
    );
    canvas.text(
        canvas.pos(INFO_COLUMN_X, top + 34.0),
        Align2::LEFT_CENTER,
        FOOTER_HINT,
        FontId::proportional(12.0),
        TEXT_MUTED,
    );
    canvas.text(
        canvas.pos(width - 28.0, top + 34.0),
        Align2::RIGHT_CENTER,
        FOOTER_NOTE,
        FontId::proportional(12.0),
        with_alpha(TEXT_MUTED, 160),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particles_are_reproducible_and_on_canvas() {
        for index in 0..PARTICLE_COUNT {
            for step in 0..50 {
                let clock = step as f32 * 0.37;
                let a = particle_position(index, clock, 800.0, 600.0);
                let b = particle_position(index, clock, 800.0, 600.0);
                assert_eq!(a, b);
                assert!((0.0..=800.0).contains(&a.x));
                assert!((0.0..=600.0).contains(&a.y));
            }
        }
        assert_ne!(
            particle_position(0, 1.0, 800.0, 600.0),
            particle_position(1, 1.0, 800.0, 600.0)
        );
    }

    #[test]
    fn animated_values_stay_in_range() {
        for step in 0..500 {
            let clock = step as f32 * 0.05;
            assert!((0.0..1.0).contains(&stripe_highlight(clock)));
            assert!((0.0..=1.0).contains(&pulse(clock)));
            assert!((0.0..GRID_SPACING).contains(&grid_offset(clock)));
        }
    }

    #[test]
    fn zoom_badge_shows_integer_percent() {
        assert_eq!(zoom_label(1.0), "100%");
        assert_eq!(zoom_label(1.05 * 1.05), "110%");
        assert_eq!(zoom_label(0.5), "50%");
    }
}
