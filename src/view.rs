//! View state shared by the input handlers and the frame renderer.

use egui::{Pos2, Vec2};
use tracing::debug;

use crate::timeline::row_at;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const BUTTON_ZOOM_IN: f32 = 1.2;
pub const BUTTON_ZOOM_OUT: f32 = 0.8;
pub const WHEEL_ZOOM_IN: f32 = 1.05;
pub const WHEEL_ZOOM_OUT: f32 = 0.95;
pub const DEFAULT_CLOCK_STEP: f32 = 0.016;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor: Pos2,
    },
}

/// Pointer input in canvas-local pixels (origin at the canvas top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up,
    Leave,
}

/// Cosmetic phase accumulator. Never read outside of drawing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationClock {
    phase: f32,
}

impl AnimationClock {
    pub fn value(&self) -> f32 {
        self.phase
    }

    pub fn advance(&mut self, step: f32) {
        self.phase += step.max(0.0);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub zoom: f32,
    pub pan: Vec2,
    pub drag: DragState,
    pub hovered_row: Option<usize>,
    pub show_info_banner: bool,
    pub is_fullscreen: bool,
    pub clock: AnimationClock,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            drag: DragState::Idle,
            hovered_row: None,
            show_info_banner: true,
            is_fullscreen: false,
            clock: AnimationClock::default(),
        }
    }
}

impl ViewState {
    pub fn zoom_in(&mut self) {
        self.scale_zoom(BUTTON_ZOOM_IN);
    }

    pub fn zoom_out(&mut self) {
        self.scale_zoom(BUTTON_ZOOM_OUT);
    }

    fn scale_zoom(&mut self, factor: f32) {
        let next = self.zoom * factor;
        // A NaN factor would otherwise slip through clamp.
        self.zoom = if next.is_finite() {
            next.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            self.zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        };
    }

    /// Zoom and pan only; hover, drag and banner state are untouched.
    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
        debug!("view reset");
    }

    /// Flips the flag and returns the new value for the caller to forward to
    /// the window.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.is_fullscreen = !self.is_fullscreen;
        self.is_fullscreen
    }

    pub fn dismiss_info_banner(&mut self) {
        self.show_info_banner = false;
    }

    /// Positive `delta_y` is the wheel rolled away from the user.
    pub fn apply_wheel(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.scale_zoom(WHEEL_ZOOM_IN);
        } else if delta_y < 0.0 {
            self.scale_zoom(WHEEL_ZOOM_OUT);
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Inverts pan and zoom for a canvas-local point.
    pub fn to_content(&self, local: Pos2) -> Pos2 {
        ((local.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    /// Maps a content-space point to canvas-local pixels.
    #[cfg(test)]
    pub fn to_local(&self, content: Pos2) -> Pos2 {
        (content.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, project_count: usize) {
        match (self.drag, event) {
            (_, PointerEvent::Down(pos)) => {
                self.drag = DragState::Dragging { anchor: pos };
            }
            (DragState::Dragging { .. }, PointerEvent::Up | PointerEvent::Leave) => {
                self.drag = DragState::Idle;
            }
            (DragState::Dragging { anchor }, PointerEvent::Move(pos)) => {
                self.pan += pos - anchor;
                self.drag = DragState::Dragging { anchor: pos };
            }
            (DragState::Idle, PointerEvent::Move(pos)) => {
                let content = self.to_content(pos);
                self.hovered_row = row_at(content.y, project_count);
            }
            (DragState::Idle, PointerEvent::Leave) => {
                self.hovered_row = None;
            }
            (DragState::Idle, PointerEvent::Up) => {}
        }
    }

    /// Drops a hover index that no longer points into the list.
    pub fn clamp_hover(&mut self, project_count: usize) {
        if self.hovered_row.is_some_and(|row| row >= project_count) {
            self.hovered_row = None;
        }
    }
}

/// Keeps the continuous redraw going while there is something to draw, and
/// stops for good once cancelled.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    step: f32,
    cancelled: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            cancelled: false,
            frames: 0,
        }
    }

    /// Called once per drawn frame. Advances the clock and reports whether
    /// another frame should be requested.
    pub fn tick(&mut self, clock: &mut AnimationClock, has_content: bool) -> bool {
        if self.cancelled || !has_content {
            return false;
        }
        clock.advance(self.step);
        self.frames += 1;
        true
    }

    pub fn cancel(&mut self) {
        if !self.cancelled {
            debug!(frames = self.frames, "frame loop cancelled");
        }
        self.cancelled = true;
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{HEADER_HEIGHT, ROW_HEIGHT};
    use egui::{pos2, vec2};

    fn in_range(state: &ViewState) -> bool {
        (MIN_ZOOM..=MAX_ZOOM).contains(&state.zoom)
    }

    #[test]
    fn zoom_stays_clamped_under_repeated_mutation() {
        let mut state = ViewState::default();
        for _ in 0..50 {
            state.zoom_in();
            assert!(in_range(&state));
        }
        assert_eq!(state.zoom, MAX_ZOOM);
        for _ in 0..50 {
            state.zoom_out();
            assert!(in_range(&state));
        }
        assert_eq!(state.zoom, MIN_ZOOM);
        for i in 0..200 {
            state.apply_wheel(if i % 3 == 0 { -120.0 } else { 1.0 });
            assert!(in_range(&state));
        }
    }

    #[test]
    fn wheel_direction_picks_step() {
        let mut state = ViewState::default();
        state.apply_wheel(3.0);
        assert!((state.zoom - 1.05).abs() < 1e-6);
        state.reset_view();
        state.apply_wheel(-3.0);
        assert!((state.zoom - 0.95).abs() < 1e-6);
        state.apply_wheel(0.0);
        assert!((state.zoom - 0.95).abs() < 1e-6);
    }

    #[test]
    fn reset_restores_identity_but_keeps_flags() {
        let mut state = ViewState::default();
        state.zoom_in();
        state.handle_pointer(PointerEvent::Down(pos2(10.0, 10.0)), 0);
        state.handle_pointer(PointerEvent::Move(pos2(60.0, -30.0)), 0);
        state.dismiss_info_banner();
        state.toggle_fullscreen();

        state.reset_view();
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.pan, Vec2::ZERO);
        assert!(!state.show_info_banner);
        assert!(state.is_fullscreen);
        assert!(state.is_dragging());
    }

    #[test]
    fn drag_pans_incrementally() {
        let mut state = ViewState::default();
        state.handle_pointer(PointerEvent::Down(pos2(100.0, 100.0)), 3);
        state.handle_pointer(PointerEvent::Move(pos2(110.0, 95.0)), 3);
        state.handle_pointer(PointerEvent::Move(pos2(130.0, 95.0)), 3);
        assert_eq!(state.pan, vec2(30.0, -5.0));
        assert_eq!(
            state.drag,
            DragState::Dragging {
                anchor: pos2(130.0, 95.0)
            }
        );

        state.handle_pointer(PointerEvent::Up, 3);
        assert_eq!(state.drag, DragState::Idle);
        state.handle_pointer(PointerEvent::Move(pos2(500.0, 500.0)), 3);
        assert_eq!(state.pan, vec2(30.0, -5.0));
    }

    #[test]
    fn leaving_surface_ends_drag() {
        let mut state = ViewState::default();
        state.handle_pointer(PointerEvent::Down(pos2(0.0, 0.0)), 1);
        state.handle_pointer(PointerEvent::Leave, 1);
        assert!(!state.is_dragging());
    }

    #[test]
    fn hover_uses_inverse_transform() {
        let mut state = ViewState::default();
        let y = HEADER_HEIGHT + 1.5 * ROW_HEIGHT;
        state.handle_pointer(PointerEvent::Move(pos2(400.0, y)), 3);
        assert_eq!(state.hovered_row, Some(1));

        state.zoom = 2.0;
        state.pan = vec2(-50.0, 40.0);
        let local = state.to_local(pos2(400.0, HEADER_HEIGHT + 2.25 * ROW_HEIGHT));
        state.handle_pointer(PointerEvent::Move(local), 3);
        assert_eq!(state.hovered_row, Some(2));

        state.handle_pointer(PointerEvent::Move(pos2(400.0, 5.0)), 3);
        assert_eq!(state.hovered_row, None);
    }

    #[test]
    fn hover_index_is_always_valid() {
        let mut state = ViewState::default();
        for count in 0..4 {
            for step in 0..100 {
                let y = step as f32 * 7.5 - 40.0;
                state.handle_pointer(PointerEvent::Move(pos2(10.0, y)), count);
                if let Some(row) = state.hovered_row {
                    assert!(row < count);
                }
            }
        }
    }

    #[test]
    fn hover_is_not_updated_while_dragging() {
        let mut state = ViewState::default();
        state.hovered_row = Some(0);
        state.handle_pointer(PointerEvent::Down(pos2(0.0, 0.0)), 3);
        state.handle_pointer(
            PointerEvent::Move(pos2(0.0, HEADER_HEIGHT + 2.5 * ROW_HEIGHT)),
            3,
        );
        assert_eq!(state.hovered_row, Some(0));
    }

    #[test]
    fn clamp_hover_drops_stale_rows() {
        let mut state = ViewState::default();
        state.hovered_row = Some(4);
        state.clamp_hover(2);
        assert_eq!(state.hovered_row, None);
    }

    #[test]
    fn frame_loop_stops_after_cancel() {
        let mut clock = AnimationClock::default();
        let mut frames = FrameLoop::new(0.5);
        assert!(frames.tick(&mut clock, true));
        assert!(frames.tick(&mut clock, true));
        assert_eq!(clock.value(), 1.0);

        assert!(!frames.tick(&mut clock, false));
        assert_eq!(clock.value(), 1.0);

        frames.cancel();
        assert!(!frames.tick(&mut clock, true));
        assert!(!frames.tick(&mut clock, true));
        assert_eq!(clock.value(), 1.0);
    }
}
