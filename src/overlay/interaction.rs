//! Pointer/touch state machine for dragging and resizing the overlay.

use serde::{Deserialize, Serialize};

use super::geometry::{
    clamp_diameter, clamp_position, hit_test, OverlayLimits, OverlayState, Point, SurfaceSize,
    Vector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { grab_offset: Vector },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    DragStarted,
    Moved,
    DragEnded,
    Resized,
    /// Images swapped or overlay reset; everything is redrawn.
    Reloaded,
}

impl Transition {
    /// Whether the overlay geometry changed and the surface must be redrawn.
    pub fn needs_render(self) -> bool {
        matches!(
            self,
            Transition::Moved | Transition::Resized | Transition::Reloaded
        )
    }
}

/// Maps client (page/element) coordinates to surface pixels. The displayed
/// element may be scaled relative to the surface it shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMapping {
    pub origin: Point,
    pub displayed_width: f32,
    pub displayed_height: f32,
}

impl SurfaceMapping {
    pub fn identity() -> Self {
        Self {
            origin: Point::default(),
            displayed_width: 0.0,
            displayed_height: 0.0,
        }
    }

    pub fn to_surface(&self, client: Point, surface: SurfaceSize) -> Point {
        let scale_x = if self.displayed_width > 0.0 {
            surface.width as f32 / self.displayed_width
        } else {
            1.0
        };
        let scale_y = if self.displayed_height > 0.0 {
            surface.height as f32 / self.displayed_height
        } else {
            1.0
        };
        Point::new(
            (client.x - self.origin.x) * scale_x,
            (client.y - self.origin.y) * scale_y,
        )
    }
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    drag: DragState,
    pointer: Option<PointerKind>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            drag: DragState::Idle,
            pointer: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Starts a drag when `point` falls inside the overlay circle. The grab
    /// offset is taken from the bounding-box corner so the overlay doesn't jump.
    pub fn press(
        &mut self,
        point: Point,
        kind: PointerKind,
        state: &OverlayState,
        overlay_present: bool,
    ) -> Transition {
        if !overlay_present || !hit_test(point, state) {
            return Transition::Unchanged;
        }
        self.drag = DragState::Dragging {
            grab_offset: point.offset_from(state.position),
        };
        self.pointer = Some(kind);
        Transition::DragStarted
    }

    /// Whether input from `kind` belongs to the current drag. A mouse and a
    /// touch drag never steer each other.
    fn owns(&self, kind: PointerKind) -> bool {
        self.pointer.map_or(true, |active| active == kind)
    }

    pub fn move_to(
        &mut self,
        point: Point,
        kind: PointerKind,
        state: &mut OverlayState,
        surface: SurfaceSize,
    ) -> Transition {
        let DragState::Dragging { grab_offset } = self.drag else {
            return Transition::Unchanged;
        };
        if !self.owns(kind) {
            return Transition::Unchanged;
        }
        let proposed = point.minus(grab_offset);
        let clamped = clamp_position(proposed, state.diameter, surface);
        if clamped == state.position {
            return Transition::Unchanged;
        }
        state.position = clamped;
        Transition::Moved
    }

    pub fn release(&mut self, kind: PointerKind) -> Transition {
        if !self.is_dragging() || !self.owns(kind) {
            return Transition::Unchanged;
        }
        self.drag = DragState::Idle;
        self.pointer = None;
        Transition::DragEnded
    }

    /// Accepted in any state; never starts or ends a drag.
    pub fn set_diameter(
        &mut self,
        diameter: f32,
        state: &mut OverlayState,
        limits: &OverlayLimits,
        surface: SurfaceSize,
    ) -> Transition {
        let before = *state;
        state.diameter = clamp_diameter(diameter, limits);
        state.position = clamp_position(state.position, state.diameter, surface);
        if *state == before {
            Transition::Unchanged
        } else {
            Transition::Resized
        }
    }

    pub fn active_pointer(&self) -> Option<PointerKind> {
        self.pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(x: f32, y: f32, diameter: f32) -> OverlayState {
        OverlayState {
            position: Point::new(x, y),
            diameter,
        }
    }

    #[test]
    fn drag_to_far_corner_clamps_to_surface_edge() {
        let surface = SurfaceSize::new(768, 1024);
        let mut state = overlay(220.0, 80.0, 160.0);
        let mut controller = InteractionController::new();

        let pressed = controller.press(Point::new(300.0, 160.0), PointerKind::Mouse, &state, true);
        assert_eq!(pressed, Transition::DragStarted);
        controller.move_to(Point::new(900.0, 900.0), PointerKind::Mouse, &mut state, surface);
        assert_eq!(state.position, Point::new(608.0, 864.0));
    }

    #[test]
    fn grab_offset_stays_constant_across_moves() {
        let surface = SurfaceSize::new(1024, 1024);
        let mut state = overlay(100.0, 40.0, 160.0);
        let mut controller = InteractionController::new();
        let grab = Point::new(150.0, 100.0);
        controller.press(grab, PointerKind::Touch, &state, true);
        let expected = grab.offset_from(state.position);

        for point in [(200.0, 120.0), (340.5, 410.25), (500.0, 600.0), (180.0, 90.0)] {
            let point = Point::new(point.0, point.1);
            assert_eq!(
                controller.move_to(point, PointerKind::Touch, &mut state, surface),
                Transition::Moved
            );
            assert_eq!(point.offset_from(state.position), expected);
        }
    }

    #[test]
    fn press_outside_circle_is_ignored() {
        let mut state = overlay(100.0, 100.0, 100.0);
        let mut controller = InteractionController::new();
        let outside = Point::new(200.0 + 1e-3, 150.0);
        assert_eq!(
            controller.press(outside, PointerKind::Mouse, &state, true),
            Transition::Unchanged
        );
        assert!(!controller.is_dragging());
        assert_eq!(
            controller.move_to(
                Point::new(0.0, 0.0),
                PointerKind::Mouse,
                &mut state,
                SurfaceSize::new(500, 500)
            ),
            Transition::Unchanged
        );
        assert_eq!(state.position, Point::new(100.0, 100.0));
    }

    #[test]
    fn press_on_boundary_starts_drag() {
        let state = overlay(100.0, 100.0, 100.0);
        let mut controller = InteractionController::new();
        assert_eq!(
            controller.press(Point::new(200.0, 150.0), PointerKind::Mouse, &state, true),
            Transition::DragStarted
        );
    }

    #[test]
    fn press_without_overlay_bitmap_does_nothing() {
        let state = overlay(0.0, 0.0, 100.0);
        let mut controller = InteractionController::new();
        assert_eq!(
            controller.press(Point::new(50.0, 50.0), PointerKind::Mouse, &state, false),
            Transition::Unchanged
        );
    }

    #[test]
    fn release_always_returns_to_idle() {
        let state = overlay(0.0, 0.0, 100.0);
        let mut controller = InteractionController::new();
        assert_eq!(controller.release(PointerKind::Mouse), Transition::Unchanged);
        controller.press(Point::new(50.0, 50.0), PointerKind::Touch, &state, true);
        assert_eq!(controller.active_pointer(), Some(PointerKind::Touch));
        assert_eq!(controller.release(PointerKind::Touch), Transition::DragEnded);
        assert!(!controller.is_dragging());
        assert_eq!(controller.active_pointer(), None);
    }

    #[test]
    fn other_pointer_kind_cannot_steer_or_end_a_drag() {
        let surface = SurfaceSize::new(600, 600);
        let mut state = overlay(100.0, 100.0, 100.0);
        let mut controller = InteractionController::new();
        controller.press(Point::new(150.0, 150.0), PointerKind::Touch, &state, true);

        assert_eq!(
            controller.move_to(Point::new(400.0, 400.0), PointerKind::Mouse, &mut state, surface),
            Transition::Unchanged
        );
        assert_eq!(state.position, Point::new(100.0, 100.0));
        assert_eq!(controller.release(PointerKind::Mouse), Transition::Unchanged);
        assert!(controller.is_dragging());

        assert_eq!(
            controller.move_to(Point::new(200.0, 170.0), PointerKind::Touch, &mut state, surface),
            Transition::Moved
        );
        assert_eq!(state.position, Point::new(150.0, 120.0));
        assert_eq!(controller.release(PointerKind::Touch), Transition::DragEnded);
    }

    #[test]
    fn resizing_reclamps_without_touching_drag_state() {
        let surface = SurfaceSize::new(400, 400);
        let limits = OverlayLimits::default();
        let mut state = overlay(240.0, 240.0, 160.0);
        let mut controller = InteractionController::new();
        controller.press(Point::new(320.0, 320.0), PointerKind::Mouse, &state, true);

        let transition = controller.set_diameter(260.0, &mut state, &limits, surface);
        assert_eq!(transition, Transition::Resized);
        assert_eq!(state.diameter, 260.0);
        assert_eq!(state.position, Point::new(140.0, 140.0));
        assert!(controller.is_dragging());

        controller.release(PointerKind::Mouse);
        controller.set_diameter(5000.0, &mut state, &limits, surface);
        assert_eq!(state.diameter, 280.0);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn mapping_scales_css_sized_canvas_into_surface_pixels() {
        let mapping = SurfaceMapping {
            origin: Point::new(10.0, 20.0),
            displayed_width: 384.0,
            displayed_height: 512.0,
        };
        let point = mapping.to_surface(Point::new(202.0, 276.0), SurfaceSize::new(768, 1024));
        assert_eq!(point, Point::new(384.0, 512.0));
        assert_eq!(
            SurfaceMapping::identity().to_surface(Point::new(5.0, 6.0), SurfaceSize::new(10, 10)),
            Point::new(5.0, 6.0)
        );
    }
}
