//! Explicit editor state plus an event-dispatch loop. Every event that
//! changes what is on screen is followed by a full `render`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bitmap::Bitmap;
use super::compositor::{render, Surface};
use super::geometry::{clamp_diameter, clamp_position, OverlayLimits, OverlayState, Point, SurfaceSize};
use super::interaction::{InteractionController, PointerKind, SurfaceMapping, Transition};

/// Vertical offset of the overlay after a new base image is installed.
const BASE_OVERLAY_TOP: f32 = 40.0;

/// Pointer input as delivered by the page, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerInput {
    Press {
        x: f32,
        y: f32,
        #[serde(default)]
        pointer: PointerKind,
    },
    Move {
        x: f32,
        y: f32,
        #[serde(default)]
        pointer: PointerKind,
    },
    Release {
        #[serde(default)]
        pointer: PointerKind,
    },
    Resize {
        diameter: f32,
    },
    Reset,
}

#[derive(Debug, Clone)]
pub enum EditorEvent {
    Press { point: Point, pointer: PointerKind },
    Move { point: Point, pointer: PointerKind },
    Release { pointer: PointerKind },
    SetDiameter(f32),
    Reset,
    SetBase(Bitmap),
    SetOverlay(Option<Bitmap>),
}

impl EditorEvent {
    /// Converts page input into surface-space events. Mouse and touch share
    /// the same mapping and the same transitions afterwards.
    pub fn from_input(input: PointerInput, mapping: &SurfaceMapping, surface: SurfaceSize) -> Self {
        match input {
            PointerInput::Press { x, y, pointer } => EditorEvent::Press {
                point: mapping.to_surface(Point::new(x, y), surface),
                pointer,
            },
            PointerInput::Move { x, y, pointer } => EditorEvent::Move {
                point: mapping.to_surface(Point::new(x, y), surface),
                pointer,
            },
            PointerInput::Release { pointer } => EditorEvent::Release { pointer },
            PointerInput::Resize { diameter } => EditorEvent::SetDiameter(diameter),
            PointerInput::Reset => EditorEvent::Reset,
        }
    }
}

pub struct Editor {
    surface: Surface,
    base: Option<Bitmap>,
    overlay: Option<Bitmap>,
    state: OverlayState,
    controller: InteractionController,
    limits: OverlayLimits,
    renders: u64,
}

impl Editor {
    pub fn new(limits: OverlayLimits) -> Self {
        Self {
            surface: Surface::default(),
            base: None,
            overlay: None,
            state: limits.default_state(),
            controller: InteractionController::new(),
            limits,
            renders: 0,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Bounds used for clamping: the base image once loaded, else the surface.
    pub fn surface_size(&self) -> SurfaceSize {
        match &self.base {
            Some(base) => SurfaceSize::new(base.width(), base.height()),
            None => self.surface.size(),
        }
    }

    /// Places the overlay directly, e.g. from a saved layout. Clamped like any
    /// other update.
    pub fn place(&mut self, position: Point, diameter: f32) -> bool {
        let diameter = clamp_diameter(diameter, &self.limits);
        let position = clamp_position(position, diameter, self.surface_size());
        let next = OverlayState { position, diameter };
        if next == self.state {
            return false;
        }
        self.state = next;
        self.redraw();
        true
    }

    /// Applies one event. Returns true when the surface was re-rendered.
    pub fn dispatch(&mut self, event: EditorEvent) -> bool {
        if self.apply(event).needs_render() {
            self.redraw();
            return true;
        }
        false
    }

    /// Applies a recorded sequence and renders once at the end, if anything
    /// visible changed. Ends in the same state as dispatching one by one.
    pub fn replay<I>(&mut self, events: I) -> bool
    where
        I: IntoIterator<Item = EditorEvent>,
    {
        let mut changed = false;
        for event in events {
            changed |= self.apply(event).needs_render();
        }
        if changed {
            self.redraw();
        }
        changed
    }

    fn apply(&mut self, event: EditorEvent) -> Transition {
        let surface = self.surface_size();
        let transition = match event {
            EditorEvent::Press { point, pointer } => {
                self.controller
                    .press(point, pointer, &self.state, self.overlay.is_some())
            }
            EditorEvent::Move { point, pointer } => {
                self.controller
                    .move_to(point, pointer, &mut self.state, surface)
            }
            EditorEvent::Release { pointer } => self.controller.release(pointer),
            EditorEvent::SetDiameter(diameter) => {
                self.controller
                    .set_diameter(diameter, &mut self.state, &self.limits, surface)
            }
            EditorEvent::Reset => {
                let defaults = self.limits.default_state();
                self.state = OverlayState {
                    position: clamp_position(defaults.position, defaults.diameter, surface),
                    diameter: defaults.diameter,
                };
                Transition::Reloaded
            }
            EditorEvent::SetBase(base) => {
                self.install_base(base);
                Transition::Reloaded
            }
            EditorEvent::SetOverlay(overlay) => {
                self.overlay = overlay;
                Transition::Reloaded
            }
        };

        if transition == Transition::DragStarted {
            debug!("Drag started ({:?})", self.controller.active_pointer());
        }
        transition
    }

    fn install_base(&mut self, base: Bitmap) {
        let width = base.width() as f32;
        let diameter = self.limits.default_diameter;
        let x = (width / 2.0 - diameter / 2.0).floor().max(0.0);
        let size = SurfaceSize::new(base.width(), base.height());
        self.state = OverlayState {
            position: clamp_position(Point::new(x, BASE_OVERLAY_TOP), diameter, size),
            diameter,
        };
        self.base = Some(base);
    }

    fn redraw(&mut self) {
        render(
            &mut self.surface,
            self.base.as_ref(),
            self.overlay.as_ref(),
            &self.state,
        );
        self.renders += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, color: [u8; 4]) -> Bitmap {
        Bitmap::from_rgba(RgbaImage::from_pixel(width, height, Rgba(color))).expect("bitmap")
    }

    fn editor_with_images(width: u32, height: u32) -> Editor {
        let mut editor = Editor::new(OverlayLimits::default());
        editor.dispatch(EditorEvent::SetOverlay(Some(solid(30, 40, [255, 0, 0, 255]))));
        editor.dispatch(EditorEvent::SetBase(solid(width, height, [0, 0, 255, 255])));
        editor
    }

    #[test]
    fn new_base_recenters_overlay() {
        let editor = editor_with_images(768, 1024);
        let state = editor.overlay_state();
        assert_eq!(state.position, Point::new(304.0, 40.0));
        assert_eq!(state.diameter, 160.0);
        assert_eq!(editor.surface().size(), SurfaceSize::new(768, 1024));
    }

    #[test]
    fn scenario_drag_clamps_at_bottom_right() {
        let mut editor = editor_with_images(768, 1024);
        editor.place(Point::new(220.0, 80.0), 160.0);
        let renders = editor.render_count();

        assert!(!editor.dispatch(EditorEvent::Press {
            point: Point::new(300.0, 160.0),
            pointer: PointerKind::Mouse,
        }));
        assert!(editor.dispatch(EditorEvent::Move {
            point: Point::new(900.0, 900.0),
            pointer: PointerKind::Mouse,
        }));
        assert!(!editor.dispatch(EditorEvent::Release {
            pointer: PointerKind::Mouse
        }));

        assert_eq!(editor.overlay_state().position, Point::new(608.0, 864.0));
        assert_eq!(editor.render_count(), renders + 1);
        assert!(!editor.is_dragging());
    }

    #[test]
    fn replay_renders_once_and_matches_dispatch() {
        let mut events = vec![EditorEvent::Press {
            point: Point::new(384.0, 120.0),
            pointer: PointerKind::Mouse,
        }];
        for step in 0..500 {
            events.push(EditorEvent::Move {
                point: Point::new(384.0 + step as f32, 120.0 + step as f32 / 2.0),
                pointer: PointerKind::Mouse,
            });
        }
        events.push(EditorEvent::Release {
            pointer: PointerKind::Mouse,
        });

        let mut stepped = editor_with_images(768, 1024);
        for event in events.clone() {
            stepped.dispatch(event);
        }

        let mut replayed = editor_with_images(768, 1024);
        let renders = replayed.render_count();
        assert!(replayed.replay(events));
        assert_eq!(replayed.render_count(), renders + 1);
        assert_eq!(replayed.overlay_state(), stepped.overlay_state());
        assert_eq!(replayed.surface().pixels(), stepped.surface().pixels());
        assert!(!replayed.is_dragging());
    }

    #[test]
    fn replay_without_changes_skips_rendering() {
        let mut editor = editor_with_images(768, 1024);
        let renders = editor.render_count();
        assert!(!editor.replay([EditorEvent::Release {
            pointer: PointerKind::Touch,
        }]));
        assert_eq!(editor.render_count(), renders);
    }

    #[test]
    fn touch_input_is_mapped_like_mouse_input() {
        let mut editor = editor_with_images(768, 1024);
        let mapping = SurfaceMapping {
            origin: Point::new(0.0, 100.0),
            displayed_width: 384.0,
            displayed_height: 512.0,
        };
        let size = editor.surface_size();
        // Overlay centre (384, 120) is displayed at (192, 160) in client space.
        let press = PointerInput::Press {
            x: 192.0,
            y: 160.0,
            pointer: PointerKind::Touch,
        };
        let drag = PointerInput::Move {
            x: 202.0,
            y: 170.0,
            pointer: PointerKind::Touch,
        };
        editor.dispatch(EditorEvent::from_input(press, &mapping, size));
        assert!(editor.is_dragging());
        editor.dispatch(EditorEvent::from_input(drag, &mapping, size));
        assert_eq!(editor.overlay_state().position, Point::new(324.0, 60.0));
    }

    #[test]
    fn press_without_face_does_not_start_drag() {
        let mut editor = Editor::new(OverlayLimits::default());
        editor.dispatch(EditorEvent::SetBase(solid(400, 400, [0, 0, 0, 255])));
        editor.dispatch(EditorEvent::Press {
            point: Point::new(200.0, 120.0),
            pointer: PointerKind::Mouse,
        });
        assert!(!editor.is_dragging());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut editor = editor_with_images(1024, 1024);
        editor.dispatch(EditorEvent::SetDiameter(240.0));
        editor.place(Point::new(500.0, 500.0), 240.0);
        editor.dispatch(EditorEvent::Reset);
        assert_eq!(
            editor.overlay_state(),
            OverlayLimits::default().default_state()
        );
    }

    #[test]
    fn resize_event_rerenders_and_clamps() {
        let mut editor = editor_with_images(300, 300);
        editor.place(Point::new(140.0, 140.0), 160.0);
        assert!(editor.dispatch(EditorEvent::SetDiameter(280.0)));
        let state = editor.overlay_state();
        assert_eq!(state.diameter, 280.0);
        assert_eq!(state.position, Point::new(20.0, 20.0));
    }

    #[test]
    fn untouched_editor_renders_nothing() {
        let mut editor = Editor::new(OverlayLimits::default());
        editor.dispatch(EditorEvent::SetDiameter(120.0));
        assert!(!editor.has_base());
        assert!(editor
            .surface()
            .pixels()
            .pixels()
            .all(|pixel| *pixel == Rgba([0, 0, 0, 0])));
    }
}
