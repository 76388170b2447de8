//! Windowed runtime: owns the winit event loop, the render session and the
//! gallery selection state.
//!
//! The loop is self-rescheduling: each `RedrawRequested` renders exactly one
//! frame and requests the next one, so the platform's display sync paces the
//! session. Input handlers only update state (pointer target, parameter
//! values, shader selection); all GPU work happens inside the frame call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use catalog::Catalog;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::diagnostics::{OverlayReadout, OverlaySeverity};
use crate::gpu::{Phase, RenderSession};
use crate::{GalleryConfig, ParameterValues};

/// How often the title-bar fps readout refreshes while the overlay is on.
const OVERLAY_REFRESH: Duration = Duration::from_millis(500);

/// Selection and parameter-editing state owned by the host layer. The render
/// session only ever receives fresh values by value, never references into
/// this struct.
struct GalleryState {
    catalog: Catalog,
    index: usize,
    values: ParameterValues,
    selected: usize,
}

impl GalleryState {
    fn new(catalog: Catalog, index: usize) -> Self {
        let mut state = Self {
            catalog,
            index,
            values: ParameterValues::new(),
            selected: 0,
        };
        state.reset_values();
        state
    }

    fn current(&self) -> &catalog::ShaderDefinition {
        &self.catalog.shaders()[self.index]
    }

    /// Moves the selection by `delta`, wrapping around the catalog.
    fn step(&mut self, delta: isize) {
        let len = self.catalog.len() as isize;
        self.index = (self.index as isize + delta).rem_euclid(len) as usize;
        self.selected = 0;
    }

    /// Selects by absolute position; out-of-range indices are ignored.
    fn select(&mut self, index: usize) -> bool {
        if index < self.catalog.len() && index != self.index {
            self.index = index;
            self.selected = 0;
            true
        } else {
            index < self.catalog.len()
        }
    }

    fn reset_values(&mut self) {
        self.values = self
            .current()
            .parameters
            .iter()
            .map(|descriptor| (descriptor.name.clone(), descriptor.default))
            .collect();
    }

    fn cycle_parameter(&mut self) {
        let count = self.current().parameters.len();
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    /// Nudges the active parameter by `direction` steps, clamped to its
    /// range. Returns the (name, value) pair actually applied.
    fn adjust_parameter(&mut self, direction: f64) -> Option<(String, f64)> {
        let descriptor = self.current().parameters.get(self.selected)?.clone();
        let current = self
            .values
            .get(&descriptor.name)
            .copied()
            .unwrap_or(descriptor.default);
        let next = descriptor.clamp(current + direction * descriptor.step);
        self.values.insert(descriptor.name.clone(), next);
        Some((descriptor.name, next))
    }

    fn active_parameter_label(&self) -> Option<&str> {
        self.current()
            .parameters
            .get(self.selected)
            .map(|descriptor| descriptor.label.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GalleryAction {
    NextShader,
    PreviousShader,
    SelectIndex(usize),
    CycleParameter,
    AdjustParameter(f64),
    ResetParameters,
    ToggleOverlay,
    Quit,
}

fn action_for_key(key: &Key) -> Option<GalleryAction> {
    match key {
        Key::Named(NamedKey::ArrowRight) => Some(GalleryAction::NextShader),
        Key::Named(NamedKey::ArrowLeft) => Some(GalleryAction::PreviousShader),
        Key::Named(NamedKey::ArrowUp) => Some(GalleryAction::AdjustParameter(1.0)),
        Key::Named(NamedKey::ArrowDown) => Some(GalleryAction::AdjustParameter(-1.0)),
        Key::Named(NamedKey::Tab) => Some(GalleryAction::CycleParameter),
        Key::Named(NamedKey::Escape) => Some(GalleryAction::Quit),
        Key::Character(value) => {
            let text = value.as_str();
            if let Some(digit) = text.chars().next().filter(|ch| ch.is_ascii_digit()) {
                let position = digit.to_digit(10).unwrap_or(0) as usize;
                return position.checked_sub(1).map(GalleryAction::SelectIndex);
            }
            match text {
                "f" | "F" => Some(GalleryAction::ToggleOverlay),
                "r" | "R" => Some(GalleryAction::ResetParameters),
                "q" | "Q" => Some(GalleryAction::Quit),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Maps host-space pixel coordinates to the normalized [0,1]² pointer space,
/// with Y measured from the bottom of the surface.
fn normalize_pointer(position: PhysicalPosition<f64>, size: PhysicalSize<u32>) -> (f32, f32) {
    let width = size.width.max(1) as f64;
    let height = size.height.max(1) as f64;
    (
        (position.x / width) as f32,
        (1.0 - position.y / height) as f32,
    )
}

fn window_title(gallery: &GalleryState, phase: Phase, readout: Option<&OverlayReadout>) -> String {
    let mut title = format!("Shader Gallery — {}", gallery.current().name);
    if let Some(label) = gallery.active_parameter_label() {
        title.push_str(&format!(" ({label})"));
    }
    if let Some(readout) = readout {
        title.push_str(&format!(" — {}", readout.label));
    }
    if phase == Phase::Degraded {
        title.push_str(" [shader error]");
    }
    title
}

fn apply_selection(session: &mut RenderSession, gallery: &mut GalleryState, window: &Window) {
    gallery.reset_values();
    let definition = gallery.current();
    match session.switch_shader(definition) {
        Ok(()) => {
            session.set_parameters(gallery.values.clone());
            tracing::info!(shader = %definition.id, "selected shader");
        }
        Err(error) => {
            tracing::error!(shader = %definition.id, "shader switch failed: {error}");
        }
    }
    window.set_title(&window_title(gallery, session.phase(), None));
}

pub(crate) fn run_event_loop(config: GalleryConfig, catalog: Catalog) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(&config.window_title)
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create gallery window: {err}"))?;
    let window = Arc::new(window);

    let start_index = match &config.initial_shader {
        Some(id) => catalog.position(id).unwrap_or_else(|| {
            tracing::warn!(shader = %id, "unknown shader id; starting with the first entry");
            0
        }),
        None => 0,
    };

    let mut gallery = GalleryState::new(catalog, start_index);
    let mut session = RenderSession::new(
        window.as_ref(),
        window.inner_size(),
        gallery.current(),
    )
    .context("failed to initialise render session")?;
    session.set_parameters(gallery.values.clone());
    window.set_title(&window_title(&gallery, session.phase(), None));

    let mut overlay_enabled = config.overlay;
    let mut last_overlay_refresh = Instant::now();

    window.request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            let Event::WindowEvent { window_id, event } = event else {
                return;
            };
            if window_id != window.id() {
                return;
            }

            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    session.dispose();
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    session.resize(new_size);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let (x, y) = normalize_pointer(position, session.size());
                    session.set_pointer_target(x, y);
                }
                WindowEvent::Touch(Touch {
                    phase: TouchPhase::Started | TouchPhase::Moved,
                    location,
                    ..
                }) => {
                    let (x, y) = normalize_pointer(location, session.size());
                    session.set_pointer_target(x, y);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed || event.repeat {
                        return;
                    }
                    let Some(action) = action_for_key(&event.logical_key) else {
                        return;
                    };
                    match action {
                        GalleryAction::NextShader => {
                            gallery.step(1);
                            apply_selection(&mut session, &mut gallery, &window);
                        }
                        GalleryAction::PreviousShader => {
                            gallery.step(-1);
                            apply_selection(&mut session, &mut gallery, &window);
                        }
                        GalleryAction::SelectIndex(index) => {
                            if gallery.select(index) {
                                apply_selection(&mut session, &mut gallery, &window);
                            }
                        }
                        GalleryAction::CycleParameter => {
                            gallery.cycle_parameter();
                            window.set_title(&window_title(&gallery, session.phase(), None));
                        }
                        GalleryAction::AdjustParameter(direction) => {
                            if let Some((name, value)) = gallery.adjust_parameter(direction) {
                                tracing::info!(parameter = %name, value, "parameter adjusted");
                                session.set_parameters(gallery.values.clone());
                            }
                        }
                        GalleryAction::ResetParameters => {
                            gallery.reset_values();
                            session.set_parameters(gallery.values.clone());
                            tracing::info!("parameters reset to defaults");
                        }
                        GalleryAction::ToggleOverlay => {
                            overlay_enabled = !overlay_enabled;
                            window.set_title(&window_title(&gallery, session.phase(), None));
                        }
                        GalleryAction::Quit => {
                            session.dispose();
                            elwt.exit();
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    match session.render_frame() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                            session.resize(session.size());
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            tracing::error!("surface out of memory; shutting down");
                            session.dispose();
                            elwt.exit();
                        }
                        Err(other) => {
                            tracing::warn!(error = ?other, "surface error; retrying next frame");
                        }
                    }

                    if overlay_enabled && last_overlay_refresh.elapsed() >= OVERLAY_REFRESH {
                        let readout = OverlayReadout::from_fps(session.fps());
                        if readout.severity == OverlaySeverity::Low {
                            tracing::warn!(fps = %readout.label, "frame rate below 30");
                        }
                        window.set_title(&window_title(&gallery, session.phase(), Some(&readout)));
                        last_overlay_refresh = Instant::now();
                    }

                    if session.phase() != Phase::Disposed {
                        window.request_redraw();
                    }
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{ParameterDescriptor, ShaderDefinition};
    use winit::keyboard::SmolStr;

    fn test_catalog() -> Catalog {
        let shaders = vec![
            ShaderDefinition {
                id: "one".to_string(),
                name: "One".to_string(),
                source: "void mainImage(out vec4 c, in vec2 f) { c = vec4(u_speed); }"
                    .to_string(),
                parameters: vec![ParameterDescriptor::float(
                    "u_speed", "Speed", 0.5, 2.0, 0.1, 1.0,
                )],
            },
            ShaderDefinition {
                id: "two".to_string(),
                name: "Two".to_string(),
                source: "void mainImage(out vec4 c, in vec2 f) { c = vec4(1.0); }".to_string(),
                parameters: vec![],
            },
        ];
        Catalog::new(shaders).expect("test catalog valid")
    }

    #[test]
    fn stepping_wraps_in_both_directions() {
        let mut gallery = GalleryState::new(test_catalog(), 0);
        gallery.step(-1);
        assert_eq!(gallery.current().id, "two");
        gallery.step(1);
        assert_eq!(gallery.current().id, "one");
        gallery.step(3);
        assert_eq!(gallery.current().id, "two");
    }

    #[test]
    fn defaults_populate_on_construction_and_reset() {
        let mut gallery = GalleryState::new(test_catalog(), 0);
        assert_eq!(gallery.values.get("u_speed"), Some(&1.0));
        gallery.adjust_parameter(3.0);
        assert_eq!(gallery.values.get("u_speed"), Some(&1.3));
        gallery.reset_values();
        assert_eq!(gallery.values.get("u_speed"), Some(&1.0));
    }

    #[test]
    fn adjustment_steps_and_clamps() {
        let mut gallery = GalleryState::new(test_catalog(), 0);
        for _ in 0..100 {
            gallery.adjust_parameter(1.0);
        }
        assert_eq!(gallery.values.get("u_speed"), Some(&2.0));
        for _ in 0..100 {
            gallery.adjust_parameter(-1.0);
        }
        assert_eq!(gallery.values.get("u_speed"), Some(&0.5));
    }

    #[test]
    fn adjustment_without_parameters_is_none() {
        let mut gallery = GalleryState::new(test_catalog(), 1);
        assert!(gallery.adjust_parameter(1.0).is_none());
        gallery.cycle_parameter();
        assert_eq!(gallery.selected, 0);
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::ArrowRight)),
            Some(GalleryAction::NextShader)
        );
        assert_eq!(
            action_for_key(&Key::Character(SmolStr::new("3"))),
            Some(GalleryAction::SelectIndex(2))
        );
        assert_eq!(
            action_for_key(&Key::Character(SmolStr::new("F"))),
            Some(GalleryAction::ToggleOverlay)
        );
        // Digit zero has no catalog position.
        assert_eq!(action_for_key(&Key::Character(SmolStr::new("0"))), None);
        assert_eq!(action_for_key(&Key::Character(SmolStr::new("x"))), None);
    }

    #[test]
    fn pointer_normalization_flips_y() {
        let size = PhysicalSize::new(800, 600);
        let (x, y) = normalize_pointer(PhysicalPosition::new(400.0, 600.0), size);
        assert!((x - 0.5).abs() < 1e-6);
        assert!(y.abs() < 1e-6, "bottom of the window must map to y=0");
        let (_, top) = normalize_pointer(PhysicalPosition::new(0.0, 0.0), size);
        assert!((top - 1.0).abs() < 1e-6);
    }
}
