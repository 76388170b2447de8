//! The per-frame render session: the one place where GPU resources, timing,
//! pointer smoothing and parameter state meet.
//!
//! A session moves through `Rendering ⇄ Degraded → Disposed`. Construction
//! either yields a session that is ready to draw or fails outright (context,
//! geometry or the initial program build). A failed shader switch never stops
//! the loop: the session drops to `Degraded`, where every frame clears the
//! surface to a fixed fallback color until a later switch succeeds. Disposal
//! is idempotent and terminal.

use std::time::Instant;

use catalog::ShaderDefinition;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::diagnostics::FpsMeter;
use crate::error::{SessionError, ShaderBuildError};
use crate::ParameterValues;

use super::context::GpuContext;
use super::geometry::QuadGeometry;
use super::pipeline::ShaderProgram;
use super::uniforms::FrameUniforms;

/// Shown whenever no valid program is installed; dark enough to read an
/// error message over, never a frozen or corrupted frame.
const FALLBACK_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// Per-frame smoothing factor for pointer motion. Applied once per frame, so
/// the damping is frame-rate dependent; acceptable for gallery input.
const POINTER_SMOOTHING: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Normal operation: a valid program draws every frame.
    Rendering,
    /// The last program (re)build failed; frames clear to the fallback color
    /// but the loop keeps running.
    Degraded,
    /// Torn down; all further calls are no-ops.
    Disposed,
}

/// Exponentially smoothed pointer position in normalized [0,1]² coordinates,
/// Y measured from the bottom. Input events only move the target; the
/// per-frame step is the sole consumer, decoupling event rate from frame
/// rate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PointerState {
    target: [f32; 2],
    current: [f32; 2],
}

impl Default for PointerState {
    fn default() -> Self {
        // Start centred so shaders see a sensible pointer before any input.
        Self {
            target: [0.5, 0.5],
            current: [0.5, 0.5],
        }
    }
}

impl PointerState {
    pub(crate) fn set_target(&mut self, x: f32, y: f32) {
        self.target = [x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)];
    }

    pub(crate) fn step(&mut self) {
        for axis in 0..2 {
            self.current[axis] += POINTER_SMOOTHING * (self.target[axis] - self.current[axis]);
        }
    }

    pub(crate) fn current(&self) -> [f32; 2] {
        self.current
    }
}

/// Elapsed-time origin; restarted on every successful shader switch so each
/// shader's animation phase begins at zero.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    pub(crate) fn started_now() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub(crate) fn restart(&mut self) {
        self.origin = Instant::now();
    }

    pub(crate) fn elapsed_seconds(&self) -> f32 {
        self.origin.elapsed().as_secs_f32()
    }
}

pub struct RenderSession {
    context: GpuContext,
    geometry: Option<QuadGeometry>,
    frame_buffer: wgpu::Buffer,
    program: Option<ShaderProgram>,
    parameters: ParameterValues,
    pointer: PointerState,
    clock: SessionClock,
    fps: FpsMeter,
    phase: Phase,
}

impl RenderSession {
    /// Acquires the context, builds the shared quad and the initial program.
    /// Any failure aborts construction; no partially initialised session
    /// exists afterwards.
    pub fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        definition: &ShaderDefinition,
    ) -> Result<Self, SessionError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size)?;
        let geometry = QuadGeometry::new(&context.device)?;

        let frame_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniforms"),
            size: FrameUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let program = ShaderProgram::build(
            &context.device,
            &frame_buffer,
            context.surface_format,
            definition,
        )?;
        tracing::info!(shader = %definition.id, "render session initialised");

        Ok(Self {
            context,
            geometry: Some(geometry),
            frame_buffer,
            program: Some(program),
            parameters: ParameterValues::new(),
            pointer: PointerState::default(),
            clock: SessionClock::started_now(),
            fps: FpsMeter::new(),
            phase: Phase::Rendering,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    /// Replaces the active program with one built from `definition`.
    ///
    /// The current program is destroyed first; on success the new program is
    /// installed and the time origin resets so elapsed time restarts at zero
    /// (also when re-selecting the currently active shader). On failure the
    /// session drops to `Degraded` and the structured error is returned for
    /// display; the loop itself keeps running.
    pub fn switch_shader(&mut self, definition: &ShaderDefinition) -> Result<(), ShaderBuildError> {
        if self.phase == Phase::Disposed {
            return Ok(());
        }

        self.program = None;
        match ShaderProgram::build(
            &self.context.device,
            &self.frame_buffer,
            self.context.surface_format,
            definition,
        ) {
            Ok(program) => {
                self.program = Some(program);
                self.clock.restart();
                self.phase = Phase::Rendering;
                tracing::info!(shader = %definition.id, "shader activated");
                Ok(())
            }
            Err(error) => {
                self.phase = Phase::Degraded;
                tracing::warn!(shader = %definition.id, error = %error, "shader build failed");
                Err(error)
            }
        }
    }

    /// Stores the latest caller-owned parameter values. Read fresh on every
    /// frame; missing keys fall back to descriptor defaults and unknown keys
    /// are ignored at upload time.
    pub fn set_parameters(&mut self, values: ParameterValues) {
        self.parameters = values;
    }

    /// Updates the raw pointer target in normalized [0,1]² (Y-up). Smoothing
    /// happens in the frame step.
    pub fn set_pointer_target(&mut self, x: f32, y: f32) {
        self.pointer.set_target(x, y);
    }

    /// Follows a backing-size change notification. Only the swapchain is
    /// touched; program and geometry are unaffected.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if self.phase == Phase::Disposed {
            return;
        }
        self.context.resize(new_size);
    }

    /// Renders one frame. Exactly one call per display-sync callback.
    pub fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        if self.phase == Phase::Disposed {
            return Ok(());
        }

        // Acquire first: a Lost/Outdated surface must not advance the fps
        // window or the pointer, since no frame is produced.
        let frame = self.context.surface.get_current_texture()?;

        self.fps.record_frame(Instant::now());
        self.pointer.step();
        let elapsed = self.clock.elapsed_seconds();
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        let drawable = match (&self.program, &self.geometry, self.phase) {
            (Some(program), Some(geometry), Phase::Rendering) => Some((program, geometry)),
            _ => None,
        };

        if let Some((program, geometry)) = drawable {
            let uniforms = FrameUniforms::new(self.context.size, self.pointer.current(), elapsed);
            self.context
                .queue
                .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));
            program.upload_parameters(&self.context.queue, &self.parameters);

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shader pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, &program.bind_group, &[]);
            geometry.draw(&mut render_pass);
        } else {
            // Degraded: clear only, no uniform upload, no draw call.
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("fallback pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(FALLBACK_CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Releases program, geometry and (on drop) the context. Idempotent;
    /// after disposal no frame is rendered and none is requested.
    pub fn dispose(&mut self) {
        if self.phase == Phase::Disposed {
            return;
        }
        self.program = None;
        self.geometry = None;
        self.phase = Phase::Disposed;
        tracing::debug!("render session disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pointer_converges_monotonically() {
        let mut pointer = PointerState::default();
        pointer.set_target(1.0, 0.0);
        let mut previous = (pointer.current()[0] - 1.0).abs();
        for _ in 0..50 {
            pointer.step();
            let distance = (pointer.current()[0] - 1.0).abs();
            assert!(distance < previous, "distance must strictly decrease");
            previous = distance;
        }
        assert!(previous < 0.01);
    }

    #[test]
    fn pointer_both_axes_converge() {
        let mut pointer = PointerState::default();
        pointer.set_target(0.9, 0.1);
        for _ in 0..200 {
            pointer.step();
        }
        let [x, y] = pointer.current();
        assert!((x - 0.9).abs() < 1e-3);
        assert!((y - 0.1).abs() < 1e-3);
    }

    #[test]
    fn pointer_target_is_clamped() {
        let mut pointer = PointerState::default();
        pointer.set_target(2.0, -1.0);
        for _ in 0..300 {
            pointer.step();
        }
        let [x, y] = pointer.current();
        assert!(x <= 1.0 + 1e-3);
        assert!(y >= -1e-3);
    }

    #[test]
    fn clock_restart_resets_elapsed() {
        let mut clock = SessionClock::started_now();
        std::thread::sleep(Duration::from_millis(30));
        assert!(clock.elapsed_seconds() >= 0.02);
        clock.restart();
        assert!(clock.elapsed_seconds() < 0.02);
        // Restarting twice in a row behaves the same.
        clock.restart();
        assert!(clock.elapsed_seconds() < 0.02);
    }
}
