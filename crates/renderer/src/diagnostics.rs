//! Frame-rate estimation and the optional fps readout.
//!
//! Both types are pure state: the meter folds inter-frame deltas into a
//! bounded window, and the readout formats the estimate for whatever the
//! host layer wants to do with it (window title, log line). Neither touches
//! the GPU pipeline, so a diagnostics refresh can never fail a frame.

use std::collections::VecDeque;
use std::time::Instant;

/// Number of inter-frame deltas kept for the rolling estimate.
const FPS_WINDOW: usize = 30;

/// Frame rates below this are flagged as degraded performance.
const LOW_FPS_THRESHOLD: f32 = 30.0;

/// Rolling frames-per-second estimate over the last [`FPS_WINDOW`] frames.
#[derive(Debug, Default)]
pub struct FpsMeter {
    deltas: VecDeque<f32>,
    last_frame: Option<Instant>,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame boundary. The first call only establishes the origin.
    pub fn record_frame(&mut self, now: Instant) {
        if let Some(previous) = self.last_frame.replace(now) {
            let delta = now.saturating_duration_since(previous).as_secs_f32();
            if delta > 0.0 {
                self.deltas.push_back(delta);
                while self.deltas.len() > FPS_WINDOW {
                    self.deltas.pop_front();
                }
            }
        }
    }

    /// Current estimate; 0.0 until two frames have been observed.
    pub fn fps(&self) -> f32 {
        let sum: f32 = self.deltas.iter().sum();
        if sum > 0.0 {
            self.deltas.len() as f32 / sum
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlaySeverity {
    Nominal,
    /// Below 30 fps; hosts render this distinctly (and we log it).
    Low,
}

/// Formatted fps label plus its color-coding severity.
#[derive(Debug, Clone)]
pub struct OverlayReadout {
    pub label: String,
    pub severity: OverlaySeverity,
}

impl OverlayReadout {
    pub fn from_fps(fps: f32) -> Self {
        let severity = if fps > 0.0 && fps < LOW_FPS_THRESHOLD {
            OverlaySeverity::Low
        } else {
            OverlaySeverity::Nominal
        };
        Self {
            label: format!("{fps:.0} fps"),
            severity,
        }
    }
}
