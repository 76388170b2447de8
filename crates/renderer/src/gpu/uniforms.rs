//! Uniform data marshalled to the GPU each frame.
//!
//! Two buffers feed every shader: the fixed frame block ([`FrameUniforms`],
//! binding 0) and the per-shader parameter block (binding 1) whose layout is
//! derived from the catalog descriptors by [`ParamPlan`]. Both match the GLSL
//! std140 blocks generated in `compile.rs` field for field.

use bytemuck::{Pod, Zeroable};
use catalog::{ParameterDescriptor, ParameterKind};
use winit::dpi::PhysicalSize;

use crate::ParameterValues;

/// std140 mirror of the generated `FrameUniforms` block:
/// vec2 resolution (offset 0), vec2 mouse (offset 8), float time (offset 16),
/// padded to the 16-byte-aligned span of 32 bytes.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct FrameUniforms {
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub time: f32,
    _pad: [f32; 3],
}

unsafe impl Zeroable for FrameUniforms {}
unsafe impl Pod for FrameUniforms {}

impl FrameUniforms {
    pub(crate) const SIZE: u64 = std::mem::size_of::<FrameUniforms>() as u64;

    pub(crate) fn new(size: PhysicalSize<u32>, mouse: [f32; 2], time: f32) -> Self {
        Self {
            resolution: [size.width as f32, size.height as f32],
            mouse,
            time,
            _pad: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone)]
struct PlanEntry {
    name: String,
    kind: ParameterKind,
    default: f64,
}

/// Packing plan for a shader's parameter block: one 4-byte scalar per
/// descriptor in declaration order, padded to a 16-byte multiple.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParamPlan {
    entries: Vec<PlanEntry>,
}

impl ParamPlan {
    pub(crate) fn from_descriptors(descriptors: &[ParameterDescriptor]) -> Self {
        Self {
            entries: descriptors
                .iter()
                .map(|descriptor| PlanEntry {
                    name: descriptor.name.clone(),
                    kind: descriptor.kind,
                    default: descriptor.default,
                })
                .collect(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Buffer size for this block; zero when the shader has no parameters.
    pub(crate) fn byte_len(&self) -> u64 {
        if self.entries.is_empty() {
            0
        } else {
            let raw = self.entries.len() * 4;
            (raw.div_ceil(16) * 16) as u64
        }
    }

    /// Packs the caller's values into the block layout. Missing keys fall
    /// back to the descriptor default; keys not named by any descriptor are
    /// ignored.
    pub(crate) fn pack(&self, values: &ParameterValues) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len() as usize);
        for entry in &self.entries {
            let value = values.get(&entry.name).copied().unwrap_or(entry.default);
            match entry.kind {
                ParameterKind::Float => bytes.extend_from_slice(&(value as f32).to_le_bytes()),
                ParameterKind::Int => {
                    bytes.extend_from_slice(&(value.round() as i32).to_le_bytes())
                }
            }
        }
        bytes.resize(self.byte_len() as usize, 0);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn plan() -> ParamPlan {
        ParamPlan::from_descriptors(&[
            ParameterDescriptor::float("u_speed", "Speed", 0.5, 2.0, 0.1, 1.0),
            ParameterDescriptor::int("u_octaves", "Octaves", 1.0, 8.0, 1.0, 4.0),
        ])
    }

    #[test]
    fn frame_uniforms_match_std140_span() {
        assert_eq!(FrameUniforms::SIZE, 32);
        assert_eq!(std::mem::align_of::<FrameUniforms>(), 16);
        let uniforms = FrameUniforms::new(PhysicalSize::new(800, 600), [0.25, 0.75], 1.5);
        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(&bytes[0..4], &800f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &600f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &1.5f32.to_le_bytes());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let bytes = plan().pack(&HashMap::new());
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &4i32.to_le_bytes());
    }

    #[test]
    fn supplied_values_override_defaults() {
        let mut values = HashMap::new();
        values.insert("u_speed".to_string(), 1.5);
        let bytes = plan().pack(&values);
        assert_eq!(&bytes[0..4], &1.5f32.to_le_bytes());
        // Unspecified parameter still packs its default.
        assert_eq!(&bytes[4..8], &4i32.to_le_bytes());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut values = HashMap::new();
        values.insert("u_mystery".to_string(), 42.0);
        let bytes = plan().pack(&values);
        assert_eq!(bytes.len() as u64, plan().byte_len());
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
    }

    #[test]
    fn int_values_round_before_marshalling() {
        let mut values = HashMap::new();
        values.insert("u_octaves".to_string(), 5.7);
        let bytes = plan().pack(&values);
        assert_eq!(&bytes[4..8], &6i32.to_le_bytes());
    }

    #[test]
    fn buffer_length_rounds_to_sixteen() {
        assert_eq!(plan().byte_len(), 16);
        let five = ParamPlan::from_descriptors(&[
            ParameterDescriptor::float("a", "a", 0.0, 1.0, 0.1, 0.0),
            ParameterDescriptor::float("b", "b", 0.0, 1.0, 0.1, 0.0),
            ParameterDescriptor::float("c", "c", 0.0, 1.0, 0.1, 0.0),
            ParameterDescriptor::float("d", "d", 0.0, 1.0, 0.1, 0.0),
            ParameterDescriptor::float("e", "e", 0.0, 1.0, 0.1, 0.0),
        ]);
        assert_eq!(five.byte_len(), 32);
        assert_eq!(ParamPlan::default().byte_len(), 0);
    }
}
