use catalog::ShaderDefinition;

use crate::compile::{compile_stage, wrap_fragment, StageKind, VERTEX_SHADER_GLSL};
use crate::error::ShaderBuildError;
use crate::ParameterValues;

use super::geometry::QuadGeometry;
use super::uniforms::ParamPlan;

/// An executable program for one shader definition.
///
/// Owns the render pipeline, the shader's parameter uniform buffer, the bind
/// group tying both uniform blocks together, and the packing plan derived
/// from the definition's descriptors. Dropping the program releases every
/// device resource it created; the previous program is always dropped before
/// a replacement is installed.
pub(crate) struct ShaderProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group: wgpu::BindGroup,
    param_buffer: Option<wgpu::Buffer>,
    plan: ParamPlan,
}

impl ShaderProgram {
    /// Compiles the fixed vertex stage and the wrapped fragment source, then
    /// links them into a pipeline. Both stage modules are dropped once
    /// linking has been attempted, regardless of the outcome.
    pub(crate) fn build(
        device: &wgpu::Device,
        frame_buffer: &wgpu::Buffer,
        surface_format: wgpu::TextureFormat,
        definition: &ShaderDefinition,
    ) -> Result<Self, ShaderBuildError> {
        let vertex_module = compile_stage(device, StageKind::Vertex, VERTEX_SHADER_GLSL)
            .map_err(ShaderBuildError::VertexCompileFailed)?;

        let wrapped = wrap_fragment(definition);
        let fragment_module = compile_stage(device, StageKind::Fragment, &wrapped)
            .map_err(ShaderBuildError::FragmentCompileFailed)?;

        let plan = ParamPlan::from_descriptors(&definition.parameters);

        let mut layout_entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        if !plan.is_empty() {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }

        // Everything from here on is link-stage work; collect any validation
        // failure as a single LinkFailed diagnostic.
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("gallery uniforms layout"),
                entries: &layout_entries,
            });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gallery pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("shader pipeline `{}`", definition.id)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[QuadGeometry::vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        let param_buffer = if plan.is_empty() {
            None
        } else {
            Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("shader parameters"),
                size: plan.byte_len(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }))
        };

        let mut bind_entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: frame_buffer.as_entire_binding(),
        }];
        if let Some(buffer) = &param_buffer {
            bind_entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: buffer.as_entire_binding(),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gallery uniforms"),
            layout: &bind_group_layout,
            entries: &bind_entries,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderBuildError::LinkFailed(error.to_string()));
        }

        Ok(Self {
            pipeline,
            bind_group,
            param_buffer,
            plan,
        })
    }

    /// Writes the current parameter values through the queue. A no-op for
    /// shaders without parameters.
    pub(crate) fn upload_parameters(&self, queue: &wgpu::Queue, values: &ParameterValues) {
        if let Some(buffer) = &self.param_buffer {
            queue.write_buffer(buffer, 0, &self.plan.pack(values));
        }
    }
}
