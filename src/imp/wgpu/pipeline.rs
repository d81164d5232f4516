// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Render pipelines.

A pipeline depends on the program, the vertex format, and the target's format and
sample count, so pipelines are built on first use and cached under that key.  The
bind group layout comes from the shaders: group 0 holds the transform uniform at
binding 0 and, for textured programs, the texture at 1 and the sampler at 2.
*/

use std::collections::HashMap;

use crate::bindings::handle::Handle;
use crate::images::vertex_layout::{AttributeClass, ElementType, VertexAttribute, VertexFormat};
use crate::imp::{Error, FRAGMENT_ENTRY, VERTEX_ENTRY};

/// A linked vertex and fragment module.
#[derive(Debug)]
pub(super) struct Program {
    pub(super) label: String,
    pub(super) vertex: wgpu::ShaderModule,
    pub(super) fragment: wgpu::ShaderModule,
}

fn attribute_format(attribute: &VertexAttribute) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    let format = match (
        attribute.class,
        attribute.element_type,
        attribute.normalized,
        attribute.components,
    ) {
        (AttributeClass::Float, ElementType::F32, false, 1) => F::Float32,
        (AttributeClass::Float, ElementType::F32, false, 2) => F::Float32x2,
        (AttributeClass::Float, ElementType::F32, false, 3) => F::Float32x3,
        (AttributeClass::Float, ElementType::F32, false, 4) => F::Float32x4,
        (AttributeClass::Float, ElementType::U8, true, 2) => F::Unorm8x2,
        (AttributeClass::Float, ElementType::U8, true, 4) => F::Unorm8x4,
        (AttributeClass::Float, ElementType::I8, true, 2) => F::Snorm8x2,
        (AttributeClass::Float, ElementType::I8, true, 4) => F::Snorm8x4,
        (AttributeClass::Float, ElementType::U16, true, 2) => F::Unorm16x2,
        (AttributeClass::Float, ElementType::U16, true, 4) => F::Unorm16x4,
        (AttributeClass::Float, ElementType::I16, true, 2) => F::Snorm16x2,
        (AttributeClass::Float, ElementType::I16, true, 4) => F::Snorm16x4,
        (AttributeClass::Integer, ElementType::U8, _, 2) => F::Uint8x2,
        (AttributeClass::Integer, ElementType::U8, _, 4) => F::Uint8x4,
        (AttributeClass::Integer, ElementType::I8, _, 2) => F::Sint8x2,
        (AttributeClass::Integer, ElementType::I8, _, 4) => F::Sint8x4,
        (AttributeClass::Integer, ElementType::U16, _, 2) => F::Uint16x2,
        (AttributeClass::Integer, ElementType::U16, _, 4) => F::Uint16x4,
        (AttributeClass::Integer, ElementType::I16, _, 2) => F::Sint16x2,
        (AttributeClass::Integer, ElementType::I16, _, 4) => F::Sint16x4,
        (AttributeClass::Integer, ElementType::U32, _, 1) => F::Uint32,
        (AttributeClass::Integer, ElementType::U32, _, 2) => F::Uint32x2,
        (AttributeClass::Integer, ElementType::U32, _, 3) => F::Uint32x3,
        (AttributeClass::Integer, ElementType::U32, _, 4) => F::Uint32x4,
        (AttributeClass::Integer, ElementType::I32, _, 1) => F::Sint32,
        (AttributeClass::Integer, ElementType::I32, _, 2) => F::Sint32x2,
        (AttributeClass::Integer, ElementType::I32, _, 3) => F::Sint32x3,
        (AttributeClass::Integer, ElementType::I32, _, 4) => F::Sint32x4,
        (AttributeClass::Double, ElementType::F64, _, 1) => F::Float64,
        (AttributeClass::Double, ElementType::F64, _, 2) => F::Float64x2,
        (AttributeClass::Double, ElementType::F64, _, 3) => F::Float64x3,
        (AttributeClass::Double, ElementType::F64, _, 4) => F::Float64x4,
        _ => return None,
    };
    Some(format)
}

/// The wgpu attributes for `format`, which must already be valid.
pub(super) fn vertex_attributes(format: &VertexFormat) -> Result<Vec<wgpu::VertexAttribute>, Error> {
    format
        .attributes
        .iter()
        .map(|attribute| {
            let wgpu_format = attribute_format(attribute).ok_or_else(|| {
                Error::Unsupported(format!(
                    "{} x {:?} {:?} vertex attribute in the wgpu driver",
                    attribute.components, attribute.element_type, attribute.class
                ))
            })?;
            Ok(wgpu::VertexAttribute {
                format: wgpu_format,
                offset: attribute.offset as u64,
                shader_location: attribute.semantic.location(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct PipelineKey {
    pub(super) program: Handle,
    pub(super) vertex_format: Handle,
    pub(super) target_format: wgpu::TextureFormat,
    pub(super) samples: u32,
}

#[derive(Debug, Default)]
pub(super) struct PipelineCache {
    draws: HashMap<PipelineKey, wgpu::RenderPipeline>,
    clears: HashMap<(wgpu::TextureFormat, u32), wgpu::RenderPipeline>,
    clear_module: Option<wgpu::ShaderModule>,
}

/// Fills the scissor rect with the blend constant.
const CLEAR_SHADER: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    let corner = vec2<f32>(f32((i << 1u) & 2u), f32(i & 2u));
    return vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

fn primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}

fn multisample(samples: u32) -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: samples,
        mask: !0,
        alpha_to_coverage_enabled: false,
    }
}

impl PipelineCache {
    pub(super) fn draw(
        &mut self,
        device: &wgpu::Device,
        key: PipelineKey,
        program: &Program,
        stride: u32,
        attributes: &[wgpu::VertexAttribute],
    ) -> &wgpu::RenderPipeline {
        self.draws.entry(key).or_insert_with(|| {
            logwise::debuginternal_sync!(
                "building pipeline for {program} at {samples}x",
                program = logwise::privacy::LogIt(&program.label),
                samples = key.samples
            );
            let buffers = [wgpu::VertexBufferLayout {
                array_stride: stride as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            }];
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&program.label),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                primitive: primitive(),
                depth_stencil: None,
                multisample: multisample(key.samples),
                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.target_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
                cache: None,
            })
        })
    }

    /// A pipeline that writes the blend constant to every covered sample.
    pub(super) fn clear(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        samples: u32,
    ) -> &wgpu::RenderPipeline {
        let module = &*self.clear_module.get_or_insert_with(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("scissored clear"),
                source: wgpu::ShaderSource::Wgsl(CLEAR_SHADER.into()),
            })
        });
        self.clears.entry((format, samples)).or_insert_with(|| {
            let constant = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Constant,
                dst_factor: wgpu::BlendFactor::Zero,
                operation: wgpu::BlendOperation::Add,
            };
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("scissored clear"),
                layout: None,
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                primitive: primitive(),
                depth_stencil: None,
                multisample: multisample(samples),
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState {
                            color: constant,
                            alpha: constant,
                        }),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
                cache: None,
            })
        })
    }

    /// Drops cached pipelines built from `handle`.
    pub(super) fn evict(&mut self, handle: Handle) {
        self.draws
            .retain(|key, _| key.program != handle && key.vertex_format != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::vertex_layout::Semantic;

    #[test]
    fn maps_sample_formats() {
        let format = VertexFormat::new(12)
            .with(VertexAttribute::float(Semantic::Position, 2, 0))
            .with(VertexAttribute::normalized(Semantic::Color, 4, ElementType::U8, 8));
        let attributes = vertex_attributes(&format).unwrap();
        assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attributes[1].format, wgpu::VertexFormat::Unorm8x4);
        assert_eq!(attributes[1].shader_location, 3);
        assert_eq!(attributes[1].offset, 8);
    }

    #[test]
    fn three_byte_colors_are_unsupported() {
        let format = VertexFormat::new(16)
            .with(VertexAttribute::normalized(Semantic::Color, 3, ElementType::U8, 0));
        assert!(matches!(
            vertex_attributes(&format),
            Err(Error::Unsupported(_))
        ));
    }
}
