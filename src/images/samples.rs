// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Ready-made sample configurations.
//!
//! Each sample is a [`SampleConfig`] with fixed geometry and shaders from the data
//! directory.  Nothing here touches a driver.

use crate::bindings::texture_source::TextureSource;
use crate::images::config::{ConfigError, SampleConfig};
use crate::images::render_pass::{Choreography, Rect};
use crate::images::shader::ShaderSource;
use crate::images::vertex_layout::{ElementType, Semantic, VertexAttribute, VertexFormat};
use crate::images::view::Projection;

/// Two triangles covering the unit quad.
pub const QUAD_ELEMENTS: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Position and texture coordinate of one textured vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 2],
    pub texcoord: [f32; 2],
}

impl TexturedVertex {
    pub fn format() -> VertexFormat {
        VertexFormat::new(size_of::<TexturedVertex>() as u32)
            .with(VertexAttribute::float(Semantic::Position, 2, 0))
            .with(VertexAttribute::float(Semantic::Texcoord, 2, 8))
    }
}

/// Position plus an 8-bit normalized color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColoredVertex {
    pub position: [f32; 2],
    pub color: [u8; 4],
}

impl ColoredVertex {
    pub fn format() -> VertexFormat {
        VertexFormat::new(size_of::<ColoredVertex>() as u32)
            .with(VertexAttribute::float(Semantic::Position, 2, 0))
            .with(VertexAttribute::normalized(
                Semantic::Color,
                4,
                ElementType::U8,
                8,
            ))
    }
}

/// The unit quad, texture origin at the top-left corner.
pub const TEXTURED_QUAD: [TexturedVertex; 4] = [
    TexturedVertex {
        position: [-1.0, 1.0],
        texcoord: [0.0, 0.0],
    },
    TexturedVertex {
        position: [1.0, 1.0],
        texcoord: [1.0, 0.0],
    },
    TexturedVertex {
        position: [1.0, -1.0],
        texcoord: [1.0, 1.0],
    },
    TexturedVertex {
        position: [-1.0, -1.0],
        texcoord: [0.0, 1.0],
    },
];

const ORANGE: [u8; 4] = [255, 128, 0, 255];

pub const COLORED_QUAD: [ColoredVertex; 4] = [
    ColoredVertex {
        position: [-1.0, -1.0],
        color: ORANGE,
    },
    ColoredVertex {
        position: [1.0, -1.0],
        color: ORANGE,
    },
    ColoredVertex {
        position: [1.0, 1.0],
        color: ORANGE,
    },
    ColoredVertex {
        position: [-1.0, 1.0],
        color: ORANGE,
    },
];

/**
Renders a textured quad into a 4x multisampled 160x160 framebuffer, resolves it, and
draws the resolved image scaled up on the window.
*/
pub fn direct_state_access(texture: TextureSource) -> Result<SampleConfig, ConfigError> {
    SampleConfig::builder(
        "direct state access",
        ShaderSource::path("direct-state-access.vert.wgsl"),
        ShaderSource::path("direct-state-access.frag.wgsl"),
    )
    .vertices(&TEXTURED_QUAD, TexturedVertex::format())
    .elements(&QUAD_ELEMENTS)
    .texture(texture)
    .samples(4)
    .framebuffer_size(160, 160)
    .choreography(Choreography::MultisampleResolve)
    .clear_color([0.0, 0.5, 1.0, 1.0])
    .build()
}

/// Where [`viewport`] draws its second copy, on a 640x480 window.
pub const VIEWPORT_INSET: Rect = Rect::new(64, 312, 160, 120);

/// Draws an orange quad over the whole window, then again inside [`VIEWPORT_INSET`].
pub fn viewport() -> Result<SampleConfig, ConfigError> {
    SampleConfig::builder(
        "viewport",
        ShaderSource::path("flat-color.vert.wgsl"),
        ShaderSource::path("flat-color.frag.wgsl"),
    )
    .vertices(&COLORED_QUAD, ColoredVertex::format())
    .elements(&QUAD_ELEMENTS)
    .choreography(Choreography::SplitViewport {
        inset: VIEWPORT_INSET,
        inset_clear: [0.0, 0.5, 1.0, 1.0],
    })
    .projection(Projection::Perspective {
        fov_y: 45f32.to_radians(),
        near: 0.1,
        far: 100.0,
    })
    .clear_color([0.0, 0.0, 0.0, 1.0])
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        let config =
            direct_state_access(TextureSource::checkerboard([255; 4], [0, 0, 0, 255])).unwrap();
        assert_eq!(config.vertex_count(), 4);
        assert_eq!(config.vertex_format.stride, 16);
        let config = viewport().unwrap();
        assert_eq!(config.vertex_format.stride, 12);
        assert!(config.texture.is_none());
    }

    #[test]
    fn quad_texcoords_follow_top_left_origin() {
        let format = TexturedVertex::format();
        let bytes: &[u8] = bytemuck::cast_slice(&TEXTURED_QUAD);
        assert_eq!(
            format.read_f32(bytes, 0, Semantic::Texcoord),
            Some([0.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(
            format.read_f32(bytes, 0, Semantic::Position),
            Some([-1.0, 1.0, 0.0, 1.0])
        );
    }
}
