// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Literal parameters of one sample.
//!
//! A sample is nothing more than a [`SampleConfig`] handed to a
//! [`crate::images::lifecycle::Lifecycle`]: shader sources, geometry, an optional
//! texture, a sample count and a framebuffer size.

use crate::bindings::sampler::SamplerDescriptor;
use crate::bindings::texture_source::TextureSource;
use crate::images::render_pass::{Choreography, Rect};
use crate::images::shader::ShaderSource;
use crate::images::vertex_layout::{FormatError, VertexFormat};
use crate::images::view::Projection;
use crate::pixel_formats::PixelFormat;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("sample has no vertices")]
    NoVertices,
    #[error("{len} vertex bytes is not a multiple of the {stride}-byte stride")]
    RaggedVertices { len: usize, stride: u32 },
    #[error("{0} elements is not a whole number of triangles")]
    RaggedElements(usize),
    #[error("element {index} refers to vertex {vertex} of {count}")]
    ElementOutOfRange { index: usize, vertex: u16, count: usize },
    #[error(transparent)]
    VertexFormat(#[from] FormatError),
    #[error("{0} needs a diffuse texture")]
    MissingTexture(&'static str),
    #[error("{0:?} can't be a render target")]
    RenderFormat(PixelFormat),
    #[error("inset {0:?} is empty")]
    EmptyInset(Rect),
    #[error("inset {0:?} reaches past the largest pixel coordinate")]
    InsetOutOfRange(Rect),
}

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub name: String,
    pub vertex_shader: ShaderSource,
    pub fragment_shader: ShaderSource,
    pub vertices: Vec<u8>,
    pub vertex_format: VertexFormat,
    pub elements: Vec<u16>,
    pub texture: Option<TextureSource>,
    pub sampler: SamplerDescriptor,
    /// Sample count of the offscreen multisampled target.
    pub samples: u32,
    pub framebuffer_size: (u32, u32),
    /// Size of the resolve target; the framebuffer size when `None`.
    pub resolve_size: Option<(u32, u32)>,
    pub render_format: PixelFormat,
    pub choreography: Choreography,
    pub projection: Projection,
    pub clear_color: [f32; 4],
}

impl SampleConfig {
    pub fn builder(name: &str, vertex_shader: ShaderSource, fragment_shader: ShaderSource) -> SampleConfigBuilder {
        SampleConfigBuilder {
            config: SampleConfig {
                name: name.to_string(),
                vertex_shader,
                fragment_shader,
                vertices: Vec::new(),
                vertex_format: VertexFormat::new(0),
                elements: Vec::new(),
                texture: None,
                sampler: SamplerDescriptor::nearest(name),
                samples: 4,
                framebuffer_size: (160, 160),
                resolve_size: None,
                render_format: PixelFormat::RGBA8UNorm,
                choreography: Choreography::MultisampleResolve,
                projection: Projection::Perspective {
                    fov_y: std::f32::consts::FRAC_PI_4,
                    near: 0.1,
                    far: 100.0,
                },
                clear_color: [0.0, 0.5, 1.0, 1.0],
            },
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self.vertex_format.stride {
            0 => 0,
            stride => self.vertices.len() / stride as usize,
        }
    }

    pub fn resolve_size(&self) -> (u32, u32) {
        self.resolve_size.unwrap_or(self.framebuffer_size)
    }

    /// Checks geometry and choreography requirements.
    ///
    /// Sample counts and framebuffer sizes are left to the framebuffer
    /// completeness check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vertex_format.validate()?;
        if self.vertices.is_empty() {
            return Err(ConfigError::NoVertices);
        }
        let stride = self.vertex_format.stride;
        if self.vertices.len() % stride as usize != 0 {
            return Err(ConfigError::RaggedVertices {
                len: self.vertices.len(),
                stride,
            });
        }
        if self.elements.is_empty() || self.elements.len() % 3 != 0 {
            return Err(ConfigError::RaggedElements(self.elements.len()));
        }
        let count = self.vertex_count();
        if let Some((index, vertex)) = self
            .elements
            .iter()
            .enumerate()
            .find(|(_, v)| **v as usize >= count)
        {
            return Err(ConfigError::ElementOutOfRange {
                index,
                vertex: *vertex,
                count,
            });
        }
        if !self.render_format.is_renderable() {
            return Err(ConfigError::RenderFormat(self.render_format));
        }
        match self.choreography {
            Choreography::MultisampleResolve if self.texture.is_none() => {
                Err(ConfigError::MissingTexture("multisample resolve"))
            }
            Choreography::SplitViewport { inset, .. } if inset.width == 0 || inset.height == 0 => {
                Err(ConfigError::EmptyInset(inset))
            }
            Choreography::SplitViewport { inset, .. } if !inset.fits_u32() => {
                Err(ConfigError::InsetOutOfRange(inset))
            }
            _ => Ok(()),
        }
    }
}

/// Builder for [`SampleConfig`].
#[derive(Debug, Clone)]
pub struct SampleConfigBuilder {
    config: SampleConfig,
}

impl SampleConfigBuilder {
    /// Vertex data as plain-old-data values, plus its layout.
    pub fn vertices<T: bytemuck::Pod>(mut self, vertices: &[T], format: VertexFormat) -> Self {
        self.config.vertices = bytemuck::cast_slice(vertices).to_vec();
        self.config.vertex_format = format;
        self
    }

    pub fn elements(mut self, elements: &[u16]) -> Self {
        self.config.elements = elements.to_vec();
        self
    }

    pub fn texture(mut self, texture: TextureSource) -> Self {
        self.config.texture = Some(texture);
        self
    }

    pub fn sampler(mut self, sampler: SamplerDescriptor) -> Self {
        self.config.sampler = sampler;
        self
    }

    pub fn samples(mut self, samples: u32) -> Self {
        self.config.samples = samples;
        self
    }

    pub fn framebuffer_size(mut self, width: u32, height: u32) -> Self {
        self.config.framebuffer_size = (width, height);
        self
    }

    pub fn resolve_size(mut self, width: u32, height: u32) -> Self {
        self.config.resolve_size = Some((width, height));
        self
    }

    pub fn render_format(mut self, format: PixelFormat) -> Self {
        self.config.render_format = format;
        self
    }

    pub fn choreography(mut self, choreography: Choreography) -> Self {
        self.config.choreography = choreography;
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.config.projection = projection;
        self
    }

    pub fn clear_color(mut self, color: [f32; 4]) -> Self {
        self.config.clear_color = color;
        self
    }

    pub fn build(self) -> Result<SampleConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::vertex_layout::{Semantic, VertexAttribute};

    fn base() -> SampleConfigBuilder {
        SampleConfig::builder(
            "t",
            ShaderSource::embedded("v", ""),
            ShaderSource::embedded("f", ""),
        )
        .vertices(
            &[[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]],
            VertexFormat::new(8).with(VertexAttribute::float(Semantic::Position, 2, 0)),
        )
        .elements(&[0, 1, 2])
        .texture(TextureSource::checkerboard([0; 4], [255; 4]))
    }

    #[test]
    fn valid_config_builds() {
        let config = base().build().unwrap();
        assert_eq!(config.vertex_count(), 3);
        assert_eq!(config.resolve_size(), (160, 160));
    }

    #[test]
    fn elements_must_be_in_range() {
        let err = base().elements(&[0, 1, 3]).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ElementOutOfRange {
                index: 2,
                vertex: 3,
                count: 3
            }
        );
        assert_eq!(
            base().elements(&[0, 1]).build().unwrap_err(),
            ConfigError::RaggedElements(2)
        );
    }

    #[test]
    fn multisample_resolve_needs_texture() {
        let mut builder = base();
        builder.config.texture = None;
        assert_eq!(
            builder.build().unwrap_err(),
            ConfigError::MissingTexture("multisample resolve")
        );
    }

    #[test]
    fn zero_samples_is_left_to_completeness() {
        assert!(base().samples(0).build().is_ok());
    }

    #[test]
    fn empty_inset_is_rejected() {
        let err = base()
            .choreography(Choreography::SplitViewport {
                inset: Rect::new(0, 0, 0, 10),
                inset_clear: [0.0; 4],
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyInset(_)));
    }

    #[test]
    fn inset_edges_must_fit() {
        let far = Rect::new(u32::MAX - 5, 10, 100, 100);
        let err = base()
            .choreography(Choreography::SplitViewport {
                inset: far,
                inset_clear: [0.0; 4],
            })
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InsetOutOfRange(far));
    }
}
