// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Builder pattern for texture creation to reduce parameter count.
//!
//! Texture storage takes a long list of parameters (kind, extent, layers, depth,
//! levels, samples, sample locations) of which only a few are meaningful for any one
//! kind.  [`TextureBuilder`] fills in the rest, and [`TextureDescriptor::validate`]
//! rejects combinations that storage allocation cannot honor.

use crate::bindings::handle::ResourceKind;
use crate::bittricks::max_mip_levels;
use crate::imp::Error;
use crate::pixel_formats::PixelFormat;

/// Texture target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    D2,
    D2Array,
    D2Multisample,
    D2MultisampleArray,
    D3,
    Cube,
    CubeArray,
}

impl TextureKind {
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            TextureKind::D2Array | TextureKind::D2MultisampleArray | TextureKind::CubeArray
        )
    }

    pub const fn is_multisample(self) -> bool {
        matches!(self, TextureKind::D2Multisample | TextureKind::D2MultisampleArray)
    }

    /// Number of 2D images per layer.
    pub const fn faces(self) -> u32 {
        match self {
            TextureKind::Cube | TextureKind::CubeArray => 6,
            _ => 1,
        }
    }
}

/// Everything needed to allocate texture storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub label: String,
    pub kind: TextureKind,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub layers: u32,
    pub levels: u32,
    pub samples: u32,
    pub fixed_sample_locations: bool,
    /// The texture will be a color attachment.
    pub render_target: bool,
}

impl TextureDescriptor {
    /// Rejects parameter combinations storage allocation cannot honor.
    pub fn validate(&self) -> Result<(), Error> {
        let fail = |message: String| {
            Err(Error::creation(
                ResourceKind::Texture,
                format!("`{}`: {message}", self.label),
            ))
        };
        if self.width == 0 || self.height == 0 {
            return fail(format!("zero extent {}x{}", self.width, self.height));
        }
        if self.kind.is_array() {
            if self.layers == 0 {
                return fail("array texture needs at least one layer".to_string());
            }
        } else if self.layers != 1 {
            return fail(format!("{:?} texture has {} layers", self.kind, self.layers));
        }
        if self.kind == TextureKind::D3 {
            if self.depth == 0 {
                return fail("3D texture has zero depth".to_string());
            }
        } else if self.depth != 1 {
            return fail(format!("{:?} texture has depth {}", self.kind, self.depth));
        }
        if self.kind.is_multisample() {
            if self.samples == 0 {
                return fail("multisample texture has zero samples".to_string());
            }
            if self.levels != 1 {
                return fail(format!("multisample texture has {} levels", self.levels));
            }
        } else {
            if self.samples != 1 {
                return fail(format!(
                    "{:?} texture has {} samples",
                    self.kind, self.samples
                ));
            }
            if !self.fixed_sample_locations {
                return fail("variable sample locations need a multisample texture".to_string());
            }
        }
        if matches!(self.kind, TextureKind::Cube | TextureKind::CubeArray)
            && self.width != self.height
        {
            return fail(format!(
                "cube faces must be square, got {}x{}",
                self.width, self.height
            ));
        }
        let mip_extent = if self.kind == TextureKind::D3 {
            max_mip_levels(self.width.max(self.depth), self.height)
        } else {
            max_mip_levels(self.width, self.height)
        };
        if self.levels == 0 || self.levels > mip_extent {
            return fail(format!(
                "{} levels is outside 1..={mip_extent}",
                self.levels
            ));
        }
        if self.render_target && !self.format.is_renderable() {
            return fail(format!("{:?} can't be rendered to", self.format));
        }
        Ok(())
    }

    /// Number of array images, counting cube faces.
    pub fn array_images(&self) -> u32 {
        self.layers * self.kind.faces()
    }
}

/// Builder for [`TextureDescriptor`].
///
/// ```
/// use frames_and_samples::bindings::texture_builder::{TextureBuilder, TextureKind};
/// use frames_and_samples::pixel_formats::PixelFormat;
///
/// let desc = TextureBuilder::new("msaa", 160, 160, PixelFormat::RGBA8UNorm)
///     .kind(TextureKind::D2Multisample)
///     .samples(4)
///     .render_target()
///     .build()
///     .unwrap();
/// assert_eq!(desc.levels, 1);
/// ```
#[derive(Debug, Clone)]
pub struct TextureBuilder {
    descriptor: TextureDescriptor,
}

impl TextureBuilder {
    /// A single-level, single-sample 2D texture.
    pub fn new(label: &str, width: u32, height: u32, format: PixelFormat) -> Self {
        TextureBuilder {
            descriptor: TextureDescriptor {
                label: label.to_string(),
                kind: TextureKind::D2,
                format,
                width,
                height,
                depth: 1,
                layers: 1,
                levels: 1,
                samples: 1,
                fixed_sample_locations: true,
                render_target: false,
            },
        }
    }

    pub fn kind(mut self, kind: TextureKind) -> Self {
        self.descriptor.kind = kind;
        self
    }

    pub fn levels(mut self, levels: u32) -> Self {
        self.descriptor.levels = levels;
        self
    }

    pub fn samples(mut self, samples: u32) -> Self {
        self.descriptor.samples = samples;
        self
    }

    pub fn layers(mut self, layers: u32) -> Self {
        self.descriptor.layers = layers;
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.descriptor.depth = depth;
        self
    }

    pub fn fixed_sample_locations(mut self, fixed: bool) -> Self {
        self.descriptor.fixed_sample_locations = fixed;
        self
    }

    pub fn render_target(mut self) -> Self {
        self.descriptor.render_target = true;
        self
    }

    /// Validates and returns the descriptor.
    pub fn build(self) -> Result<TextureDescriptor, Error> {
        self.descriptor.validate()?;
        Ok(self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(label: &str) -> TextureBuilder {
        TextureBuilder::new(label, 64, 64, PixelFormat::RGBA8UNorm)
    }

    #[test]
    fn plain_2d_is_valid() {
        let desc = rgba("plain").levels(7).build().unwrap();
        assert_eq!(desc.array_images(), 1);
    }

    #[test]
    fn layers_only_for_arrays() {
        assert!(rgba("a").layers(2).build().is_err());
        assert!(rgba("a").kind(TextureKind::D2Array).layers(2).build().is_ok());
        assert!(rgba("a").kind(TextureKind::D2Array).layers(0).build().is_err());
        let cubes = rgba("c").kind(TextureKind::CubeArray).layers(2).build().unwrap();
        assert_eq!(cubes.array_images(), 12);
    }

    #[test]
    fn depth_only_for_3d() {
        assert!(rgba("d").depth(4).build().is_err());
        assert!(rgba("d").kind(TextureKind::D3).depth(4).build().is_ok());
        assert!(rgba("d").kind(TextureKind::D3).depth(0).build().is_err());
    }

    #[test]
    fn samples_only_for_multisample() {
        assert!(rgba("s").samples(4).build().is_err());
        assert!(rgba("s").kind(TextureKind::D2Multisample).samples(0).build().is_err());
        assert!(
            rgba("s")
                .kind(TextureKind::D2Multisample)
                .samples(4)
                .levels(2)
                .build()
                .is_err()
        );
        assert!(
            rgba("s")
                .kind(TextureKind::D2MultisampleArray)
                .samples(2)
                .layers(3)
                .fixed_sample_locations(false)
                .build()
                .is_ok()
        );
        assert!(rgba("s").fixed_sample_locations(false).build().is_err());
    }

    #[test]
    fn level_limits() {
        assert!(rgba("l").levels(0).build().is_err());
        assert!(rgba("l").levels(8).build().is_err());
        assert!(TextureBuilder::new("z", 0, 4, PixelFormat::R8UNorm).build().is_err());
    }

    #[test]
    fn cubes_are_square() {
        let err = TextureBuilder::new("c", 64, 32, PixelFormat::RGBA8UNorm)
            .kind(TextureKind::Cube)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ResourceCreation {
                kind: ResourceKind::Texture,
                ..
            }
        ));
    }

    #[test]
    fn compressed_targets_rejected() {
        assert!(
            TextureBuilder::new("bc", 64, 64, PixelFormat::BC1RGBAUnorm)
                .render_target()
                .build()
                .is_err()
        );
    }
}
