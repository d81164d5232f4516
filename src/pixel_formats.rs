// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Pixel format descriptors for texture sources and render targets.
//!
//! Texture sources arrive at runtime from files or from literal sample data, so formats
//! are described by a runtime enum rather than by marker types.  Each format records:
//!
//! - whether it is block compressed, and the block footprint and byte size
//! - the channel layout and per-channel type used when transferring texels
//! - the swizzle from stored channels to sampled RGBA
//! - whether the stored values are sRGB encoded
//!
//! # Available formats
//!
//! ## Uncompressed
//! - [`PixelFormat::RGBA8UNorm`], [`PixelFormat::RGBA8UnormSRGB`]
//! - [`PixelFormat::BGRA8UNorm`]
//! - [`PixelFormat::R8UNorm`]
//! - [`PixelFormat::RGBA16Float`]
//!
//! ## Block compressed (4x4 blocks)
//! - [`PixelFormat::BC1RGBAUnorm`], [`PixelFormat::BC1RGBAUnormSRGB`] (8 bytes per block)
//! - [`PixelFormat::BC2RGBAUnorm`], [`PixelFormat::BC2RGBAUnormSRGB`] (16 bytes per block)
//! - [`PixelFormat::BC3RGBAUnorm`], [`PixelFormat::BC3RGBAUnormSRGB`] (16 bytes per block)
//!
//! # Examples
//!
//! ```
//! use frames_and_samples::pixel_formats::PixelFormat;
//!
//! assert_eq!(PixelFormat::RGBA8UNorm.level_size(4, 4), 64);
//! // a 2x2 level still occupies one whole 4x4 block
//! assert_eq!(PixelFormat::BC1RGBAUnorm.level_size(2, 2), 8);
//! ```

pub(crate) mod png_support;

pub use half::f16;
pub use png_support::{load_png, write_png};

/// Storage format of a texture or render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    RGBA8UNorm,
    RGBA8UnormSRGB,
    BGRA8UNorm,
    R8UNorm,
    RGBA16Float,
    BC1RGBAUnorm,
    BC1RGBAUnormSRGB,
    BC2RGBAUnorm,
    BC2RGBAUnormSRGB,
    BC3RGBAUnorm,
    BC3RGBAUnormSRGB,
}

/// Per-channel storage type used when transferring uncompressed texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    UNorm8,
    Float16,
    /// Texels are stored as opaque compressed blocks.
    Block,
}

/// Channel order of the bytes handed to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalLayout {
    R,
    RGBA,
    BGRA,
    /// Compressed blocks; no per-texel layout.
    Compressed,
}

/// Source of one sampled output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swizzle {
    /// Stored channel at this index.
    Channel(u8),
    Zero,
    One,
}

/// How a [`PixelFormat`] is stored, transferred and sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub internal: PixelFormat,
    pub external: ExternalLayout,
    pub channel_type: ChannelType,
    /// Maps sampled (r, g, b, a) to stored channels.
    pub swizzle: [Swizzle; 4],
}

const IDENTITY: [Swizzle; 4] = [
    Swizzle::Channel(0),
    Swizzle::Channel(1),
    Swizzle::Channel(2),
    Swizzle::Channel(3),
];

impl PixelFormat {
    pub const fn is_compressed(self) -> bool {
        matches!(
            self,
            PixelFormat::BC1RGBAUnorm
                | PixelFormat::BC1RGBAUnormSRGB
                | PixelFormat::BC2RGBAUnorm
                | PixelFormat::BC2RGBAUnormSRGB
                | PixelFormat::BC3RGBAUnorm
                | PixelFormat::BC3RGBAUnormSRGB
        )
    }

    pub const fn is_srgb(self) -> bool {
        matches!(
            self,
            PixelFormat::RGBA8UnormSRGB
                | PixelFormat::BC1RGBAUnormSRGB
                | PixelFormat::BC2RGBAUnormSRGB
                | PixelFormat::BC3RGBAUnormSRGB
        )
    }

    /// Whether the format can be a color attachment.
    pub const fn is_renderable(self) -> bool {
        !self.is_compressed()
    }

    /// Texel footprint of one block.  Uncompressed formats use 1x1 blocks.
    pub const fn block_dimensions(self) -> (u32, u32) {
        if self.is_compressed() { (4, 4) } else { (1, 1) }
    }

    /// Bytes occupied by one block (one texel for uncompressed formats).
    pub const fn bytes_per_block(self) -> u32 {
        match self {
            PixelFormat::RGBA8UNorm | PixelFormat::RGBA8UnormSRGB | PixelFormat::BGRA8UNorm => 4,
            PixelFormat::R8UNorm => 1,
            PixelFormat::RGBA16Float => 8,
            PixelFormat::BC1RGBAUnorm | PixelFormat::BC1RGBAUnormSRGB => 8,
            PixelFormat::BC2RGBAUnorm
            | PixelFormat::BC2RGBAUnormSRGB
            | PixelFormat::BC3RGBAUnorm
            | PixelFormat::BC3RGBAUnormSRGB => 16,
        }
    }

    /// Bytes in one row of blocks for an image `width` texels wide.
    pub const fn bytes_per_row(self, width: u32) -> u64 {
        let (bw, _) = self.block_dimensions();
        width.div_ceil(bw) as u64 * self.bytes_per_block() as u64
    }

    /// Number of block rows for an image `height` texels tall.
    pub const fn block_rows(self, height: u32) -> u32 {
        let (_, bh) = self.block_dimensions();
        height.div_ceil(bh)
    }

    /// Byte size of one `width` x `height` image, block-rounded for compressed formats.
    pub const fn level_size(self, width: u32, height: u32) -> u64 {
        self.bytes_per_row(width) * self.block_rows(height) as u64
    }

    pub const fn descriptor(self) -> FormatDescriptor {
        let (external, channel_type, swizzle) = match self {
            PixelFormat::RGBA8UNorm | PixelFormat::RGBA8UnormSRGB => {
                (ExternalLayout::RGBA, ChannelType::UNorm8, IDENTITY)
            }
            PixelFormat::BGRA8UNorm => (
                ExternalLayout::BGRA,
                ChannelType::UNorm8,
                [
                    Swizzle::Channel(2),
                    Swizzle::Channel(1),
                    Swizzle::Channel(0),
                    Swizzle::Channel(3),
                ],
            ),
            PixelFormat::R8UNorm => (
                ExternalLayout::R,
                ChannelType::UNorm8,
                [Swizzle::Channel(0), Swizzle::Zero, Swizzle::Zero, Swizzle::One],
            ),
            PixelFormat::RGBA16Float => (ExternalLayout::RGBA, ChannelType::Float16, IDENTITY),
            _ => (ExternalLayout::Compressed, ChannelType::Block, IDENTITY),
        };
        FormatDescriptor {
            internal: self,
            external,
            channel_type,
            swizzle,
        }
    }

    /// Decodes one stored texel to linear RGBA.
    ///
    /// Returns `None` for compressed formats or a short slice.
    pub fn decode_texel(self, bytes: &[u8]) -> Option<[f32; 4]> {
        let descriptor = self.descriptor();
        let stored: [f32; 4] = match descriptor.channel_type {
            ChannelType::Block => return None,
            ChannelType::UNorm8 => {
                let n = self.bytes_per_block() as usize;
                let bytes = bytes.get(..n)?;
                let mut out = [0.0; 4];
                for (o, b) in out.iter_mut().zip(bytes) {
                    *o = *b as f32 / 255.0;
                }
                out
            }
            ChannelType::Float16 => {
                let bytes = bytes.get(..8)?;
                let mut out = [0.0; 4];
                for (o, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
                    *o = f16::from_le_bytes([pair[0], pair[1]]).to_f32();
                }
                out
            }
        };
        let mut sampled = [0.0; 4];
        for (s, sw) in sampled.iter_mut().zip(descriptor.swizzle) {
            *s = match sw {
                Swizzle::Channel(c) => stored[c as usize],
                Swizzle::Zero => 0.0,
                Swizzle::One => 1.0,
            };
        }
        if self.is_srgb() {
            for c in &mut sampled[..3] {
                *c = srgb_to_linear(*c);
            }
        }
        Some(sampled)
    }

    /// Encodes linear RGBA into the stored representation.
    ///
    /// Returns `None` for compressed formats.
    pub fn encode_texel(self, rgba: [f32; 4]) -> Option<Vec<u8>> {
        let mut rgba = rgba;
        if self.is_srgb() {
            for c in &mut rgba[..3] {
                *c = linear_to_srgb(*c);
            }
        }
        let unorm = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        match self {
            PixelFormat::RGBA8UNorm | PixelFormat::RGBA8UnormSRGB => {
                Some(rgba.iter().map(|v| unorm(*v)).collect())
            }
            PixelFormat::BGRA8UNorm => Some(vec![
                unorm(rgba[2]),
                unorm(rgba[1]),
                unorm(rgba[0]),
                unorm(rgba[3]),
            ]),
            PixelFormat::R8UNorm => Some(vec![unorm(rgba[0])]),
            PixelFormat::RGBA16Float => Some(
                rgba.iter()
                    .flat_map(|v| f16::from_f32(*v).to_le_bytes())
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// sRGB transfer function, linear to gamma encoded.
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB transfer function, gamma encoded to linear.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_sizes_round_to_blocks() {
        assert_eq!(PixelFormat::BC1RGBAUnorm.level_size(256, 256), 64 * 64 * 8);
        assert_eq!(PixelFormat::BC3RGBAUnorm.level_size(1, 1), 16);
        assert_eq!(PixelFormat::BC2RGBAUnormSRGB.level_size(5, 3), 2 * 16);
        assert_eq!(PixelFormat::BC1RGBAUnorm.bytes_per_row(8), 16);
    }

    #[test]
    fn uncompressed_sizes() {
        assert_eq!(PixelFormat::RGBA16Float.level_size(3, 2), 48);
        assert_eq!(PixelFormat::R8UNorm.bytes_per_row(7), 7);
        assert!(!PixelFormat::R8UNorm.is_compressed());
    }

    #[test]
    fn bgra_swizzles_to_rgba() {
        let texel = PixelFormat::BGRA8UNorm.decode_texel(&[0, 0, 255, 255]).unwrap();
        assert_eq!(texel, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            PixelFormat::BGRA8UNorm.encode_texel(texel).unwrap(),
            vec![0, 0, 255, 255]
        );
    }

    #[test]
    fn red_only_fills_alpha() {
        let texel = PixelFormat::R8UNorm.decode_texel(&[255]).unwrap();
        assert_eq!(texel, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn srgb_texels_survive_decode_encode() {
        for v in [0u8, 1, 54, 128, 200, 255] {
            let linear = PixelFormat::RGBA8UnormSRGB
                .decode_texel(&[v, v, v, 255])
                .unwrap();
            let back = PixelFormat::RGBA8UnormSRGB.encode_texel(linear).unwrap();
            assert_eq!(back, vec![v, v, v, 255]);
        }
    }

    #[test]
    fn half_float_texels() {
        let bytes = PixelFormat::RGBA16Float
            .encode_texel([0.5, 0.25, 1.0, 1.0])
            .unwrap();
        assert_eq!(bytes.len(), 8);
        let texel = PixelFormat::RGBA16Float.decode_texel(&bytes).unwrap();
        assert_eq!(texel, [0.5, 0.25, 1.0, 1.0]);
    }

    #[test]
    fn compressed_texels_are_opaque() {
        assert!(PixelFormat::BC1RGBAUnorm.decode_texel(&[0; 8]).is_none());
        assert_eq!(
            PixelFormat::BC1RGBAUnorm.descriptor().external,
            ExternalLayout::Compressed
        );
    }
}
