// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Decoded mip chains ready for upload.
//!
//! A [`TextureSource`] is what a texture loader produces and what
//! [`crate::images::lifecycle::Lifecycle`] uploads: a base size, a [`PixelFormat`],
//! and one [`MipLevel`] per level.  Construction validates the chain, so an
//! upload never needs to second-guess level sizes.

use crate::bittricks::{max_mip_levels, mip_extent};
use crate::load::LoadError;
use crate::pixel_formats::PixelFormat;

/// One level of a mip chain.
#[derive(Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for MipLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MipLevel")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSource {
    format: PixelFormat,
    levels: Vec<MipLevel>,
}

impl TextureSource {
    /// Builds a source from explicit levels.
    ///
    /// # Errors
    /// [`LoadError::Malformed`] when there are no levels, too many levels, a level's
    /// extent is not `max(1, base >> level)`, or a level's byte size does not match
    /// the format.
    pub fn new(format: PixelFormat, levels: Vec<MipLevel>) -> Result<Self, LoadError> {
        let base = levels
            .first()
            .ok_or_else(|| LoadError::Malformed("texture has no mip levels".to_string()))?;
        let (width, height) = (base.width, base.height);
        if width == 0 || height == 0 {
            return Err(LoadError::Malformed(format!(
                "texture has zero extent {width}x{height}"
            )));
        }
        let limit = max_mip_levels(width, height) as usize;
        if levels.len() > limit {
            return Err(LoadError::Malformed(format!(
                "{} mip levels exceeds the {limit} a {width}x{height} texture can have",
                levels.len()
            )));
        }
        for (index, level) in levels.iter().enumerate() {
            let expected = (
                mip_extent(width, index as u32),
                mip_extent(height, index as u32),
            );
            if (level.width, level.height) != expected {
                return Err(LoadError::Malformed(format!(
                    "mip level {index} is {}x{}, expected {}x{}",
                    level.width, level.height, expected.0, expected.1
                )));
            }
            let size = format.level_size(level.width, level.height);
            if level.data.len() as u64 != size {
                return Err(LoadError::Malformed(format!(
                    "mip level {index} has {} bytes, expected {size} for {format:?}",
                    level.data.len()
                )));
            }
        }
        Ok(TextureSource { format, levels })
    }

    /// A single-level RGBA8 source.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, LoadError> {
        Self::new(
            PixelFormat::RGBA8UNorm,
            vec![MipLevel {
                width,
                height,
                data,
            }],
        )
    }

    /// A 2x2 RGBA8 checkerboard: texels where `x + y` is even are `a`, the rest `b`.
    pub fn checkerboard(a: [u8; 4], b: [u8; 4]) -> Self {
        let data = [a, b, b, a].concat();
        TextureSource {
            format: PixelFormat::RGBA8UNorm,
            levels: vec![MipLevel {
                width: 2,
                height: 2,
                data,
            }],
        }
    }

    /// Appends box-filtered levels down to 1x1.
    ///
    /// Only 8-bit uncompressed formats are filtered; others are returned unchanged.
    pub fn with_generated_mips(mut self) -> Self {
        let bpp = self.format.bytes_per_block() as usize;
        if self.format.is_compressed() || matches!(self.format, PixelFormat::RGBA16Float) {
            logwise::warn_sync!(
                "Not generating mips for {format}",
                format = logwise::privacy::LogIt(&self.format)
            );
            return self;
        }
        self.levels.truncate(1);
        let limit = max_mip_levels(self.width(), self.height());
        for level in 1..limit {
            let prev = &self.levels[level as usize - 1];
            let width = mip_extent(self.width(), level);
            let height = mip_extent(self.height(), level);
            let mut data = Vec::with_capacity(width as usize * height as usize * bpp);
            for y in 0..height {
                for x in 0..width {
                    for channel in 0..bpp {
                        let mut sum = 0u32;
                        let mut count = 0u32;
                        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                            let sx = (x * 2 + dx).min(prev.width - 1);
                            let sy = (y * 2 + dy).min(prev.height - 1);
                            let offset = (sy as usize * prev.width as usize + sx as usize) * bpp;
                            sum += prev.data[offset + channel] as u32;
                            count += 1;
                        }
                        data.push(((sum + count / 2) / count) as u8);
                    }
                }
            }
            self.levels.push(MipLevel {
                width,
                height,
                data,
            });
        }
        self
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    /// Number of mip levels.
    pub fn levels(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn level(&self, index: u32) -> Option<&MipLevel> {
        self.levels.get(index as usize)
    }

    pub fn iter_levels(&self) -> impl Iterator<Item = &MipLevel> {
        self.levels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(width: u32, height: u32, format: PixelFormat) -> MipLevel {
        MipLevel {
            width,
            height,
            data: vec![0; format.level_size(width, height) as usize],
        }
    }

    #[test]
    fn compressed_chain_validates() {
        let f = PixelFormat::BC1RGBAUnorm;
        let levels = (0..9).map(|l| level(256 >> l, 256 >> l, f)).collect();
        let source = TextureSource::new(f, levels).unwrap();
        assert_eq!(source.levels(), 9);
        assert_eq!(source.level(8).unwrap().data.len(), 8);
    }

    #[test]
    fn wrong_extent_is_rejected() {
        let f = PixelFormat::RGBA8UNorm;
        let err = TextureSource::new(f, vec![level(4, 4, f), level(3, 2, f)]).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn wrong_size_is_rejected() {
        let err = TextureSource::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn too_many_levels_is_rejected() {
        let f = PixelFormat::R8UNorm;
        let err =
            TextureSource::new(f, vec![level(2, 2, f), level(1, 1, f), level(1, 1, f)])
                .unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn empty_is_rejected() {
        assert!(TextureSource::new(PixelFormat::RGBA8UNorm, vec![]).is_err());
    }

    #[test]
    fn checkerboard_layout() {
        let a = [255, 0, 0, 255];
        let b = [0, 0, 255, 255];
        let source = TextureSource::checkerboard(a, b);
        let data = &source.level(0).unwrap().data;
        assert_eq!(&data[0..4], &a);
        assert_eq!(&data[4..8], &b);
        assert_eq!(&data[8..12], &b);
        assert_eq!(&data[12..16], &a);
    }

    #[test]
    fn generated_mips_average() {
        let source = TextureSource::checkerboard([255, 255, 255, 255], [0, 0, 0, 255])
            .with_generated_mips();
        assert_eq!(source.levels(), 2);
        let top = source.level(1).unwrap();
        assert_eq!((top.width, top.height), (1, 1));
        assert_eq!(top.data, vec![128, 128, 128, 255]);
    }
}
