// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! CPU-side images for the software driver.

An [`Image`] is one mip level of a texture (or the default surface) stored in its
[`PixelFormat`]'s byte layout, with every pixel holding `samples` texels side by side.

# Coordinate Systems

- Origin (0, 0) is at the top-left
- X increases to the right
- Y increases downward
- Normalized coordinates map [0, 1] to the full image

# Example

```
use frames_and_samples::bindings::software::texture::{Image, Texel};
use frames_and_samples::pixel_formats::PixelFormat;

let mut image = Image::new(PixelFormat::RGBA8UNorm, 4, 4, 1);
image.write(Texel { x: 1, y: 2 }, 0, [1.0, 0.0, 0.0, 1.0]);
assert_eq!(image.read_rgba8(Texel { x: 1, y: 2 }, 0), Some([255, 0, 0, 255]));
```
*/

use crate::bindings::sampler::{AddressMode, Filter, SamplerDescriptor};
use crate::pixel_formats::PixelFormat;

/// Integer image coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Texel {
    pub x: u32,
    pub y: u32,
}

impl Texel {
    pub const ZERO: Texel = Texel { x: 0, y: 0 };
}

/// Normalized coordinates, not necessarily inside [0, 1].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Normalized {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    format: PixelFormat,
    width: u32,
    height: u32,
    samples: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("samples", &self.samples)
            .finish()
    }
}

impl Image {
    /// A zero-filled image.
    pub fn new(format: PixelFormat, width: u32, height: u32, samples: u32) -> Self {
        let size = format.level_size(width, height) as usize * samples.max(1) as usize;
        Image {
            format,
            width,
            height,
            samples: samples.max(1),
            data: vec![0; size],
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Replaces the contents.  `data` must be exactly as long as the image.
    pub fn replace(&mut self, data: &[u8]) -> bool {
        if data.len() != self.data.len() {
            return false;
        }
        self.data.copy_from_slice(data);
        true
    }

    fn offset(&self, texel: Texel, sample: u32) -> Option<usize> {
        if self.format.is_compressed()
            || texel.x >= self.width
            || texel.y >= self.height
            || sample >= self.samples
        {
            return None;
        }
        let pixel = texel.y as usize * self.width as usize + texel.x as usize;
        let stride = self.format.bytes_per_block() as usize;
        Some((pixel * self.samples as usize + sample as usize) * stride)
    }

    /// Linear RGBA of one sample, or `None` outside the image or for block formats.
    pub fn read(&self, texel: Texel, sample: u32) -> Option<[f32; 4]> {
        let offset = self.offset(texel, sample)?;
        self.format.decode_texel(&self.data[offset..])
    }

    /// One sample converted to RGBA8.
    pub fn read_rgba8(&self, texel: Texel, sample: u32) -> Option<[u8; 4]> {
        let mut rgba = self.read(texel, sample)?;
        if self.format.is_srgb() {
            for c in &mut rgba[..3] {
                *c = crate::pixel_formats::linear_to_srgb(*c);
            }
        }
        Some(rgba.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
    }

    /// Stores linear RGBA into one sample.  Writes outside the image are dropped.
    pub fn write(&mut self, texel: Texel, sample: u32, rgba: [f32; 4]) {
        let Some(offset) = self.offset(texel, sample) else {
            return;
        };
        if let Some(encoded) = self.format.encode_texel(rgba) {
            self.data[offset..offset + encoded.len()].copy_from_slice(&encoded);
        }
    }

    /// Fills every sample of every pixel in `[x0, x1) x [y0, y1)`.
    pub fn fill(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, rgba: [f32; 4]) {
        let Some(encoded) = self.format.encode_texel(rgba) else {
            return;
        };
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                for sample in 0..self.samples {
                    if let Some(offset) = self.offset(Texel { x, y }, sample) {
                        self.data[offset..offset + encoded.len()].copy_from_slice(&encoded);
                    }
                }
            }
        }
    }

    /// Average of all samples of one pixel.
    pub fn resolve_pixel(&self, texel: Texel) -> Option<[f32; 4]> {
        let mut sum = [0.0f32; 4];
        for sample in 0..self.samples {
            let rgba = self.read(texel, sample)?;
            for (s, c) in sum.iter_mut().zip(rgba) {
                *s += c;
            }
        }
        Some(sum.map(|s| s / self.samples as f32))
    }

    fn address(coordinate: i64, extent: u32, mode: AddressMode) -> Option<u32> {
        let extent = extent as i64;
        let wrapped = match mode {
            AddressMode::ClampToEdge => coordinate.clamp(0, extent - 1),
            AddressMode::Repeat => coordinate.rem_euclid(extent),
            AddressMode::MirrorRepeat => {
                let period = coordinate.rem_euclid(extent * 2);
                if period < extent {
                    period
                } else {
                    extent * 2 - 1 - period
                }
            }
            AddressMode::ClampToBorder => {
                if coordinate < 0 || coordinate >= extent {
                    return None;
                }
                coordinate
            }
        };
        Some(wrapped as u32)
    }

    fn fetch(&self, x: i64, y: i64, sampler: &SamplerDescriptor) -> Option<[f32; 4]> {
        match (
            Self::address(x, self.width, sampler.address_mode),
            Self::address(y, self.height, sampler.address_mode),
        ) {
            (Some(x), Some(y)) => self.read(Texel { x, y }, 0),
            _ => Some(sampler.border_color.rgba()),
        }
    }

    /// Filters sample 0 at `uv` with the sampler's magnification filter.
    ///
    /// Returns `None` for block-compressed images.
    pub fn sample(&self, uv: Normalized, sampler: &SamplerDescriptor) -> Option<[f32; 4]> {
        let u = uv.x * self.width as f32;
        let v = uv.y * self.height as f32;
        match sampler.mag_filter {
            Filter::Nearest => self.fetch(u.floor() as i64, v.floor() as i64, sampler),
            Filter::Linear => {
                let (u, v) = (u - 0.5, v - 0.5);
                let (x, y) = (u.floor(), v.floor());
                let base_x = u - x;
                let base_y = v - y;
                let (x, y) = (x as i64, y as i64);
                let w11 = (1.0 - base_x) * (1.0 - base_y);
                let w12 = (1.0 - base_x) * base_y;
                let w21 = base_x * (1.0 - base_y);
                let w22 = base_x * base_y;
                let mut out = [0.0; 4];
                for (w, texel) in [
                    (w11, self.fetch(x, y, sampler)?),
                    (w12, self.fetch(x, y + 1, sampler)?),
                    (w21, self.fetch(x + 1, y, sampler)?),
                    (w22, self.fetch(x + 1, y + 1, sampler)?),
                ] {
                    for (o, c) in out.iter_mut().zip(texel) {
                        *o += w * c;
                    }
                }
                Some(out)
            }
        }
    }
}
