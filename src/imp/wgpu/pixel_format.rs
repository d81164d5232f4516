// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::pixel_formats::PixelFormat;

impl PixelFormat {
    pub(crate) const fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::RGBA8UNorm => wgpu::TextureFormat::Rgba8Unorm,
            PixelFormat::RGBA8UnormSRGB => wgpu::TextureFormat::Rgba8UnormSrgb,
            PixelFormat::BGRA8UNorm => wgpu::TextureFormat::Bgra8Unorm,
            PixelFormat::R8UNorm => wgpu::TextureFormat::R8Unorm,
            PixelFormat::RGBA16Float => wgpu::TextureFormat::Rgba16Float,
            PixelFormat::BC1RGBAUnorm => wgpu::TextureFormat::Bc1RgbaUnorm,
            PixelFormat::BC1RGBAUnormSRGB => wgpu::TextureFormat::Bc1RgbaUnormSrgb,
            PixelFormat::BC2RGBAUnorm => wgpu::TextureFormat::Bc2RgbaUnorm,
            PixelFormat::BC2RGBAUnormSRGB => wgpu::TextureFormat::Bc2RgbaUnormSrgb,
            PixelFormat::BC3RGBAUnorm => wgpu::TextureFormat::Bc3RgbaUnorm,
            PixelFormat::BC3RGBAUnormSRGB => wgpu::TextureFormat::Bc3RgbaUnormSrgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_sizes_agree_with_wgpu() {
        for format in [
            PixelFormat::RGBA8UNorm,
            PixelFormat::R8UNorm,
            PixelFormat::RGBA16Float,
            PixelFormat::BC1RGBAUnorm,
            PixelFormat::BC3RGBAUnormSRGB,
        ] {
            let wgpu = format.wgpu_format();
            assert_eq!(wgpu.block_dimensions(), format.block_dimensions());
            assert_eq!(wgpu.block_copy_size(None), Some(format.bytes_per_block()));
            assert_eq!(wgpu.is_srgb(), format.is_srgb());
        }
    }
}
