// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! PNG texture loading and screenshot writing.
use std::io::Cursor;
use std::path::Path;

use png::{BitDepth, ColorType, Transformations};

use crate::bindings::texture_source::{MipLevel, TextureSource};
use crate::load::{LoadError, read_nonempty};
use crate::pixel_formats::PixelFormat;

/// Loads a PNG file as a single-level RGBA8 texture source.
///
/// Palette, grayscale and RGB images are expanded to RGBA; 16-bit channels are
/// stripped to 8 bits.  When `srgb` is set the source is tagged
/// [`PixelFormat::RGBA8UnormSRGB`].
pub fn load_png(path: &Path, srgb: bool) -> Result<TextureSource, LoadError> {
    let data = read_nonempty(path)?;
    let mut decoder = png::Decoder::new(Cursor::new(&data));
    decoder.set_transformations(Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let (width, height) = {
        let info = reader.info();
        (info.width, info.height)
    };
    //4 channels at 8 bits is the largest output after normalization
    let mut buf = vec![0u8; width as usize * height as usize * 4];
    let frame = reader.next_frame(&mut buf)?;
    if frame.bit_depth != BitDepth::Eight {
        return Err(LoadError::UnsupportedFormat(format!(
            "{} has bit depth {:?}",
            path.display(),
            frame.bit_depth
        )));
    }
    let pixels = width as usize * height as usize;
    let rgba: Vec<u8> = match frame.color_type {
        ColorType::Rgba => {
            buf.truncate(pixels * 4);
            buf
        }
        ColorType::Rgb => buf[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        ColorType::Grayscale => buf[..pixels]
            .iter()
            .flat_map(|g| [*g, *g, *g, 255])
            .collect(),
        ColorType::GrayscaleAlpha => buf[..pixels * 2]
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        other => {
            return Err(LoadError::UnsupportedFormat(format!(
                "{} has color type {other:?}",
                path.display()
            )));
        }
    };
    logwise::info_sync!(
        "Loaded png {path} {w}x{h}",
        path = logwise::privacy::LogIt(&path.display().to_string()),
        w = width,
        h = height
    );
    let format = if srgb {
        PixelFormat::RGBA8UnormSRGB
    } else {
        PixelFormat::RGBA8UNorm
    };
    TextureSource::new(
        format,
        vec![MipLevel {
            width,
            height,
            data: rgba,
        }],
    )
}

/// Writes RGBA8 pixels, row-major from the top-left, to a PNG file.
pub fn write_png(path: &Path, width: u32, height: u32, pixels: &[[u8; 4]]) -> Result<(), LoadError> {
    if pixels.len() != width as usize * height as usize {
        return Err(LoadError::Malformed(format!(
            "{} pixels for a {width}x{height} image",
            pixels.len()
        )));
    }
    let file = std::fs::File::create(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(pixels.as_flattened())?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_survives_write_and_load() {
        let path = std::env::temp_dir().join("frames_and_samples_png_support.png");
        let pixels = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 128], [9, 9, 9, 9]];
        write_png(&path, 2, 2, &pixels).unwrap();
        let source = load_png(&path, false).unwrap();
        assert_eq!(source.format(), PixelFormat::RGBA8UNorm);
        assert_eq!((source.width(), source.height()), (2, 2));
        assert_eq!(source.level(0).unwrap().data, pixels.as_flattened());
        let srgb = load_png(&path, true).unwrap();
        assert_eq!(srgb.format(), PixelFormat::RGBA8UnormSRGB);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let path = std::env::temp_dir().join("frames_and_samples_not_a.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_png(&path, false).unwrap_err();
        assert!(matches!(err, LoadError::PngDecode(_)));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn pixel_count_mismatch_is_rejected() {
        let path = std::env::temp_dir().join("frames_and_samples_never_written.png");
        assert!(write_png(&path, 3, 3, &[[0; 4]; 2]).is_err());
    }
}
