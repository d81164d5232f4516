// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::mpsc;

use wgpu::{Extent3d, TexelCopyBufferInfo, TexelCopyBufferLayout, TexelCopyTextureInfo};

use crate::bittricks::align_up;
use crate::images::render_pass::Rect;
use crate::imp::Error;
use crate::pixel_formats::PixelFormat;

/// Copies `rect` of one level to the CPU and blocks until it arrives.
///
/// Returns tightly packed rows in the texture's own format.
pub(super) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    level: u32,
    format: PixelFormat,
    rect: Rect,
) -> Result<Vec<u8>, Error> {
    if rect.width == 0 || rect.height == 0 {
        return Ok(Vec::new());
    }
    let row = format.bytes_per_row(rect.width) as usize;
    let padded = align_up(row as u64, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64);
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: padded * rect.height as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback"),
    });
    encoder.copy_texture_to_buffer(
        TexelCopyTextureInfo {
            texture,
            mip_level: level,
            origin: wgpu::Origin3d {
                x: rect.x,
                y: rect.y,
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        TexelCopyBufferInfo {
            buffer: &staging,
            layout: TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded as u32),
                rows_per_image: Some(rect.height),
            },
        },
        Extent3d {
            width: rect.width,
            height: rect.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| Error::Validation(e.to_string()))?;
    receiver
        .recv()
        .map_err(|_| Error::Validation("readback buffer was never mapped".to_string()))?
        .map_err(|e| Error::Validation(e.to_string()))?;
    let mut out = Vec::with_capacity(row * rect.height as usize);
    {
        let mapped = slice.get_mapped_range();
        for padded_row in mapped.chunks(padded as usize) {
            out.extend_from_slice(&padded_row[..row]);
        }
    }
    staging.unmap();
    Ok(out)
}
