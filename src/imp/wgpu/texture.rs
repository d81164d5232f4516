// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use wgpu::{Extent3d, TexelCopyBufferLayout, TexelCopyTextureInfo};

use crate::bindings::handle::Handle;
use crate::bindings::texture_builder::{TextureDescriptor, TextureKind};
use crate::bittricks::mip_extent;
use crate::imp::{Error, LevelUpload};

#[derive(Debug)]
pub(super) struct Texture {
    pub(super) texture: wgpu::Texture,
    pub(super) descriptor: TextureDescriptor,
}

/// Usage flags for a texture described by `descriptor`.
pub(super) fn wgpu_usage(descriptor: &TextureDescriptor) -> wgpu::TextureUsages {
    if descriptor.kind.is_multisample() {
        //multisampled textures are only rendered to and resolved
        return wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
    }
    let mut usage = wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::COPY_DST
        | wgpu::TextureUsages::COPY_SRC;
    if descriptor.render_target {
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    usage
}

impl Texture {
    /// Kinds other than 2D and 2D multisample are refused before reaching wgpu.
    pub(super) fn new(device: &wgpu::Device, descriptor: &TextureDescriptor) -> Result<Texture, Error> {
        if !matches!(
            descriptor.kind,
            TextureKind::D2 | TextureKind::D2Multisample
        ) {
            return Err(Error::Unsupported(format!(
                "{:?} textures in the wgpu driver",
                descriptor.kind
            )));
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&descriptor.label),
            size: Extent3d {
                width: descriptor.width,
                height: descriptor.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: descriptor.levels,
            sample_count: descriptor.samples,
            dimension: wgpu::TextureDimension::D2,
            format: descriptor.format.wgpu_format(),
            usage: wgpu_usage(descriptor),
            view_formats: &[],
        });
        Ok(Texture {
            texture,
            descriptor: descriptor.clone(),
        })
    }

    /// Writes one level through the queue after checking it against the descriptor.
    pub(super) fn upload(
        &self,
        handle: Handle,
        queue: &wgpu::Queue,
        upload: &LevelUpload<'_>,
    ) -> Result<(), Error> {
        let format = self.descriptor.format;
        let compressed = matches!(upload, LevelUpload::Compressed { .. });
        if compressed != format.is_compressed() {
            return Err(Error::Validation(format!(
                "{} upload into {format:?} {handle}",
                if compressed { "compressed" } else { "pixel" }
            )));
        }
        if self.descriptor.kind.is_multisample() {
            return Err(Error::Validation(format!(
                "{handle} is multisampled and can't be uploaded to"
            )));
        }
        let level = upload.level();
        if level >= self.descriptor.levels {
            return Err(Error::Validation(format!("{handle} has no level {level}")));
        }
        let expected = (
            mip_extent(self.descriptor.width, level),
            mip_extent(self.descriptor.height, level),
        );
        let (width, height) = upload.extent();
        if (width, height) != expected {
            return Err(Error::Validation(format!(
                "level {level} of {handle} is {}x{}, not {width}x{height}",
                expected.0, expected.1
            )));
        }
        let data = upload.data();
        let size = format.level_size(width, height);
        if data.len() as u64 != size {
            return Err(Error::OutOfBounds {
                handle,
                offset: 0,
                len: data.len() as u64,
                size,
            });
        }
        //copies of block formats cover whole blocks
        let (block_width, block_height) = format.block_dimensions();
        queue.write_texture(
            TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(format.bytes_per_row(width) as u32),
                rows_per_image: Some(format.block_rows(height)),
            },
            Extent3d {
                width: width.div_ceil(block_width) * block_width,
                height: height.div_ceil(block_height) * block_height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// A view of one level, for rendering into.
    pub(super) fn level_view(&self, level: u32) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            base_mip_level: level,
            mip_level_count: Some(1),
            ..Default::default()
        })
    }

    /// A view of every level, for sampling.
    pub(super) fn sampled_view(&self) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}
