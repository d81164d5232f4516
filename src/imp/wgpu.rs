// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The wgpu implementation of [`Driver`].

[`WgpuDriver`] renders into an offscreen RGBA8 texture that stands in for the window's
default framebuffer; a host presents it by reading it back.  Every command is encoded
and submitted on its own, so commands take effect in the order they were issued.

Creation calls fail on the spot when wgpu rejects them.  Validation errors raised
while executing commands are queued and drained by [`Driver::take_errors`].
*/

mod bound_device;
mod buffer;
mod entry_point;
mod error;
mod pass;
mod pipeline;
mod pixel_format;
mod readback;
mod sampler;
mod texture;
mod unbound_device;

use std::collections::HashMap;
use std::num::NonZeroU64;

use crate::bindings::framebuffer::{FramebufferDescriptor, FramebufferStatus};
use crate::bindings::handle::{Handle, HandleAllocator, ResourceKind};
use crate::bindings::sampler::{AddressMode, SamplerDescriptor};
use crate::bindings::software::texture::Image;
use crate::bindings::texture_builder::TextureDescriptor;
use crate::bindings::visible_to::BufferUsage;
use crate::images::render_pass::{Command, DrawCommand, FramebufferTarget, Rect};
use crate::images::shader::ShaderStage;
use crate::images::vertex_layout::VertexFormat;
use crate::imp::{
    BufferDescriptor, Driver, Error, FRAGMENT_ENTRY, LevelUpload, Limits, ProgramDescriptor,
    VERTEX_ENTRY, software, wgsl,
};
use crate::pixel_formats::PixelFormat;
use bound_device::BoundDevice;
use buffer::Buffer;
use entry_point::EntryPoint;
use pipeline::{PipelineCache, PipelineKey, Program};
use texture::Texture;
use unbound_device::UnboundDevice;

const SURFACE_FORMAT: PixelFormat = PixelFormat::RGBA8UNorm;

#[derive(Debug)]
struct VertexArray {
    format: VertexFormat,
    attributes: Vec<wgpu::VertexAttribute>,
    vertices: Handle,
    elements: Handle,
}

/// A resolved render target.
struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    level: u32,
    format: PixelFormat,
    samples: u32,
    size: (u32, u32),
}

fn encoder(device: &wgpu::Device, label: &str) -> wgpu::CommandEncoder {
    device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
}

/// A [`Driver`] backed by a wgpu device.
#[derive(Debug)]
pub struct WgpuDriver {
    device: BoundDevice,
    surface: wgpu::Texture,
    surface_size: (u32, u32),
    allocator: HandleAllocator,
    programs: HashMap<Handle, Program>,
    buffers: HashMap<Handle, Buffer>,
    textures: HashMap<Handle, Texture>,
    samplers: HashMap<Handle, wgpu::Sampler>,
    framebuffers: HashMap<Handle, FramebufferDescriptor>,
    vertex_arrays: HashMap<Handle, VertexArray>,
    pipelines: PipelineCache,
    errors: Vec<Error>,
}

impl WgpuDriver {
    /**
    Opens the default adapter and renders into a `width` x `height` offscreen surface.

    Fails with [`Error::NoSuchAdapter`] on machines without a usable GPU or software
    adapter.
    */
    pub async fn headless(width: u32, height: u32) -> Result<WgpuDriver, Error> {
        let entry_point = EntryPoint::new();
        let unbound = UnboundDevice::pick(&entry_point).await?;
        let device = BoundDevice::bind(unbound).await?;
        let surface = error::creating(&device.device, ResourceKind::Texture, || {
            device.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("default surface"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SURFACE_FORMAT.wgpu_format(),
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        })?;
        Ok(WgpuDriver {
            device,
            surface,
            surface_size: (width, height),
            allocator: HandleAllocator::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            framebuffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            pipelines: PipelineCache::default(),
            errors: Vec::new(),
        })
    }

    fn buffer(&self, handle: Handle) -> Result<&Buffer, Error> {
        self.buffers.get(&handle).ok_or(Error::InvalidHandle(handle))
    }

    fn buffer_mut(&mut self, handle: Handle) -> Result<&mut Buffer, Error> {
        self.buffers
            .get_mut(&handle)
            .ok_or(Error::InvalidHandle(handle))
    }

    fn target(&self, target: FramebufferTarget) -> Result<Target, Error> {
        match target {
            FramebufferTarget::Default => Ok(Target {
                texture: self.surface.clone(),
                view: self.surface.create_view(&Default::default()),
                level: 0,
                format: SURFACE_FORMAT,
                samples: 1,
                size: self.surface_size,
            }),
            FramebufferTarget::Offscreen(framebuffer) => {
                let descriptor = self
                    .framebuffers
                    .get(&framebuffer)
                    .ok_or(Error::InvalidHandle(framebuffer))?;
                let status = self.framebuffer_status(framebuffer);
                let attached = descriptor
                    .color_attachment
                    .and_then(|t| self.textures.get(&t));
                match (status, attached) {
                    (FramebufferStatus::Complete, Some(texture)) => Ok(Target {
                        texture: texture.texture.clone(),
                        view: texture.level_view(descriptor.level),
                        level: descriptor.level,
                        format: texture.descriptor.format,
                        samples: texture.descriptor.samples,
                        size: (descriptor.width, descriptor.height),
                    }),
                    (status, _) => Err(Error::FramebufferIncomplete {
                        handle: framebuffer,
                        status,
                    }),
                }
            }
        }
    }

    fn clear(&mut self, target: FramebufferTarget, rgba: [f32; 4], scissor: Option<Rect>) -> Result<(), Error> {
        let target = self.target(target)?;
        let full = Rect::full(target.size);
        let Some(rect) = scissor.map_or(Some(full), |s| s.intersect(&full)) else {
            return Ok(());
        };
        let mut encoder = encoder(&self.device.device, "clear");
        if rect == full {
            pass::clear(&mut encoder, &target.view, rgba);
        } else {
            let pipeline = self.pipelines.clear(
                &self.device.device,
                target.format.wgpu_format(),
                target.samples,
            );
            pass::scissored_clear(&mut encoder, &target.view, pipeline, rgba, rect);
        }
        self.device.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn draw(&mut self, draw: &DrawCommand) -> Result<(), Error> {
        let target = self.target(draw.target)?;
        let program = self
            .programs
            .get(&draw.program)
            .ok_or(Error::InvalidHandle(draw.program))?;
        let array = self
            .vertex_arrays
            .get(&draw.vertex_format)
            .ok_or(Error::InvalidHandle(draw.vertex_format))?;
        let buffer = |handle: Handle| {
            self.buffers
                .get(&handle)
                .map(|b| &b.buffer)
                .ok_or(Error::InvalidHandle(handle))
        };
        let vertices = buffer(array.vertices)?;
        let elements = buffer(array.elements)?;
        let uniform = buffer(draw.transform.buffer)?;
        let texture = match draw.texture {
            Some(binding) => {
                let texture = self
                    .textures
                    .get(&binding.texture)
                    .ok_or(Error::InvalidHandle(binding.texture))?;
                let sampler = self
                    .samplers
                    .get(&binding.sampler)
                    .ok_or(Error::InvalidHandle(binding.sampler))?;
                Some((texture.sampled_view(), sampler))
            }
            None => None,
        };

        let full = Rect::full(target.size);
        if draw.viewport.intersect(&full) != Some(draw.viewport) {
            return Err(Error::Validation(format!(
                "viewport {:?} is outside the {}x{} target",
                draw.viewport, target.size.0, target.size.1
            )));
        }
        let scissor = draw
            .scissor
            .map_or(Some(full), |s| s.intersect(&full))
            .and_then(|s| s.intersect(&draw.viewport));
        let Some(scissor) = scissor else {
            return Ok(());
        };

        let key = PipelineKey {
            program: draw.program,
            vertex_format: draw.vertex_format,
            target_format: target.format.wgpu_format(),
            samples: target.samples,
        };
        let device = &self.device.device;
        let pipeline = self
            .pipelines
            .draw(device, key, program, array.format.stride, &array.attributes);
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: uniform,
                offset: draw.transform.offset,
                size: NonZeroU64::new(draw.transform.size),
            }),
        }];
        if let Some((view, sampler)) = &texture {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&program.label),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &entries,
        });
        let mut encoder = encoder(device, "draw");
        pass::draw(
            &mut encoder,
            &pass::DrawPass {
                view: &target.view,
                pipeline,
                bind_group: &bind_group,
                vertices,
                elements,
                viewport: draw.viewport,
                scissor,
                element_count: draw.element_count,
            },
        );
        self.device.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn resolve(
        &mut self,
        source: Handle,
        destination: Handle,
        rect: Rect,
        invalidate_source: bool,
    ) -> Result<(), Error> {
        let from = self.target(FramebufferTarget::Offscreen(source))?;
        let to = self.target(FramebufferTarget::Offscreen(destination))?;
        if to.samples != 1 {
            return Err(Error::FramebufferIncomplete {
                handle: destination,
                status: FramebufferStatus::IncompleteMultisample,
            });
        }
        for (handle, size) in [(source, from.size), (destination, to.size)] {
            if rect.intersect(&Rect::full(size)) != Some(rect) {
                return Err(Error::Validation(format!(
                    "resolve rect {rect:?} is outside {handle}"
                )));
            }
        }
        let mut encoder = encoder(&self.device.device, "resolve");
        if from.samples == 1 {
            let origin = wgpu::Origin3d {
                x: rect.x,
                y: rect.y,
                z: 0,
            };
            encoder.copy_texture_to_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &from.texture,
                    mip_level: from.level,
                    origin,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyTextureInfo {
                    texture: &to.texture,
                    mip_level: to.level,
                    origin,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::Extent3d {
                    width: rect.width,
                    height: rect.height,
                    depth_or_array_layers: 1,
                },
            );
        } else if rect == Rect::full(from.size) && from.size == to.size {
            pass::resolve(&mut encoder, &from.view, &to.view, invalidate_source);
        } else {
            return Err(Error::Unsupported(format!(
                "resolving part of {source} in the wgpu driver"
            )));
        }
        self.device.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn encode(&mut self, command: &Command) -> Result<(), Error> {
        for buffer in self.buffers.values_mut() {
            buffer.flush(&self.device.queue);
        }
        match command {
            Command::Clear {
                target,
                color,
                scissor,
            } => self.clear(*target, *color, *scissor),
            Command::Draw(draw) => self.draw(draw),
            Command::Resolve {
                source,
                destination,
                rect,
                invalidate_source,
            } => self.resolve(*source, *destination, *rect, *invalidate_source),
        }
    }
}

impl Driver for WgpuDriver {
    fn name(&self) -> &str {
        &self.device.adapter_name
    }

    fn limits(&self) -> Limits {
        self.device.limits()
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<Handle, Error> {
        //naga gives better messages than an error scope, and names the stage
        wgsl::check(
            descriptor.label,
            ShaderStage::Vertex,
            descriptor.vertex,
            VERTEX_ENTRY,
        )?;
        wgsl::check(
            descriptor.label,
            ShaderStage::Fragment,
            descriptor.fragment,
            FRAGMENT_ENTRY,
        )?;
        let device = &self.device.device;
        let module = |stage: ShaderStage, source: &str| {
            let label = format!("{} {stage}", descriptor.label);
            error::scoped(device, || {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&label),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
            })
        };
        let mut modules = Vec::with_capacity(2);
        for (stage, source) in [
            (ShaderStage::Vertex, descriptor.vertex),
            (ShaderStage::Fragment, descriptor.fragment),
        ] {
            match module(stage, source) {
                (module, None) => modules.push(module),
                (_, Some(e)) => {
                    return Err(Error::Compile {
                        label: descriptor.label.to_string(),
                        stage,
                        message: e.to_string(),
                    });
                }
            }
        }
        let (Some(fragment), Some(vertex)) = (modules.pop(), modules.pop()) else {
            return Err(Error::creation(ResourceKind::Program, "missing shader module"));
        };
        let handle = self.allocator.allocate(ResourceKind::Program);
        self.programs.insert(
            handle,
            Program {
                label: descriptor.label.to_string(),
                vertex,
                fragment,
            },
        );
        Ok(handle)
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor<'_>) -> Result<Handle, Error> {
        if descriptor.size == 0 {
            return Err(Error::creation(
                ResourceKind::Buffer,
                format!("`{}` has zero size", descriptor.label),
            ));
        }
        if let Some(contents) = descriptor.contents {
            if contents.len() as u64 != descriptor.size {
                return Err(Error::creation(
                    ResourceKind::Buffer,
                    format!(
                        "`{}` declares {} bytes but has {}",
                        descriptor.label,
                        descriptor.size,
                        contents.len()
                    ),
                ));
            }
        }
        let buffer = error::creating(&self.device.device, ResourceKind::Buffer, || {
            Buffer::new(&self.device.device, descriptor)
        })?;
        let handle = self.allocator.allocate(ResourceKind::Buffer);
        self.buffers.insert(handle, buffer);
        Ok(handle)
    }

    fn map_persistent(&mut self, buffer: Handle) -> Result<(), Error> {
        self.buffer_mut(buffer)?.map(buffer)
    }

    fn mapped(&self, buffer: Handle) -> Result<&[u8], Error> {
        self.buffer(buffer)?.mapped(buffer)
    }

    fn mapped_mut(&mut self, buffer: Handle) -> Result<&mut [u8], Error> {
        self.buffer_mut(buffer)?.mapped_mut(buffer)
    }

    fn unmap(&mut self, buffer: Handle) -> Result<(), Error> {
        self.buffer_mut(buffer)?.unmap(buffer)
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<Handle, Error> {
        descriptor.validate()?;
        if descriptor.format.is_compressed()
            && !self.device.supports(wgpu::Features::TEXTURE_COMPRESSION_BC)
        {
            return Err(Error::Unsupported(format!(
                "{:?} on this adapter",
                descriptor.format
            )));
        }
        let limits = self.limits();
        if descriptor.samples > limits.max_samples || !descriptor.samples.is_power_of_two() {
            return Err(Error::creation(
                ResourceKind::Texture,
                format!(
                    "`{}` wants {} samples, this adapter takes 1 or {}",
                    descriptor.label, descriptor.samples, limits.max_samples
                ),
            ));
        }
        let texture = error::creating(&self.device.device, ResourceKind::Texture, || {
            Texture::new(&self.device.device, descriptor)
        })??;
        let handle = self.allocator.allocate(ResourceKind::Texture);
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn upload_level(&mut self, texture: Handle, upload: &LevelUpload<'_>) -> Result<(), Error> {
        let t = self
            .textures
            .get(&texture)
            .ok_or(Error::InvalidHandle(texture))?;
        match error::scoped(&self.device.device, || {
            t.upload(texture, &self.device.queue, upload)
        }) {
            (result, None) => result,
            (_, Some(e)) => Err(error::validation(e)),
        }
    }

    fn create_sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<Handle, Error> {
        if descriptor.address_mode == AddressMode::ClampToBorder
            && !self
                .device
                .supports(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER)
        {
            return Err(Error::Unsupported(
                "clamp-to-border sampling on this adapter".to_string(),
            ));
        }
        let s = error::creating(&self.device.device, ResourceKind::Sampler, || {
            sampler::create(&self.device.device, descriptor)
        })?;
        let handle = self.allocator.allocate(ResourceKind::Sampler);
        self.samplers.insert(handle, s);
        Ok(handle)
    }

    fn create_framebuffer(&mut self, descriptor: &FramebufferDescriptor) -> Result<Handle, Error> {
        let handle = self.allocator.allocate(ResourceKind::Framebuffer);
        self.framebuffers.insert(handle, descriptor.clone());
        Ok(handle)
    }

    fn framebuffer_status(&self, framebuffer: Handle) -> FramebufferStatus {
        let Some(descriptor) = self.framebuffers.get(&framebuffer) else {
            return FramebufferStatus::Undefined;
        };
        let attachment = descriptor
            .color_attachment
            .and_then(|t| self.textures.get(&t))
            .map(|t| &t.descriptor);
        descriptor.status_against(attachment)
    }

    fn create_vertex_format(
        &mut self,
        format: &VertexFormat,
        vertices: Handle,
        elements: Handle,
    ) -> Result<Handle, Error> {
        format
            .validate()
            .map_err(|e| Error::creation(ResourceKind::VertexFormat, e.to_string()))?;
        for (handle, usage) in [(vertices, BufferUsage::Vertex), (elements, BufferUsage::Index)] {
            let b = self.buffer(handle)?;
            if b.usage != usage {
                return Err(Error::creation(
                    ResourceKind::VertexFormat,
                    format!("{handle} is a {} buffer, not {usage}", b.usage),
                ));
            }
        }
        let attributes = pipeline::vertex_attributes(format)?;
        let handle = self.allocator.allocate(ResourceKind::VertexFormat);
        self.vertex_arrays.insert(
            handle,
            VertexArray {
                format: format.clone(),
                attributes,
                vertices,
                elements,
            },
        );
        Ok(handle)
    }

    fn execute(&mut self, command: &Command) -> Result<(), Error> {
        let device = self.device.device.clone();
        let (result, error) = error::scoped(&device, || self.encode(command));
        if let Some(e) = error {
            logwise::warn_sync!("wgpu rejected a command: {e}", e = logwise::privacy::LogIt(&e.to_string()));
            self.errors.push(error::validation(e));
        }
        result
    }

    fn end_frame(&mut self) -> Result<(), Error> {
        self.device
            .device
            .poll(wgpu::PollType::Poll)
            .map_err(|e| Error::Validation(e.to_string()))?;
        Ok(())
    }

    fn read_pixels(&mut self, target: FramebufferTarget, rect: Rect) -> Result<Vec<[u8; 4]>, Error> {
        let target = self.target(target)?;
        if target.samples != 1 {
            return Err(Error::Unsupported(
                "reading pixels of a multisampled image".to_string(),
            ));
        }
        if rect.intersect(&Rect::full(target.size)) != Some(rect) {
            return Err(Error::Validation(format!(
                "{rect:?} is outside the {}x{} target",
                target.size.0, target.size.1
            )));
        }
        let bytes = readback::read_texture(
            &self.device.device,
            &self.device.queue,
            &target.texture,
            target.level,
            target.format,
            rect,
        )?;
        let mut image = Image::new(target.format, rect.width, rect.height, 1);
        if !image.replace(&bytes) {
            return Err(Error::Validation(format!(
                "readback returned {} bytes for {rect:?}",
                bytes.len()
            )));
        }
        software::read_image(&image, Rect::full((rect.width, rect.height)))
    }

    fn delete(&mut self, handle: Handle) -> Result<(), Error> {
        let removed = match handle.kind() {
            ResourceKind::Program => self.programs.remove(&handle).is_some(),
            ResourceKind::Buffer => match self.buffers.get(&handle) {
                Some(b) if b.is_mapped() => return Err(Error::StillMapped(handle)),
                Some(_) => self
                    .buffers
                    .remove(&handle)
                    .map(|b| b.buffer.destroy())
                    .is_some(),
                None => false,
            },
            ResourceKind::Texture => self
                .textures
                .remove(&handle)
                .map(|t| t.texture.destroy())
                .is_some(),
            ResourceKind::Sampler => self.samplers.remove(&handle).is_some(),
            ResourceKind::Framebuffer => self.framebuffers.remove(&handle).is_some(),
            ResourceKind::VertexFormat => self.vertex_arrays.remove(&handle).is_some(),
        };
        if !removed {
            return Err(Error::InvalidHandle(handle));
        }
        self.pipelines.evict(handle);
        Ok(())
    }

    fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}
