// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! A CPU implementation of [`Driver`].

The software driver keeps every resource in host memory, validates WGSL with naga,
and renders with a fixed-function pipeline: positions are transformed by the bound
uniform matrix, and fragments take the bound texture sampled at the texture
coordinate, or the vertex color when no texture is bound.

Every driver call is recorded in a [`Call`] trace, so tests can check exactly what
the lifecycle manager asked for.

```
use frames_and_samples::{Driver, SoftwareDriver};
use frames_and_samples::images::render_pass::{Command, FramebufferTarget, Rect};

let mut driver = SoftwareDriver::new(4, 4);
driver
    .execute(&Command::Clear {
        target: FramebufferTarget::Default,
        color: [1.0, 0.0, 0.0, 1.0],
        scissor: None,
    })
    .unwrap();
let pixels = driver
    .read_pixels(FramebufferTarget::Default, Rect::new(0, 0, 1, 1))
    .unwrap();
assert_eq!(pixels, vec![[255, 0, 0, 255]]);
```
*/

mod raster;

use std::collections::HashMap;

use glam::{Mat4, Vec4};

use crate::bindings::framebuffer::{FramebufferDescriptor, FramebufferStatus};
use crate::bindings::handle::{Handle, HandleAllocator, ResourceKind};
use crate::bindings::sampler::{MinFilter, SamplerDescriptor};
use crate::bindings::software::texture::{Image, Normalized, Texel};
use crate::bindings::texture_builder::{TextureDescriptor, TextureKind};
use crate::bindings::visible_to::BufferUsage;
use crate::bittricks::mip_extent;
use crate::images::render_pass::{Command, DrawCommand, FramebufferTarget, Rect};
use crate::images::shader::ShaderStage;
use crate::images::vertex_layout::{Semantic, VertexFormat};
use crate::imp::{
    BufferDescriptor, Driver, Error, FRAGMENT_ENTRY, LevelUpload, Limits, ProgramDescriptor,
    VERTEX_ENTRY, wgsl,
};
use crate::pixel_formats::PixelFormat;
use raster::{RasterVertex, draw_triangles};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Call {
    CreateProgram(Handle),
    CreateBuffer {
        handle: Handle,
        usage: BufferUsage,
        size: u64,
        persistent: bool,
    },
    MapPersistent(Handle),
    Unmap(Handle),
    CreateTexture {
        handle: Handle,
        kind: TextureKind,
        format: PixelFormat,
        width: u32,
        height: u32,
        levels: u32,
        samples: u32,
    },
    UploadLevel {
        texture: Handle,
        level: u32,
        width: u32,
        height: u32,
        bytes: usize,
        compressed: bool,
    },
    CreateSampler {
        handle: Handle,
        min_filter: MinFilter,
    },
    CreateFramebuffer {
        handle: Handle,
        attachment: Option<Handle>,
    },
    CreateVertexFormat(Handle),
    Clear {
        target: FramebufferTarget,
        scissor: Option<Rect>,
    },
    Draw {
        target: FramebufferTarget,
        viewport: Rect,
        transform_offset: u64,
        texture: Option<Handle>,
        element_count: u32,
    },
    Resolve {
        source: Handle,
        destination: Handle,
        invalidate_source: bool,
    },
    EndFrame,
    ReadPixels(FramebufferTarget),
    Delete(Handle),
}

impl Call {
    pub fn is_draw(&self) -> bool {
        matches!(self, Call::Draw { .. })
    }

    /// The handle this call created, if it created one.
    pub fn created(&self) -> Option<Handle> {
        match self {
            Call::CreateProgram(h) | Call::CreateVertexFormat(h) => Some(*h),
            Call::CreateBuffer { handle, .. }
            | Call::CreateTexture { handle, .. }
            | Call::CreateSampler { handle, .. }
            | Call::CreateFramebuffer { handle, .. } => Some(*handle),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Buffer {
    usage: BufferUsage,
    data: Vec<u8>,
    persistent: bool,
    mapped: bool,
}

#[derive(Debug)]
struct Texture {
    descriptor: TextureDescriptor,
    levels: Vec<Image>,
}

#[derive(Debug)]
struct VertexArray {
    format: VertexFormat,
    vertices: Handle,
    elements: Handle,
}

/// A [`Driver`] that renders on the CPU.
#[derive(Debug)]
pub struct SoftwareDriver {
    limits: Limits,
    surface: Image,
    allocator: HandleAllocator,
    programs: HashMap<Handle, String>,
    buffers: HashMap<Handle, Buffer>,
    textures: HashMap<Handle, Texture>,
    samplers: HashMap<Handle, SamplerDescriptor>,
    framebuffers: HashMap<Handle, FramebufferDescriptor>,
    vertex_arrays: HashMap<Handle, VertexArray>,
    calls: Vec<Call>,
    errors: Vec<Error>,
    creations_left: Option<usize>,
}

impl SoftwareDriver {
    /// A driver whose default surface is `width` x `height` RGBA8.
    pub fn new(width: u32, height: u32) -> Self {
        SoftwareDriver {
            limits: Limits::default(),
            surface: Image::new(PixelFormat::RGBA8UNorm, width, height, 1),
            allocator: HandleAllocator::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            framebuffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            calls: Vec::new(),
            errors: Vec::new(),
            creations_left: None,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Lets `n` more creation calls succeed, then fails every later one.
    pub fn fail_creation_after(&mut self, n: usize) {
        self.creations_left = Some(n);
    }

    /// Every call since construction or the last [`SoftwareDriver::clear_calls`].
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of live handles of every kind.
    pub fn live_handles(&self) -> usize {
        self.programs.len()
            + self.buffers.len()
            + self.textures.len()
            + self.samplers.len()
            + self.framebuffers.len()
            + self.vertex_arrays.len()
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        match handle.kind() {
            ResourceKind::Program => self.programs.contains_key(&handle),
            ResourceKind::Buffer => self.buffers.contains_key(&handle),
            ResourceKind::Texture => self.textures.contains_key(&handle),
            ResourceKind::Sampler => self.samplers.contains_key(&handle),
            ResourceKind::Framebuffer => self.framebuffers.contains_key(&handle),
            ResourceKind::VertexFormat => self.vertex_arrays.contains_key(&handle),
        }
    }

    /// RGBA8 texels of one level of a non-multisampled, uncompressed texture.
    pub fn texture_pixels(&self, texture: Handle, level: u32) -> Result<Vec<[u8; 4]>, Error> {
        let image = self
            .textures
            .get(&texture)
            .and_then(|t| t.levels.get(level as usize))
            .ok_or(Error::InvalidHandle(texture))?;
        read_image(image, Rect::full((image.width(), image.height())))
    }

    fn allocate(&mut self, kind: ResourceKind) -> Result<Handle, Error> {
        if let Some(left) = self.creations_left.as_mut() {
            if *left == 0 {
                return Err(Error::creation(kind, "injected creation failure"));
            }
            *left -= 1;
        }
        Ok(self.allocator.allocate(kind))
    }

    fn buffer(&self, handle: Handle) -> Result<&Buffer, Error> {
        self.buffers.get(&handle).ok_or(Error::InvalidHandle(handle))
    }

    fn buffer_mut(&mut self, handle: Handle) -> Result<&mut Buffer, Error> {
        self.buffers
            .get_mut(&handle)
            .ok_or(Error::InvalidHandle(handle))
    }

    /// The texture attached to a complete framebuffer.
    fn attachment(&self, framebuffer: Handle) -> Result<(Handle, u32), Error> {
        let descriptor = self
            .framebuffers
            .get(&framebuffer)
            .ok_or(Error::InvalidHandle(framebuffer))?;
        match (self.framebuffer_status(framebuffer), descriptor.color_attachment) {
            (FramebufferStatus::Complete, Some(texture)) => Ok((texture, descriptor.level)),
            (status, _) => Err(Error::FramebufferIncomplete {
                handle: framebuffer,
                status,
            }),
        }
    }

    fn target_image(&mut self, target: FramebufferTarget) -> Result<&mut Image, Error> {
        match target {
            FramebufferTarget::Default => Ok(&mut self.surface),
            FramebufferTarget::Offscreen(framebuffer) => {
                let (texture, level) = self.attachment(framebuffer)?;
                self.textures
                    .get_mut(&texture)
                    .and_then(|t| t.levels.get_mut(level as usize))
                    .ok_or(Error::InvalidHandle(texture))
            }
        }
    }

    fn target_image_ref(&self, target: FramebufferTarget) -> Result<&Image, Error> {
        match target {
            FramebufferTarget::Default => Ok(&self.surface),
            FramebufferTarget::Offscreen(framebuffer) => {
                let (texture, level) = self.attachment(framebuffer)?;
                self.textures
                    .get(&texture)
                    .and_then(|t| t.levels.get(level as usize))
                    .ok_or(Error::InvalidHandle(texture))
            }
        }
    }

    fn draw(&mut self, draw: &DrawCommand) -> Result<(), Error> {
        if !self.programs.contains_key(&draw.program) {
            return Err(Error::InvalidHandle(draw.program));
        }
        let array = self
            .vertex_arrays
            .get(&draw.vertex_format)
            .ok_or(Error::InvalidHandle(draw.vertex_format))?;
        let uniform = self.buffer(draw.transform.buffer)?;
        let start = draw.transform.offset as usize;
        let matrix_bytes = uniform
            .data
            .get(start..start + size_of::<Mat4>())
            .ok_or(Error::OutOfBounds {
                handle: draw.transform.buffer,
                offset: draw.transform.offset,
                len: draw.transform.size,
                size: uniform.data.len() as u64,
            })?;
        let matrix: Mat4 = bytemuck::pod_read_unaligned(matrix_bytes);

        let vertices = &self
            .buffers
            .get(&array.vertices)
            .ok_or(Error::InvalidHandle(array.vertices))?
            .data;
        let elements = &self
            .buffers
            .get(&array.elements)
            .ok_or(Error::InvalidHandle(array.elements))?
            .data;
        let assembled = match assemble(
            array,
            vertices,
            elements,
            draw.element_count,
            draw.texture.is_some(),
            matrix,
        ) {
            Ok(assembled) => assembled,
            Err(e) => {
                self.errors.push(e);
                return Ok(());
            }
        };

        let attachment = match draw.target {
            FramebufferTarget::Default => None,
            FramebufferTarget::Offscreen(framebuffer) => Some(self.attachment(framebuffer)?),
        };
        if let Some(binding) = draw.texture {
            if !self.samplers.contains_key(&binding.sampler) {
                return Err(Error::InvalidHandle(binding.sampler));
            }
            let image = self
                .textures
                .get(&binding.texture)
                .and_then(|t| t.levels.first())
                .ok_or(Error::InvalidHandle(binding.texture))?;
            if image.format().is_compressed() {
                self.errors.push(Error::Unsupported(format!(
                    "sampling {:?} in the software driver",
                    image.format()
                )));
                return Ok(());
            }
            if attachment.is_some_and(|(texture, _)| texture == binding.texture) {
                return Err(Error::Validation(format!(
                    "{} is both sampled and rendered to",
                    binding.texture
                )));
            }
        }

        let sampler = draw
            .texture
            .and_then(|binding| self.samplers.get(&binding.sampler));
        let (target_texture, sampled) = match (attachment, draw.texture) {
            (None, binding) => (
                None,
                binding.and_then(|b| self.textures.get(&b.texture)),
            ),
            (Some((texture, _)), None) => (self.textures.get_mut(&texture), None),
            (Some((texture, _)), Some(binding)) => {
                let [target, sampled] = self
                    .textures
                    .get_disjoint_mut([&texture, &binding.texture]);
                (target, sampled.map(|s| &*s))
            }
        };
        let target = match attachment {
            None => &mut self.surface,
            Some((texture, level)) => target_texture
                .and_then(|t| t.levels.get_mut(level as usize))
                .ok_or(Error::InvalidHandle(texture))?,
        };
        let texture = sampled.and_then(|t| t.levels.first()).zip(sampler);

        let full = Rect::full((target.width(), target.height()));
        let bounds = draw
            .scissor
            .map_or(Some(full), |s| s.intersect(&full))
            .and_then(|b| b.intersect(&draw.viewport));
        let Some(bounds) = bounds else {
            return Ok(());
        };
        let stats = draw_triangles(target, draw.viewport, bounds, &assembled, |varying| {
            match texture {
                Some((image, sampler)) => image
                    .sample(
                        Normalized {
                            x: varying.x,
                            y: varying.y,
                        },
                        sampler,
                    )
                    .unwrap_or(sampler.border_color.rgba()),
                None => varying.to_array(),
            }
        });
        logwise::trace_sync!(
            "software draw: {triangles} triangles, {skipped} skipped, {shaded} samples",
            triangles = stats.triangles,
            skipped = stats.skipped,
            shaded = stats.samples_shaded
        );
        Ok(())
    }

    fn resolve(&mut self, source: Handle, destination: Handle, rect: Rect) -> Result<(), Error> {
        let from = self.target_image_ref(FramebufferTarget::Offscreen(source))?;
        let from_rect = Rect::full((from.width(), from.height()));
        if rect.intersect(&from_rect) != Some(rect) {
            return Err(Error::Validation(format!(
                "resolve rect {rect:?} is outside {source}"
            )));
        }
        let mut resolved = Vec::with_capacity((rect.width * rect.height) as usize);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                resolved.push(from.resolve_pixel(Texel { x, y }).unwrap_or([0.0; 4]));
            }
        }
        let to = self.target_image(FramebufferTarget::Offscreen(destination))?;
        if to.samples() != 1 {
            return Err(Error::FramebufferIncomplete {
                handle: destination,
                status: FramebufferStatus::IncompleteMultisample,
            });
        }
        if rect.intersect(&Rect::full((to.width(), to.height()))) != Some(rect) {
            return Err(Error::Validation(format!(
                "resolve rect {rect:?} is outside {destination}"
            )));
        }
        let mut pixels = resolved.into_iter();
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if let Some(rgba) = pixels.next() {
                    to.write(Texel { x, y }, 0, rgba);
                }
            }
        }
        Ok(())
    }
}

/// Fetches and transforms the vertices of `count` elements.
fn assemble(
    array: &VertexArray,
    vertices: &[u8],
    elements: &[u8],
    count: u32,
    textured: bool,
    matrix: Mat4,
) -> Result<Vec<RasterVertex>, Error> {
    let format = &array.format;
    let mut assembled = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let pair = elements.get(i * 2..i * 2 + 2).ok_or(Error::OutOfBounds {
            handle: array.elements,
            offset: (i * 2) as u64,
            len: 2,
            size: elements.len() as u64,
        })?;
        let index = u16::from_le_bytes([pair[0], pair[1]]) as u32;
        let position = format
            .read_f32(vertices, index, Semantic::Position)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "element {i} reads vertex {index} past the end of {}",
                    array.vertices
                ))
            })?;
        //fixed function: texture coordinates when textured, else vertex color
        let varying = if textured {
            format
                .read_f32(vertices, index, Semantic::Texcoord)
                .unwrap_or([0.0, 0.0, 0.0, 1.0])
        } else {
            format
                .read_f32(vertices, index, Semantic::Color)
                .unwrap_or([1.0; 4])
        };
        assembled.push(RasterVertex {
            clip: matrix * Vec4::from_array(position),
            varying: Vec4::from_array(varying),
        });
    }
    Ok(assembled)
}

pub(crate) fn read_image(image: &Image, rect: Rect) -> Result<Vec<[u8; 4]>, Error> {
    if image.samples() != 1 {
        return Err(Error::Unsupported(
            "reading pixels of a multisampled image".to_string(),
        ));
    }
    if image.format().is_compressed() {
        return Err(Error::Unsupported(format!(
            "reading pixels of {:?}",
            image.format()
        )));
    }
    if rect.intersect(&Rect::full((image.width(), image.height()))) != Some(rect) {
        return Err(Error::Validation(format!(
            "{rect:?} is outside the {}x{} image",
            image.width(),
            image.height()
        )));
    }
    let mut out = Vec::with_capacity((rect.width * rect.height) as usize);
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            out.push(image.read_rgba8(Texel { x, y }, 0).unwrap_or([0; 4]));
        }
    }
    Ok(out)
}

impl Driver for SoftwareDriver {
    fn name(&self) -> &str {
        "software"
    }

    fn limits(&self) -> Limits {
        self.limits
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<Handle, Error> {
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
        let handle = self.allocate(ResourceKind::Program)?;
        self.programs.insert(handle, descriptor.label.to_string());
        self.calls.push(Call::CreateProgram(handle));
        Ok(handle)
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor<'_>) -> Result<Handle, Error> {
        if descriptor.size == 0 {
            return Err(Error::creation(
                ResourceKind::Buffer,
                format!("`{}` has zero size", descriptor.label),
            ));
        }
        let data = match descriptor.contents {
            Some(contents) if contents.len() as u64 != descriptor.size => {
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
            Some(contents) => contents.to_vec(),
            None => vec![0; descriptor.size as usize],
        };
        let handle = self.allocate(ResourceKind::Buffer)?;
        self.buffers.insert(
            handle,
            Buffer {
                usage: descriptor.usage,
                data,
                persistent: descriptor.persistent,
                mapped: false,
            },
        );
        self.calls.push(Call::CreateBuffer {
            handle,
            usage: descriptor.usage,
            size: descriptor.size,
            persistent: descriptor.persistent,
        });
        Ok(handle)
    }

    fn map_persistent(&mut self, buffer: Handle) -> Result<(), Error> {
        let b = self.buffer_mut(buffer)?;
        if !b.persistent {
            return Err(Error::Validation(format!(
                "{buffer} was not created for persistent mapping"
            )));
        }
        if b.mapped {
            return Err(Error::StillMapped(buffer));
        }
        b.mapped = true;
        self.calls.push(Call::MapPersistent(buffer));
        Ok(())
    }

    fn mapped(&self, buffer: Handle) -> Result<&[u8], Error> {
        let b = self.buffer(buffer)?;
        if !b.mapped {
            return Err(Error::NotMapped(buffer));
        }
        Ok(&b.data)
    }

    fn mapped_mut(&mut self, buffer: Handle) -> Result<&mut [u8], Error> {
        let b = self.buffer_mut(buffer)?;
        if !b.mapped {
            return Err(Error::NotMapped(buffer));
        }
        Ok(&mut b.data)
    }

    fn unmap(&mut self, buffer: Handle) -> Result<(), Error> {
        let b = self.buffer_mut(buffer)?;
        if !b.mapped {
            return Err(Error::NotMapped(buffer));
        }
        b.mapped = false;
        self.calls.push(Call::Unmap(buffer));
        Ok(())
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<Handle, Error> {
        descriptor.validate()?;
        if !matches!(
            descriptor.kind,
            TextureKind::D2 | TextureKind::D2Multisample
        ) {
            return Err(Error::Unsupported(format!(
                "{:?} textures in the software driver",
                descriptor.kind
            )));
        }
        let max = self.limits.max_texture_dimension_2d;
        if descriptor.width > max || descriptor.height > max {
            return Err(Error::creation(
                ResourceKind::Texture,
                format!(
                    "`{}` is {}x{}, over the {max} limit",
                    descriptor.label, descriptor.width, descriptor.height
                ),
            ));
        }
        if descriptor.samples > self.limits.max_samples {
            return Err(Error::creation(
                ResourceKind::Texture,
                format!(
                    "`{}` wants {} samples, over the {} limit",
                    descriptor.label, descriptor.samples, self.limits.max_samples
                ),
            ));
        }
        let levels = (0..descriptor.levels)
            .map(|level| {
                Image::new(
                    descriptor.format,
                    mip_extent(descriptor.width, level),
                    mip_extent(descriptor.height, level),
                    descriptor.samples,
                )
            })
            .collect();
        let handle = self.allocate(ResourceKind::Texture)?;
        self.textures.insert(
            handle,
            Texture {
                descriptor: descriptor.clone(),
                levels,
            },
        );
        self.calls.push(Call::CreateTexture {
            handle,
            kind: descriptor.kind,
            format: descriptor.format,
            width: descriptor.width,
            height: descriptor.height,
            levels: descriptor.levels,
            samples: descriptor.samples,
        });
        Ok(handle)
    }

    fn upload_level(&mut self, texture: Handle, upload: &LevelUpload<'_>) -> Result<(), Error> {
        let t = self
            .textures
            .get_mut(&texture)
            .ok_or(Error::InvalidHandle(texture))?;
        let format = t.descriptor.format;
        let compressed = matches!(upload, LevelUpload::Compressed { .. });
        if compressed != format.is_compressed() {
            return Err(Error::Validation(format!(
                "{} upload into {format:?} {texture}",
                if compressed { "compressed" } else { "pixel" }
            )));
        }
        if t.descriptor.kind.is_multisample() {
            return Err(Error::Validation(format!(
                "{texture} is multisampled and can't be uploaded to"
            )));
        }
        let level = upload.level();
        let image = t
            .levels
            .get_mut(level as usize)
            .ok_or_else(|| Error::Validation(format!("{texture} has no level {level}")))?;
        let (width, height) = upload.extent();
        if (width, height) != (image.width(), image.height()) {
            return Err(Error::Validation(format!(
                "level {level} of {texture} is {}x{}, not {width}x{height}",
                image.width(),
                image.height()
            )));
        }
        let data = upload.data();
        if !image.replace(data) {
            return Err(Error::OutOfBounds {
                handle: texture,
                offset: 0,
                len: data.len() as u64,
                size: format.level_size(width, height),
            });
        }
        self.calls.push(Call::UploadLevel {
            texture,
            level,
            width,
            height,
            bytes: data.len(),
            compressed,
        });
        Ok(())
    }

    fn create_sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<Handle, Error> {
        if descriptor.compare.is_some() {
            return Err(Error::Unsupported(
                "comparison samplers in the software driver".to_string(),
            ));
        }
        let handle = self.allocate(ResourceKind::Sampler)?;
        self.samplers.insert(handle, descriptor.clone());
        self.calls.push(Call::CreateSampler {
            handle,
            min_filter: descriptor.min_filter_mode(),
        });
        Ok(handle)
    }

    fn create_framebuffer(&mut self, descriptor: &FramebufferDescriptor) -> Result<Handle, Error> {
        let handle = self.allocate(ResourceKind::Framebuffer)?;
        self.framebuffers.insert(handle, descriptor.clone());
        self.calls.push(Call::CreateFramebuffer {
            handle,
            attachment: descriptor.color_attachment,
        });
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
        let handle = self.allocate(ResourceKind::VertexFormat)?;
        self.vertex_arrays.insert(
            handle,
            VertexArray {
                format: format.clone(),
                vertices,
                elements,
            },
        );
        self.calls.push(Call::CreateVertexFormat(handle));
        Ok(handle)
    }

    fn execute(&mut self, command: &Command) -> Result<(), Error> {
        match command {
            Command::Clear {
                target,
                color,
                scissor,
            } => {
                let image = self.target_image(*target)?;
                let full = Rect::full((image.width(), image.height()));
                if let Some(r) = scissor.map_or(Some(full), |s| s.intersect(&full)) {
                    image.fill(r.x, r.y, r.right(), r.bottom(), *color);
                }
                self.calls.push(Call::Clear {
                    target: *target,
                    scissor: *scissor,
                });
            }
            Command::Draw(draw) => {
                self.draw(draw)?;
                self.calls.push(Call::Draw {
                    target: draw.target,
                    viewport: draw.viewport,
                    transform_offset: draw.transform.offset,
                    texture: draw.texture.map(|t| t.texture),
                    element_count: draw.element_count,
                });
            }
            Command::Resolve {
                source,
                destination,
                rect,
                invalidate_source,
            } => {
                self.resolve(*source, *destination, *rect)?;
                self.calls.push(Call::Resolve {
                    source: *source,
                    destination: *destination,
                    invalidate_source: *invalidate_source,
                });
            }
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), Error> {
        self.calls.push(Call::EndFrame);
        Ok(())
    }

    fn read_pixels(&mut self, target: FramebufferTarget, rect: Rect) -> Result<Vec<[u8; 4]>, Error> {
        let pixels = read_image(self.target_image_ref(target)?, rect)?;
        self.calls.push(Call::ReadPixels(target));
        Ok(pixels)
    }

    fn delete(&mut self, handle: Handle) -> Result<(), Error> {
        let removed = match handle.kind() {
            ResourceKind::Program => self.programs.remove(&handle).is_some(),
            ResourceKind::Buffer => match self.buffers.get(&handle) {
                Some(b) if b.mapped => return Err(Error::StillMapped(handle)),
                Some(_) => self.buffers.remove(&handle).is_some(),
                None => false,
            },
            ResourceKind::Texture => self.textures.remove(&handle).is_some(),
            ResourceKind::Sampler => self.samplers.remove(&handle).is_some(),
            ResourceKind::Framebuffer => self.framebuffers.remove(&handle).is_some(),
            ResourceKind::VertexFormat => self.vertex_arrays.remove(&handle).is_some(),
        };
        if !removed {
            return Err(Error::InvalidHandle(handle));
        }
        self.calls.push(Call::Delete(handle));
        Ok(())
    }

    fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}
