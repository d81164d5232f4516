// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The driver seam.
//!
//! Everything the lifecycle manager does to the GPU goes through [`Driver`].  Two
//! implementations exist: the wgpu driver (feature `backend_wgpu`) and the software
//! driver, which runs on the CPU and records a call trace.

use crate::bindings::framebuffer::{FramebufferDescriptor, FramebufferStatus};
use crate::bindings::handle::{Handle, ResourceKind};
use crate::bindings::sampler::SamplerDescriptor;
use crate::bindings::texture_builder::TextureDescriptor;
use crate::bindings::visible_to::BufferUsage;
use crate::images::render_pass::{Command, FramebufferTarget, Rect};
use crate::images::shader::ShaderStage;
use crate::images::vertex_layout::VertexFormat;

pub(crate) mod software;
pub(crate) mod wgsl;

#[cfg(feature = "backend_wgpu")]
pub(crate) mod wgpu;

pub use software::{Call, SoftwareDriver};

/// Entry point names every program must provide.
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Errors reported by a [`Driver`].
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{stage} shader `{label}` failed to compile: {message}")]
    Compile {
        label: String,
        stage: ShaderStage,
        message: String,
    },
    #[error("can't create {kind}: {message}")]
    ResourceCreation { kind: ResourceKind, message: String },
    #[error("{0} is not a live handle")]
    InvalidHandle(Handle),
    #[error("{0} is still mapped")]
    StillMapped(Handle),
    #[error("{0} is not mapped")]
    NotMapped(Handle),
    #[error("{len} bytes at offset {offset} is outside {handle} ({size} bytes)")]
    OutOfBounds {
        handle: Handle,
        offset: u64,
        len: u64,
        size: u64,
    },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("framebuffer {handle} is incomplete: {status}")]
    FramebufferIncomplete {
        handle: Handle,
        status: FramebufferStatus,
    },
    #[error("no suitable GPU adapter")]
    NoSuchAdapter,
    #[error("can't request device: {0}")]
    RequestDevice(String),
    #[error("validation: {0}")]
    Validation(String),
}

impl Error {
    pub(crate) fn creation(kind: ResourceKind, message: impl Into<String>) -> Self {
        Error::ResourceCreation {
            kind,
            message: message.into(),
        }
    }
}

/// Device limits the lifecycle manager sizes resources against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min_uniform_buffer_offset_alignment: u32,
    pub max_samples: u32,
    pub max_texture_dimension_2d: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            min_uniform_buffer_offset_alignment: 256,
            max_samples: 4,
            max_texture_dimension_2d: 8192,
        }
    }
}

/// A vertex and fragment shader pair, linked into one program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
    pub size: u64,
    /// Immutable initial contents.  Must be `size` bytes when present.
    pub contents: Option<&'a [u8]>,
    /// Storage will be mapped for writing for the buffer's whole lifetime.
    pub persistent: bool,
}

/// One mip level handed to [`Driver::upload_level`].
#[derive(Debug, Clone, Copy)]
pub enum LevelUpload<'a> {
    /// Whole compressed blocks, in block rows.
    Compressed {
        level: u32,
        width: u32,
        height: u32,
        data: &'a [u8],
    },
    /// Tightly packed pixel rows.
    Pixels {
        level: u32,
        width: u32,
        height: u32,
        data: &'a [u8],
    },
}

impl LevelUpload<'_> {
    pub fn level(&self) -> u32 {
        match self {
            LevelUpload::Compressed { level, .. } | LevelUpload::Pixels { level, .. } => *level,
        }
    }

    pub fn extent(&self) -> (u32, u32) {
        match self {
            LevelUpload::Compressed { width, height, .. }
            | LevelUpload::Pixels { width, height, .. } => (*width, *height),
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            LevelUpload::Compressed { data, .. } | LevelUpload::Pixels { data, .. } => data,
        }
    }
}

/// A graphics context that issues commands on one thread.
///
/// Creation calls return a fresh [`Handle`]; every handle is released with
/// [`Driver::delete`].  Commands issued with [`Driver::execute`] take effect in
/// order, and a frame ends with [`Driver::end_frame`].
pub trait Driver {
    fn name(&self) -> &str;
    fn limits(&self) -> Limits;

    /// Size of the default framebuffer.
    fn surface_size(&self) -> (u32, u32);

    fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<Handle, Error>;
    fn create_buffer(&mut self, descriptor: &BufferDescriptor<'_>) -> Result<Handle, Error>;

    /// Maps a persistent buffer for writing until [`Driver::unmap`].
    fn map_persistent(&mut self, buffer: Handle) -> Result<(), Error>;
    fn mapped(&self, buffer: Handle) -> Result<&[u8], Error>;
    /// Writes through the returned slice are visible to the next command.
    fn mapped_mut(&mut self, buffer: Handle) -> Result<&mut [u8], Error>;
    fn unmap(&mut self, buffer: Handle) -> Result<(), Error>;

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<Handle, Error>;
    fn upload_level(&mut self, texture: Handle, upload: &LevelUpload<'_>) -> Result<(), Error>;
    fn create_sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<Handle, Error>;
    fn create_framebuffer(&mut self, descriptor: &FramebufferDescriptor) -> Result<Handle, Error>;
    fn framebuffer_status(&self, framebuffer: Handle) -> FramebufferStatus;
    fn create_vertex_format(
        &mut self,
        format: &VertexFormat,
        vertices: Handle,
        elements: Handle,
    ) -> Result<Handle, Error>;

    fn execute(&mut self, command: &Command) -> Result<(), Error>;
    fn end_frame(&mut self) -> Result<(), Error>;

    /// Reads RGBA8 pixels, row-major from the top-left of `rect`.
    fn read_pixels(&mut self, target: FramebufferTarget, rect: Rect) -> Result<Vec<[u8; 4]>, Error>;

    fn delete(&mut self, handle: Handle) -> Result<(), Error>;

    /// Drains errors the driver reported asynchronously.
    fn take_errors(&mut self) -> Vec<Error>;
}
