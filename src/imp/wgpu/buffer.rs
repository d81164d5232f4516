// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! wgpu buffers, including persistently mapped ones.

wgpu can't leave a buffer mapped while the GPU reads it, so a persistent buffer keeps a
CPU copy.  Writes go to the copy and mark it dirty; [`Buffer::flush`] uploads the copy
through the queue before the next command is submitted.
*/

use wgpu::util::DeviceExt;

use crate::bindings::handle::Handle;
use crate::bindings::visible_to::BufferUsage;
use crate::bittricks::align_up;
use crate::imp::{BufferDescriptor, Error};

const fn wgpu_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    match usage {
        BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        BufferUsage::Index => wgpu::BufferUsages::INDEX,
        BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
    }
}

#[derive(Debug)]
pub(super) struct Buffer {
    pub(super) buffer: wgpu::Buffer,
    pub(super) usage: BufferUsage,
    size: u64,
    shadow: Option<Vec<u8>>,
    mapped: bool,
    dirty: bool,
}

impl Buffer {
    pub(super) fn new(device: &wgpu::Device, descriptor: &BufferDescriptor<'_>) -> Buffer {
        let usage = wgpu_usage(descriptor.usage) | wgpu::BufferUsages::COPY_DST;
        let buffer = match descriptor.contents {
            Some(contents) => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(descriptor.label),
                contents,
                usage,
            }),
            None => device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(descriptor.label),
                size: align_up(descriptor.size, wgpu::COPY_BUFFER_ALIGNMENT),
                usage,
                mapped_at_creation: false,
            }),
        };
        let shadow = descriptor.persistent.then(|| {
            let mut shadow = descriptor.contents.map(<[u8]>::to_vec).unwrap_or_default();
            shadow.resize(align_up(descriptor.size, wgpu::COPY_BUFFER_ALIGNMENT) as usize, 0);
            shadow
        });
        Buffer {
            buffer,
            usage: descriptor.usage,
            size: descriptor.size,
            shadow,
            mapped: false,
            dirty: false,
        }
    }

    pub(super) fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub(super) fn map(&mut self, handle: Handle) -> Result<(), Error> {
        if self.shadow.is_none() {
            return Err(Error::Validation(format!(
                "{handle} was not created for persistent mapping"
            )));
        }
        if self.mapped {
            return Err(Error::StillMapped(handle));
        }
        self.mapped = true;
        Ok(())
    }

    pub(super) fn unmap(&mut self, handle: Handle) -> Result<(), Error> {
        if !self.mapped {
            return Err(Error::NotMapped(handle));
        }
        self.mapped = false;
        Ok(())
    }

    pub(super) fn mapped(&self, handle: Handle) -> Result<&[u8], Error> {
        match &self.shadow {
            Some(shadow) if self.mapped => Ok(&shadow[..self.size as usize]),
            _ => Err(Error::NotMapped(handle)),
        }
    }

    pub(super) fn mapped_mut(&mut self, handle: Handle) -> Result<&mut [u8], Error> {
        match &mut self.shadow {
            Some(shadow) if self.mapped => {
                self.dirty = true;
                Ok(&mut shadow[..self.size as usize])
            }
            _ => Err(Error::NotMapped(handle)),
        }
    }

    /// Uploads pending CPU writes.
    pub(super) fn flush(&mut self, queue: &wgpu::Queue) {
        if let (true, Some(shadow)) = (self.dirty, &self.shadow) {
            queue.write_buffer(&self.buffer, 0, shadow);
            self.dirty = false;
        }
    }
}
