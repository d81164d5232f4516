// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! A persistently mapped uniform buffer split into fixed-stride slots.
//!
//! Each draw of a frame reads its transform from its own slot, so writing slot 1 for
//! the second draw can never disturb the matrix the first draw is reading from slot 0.
//! The stride is the transform size rounded up to the driver's uniform offset
//! alignment, which keeps every slot offset bindable.

use glam::Mat4;

use crate::bindings::handle::Handle;
use crate::bittricks::align_up;
use crate::images::render_pass::UniformBinding;
use crate::imp::{Driver, Error};

/// Size of the per-draw transform.
pub const TRANSFORM_SIZE: u64 = size_of::<Mat4>() as u64;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SlotError {
    #[error("slot {slot} is outside the {count} mapped slots")]
    OutOfRange { slot: u32, count: u32 },
    #[error("{len} bytes don't fit a {stride}-byte slot")]
    Oversized { len: u64, stride: u64 },
    #[error(transparent)]
    Driver(#[from] Error),
}

/// The mapped region of the TRANSFORM buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlots {
    buffer: Handle,
    stride: u64,
    count: u32,
}

impl UniformSlots {
    /// Stride for slots holding one transform under `min_alignment`.
    pub const fn stride_for(min_alignment: u32) -> u64 {
        align_up(TRANSFORM_SIZE, min_alignment as u64)
    }

    /// Describes `count` slots of an already mapped `buffer`.
    pub fn new(buffer: Handle, count: u32, min_alignment: u32) -> Self {
        UniformSlots {
            buffer,
            stride: Self::stride_for(min_alignment),
            count,
        }
    }

    pub fn buffer(&self) -> Handle {
        self.buffer
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Bytes the owning buffer needs.
    pub fn size(&self) -> u64 {
        self.stride * self.count as u64
    }

    pub fn offset(&self, slot: u32) -> Result<u64, SlotError> {
        if slot >= self.count {
            return Err(SlotError::OutOfRange {
                slot,
                count: self.count,
            });
        }
        Ok(slot as u64 * self.stride)
    }

    /// Copies `bytes` to the start of `slot`.
    pub fn write_bytes<D: Driver>(
        &self,
        driver: &mut D,
        slot: u32,
        bytes: &[u8],
    ) -> Result<(), SlotError> {
        let offset = self.offset(slot)? as usize;
        if bytes.len() as u64 > self.stride {
            return Err(SlotError::Oversized {
                len: bytes.len() as u64,
                stride: self.stride,
            });
        }
        let mapped = driver.mapped_mut(self.buffer)?;
        let size = mapped.len() as u64;
        let destination = mapped
            .get_mut(offset..offset + bytes.len())
            .ok_or(Error::OutOfBounds {
                handle: self.buffer,
                offset: offset as u64,
                len: bytes.len() as u64,
                size,
            })?;
        destination.copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_matrix<D: Driver>(
        &self,
        driver: &mut D,
        slot: u32,
        matrix: &Mat4,
    ) -> Result<(), SlotError> {
        self.write_bytes(driver, slot, bytemuck::bytes_of(matrix))
    }

    pub fn read_matrix<D: Driver>(&self, driver: &D, slot: u32) -> Result<Mat4, SlotError> {
        let offset = self.offset(slot)?;
        let mapped = driver.mapped(self.buffer)?;
        let start = offset as usize;
        let bytes = mapped
            .get(start..start + TRANSFORM_SIZE as usize)
            .ok_or(Error::OutOfBounds {
                handle: self.buffer,
                offset,
                len: TRANSFORM_SIZE,
                size: mapped.len() as u64,
            })?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// The range a draw binds to read `slot`.
    pub fn binding(&self, slot: u32) -> Result<UniformBinding, SlotError> {
        Ok(UniformBinding {
            buffer: self.buffer,
            offset: self.offset(slot)?,
            size: TRANSFORM_SIZE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rounds_to_alignment() {
        assert_eq!(UniformSlots::stride_for(256), 256);
        assert_eq!(UniformSlots::stride_for(16), 64);
        assert_eq!(UniformSlots::stride_for(48), 96);
        assert_eq!(UniformSlots::stride_for(0), 64);
    }
}
