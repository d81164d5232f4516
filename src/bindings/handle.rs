// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Opaque GPU resource handles.
//!
//! A [`Handle`] is the driver-issued name of one GPU object.  Handles are plain
//! values: they carry no ownership on their own.  Ownership lives in
//! [`crate::bindings::resource_set::ResourceSet`], which stores each handle as an
//! `Option<Handle>` so that "not yet created" and "already destroyed" are the same
//! `None` sentinel.

use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;

/// The kind of GPU object a [`Handle`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A linked vertex + fragment program.
    Program,
    /// A buffer with immutable or persistently mapped storage.
    Buffer,
    /// A texture, single or multisampled.
    Texture,
    /// A sampler object.
    Sampler,
    /// A vertex-format object binding attributes to a vertex and element buffer.
    VertexFormat,
    /// A framebuffer with one color attachment.
    Framebuffer,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Program => "program",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
            ResourceKind::VertexFormat => "vertex format",
            ResourceKind::Framebuffer => "framebuffer",
        };
        f.write_str(name)
    }
}

/// Driver-issued name of a GPU object.
///
/// The id is never zero; zero is reserved the way the underlying APIs reserve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    kind: ResourceKind,
    id: NonZeroU32,
}

impl Handle {
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub const fn id(&self) -> u32 {
        self.id.get()
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Issues fresh handles.  Ids are never reused within one allocator.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    issued: u32,
}

impl HandleAllocator {
    pub const fn new() -> Self {
        Self { issued: 0 }
    }

    pub fn allocate(&mut self, kind: ResourceKind) -> Handle {
        let id = NonZeroU32::MIN.saturating_add(self.issued);
        self.issued = self.issued.saturating_add(1);
        Handle { kind, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_nonzero() {
        let mut allocator = HandleAllocator::new();
        let a = allocator.allocate(ResourceKind::Buffer);
        let b = allocator.allocate(ResourceKind::Texture);
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert_ne!(a, b);
        assert_eq!(b.kind(), ResourceKind::Texture);
        assert_eq!(a.to_string(), "buffer#1");
    }
}
