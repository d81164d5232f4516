// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Role-indexed handle tables.
//!
//! A sample owns a fixed cast of GPU objects.  Each one is addressed by a closed
//! role enum rather than by a raw array index, and each table's size is checked
//! against its role enum at compile time.

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::bindings::handle::Handle;
use crate::bindings::uniform_slots::UniformSlots;
use crate::imp::Driver;

/// A closed set of resource roles.
pub trait Role: Copy + Eq + Debug + 'static {
    /// Every role, in index order.
    const ALL: &'static [Self];
    fn index(self) -> usize;
    fn name(self) -> &'static str;
}

macro_rules! roles {
    ($(#[$m:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Role for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn index(self) -> usize {
                self as usize
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

roles!(
    /// Buffers a sample owns.
    BufferRole {
        Vertex => "vertex",
        Element => "element",
        Transform => "transform",
    }
);

roles!(
    /// Textures a sample owns.
    TextureRole {
        Diffuse => "diffuse",
        Multisample => "multisample",
        Colorbuffer => "colorbuffer",
    }
);

roles!(
    /// Framebuffers a sample owns.
    FramebufferRole {
        Render => "render",
        Resolve => "resolve",
    }
);

/// A fixed-size map from role to optional handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMap<R: Role, const N: usize> {
    slots: [Option<Handle>; N],
    _role: PhantomData<R>,
}

impl<R: Role, const N: usize> RoleMap<R, N> {
    pub const fn new() -> Self {
        const { assert!(R::ALL.len() == N, "role map size must match its role enum") };
        RoleMap {
            slots: [None; N],
            _role: PhantomData,
        }
    }

    pub fn get(&self, role: R) -> Option<Handle> {
        self.slots[role.index()]
    }

    /// Stores `handle`, returning whatever was there.
    pub fn insert(&mut self, role: R, handle: Handle) -> Option<Handle> {
        self.slots[role.index()].replace(handle)
    }

    pub fn take(&mut self, role: R) -> Option<Handle> {
        self.slots[role.index()].take()
    }

    /// Allocated roles and their handles.
    pub fn iter(&self) -> impl Iterator<Item = (R, Handle)> + '_ {
        R::ALL
            .iter()
            .filter_map(|role| self.get(*role).map(|h| (*role, h)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl<R: Role, const N: usize> Default for RoleMap<R, N> {
    fn default() -> Self {
        Self::new()
    }
}

pub type BufferMap = RoleMap<BufferRole, 3>;
pub type TextureMap = RoleMap<TextureRole, 3>;
pub type FramebufferMap = RoleMap<FramebufferRole, 2>;

/// Every GPU object one sample owns.
#[derive(Debug, Default)]
pub struct ResourceSet {
    pub(crate) program: Option<Handle>,
    pub(crate) buffers: BufferMap,
    pub(crate) textures: TextureMap,
    pub(crate) framebuffers: FramebufferMap,
    pub(crate) sampler: Option<Handle>,
    pub(crate) vertex_format: Option<Handle>,
    pub(crate) uniforms: Option<UniformSlots>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(&self) -> Option<Handle> {
        self.program
    }

    pub fn buffer(&self, role: BufferRole) -> Option<Handle> {
        self.buffers.get(role)
    }

    pub fn texture(&self, role: TextureRole) -> Option<Handle> {
        self.textures.get(role)
    }

    pub fn framebuffer(&self, role: FramebufferRole) -> Option<Handle> {
        self.framebuffers.get(role)
    }

    pub fn sampler(&self) -> Option<Handle> {
        self.sampler
    }

    pub fn vertex_format(&self) -> Option<Handle> {
        self.vertex_format
    }

    /// The mapped TRANSFORM region, while mapped.
    pub fn uniforms(&self) -> Option<&UniformSlots> {
        self.uniforms.as_ref()
    }

    /// Number of live handles.
    pub fn live(&self) -> usize {
        [self.program, self.sampler, self.vertex_format]
            .iter()
            .flatten()
            .count()
            + self.buffers.iter().count()
            + self.textures.iter().count()
            + self.framebuffers.iter().count()
    }

    /// Unmaps the TRANSFORM region, then deletes every live handle.
    ///
    /// Errors are logged and do not stop the release.  Returns how many occurred.
    pub fn release<D: Driver>(&mut self, driver: &mut D) -> usize {
        let mut failures = 0;
        let mut report = |handle: Handle, err: crate::imp::Error| {
            logwise::error_sync!(
                "Releasing {handle} failed: {err}",
                handle = logwise::privacy::LogIt(&handle),
                err = logwise::privacy::LogIt(&err)
            );
            failures += 1;
        };
        if let Some(slots) = self.uniforms.take() {
            if let Err(e) = driver.unmap(slots.buffer()) {
                report(slots.buffer(), e);
            }
        }
        let mut doomed: Vec<Handle> = Vec::with_capacity(self.live());
        doomed.extend(self.vertex_format.take());
        for role in FramebufferRole::ALL {
            doomed.extend(self.framebuffers.take(*role));
        }
        for role in TextureRole::ALL {
            doomed.extend(self.textures.take(*role));
        }
        doomed.extend(self.sampler.take());
        for role in BufferRole::ALL {
            doomed.extend(self.buffers.take(*role));
        }
        doomed.extend(self.program.take());
        let count = doomed.len();
        for handle in doomed {
            if let Err(e) = driver.delete(handle) {
                report(handle, e);
            }
        }
        logwise::debuginternal_sync!(
            "Released {count} handles with {failures} failures",
            count = count,
            failures = failures
        );
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::handle::{HandleAllocator, ResourceKind};

    #[test]
    fn role_map_tracks_handles() {
        let mut allocator = HandleAllocator::new();
        let mut map = BufferMap::new();
        assert!(map.is_empty());
        let h = allocator.allocate(ResourceKind::Buffer);
        assert_eq!(map.insert(BufferRole::Transform, h), None);
        assert_eq!(map.get(BufferRole::Transform), Some(h));
        assert_eq!(map.get(BufferRole::Vertex), None);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(BufferRole::Transform, h)]);
        assert_eq!(map.take(BufferRole::Transform), Some(h));
        assert_eq!(map.take(BufferRole::Transform), None);
    }

    #[test]
    fn role_names() {
        assert_eq!(TextureRole::Colorbuffer.name(), "colorbuffer");
        assert_eq!(FramebufferRole::ALL.len(), 2);
        assert_eq!(BufferRole::Element.index(), 1);
    }
}
