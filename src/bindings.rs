// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Defines binding types: handles, role tables, and the descriptors resources are created from */

pub mod framebuffer;
pub mod handle;
pub mod resource_set;
pub mod sampler;
pub mod software;
pub mod texture_builder;
pub mod texture_source;
pub mod uniform_slots;
pub mod visible_to;

pub use handle::{Handle, ResourceKind};
pub use resource_set::{BufferRole, FramebufferRole, ResourceSet, Role, TextureRole};
