// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Buffer usage declarations.
//!
//! When creating a buffer, declare how the GPU will read it so the driver can pick the
//! right binding and memory placement.
//!
//! # Examples
//!
//! ```
//! use frames_and_samples::bindings::visible_to::BufferUsage;
//!
//! let usage = BufferUsage::Index;
//! assert_eq!(usage.to_string(), "index");
//! ```

use std::fmt::{Display, Formatter};

/// Describes how a buffer resource will be used on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// The buffer contains vertex attribute data.
    ///
    /// Its contents are interpreted according to a
    /// [`crate::images::vertex_layout::VertexFormat`].
    Vertex,
    /// The buffer contains 16-bit triangle indices.
    Index,
    /// The buffer is read as uniform data, one fixed-stride slot per draw.
    Uniform,
}

impl Display for BufferUsage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BufferUsage::Vertex => "vertex",
            BufferUsage::Index => "index",
            BufferUsage::Uniform => "uniform",
        })
    }
}
