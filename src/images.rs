// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The rendering component: sample configuration, the frame plan, and the lifecycle
that owns a sample's resources. */

pub mod config;
pub mod host;
pub mod lifecycle;
pub mod render_pass;
pub mod samples;
pub mod shader;
pub mod vertex_layout;
pub mod view;

pub use config::SampleConfig;
pub use lifecycle::{Lifecycle, LifecycleState};
