// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! frames_and_samples manages the GPU resources of small, single-feature rendering
samples across their whole life: creation, per-frame use, and teardown.

A sample is a [`images::config::SampleConfig`]: shaders, geometry, an optional texture,
and a choreography that says what one frame draws.  A [`images::lifecycle::Lifecycle`]
turns the config into live resources, renders frames with them, and releases every one
of them exactly once, whether initialization finished or failed halfway.

| Phase        | Entry point                                    | Touches the driver?         |
|--------------|------------------------------------------------|-----------------------------|
| Describe     | [`images::config::SampleConfig::builder`]      | No                          |
| Initialize   | [`images::lifecycle::Lifecycle::initialize`]   | Creates every resource      |
| Render       | [`images::lifecycle::Lifecycle::render_frame`] | Writes uniforms, executes   |
| Tear down    | [`images::lifecycle::Lifecycle::teardown`]     | Deletes every live resource |

[`images::host::run`] drives the whole thing against a [`images::host::Host`], which
owns the window (or pretends to, like [`images::host::HeadlessHost`]).

# Drivers

All GPU work goes through the [`Driver`] trait.  Two drivers ship:

* `WgpuDriver` (feature `backend_wgpu`, on by default) renders with [wgpu](https://wgpu.rs)
  into an offscreen surface, so it runs anywhere wgpu finds an adapter.
* [`SoftwareDriver`] runs on the CPU.  It validates shaders with naga, rasterizes with a
  fixed-function pipeline, and records every call, which makes it the driver tests use.

```
use frames_and_samples::images::host::{HeadlessHost, run};
use frames_and_samples::images::lifecycle::Lifecycle;
use frames_and_samples::images::samples;
use frames_and_samples::SoftwareDriver;

let config = samples::viewport().unwrap();
let mut host = HeadlessHost::new(2, (640, 480));
let mut lifecycle = Lifecycle::new(SoftwareDriver::new(640, 480));
let outcome = run(&mut host, &mut lifecycle, &config);
assert_eq!(outcome, frames_and_samples::images::host::RunOutcome::Completed { frames: 2 });
```

# Data

Shader and texture paths in a config resolve against the `data` directory at the crate
root, or `FRAMES_AND_SAMPLES_DATA_DIR` when it is set.
*/

logwise::declare_logging_domain!();

pub mod bindings;
mod bittricks;
pub mod images;
mod imp;
pub mod load;
pub mod pixel_formats;

pub use imp::{
    BufferDescriptor, Call, Driver, Error as DriverError, FRAGMENT_ENTRY, LevelUpload, Limits,
    ProgramDescriptor, SoftwareDriver, VERTEX_ENTRY,
};

#[cfg(feature = "backend_wgpu")]
pub use imp::wgpu::WgpuDriver;
