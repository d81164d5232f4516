// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
#[derive(Debug)]
pub(crate) struct EntryPoint(pub(super) wgpu::Instance);

impl EntryPoint {
    /// An instance on the backends selected by `WGPU_BACKEND`, or every backend.
    pub(crate) fn new() -> Self {
        let descriptor = wgpu::InstanceDescriptor::from_env_or_default();
        EntryPoint(wgpu::Instance::new(&descriptor))
    }
}
