// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::Error;
use crate::imp::wgpu::entry_point::EntryPoint;

/// An adapter that has not been opened yet.
pub(crate) struct UnboundDevice {
    pub(super) adapter: wgpu::Adapter,
}

impl UnboundDevice {
    /// Picks an adapter for offscreen rendering.
    pub(crate) async fn pick(entry_point: &EntryPoint) -> Result<UnboundDevice, Error> {
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            //we render into our own texture, there is no window surface
            compatible_surface: None,
        };
        let adapter = entry_point
            .0
            .request_adapter(&options)
            .await
            .map_err(|_| Error::NoSuchAdapter)?;
        let info = adapter.get_info();
        logwise::info_sync!(
            "picked adapter {name} ({backend})",
            name = logwise::privacy::LogIt(&info.name),
            backend = logwise::privacy::LogIt(&info.backend)
        );
        Ok(UnboundDevice { adapter })
    }
}
