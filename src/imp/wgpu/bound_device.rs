// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::wgpu::unbound_device::UnboundDevice;
use crate::imp::{Error, Limits};
use wgpu::Trace;

/// An opened device and its queue.
#[derive(Debug)]
pub(crate) struct BoundDevice {
    pub(super) device: wgpu::Device,
    pub(super) queue: wgpu::Queue,
    pub(super) adapter_name: String,
}

impl BoundDevice {
    pub(crate) async fn bind(unbound_device: UnboundDevice) -> Result<Self, Error> {
        let adapter = unbound_device.adapter;
        let mut required_features = wgpu::Features::empty();
        //block-compressed textures and border sampling are optional
        for optional in [
            wgpu::Features::TEXTURE_COMPRESSION_BC,
            wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER,
        ] {
            if adapter.features().contains(optional) {
                required_features |= optional;
            }
        }
        let descriptor = wgpu::DeviceDescriptor {
            label: wgpu::Label::from("frames_and_samples device"),
            required_features,
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter
            .request_device(&descriptor)
            .await
            .map_err(|e| Error::RequestDevice(e.to_string()))?;
        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            logwise::error_sync!(
                "uncaptured wgpu error: {error}",
                error = logwise::privacy::LogIt(&error.to_string())
            );
        }));
        Ok(BoundDevice {
            device,
            queue,
            adapter_name: adapter.get_info().name,
        })
    }

    pub(crate) fn limits(&self) -> Limits {
        let limits = self.device.limits();
        Limits {
            min_uniform_buffer_offset_alignment: limits.min_uniform_buffer_offset_alignment,
            //without adapter-specific format features only 1x and 4x are guaranteed
            max_samples: 4,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
        }
    }

    pub(crate) fn supports(&self, feature: wgpu::Features) -> bool {
        self.device.features().contains(feature)
    }
}
