// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::sampler::{
    AddressMode, BorderColor, CompareFunction, Filter, SamplerDescriptor,
};

const fn filter(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    }
}

const fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        AddressMode::ClampToBorder => wgpu::AddressMode::ClampToBorder,
    }
}

const fn border_color(color: BorderColor) -> wgpu::SamplerBorderColor {
    match color {
        BorderColor::TransparentBlack => wgpu::SamplerBorderColor::TransparentBlack,
        BorderColor::OpaqueBlack => wgpu::SamplerBorderColor::OpaqueBlack,
        BorderColor::OpaqueWhite => wgpu::SamplerBorderColor::OpaqueWhite,
    }
}

const fn compare(function: CompareFunction) -> wgpu::CompareFunction {
    match function {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub(super) fn create(device: &wgpu::Device, descriptor: &SamplerDescriptor) -> wgpu::Sampler {
    let mode = address_mode(descriptor.address_mode);
    let s = wgpu::SamplerDescriptor {
        label: Some(&descriptor.label),
        address_mode_u: mode,
        address_mode_v: mode,
        address_mode_w: mode,
        mag_filter: filter(descriptor.mag_filter),
        min_filter: filter(descriptor.min_filter),
        mipmap_filter: filter(descriptor.mipmap_filter),
        lod_min_clamp: descriptor.lod_min_clamp,
        lod_max_clamp: descriptor.lod_max_clamp,
        compare: descriptor.compare.map(compare),
        anisotropy_clamp: 1,
        border_color: (descriptor.address_mode == AddressMode::ClampToBorder)
            .then(|| border_color(descriptor.border_color)),
    };
    device.create_sampler(&s)
}
