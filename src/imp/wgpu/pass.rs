// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Encoding one command as a render pass.

use crate::images::render_pass::Rect;

fn color([r, g, b, a]: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

fn attachment<'a>(
    view: &'a wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPassColorAttachment<'a> {
    wgpu::RenderPassColorAttachment {
        view,
        depth_slice: None,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
    }
}

fn begin<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    attachment: wgpu::RenderPassColorAttachment<'_>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(attachment)],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

/// Clears the whole attachment.
pub(super) fn clear(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, rgba: [f32; 4]) {
    let _pass = begin(
        encoder,
        "clear",
        attachment(view, wgpu::LoadOp::Clear(color(rgba))),
    );
}

/// Clears `rect` only, by drawing the blend constant through `pipeline`.
pub(super) fn scissored_clear(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    rgba: [f32; 4],
    rect: Rect,
) {
    let mut pass = begin(encoder, "scissored clear", attachment(view, wgpu::LoadOp::Load));
    pass.set_pipeline(pipeline);
    pass.set_blend_constant(color(rgba));
    pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
    pass.draw(0..3, 0..1);
}

pub(super) struct DrawPass<'a> {
    pub(super) view: &'a wgpu::TextureView,
    pub(super) pipeline: &'a wgpu::RenderPipeline,
    pub(super) bind_group: &'a wgpu::BindGroup,
    pub(super) vertices: &'a wgpu::Buffer,
    pub(super) elements: &'a wgpu::Buffer,
    pub(super) viewport: Rect,
    pub(super) scissor: Rect,
    pub(super) element_count: u32,
}

pub(super) fn draw(encoder: &mut wgpu::CommandEncoder, draw: &DrawPass<'_>) {
    let mut pass = begin(encoder, "draw", attachment(draw.view, wgpu::LoadOp::Load));
    pass.set_pipeline(draw.pipeline);
    pass.set_bind_group(0, draw.bind_group, &[]);
    pass.set_viewport(
        draw.viewport.x as f32,
        draw.viewport.y as f32,
        draw.viewport.width as f32,
        draw.viewport.height as f32,
        0.0,
        1.0,
    );
    pass.set_scissor_rect(
        draw.scissor.x,
        draw.scissor.y,
        draw.scissor.width,
        draw.scissor.height,
    );
    pass.set_vertex_buffer(0, draw.vertices.slice(..));
    pass.set_index_buffer(draw.elements.slice(..), wgpu::IndexFormat::Uint16);
    pass.draw_indexed(0..draw.element_count, 0, 0..1);
}

/// Resolves the multisampled `source` into `destination` with an empty pass.
pub(super) fn resolve(
    encoder: &mut wgpu::CommandEncoder,
    source: &wgpu::TextureView,
    destination: &wgpu::TextureView,
    invalidate_source: bool,
) {
    let store = if invalidate_source {
        wgpu::StoreOp::Discard
    } else {
        wgpu::StoreOp::Store
    };
    let _pass = begin(
        encoder,
        "resolve",
        wgpu::RenderPassColorAttachment {
            view: source,
            depth_slice: None,
            resolve_target: Some(destination),
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store,
            },
        },
    );
}
