// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Triangle rasterization for the software driver.
//!
//! Coverage is tested at each sample position of each pixel with inclusive edges, and
//! every covered sample is shaded on its own.  Varyings are interpolated
//! perspective-correctly.  There is no depth test, no blending and no clipping:
//! triangles with a vertex at or behind the eye are skipped.

use glam::{Vec2, Vec4};

use crate::bindings::software::texture::{Image, Texel};
use crate::images::render_pass::Rect;

/// A vertex after the transform stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RasterVertex {
    pub clip: Vec4,
    pub varying: Vec4,
}

/// Sample offsets within a pixel, in the standard multisample pattern.
pub(crate) fn sample_positions(samples: u32) -> Vec<Vec2> {
    match samples {
        0 | 1 => vec![Vec2::splat(0.5)],
        2 => vec![Vec2::new(0.75, 0.75), Vec2::new(0.25, 0.25)],
        4 => vec![
            Vec2::new(0.375, 0.125),
            Vec2::new(0.875, 0.375),
            Vec2::new(0.125, 0.625),
            Vec2::new(0.625, 0.875),
        ],
        n => (0..n)
            .map(|i| Vec2::splat((i as f32 + 0.5) / n as f32))
            .collect(),
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Counts from one [`draw_triangles`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RasterStats {
    pub triangles: u32,
    pub skipped: u32,
    pub samples_shaded: u64,
}

/**
Rasterizes a triangle list into `target`.

`viewport` maps normalized device coordinates to pixels (y down); only pixels inside
`bounds` are touched.  `shade` turns an interpolated varying into linear RGBA.
*/
pub(crate) fn draw_triangles<F: FnMut(Vec4) -> [f32; 4]>(
    target: &mut Image,
    viewport: Rect,
    bounds: Rect,
    vertices: &[RasterVertex],
    mut shade: F,
) -> RasterStats {
    let mut stats = RasterStats::default();
    let positions = sample_positions(target.samples());
    let to_screen = |clip: Vec4| {
        let ndc = clip / clip.w;
        Vec2::new(
            viewport.x as f32 + (ndc.x * 0.5 + 0.5) * viewport.width as f32,
            viewport.y as f32 + (0.5 - ndc.y * 0.5) * viewport.height as f32,
        )
    };
    for triangle in vertices.chunks_exact(3) {
        stats.triangles += 1;
        if triangle.iter().any(|v| v.clip.w <= f32::EPSILON) {
            stats.skipped += 1;
            continue;
        }
        let screen = [
            to_screen(triangle[0].clip),
            to_screen(triangle[1].clip),
            to_screen(triangle[2].clip),
        ];
        let area = edge(screen[0], screen[1], screen[2]);
        if area == 0.0 {
            stats.skipped += 1;
            continue;
        }
        let inverse_w = [
            1.0 / triangle[0].clip.w,
            1.0 / triangle[1].clip.w,
            1.0 / triangle[2].clip.w,
        ];
        let min = screen[0].min(screen[1]).min(screen[2]);
        let max = screen[0].max(screen[1]).max(screen[2]);
        let x0 = (min.x.floor().max(0.0) as u32).max(bounds.x);
        let y0 = (min.y.floor().max(0.0) as u32).max(bounds.y);
        let x1 = (max.x.ceil().max(0.0) as u32).min(bounds.right());
        let y1 = (max.y.ceil().max(0.0) as u32).min(bounds.bottom());
        for y in y0..y1 {
            for x in x0..x1 {
                for (sample, offset) in positions.iter().enumerate() {
                    let p = Vec2::new(x as f32, y as f32) + *offset;
                    let b = [
                        edge(screen[1], screen[2], p) / area,
                        edge(screen[2], screen[0], p) / area,
                        edge(screen[0], screen[1], p) / area,
                    ];
                    if b.iter().any(|w| *w < 0.0) {
                        continue;
                    }
                    let weights = [b[0] * inverse_w[0], b[1] * inverse_w[1], b[2] * inverse_w[2]];
                    let denominator = weights[0] + weights[1] + weights[2];
                    let varying = (triangle[0].varying * weights[0]
                        + triangle[1].varying * weights[1]
                        + triangle[2].varying * weights[2])
                        / denominator;
                    target.write(Texel { x, y }, sample as u32, shade(varying));
                    stats.samples_shaded += 1;
                }
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::PixelFormat;

    fn vertex(x: f32, y: f32, u: f32) -> RasterVertex {
        RasterVertex {
            clip: Vec4::new(x, y, 0.0, 1.0),
            varying: Vec4::new(u, 0.0, 0.0, 1.0),
        }
    }

    #[test]
    fn full_screen_triangle_covers_every_sample() {
        let mut image = Image::new(PixelFormat::RGBA8UNorm, 4, 4, 4);
        let rect = Rect::full((4, 4));
        let stats = draw_triangles(
            &mut image,
            rect,
            rect,
            &[vertex(-1.0, -1.0, 0.0), vertex(3.0, -1.0, 0.0), vertex(-1.0, 3.0, 0.0)],
            |_| [1.0, 1.0, 1.0, 1.0],
        );
        assert_eq!(stats.samples_shaded, 4 * 4 * 4);
        assert_eq!(image.resolve_pixel(Texel { x: 3, y: 3 }), Some([1.0; 4]));
    }

    #[test]
    fn bounds_limit_writes() {
        let mut image = Image::new(PixelFormat::RGBA8UNorm, 4, 4, 1);
        let stats = draw_triangles(
            &mut image,
            Rect::full((4, 4)),
            Rect::new(0, 0, 2, 2),
            &[vertex(-1.0, -1.0, 0.0), vertex(3.0, -1.0, 0.0), vertex(-1.0, 3.0, 0.0)],
            |_| [1.0, 1.0, 1.0, 1.0],
        );
        assert_eq!(stats.samples_shaded, 4);
        assert_eq!(image.read_rgba8(Texel { x: 3, y: 0 }, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn varyings_interpolate_left_to_right() {
        let mut image = Image::new(PixelFormat::RGBA8UNorm, 4, 1, 1);
        let rect = Rect::full((4, 1));
        draw_triangles(
            &mut image,
            rect,
            rect,
            &[vertex(-1.0, -3.0, 0.0), vertex(1.0, -3.0, 1.0), vertex(-1.0, 3.0, 0.0),
              vertex(1.0, -3.0, 1.0), vertex(1.0, 3.0, 1.0), vertex(-1.0, 3.0, 0.0)],
            |v| [v.x, 0.0, 0.0, 1.0],
        );
        let reds: Vec<u8> = (0..4)
            .map(|x| image.read_rgba8(Texel { x, y: 0 }, 0).map_or(0, |p| p[0]))
            .collect();
        assert!(reds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn vertices_behind_the_eye_are_skipped() {
        let mut image = Image::new(PixelFormat::RGBA8UNorm, 2, 2, 1);
        let rect = Rect::full((2, 2));
        let mut behind = vertex(0.0, 0.0, 0.0);
        behind.clip.w = -1.0;
        let stats = draw_triangles(
            &mut image,
            rect,
            rect,
            &[behind, vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0)],
            |_| [1.0; 4],
        );
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.samples_shaded, 0);
    }
}
