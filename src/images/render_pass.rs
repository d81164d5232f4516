// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Frame commands and the choreographies that produce them.
//!
//! A frame is a short list of [`FrameStep`]s: uniform slot writes interleaved with
//! driver [`Command`]s.  A [`Choreography`] turns the resources of one sample plus
//! the frame's view state into that list; the lifecycle manager then executes it in
//! order.

use glam::Mat4;

use crate::bindings::handle::Handle;
use crate::bindings::uniform_slots::{SlotError, UniformSlots};
use crate::images::view::{Projection, ViewState, aspect};

/// A pixel rectangle, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// The rect covering a `(width, height)` target.
    pub const fn full((width, height): (u32, u32)) -> Self {
        Rect::new(0, 0, width, height)
    }

    /// One past the rightmost column, saturating at `u32::MAX`.
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom row, saturating at `u32::MAX`.
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the far edges are representable.
    pub const fn fits_u32(&self) -> bool {
        self.x.checked_add(self.width).is_some() && self.y.checked_add(self.height).is_some()
    }

    /// Intersection, or `None` when empty.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
}

/// Where a command renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// The window-provided surface.
    Default,
    Offscreen(Handle),
}

/// A range of a uniform buffer bound for one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformBinding {
    pub buffer: Handle,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    pub texture: Handle,
    pub sampler: Handle,
}

/// One indexed triangle-list draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub target: FramebufferTarget,
    pub viewport: Rect,
    pub scissor: Option<Rect>,
    pub program: Handle,
    pub vertex_format: Handle,
    pub transform: UniformBinding,
    pub texture: Option<TextureBinding>,
    pub element_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Clear {
        target: FramebufferTarget,
        color: [f32; 4],
        scissor: Option<Rect>,
    },
    Draw(DrawCommand),
    /// Averages the samples of `source` into `destination` over `rect`.
    Resolve {
        source: Handle,
        destination: Handle,
        rect: Rect,
        /// The source contents are not needed afterwards.
        invalidate_source: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameStep {
    WriteSlot { slot: u32, matrix: Mat4 },
    Execute(Command),
}

/// Everything a choreography reads to plan one frame.
#[derive(Debug, Clone)]
pub struct FrameInputs<'a> {
    pub program: Handle,
    pub vertex_format: Handle,
    pub uniforms: &'a UniformSlots,
    pub element_count: u32,
    pub sampler: Option<Handle>,
    pub diffuse: Option<Handle>,
    pub colorbuffer: Option<Handle>,
    pub render: Option<Handle>,
    pub resolve: Option<Handle>,
    pub framebuffer_size: (u32, u32),
    pub projection: Projection,
    pub clear_color: [f32; 4],
    pub view: &'a ViewState,
}

/// A resource a choreography needs was never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("frame needs the {0} resource")]
pub struct MissingResource(pub &'static str);

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Missing(#[from] MissingResource),
    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// The fixed command sequence a sample renders each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choreography {
    /// Draw into a multisampled offscreen framebuffer, resolve it, then draw the
    /// resolved color buffer onto the default surface.
    MultisampleResolve,
    /// Clear and draw the whole window, then clear and draw again inside `inset`.
    SplitViewport { inset: Rect, inset_clear: [f32; 4] },
}

impl Choreography {
    /// Uniform slots one frame writes.
    pub const fn uniform_slots(&self) -> u32 {
        match self {
            Choreography::MultisampleResolve => 2,
            Choreography::SplitViewport { .. } => 1,
        }
    }

    pub const fn needs_offscreen(&self) -> bool {
        matches!(self, Choreography::MultisampleResolve)
    }

    pub fn steps(&self, inputs: &FrameInputs<'_>) -> Result<Vec<FrameStep>, PlanError> {
        match self {
            Choreography::MultisampleResolve => multisample_resolve(inputs),
            Choreography::SplitViewport { inset, inset_clear } => {
                split_viewport(inputs, *inset, *inset_clear)
            }
        }
    }
}

fn textured(
    inputs: &FrameInputs<'_>,
    texture: Option<Handle>,
    name: &'static str,
) -> Result<Option<TextureBinding>, MissingResource> {
    let texture = texture.ok_or(MissingResource(name))?;
    let sampler = inputs.sampler.ok_or(MissingResource("sampler"))?;
    Ok(Some(TextureBinding { texture, sampler }))
}

fn multisample_resolve(inputs: &FrameInputs<'_>) -> Result<Vec<FrameStep>, PlanError> {
    let render = inputs.render.ok_or(MissingResource("render framebuffer"))?;
    let resolve = inputs.resolve.ok_or(MissingResource("resolve framebuffer"))?;
    let offscreen_rect = Rect::full(inputs.framebuffer_size);
    let window_rect = Rect::full(inputs.view.window_size);
    let offscreen = FramebufferTarget::Offscreen(render);

    let offscreen_transform = inputs.projection.transform(
        aspect(inputs.framebuffer_size),
        inputs.view,
        Mat4::IDENTITY,
    );
    let window_transform = inputs.projection.transform(
        inputs.view.aspect(),
        inputs.view,
        Mat4::from_scale(glam::Vec3::splat(2.0)),
    );

    let draw = |target: FramebufferTarget,
                viewport: Rect,
                slot: u32,
                texture: Option<TextureBinding>|
     -> Result<FrameStep, PlanError> {
        Ok(FrameStep::Execute(Command::Draw(DrawCommand {
            target,
            viewport,
            scissor: None,
            program: inputs.program,
            vertex_format: inputs.vertex_format,
            transform: inputs.uniforms.binding(slot)?,
            texture,
            element_count: inputs.element_count,
        })))
    };

    Ok(vec![
        FrameStep::WriteSlot {
            slot: 0,
            matrix: offscreen_transform,
        },
        FrameStep::Execute(Command::Clear {
            target: offscreen,
            color: inputs.clear_color,
            scissor: None,
        }),
        draw(
            offscreen,
            offscreen_rect,
            0,
            textured(inputs, inputs.diffuse, "diffuse texture")?,
        )?,
        FrameStep::Execute(Command::Resolve {
            source: render,
            destination: resolve,
            rect: offscreen_rect,
            invalidate_source: true,
        }),
        FrameStep::WriteSlot {
            slot: 1,
            matrix: window_transform,
        },
        FrameStep::Execute(Command::Clear {
            target: FramebufferTarget::Default,
            color: inputs.clear_color,
            scissor: None,
        }),
        draw(
            FramebufferTarget::Default,
            window_rect,
            1,
            textured(inputs, inputs.colorbuffer, "colorbuffer texture")?,
        )?,
    ])
}

fn split_viewport(
    inputs: &FrameInputs<'_>,
    inset: Rect,
    inset_clear: [f32; 4],
) -> Result<Vec<FrameStep>, PlanError> {
    let window_rect = Rect::full(inputs.view.window_size);
    let transform = inputs
        .projection
        .transform(inputs.view.aspect(), inputs.view, Mat4::IDENTITY);
    let texture = match inputs.diffuse {
        Some(_) => textured(inputs, inputs.diffuse, "diffuse texture")?,
        None => None,
    };
    let binding = inputs.uniforms.binding(0)?;
    let draw = |rect: Rect| {
        FrameStep::Execute(Command::Draw(DrawCommand {
            target: FramebufferTarget::Default,
            viewport: rect,
            scissor: Some(rect),
            program: inputs.program,
            vertex_format: inputs.vertex_format,
            transform: binding,
            texture,
            element_count: inputs.element_count,
        }))
    };
    let mut steps = vec![
        FrameStep::WriteSlot {
            slot: 0,
            matrix: transform,
        },
        FrameStep::Execute(Command::Clear {
            target: FramebufferTarget::Default,
            color: inputs.clear_color,
            scissor: Some(window_rect),
        }),
        draw(window_rect),
    ];
    //an inset past the window edge is clipped; one wholly outside draws nothing
    if let Some(inset) = inset.intersect(&window_rect) {
        steps.push(FrameStep::Execute(Command::Clear {
            target: FramebufferTarget::Default,
            color: inset_clear,
            scissor: Some(inset),
        }));
        steps.push(draw(inset));
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::handle::{HandleAllocator, ResourceKind};

    struct Fixture {
        allocator: HandleAllocator,
        uniforms: UniformSlots,
        view: ViewState,
    }

    impl Fixture {
        fn new(slots: u32) -> Self {
            let mut allocator = HandleAllocator::new();
            let buffer = allocator.allocate(ResourceKind::Buffer);
            Fixture {
                allocator,
                uniforms: UniformSlots::new(buffer, slots, 256),
                view: ViewState::default(),
            }
        }

        fn inputs(&mut self, offscreen: bool) -> FrameInputs<'_> {
            let mut h = |k| Some(self.allocator.allocate(k));
            let program = h(ResourceKind::Program);
            let vertex_format = h(ResourceKind::VertexFormat);
            let sampler = h(ResourceKind::Sampler);
            let diffuse = h(ResourceKind::Texture);
            let (colorbuffer, render, resolve) = if offscreen {
                (
                    h(ResourceKind::Texture),
                    h(ResourceKind::Framebuffer),
                    h(ResourceKind::Framebuffer),
                )
            } else {
                (None, None, None)
            };
            FrameInputs {
                program: program.unwrap(),
                vertex_format: vertex_format.unwrap(),
                uniforms: &self.uniforms,
                element_count: 6,
                sampler,
                diffuse,
                colorbuffer,
                render,
                resolve,
                framebuffer_size: (160, 160),
                projection: Projection::ClipSpace,
                clear_color: [0.0, 0.5, 1.0, 1.0],
                view: &self.view,
            }
        }
    }

    #[test]
    fn multisample_resolve_order() {
        let mut fixture = Fixture::new(2);
        let inputs = fixture.inputs(true);
        let steps = Choreography::MultisampleResolve.steps(&inputs).unwrap();
        assert_eq!(steps.len(), 7);
        assert!(matches!(steps[0], FrameStep::WriteSlot { slot: 0, .. }));
        assert!(matches!(
            steps[3],
            FrameStep::Execute(Command::Resolve {
                invalidate_source: true,
                rect: Rect { width: 160, height: 160, .. },
                ..
            })
        ));
        assert!(matches!(steps[4], FrameStep::WriteSlot { slot: 1, .. }));
        let FrameStep::Execute(Command::Draw(first)) = &steps[2] else {
            panic!("expected a draw")
        };
        let FrameStep::Execute(Command::Draw(second)) = &steps[6] else {
            panic!("expected a draw")
        };
        assert_eq!(first.transform.offset, 0);
        assert_eq!(second.transform.offset, 256);
        assert_eq!(first.texture.unwrap().texture, inputs.diffuse.unwrap());
        assert_eq!(second.texture.unwrap().texture, inputs.colorbuffer.unwrap());
        assert_eq!(second.target, FramebufferTarget::Default);
    }

    #[test]
    fn multisample_resolve_needs_framebuffers() {
        let mut fixture = Fixture::new(2);
        let inputs = fixture.inputs(false);
        assert!(matches!(
            Choreography::MultisampleResolve.steps(&inputs),
            Err(PlanError::Missing(_))
        ));
    }

    #[test]
    fn split_viewport_clears_then_draws_inset() {
        let mut fixture = Fixture::new(1);
        let inputs = fixture.inputs(false);
        let inset = Rect::new(64, 312, 160, 120);
        let steps = Choreography::SplitViewport {
            inset,
            inset_clear: [0.0, 0.5, 1.0, 1.0],
        }
        .steps(&inputs)
        .unwrap();
        assert_eq!(steps.len(), 5);
        assert!(matches!(
            &steps[3],
            FrameStep::Execute(Command::Clear { scissor: Some(r), .. }) if *r == inset
        ));
        let FrameStep::Execute(Command::Draw(draw)) = &steps[4] else {
            panic!("expected a draw")
        };
        assert_eq!(draw.viewport, inset);
        assert_eq!(draw.scissor, Some(inset));
    }

    #[test]
    fn rect_math() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(&Rect::new(5, 5, 10, 10)), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersect(&Rect::new(10, 0, 5, 5)), None);
        assert!(a.contains(9, 9));
        assert!(!a.contains(10, 0));
    }

    #[test]
    fn far_rects_saturate() {
        let far = Rect::new(u32::MAX - 5, u32::MAX - 5, 100, 100);
        assert!(!far.fits_u32());
        assert_eq!(far.right(), u32::MAX);
        assert_eq!(far.intersect(&Rect::full((640, 480))), None);
        assert!(!far.contains(10, 10));
        assert!(far.contains(u32::MAX - 1, u32::MAX - 1));
    }

    #[test]
    fn split_viewport_clips_inset_to_window() {
        let mut fixture = Fixture::new(1);
        let inputs = fixture.inputs(false);
        let straddling = Choreography::SplitViewport {
            inset: Rect::new(600, 400, 160, 120),
            inset_clear: [0.0; 4],
        }
        .steps(&inputs)
        .unwrap();
        let FrameStep::Execute(Command::Draw(draw)) = &straddling[4] else {
            panic!("expected a draw")
        };
        assert_eq!(draw.viewport, Rect::new(600, 400, 40, 80));

        let outside = Choreography::SplitViewport {
            inset: Rect::new(4000, 4000, 160, 120),
            inset_clear: [0.0; 4],
        }
        .steps(&inputs)
        .unwrap();
        assert_eq!(outside.len(), 3);
    }
}
