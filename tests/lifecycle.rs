//! Lifecycle properties checked against the software driver's call trace.

use frames_and_samples::bindings::framebuffer::FramebufferStatus;
use frames_and_samples::bindings::handle::Handle;
use frames_and_samples::bindings::resource_set::{BufferRole, FramebufferRole, TextureRole};
use frames_and_samples::bindings::texture_source::{MipLevel, TextureSource};
use frames_and_samples::bindings::uniform_slots::SlotError;
use frames_and_samples::images::config::{ConfigError, SampleConfig};
use frames_and_samples::images::lifecycle::{FrameError, InitError, Lifecycle, LifecycleState};
use frames_and_samples::images::render_pass::{
    Choreography, Command, DrawCommand, FramebufferTarget, Rect, TextureBinding,
};
use frames_and_samples::images::samples;
use frames_and_samples::images::shader::{ShaderSource, ShaderStage};
use frames_and_samples::images::view::{Projection, ViewState};
use frames_and_samples::pixel_formats::PixelFormat;
use frames_and_samples::{Call, Driver, DriverError, SoftwareDriver};
use glam::Mat4;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn checkerboard_sample() -> SampleConfig {
    let mut config = samples::direct_state_access(TextureSource::checkerboard(RED, BLUE)).unwrap();
    //positions are already clip space, so pixel (0, 0) lands on texel (0, 0)
    config.projection = Projection::ClipSpace;
    config
}

fn lifecycle() -> Lifecycle<SoftwareDriver> {
    Lifecycle::new(SoftwareDriver::new(640, 480))
}

fn uploads(driver: &SoftwareDriver) -> Vec<(u32, u32, u32, usize, bool)> {
    driver
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::UploadLevel {
                level,
                width,
                height,
                bytes,
                compressed,
                ..
            } => Some((*level, *width, *height, *bytes, *compressed)),
            _ => None,
        })
        .collect()
}

fn deletes(driver: &SoftwareDriver) -> Vec<Handle> {
    driver
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::Delete(h) => Some(*h),
            _ => None,
        })
        .collect()
}

#[test]
fn uncompressed_sources_upload_every_level() {
    let source = TextureSource::from_rgba8(8, 8, vec![200; 8 * 8 * 4])
        .unwrap()
        .with_generated_mips();
    assert_eq!(source.levels(), 4);
    let config = samples::direct_state_access(source).unwrap();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    assert_eq!(
        uploads(lifecycle.driver()),
        vec![
            (0, 8, 8, 256, false),
            (1, 4, 4, 64, false),
            (2, 2, 2, 16, false),
            (3, 1, 1, 4, false),
        ]
    );
}

#[test]
fn compressed_sources_upload_blocks_per_level() {
    let levels = [(8, 8, 32), (4, 4, 8), (2, 2, 8), (1, 1, 8)]
        .into_iter()
        .map(|(width, height, bytes)| MipLevel {
            width,
            height,
            data: vec![0; bytes],
        })
        .collect();
    let source = TextureSource::new(PixelFormat::BC1RGBAUnorm, levels).unwrap();
    let config = samples::direct_state_access(source).unwrap();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    assert_eq!(
        uploads(lifecycle.driver()),
        vec![
            (0, 8, 8, 32, true),
            (1, 4, 4, 8, true),
            (2, 2, 2, 8, true),
            (3, 1, 1, 8, true),
        ]
    );
}

#[test]
fn failed_initialize_releases_what_it_created() {
    let config = checkerboard_sample();
    let created = {
        let mut lifecycle = lifecycle();
        lifecycle.initialize(&config).unwrap();
        lifecycle.resources().unwrap().live()
    };
    assert_eq!(created, 11);
    for allowed in 0..created {
        let mut driver = SoftwareDriver::new(640, 480);
        driver.fail_creation_after(allowed);
        let mut lifecycle = Lifecycle::new(driver);
        let err = lifecycle.initialize(&config).unwrap_err();
        assert!(
            matches!(err, InitError::ResourceCreation(_)),
            "{allowed}: {err}"
        );
        assert_eq!(lifecycle.state(), LifecycleState::TornDown);
        assert!(lifecycle.resources().is_none());

        let driver = lifecycle.driver();
        assert_eq!(driver.live_handles(), 0, "{allowed} creations leaked");
        let deleted = deletes(driver);
        let mut unique = deleted.clone();
        unique.sort_by_key(|h| h.id());
        unique.dedup();
        assert_eq!(unique.len(), deleted.len(), "double delete");
        assert_eq!(deleted.len(), allowed);

        //the transform buffer is unmapped before it is deleted
        let calls = driver.calls();
        if let Some(unmap) = calls.iter().position(|c| matches!(c, Call::Unmap(_))) {
            let Call::Unmap(transform) = calls[unmap] else {
                unreachable!()
            };
            let delete = calls
                .iter()
                .position(|c| *c == Call::Delete(transform))
                .unwrap();
            assert!(unmap < delete);
        }

        let before = lifecycle.driver().calls().len();
        lifecycle.teardown();
        assert_eq!(lifecycle.driver().calls().len(), before);
    }
}

#[test]
fn teardown_deletes_everything_once() {
    let config = checkerboard_sample();
    let mut lifecycle = lifecycle();
    let live = lifecycle.initialize(&config).unwrap().live();
    lifecycle.render_frame(&ViewState::default()).unwrap();
    lifecycle.teardown();
    lifecycle.teardown();
    let driver = lifecycle.driver();
    assert_eq!(driver.live_handles(), 0);
    assert_eq!(deletes(driver).len(), live);
    let unmaps = driver
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Unmap(_)))
        .count();
    assert_eq!(unmaps, 1);
}

#[test]
fn uniform_slots_are_isolated() {
    let config = checkerboard_sample();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    let slots = lifecycle.resources().unwrap().uniforms().unwrap().clone();
    assert_eq!(slots.count(), 2);
    assert_eq!(slots.stride(), 256);

    let first = Mat4::from_scale(glam::Vec3::splat(3.0));
    let second = Mat4::from_rotation_z(1.0);
    slots.write_matrix(lifecycle.driver_mut(), 0, &first).unwrap();
    slots.write_matrix(lifecycle.driver_mut(), 1, &second).unwrap();
    assert_eq!(slots.read_matrix(lifecycle.driver(), 0).unwrap(), first);
    assert_eq!(slots.read_matrix(lifecycle.driver(), 1).unwrap(), second);

    slots
        .write_matrix(lifecycle.driver_mut(), 1, &Mat4::IDENTITY)
        .unwrap();
    assert_eq!(slots.read_matrix(lifecycle.driver(), 0).unwrap(), first);

    assert!(matches!(
        slots.write_matrix(lifecycle.driver_mut(), 2, &first),
        Err(SlotError::OutOfRange { slot: 2, count: 2 })
    ));
}

#[test]
fn zero_samples_is_an_incomplete_framebuffer() {
    let mut config = checkerboard_sample();
    config.samples = 0;
    let mut lifecycle = lifecycle();
    let err = lifecycle.initialize(&config).unwrap_err();
    assert!(matches!(
        err,
        InitError::FramebufferIncomplete {
            role: FramebufferRole::Render,
            status: FramebufferStatus::IncompleteMultisample,
        }
    ));
    assert_eq!(lifecycle.driver().live_handles(), 0);
}

#[test]
fn mismatched_resolve_size_is_an_incomplete_framebuffer() {
    let mut config = checkerboard_sample();
    config.resolve_size = Some((80, 80));
    let mut lifecycle = lifecycle();
    let err = lifecycle.initialize(&config).unwrap_err();
    assert!(matches!(
        err,
        InitError::FramebufferIncomplete {
            role: FramebufferRole::Resolve,
            status: FramebufferStatus::IncompleteDimensions,
        }
    ));
    assert_eq!(lifecycle.driver().live_handles(), 0);
}

#[test]
fn sample_counts_over_the_limit_are_unsupported() {
    let mut config = checkerboard_sample();
    config.samples = 16;
    let mut lifecycle = lifecycle();
    assert!(matches!(
        lifecycle.initialize(&config),
        Err(InitError::FramebufferIncomplete {
            status: FramebufferStatus::Unsupported,
            ..
        })
    ));
}

#[test]
fn rendering_before_initialize_never_reaches_the_driver() {
    let mut lifecycle = lifecycle();
    assert!(matches!(
        lifecycle.render_frame(&ViewState::default()),
        Err(FrameError::NotReady(LifecycleState::Uninitialized))
    ));
    assert!(lifecycle.driver().calls().is_empty());

    lifecycle.initialize(&checkerboard_sample()).unwrap();
    lifecycle.teardown();
    lifecycle.driver_mut().clear_calls();
    assert!(matches!(
        lifecycle.render_frame(&ViewState::default()),
        Err(FrameError::NotReady(LifecycleState::TornDown))
    ));
    assert!(lifecycle.driver().calls().is_empty());
}

#[test]
fn initialize_only_runs_once() {
    let config = checkerboard_sample();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    assert!(matches!(
        lifecycle.initialize(&config),
        Err(InitError::InvalidState(LifecycleState::Ready))
    ));
}

#[test]
fn compile_errors_name_the_stage() {
    let mut config = checkerboard_sample();
    config.vertex_shader = ShaderSource::embedded("broken", "@vertex fn vs_main( {");
    let mut lifecycle = lifecycle();
    let err = lifecycle.initialize(&config).unwrap_err();
    assert!(matches!(
        err,
        InitError::Compile {
            stage: ShaderStage::Vertex,
            ..
        }
    ));
    assert_eq!(lifecycle.driver().live_handles(), 0);
}

#[test]
fn missing_shader_files_are_load_errors() {
    let mut config = checkerboard_sample();
    config.fragment_shader = ShaderSource::path("no-such-shader.frag.wgsl");
    let mut lifecycle = lifecycle();
    assert!(matches!(
        lifecycle.initialize(&config),
        Err(InitError::Load(_))
    ));
}

#[test]
fn multisample_resolve_frame_order() {
    let config = checkerboard_sample();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    let resources = lifecycle.resources().unwrap();
    let render = resources.framebuffer(FramebufferRole::Render).unwrap();
    let resolve = resources.framebuffer(FramebufferRole::Resolve).unwrap();
    let diffuse = resources.texture(TextureRole::Diffuse).unwrap();
    let colorbuffer = resources.texture(TextureRole::Colorbuffer).unwrap();
    assert!(resources.buffer(BufferRole::Transform).is_some());
    lifecycle.driver_mut().clear_calls();

    lifecycle.render_frame(&ViewState::default()).unwrap();
    let calls = lifecycle.driver().calls();
    assert_eq!(calls.len(), 6);
    assert!(matches!(
        calls[0],
        Call::Clear {
            target: FramebufferTarget::Offscreen(t),
            scissor: None,
        } if t == render
    ));
    assert!(matches!(
        calls[1],
        Call::Draw {
            target: FramebufferTarget::Offscreen(t),
            transform_offset: 0,
            texture: Some(tex),
            element_count: 6,
            ..
        } if t == render && tex == diffuse
    ));
    assert_eq!(
        calls[2],
        Call::Resolve {
            source: render,
            destination: resolve,
            invalidate_source: true,
        }
    );
    assert!(matches!(
        calls[3],
        Call::Clear {
            target: FramebufferTarget::Default,
            ..
        }
    ));
    assert!(matches!(
        calls[4],
        Call::Draw {
            target: FramebufferTarget::Default,
            transform_offset: 256,
            texture: Some(tex),
            ..
        } if tex == colorbuffer
    ));
    assert_eq!(calls[5], Call::EndFrame);
    assert_eq!(lifecycle.frames_rendered(), 1);
}

#[test]
fn checkerboard_survives_the_resolve() {
    let config = checkerboard_sample();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    lifecycle.render_frame(&ViewState::default()).unwrap();
    let resolve = lifecycle
        .resources()
        .unwrap()
        .framebuffer(FramebufferRole::Resolve)
        .unwrap();
    let corners = lifecycle
        .read_pixels(FramebufferTarget::Offscreen(resolve), Rect::new(0, 0, 1, 1))
        .unwrap();
    assert_eq!(corners, vec![RED]);
    let right = lifecycle
        .read_pixels(FramebufferTarget::Offscreen(resolve), Rect::new(159, 0, 1, 1))
        .unwrap();
    assert_eq!(right, vec![BLUE]);

    //the window pass draws the resolved image scaled past the window's edges
    let window = lifecycle
        .read_pixels(FramebufferTarget::Default, Rect::new(0, 0, 1, 1))
        .unwrap();
    assert_eq!(window, vec![RED]);
}

#[test]
fn split_viewport_clears_and_draws_the_inset() {
    let config = samples::viewport().unwrap();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    lifecycle.driver_mut().clear_calls();
    lifecycle.render_frame(&ViewState::default()).unwrap();

    let inset = samples::VIEWPORT_INSET;
    let calls = lifecycle.driver().calls();
    assert!(calls.contains(&Call::Clear {
        target: FramebufferTarget::Default,
        scissor: Some(inset),
    }));
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::Draw { viewport, .. } if *viewport == inset
    )));

    let pixel = |lifecycle: &mut Lifecycle<SoftwareDriver>, x, y| {
        lifecycle
            .read_pixels(FramebufferTarget::Default, Rect::new(x, y, 1, 1))
            .unwrap()[0]
    };
    let orange = [255, 128, 0, 255];
    assert_eq!(pixel(&mut lifecycle, 0, 0), [0, 0, 0, 255]);
    assert_eq!(pixel(&mut lifecycle, 320, 240), orange);
    assert_eq!(pixel(&mut lifecycle, inset.x, inset.y), [0, 128, 255, 255]);
    assert_eq!(
        pixel(
            &mut lifecycle,
            inset.x + inset.width / 2,
            inset.y + inset.height / 2
        ),
        orange
    );
}

#[test]
fn teardown_empties_the_driver() {
    let config = samples::viewport().unwrap();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    assert!(lifecycle.driver().live_handles() > 0);
    lifecycle.teardown();
    assert_eq!(lifecycle.driver().live_handles(), 0);
    assert_eq!(lifecycle.driver().limits().max_samples, 4);
}

#[test]
fn insets_past_the_coordinate_range_are_rejected() {
    let mut config = samples::viewport().unwrap();
    config.choreography = Choreography::SplitViewport {
        inset: Rect::new(u32::MAX - 10, 0, 160, 120),
        inset_clear: [0.0; 4],
    };
    let mut lifecycle = lifecycle();
    assert!(matches!(
        lifecycle.initialize(&config),
        Err(InitError::InvalidConfig(ConfigError::InsetOutOfRange(_)))
    ));
    assert_eq!(lifecycle.driver().live_handles(), 0);
}

#[test]
fn insets_outside_the_window_draw_nothing() {
    let mut config = samples::viewport().unwrap();
    config.choreography = Choreography::SplitViewport {
        inset: Rect::new(u32::MAX - 200, u32::MAX - 200, 160, 120),
        inset_clear: [0.0; 4],
    };
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    lifecycle.driver_mut().clear_calls();
    lifecycle.render_frame(&ViewState::default()).unwrap();
    let draws = lifecycle.driver().calls().iter().filter(|c| c.is_draw()).count();
    assert_eq!(draws, 1);
}

#[test]
fn far_readback_rects_are_errors() {
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&samples::viewport().unwrap()).unwrap();
    lifecycle.render_frame(&ViewState::default()).unwrap();
    assert!(matches!(
        lifecycle.read_pixels(
            FramebufferTarget::Default,
            Rect::new(u32::MAX - 1, 0, 10, 1)
        ),
        Err(FrameError::Driver(DriverError::Validation(_)))
    ));
}

#[test]
fn oversized_windows_are_clamped_to_the_surface() {
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&samples::viewport().unwrap()).unwrap();
    lifecycle.driver_mut().clear_calls();
    let view = ViewState::default().with_window_size(1280, 960);
    lifecycle.render_frame(&view).unwrap();
    let full = Rect::full((640, 480));
    assert!(lifecycle.driver().calls().contains(&Call::Clear {
        target: FramebufferTarget::Default,
        scissor: Some(full),
    }));
    assert!(lifecycle.driver().calls().iter().any(|c| matches!(
        c,
        Call::Draw { viewport, .. } if *viewport == full
    )));
}

#[test]
fn offscreen_draws_sample_another_texture() {
    let config = checkerboard_sample();
    let mut lifecycle = lifecycle();
    lifecycle.initialize(&config).unwrap();
    let resources = lifecycle.resources().unwrap();
    let resolve = resources.framebuffer(FramebufferRole::Resolve).unwrap();
    let diffuse = resources.texture(TextureRole::Diffuse).unwrap();
    let colorbuffer = resources.texture(TextureRole::Colorbuffer).unwrap();
    let sampler = resources.sampler().unwrap();
    let program = resources.program().unwrap();
    let vertex_format = resources.vertex_format().unwrap();
    let slots = resources.uniforms().unwrap().clone();
    let transform = slots.binding(0).unwrap();
    slots
        .write_matrix(lifecycle.driver_mut(), 0, &Mat4::IDENTITY)
        .unwrap();
    let draw = |texture| {
        Command::Draw(DrawCommand {
            target: FramebufferTarget::Offscreen(resolve),
            viewport: Rect::full((160, 160)),
            scissor: None,
            program,
            vertex_format,
            transform,
            texture: Some(TextureBinding { texture, sampler }),
            element_count: 6,
        })
    };

    let source_before = lifecycle.driver().texture_pixels(diffuse, 0).unwrap();
    lifecycle.driver_mut().execute(&draw(diffuse)).unwrap();
    assert_eq!(
        lifecycle.driver().texture_pixels(diffuse, 0).unwrap(),
        source_before
    );
    assert_eq!(
        lifecycle.driver().texture_pixels(colorbuffer, 0).unwrap()[0],
        RED
    );

    //rendering into the texture being sampled is refused
    assert!(matches!(
        lifecycle.driver_mut().execute(&draw(colorbuffer)),
        Err(DriverError::Validation(_))
    ));
}
