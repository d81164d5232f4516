// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The frame resource lifecycle manager.

[`Lifecycle`] owns one [`Driver`] and the [`ResourceSet`] of one sample.  It creates every
resource in [`Lifecycle::initialize`], renders with them in [`Lifecycle::render_frame`],
and releases them in [`Lifecycle::teardown`] or on drop.

```
use frames_and_samples::images::lifecycle::{Lifecycle, LifecycleState};
use frames_and_samples::images::samples;
use frames_and_samples::images::view::ViewState;
use frames_and_samples::bindings::texture_source::TextureSource;
use frames_and_samples::SoftwareDriver;

let config = samples::direct_state_access(
    TextureSource::checkerboard([255, 0, 0, 255], [0, 0, 255, 255]),
).unwrap();
let mut lifecycle = Lifecycle::new(SoftwareDriver::new(640, 480));
lifecycle.initialize(&config).unwrap();
lifecycle.render_frame(&ViewState::default()).unwrap();
lifecycle.teardown();
assert_eq!(lifecycle.state(), LifecycleState::TornDown);
```
*/

use std::fmt::{Display, Formatter};

use crate::bindings::framebuffer::{FramebufferDescriptor, FramebufferStatus};
use crate::bindings::handle::Handle;
use crate::bindings::resource_set::{BufferRole, FramebufferRole, ResourceSet, Role, TextureRole};
use crate::bindings::texture_builder::{TextureBuilder, TextureKind};
use crate::bindings::uniform_slots::{SlotError, UniformSlots};
use crate::bindings::visible_to::BufferUsage;
use crate::images::config::{ConfigError, SampleConfig};
use crate::images::render_pass::{
    Choreography, FrameInputs, FrameStep, FramebufferTarget, PlanError, Rect,
};
use crate::images::shader::ShaderStage;
use crate::images::view::{Projection, ViewState};
use crate::imp::{BufferDescriptor, Driver, Error, LevelUpload, ProgramDescriptor};
use crate::load::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Rendering,
    TornDown,
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Ready => "ready",
            LifecycleState::Rendering => "rendering",
            LifecycleState::TornDown => "torn down",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InitError {
    #[error("{stage} shader `{label}` failed to compile: {message}")]
    Compile {
        label: String,
        stage: ShaderStage,
        message: String,
    },
    #[error("resource creation failed: {0}")]
    ResourceCreation(Error),
    #[error("{role:?} framebuffer is incomplete: {status}")]
    FramebufferIncomplete {
        role: FramebufferRole,
        status: FramebufferStatus,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error("initialize called while {0}")]
    InvalidState(LifecycleState),
}

impl From<Error> for InitError {
    fn from(e: Error) -> Self {
        match e {
            Error::Compile {
                label,
                stage,
                message,
            } => InitError::Compile {
                label,
                stage,
                message,
            },
            other => InitError::ResourceCreation(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    #[error("can't render while {0}")]
    NotReady(LifecycleState),
    #[error(transparent)]
    Driver(#[from] Error),
    #[error(transparent)]
    Slot(#[from] SlotError),
}

impl From<PlanError> for FrameError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Slot(s) => FrameError::Slot(s),
            //resources are only ever missing when the manager isn't ready
            PlanError::Missing(m) => {
                logwise::error_sync!("{m}", m = logwise::privacy::LogIt(&m));
                FrameError::NotReady(LifecycleState::Initializing)
            }
        }
    }
}

/// What a frame needs from the config, kept after initialization.
#[derive(Debug, Clone)]
struct FramePlan {
    choreography: Choreography,
    projection: Projection,
    clear_color: [f32; 4],
    framebuffer_size: (u32, u32),
    element_count: u32,
}

/// Creates, renders with, and releases the GPU resources of one sample.
#[derive(Debug)]
pub struct Lifecycle<D: Driver> {
    driver: D,
    state: LifecycleState,
    resources: Option<ResourceSet>,
    plan: Option<FramePlan>,
    frames_rendered: u64,
}

impl<D: Driver> Lifecycle<D> {
    pub fn new(driver: D) -> Self {
        Lifecycle {
            driver,
            state: LifecycleState::Uninitialized,
            resources: None,
            plan: None,
            frames_rendered: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The live resources, between a successful initialize and teardown.
    pub fn resources(&self) -> Option<&ResourceSet> {
        self.resources.as_ref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Creates every resource `config` calls for.
    ///
    /// On failure, everything created so far is released and the manager is
    /// torn down.
    pub fn initialize(&mut self, config: &SampleConfig) -> Result<&ResourceSet, InitError> {
        if self.state != LifecycleState::Uninitialized {
            return Err(InitError::InvalidState(self.state));
        }
        logwise::info_sync!(
            "Initializing {name} on {driver}",
            name = logwise::privacy::LogIt(&config.name),
            driver = logwise::privacy::LogIt(&self.driver.name())
        );
        self.state = LifecycleState::Initializing;
        let mut set = ResourceSet::new();
        match build(&mut self.driver, config, &mut set) {
            Ok(()) => {
                self.plan = Some(FramePlan {
                    choreography: config.choreography,
                    projection: config.projection,
                    clear_color: config.clear_color,
                    framebuffer_size: config.framebuffer_size,
                    element_count: config.elements.len() as u32,
                });
                self.state = LifecycleState::Ready;
                logwise::info_sync!(
                    "{name} ready with {live} resources",
                    name = logwise::privacy::LogIt(&config.name),
                    live = set.live()
                );
                Ok(&*self.resources.insert(set))
            }
            Err(e) => {
                logwise::error_sync!(
                    "Initializing {name} failed: {e}",
                    name = logwise::privacy::LogIt(&config.name),
                    e = logwise::privacy::LogIt(&e)
                );
                set.release(&mut self.driver);
                self.state = LifecycleState::TornDown;
                Err(e)
            }
        }
    }

    /// Renders one frame of the configured choreography.
    pub fn render_frame(&mut self, view: &ViewState) -> Result<(), FrameError> {
        if !matches!(self.state, LifecycleState::Ready | LifecycleState::Rendering) {
            return Err(FrameError::NotReady(self.state));
        }
        let view_size = view.window_size;
        let Lifecycle {
            driver,
            state,
            resources,
            plan,
            frames_rendered,
        } = self;
        let (Some(resources), Some(plan)) = (resources.as_ref(), plan.as_ref()) else {
            return Err(FrameError::NotReady(*state));
        };
        let Some(uniforms) = resources.uniforms() else {
            return Err(FrameError::NotReady(*state));
        };
        let (Some(program), Some(vertex_format)) = (resources.program(), resources.vertex_format())
        else {
            return Err(FrameError::NotReady(*state));
        };
        *state = LifecycleState::Rendering;
        //the default framebuffer is never larger than the driver's surface
        let view = &view.clamped_to(driver.surface_size());
        if view.window_size != view_size {
            logwise::trace_sync!(
                "clamped window {requested} to the surface",
                requested = logwise::privacy::LogIt(&view_size)
            );
        }
        let inputs = FrameInputs {
            program,
            vertex_format,
            uniforms,
            element_count: plan.element_count,
            sampler: resources.sampler(),
            diffuse: resources.texture(TextureRole::Diffuse),
            colorbuffer: resources.texture(TextureRole::Colorbuffer),
            render: resources.framebuffer(FramebufferRole::Render),
            resolve: resources.framebuffer(FramebufferRole::Resolve),
            framebuffer_size: plan.framebuffer_size,
            projection: plan.projection,
            clear_color: plan.clear_color,
            view,
        };
        let steps = plan.choreography.steps(&inputs)?;
        logwise::trace_sync!(
            "frame {frame}: {steps} steps",
            frame = *frames_rendered,
            steps = steps.len()
        );
        for step in &steps {
            match step {
                FrameStep::WriteSlot { slot, matrix } => {
                    uniforms.write_matrix(driver, *slot, matrix)?
                }
                FrameStep::Execute(command) => driver.execute(command)?,
            }
        }
        driver.end_frame()?;
        let mut errors = driver.take_errors().into_iter();
        if let Some(first) = errors.next() {
            logwise::error_sync!(
                "Driver reported {e} during frame {frame}",
                e = logwise::privacy::LogIt(&first),
                frame = *frames_rendered
            );
            for more in errors {
                logwise::error_sync!("Driver also reported {e}", e = logwise::privacy::LogIt(&more));
            }
            return Err(FrameError::Driver(first));
        }
        *frames_rendered += 1;
        Ok(())
    }

    /// Reads back pixels of `target`.
    pub fn read_pixels(
        &mut self,
        target: FramebufferTarget,
        rect: Rect,
    ) -> Result<Vec<[u8; 4]>, FrameError> {
        Ok(self.driver.read_pixels(target, rect)?)
    }

    /// Releases every resource.  Safe to call any number of times.
    pub fn teardown(&mut self) {
        if let Some(mut set) = self.resources.take() {
            logwise::info_sync!(
                "Tearing down {live} resources after {frames} frames",
                live = set.live(),
                frames = self.frames_rendered
            );
            set.release(&mut self.driver);
        }
        self.plan = None;
        self.state = LifecycleState::TornDown;
    }
}

impl<D: Driver> Drop for Lifecycle<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn build<D: Driver>(
    driver: &mut D,
    config: &SampleConfig,
    set: &mut ResourceSet,
) -> Result<(), InitError> {
    config.validate()?;
    let name = config.name.as_str();

    //program
    let vertex = config.vertex_shader.load()?;
    let fragment = config.fragment_shader.load()?;
    set.program = Some(driver.create_program(&ProgramDescriptor {
        label: name,
        vertex: &vertex,
        fragment: &fragment,
    })?);
    logwise::debuginternal_sync!("program built");

    //immutable geometry
    let elements: &[u8] = bytemuck::cast_slice(&config.elements);
    for (role, usage, contents) in [
        (BufferRole::Vertex, BufferUsage::Vertex, config.vertices.as_slice()),
        (BufferRole::Element, BufferUsage::Index, elements),
    ] {
        let handle = driver.create_buffer(&BufferDescriptor {
            label: role.name(),
            usage,
            size: contents.len() as u64,
            contents: Some(contents),
            persistent: false,
        })?;
        set.buffers.insert(role, handle);
    }

    //persistently mapped transforms
    let limits = driver.limits();
    let slot_count = config.choreography.uniform_slots();
    let transform_size =
        UniformSlots::stride_for(limits.min_uniform_buffer_offset_alignment) * slot_count as u64;
    let transform = driver.create_buffer(&BufferDescriptor {
        label: BufferRole::Transform.name(),
        usage: BufferUsage::Uniform,
        size: transform_size,
        contents: None,
        persistent: true,
    })?;
    set.buffers.insert(BufferRole::Transform, transform);
    driver.map_persistent(transform)?;
    set.uniforms = Some(UniformSlots::new(
        transform,
        slot_count,
        limits.min_uniform_buffer_offset_alignment,
    ));

    //diffuse texture
    if let Some(source) = &config.texture {
        let descriptor = TextureBuilder::new(
            TextureRole::Diffuse.name(),
            source.width(),
            source.height(),
            source.format(),
        )
        .levels(source.levels())
        .build()?;
        let texture = driver.create_texture(&descriptor)?;
        set.textures.insert(TextureRole::Diffuse, texture);
        let compressed = source.format().is_compressed();
        for (level, mip) in source.iter_levels().enumerate() {
            let level = level as u32;
            let upload = if compressed {
                LevelUpload::Compressed {
                    level,
                    width: mip.width,
                    height: mip.height,
                    data: &mip.data,
                }
            } else {
                LevelUpload::Pixels {
                    level,
                    width: mip.width,
                    height: mip.height,
                    data: &mip.data,
                }
            };
            driver.upload_level(texture, &upload)?;
        }
        logwise::debuginternal_sync!(
            "uploaded {levels} levels",
            levels = source.levels()
        );
    }

    set.sampler = Some(driver.create_sampler(&config.sampler)?);

    if config.choreography.needs_offscreen() {
        build_framebuffers(driver, config, set, limits.max_samples)?;
    }

    let (Some(vertices), Some(elements)) = (
        set.buffers.get(BufferRole::Vertex),
        set.buffers.get(BufferRole::Element),
    ) else {
        return Err(InitError::ResourceCreation(Error::Validation(
            "geometry buffers vanished during initialization".to_string(),
        )));
    };
    set.vertex_format = Some(driver.create_vertex_format(&config.vertex_format, vertices, elements)?);
    Ok(())
}

fn build_framebuffers<D: Driver>(
    driver: &mut D,
    config: &SampleConfig,
    set: &mut ResourceSet,
    max_samples: u32,
) -> Result<(), InitError> {
    let (width, height) = config.framebuffer_size;
    let (resolve_width, resolve_height) = config.resolve_size();
    let incomplete = |role, status| InitError::FramebufferIncomplete { role, status };

    let render = FramebufferDescriptor::new(
        FramebufferRole::Render.name(),
        width,
        height,
        config.samples,
    );
    let resolve =
        FramebufferDescriptor::new(FramebufferRole::Resolve.name(), resolve_width, resolve_height, 1);
    for (role, declared) in [
        (FramebufferRole::Render, &render),
        (FramebufferRole::Resolve, &resolve),
    ] {
        match declared.validate_declared() {
            FramebufferStatus::Complete => {}
            status => return Err(incomplete(role, status)),
        }
    }
    if config.samples > max_samples {
        return Err(incomplete(
            FramebufferRole::Render,
            FramebufferStatus::Unsupported,
        ));
    }

    let multisample = TextureBuilder::new(
        TextureRole::Multisample.name(),
        width,
        height,
        config.render_format,
    )
    .kind(TextureKind::D2Multisample)
    .samples(config.samples)
    .render_target()
    .build()?;
    let multisample = driver.create_texture(&multisample)?;
    set.textures.insert(TextureRole::Multisample, multisample);

    let colorbuffer = TextureBuilder::new(
        TextureRole::Colorbuffer.name(),
        resolve_width,
        resolve_height,
        config.render_format,
    )
    .render_target()
    .build()?;
    let colorbuffer = driver.create_texture(&colorbuffer)?;
    set.textures.insert(TextureRole::Colorbuffer, colorbuffer);

    let attach = |driver: &mut D,
                  set: &mut ResourceSet,
                  role: FramebufferRole,
                  descriptor: &FramebufferDescriptor,
                  texture: Handle|
     -> Result<(), InitError> {
        let framebuffer = driver.create_framebuffer(&descriptor.clone().with_attachment(texture, 0))?;
        set.framebuffers.insert(role, framebuffer);
        match driver.framebuffer_status(framebuffer) {
            FramebufferStatus::Complete => Ok(()),
            status => Err(incomplete(role, status)),
        }
    };
    attach(driver, set, FramebufferRole::Render, &render, multisample)?;
    attach(driver, set, FramebufferRole::Resolve, &resolve, colorbuffer)?;
    match render.resolve_status(&resolve) {
        FramebufferStatus::Complete => {}
        status => return Err(incomplete(FramebufferRole::Resolve, status)),
    }
    logwise::debuginternal_sync!(
        "framebuffers complete at {samples}x",
        samples = config.samples
    );
    Ok(())
}
