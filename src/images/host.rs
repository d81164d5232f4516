// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The host contract and the frame loop.

A host owns the window (or pretends to).  [`run`] asks it for a [`ViewState`] every
frame, renders with a [`Lifecycle`], and hands the driver back for presentation until
the host says stop.
*/

use std::process::ExitCode;

use crate::images::config::SampleConfig;
use crate::images::lifecycle::{FrameError, InitError, Lifecycle};
use crate::images::render_pass::{FramebufferTarget, Rect};
use crate::images::view::ViewState;
use crate::imp::{Driver, Error};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RunError {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("present failed: {0}")]
    Present(Error),
}

pub trait Host {
    /// Checked once before every frame.
    fn should_continue(&mut self) -> bool;
    fn view_state(&mut self) -> ViewState;
    /// Shows the frame just rendered.
    fn present<D: Driver>(&mut self, driver: &mut D) -> Result<(), Error>;
    fn report_fatal(&mut self, error: &RunError);
}

/// How a [`run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { frames: u64 },
    Failed,
}

impl RunOutcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunOutcome::Completed { .. } => ExitCode::SUCCESS,
            RunOutcome::Failed => ExitCode::FAILURE,
        }
    }
}

/// Initializes `config`, renders until `host` stops, then tears down.
pub fn run<H: Host, D: Driver>(
    host: &mut H,
    lifecycle: &mut Lifecycle<D>,
    config: &SampleConfig,
) -> RunOutcome {
    let result = frame_loop(host, lifecycle, config);
    lifecycle.teardown();
    match result {
        Ok(frames) => {
            logwise::info_sync!("Finished after {frames} frames", frames = frames);
            RunOutcome::Completed { frames }
        }
        Err(e) => {
            logwise::error_sync!("{e}", e = logwise::privacy::LogIt(&e));
            host.report_fatal(&e);
            RunOutcome::Failed
        }
    }
}

fn frame_loop<H: Host, D: Driver>(
    host: &mut H,
    lifecycle: &mut Lifecycle<D>,
    config: &SampleConfig,
) -> Result<u64, RunError> {
    lifecycle.initialize(config)?;
    while host.should_continue() {
        let view = host.view_state();
        lifecycle.render_frame(&view)?;
        host.present(lifecycle.driver_mut())
            .map_err(RunError::Present)?;
    }
    Ok(lifecycle.frames_rendered())
}

/// A host without a window: runs a fixed number of frames.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    remaining: u64,
    view: ViewState,
    capture: bool,
    last_frame: Option<Vec<[u8; 4]>>,
    fatal: Option<String>,
}

impl HeadlessHost {
    pub fn new(frames: u64, window_size: (u32, u32)) -> Self {
        HeadlessHost {
            remaining: frames,
            view: ViewState::default().with_window_size(window_size.0, window_size.1),
            capture: false,
            last_frame: None,
            fatal: None,
        }
    }

    pub fn with_view(mut self, view: ViewState) -> Self {
        self.view = view;
        self
    }

    /// Reads back the default surface after the final frame.
    pub fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn last_frame(&self) -> Option<&[[u8; 4]]> {
        self.last_frame.as_deref()
    }

    /// The error [`run`] reported, if any.
    pub fn fatal(&self) -> Option<&str> {
        self.fatal.as_deref()
    }
}

impl Host for HeadlessHost {
    fn should_continue(&mut self) -> bool {
        self.remaining > 0
    }

    fn view_state(&mut self) -> ViewState {
        self.view
    }

    fn present<D: Driver>(&mut self, driver: &mut D) -> Result<(), Error> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.capture && self.remaining == 0 {
            let rect = Rect::full(driver.surface_size());
            self.last_frame = Some(driver.read_pixels(FramebufferTarget::Default, rect)?);
        }
        Ok(())
    }

    fn report_fatal(&mut self, error: &RunError) {
        self.fatal = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::texture_source::TextureSource;
    use crate::images::lifecycle::LifecycleState;
    use crate::images::samples;
    use crate::images::shader::ShaderSource;
    use crate::imp::SoftwareDriver;

    #[test]
    fn headless_run_completes() {
        let config = samples::viewport().unwrap();
        let mut host = HeadlessHost::new(3, (640, 480)).capturing();
        let mut lifecycle = Lifecycle::new(SoftwareDriver::new(640, 480));
        let outcome = run(&mut host, &mut lifecycle, &config);
        assert_eq!(outcome, RunOutcome::Completed { frames: 3 });
        assert_eq!(lifecycle.state(), LifecycleState::TornDown);
        assert_eq!(host.last_frame().map(<[_]>::len), Some(640 * 480));
        assert!(host.fatal().is_none());
    }

    #[test]
    fn compile_failure_is_reported() {
        let mut config =
            samples::direct_state_access(TextureSource::checkerboard([0; 4], [255; 4])).unwrap();
        config.fragment_shader = ShaderSource::embedded("broken", "fn fs_main( {");
        let mut host = HeadlessHost::new(1, (640, 480));
        let mut lifecycle = Lifecycle::new(SoftwareDriver::new(640, 480));
        let outcome = run(&mut host, &mut lifecycle, &config);
        assert_eq!(outcome, RunOutcome::Failed);
        assert!(host.fatal().is_some_and(|m| m.contains("fragment")));
        assert!(lifecycle.driver().calls().iter().all(|c| !c.is_draw()));
    }
}
