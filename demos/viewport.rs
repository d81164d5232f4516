// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Draws the split-viewport sample with a slowly turning camera.

use std::process::ExitCode;

use frames_and_samples::images::host::{Host, RunError, RunOutcome, run};
use frames_and_samples::images::lifecycle::Lifecycle;
use frames_and_samples::images::samples;
use frames_and_samples::images::view::ViewState;
use frames_and_samples::{Driver, DriverError, SoftwareDriver, WgpuDriver};

const WINDOW: (u32, u32) = (640, 480);

/// Turns the camera a little every frame, for a fixed number of frames.
struct Turntable {
    frame: u32,
    frames: u32,
}

impl Host for Turntable {
    fn should_continue(&mut self) -> bool {
        self.frame < self.frames
    }

    fn view_state(&mut self) -> ViewState {
        let mut view = ViewState::default().with_window_size(WINDOW.0, WINDOW.1);
        view.rotation.x += self.frame as f32 * 0.02;
        view
    }

    fn present<D: Driver>(&mut self, driver: &mut D) -> Result<(), DriverError> {
        self.frame += 1;
        for e in driver.take_errors() {
            logwise::warn_sync!(
                "frame {frame}: {e}",
                frame = self.frame,
                e = logwise::privacy::LogIt(&e)
            );
        }
        Ok(())
    }

    fn report_fatal(&mut self, error: &RunError) {
        eprintln!("viewport: {error}");
    }
}

fn render<D: Driver>(driver: D) -> RunOutcome {
    let config = match samples::viewport() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("viewport: {e}");
            return RunOutcome::Failed;
        }
    };
    let mut host = Turntable {
        frame: 0,
        frames: 120,
    };
    run(&mut host, &mut Lifecycle::new(driver), &config)
}

fn main() -> ExitCode {
    let outcome = match test_executors::sleep_on(WgpuDriver::headless(WINDOW.0, WINDOW.1)) {
        Ok(driver) => render(driver),
        Err(e) => {
            logwise::warn_sync!(
                "No GPU ({e}); rendering in software",
                e = logwise::privacy::LogIt(&e)
            );
            render(SoftwareDriver::new(WINDOW.0, WINDOW.1))
        }
    };
    outcome.exit_code()
}
