// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Renders the multisample-resolve sample for a few frames and saves the last one.

use std::process::ExitCode;

use frames_and_samples::bindings::texture_source::TextureSource;
use frames_and_samples::images::host::{HeadlessHost, RunOutcome, run};
use frames_and_samples::images::lifecycle::Lifecycle;
use frames_and_samples::images::samples;
use frames_and_samples::load::data_dir;
use frames_and_samples::pixel_formats::{load_png, write_png};
use frames_and_samples::{Driver, SoftwareDriver, WgpuDriver};

const WINDOW: (u32, u32) = (640, 480);
const FRAMES: u64 = 60;

fn render<D: Driver>(driver: D) -> (RunOutcome, HeadlessHost) {
    let texture = match load_png(&data_dir().join("diffuse.png"), true) {
        Ok(texture) => texture.with_generated_mips(),
        Err(e) => {
            logwise::warn_sync!(
                "No diffuse image ({e}); using a checkerboard",
                e = logwise::privacy::LogIt(&e)
            );
            TextureSource::checkerboard([255, 255, 255, 255], [40, 40, 40, 255])
        }
    };
    let mut host = HeadlessHost::new(FRAMES, WINDOW).capturing();
    let outcome = match samples::direct_state_access(texture) {
        Ok(config) => run(&mut host, &mut Lifecycle::new(driver), &config),
        Err(e) => {
            logwise::error_sync!("{e}", e = logwise::privacy::LogIt(&e));
            RunOutcome::Failed
        }
    };
    (outcome, host)
}

fn main() -> ExitCode {
    let (outcome, host) = match test_executors::sleep_on(WgpuDriver::headless(WINDOW.0, WINDOW.1))
    {
        Ok(driver) => render(driver),
        Err(e) => {
            logwise::warn_sync!(
                "No GPU ({e}); rendering in software",
                e = logwise::privacy::LogIt(&e)
            );
            render(SoftwareDriver::new(WINDOW.0, WINDOW.1))
        }
    };
    if let Some(frame) = host.last_frame() {
        let path = std::env::temp_dir().join("direct_state_access.png");
        match write_png(&path, WINDOW.0, WINDOW.1, frame) {
            Ok(()) => {
                logwise::info_sync!(
                    "Saved {path}",
                    path = logwise::privacy::LogIt(&path.display())
                );
            }
            Err(e) => {
                logwise::error_sync!("{e}", e = logwise::privacy::LogIt(&e));
            }
        }
    }
    outcome.exit_code()
}
