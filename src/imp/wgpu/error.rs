// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Capturing wgpu validation errors.
//!
//! wgpu reports most misuse asynchronously through error scopes.  Creation calls run
//! inside a scope and fail on the spot; frame commands run inside one too, and their
//! errors are queued for [`crate::imp::Driver::take_errors`].

use crate::bindings::handle::ResourceKind;
use crate::imp::Error;

/// Runs `f` inside a validation scope.
pub(super) fn scoped<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    let error = test_executors::sleep_on(device.pop_error_scope());
    (out, error)
}

/// Like [`scoped`], but a validation error fails creation of a `kind`.
pub(super) fn creating<T>(
    device: &wgpu::Device,
    kind: ResourceKind,
    f: impl FnOnce() -> T,
) -> Result<T, Error> {
    match scoped(device, f) {
        (out, None) => Ok(out),
        (_, Some(e)) => Err(Error::creation(kind, e.to_string())),
    }
}

pub(super) fn validation(error: wgpu::Error) -> Error {
    Error::Validation(error.to_string())
}
