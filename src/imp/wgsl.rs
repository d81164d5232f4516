// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! WGSL front-end checks shared by both drivers.

use crate::images::shader::ShaderStage;
use crate::imp::Error;
use naga::valid::{Capabilities, ValidationFlags, Validator};

/// Parses and validates `source`, and checks it exports `entry` for `stage`.
pub(crate) fn check(
    label: &str,
    stage: ShaderStage,
    source: &str,
    entry: &str,
) -> Result<naga::Module, Error> {
    let compile_error = |message: String| Error::Compile {
        label: label.to_string(),
        stage,
        message,
    };
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let found = module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry && ep.stage == naga_stage);
    if !found {
        return Err(compile_error(format!("missing {stage} entry point `{entry}`")));
    }
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";

    #[test]
    fn accepts_valid_shader() {
        assert!(check("good", ShaderStage::Vertex, GOOD, "vs_main").is_ok());
    }

    #[test]
    fn reports_parse_errors() {
        let err = check("bad", ShaderStage::Vertex, "fn vs_main( {", "vs_main").unwrap_err();
        assert!(matches!(err, Error::Compile { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn reports_missing_entry_point() {
        let err = check("good", ShaderStage::Fragment, GOOD, "fs_main").unwrap_err();
        match err {
            Error::Compile { message, .. } => assert!(message.contains("fs_main")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
