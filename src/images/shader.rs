// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! WGSL shader sources.
//!
//! A [`ShaderSource`] is either embedded in the binary or read from the data
//! directory when the program is built.  Preprocessor-style definitions are
//! prepended as module-scope `const` declarations.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::load::{LoadError, data_dir, read_nonempty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Embedded(String),
    //relative paths resolve against the data directory
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    label: String,
    origin: Origin,
    constants: Vec<(String, String)>,
}

impl ShaderSource {
    pub fn embedded(label: &str, wgsl_code: &str) -> Self {
        ShaderSource {
            label: label.to_string(),
            origin: Origin::Embedded(wgsl_code.to_string()),
            constants: Vec::new(),
        }
    }

    /// A file, relative to [`crate::load::data_dir`] unless absolute.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        ShaderSource {
            label: path.display().to_string(),
            origin: Origin::Path(path),
            constants: Vec::new(),
        }
    }

    /// Prepends `const name = value;`.
    pub fn with_constant(mut self, name: &str, value: impl Display) -> Self {
        self.constants.push((name.to_string(), value.to_string()));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Produces the final WGSL text.
    pub fn load(&self) -> Result<String, LoadError> {
        let body = match &self.origin {
            Origin::Embedded(code) => code.clone(),
            Origin::Path(path) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    data_dir().join(path)
                };
                let bytes = read_nonempty(&full)?;
                String::from_utf8(bytes).map_err(|e| {
                    LoadError::Malformed(format!("{} is not UTF-8: {e}", full.display()))
                })?
            }
        };
        let mut out = String::with_capacity(body.len() + self.constants.len() * 32);
        for (name, value) in &self.constants {
            let valid_ident = name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid_ident {
                return Err(LoadError::Malformed(format!(
                    "`{name}` is not a valid constant name in {}",
                    self.label
                )));
            }
            out.push_str(&format!("const {name} = {value};\n"));
        }
        out.push_str(&body);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_prepended() {
        let source = ShaderSource::embedded("s", "fn f() {}")
            .with_constant("SAMPLES", 4)
            .with_constant("GAIN", 0.5);
        assert_eq!(
            source.load().unwrap(),
            "const SAMPLES = 4;\nconst GAIN = 0.5;\nfn f() {}"
        );
    }

    #[test]
    fn bad_constant_names_are_rejected() {
        let source = ShaderSource::embedded("s", "").with_constant("4x", 1);
        assert!(matches!(source.load(), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn data_directory_sources_load() {
        let source = ShaderSource::path("flat-color.vert.wgsl");
        assert_eq!(source.label(), "flat-color.vert.wgsl");
        assert!(source.load().unwrap().contains("vs_main"));
    }

    #[test]
    fn missing_sources_fail() {
        let source = ShaderSource::path("no-such-shader.wgsl");
        assert!(matches!(source.load(), Err(LoadError::Io { .. })));
    }
}
