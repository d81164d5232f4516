// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Errors from loading shader and texture sources.

use std::path::{Path, PathBuf};

/// A shader or texture source could not be loaded.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("can't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },
    #[error("malformed source: {0}")]
    Malformed(String),
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),
    #[error("png decode: {0}")]
    PngDecode(#[from] png::DecodingError),
    #[error("png encode: {0}")]
    PngEncode(#[from] png::EncodingError),
}

/// Reads a whole file, rejecting empty ones.
pub(crate) fn read_nonempty(path: &Path) -> Result<Vec<u8>, LoadError> {
    let data = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    if data.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_owned(),
        });
    }
    Ok(data)
}

/// Directory sample data is loaded from.
///
/// `FRAMES_AND_SAMPLES_DATA_DIR` overrides the crate's own `data/` directory.
pub fn data_dir() -> PathBuf {
    match std::env::var_os("FRAMES_AND_SAMPLES_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let err = read_nonempty(Path::new("/definitely/not/here.wgsl")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        let path = std::env::temp_dir().join("frames_and_samples_empty_source.bin");
        std::fs::write(&path, b"").unwrap();
        let err = read_nonempty(&path).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
        std::fs::remove_file(&path).unwrap();
    }
}
