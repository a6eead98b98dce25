use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// Malformed or unsupported binary image data.
    #[error("Invalid image data: {0}")]
    Format(String),
    /// Malformed mesh source data.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    /// No registered loader/importer accepts the asset.
    #[error("No loader accepts '{}'", .0.display())]
    UnsupportedFormat(PathBuf),
    /// The owning registry has been disposed.
    #[error("Registry is closed")]
    Closed,
    /// Pixel access after the buffer was disposed.
    #[error("Pixel buffer accessed after disposal")]
    Disposed,
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl AssetError {
    pub(crate) fn parse(line_no: usize, message: impl Into<String>) -> Self {
        AssetError::Parse {
            line: line_no + 1,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
