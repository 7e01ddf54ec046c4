use std::path::PathBuf;
use thiserror::Error;

/// Failure to persist a count snapshot or an evidence crop
///
/// Never fatal: the session logs it and carries on with the next event.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{role} crop for frame {frame_index} is empty after clamping to {width}x{height}")]
    EmptyCrop {
        role: &'static str,
        frame_index: u64,
        width: u32,
        height: u32,
    },
}

impl SinkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
