use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use crate::runtime::ExportFormat;
use crate::surface::Surface;

/// Errors raised while writing frames to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot infer an image format from {0}; use a .png or .bmp extension")]
    UnknownFormat(PathBuf),
}

impl ExportFormat {
    fn image_format(self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Resolves the format for `path`, preferring the file extension.
pub fn format_for_path(
    path: &Path,
    fallback: Option<ExportFormat>,
) -> Result<ExportFormat, ExportError> {
    ExportFormat::from_path(path)
        .or(fallback)
        .ok_or_else(|| ExportError::UnknownFormat(path.to_path_buf()))
}

/// Encodes `surface` to `path`, creating parent directories as needed.
pub fn write_surface(
    surface: &Surface,
    path: &Path,
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    surface
        .to_rgb_image()
        .save_with_format(path, format.image_format())
        .map_err(|source| ExportError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), "wrote frame");
    Ok(path.to_path_buf())
}

/// File name for frame `index` of a sequence, e.g. `frame_00042.png`.
pub fn sequence_file_name(index: u64) -> String {
    format!("frame_{index:05}.{}", ExportFormat::Png.extension())
}
