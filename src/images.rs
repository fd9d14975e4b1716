//! Loading the optional report image from disk or from an in-memory byte buffer.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use genpdf::error::{Context as _, Error};
use image::{DynamicImage, ImageFormat};
use log::debug;

use crate::error::ReportError;

/// How the report image reaches the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageStrategy {
    /// The canvas decodes the image file directly.
    Path,
    /// The file is read into memory first and decoded from the byte buffer.
    #[default]
    Bytes,
}

/// Raw image bytes together with the format tag derived from the file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    format: String,
}

impl ImagePayload {
    /// Wraps image bytes and a format tag such as `png`.
    pub fn new(bytes: impl Into<Vec<u8>>, format: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            format: format.into(),
        }
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the format tag.
    pub fn format(&self) -> &str {
        &self.format
    }
}

/// Representation of image sources supported by the report canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Image referenced by a file path.
    Path(PathBuf),
    /// Image already loaded into memory.
    Bytes(ImagePayload),
}

impl ImageSource {
    /// Creates an image sourced from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates an in-memory image from raw bytes and a format tag.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, format: impl Into<String>) -> Self {
        Self::Bytes(ImagePayload::new(bytes, format))
    }

    /// Prepares the image at `path` according to `strategy`.
    ///
    /// For [`ImageStrategy::Path`] this only checks that the file can be opened; for
    /// [`ImageStrategy::Bytes`] the whole file is read into memory.
    pub fn load(strategy: ImageStrategy, path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        match strategy {
            ImageStrategy::Path => {
                File::open(path).map_err(|err| ReportError::from_io(path, err))?;
                Ok(Self::from_path(path))
            }
            ImageStrategy::Bytes => read_image_bytes(path).map(Self::Bytes),
        }
    }

    /// Decodes the image into pixels.
    pub fn decode(&self) -> Result<DynamicImage, Error> {
        match self {
            Self::Path(path) => decode_image_from_path(path),
            Self::Bytes(payload) => match ImageFormat::from_extension(payload.format()) {
                Some(format) => image::load_from_memory_with_format(payload.bytes(), format)
                    .with_context(|| {
                        format!("Failed to decode {} image from provided bytes", payload.format())
                    }),
                None => decode_image_from_bytes(payload.bytes()),
            },
        }
    }
}

/// Returns the extension after the last `.` of the file name, or an empty string.
pub fn format_tag(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads the complete image file at `path` and tags it with its extension.
///
/// Reading continues until the size reported by the file metadata has been obtained, so large
/// files are never truncated by a single short read.
pub fn read_image_bytes(path: impl AsRef<Path>) -> Result<ImagePayload, ReportError> {
    let path = path.as_ref();
    let format = format_tag(path);
    if format.is_empty() {
        return Err(ReportError::InvalidConfig(format!(
            "image {} has no extension to derive its format from",
            path.display()
        )));
    }

    let file = File::open(path).map_err(|err| ReportError::from_io(path, err))?;
    let expected = file
        .metadata()
        .map_err(|err| ReportError::from_io(path, err))?
        .len();

    let mut bytes = Vec::with_capacity(expected as usize);
    file.take(expected)
        .read_to_end(&mut bytes)
        .map_err(|err| ReportError::from_io(path, err))?;

    if bytes.is_empty() {
        return Err(ReportError::InvalidConfig(format!(
            "image {} is empty",
            path.display()
        )));
    }
    if bytes.len() as u64 != expected {
        return Err(ReportError::from_io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("read {} of {} bytes", bytes.len(), expected),
            ),
        ));
    }

    debug!("Read {} bytes of {} image {}", bytes.len(), format, path.display());
    Ok(ImagePayload { bytes, format })
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}
