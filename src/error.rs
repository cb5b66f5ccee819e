use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid document snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("DOCX packaging error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unsupported image format: {0} (expected PNG or JPEG)")]
    UnsupportedImage(String),

    /// A render adapter could not produce its output.
    #[error("render error: {0}")]
    Render(String),

    /// A typed update referenced something that does not exist
    /// (e.g. a chapter index out of range). Contained to the command.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("an export is already in progress")]
    ExportInProgress,
}
