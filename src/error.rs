use crate::item::ItemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid image dimensions: {0}x{1}. Maximum allowed: {2}x{2}")]
    InvalidDimensions(u32, u32, u32),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid quality factor: {0}. Must be greater than 0 and at most 1")]
    InvalidQualityFactor(f32),

    #[error("No image files were supplied")]
    NoImages,

    #[error("Nothing to export: the batch is empty")]
    EmptyBatch,

    #[error("Compression has not finished for {0}")]
    IncompleteItem(String),

    #[error("Two items would be exported as {0}")]
    DuplicateExportName(String),

    #[error("No item with id {0} in this batch")]
    ItemNotFound(ItemId),

    #[error("Archive error: {0}")]
    Archive(#[from] s_zip::SZipError),
}

pub type Result<T> = std::result::Result<T, CompressionError>;
