pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Largest width or height accepted after decoding.
pub const MAX_IMAGE_DIMENSION: u32 = 16384;

/// oxipng preset used for every PNG re-encode. PNG has no quality axis,
/// so this stays fixed regardless of the requested quality.
pub const OXIPNG_PRESET: u8 = 2;

/// ravif speed (1 = slowest/best, 10 = fastest).
pub const AVIF_ENCODER_SPEED: u8 = 8;

pub const IMAGE_MIME_PREFIX: &str = "image/";
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub const EXPORT_NAME_PREFIX: &str = "compressed_";
pub const ARCHIVE_FILE_NAME: &str = "compressed_images.zip";
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";
pub const DEFAULT_DEFLATE_LEVEL: u32 = 6;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Original size:";
pub const COMPRESSED_SIZE_PREFIX: &str = "📈 Compressed size:";
pub const COMPRESSION_RATIO_PREFIX: &str = "🎯 Compression ratio:";
pub const SUCCESS_PREFIX: &str = "✅";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
