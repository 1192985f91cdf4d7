pub mod archive;
pub mod batch;
pub mod cli;
pub mod constants;
pub mod error;
pub mod formats;
pub mod item;
pub mod logger;
pub mod processing;
pub mod utils;

pub use archive::{ArchiveExporter, Download};
pub use batch::{BatchController, IncomingFile, ItemEvent};
pub use error::{CompressionError, Result};
pub use formats::{is_image_mime, mime_type_for_path, output_format_for_mime};
pub use item::{DisplayMetrics, ImageItem, ItemId};
pub use processing::{compress_image, CompressedImage, Compressor, ImageCompressor, Quality};
pub use utils::{calculate_compression_ratio, format_file_size, format_ratio};
