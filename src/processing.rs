use crate::constants::{
    AVIF_ENCODER_SPEED, DEFAULT_QUALITY, MAX_IMAGE_DIMENSION, MAX_QUALITY, MIN_QUALITY,
    OXIPNG_PRESET,
};
use crate::error::{CompressionError, Result};
use crate::formats::{has_quality_axis, output_format_for_mime};
use crate::utils::calculate_compression_ratio;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageError, ImageFormat,
    ImageReader,
};
use oxipng::Options;
use std::fmt;
use std::io::Cursor;
use tracing::trace;

/// Lossy re-encoding quality as a factor in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    pub fn new(factor: f32) -> Result<Self> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CompressionError::InvalidQualityFactor(factor));
        }
        Ok(Self(factor))
    }

    /// Build a quality from slider input in the 1-100 range.
    pub fn from_percent(percent: u8) -> Result<Self> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&percent) {
            return Err(CompressionError::InvalidQuality(percent));
        }
        Ok(Self(f32::from(percent) / 100.0))
    }

    pub fn factor(&self) -> f32 {
        self.0
    }

    /// The 1-100 scale encoders expect.
    pub fn percent(&self) -> u8 {
        (self.0 * 100.0)
            .round()
            .clamp(f32::from(MIN_QUALITY), f32::from(MAX_QUALITY)) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(f32::from(DEFAULT_QUALITY) / 100.0)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Output of one re-encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    bytes: Vec<u8>,
    original_size: u64,
}

impl CompressedImage {
    pub fn new(bytes: Vec<u8>, original_size: u64) -> Self {
        Self {
            bytes,
            original_size,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn encoded_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Percentage saved relative to the original; negative when the
    /// re-encode came out larger.
    pub fn ratio(&self) -> f64 {
        calculate_compression_ratio(self.original_size, self.encoded_size())
    }
}

/// Re-encodes one image buffer. Implementations must not touch shared state:
/// the batch controller calls them from worker threads, one call per item
/// dispatch.
pub trait Compressor: Send + Sync {
    fn compress(&self, bytes: &[u8], mime_type: &str, quality: Quality)
        -> Result<CompressedImage>;
}

/// Compressor backed by the `image` codecs, with oxipng post-processing for PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor;

impl Compressor for ImageCompressor {
    fn compress(
        &self,
        bytes: &[u8],
        mime_type: &str,
        quality: Quality,
    ) -> Result<CompressedImage> {
        compress_image(bytes, mime_type, quality)
    }
}

/// Decode `bytes`, then re-encode the full pixel buffer as `mime_type`.
///
/// # Arguments
/// * `bytes` - Raw image file contents
/// * `mime_type` - Declared type of the input; also the output type
/// * `quality` - Lossy quality; ignored by formats without a quality axis
///
/// # Returns
/// * `Ok(CompressedImage)` - Encoded bytes plus original and encoded sizes
/// * `Err(CompressionError::Decode)` - The bytes are not a decodable image
/// * `Err(CompressionError::Encode)` - The encoder failed or produced nothing
pub fn compress_image(bytes: &[u8], mime_type: &str, quality: Quality) -> Result<CompressedImage> {
    let format = output_format_for_mime(mime_type)?;
    let img = decode_image(bytes)?;
    trace!(
        ?format,
        width = img.width(),
        height = img.height(),
        quality = %quality,
        lossy = has_quality_axis(format),
        "re-encoding image"
    );
    let encoded = encode_image(&img, format, quality)?;

    if encoded.is_empty() {
        return Err(CompressionError::Encode(format!(
            "{:?} encoder produced no output",
            format
        )));
    }

    Ok(CompressedImage::new(encoded, bytes.len() as u64))
}

/// Decodes an in-memory image, sniffing the container from its contents.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CompressionError::Decode(ImageError::IoError(e)))?;
    let img = reader.decode().map_err(CompressionError::Decode)?;

    let (width, height) = img.dimensions();
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(CompressionError::InvalidDimensions(
            width,
            height,
            MAX_IMAGE_DIMENSION,
        ));
    }

    Ok(img)
}

pub fn encode_image(img: &DynamicImage, format: ImageFormat, quality: Quality) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut buffer = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.percent());
            encoder
                .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(encode_error)?;
        }
        ImageFormat::Avif => {
            let rgba = img.to_rgba8();
            let encoder = AvifEncoder::new_with_speed_quality(
                &mut buffer,
                AVIF_ENCODER_SPEED,
                quality.percent(),
            );
            encoder
                .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_error)?;
        }
        ImageFormat::Png => {
            normalize_pixels(img)
                .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                .map_err(encode_error)?;

            let options = Options::from_preset(OXIPNG_PRESET);
            buffer = oxipng::optimize_from_memory(&buffer, &options)
                .map_err(|e| CompressionError::Encode(format!("PNG optimization failed: {}", e)))?;
        }
        ImageFormat::WebP => {
            buffer = encode_webp(img, quality)?;
        }
        ImageFormat::Gif
        | ImageFormat::Bmp
        | ImageFormat::Tiff
        | ImageFormat::Ico => {
            normalize_pixels(img)
                .write_to(&mut Cursor::new(&mut buffer), format)
                .map_err(encode_error)?;
        }
        _ => {
            return Err(CompressionError::UnsupportedFormat(format!("{:?}", format)));
        }
    }

    Ok(buffer)
}

/// Lossy WebP through libwebp; the `image` encoder only writes lossless.
fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>> {
    let pixels = normalize_pixels(img);
    let encoder = match &pixels {
        DynamicImage::ImageRgba8(rgba) => {
            webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        }
        other => {
            let rgb = other.as_rgb8().ok_or_else(|| {
                CompressionError::Encode("WebP input is not 8-bit RGB".to_string())
            })?;
            webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
        }
    };

    let memory = encoder
        .encode_simple(false, f32::from(quality.percent()))
        .map_err(|e| CompressionError::Encode(format!("WebP encoding failed: {:?}", e)))?;
    Ok(memory.to_vec())
}

/// 8-bit RGB or RGBA, which every bundled encoder accepts.
fn normalize_pixels(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

fn encode_error(err: ImageError) -> CompressionError {
    CompressionError::Encode(err.to_string())
}
