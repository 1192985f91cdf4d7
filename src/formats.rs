/// MIME type handling
///
/// Items are re-encoded in the type they were declared with, so the MIME
/// string is the single source of truth for the output encoder.
use crate::constants::{FALLBACK_MIME_TYPE, IMAGE_MIME_PREFIX};
use crate::error::{CompressionError, Result};
use image::ImageFormat;
use std::path::Path;

/// True when the declared type is an image type (`image/*`).
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with(IMAGE_MIME_PREFIX)
}

/// Resolve the encoder format for a declared MIME type.
///
/// Parameters after `;` are ignored and matching is case-insensitive.
pub fn output_format_for_mime(mime_type: &str) -> Result<ImageFormat> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Ok(ImageFormat::Jpeg),
        "image/png" | "image/apng" => Ok(ImageFormat::Png),
        "image/webp" => Ok(ImageFormat::WebP),
        "image/avif" => Ok(ImageFormat::Avif),
        "image/gif" => Ok(ImageFormat::Gif),
        "image/bmp" | "image/x-bmp" | "image/x-ms-bmp" => Ok(ImageFormat::Bmp),
        "image/tiff" => Ok(ImageFormat::Tiff),
        "image/x-icon" | "image/vnd.microsoft.icon" => Ok(ImageFormat::Ico),
        _ => Err(CompressionError::UnsupportedFormat(mime_type.to_string())),
    }
}

/// Formats whose encoder takes a lossy quality parameter.
pub fn has_quality_axis(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Avif
    )
}

/// Guess a declared MIME type from a file extension, the way a file picker
/// would. Unknown extensions map to `application/octet-stream`.
pub fn mime_type_for_path(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("image/svg+xml"));
        assert!(!is_image_mime("text/plain"));
        assert!(!is_image_mime("application/octet-stream"));
        assert!(!is_image_mime(""));
    }

    #[test]
    fn test_output_format_for_mime() {
        assert_eq!(output_format_for_mime("image/jpeg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(output_format_for_mime("image/jpg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(output_format_for_mime("IMAGE/PNG").unwrap(), ImageFormat::Png);
        assert_eq!(output_format_for_mime("image/webp").unwrap(), ImageFormat::WebP);
        assert_eq!(output_format_for_mime("image/avif").unwrap(), ImageFormat::Avif);
        assert_eq!(
            output_format_for_mime("image/png; charset=binary").unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_output_format_for_mime_unsupported() {
        let result = output_format_for_mime("image/svg+xml");
        assert!(matches!(result, Err(CompressionError::UnsupportedFormat(_))));

        let result = output_format_for_mime("image/heic");
        assert!(matches!(result, Err(CompressionError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_has_quality_axis() {
        assert!(has_quality_axis(ImageFormat::Jpeg));
        assert!(has_quality_axis(ImageFormat::Avif));
        assert!(!has_quality_axis(ImageFormat::Png));
        assert!(has_quality_axis(ImageFormat::WebP));
    }

    #[test]
    fn test_mime_type_for_path() {
        assert_eq!(mime_type_for_path(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(mime_type_for_path(Path::new("icon.png")), "image/png");
        assert_eq!(mime_type_for_path(Path::new("notes.txt")), FALLBACK_MIME_TYPE);
        assert_eq!(mime_type_for_path(Path::new("noext")), FALLBACK_MIME_TYPE);
    }
}
