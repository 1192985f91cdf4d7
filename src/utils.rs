//! Display helpers shared by the item metrics and the host binary.

/// Format a byte count in human-readable form
///
/// Base 1024, at most two decimals with trailing zeros dropped. Sizes
/// beyond the gigabyte range are still expressed in GB.
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.5 KB", "1000 Bytes")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    let fixed = format!("{:.2}", size);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit_index])
}

/// Calculate compression ratio as a percentage
///
/// # Arguments
/// * `original_size` - Original file size in bytes
/// * `compressed_size` - Compressed file size in bytes
///
/// # Returns
/// * Compression ratio as percentage (positive means reduction, negative means increase)
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

/// Render a ratio percentage with one decimal place, e.g. `"20.0%"`.
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio)
}
