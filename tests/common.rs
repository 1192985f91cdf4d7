#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Deterministic image with enough detail for lossy encoders to react to
/// quality changes. `seed` varies the pattern.
pub fn patterned_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 7 + y * 3 + seed) % 256) as u8,
            ((x ^ y).wrapping_add(seed * 31) % 256) as u8,
            ((x * y + 13 + seed * 5) % 256) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

pub fn png_bytes(width: u32, height: u32, seed: u32) -> Vec<u8> {
    encode(&patterned_image(width, height, seed), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32, seed: u32) -> Vec<u8> {
    encode(&patterned_image(width, height, seed), ImageFormat::Jpeg)
}

/// Write a real PNG and JPEG plus a text file into `dir`.
pub fn create_test_inputs(dir: &Path) -> Vec<PathBuf> {
    let png = dir.join("photo.png");
    let jpg = dir.join("photo.jpg");
    let txt = dir.join("notes.txt");

    std::fs::write(&png, png_bytes(48, 32, 1)).unwrap();
    std::fs::write(&jpg, jpeg_bytes(48, 32, 2)).unwrap();
    std::fs::write(&txt, b"not an image").unwrap();

    vec![png, jpg, txt]
}
