mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use s_zip::StreamingZipReader;

fn cmd() -> Command {
    Command::cargo_bin("squeeze-batch").unwrap()
}

#[test]
fn test_cli_help() {
    cmd().arg("--help").assert().success();
}

#[test]
fn test_compress_help() {
    cmd().args(["compress", "--help"]).assert().success();
}

#[test]
fn test_archive_help() {
    cmd()
        .args(["archive", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--deflate-level"));
}

#[test]
fn test_compress_missing_args() {
    cmd().arg("compress").assert().failure();
}

#[test]
fn test_compress_nonexistent_file() {
    let temp_dir = TempDir::new().unwrap();
    cmd()
        .args(["compress", "nonexistent.jpg", "-o"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_compress_with_invalid_quality() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.child("photo.png");
    input.write_binary(&common::png_bytes(16, 16, 0)).unwrap();

    cmd()
        .arg("compress")
        .arg(input.path())
        .arg("-o")
        .arg(temp_dir.path())
        .args(["--quality", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid quality value"));
}

#[test]
fn test_compress_only_non_images() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.child("notes.txt");
    input.write_str("plain text").unwrap();

    cmd()
        .arg("compress")
        .arg(input.path())
        .arg("-o")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No image files were supplied"));
}

#[test]
fn test_compress_fake_image_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.child("fake.jpg");
    input.write_binary(b"fake image data").unwrap();
    let output = temp_dir.child("out");

    cmd()
        .arg("compress")
        .arg(input.path())
        .arg("-o")
        .arg(output.path())
        .assert()
        .failure();

    output.child("compressed_fake.jpg").assert(predicate::path::missing());
}

#[test]
fn test_compress_mixed_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = common::create_test_inputs(temp_dir.path());
    let output = temp_dir.child("out");

    cmd()
        .arg("compress")
        .args(&inputs)
        .arg("-o")
        .arg(output.path())
        .args(["-q", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compression ratio"));

    output
        .child("compressed_photo.png")
        .assert(predicate::path::is_file());
    output
        .child("compressed_photo.jpg")
        .assert(predicate::path::is_file());
    output
        .child("compressed_notes.txt")
        .assert(predicate::path::missing());

    let png = std::fs::read(output.child("compressed_photo.png").path()).unwrap();
    assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
}

#[test]
fn test_archive_contains_every_image() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = common::create_test_inputs(temp_dir.path());
    let output = temp_dir.child("out");

    cmd()
        .arg("archive")
        .args(&inputs)
        .arg("-o")
        .arg(output.path())
        .arg("--quiet")
        .assert()
        .success();

    let archive = output.child("compressed_images.zip");
    archive.assert(predicate::path::is_file());

    let reader = StreamingZipReader::open(archive.path()).unwrap();
    let mut names: Vec<String> = reader.entries().iter().map(|e| e.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["compressed_photo.jpg", "compressed_photo.png"]);
}

#[test]
fn test_archive_with_broken_image_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let good = temp_dir.child("good.png");
    good.write_binary(&common::png_bytes(16, 16, 3)).unwrap();
    let broken = temp_dir.child("broken.png");
    broken.write_binary(b"fake png data").unwrap();
    let output = temp_dir.child("out");

    cmd()
        .arg("archive")
        .arg(good.path())
        .arg(broken.path())
        .arg("-o")
        .arg(output.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compression has not finished for broken.png"));

    output
        .child("compressed_images.zip")
        .assert(predicate::path::missing());
}
