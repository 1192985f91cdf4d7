use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use squeeze_batch::cli::{Args, BatchArgs, Commands};
use squeeze_batch::constants::{
    COMPRESSED_SIZE_PREFIX, COMPRESSION_RATIO_PREFIX, DEFAULT_QUALITY, ERROR_PREFIX,
    ORIGINAL_SIZE_PREFIX, PROGRESS_BAR_TEMPLATE, SUCCESS_PREFIX, WARNING_PREFIX,
};
use squeeze_batch::{
    calculate_compression_ratio, format_file_size, format_ratio, logger, mime_type_for_path,
    ArchiveExporter, BatchController, Download, IncomingFile, ItemEvent, Quality,
};
use std::fs;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.verbose, args.quiet);
    let quiet = args.quiet;

    match args.command {
        Commands::Compress { batch } => {
            let controller = run_batch(&batch, quiet).await?;
            write_items(&controller, &batch.output, quiet)?;
        }
        Commands::Archive {
            batch,
            deflate_level,
        } => {
            let controller = run_batch(&batch, quiet).await?;
            let exporter = ArchiveExporter::with_deflate_level(deflate_level);
            let archive = controller
                .export_archive_with(&exporter)
                .context("Archive was not written")?;
            let path = write_download(&batch.output, &archive)?;
            if !quiet {
                println!(
                    "📦 Archive written: {:?} ({})",
                    path,
                    format_file_size(archive.bytes.len() as u64)
                );
            }
        }
    }

    Ok(())
}

fn setup_thread_pool(threads: Option<usize>) {
    if let Some(num_threads) = threads {
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to set thread pool size: {}", e);
            });
    }
}

/// Ingest the inputs, then wait until every compression has been applied.
async fn run_batch(batch: &BatchArgs, quiet: bool) -> Result<BatchController> {
    setup_thread_pool(batch.threads);

    let quality = Quality::from_percent(batch.quality.unwrap_or(DEFAULT_QUALITY))?;
    let files = read_inputs(&batch.inputs)?;

    let mut controller = BatchController::new(quality);
    let ids = controller.ingest(files)?;

    if !quiet {
        println!(
            "🗜️  Compressing {} image(s) at quality {}",
            ids.len(),
            quality
        );
    }

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(ids.len() as u64)
    };
    progress.set_style(ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE)?);

    while let Some(event) = controller.next_event().await {
        let name = controller
            .item(event.id())
            .map(|item| item.display_name().to_string())
            .unwrap_or_default();

        match &event {
            ItemEvent::Compressed { .. } => progress.set_message(name),
            ItemEvent::Failed { error, .. } => {
                progress.println(format!("{} {}: {}", ERROR_PREFIX, name, error));
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message(format!("{} Compression complete", SUCCESS_PREFIX));

    if !quiet {
        print_summary(&controller);
    }

    Ok(controller)
}

fn read_inputs(inputs: &[PathBuf]) -> Result<Vec<IncomingFile>> {
    inputs
        .iter()
        .map(|path| {
            let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("Invalid file name: {:?}", path))?;
            Ok(IncomingFile::new(name, mime_type_for_path(path), bytes))
        })
        .collect()
}

fn print_summary(controller: &BatchController) {
    let mut total_before = 0;
    let mut total_after = 0;

    println!("\n📊 Batch Compression Summary:");
    for item in controller.items() {
        let metrics = item.metrics();
        println!("📄 {}", item.display_name());
        println!("  {} {}", ORIGINAL_SIZE_PREFIX, metrics.original_size);

        match (metrics.compressed_size, metrics.ratio) {
            (Some(size), Some(ratio)) => {
                println!("  {} {}", COMPRESSED_SIZE_PREFIX, size);
                println!("  {} {}", COMPRESSION_RATIO_PREFIX, ratio);
                if metrics.negative {
                    println!("  {}  File size increased", WARNING_PREFIX);
                }
                total_before += item.original_size();
                total_after += item.compressed_size().unwrap_or_default();
            }
            _ => println!("  {} Not compressed", ERROR_PREFIX),
        }
    }

    if total_before > 0 {
        println!(
            "🎯 Overall compression ratio: {}",
            format_ratio(calculate_compression_ratio(total_before, total_after))
        );
    }
}

fn write_items(controller: &BatchController, output: &Path, quiet: bool) -> Result<()> {
    let mut written = 0;

    for item in controller.items() {
        match controller.download(item.id()) {
            Ok(download) => {
                let path = write_download(output, &download)?;
                if !quiet {
                    println!("{} Saved {:?}", SUCCESS_PREFIX, path);
                }
                written += 1;
            }
            Err(e) => {
                tracing::warn!(name = %item.display_name(), error = %e, "skipping item");
            }
        }
    }

    if written == 0 {
        bail!("None of the images could be compressed");
    }

    Ok(())
}

fn write_download(output: &Path, download: &Download) -> Result<PathBuf> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {:?}", output))?;

    let path = output.join(&download.file_name);
    fs::write(&path, &download.bytes).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}
