//! Export of compressed items, one at a time or bundled into a zip archive.
use crate::constants::{ARCHIVE_FILE_NAME, ARCHIVE_MIME_TYPE, DEFAULT_DEFLATE_LEVEL};
use crate::error::{CompressionError, Result};
use crate::item::ImageItem;
use s_zip::StreamingZipWriter;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::{debug, info};

/// A file ready to hand to a download collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Builds downloads from the current compressed bytes of batch items.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveExporter {
    deflate_level: u32,
}

impl Default for ArchiveExporter {
    fn default() -> Self {
        Self {
            deflate_level: DEFAULT_DEFLATE_LEVEL,
        }
    }
}

impl ArchiveExporter {
    /// DEFLATE level (0-9) for archive entries. The payloads are already
    /// compressed images, so low levels lose little.
    pub fn with_deflate_level(deflate_level: u32) -> Self {
        Self {
            deflate_level: deflate_level.min(9),
        }
    }

    pub fn deflate_level(&self) -> u32 {
        self.deflate_level
    }

    /// Current compressed bytes of one item, under its export name and
    /// original MIME type.
    pub fn single(item: &ImageItem) -> Result<Download> {
        let bytes = item
            .compressed_bytes()
            .ok_or_else(|| CompressionError::IncompleteItem(item.display_name().to_string()))?;

        Ok(Download {
            file_name: item.export_name(),
            mime_type: item.mime_type().to_string(),
            bytes: bytes.to_vec(),
        })
    }

    /// Bundle every item into `compressed_images.zip`.
    ///
    /// All items are validated before anything is written, so a failure
    /// never leaves a partial archive behind.
    ///
    /// # Returns
    /// * `Ok(Download)` - The archive
    /// * `Err(CompressionError::EmptyBatch)` - `items` is empty
    /// * `Err(CompressionError::IncompleteItem)` - An item has no compressed bytes yet
    /// * `Err(CompressionError::DuplicateExportName)` - Two items share an export name
    pub fn export<'a, I>(&self, items: I) -> Result<Download>
    where
        I: IntoIterator<Item = &'a ImageItem>,
    {
        let entries = collect_entries(items)?;

        let mut writer =
            StreamingZipWriter::from_writer_with_compression(Cursor::new(Vec::new()), self.deflate_level)?;
        for (name, bytes) in &entries {
            debug!(entry = %name, size = bytes.len(), "adding archive entry");
            writer.start_entry_with_hint(name, Some(bytes.len() as u64))?;
            writer.write_data(bytes)?;
        }
        let bytes = writer.finish()?.into_inner();

        info!(
            entries = entries.len(),
            size = bytes.len(),
            "archive assembled"
        );

        Ok(Download {
            file_name: ARCHIVE_FILE_NAME.to_string(),
            mime_type: ARCHIVE_MIME_TYPE.to_string(),
            bytes,
        })
    }
}

fn collect_entries<'a, I>(items: I) -> Result<Vec<(String, &'a [u8])>>
where
    I: IntoIterator<Item = &'a ImageItem>,
{
    let mut names = HashSet::new();
    let mut entries = Vec::new();

    for item in items {
        let bytes = item
            .compressed_bytes()
            .ok_or_else(|| CompressionError::IncompleteItem(item.display_name().to_string()))?;

        let name = item.export_name();
        if !names.insert(name.clone()) {
            return Err(CompressionError::DuplicateExportName(name));
        }
        entries.push((name, bytes));
    }

    if entries.is_empty() {
        return Err(CompressionError::EmptyBatch);
    }

    Ok(entries)
}
