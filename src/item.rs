use crate::constants::EXPORT_NAME_PREFIX;
use crate::error::Result;
use crate::processing::{CompressedImage, Quality};
use crate::utils::{calculate_compression_ratio, format_file_size, format_ratio};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;
use std::sync::Arc;

/// Identity of an item within its batch. Issued in increasing order, so
/// sorting by id gives insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u64);

impl ItemId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Strings a renderer shows next to one item.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMetrics {
    pub original_size: String,
    /// `None` until the first compression lands.
    pub compressed_size: Option<String>,
    pub ratio: Option<String>,
    /// The re-encode came out larger than the original.
    pub negative: bool,
}

/// One image in a batch: immutable original bytes plus the latest
/// re-encode.
///
/// All mutation goes through the owning `BatchController`. Every dispatched
/// compression takes a ticket from [`ImageItem::issue_ticket`]; a result is
/// only applied when its ticket is newer than the one that produced the
/// current bytes, so a slow stale compression can never overwrite a later
/// one.
#[derive(Debug, Clone)]
pub struct ImageItem {
    id: ItemId,
    file_name: String,
    mime_type: String,
    original: Arc<[u8]>,
    compressed: Option<CompressedImage>,
    compression_quality: Option<Quality>,
    requested_quality: Quality,
    issued: u64,
    applied: u64,
    settled: u64,
}

impl ImageItem {
    pub(crate) fn new(
        id: ItemId,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
        quality: Quality,
    ) -> Self {
        Self {
            id,
            file_name,
            mime_type,
            original: Arc::from(bytes),
            compressed: None,
            compression_quality: None,
            requested_quality: quality,
            issued: 0,
            applied: 0,
            settled: 0,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.file_name
    }

    /// Name used for downloads and archive entries.
    pub fn export_name(&self) -> String {
        format!("{}{}", EXPORT_NAME_PREFIX, self.file_name)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.original
    }

    pub(crate) fn shared_original(&self) -> Arc<[u8]> {
        Arc::clone(&self.original)
    }

    pub fn original_size(&self) -> u64 {
        self.original.len() as u64
    }

    pub fn compressed_bytes(&self) -> Option<&[u8]> {
        self.compressed.as_ref().map(CompressedImage::bytes)
    }

    pub fn compressed_size(&self) -> Option<u64> {
        self.compressed.as_ref().map(CompressedImage::encoded_size)
    }

    /// Quality that produced the current compressed bytes.
    pub fn compression_quality(&self) -> Option<Quality> {
        self.compression_quality
    }

    /// Quality of the most recently dispatched compression.
    pub fn requested_quality(&self) -> Quality {
        self.requested_quality
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed.is_some()
    }

    /// The latest dispatched compression has not come back yet.
    ///
    /// A failed latest compression clears the flag even though the shown
    /// bytes are older.
    pub fn is_stale(&self) -> bool {
        self.issued > self.settled
    }

    pub fn compression_ratio(&self) -> Option<f64> {
        self.compressed_size()
            .map(|size| calculate_compression_ratio(self.original_size(), size))
    }

    pub fn metrics(&self) -> DisplayMetrics {
        let ratio = self.compression_ratio();
        DisplayMetrics {
            original_size: format_file_size(self.original_size()),
            compressed_size: self.compressed_size().map(format_file_size),
            ratio: ratio.map(format_ratio),
            negative: ratio.is_some_and(|r| r < 0.0),
        }
    }

    /// Data URL of the original image for previews.
    pub fn preview_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(&self.original)
        )
    }

    /// Record a new compression request and return its ticket.
    pub(crate) fn issue_ticket(&mut self, quality: Quality) -> u64 {
        self.issued += 1;
        self.requested_quality = quality;
        self.issued
    }

    /// Apply a finished compression. Returns `false` when the ticket has
    /// been overtaken by a result that was already applied. Failed results
    /// leave the item unchanged.
    pub(crate) fn apply(
        &mut self,
        ticket: u64,
        quality: Quality,
        result: Result<CompressedImage>,
    ) -> Result<bool> {
        if ticket <= self.applied {
            return Ok(false);
        }
        self.settled = self.settled.max(ticket);

        let compressed = result?;
        self.applied = ticket;
        self.compressed = Some(compressed);
        self.compression_quality = Some(quality);
        Ok(true)
    }
}
