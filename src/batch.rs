use crate::archive::{ArchiveExporter, Download};
use crate::error::{CompressionError, Result};
use crate::formats::is_image_mime;
use crate::item::{ImageItem, ItemId};
use crate::processing::{CompressedImage, Compressor, ImageCompressor, Quality};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// A raw file handed over by a file picker or drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// State change of one item, for whoever renders the batch.
#[derive(Debug)]
pub enum ItemEvent {
    Compressed {
        id: ItemId,
        quality: Quality,
    },
    Failed {
        id: ItemId,
        quality: Quality,
        error: CompressionError,
    },
}

impl ItemEvent {
    pub fn id(&self) -> ItemId {
        match self {
            ItemEvent::Compressed { id, .. } | ItemEvent::Failed { id, .. } => *id,
        }
    }
}

struct CompressionOutcome {
    id: ItemId,
    ticket: u64,
    quality: Quality,
    result: Result<CompressedImage>,
}

/// Owns every item of a batch and drives their compression.
///
/// Compressions run on the rayon pool and report back over a channel; only
/// the controller applies results, one at a time, from [`next_event`].
/// Results for an item are applied in the order they were dispatched, and a
/// result that arrives after a newer one has been applied is dropped.
///
/// [`next_event`]: BatchController::next_event
pub struct BatchController {
    items: BTreeMap<ItemId, ImageItem>,
    next_id: u64,
    quality: Quality,
    compressor: Arc<dyn Compressor>,
    sender: UnboundedSender<CompressionOutcome>,
    receiver: UnboundedReceiver<CompressionOutcome>,
    pending: usize,
}

impl Default for BatchController {
    fn default() -> Self {
        Self::new(Quality::default())
    }
}

impl BatchController {
    pub fn new(quality: Quality) -> Self {
        Self::with_compressor(quality, Arc::new(ImageCompressor))
    }

    pub fn with_compressor(quality: Quality, compressor: Arc<dyn Compressor>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            items: BTreeMap::new(),
            next_id: 1,
            quality,
            compressor,
            sender,
            receiver,
            pending: 0,
        }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.values()
    }

    pub fn item(&self, id: ItemId) -> Option<&ImageItem> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compressions dispatched but not yet received.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Add every image file to the batch and start compressing it at the
    /// current quality. Entries whose MIME type is not `image/*` are skipped.
    ///
    /// # Returns
    /// * `Ok(ids)` - Ids of the new items, in input order
    /// * `Err(CompressionError::NoImages)` - Nothing was an image; the batch is unchanged
    pub fn ingest<I>(&mut self, files: I) -> Result<Vec<ItemId>>
    where
        I: IntoIterator<Item = IncomingFile>,
    {
        let (accepted, rejected): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|file| is_image_mime(&file.mime_type));

        for file in &rejected {
            debug!(name = %file.name, mime_type = %file.mime_type, "skipping non-image file");
        }

        if accepted.is_empty() {
            return Err(CompressionError::NoImages);
        }

        info!(
            accepted = accepted.len(),
            rejected = rejected.len(),
            quality = %self.quality,
            "ingesting files"
        );

        let mut ids = Vec::with_capacity(accepted.len());
        for file in accepted {
            let id = self.insert(file);
            self.dispatch(id);
            ids.push(id);
        }

        Ok(ids)
    }

    /// Recompress every item at `quality`. Returns immediately; results
    /// arrive through [`BatchController::next_event`].
    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
        info!(quality = %quality, items = self.items.len(), "quality changed");

        let ids: Vec<ItemId> = self.items.keys().copied().collect();
        for id in ids {
            self.dispatch(id);
        }
    }

    /// Slider entry point: validates a 1-100 value before recompressing.
    pub fn set_quality_percent(&mut self, percent: u8) -> Result<()> {
        let quality = Quality::from_percent(percent)?;
        self.set_quality(quality);
        Ok(())
    }

    /// Wait for the next compression to finish and apply it.
    ///
    /// Stale results are discarded without an event. Returns `None` once
    /// nothing is in flight.
    pub async fn next_event(&mut self) -> Option<ItemEvent> {
        while self.pending > 0 {
            let outcome = self.receiver.recv().await?;
            self.pending -= 1;

            if let Some(event) = self.apply(outcome) {
                return Some(event);
            }
        }
        None
    }

    /// Apply every outstanding compression and return the resulting events.
    pub async fn settle(&mut self) -> Vec<ItemEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    pub fn export_archive(&self) -> Result<Download> {
        self.export_archive_with(&ArchiveExporter::default())
    }

    pub fn export_archive_with(&self, exporter: &ArchiveExporter) -> Result<Download> {
        exporter.export(self.items.values())
    }

    pub fn download(&self, id: ItemId) -> Result<Download> {
        let item = self
            .items
            .get(&id)
            .ok_or(CompressionError::ItemNotFound(id))?;
        ArchiveExporter::single(item)
    }

    fn insert(&mut self, file: IncomingFile) -> ItemId {
        let id = ItemId::new(self.next_id);
        self.next_id += 1;

        let item = ImageItem::new(id, file.name, file.mime_type, file.bytes, self.quality);
        self.items.insert(id, item);
        id
    }

    fn dispatch(&mut self, id: ItemId) {
        let quality = self.quality;
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };

        let ticket = item.issue_ticket(quality);
        let bytes = item.shared_original();
        let mime_type = item.mime_type().to_string();
        let compressor = Arc::clone(&self.compressor);
        let sender = self.sender.clone();
        self.pending += 1;

        debug!(item = %id, ticket, quality = %quality, "dispatching compression");

        rayon::spawn(move || {
            // A panic must not abort the pool or leave the outcome unsent
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                compressor.compress(&bytes, &mime_type, quality)
            }))
            .unwrap_or_else(|payload| {
                Err(CompressionError::Encode(format!(
                    "compressor panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
            // Only fails when the controller has been dropped
            let _ = sender.send(CompressionOutcome {
                id,
                ticket,
                quality,
                result,
            });
        });
    }

    fn apply(&mut self, outcome: CompressionOutcome) -> Option<ItemEvent> {
        let CompressionOutcome {
            id,
            ticket,
            quality,
            result,
        } = outcome;
        let item = self.items.get_mut(&id)?;

        match item.apply(ticket, quality, result) {
            Ok(true) => {
                debug!(
                    item = %id,
                    ticket,
                    size = item.compressed_size().unwrap_or_default(),
                    "compression applied"
                );
                Some(ItemEvent::Compressed { id, quality })
            }
            Ok(false) => {
                debug!(item = %id, ticket, "discarding stale compression");
                None
            }
            Err(error) => {
                warn!(item = %id, name = %item.display_name(), %error, "compression failed");
                Some(ItemEvent::Failed { id, quality, error })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
