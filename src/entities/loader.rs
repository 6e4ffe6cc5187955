//! Image store: decodes uploads into `SourceImage`s.
//!
//! Two entry points:
//! - `Loader` - synchronous decode (headless export, tests)
//! - `ImageStore` - queues decodes on `Workers` and hands finished images
//!   back through a channel, drained once per frame tick
//!
//! Non-image inputs come back as `LoadError::NotAnImage`; callers drop them
//! without surfacing an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};

use super::source_image::{round_corners, SourceImage, CORNER_RADIUS};
use crate::core::workers::Workers;
use crate::utils::media;

/// Image loading errors
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Input is not a recognised image (filtered, not reported)
    NotAnImage(String),
    Decode(String),
    Io(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotAnImage(name) => write!(f, "Not an image: {}", name),
            LoadError::Decode(msg) => write!(f, "Image decode failed: {}", msg),
            LoadError::Io(msg) => write!(f, "Image read failed: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

impl LoadError {
    /// Malformed input is silently ignored rather than reported
    pub fn is_filtered(&self) -> bool {
        matches!(self, LoadError::NotAnImage(_))
    }
}

/// Synchronous decoder
pub struct Loader;

impl Loader {
    /// Decode an in-memory blob. Format is sniffed from the bytes.
    pub fn decode_bytes(name: &str, bytes: &[u8]) -> Result<SourceImage, LoadError> {
        let format = image::guess_format(bytes).map_err(|_| LoadError::NotAnImage(name.to_string()))?;
        debug!("Decoding {} as {:?} ({} bytes)", name, format, bytes.len());

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| LoadError::Decode(format!("{}: {}", name, e)))?;
        let mut rgba = decoded.to_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(LoadError::Decode(format!("{}: empty image", name)));
        }
        round_corners(&mut rgba, CORNER_RADIUS);
        Ok(SourceImage::new(name, rgba))
    }

    /// Read and decode a file. Unknown extensions are filtered before reading.
    pub fn load_path(path: &Path) -> Result<SourceImage, LoadError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        if !media::is_image(path) {
            return Err(LoadError::NotAnImage(name));
        }
        let bytes = std::fs::read(path).map_err(|e| LoadError::Io(format!("{}: {}", path.display(), e)))?;
        Self::decode_bytes(&name, &bytes)
    }
}

/// Finished decode tagged with the epoch it was requested in
struct Decoded {
    epoch: u64,
    result: Result<SourceImage, LoadError>,
}

/// Asynchronous image store backed by the decode worker pool.
pub struct ImageStore {
    workers: Arc<Workers>,
    tx: Sender<Decoded>,
    rx: Receiver<Decoded>,
}

impl ImageStore {
    pub fn new(workers: Arc<Workers>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { workers, tx, rx }
    }

    /// Queue a file for decoding
    pub fn request_path(&self, path: PathBuf) {
        let epoch = self.workers.current_epoch();
        let tx = self.tx.clone();
        self.workers.execute_with_epoch(epoch, move || {
            let result = Loader::load_path(&path);
            let _ = tx.send(Decoded { epoch, result });
        });
    }

    /// Queue an in-memory blob (drag-and-drop from a browser, clipboard)
    pub fn request_bytes(&self, name: String, bytes: Arc<[u8]>) {
        let epoch = self.workers.current_epoch();
        let tx = self.tx.clone();
        self.workers.execute_with_epoch(epoch, move || {
            let result = Loader::decode_bytes(&name, &bytes);
            let _ = tx.send(Decoded { epoch, result });
        });
    }

    /// Drop everything requested so far; in-flight decodes never contribute.
    pub fn invalidate(&self) {
        let epoch = self.workers.bump_epoch();
        debug!("Image store invalidated, epoch {}", epoch);
    }

    /// Drain completed decodes in completion order.
    ///
    /// Returns accepted images and user-facing failures. Non-images and stale
    /// results are dropped here.
    pub fn poll(&self) -> (Vec<Arc<SourceImage>>, Vec<LoadError>) {
        let current = self.workers.current_epoch();
        let mut images = Vec::new();
        let mut errors = Vec::new();
        for decoded in self.rx.try_iter() {
            if decoded.epoch != current {
                continue;
            }
            match decoded.result {
                Ok(img) => images.push(Arc::new(img)),
                Err(e) if e.is_filtered() => debug!("Ignoring upload: {}", e),
                Err(e) => {
                    warn!("{}", e);
                    errors.push(e);
                }
            }
        }
        (images, errors)
    }
}
