//! Engine event bus.
//!
//! The engine emits `CarouselEvent`s while it ticks; the app drains them once
//! per frame with `poll()` (status line, logging). Subscribers registered with
//! `subscribe()` are also called synchronously on emit.
//!
//! Every failure the user should see arrives as `CarouselEvent::Notice`.
//! Notices are transient: nothing in the engine waits on them.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use log::warn;

/// Maximum events in queue before the oldest are evicted
const MAX_QUEUE_SIZE: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-visible, retryable message
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CarouselEvent {
    /// Decoded images appended to the collection
    ImagesAccepted { added: usize, total: usize },
    LayoutRebuilt { items: usize, total_width: f32 },
    CarouselReset,
    RecordingStarted { stop_frame: u32, output: PathBuf },
    RecordingFinished { frames: u32, output: PathBuf },
    SnapshotSaved(PathBuf),
    Notice(Notice),
}

type Callback = Arc<dyn Fn(&CarouselEvent) + Send + Sync>;

/// Deferred event queue with optional immediate subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Callback>>>,
    queue: Arc<Mutex<VecDeque<CarouselEvent>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.read().map(|s| s.len()).unwrap_or(0))
            .field("queue_len", &self.queue_len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` synchronously for every emitted event
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&CarouselEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(callback));
    }

    pub fn emit(&self, event: CarouselEvent) {
        for cb in self.subscribers.read().unwrap_or_else(|e| e.into_inner()).iter() {
            cb(&event);
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict_count = queue.len() / 2;
            warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
            queue.drain(0..evict_count);
        }
        queue.push_back(event);
    }

    pub fn notify(&self, notice: Notice) {
        self.emit(CarouselEvent::Notice(notice));
    }

    /// All events emitted since the last poll, oldest first
    pub fn poll(&self) -> Vec<CarouselEvent> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}
