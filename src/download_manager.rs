//! Download queue membership tracking.
//!
//! [`ItemDownloadManager`] keeps a FIFO waiting queue and the set of items
//! actively downloading, bounded by `max_concurrent_downloads`. The transfer
//! itself is driven elsewhere; this type only answers "is it downloading?" and
//! applies queue removals.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::types::{Item, ItemId};

/// Collaborator tracking which items are queued or downloading
#[async_trait]
pub trait DownloadManager: Send + Sync {
    /// Whether the item is actively downloading
    async fn is_in_downloading_queue(&self, item: &Item) -> bool;

    /// Remove the item from the waiting queue and stop it if it is downloading
    async fn remove_item_from_queue_and_download(&self, item: &Item);
}

#[derive(Default)]
struct QueueState {
    waiting: VecDeque<Item>,
    downloading: HashMap<ItemId, Item>,
}

/// In-memory download queue
pub struct ItemDownloadManager {
    state: Mutex<QueueState>,
    limit: usize,
}

impl ItemDownloadManager {
    /// Create an empty manager running at most `limit` downloads at once (minimum 1)
    pub fn new(limit: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            limit: limit.max(1),
        }
    }

    /// Create a manager using the configured concurrency limit
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.download.max_concurrent_downloads)
    }

    /// Maximum number of simultaneous downloads
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append an item to the waiting queue.
    ///
    /// Returns false when the item is unsaved, already waiting, or already downloading.
    pub async fn add_item_to_queue(&self, item: Item) -> bool {
        let Some(id) = item.id else {
            tracing::warn!(title = %item.title, "Refusing to queue an unsaved item");
            return false;
        };

        let mut state = self.state.lock().await;
        if state.downloading.contains_key(&id) || state.waiting.iter().any(|i| i.id == Some(id)) {
            return false;
        }

        state.waiting.push_back(item);
        tracing::debug!(item_id = %id, waiting = state.waiting.len(), "Item queued");
        true
    }

    /// Move waiting items to the downloading set until the limit is reached.
    ///
    /// Returns the items that were started, in queue order.
    pub async fn launch_downloads(&self) -> Vec<Item> {
        let mut state = self.state.lock().await;
        let mut started = Vec::new();

        while state.downloading.len() < self.limit {
            let Some(item) = state.waiting.pop_front() else {
                break;
            };
            if let Some(id) = item.id {
                state.downloading.insert(id, item.clone());
                started.push(item);
            }
        }

        if !started.is_empty() {
            tracing::info!(
                started = started.len(),
                downloading = state.downloading.len(),
                waiting = state.waiting.len(),
                "Launched downloads"
            );
        }

        started
    }

    /// Mark a download as finished, freeing its slot
    pub async fn finish_download(&self, id: ItemId) -> Option<Item> {
        let finished = self.state.lock().await.downloading.remove(&id);
        if finished.is_some() {
            tracing::debug!(item_id = %id, "Download finished");
        }
        finished
    }

    /// Items waiting to start, in queue order
    pub async fn waiting_queue(&self) -> Vec<Item> {
        self.state.lock().await.waiting.iter().cloned().collect()
    }

    /// Items actively downloading, ordered by ID
    pub async fn downloading_items(&self) -> Vec<Item> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state.downloading.values().cloned().collect();
        items.sort_by_key(|item| item.id);
        items
    }
}

#[async_trait]
impl DownloadManager for ItemDownloadManager {
    async fn is_in_downloading_queue(&self, item: &Item) -> bool {
        match item.id {
            Some(id) => self.state.lock().await.downloading.contains_key(&id),
            None => false,
        }
    }

    async fn remove_item_from_queue_and_download(&self, item: &Item) {
        let Some(id) = item.id else {
            return;
        };

        let mut state = self.state.lock().await;
        let waiting_before = state.waiting.len();
        state.waiting.retain(|i| i.id != Some(id));
        let was_waiting = state.waiting.len() < waiting_before;
        let was_downloading = state.downloading.remove(&id).is_some();

        if was_waiting || was_downloading {
            tracing::info!(
                item_id = %id,
                was_waiting,
                was_downloading,
                "Removed item from download queue"
            );
        }
    }
}
