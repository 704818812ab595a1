//! Item business rules.
//!
//! [`ItemBusiness`] sits between a calling layer and its collaborators: the
//! item and podcast repositories and the download manager. Most operations
//! are plain delegation; the rules it owns are:
//!
//! - deleting an item detaches it from its podcast, removes the row, then drops
//!   it from the download queue; a failed row delete reattaches the item
//! - an item that is actively downloading is never reset
//! - download selection looks back `number_of_days_to_download` days

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::download_manager::DownloadManager;
use crate::error::{Error, Result};
use crate::predicate::{
    ItemPredicate, has_been_downloaded_after, has_status, is_newer_than, is_not_downloaded,
    is_of_type,
};
use crate::repository::{ItemRepository, PodcastRepository};
use crate::types::{Item, ItemId, Page, PageRequest, Status, UpdaterType};


/// Result of [`ItemBusiness::reset`]
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum ResetOutcome {
    /// The item was reset and saved; holds the stored version
    Reset(Item),
    /// Nothing was changed because the item is actively downloading
    SkippedActiveDownload,
}

impl ResetOutcome {
    /// The reset item, if the reset happened
    pub fn into_item(self) -> Option<Item> {
        match self {
            ResetOutcome::Reset(item) => Some(item),
            ResetOutcome::SkippedActiveDownload => None,
        }
    }

    /// Whether the reset was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self, ResetOutcome::SkippedActiveDownload)
    }
}

/// Business operations on items
#[derive(Clone)]
pub struct ItemBusiness {
    items: Arc<dyn ItemRepository>,
    podcasts: Arc<dyn PodcastRepository>,
    download_manager: Arc<dyn DownloadManager>,
    config: Arc<Config>,
}

impl ItemBusiness {
    /// Wire the service to its collaborators
    pub fn new(
        items: Arc<dyn ItemRepository>,
        podcasts: Arc<dyn PodcastRepository>,
        download_manager: Arc<dyn DownloadManager>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            items,
            podcasts,
            download_manager,
            config,
        }
    }

    /// One page of items, exactly as the repository returns it
    pub async fn find_page(&self, request: PageRequest) -> Result<Page<Item>> {
        self.items.find_page(request).await
    }

    /// Every item matching the predicate, exactly as the repository returns it
    pub async fn find_all(&self, predicate: &ItemPredicate) -> Result<Vec<Item>> {
        self.items.find_all(predicate).await
    }

    /// Persist an item and return the stored version
    pub async fn save(&self, item: Item) -> Result<Item> {
        self.items.save(item).await
    }

    /// Look up an item
    pub async fn find_one(&self, id: ItemId) -> Result<Option<Item>> {
        self.items.find_one(id).await
    }

    /// Delete an item.
    ///
    /// Only this item is detached from its podcast; other members are left
    /// alone. The download queue is cleared once the row is gone. If the
    /// repository delete fails the item is reattached and stays queued.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no item has this ID.
    pub async fn delete(&self, id: ItemId) -> Result<()> {
        let item = self.require(id).await?;

        let detached_from = match item.podcast_id {
            Some(podcast_id) => {
                if self.podcasts.remove_item(podcast_id, id).await? {
                    Some(podcast_id)
                } else {
                    tracing::warn!(item_id = %id, podcast_id = %podcast_id, "Item not attached to its podcast, skipping detach");
                    None
                }
            }
            None => None,
        };

        if let Err(e) = self.items.delete(&item).await {
            if let Some(podcast_id) = detached_from {
                if let Err(restore) = self.podcasts.add_item(podcast_id, id).await {
                    tracing::error!(
                        item_id = %id,
                        podcast_id = %podcast_id,
                        error = %restore,
                        "Failed to reattach item after failed delete"
                    );
                }
            }
            return Err(e);
        }

        self.download_manager
            .remove_item_from_queue_and_download(&item)
            .await;

        tracing::info!(item_id = %id, "Item deleted");
        Ok(())
    }

    /// Rebuild the repository's item index
    pub async fn reindex(&self) -> Result<()> {
        tracing::info!("Reindexing items");
        self.items.reindex().await
    }

    /// Clear an item's download state, unless it is downloading right now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no item has this ID.
    pub async fn reset(&self, id: ItemId) -> Result<ResetOutcome> {
        let item = self.require(id).await?;

        if self.download_manager.is_in_downloading_queue(&item).await {
            tracing::warn!(item_id = %id, "Item is downloading, reset skipped");
            return Ok(ResetOutcome::SkippedActiveDownload);
        }

        let saved = self.items.save(item.reset()).await?;
        tracing::info!(item_id = %id, "Item reset");
        Ok(ResetOutcome::Reset(saved))
    }

    /// Items whose status is any of `statuses`
    pub async fn find_by_status(&self, statuses: &[Status]) -> Result<Vec<Item>> {
        self.items
            .find_all(&has_status(statuses.iter().copied()))
            .await
    }

    /// Items of podcasts refreshed by `updater_type`, downloaded after `date`
    pub async fn find_by_type_and_download_date_after(
        &self,
        updater_type: &UpdaterType,
        date: DateTime<Utc>,
    ) -> Result<Vec<Item>> {
        let predicate = is_of_type(updater_type.key()).and(has_been_downloaded_after(date));
        self.items.find_all(&predicate).await
    }

    /// Items published within the configured look-back window and not downloaded yet
    pub async fn find_all_to_download(&self) -> Result<Vec<Item>> {
        let days = self.config.number_of_days_to_download();
        let since = Duration::try_days(i64::from(days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| Error::Config {
                message: format!(
                    "number_of_days_to_download ({}) reaches past the earliest representable date",
                    days
                ),
                key: Some("number_of_days_to_download".to_string()),
            })?;

        let items = self
            .items
            .find_all(&is_newer_than(since).and(is_not_downloaded()))
            .await?;

        tracing::debug!(days, count = items.len(), "Selected items to download");
        Ok(items)
    }

    async fn require(&self, id: ItemId) -> Result<Item> {
        self.items
            .find_one(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("item {}", id)))
    }
}
