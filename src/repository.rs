//! Persistence seams for items and podcasts
//!
//! The business layer only talks to these traits. [`crate::Database`] is the
//! SQLite implementation; tests substitute recording doubles.

use async_trait::async_trait;

use crate::Result;
use crate::predicate::ItemPredicate;
use crate::types::{Item, ItemId, Page, PageRequest, Podcast, PodcastId};

/// Storage and query execution for items
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Fetch one page of items
    async fn find_page(&self, request: PageRequest) -> Result<Page<Item>>;

    /// Fetch every item matching the predicate
    async fn find_all(&self, predicate: &ItemPredicate) -> Result<Vec<Item>>;

    /// Fetch an item by ID
    async fn find_one(&self, id: ItemId) -> Result<Option<Item>>;

    /// Insert or update an item and return the stored version
    ///
    /// # Errors
    ///
    /// Returns an error if the item has an ID that is not stored.
    async fn save(&self, item: Item) -> Result<Item>;

    /// Delete a stored item
    async fn delete(&self, item: &Item) -> Result<()>;

    /// Rebuild the item indexes
    async fn reindex(&self) -> Result<()>;
}

/// Storage for podcasts and their item sets
#[async_trait]
pub trait PodcastRepository: Send + Sync {
    /// Fetch a podcast, including the IDs of the items it owns
    async fn find_one(&self, id: PodcastId) -> Result<Option<Podcast>>;

    /// Insert or update a podcast; its item set becomes the stored membership
    async fn save(&self, podcast: Podcast) -> Result<Podcast>;

    /// Detach one item from a podcast, leaving its other items untouched.
    ///
    /// Returns false when the podcast did not own the item.
    async fn remove_item(&self, podcast: PodcastId, item: ItemId) -> Result<bool>;

    /// Attach one item to a podcast.
    ///
    /// Returns false when the item does not exist.
    async fn add_item(&self, podcast: PodcastId, item: ItemId) -> Result<bool>;
}
