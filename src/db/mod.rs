//! Database layer for podcast-items
//!
//! Handles SQLite persistence for podcasts and their items.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - `migrations` - Database lifecycle, schema migrations
//! - `items` - Item CRUD, predicate queries, pagination, reindex
//! - `podcasts` - Podcast CRUD and item-set membership

use crate::types::{Item, ItemId, Podcast, PodcastId, Status};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod items;
mod migrations;
mod podcasts;

/// Item columns, qualified with the `i` alias used by every item query
pub(crate) const ITEM_COLUMNS: &str = r#"
    i.id, i.podcast_id, i.title, i.url, i.description, i.mime_type, i.length,
    i.file_name, i.status, i.progression, i.number_of_fail,
    i.pub_date, i.download_date, i.creation_date
"#;

/// Item record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    /// Unique database ID
    pub id: i64,
    /// Owning podcast
    pub podcast_id: Option<i64>,
    /// Episode title
    pub title: String,
    /// Media URL
    pub url: String,
    /// Episode description
    pub description: Option<String>,
    /// Media mime type
    pub mime_type: Option<String>,
    /// Media length in bytes
    pub length: Option<i64>,
    /// Local file name
    pub file_name: Option<String>,
    /// Status code (see [`Status::to_i32`])
    pub status: i32,
    /// Download progression in percent
    pub progression: i32,
    /// Failed download attempts
    pub number_of_fail: i32,
    /// Unix timestamp of publication
    pub pub_date: Option<i64>,
    /// Unix timestamp of download
    pub download_date: Option<i64>,
    /// Unix timestamp when the item was created
    pub creation_date: i64,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: Some(ItemId(row.id)),
            podcast_id: row.podcast_id.map(PodcastId),
            title: row.title,
            url: row.url,
            description: row.description,
            mime_type: row.mime_type,
            length: row.length,
            file_name: row.file_name,
            status: Status::from_i32(row.status),
            progression: row.progression,
            number_of_fail: row.number_of_fail,
            pub_date: row.pub_date.and_then(from_timestamp),
            download_date: row.download_date.and_then(from_timestamp),
            creation_date: from_timestamp(row.creation_date).unwrap_or_else(Utc::now),
        }
    }
}

/// Podcast record from database, without its item set
#[derive(Debug, Clone, FromRow)]
pub struct PodcastRow {
    /// Unique database ID
    pub id: i64,
    /// Podcast title
    pub title: String,
    /// Feed URL
    pub url: String,
    /// Updater type key
    pub updater_type: String,
}

impl From<PodcastRow> for Podcast {
    fn from(row: PodcastRow) -> Self {
        Podcast {
            id: Some(PodcastId(row.id)),
            title: row.title,
            url: row.url,
            updater_type: row.updater_type,
            items: Default::default(),
        }
    }
}

fn from_timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Database handle for podcast-items
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
