//! # podcast-items
//!
//! Item business layer for a podcast server.
//!
//! Items are podcast episodes persisted alongside their podcast. This crate
//! provides the operations a calling layer (an HTTP API, a CLI, a scheduler)
//! needs to manage them:
//! - **Queries** - pages, composable [predicates](predicate), status and
//!   download-date filters, selection of items to download
//! - **Lifecycle rules** - deleting detaches only that item from its podcast and the
//!   download queue; resetting never touches an item that is downloading
//! - **SQLite persistence** - a ready [`Database`] implementing the
//!   repository traits, with schema migrations
//!
//! ## Quick Start
//!
//! ```no_run
//! use podcast_items::{Config, Database, ItemBusiness, ItemDownloadManager, ResetOutcome};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let db = Arc::new(Database::new(&config.persistence.database_path).await?);
//!     let downloads = Arc::new(ItemDownloadManager::from_config(&config));
//!
//!     let business = ItemBusiness::new(db.clone(), db, downloads, config);
//!
//!     for item in business.find_all_to_download().await? {
//!         println!("to download: {}", item.title);
//!     }
//!
//!     if let ResetOutcome::SkippedActiveDownload = business.reset(33.into()).await? {
//!         println!("item 33 is downloading");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Item business rules
pub mod business;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Download queue tracking
pub mod download_manager;
/// Error types
pub mod error;
/// Composable item filters
pub mod predicate;
/// Repository traits
pub mod repository;
/// Core types
pub mod types;

// Re-export commonly used types
pub use business::{ItemBusiness, ResetOutcome};
pub use config::{Config, DownloadConfig, PersistenceConfig};
pub use db::Database;
pub use download_manager::{DownloadManager, ItemDownloadManager};
pub use error::{DatabaseError, Error, Result};
pub use predicate::ItemPredicate;
pub use repository::{ItemRepository, PodcastRepository};
pub use types::{
    Direction, Item, ItemId, ItemSortField, Page, PageRequest, Podcast, PodcastId, Sort, Status,
    UpdaterType,
};
