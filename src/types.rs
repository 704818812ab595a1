//! Core types for podcast-items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// Integer identifiers share the same conversions and the same sqlx mapping (INTEGER column)
macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Create a new identifier
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the inner i64 value
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl PartialEq<i64> for $name {
            fn eq(&self, other: &i64) -> bool {
                self.0 == *other
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
            }

            fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
                <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                Ok(Self(id))
            }
        }
    };
}

integer_id!(
    /// Unique identifier for an item (podcast episode)
    ItemId
);

integer_id!(
    /// Unique identifier for a podcast
    PodcastId
);

/// Download status of an item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Never downloaded, or reset
    NotDownloaded,
    /// File removed after a successful download
    Deleted,
    /// Download in progress
    Started,
    /// Successfully downloaded
    Finish,
    /// Stopped by the user
    Stopped,
    /// Paused by the user
    Paused,
    /// Download failed
    Failed,
}

impl Status {
    /// Convert integer status code to Status enum
    pub fn from_i32(status: i32) -> Self {
        match status {
            0 => Status::NotDownloaded,
            1 => Status::Deleted,
            2 => Status::Started,
            3 => Status::Finish,
            4 => Status::Stopped,
            5 => Status::Paused,
            6 => Status::Failed,
            _ => Status::Failed, // Default to Failed for unknown status
        }
    }

    /// Convert Status enum to integer status code
    pub fn to_i32(&self) -> i32 {
        match self {
            Status::NotDownloaded => 0,
            Status::Deleted => 1,
            Status::Started => 2,
            Status::Finish => 3,
            Status::Stopped => 4,
            Status::Paused => 5,
            Status::Failed => 6,
        }
    }
}

/// Kind of updater refreshing a podcast (RSS, YouTube, ...)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdaterType {
    /// Stable key stored on the podcast (e.g. "RSS")
    pub key: String,
    /// Display name
    pub name: String,
}

impl UpdaterType {
    /// Create an updater type from its key and display name
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }

    /// The key items are matched on
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A podcast episode and its download state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Database ID (None until first save)
    pub id: Option<ItemId>,
    /// Owning podcast
    pub podcast_id: Option<PodcastId>,
    /// Episode title
    pub title: String,
    /// Remote URL of the media
    pub url: String,
    /// Episode description
    pub description: Option<String>,
    /// Media mime type
    pub mime_type: Option<String>,
    /// Media length in bytes
    pub length: Option<i64>,
    /// Local file name once downloaded
    pub file_name: Option<String>,
    /// Download status
    pub status: Status,
    /// Download progression in percent (0-100)
    pub progression: i32,
    /// Number of failed download attempts
    pub number_of_fail: i32,
    /// Publication date from the feed
    pub pub_date: Option<DateTime<Utc>>,
    /// When the download finished
    pub download_date: Option<DateTime<Utc>>,
    /// When the item was first seen
    pub creation_date: DateTime<Utc>,
}

impl Item {
    /// Create a new, unsaved item
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            podcast_id: None,
            title: title.into(),
            url: url.into(),
            description: None,
            mime_type: None,
            length: None,
            file_name: None,
            status: Status::NotDownloaded,
            progression: 0,
            number_of_fail: 0,
            pub_date: None,
            download_date: None,
            creation_date: Utc::now(),
        }
    }

    /// Clear all download state so the item can be downloaded again.
    ///
    /// Identity, podcast membership and feed metadata are kept.
    pub fn reset(mut self) -> Self {
        self.status = Status::NotDownloaded;
        self.progression = 0;
        self.number_of_fail = 0;
        self.file_name = None;
        self.download_date = None;
        self
    }

    /// Whether the item has been downloaded and the file is still expected on disk
    pub fn is_downloaded(&self) -> bool {
        self.status == Status::Finish
    }
}

/// A podcast and the set of items it owns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podcast {
    /// Database ID (None until first save)
    pub id: Option<PodcastId>,
    /// Podcast title
    pub title: String,
    /// Feed URL
    pub url: String,
    /// Key of the [`UpdaterType`] refreshing this podcast
    pub updater_type: String,
    /// Items owned by this podcast
    pub items: BTreeSet<ItemId>,
}

impl Podcast {
    /// Create a new, unsaved podcast without items
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        updater_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            url: url.into(),
            updater_type: updater_type.into(),
            items: BTreeSet::new(),
        }
    }

    /// Add an item to the set. Returns false if it was already present.
    pub fn add_item(&mut self, id: ItemId) -> bool {
        self.items.insert(id)
    }

    /// Remove an item from the set. Returns true if it was present.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        self.items.remove(&id)
    }

    /// Whether the podcast owns the given item
    pub fn contains_item(&self, id: ItemId) -> bool {
        self.items.contains(&id)
    }
}

/// Field a page of items can be ordered by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortField {
    /// Database ID
    #[default]
    Id,
    /// Title
    Title,
    /// Publication date
    PubDate,
    /// Download date
    DownloadDate,
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// Ordering of a page request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Field to order by
    pub field: ItemSortField,
    /// Direction
    pub direction: Direction,
}

/// Request for one page of items
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: u32,
    /// Page size (at least 1)
    pub size: u32,
    /// Optional ordering (default: id ascending)
    #[serde(default)]
    pub sort: Option<Sort>,
}

impl PageRequest {
    /// Request page `page` of `size` elements. A size of 0 is raised to 1.
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.max(1),
            sort: None,
        }
    }

    /// Same request with an ordering
    pub fn sorted_by(mut self, field: ItemSortField, direction: Direction) -> Self {
        self.sort = Some(Sort { field, direction });
        self
    }

    /// Number of elements skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Elements of this page
    pub content: Vec<T>,
    /// Zero-based page number
    pub number: u32,
    /// Requested page size
    pub size: u32,
    /// Number of elements across all pages
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Build a page for the given request
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    /// An empty page for the given request
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Number of pages needed to hold every element
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    /// Whether this is the first page
    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    /// Whether a page follows this one
    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    /// Whether this is the last page
    pub fn is_last(&self) -> bool {
        !self.has_next()
    }
}
