//! Podcast CRUD and item-set membership.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::DatabaseError;
use crate::repository::PodcastRepository;
use crate::types::{ItemId, Podcast, PodcastId};
use crate::{Error, Result};

use super::items::write_error;
use super::{Database, PodcastRow};

impl Database {
    /// Get a podcast by ID, with the IDs of the items it owns
    pub async fn get_podcast(&self, id: PodcastId) -> Result<Option<Podcast>> {
        let row = sqlx::query_as::<_, PodcastRow>(
            "SELECT id, title, url, updater_type FROM podcasts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get podcast: {}",
                e
            )))
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_ids: Vec<ItemId> =
            sqlx::query_scalar("SELECT id FROM items WHERE podcast_id = ? ORDER BY id")
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to list podcast items: {}",
                        e
                    )))
                })?;

        let mut podcast = Podcast::from(row);
        podcast.items = item_ids.into_iter().collect::<BTreeSet<_>>();
        Ok(Some(podcast))
    }

    /// Insert or update a podcast and make its item set the stored membership.
    ///
    /// Items listed in the set are attached to the podcast; items the podcast
    /// owned that are no longer listed are detached (their podcast becomes NULL).
    pub async fn save_podcast(&self, podcast: &Podcast) -> Result<Podcast> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let id = match podcast.id {
            None => {
                let result = sqlx::query(
                    "INSERT INTO podcasts (title, url, updater_type, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(&podcast.title)
                .bind(&podcast.url)
                .bind(&podcast.updater_type)
                .bind(chrono::Utc::now().timestamp())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to insert podcast: {}",
                        e
                    )))
                })?;
                PodcastId(result.last_insert_rowid())
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE podcasts SET title = ?, url = ?, updater_type = ? WHERE id = ?",
                )
                .bind(&podcast.title)
                .bind(&podcast.url)
                .bind(&podcast.updater_type)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to update podcast: {}",
                        e
                    )))
                })?;

                if result.rows_affected() == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Podcast {} not found",
                        id
                    ))));
                }
                id
            }
        };

        // Detach items that left the set
        let mut detach = sqlx::QueryBuilder::<sqlx::Sqlite>::new("UPDATE items SET podcast_id = NULL WHERE podcast_id = ");
        detach.push_bind(id);
        if !podcast.items.is_empty() {
            detach.push(" AND id NOT IN (");
            let mut separated = detach.separated(", ");
            for item_id in &podcast.items {
                separated.push_bind(*item_id);
            }
            separated.push_unseparated(")");
        }
        let detached = detach.build().execute(&mut *tx).await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to detach podcast items: {}",
                e
            )))
        })?;

        // Attach items that joined the set
        if !podcast.items.is_empty() {
            let mut attach = sqlx::QueryBuilder::<sqlx::Sqlite>::new("UPDATE items SET podcast_id = ");
            attach.push_bind(id);
            attach.push(" WHERE id IN (");
            let mut separated = attach.separated(", ");
            for item_id in &podcast.items {
                separated.push_bind(*item_id);
            }
            separated.push_unseparated(")");
            attach.build().execute(&mut *tx).await.map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to attach podcast items: {}",
                    e
                )))
            })?;
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit podcast: {}",
                e
            )))
        })?;

        tracing::debug!(
            podcast_id = %id,
            items = podcast.items.len(),
            detached = detached.rows_affected(),
            "Saved podcast"
        );

        self.get_podcast(id).await?.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "Podcast {} vanished after save",
                id
            )))
        })
    }

    /// Clear the podcast of one item, if that podcast owns it
    pub async fn detach_item_from_podcast(&self, podcast: PodcastId, item: ItemId) -> Result<bool> {
        let result = sqlx::query("UPDATE items SET podcast_id = NULL WHERE id = ? AND podcast_id = ?")
            .bind(item)
            .bind(podcast)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to detach item: {}",
                    e
                )))
            })?;

        let detached = result.rows_affected() > 0;
        tracing::debug!(podcast_id = %podcast, item_id = %item, detached, "Detach item from podcast");
        Ok(detached)
    }

    /// Make `podcast` the owner of one item
    pub async fn attach_item_to_podcast(&self, podcast: PodcastId, item: ItemId) -> Result<bool> {
        let result = sqlx::query("UPDATE items SET podcast_id = ? WHERE id = ?")
            .bind(podcast)
            .bind(item)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error("Failed to attach item", e))?;

        let attached = result.rows_affected() > 0;
        tracing::debug!(podcast_id = %podcast, item_id = %item, attached, "Attach item to podcast");
        Ok(attached)
    }
}

#[async_trait]
impl PodcastRepository for Database {
    async fn find_one(&self, id: PodcastId) -> Result<Option<Podcast>> {
        self.get_podcast(id).await
    }

    async fn save(&self, podcast: Podcast) -> Result<Podcast> {
        self.save_podcast(&podcast).await
    }

    async fn remove_item(&self, podcast: PodcastId, item: ItemId) -> Result<bool> {
        self.detach_item_from_podcast(podcast, item).await
    }

    async fn add_item(&self, podcast: PodcastId, item: ItemId) -> Result<bool> {
        self.attach_item_to_podcast(podcast, item).await
    }
}
