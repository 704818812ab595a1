//! Item CRUD, predicate queries and pagination.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use crate::error::DatabaseError;
use crate::predicate::ItemPredicate;
use crate::repository::ItemRepository;
use crate::types::{Direction, Item, ItemId, ItemSortField, Page, PageRequest};
use crate::{Error, Result};

use super::{Database, ITEM_COLUMNS, ItemRow};

/// Map a failed item write, surfacing unknown podcast references as constraint violations
pub(super) fn write_error(context: &str, e: sqlx::Error) -> Error {
    let is_fk = e
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation());

    if is_fk {
        Error::Database(DatabaseError::ConstraintViolation(format!(
            "{}: unknown podcast",
            context
        )))
    } else {
        Error::Database(DatabaseError::QueryFailed(format!("{}: {}", context, e)))
    }
}

fn order_column(field: ItemSortField) -> &'static str {
    match field {
        ItemSortField::Id => "i.id",
        ItemSortField::Title => "i.title",
        ItemSortField::PubDate => "i.pub_date",
        ItemSortField::DownloadDate => "i.download_date",
    }
}

impl Database {
    /// Get an item by ID
    pub async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM items i WHERE i.id = ", ITEM_COLUMNS));
        qb.push_bind(id);

        let row = qb
            .build_query_as::<ItemRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get item: {}",
                    e
                )))
            })?;

        Ok(row.map(Item::from))
    }

    /// List items matching a predicate, oldest ID first
    pub async fn list_items_matching(&self, predicate: &ItemPredicate) -> Result<Vec<Item>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM items i LEFT JOIN podcasts p ON p.id = i.podcast_id WHERE ",
            ITEM_COLUMNS
        ));
        predicate.push_sql(&mut qb);
        qb.push(" ORDER BY i.id ASC");

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list items: {}",
                    e
                )))
            })?;

        tracing::debug!(count = rows.len(), ?predicate, "Listed items matching predicate");

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Count all items
    pub async fn count_items(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count items: {}",
                    e
                )))
            })?;

        Ok(count.max(0) as u64)
    }

    /// Fetch one page of items in the requested order (default: ID ascending).
    ///
    /// The total and the page content are read from the same snapshot.
    pub async fn list_items_page(&self, request: PageRequest) -> Result<Page<Item>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count items: {}",
                    e
                )))
            })?;

        let sort = request.sort.unwrap_or_default();
        let direction = match sort.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM items i", ITEM_COLUMNS));
        // Tie-break on id so pages are stable when the sort column has duplicates
        qb.push(format!(
            " ORDER BY {} {}, i.id ASC LIMIT ",
            order_column(sort.field),
            direction
        ));
        qb.push_bind(i64::from(request.size));
        qb.push(" OFFSET ");
        qb.push_bind(request.offset() as i64);

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list items page: {}",
                    e
                )))
            })?;

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to end page read: {}",
                e
            )))
        })?;

        Ok(Page::new(
            rows.into_iter().map(Item::from).collect(),
            request,
            total.max(0) as u64,
        ))
    }

    /// Insert a new item, or update it when it already has an ID, and return the stored row
    pub async fn save_item(&self, item: &Item) -> Result<Item> {
        let id = match item.id {
            None => self.insert_item(item).await?,
            Some(id) => {
                self.update_item(id, item).await?;
                id
            }
        };

        self.get_item(id).await?.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "Item {} vanished after save",
                id
            )))
        })
    }

    async fn insert_item(&self, item: &Item) -> Result<ItemId> {
        let result = sqlx::query(
            r#"
            INSERT INTO items (
                podcast_id, title, url, description, mime_type, length,
                file_name, status, progression, number_of_fail,
                pub_date, download_date, creation_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.podcast_id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.description)
        .bind(&item.mime_type)
        .bind(item.length)
        .bind(&item.file_name)
        .bind(item.status.to_i32())
        .bind(item.progression)
        .bind(item.number_of_fail)
        .bind(item.pub_date.map(|d| d.timestamp()))
        .bind(item.download_date.map(|d| d.timestamp()))
        .bind(item.creation_date.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("Failed to insert item", e))?;

        let id = ItemId(result.last_insert_rowid());
        tracing::debug!(item_id = %id, "Inserted item");

        Ok(id)
    }

    async fn update_item(&self, id: ItemId, item: &Item) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE items SET
                podcast_id = ?, title = ?, url = ?, description = ?, mime_type = ?,
                length = ?, file_name = ?, status = ?, progression = ?,
                number_of_fail = ?, pub_date = ?, download_date = ?, creation_date = ?
            WHERE id = ?
            "#,
        )
        .bind(item.podcast_id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.description)
        .bind(&item.mime_type)
        .bind(item.length)
        .bind(&item.file_name)
        .bind(item.status.to_i32())
        .bind(item.progression)
        .bind(item.number_of_fail)
        .bind(item.pub_date.map(|d| d.timestamp()))
        .bind(item.download_date.map(|d| d.timestamp()))
        .bind(item.creation_date.timestamp())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("Failed to update item", e))?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "Item {} not found",
                id
            ))));
        }

        Ok(())
    }

    /// Delete an item by ID
    pub async fn delete_item(&self, id: ItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete item: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "Item {} not found",
                id
            ))));
        }

        tracing::info!(item_id = %id, "Deleted item");
        Ok(())
    }

    /// Rebuild item indexes and refresh planner statistics
    pub async fn reindex_items(&self) -> Result<()> {
        for statement in ["REINDEX items", "ANALYZE items"] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to run {}: {}",
                        statement, e
                    )))
                })?;
        }

        tracing::info!("Reindexed items");
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for Database {
    async fn find_page(&self, request: PageRequest) -> Result<Page<Item>> {
        self.list_items_page(request).await
    }

    async fn find_all(&self, predicate: &ItemPredicate) -> Result<Vec<Item>> {
        self.list_items_matching(predicate).await
    }

    async fn find_one(&self, id: ItemId) -> Result<Option<Item>> {
        self.get_item(id).await
    }

    async fn save(&self, item: Item) -> Result<Item> {
        self.save_item(&item).await
    }

    async fn delete(&self, item: &Item) -> Result<()> {
        let id = item.id.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(
                "Cannot delete an item that was never saved".to_string(),
            ))
        })?;
        self.delete_item(id).await
    }

    async fn reindex(&self) -> Result<()> {
        self.reindex_items().await
    }
}
