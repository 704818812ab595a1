use crate::db::*;
use crate::error::{DatabaseError, Error};
use crate::predicate::{
    has_been_downloaded_after, has_status, is_in_podcast, is_newer_than, is_not_downloaded,
    is_of_type,
};
use crate::repository::ItemRepository;
use crate::types::{
    Direction, Item, ItemId, ItemSortField, PageRequest, Podcast, PodcastId, Status,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tempfile::NamedTempFile;

async fn new_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

async fn podcast(db: &Database, updater_type: &str) -> PodcastId {
    db.save_podcast(&Podcast::new("Show", "http://example.com/rss", updater_type))
        .await
        .unwrap()
        .id
        .unwrap()
}

async fn insert(db: &Database, item: Item) -> Item {
    db.save_item(&item).await.unwrap()
}

#[tokio::test]
async fn test_insert_and_get_item() {
    let (db, _file) = new_db().await;
    let podcast_id = podcast(&db, "RSS").await;

    let item = Item {
        podcast_id: Some(podcast_id),
        description: Some("First episode".to_string()),
        mime_type: Some("audio/mpeg".to_string()),
        length: Some(1024 * 1024 * 30),
        pub_date: Some(at(1_700_000_000)),
        creation_date: at(1_700_000_100),
        ..Item::new("Episode 1", "http://example.com/1.mp3")
    };

    let saved = db.save_item(&item).await.unwrap();
    let id = saved.id.unwrap();
    assert!(id.get() > 0);

    let loaded = db.get_item(id).await.unwrap().unwrap();
    assert_eq!(loaded, Item { id: Some(id), ..item });
    assert_eq!(loaded, saved);

    db.close().await;
}

#[tokio::test]
async fn test_get_unknown_item_returns_none() {
    let (db, _file) = new_db().await;

    assert!(db.get_item(ItemId(404)).await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_update_existing_item() {
    let (db, _file) = new_db().await;
    let saved = insert(&db, Item::new("Episode", "http://example.com/e.mp3")).await;

    let downloaded = Item {
        status: Status::Finish,
        progression: 100,
        file_name: Some("e.mp3".to_string()),
        download_date: Some(at(1_700_000_500)),
        ..saved.clone()
    };
    let updated = db.save_item(&downloaded).await.unwrap();

    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.status, Status::Finish);
    assert_eq!(updated.file_name.as_deref(), Some("e.mp3"));
    assert_eq!(updated.download_date, Some(at(1_700_000_500)));
    assert_eq!(db.count_items().await.unwrap(), 1, "update must not insert");

    db.close().await;
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let (db, _file) = new_db().await;

    let ghost = Item {
        id: Some(ItemId(77)),
        ..Item::new("Ghost", "http://example.com/g.mp3")
    };
    let err = db.save_item(&ghost).await.unwrap_err();

    assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));

    db.close().await;
}

#[tokio::test]
async fn test_unknown_podcast_is_a_constraint_violation() {
    let (db, _file) = new_db().await;

    let orphan = Item {
        podcast_id: Some(PodcastId(12)),
        ..Item::new("Orphan", "http://example.com/o.mp3")
    };
    let err = db.save_item(&orphan).await.unwrap_err();

    assert!(
        matches!(err, Error::Database(DatabaseError::ConstraintViolation(_))),
        "got {err:?}"
    );

    db.close().await;
}

#[tokio::test]
async fn test_delete_item() {
    let (db, _file) = new_db().await;
    let saved = insert(&db, Item::new("Episode", "http://example.com/e.mp3")).await;

    ItemRepository::delete(&db, &saved).await.unwrap();

    assert!(db.get_item(saved.id.unwrap()).await.unwrap().is_none());

    let again = ItemRepository::delete(&db, &saved).await.unwrap_err();
    assert!(again.is_not_found());

    let unsaved = ItemRepository::delete(&db, &Item::new("New", "u")).await.unwrap_err();
    assert!(unsaved.is_not_found());

    db.close().await;
}

#[tokio::test]
async fn test_find_by_status() {
    let (db, _file) = new_db().await;
    for (title, status) in [
        ("a", Status::NotDownloaded),
        ("b", Status::Finish),
        ("c", Status::Failed),
        ("d", Status::Started),
    ] {
        insert(&db, Item { status, ..Item::new(title, "u") }).await;
    }

    let found = db
        .list_items_matching(&has_status([Status::NotDownloaded, Status::Finish]))
        .await
        .unwrap();
    let titles: Vec<_> = found.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b"]);

    let none = db.list_items_matching(&has_status([])).await.unwrap();
    assert!(none.is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_find_by_type_and_download_date_after() {
    let (db, _file) = new_db().await;
    let rss = podcast(&db, "RSS").await;
    let youtube = podcast(&db, "Youtube").await;
    let cutoff = at(1_700_000_000);

    let downloaded = |title: &str, podcast_id, secs| Item {
        podcast_id: Some(podcast_id),
        status: Status::Finish,
        download_date: Some(at(secs)),
        ..Item::new(title, "u")
    };

    insert(&db, downloaded("rss-recent", rss, 1_700_000_500)).await;
    insert(&db, downloaded("rss-old", rss, 1_600_000_000)).await;
    insert(&db, downloaded("yt-recent", youtube, 1_700_000_500)).await;
    insert(
        &db,
        Item {
            podcast_id: Some(rss),
            ..Item::new("rss-never", "u")
        },
    )
    .await;
    insert(
        &db,
        Item {
            download_date: Some(at(1_700_000_500)),
            ..Item::new("no-podcast", "u")
        },
    )
    .await;

    let found = ItemRepository::find_all(
        &db,
        &is_of_type("RSS").and(has_been_downloaded_after(cutoff)),
    )
    .await
    .unwrap();

    let titles: Vec<_> = found.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["rss-recent"]);

    // Negation includes items without a podcast
    let negated = db
        .list_items_matching(&is_of_type("RSS").not())
        .await
        .unwrap();
    let titles: Vec<_> = negated.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["yt-recent", "no-podcast"]);

    db.close().await;
}

#[tokio::test]
async fn test_find_to_download() {
    let (db, _file) = new_db().await;
    let now = Utc::now();

    insert(&db, Item { pub_date: Some(now - Duration::days(2)), ..Item::new("fresh", "u") }).await;
    insert(&db, Item { pub_date: Some(now - Duration::days(20)), ..Item::new("stale", "u") }).await;
    insert(&db, Item { pub_date: None, ..Item::new("undated", "u") }).await;
    insert(
        &db,
        Item {
            pub_date: Some(now - Duration::days(1)),
            status: Status::Finish,
            ..Item::new("done", "u")
        },
    )
    .await;

    let found = db
        .list_items_matching(&is_newer_than(now - Duration::days(10)).and(is_not_downloaded()))
        .await
        .unwrap();

    let titles: Vec<_> = found.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["fresh"]);

    db.close().await;
}

#[tokio::test]
async fn test_find_by_podcast() {
    let (db, _file) = new_db().await;
    let first = podcast(&db, "RSS").await;
    let second = podcast(&db, "RSS").await;

    insert(&db, Item { podcast_id: Some(first), ..Item::new("one", "u") }).await;
    insert(&db, Item { podcast_id: Some(second), ..Item::new("two", "u") }).await;

    let found = db.list_items_matching(&is_in_podcast(second)).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "two");

    db.close().await;
}

#[tokio::test]
async fn test_find_page() {
    let (db, _file) = new_db().await;
    for i in 1..=7 {
        insert(&db, Item::new(format!("Episode {i}"), "u")).await;
    }

    let page = ItemRepository::find_page(&db, PageRequest::of(1, 3)).await.unwrap();

    let titles: Vec<_> = page.content.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Episode 4", "Episode 5", "Episode 6"]);
    assert_eq!(page.number, 1);
    assert_eq!(page.size, 3);
    assert_eq!(page.total_elements, 7);
    assert_eq!(page.total_pages(), 3);

    let beyond = db.list_items_page(PageRequest::of(5, 3)).await.unwrap();
    assert!(beyond.content.is_empty());
    assert_eq!(beyond.total_elements, 7);

    db.close().await;
}

#[tokio::test]
async fn test_find_page_sorted() {
    let (db, _file) = new_db().await;
    for (title, days) in [("b", 3), ("a", 1), ("c", 2)] {
        insert(
            &db,
            Item {
                pub_date: Some(Utc::now() - Duration::days(days)),
                ..Item::new(title, "u")
            },
        )
        .await;
    }

    let by_title = db
        .list_items_page(PageRequest::of(0, 10).sorted_by(ItemSortField::Title, Direction::Desc))
        .await
        .unwrap();
    let titles: Vec<_> = by_title.content.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b", "a"]);

    let by_date = db
        .list_items_page(PageRequest::of(0, 10).sorted_by(ItemSortField::PubDate, Direction::Desc))
        .await
        .unwrap();
    let titles: Vec<_> = by_date.content.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "c", "b"]);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_page_total_agrees_with_content_during_writes() {
    let (db, _file) = new_db().await;
    let db = Arc::new(db);

    let writer = {
        let db = db.clone();
        tokio::spawn(async move {
            for i in 0..100 {
                db.save_item(&Item::new(format!("Episode {i}"), "u")).await.unwrap();
            }
        })
    };

    for _ in 0..100 {
        let page = db.list_items_page(PageRequest::of(0, 1000)).await.unwrap();
        assert_eq!(page.content.len() as u64, page.total_elements);
    }

    writer.await.unwrap();
    let page = db.list_items_page(PageRequest::of(0, 1000)).await.unwrap();
    assert_eq!(page.total_elements, 100);
    assert_eq!(page.content.len(), 100);
}

#[tokio::test]
async fn test_reindex() {
    let (db, _file) = new_db().await;
    insert(&db, Item::new("Episode", "u")).await;

    ItemRepository::reindex(&db).await.unwrap();

    // Data is untouched
    assert_eq!(db.count_items().await.unwrap(), 1);

    db.close().await;
}
