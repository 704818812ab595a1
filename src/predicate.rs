//! Composable item filters
//!
//! An [`ItemPredicate`] is a small boolean expression tree over item columns.
//! Predicates built from the same inputs compare equal, so callers (and tests)
//! can check exactly which filter was issued. The SQLite store renders them
//! with [`ItemPredicate::push_sql`]; [`ItemPredicate::matches`] evaluates the
//! same expression in memory.
//!
//! Comparisons against a missing value (no download date, no podcast) are
//! false in both renderings, so `not` behaves the same in SQL and in memory.
//! Dates are compared at second precision, matching what the store keeps.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::types::{Item, PodcastId, Status};

/// Boolean filter over items
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemPredicate {
    /// Status is one of the listed values (an empty list matches nothing)
    StatusIn(Vec<Status>),
    /// Owning podcast's updater type key equals the value
    OfType(String),
    /// Download date is strictly after the instant
    DownloadedAfter(DateTime<Utc>),
    /// Download date is strictly before the instant
    DownloadedBefore(DateTime<Utc>),
    /// Publication date is strictly after the instant
    PublishedAfter(DateTime<Utc>),
    /// Status is [`Status::NotDownloaded`]
    NotDownloaded,
    /// Item belongs to the podcast
    PodcastIs(PodcastId),
    /// Both sides match
    And(Box<ItemPredicate>, Box<ItemPredicate>),
    /// Either side matches
    Or(Box<ItemPredicate>, Box<ItemPredicate>),
    /// Inner predicate does not match
    Not(Box<ItemPredicate>),
}

/// Items whose status is any of `statuses`
pub fn has_status(statuses: impl IntoIterator<Item = Status>) -> ItemPredicate {
    ItemPredicate::StatusIn(statuses.into_iter().collect())
}

/// Items of a podcast refreshed by the updater with this key
pub fn is_of_type(key: impl Into<String>) -> ItemPredicate {
    ItemPredicate::OfType(key.into())
}

/// Items downloaded after `date`
pub fn has_been_downloaded_after(date: DateTime<Utc>) -> ItemPredicate {
    ItemPredicate::DownloadedAfter(date)
}

/// Items downloaded before `date`
pub fn has_been_downloaded_before(date: DateTime<Utc>) -> ItemPredicate {
    ItemPredicate::DownloadedBefore(date)
}

/// Items published after `date`
pub fn is_newer_than(date: DateTime<Utc>) -> ItemPredicate {
    ItemPredicate::PublishedAfter(date)
}

/// Items not downloaded yet
pub fn is_not_downloaded() -> ItemPredicate {
    ItemPredicate::NotDownloaded
}

/// Items owned by the podcast
pub fn is_in_podcast(id: PodcastId) -> ItemPredicate {
    ItemPredicate::PodcastIs(id)
}

impl ItemPredicate {
    /// Conjunction with another predicate
    pub fn and(self, other: ItemPredicate) -> ItemPredicate {
        ItemPredicate::And(Box::new(self), Box::new(other))
    }

    /// Disjunction with another predicate
    pub fn or(self, other: ItemPredicate) -> ItemPredicate {
        ItemPredicate::Or(Box::new(self), Box::new(other))
    }

    /// Negation
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> ItemPredicate {
        ItemPredicate::Not(Box::new(self))
    }

    /// Append this predicate as a parenthesised SQL boolean expression.
    ///
    /// Column references assume the query selects from `items i LEFT JOIN podcasts p`.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            ItemPredicate::StatusIn(statuses) if statuses.is_empty() => {
                qb.push("(1 = 0)");
            }
            ItemPredicate::StatusIn(statuses) => {
                qb.push("(i.status IN (");
                for (index, status) in statuses.iter().enumerate() {
                    if index > 0 {
                        qb.push(", ");
                    }
                    qb.push_bind(status.to_i32());
                }
                qb.push("))");
            }
            ItemPredicate::OfType(key) => {
                qb.push("(IFNULL(p.updater_type = ");
                qb.push_bind(key.clone());
                qb.push(", 0))");
            }
            ItemPredicate::DownloadedAfter(date) => {
                qb.push("(IFNULL(i.download_date > ");
                qb.push_bind(date.timestamp());
                qb.push(", 0))");
            }
            ItemPredicate::DownloadedBefore(date) => {
                qb.push("(IFNULL(i.download_date < ");
                qb.push_bind(date.timestamp());
                qb.push(", 0))");
            }
            ItemPredicate::PublishedAfter(date) => {
                qb.push("(IFNULL(i.pub_date > ");
                qb.push_bind(date.timestamp());
                qb.push(", 0))");
            }
            ItemPredicate::NotDownloaded => {
                qb.push("(i.status = ");
                qb.push_bind(Status::NotDownloaded.to_i32());
                qb.push(")");
            }
            ItemPredicate::PodcastIs(id) => {
                qb.push("(IFNULL(i.podcast_id = ");
                qb.push_bind(*id);
                qb.push(", 0))");
            }
            ItemPredicate::And(left, right) => {
                qb.push("(");
                left.push_sql(qb);
                qb.push(" AND ");
                right.push_sql(qb);
                qb.push(")");
            }
            ItemPredicate::Or(left, right) => {
                qb.push("(");
                left.push_sql(qb);
                qb.push(" OR ");
                right.push_sql(qb);
                qb.push(")");
            }
            ItemPredicate::Not(inner) => {
                qb.push("(NOT ");
                inner.push_sql(qb);
                qb.push(")");
            }
        }
    }

    /// Evaluate against an item whose podcast has the given updater type
    pub fn matches(&self, item: &Item, podcast_type: Option<&str>) -> bool {
        let after = |value: Option<DateTime<Utc>>, date: &DateTime<Utc>| {
            value.is_some_and(|v| v.timestamp() > date.timestamp())
        };

        match self {
            ItemPredicate::StatusIn(statuses) => statuses.contains(&item.status),
            ItemPredicate::OfType(key) => podcast_type == Some(key.as_str()),
            ItemPredicate::DownloadedAfter(date) => after(item.download_date, date),
            ItemPredicate::DownloadedBefore(date) => item
                .download_date
                .is_some_and(|v| v.timestamp() < date.timestamp()),
            ItemPredicate::PublishedAfter(date) => after(item.pub_date, date),
            ItemPredicate::NotDownloaded => item.status == Status::NotDownloaded,
            ItemPredicate::PodcastIs(id) => item.podcast_id == Some(*id),
            ItemPredicate::And(left, right) => {
                left.matches(item, podcast_type) && right.matches(item, podcast_type)
            }
            ItemPredicate::Or(left, right) => {
                left.matches(item, podcast_type) || right.matches(item, podcast_type)
            }
            ItemPredicate::Not(inner) => !inner.matches(item, podcast_type),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rendered(predicate: &ItemPredicate) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("");
        predicate.push_sql(&mut qb);
        qb.sql().to_string()
    }

    fn downloaded(days_ago: i64) -> Item {
        Item {
            status: Status::Finish,
            download_date: Some(Utc::now() - Duration::days(days_ago)),
            ..Item::new("Episode", "http://example.com/e.mp3")
        }
    }

    #[test]
    fn predicates_from_same_inputs_are_equal() {
        let date = Utc::now() - Duration::days(90);

        assert_eq!(
            has_status([Status::NotDownloaded, Status::Finish]),
            has_status(vec![Status::NotDownloaded, Status::Finish])
        );
        assert_eq!(
            is_of_type("RSS").and(has_been_downloaded_after(date)),
            is_of_type("RSS".to_string()).and(has_been_downloaded_after(date))
        );
        assert_ne!(
            is_of_type("RSS").and(has_been_downloaded_after(date)),
            has_been_downloaded_after(date).and(is_of_type("RSS")),
            "operand order is part of the issued predicate"
        );
    }

    #[test]
    fn status_in_renders_one_bind_per_status() {
        let sql = rendered(&has_status([Status::NotDownloaded, Status::Finish]));
        assert_eq!(sql, "(i.status IN (?, ?))");
    }

    #[test]
    fn empty_status_list_renders_false() {
        assert_eq!(rendered(&has_status([])), "(1 = 0)");
        assert!(!has_status([]).matches(&downloaded(1), None));
    }

    #[test]
    fn combinators_nest_with_parentheses() {
        let predicate = is_of_type("RSS")
            .and(has_been_downloaded_after(Utc::now()))
            .or(is_not_downloaded().not());

        assert_eq!(
            rendered(&predicate),
            "(((IFNULL(p.updater_type = ?, 0)) AND (IFNULL(i.download_date > ?, 0))) OR (NOT (i.status = ?)))"
        );
    }

    #[test]
    fn downloaded_after_matches_only_items_with_later_date() {
        let cutoff = Utc::now() - Duration::days(10);
        let predicate = has_been_downloaded_after(cutoff);

        assert!(predicate.matches(&downloaded(1), None));
        assert!(!predicate.matches(&downloaded(30), None));
        assert!(
            !predicate.matches(&Item::new("t", "u"), None),
            "an item without download date is never downloaded after anything"
        );
        assert!(
            predicate.clone().not().matches(&Item::new("t", "u"), None),
            "negation of a missing comparison matches"
        );
    }

    #[test]
    fn type_match_requires_a_podcast_type() {
        let item = downloaded(1);

        assert!(is_of_type("RSS").matches(&item, Some("RSS")));
        assert!(!is_of_type("RSS").matches(&item, Some("Youtube")));
        assert!(!is_of_type("RSS").matches(&item, None));
    }

    #[test]
    fn to_download_shape_selects_recent_undownloaded_items() {
        let predicate =
            is_newer_than(Utc::now() - Duration::days(10)).and(is_not_downloaded());

        let fresh = Item {
            pub_date: Some(Utc::now() - Duration::days(2)),
            ..Item::new("fresh", "u")
        };
        let stale = Item {
            pub_date: Some(Utc::now() - Duration::days(20)),
            ..Item::new("stale", "u")
        };
        let fresh_but_done = Item {
            status: Status::Finish,
            ..fresh.clone()
        };

        assert!(predicate.matches(&fresh, None));
        assert!(!predicate.matches(&stale, None));
        assert!(!predicate.matches(&fresh_but_done, None));
    }

    #[test]
    fn podcast_membership() {
        let item = Item {
            podcast_id: Some(PodcastId(4)),
            ..Item::new("t", "u")
        };

        assert!(is_in_podcast(PodcastId(4)).matches(&item, None));
        assert!(!is_in_podcast(PodcastId(5)).matches(&item, None));
        assert!(!is_in_podcast(PodcastId(4)).matches(&Item::new("t", "u"), None));
    }
}
