pub mod pager;
pub mod reconcile;
pub mod retry;
pub mod syncer;
pub mod window;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::repository::SyncCounts;
use retry::RetryPolicy;
use window::{SortOrder, MAX_COUNT};

/// Options shared by every sync operation.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Records per page for collections without an explicit `count`, and
    /// records per reconciliation transaction.
    pub page_size: u32,
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: MAX_COUNT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Filters for `photos.getAlbums`. Albums are always walked to the end.
#[derive(Debug, Clone, Default)]
pub struct AlbumsQuery {
    pub ids: Vec<u64>,
    pub need_covers: bool,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

/// Filters for `photos.get`.
#[derive(Debug, Clone, Default)]
pub struct PhotosQuery {
    pub ids: Vec<u64>,
    pub extended: bool,
    pub photo_sizes: bool,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub all: bool,
    pub offset: Option<u32>,
    pub count: Option<u32>,
    /// Walk the album oldest first. Stored results are still ordered
    /// newest first.
    pub rev: bool,
}

/// Filters for `photos.getComments`.
#[derive(Debug, Clone, Default)]
pub struct CommentsQuery {
    pub sort: Option<SortOrder>,
    pub count: Option<u32>,
    pub offset: Option<u32>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub all: bool,
    pub need_likes: bool,
}

/// Report returned after a sync operation completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub entity_key: String,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
}

impl SyncReport {
    pub fn from_counts(entity_key: String, counts: SyncCounts) -> Self {
        Self {
            entity_key,
            fetched: counts.fetched,
            created: counts.created,
            updated: counts.updated,
        }
    }
}

/// Entities stored by one sync call, in final order, plus its report.
#[derive(Debug, Clone)]
pub struct Synced<T> {
    pub items: Vec<T>,
    pub report: SyncReport,
}
