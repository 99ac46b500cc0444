pub mod api;
pub mod error;
pub mod model;
pub mod storage;
pub mod sync;
pub mod time_util;
pub mod url;

pub use api::{ClientConfig, PhotoSource, VkClient};
pub use error::{Error, Result};
pub use model::{Album, Comment, Owner, Photo, Privacy, RemoteId};
pub use storage::repository::StoreCounts;
pub use storage::Database;
pub use sync::retry::RetryPolicy;
pub use sync::window::{FetchWindow, SortOrder};
pub use sync::{AlbumsQuery, CommentsQuery, PhotosQuery, SyncOptions, SyncReport, Synced};
pub use url::{generate_vk_url, parse_vk_url, VkUrlInfo};

use chrono::{DateTime, Utc};

use storage::repository;
use sync::syncer;

/// Config key holding the API access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Main entry point: syncs VK photo collections into a local store.
pub struct PhotoSync<S: PhotoSource = VkClient> {
    db: Database,
    source: S,
    options: SyncOptions,
}

impl<S: PhotoSource> PhotoSync<S> {
    pub fn new(db: Database, source: S) -> Self {
        Self {
            db,
            source,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Sync commands ──────────────────────────────────────────────

    pub async fn fetch_albums(&self, owner: Owner, query: &AlbumsQuery) -> Result<Synced<Album>> {
        syncer::sync_albums(&self.db, &self.source, owner, query, &self.options).await
    }

    /// The album must have been synced first; photos never pull in their album.
    pub async fn fetch_photos(
        &self,
        album: RemoteId,
        query: &PhotosQuery,
    ) -> Result<Synced<Photo>> {
        syncer::sync_photos(&self.db, &self.source, album, query, &self.options).await
    }

    pub async fn fetch_comments(
        &self,
        photo: RemoteId,
        query: &CommentsQuery,
    ) -> Result<Synced<Comment>> {
        let photo = self.require_photo(photo).await?;
        syncer::sync_comments(&self.db, &self.source, &photo, query, &self.options).await
    }

    pub async fn fetch_photo_likes(&self, photo: RemoteId, all: bool) -> Result<Synced<u64>> {
        let photo = self.require_photo(photo).await?;
        syncer::sync_likes(&self.db, &self.source, &photo, all, &self.options).await
    }

    pub async fn archive_comment(&self, comment: RemoteId) -> Result<Comment> {
        syncer::archive_comment(&self.db, &self.source, comment, &self.options).await
    }

    pub async fn restore_comment(&self, comment: RemoteId) -> Result<Comment> {
        syncer::restore_comment(&self.db, &self.source, comment, &self.options).await
    }

    async fn require_photo(&self, id: RemoteId) -> Result<Photo> {
        self.photo(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("photo {id} (sync its album first)")))
    }

    // ── Local queries ──────────────────────────────────────────────

    pub async fn album(&self, id: RemoteId) -> Result<Option<Album>> {
        Ok(self
            .db
            .reader()
            .call(move |conn| repository::get_album(conn, &id))
            .await?)
    }

    pub async fn photo(&self, id: RemoteId) -> Result<Option<Photo>> {
        Ok(self
            .db
            .reader()
            .call(move |conn| repository::get_photo(conn, &id))
            .await?)
    }

    pub async fn comment(&self, id: RemoteId) -> Result<Option<Comment>> {
        Ok(self
            .db
            .reader()
            .call(move |conn| repository::get_comment(conn, &id))
            .await?)
    }

    pub async fn albums(
        &self,
        owner: Owner,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Album>> {
        Ok(self
            .db
            .reader()
            .call(move |conn| repository::list_albums(conn, owner, after, before))
            .await?)
    }

    pub async fn photos(
        &self,
        album: RemoteId,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Photo>> {
        Ok(self
            .db
            .reader()
            .call(move |conn| repository::list_photos(conn, &album, after, before))
            .await?)
    }

    pub async fn comments(
        &self,
        photo: RemoteId,
        include_archived: bool,
    ) -> Result<Vec<Comment>> {
        Ok(self
            .db
            .reader()
            .call(move |conn| {
                repository::list_comments(conn, &photo, None, None, include_archived)
            })
            .await?)
    }

    pub async fn status(&self) -> Result<(StoreCounts, Option<String>)> {
        Ok(self
            .db
            .reader()
            .call(|conn| {
                let counts = repository::store_counts(conn)?;
                let last_sync = repository::last_completed_sync(conn)?;
                Ok::<_, rusqlite::Error>((counts, last_sync))
            })
            .await?)
    }

    // ── Config commands ────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        config_get(&self.db, key).await
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        config_set(&self.db, key, value).await
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        config_list(&self.db).await
    }
}

// Config is reachable before a client exists (the token itself lives there).

pub async fn config_get(db: &Database, key: &str) -> Result<Option<String>> {
    Ok(db
        .reader()
        .call({
            let key = key.to_string();
            move |conn| repository::get_config(conn, &key)
        })
        .await?)
}

pub async fn config_set(db: &Database, key: &str, value: &str) -> Result<()> {
    Ok(db
        .writer()
        .call({
            let key = key.to_string();
            let value = value.to_string();
            move |conn| repository::set_config(conn, &key, &value)
        })
        .await?)
}

pub async fn config_list(db: &Database) -> Result<Vec<(String, String)>> {
    Ok(db
        .reader()
        .call(|conn| repository::list_config(conn))
        .await?)
}
