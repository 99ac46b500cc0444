use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::model::{Album, Comment, Owner, Photo, PhotoSizes, Privacy, RemoteId};

// ── Users & Groups ─────────────────────────────────────────────────

/// Insert a bare user row if none exists yet. Existing rows are untouched.
pub fn upsert_user_minimal(conn: &Connection, user_id: u64) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO users (remote_id, cached_at) VALUES (?1, datetime('now'))",
        params![user_id as i64],
    )?;
    Ok(())
}

pub fn upsert_group_minimal(conn: &Connection, group_id: u64) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO groups (remote_id, cached_at) VALUES (?1, datetime('now'))",
        params![group_id as i64],
    )?;
    Ok(())
}

/// Make sure the user or group behind `owner` has a row.
pub fn ensure_owner(conn: &Connection, owner: Owner) -> Result<(), rusqlite::Error> {
    match owner {
        Owner::User(id) => upsert_user_minimal(conn, id),
        Owner::Group(id) => upsert_group_minimal(conn, id),
    }
}

// ── Albums ─────────────────────────────────────────────────────────

pub fn album_exists(conn: &Connection, id: &RemoteId) -> Result<bool, rusqlite::Error> {
    exists(conn, "SELECT 1 FROM albums WHERE remote_id = ?1", id)
}

pub fn upsert_album(conn: &Connection, album: &Album) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO albums (
            remote_id, owner_id, album_id, thumb_id, thumb_src, title, description,
            size, privacy, created, updated, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, datetime('now'))
        ON CONFLICT(remote_id) DO UPDATE SET
            owner_id=excluded.owner_id, album_id=excluded.album_id,
            thumb_id=excluded.thumb_id, thumb_src=excluded.thumb_src,
            title=excluded.title, description=excluded.description,
            size=excluded.size, privacy=excluded.privacy,
            created=excluded.created, updated=excluded.updated,
            cached_at=excluded.cached_at",
        params![
            album.remote_id.to_string(),
            album.owner.signed(),
            album.remote_id.local_id as i64,
            album.thumb_id.map(|id| id as i64),
            album.thumb_src,
            album.title,
            album.description,
            album.size,
            album.privacy.map(|p| p.code()),
            album.created.map(|t| t.timestamp()),
            album.updated.map(|t| t.timestamp()),
        ],
    )?;
    Ok(())
}

const ALBUM_COLUMNS: &str = "owner_id, album_id, thumb_id, thumb_src, title, description, \
                             size, privacy, created, updated";

fn row_to_album(row: &Row<'_>) -> Result<Album, rusqlite::Error> {
    let owner_id: i64 = row.get(0)?;
    let album_id: i64 = row.get(1)?;
    Ok(Album {
        remote_id: RemoteId::new(owner_id, album_id as u64),
        owner: Owner::from_signed(owner_id),
        thumb_id: row.get::<_, Option<i64>>(2)?.map(|id| id as u64),
        thumb_src: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        size: row.get(6)?,
        privacy: row.get::<_, Option<i64>>(7)?.and_then(Privacy::from_code),
        created: row.get::<_, Option<i64>>(8)?.and_then(from_unix),
        updated: row.get::<_, Option<i64>>(9)?.and_then(from_unix),
    })
}

pub fn get_album(conn: &Connection, id: &RemoteId) -> Result<Option<Album>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE remote_id = ?1"),
        params![id.to_string()],
        row_to_album,
    )
    .optional()
}

/// Albums of `owner`, newest first by update (falling back to creation) time,
/// restricted to the open interval `(after, before)`.
pub fn list_albums(
    conn: &Connection,
    owner: Owner,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) -> Result<Vec<Album>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALBUM_COLUMNS} FROM albums
         WHERE owner_id = ?1
           AND (?2 IS NULL OR COALESCE(updated, created) > ?2)
           AND (?3 IS NULL OR COALESCE(updated, created) < ?3)
         ORDER BY COALESCE(updated, created) DESC, album_id DESC"
    ))?;
    let rows = stmt.query_map(
        params![
            owner.signed(),
            after.map(|t| t.timestamp()),
            before.map(|t| t.timestamp())
        ],
        row_to_album,
    )?;
    rows.collect()
}

// ── Photos ─────────────────────────────────────────────────────────

pub fn photo_exists(conn: &Connection, id: &RemoteId) -> Result<bool, rusqlite::Error> {
    exists(conn, "SELECT 1 FROM photos WHERE remote_id = ?1", id)
}

pub fn upsert_photo(conn: &Connection, photo: &Photo) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO photos (
            remote_id, owner_id, photo_id, album_remote_id, user_id,
            photo_75, photo_130, photo_604, photo_807, photo_1280, photo_2560,
            width, height, likes_count, comments_count, tags_count, actions_count,
            text, date, cached_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, datetime('now')
        )
        ON CONFLICT(remote_id) DO UPDATE SET
            owner_id=excluded.owner_id, photo_id=excluded.photo_id,
            album_remote_id=excluded.album_remote_id, user_id=excluded.user_id,
            photo_75=excluded.photo_75, photo_130=excluded.photo_130,
            photo_604=excluded.photo_604, photo_807=excluded.photo_807,
            photo_1280=excluded.photo_1280, photo_2560=excluded.photo_2560,
            width=excluded.width, height=excluded.height,
            likes_count=excluded.likes_count, comments_count=excluded.comments_count,
            tags_count=excluded.tags_count, actions_count=excluded.actions_count,
            text=excluded.text, date=excluded.date, cached_at=excluded.cached_at",
        params![
            photo.remote_id.to_string(),
            photo.owner.signed(),
            photo.remote_id.local_id as i64,
            photo.album_id.to_string(),
            photo.user_id.map(|id| id as i64),
            photo.sizes.photo_75,
            photo.sizes.photo_130,
            photo.sizes.photo_604,
            photo.sizes.photo_807,
            photo.sizes.photo_1280,
            photo.sizes.photo_2560,
            photo.width,
            photo.height,
            photo.likes_count,
            photo.comments_count,
            photo.tags_count,
            photo.actions_count,
            photo.text,
            photo.date.timestamp(),
        ],
    )?;
    Ok(())
}

const PHOTO_COLUMNS: &str = "owner_id, photo_id, album_remote_id, user_id, \
                             photo_75, photo_130, photo_604, photo_807, photo_1280, photo_2560, \
                             width, height, likes_count, comments_count, tags_count, actions_count, \
                             text, date";

fn row_to_photo(row: &Row<'_>) -> Result<Photo, rusqlite::Error> {
    let owner_id: i64 = row.get(0)?;
    let photo_id: i64 = row.get(1)?;
    Ok(Photo {
        remote_id: RemoteId::new(owner_id, photo_id as u64),
        album_id: remote_id_at(row, 2)?,
        owner: Owner::from_signed(owner_id),
        user_id: row.get::<_, Option<i64>>(3)?.map(|id| id as u64),
        sizes: PhotoSizes {
            photo_75: row.get(4)?,
            photo_130: row.get(5)?,
            photo_604: row.get(6)?,
            photo_807: row.get(7)?,
            photo_1280: row.get(8)?,
            photo_2560: row.get(9)?,
        },
        width: row.get(10)?,
        height: row.get(11)?,
        likes_count: row.get(12)?,
        comments_count: row.get(13)?,
        tags_count: row.get(14)?,
        actions_count: row.get(15)?,
        text: row.get(16)?,
        date: from_unix(row.get(17)?).unwrap_or_default(),
    })
}

pub fn get_photo(conn: &Connection, id: &RemoteId) -> Result<Option<Photo>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE remote_id = ?1"),
        params![id.to_string()],
        row_to_photo,
    )
    .optional()
}

/// Photos of an album, newest first by capture date, restricted to the open
/// interval `(after, before)`.
pub fn list_photos(
    conn: &Connection,
    album: &RemoteId,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) -> Result<Vec<Photo>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PHOTO_COLUMNS} FROM photos
         WHERE album_remote_id = ?1
           AND (?2 IS NULL OR date > ?2)
           AND (?3 IS NULL OR date < ?3)
         ORDER BY date DESC, photo_id DESC"
    ))?;
    let rows = stmt.query_map(
        params![
            album.to_string(),
            after.map(|t| t.timestamp()),
            before.map(|t| t.timestamp())
        ],
        row_to_photo,
    )?;
    rows.collect()
}

/// Replace the recorded likers of a photo and set its like counters.
/// Returns the new `likes_count`.
pub fn replace_photo_likes(
    conn: &Connection,
    photo: &RemoteId,
    user_ids: &[u64],
) -> Result<u32, rusqlite::Error> {
    let key = photo.to_string();
    conn.execute(
        "DELETE FROM photo_likes WHERE photo_remote_id = ?1",
        params![key],
    )?;
    for user_id in user_ids {
        upsert_user_minimal(conn, *user_id)?;
        conn.execute(
            "INSERT OR IGNORE INTO photo_likes (photo_remote_id, user_id) VALUES (?1, ?2)",
            params![key, *user_id as i64],
        )?;
    }
    let likes: u32 = conn.query_row(
        "SELECT COUNT(*) FROM photo_likes WHERE photo_remote_id = ?1",
        params![key],
        |row| row.get(0),
    )?;
    conn.execute(
        "UPDATE photos SET likes_count = ?2, actions_count = ?2 + comments_count,
             cached_at = datetime('now')
         WHERE remote_id = ?1",
        params![key, likes],
    )?;
    Ok(likes)
}

pub fn list_photo_likers(conn: &Connection, photo: &RemoteId) -> Result<Vec<u64>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM photo_likes WHERE photo_remote_id = ?1 ORDER BY user_id",
    )?;
    let rows = stmt.query_map(params![photo.to_string()], |row| {
        row.get::<_, i64>(0).map(|id| id as u64)
    })?;
    rows.collect()
}

// ── Comments ───────────────────────────────────────────────────────

pub fn upsert_comment(conn: &Connection, comment: &Comment) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO comments (
            remote_id, comment_id, photo_remote_id, author_id, date, text,
            likes_count, archived, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
        ON CONFLICT(remote_id) DO UPDATE SET
            comment_id=excluded.comment_id, photo_remote_id=excluded.photo_remote_id,
            author_id=excluded.author_id, date=excluded.date, text=excluded.text,
            likes_count=excluded.likes_count, archived=excluded.archived,
            cached_at=excluded.cached_at",
        params![
            comment.remote_id.to_string(),
            comment.remote_id.local_id as i64,
            comment.photo_id.to_string(),
            comment.author.signed(),
            comment.date.timestamp(),
            comment.text,
            comment.likes_count,
            comment.archived as i32,
        ],
    )?;
    Ok(())
}

const COMMENT_COLUMNS: &str = "remote_id, photo_remote_id, author_id, date, text, likes_count, archived";

fn row_to_comment(row: &Row<'_>) -> Result<Comment, rusqlite::Error> {
    Ok(Comment {
        remote_id: remote_id_at(row, 0)?,
        photo_id: remote_id_at(row, 1)?,
        author: Owner::from_signed(row.get(2)?),
        date: from_unix(row.get(3)?).unwrap_or_default(),
        text: row.get(4)?,
        likes_count: row.get(5)?,
        archived: row.get(6)?,
    })
}

pub fn get_comment(conn: &Connection, id: &RemoteId) -> Result<Option<Comment>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE remote_id = ?1"),
        params![id.to_string()],
        row_to_comment,
    )
    .optional()
}

/// Comments on a photo, newest first, restricted to the open interval
/// `(after, before)`.
pub fn list_comments(
    conn: &Connection,
    photo: &RemoteId,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    include_archived: bool,
) -> Result<Vec<Comment>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments
         WHERE photo_remote_id = ?1
           AND (?2 IS NULL OR date > ?2)
           AND (?3 IS NULL OR date < ?3)
           AND (?4 OR archived = 0)
         ORDER BY date DESC, comment_id DESC"
    ))?;
    let rows = stmt.query_map(
        params![
            photo.to_string(),
            after.map(|t| t.timestamp()),
            before.map(|t| t.timestamp()),
            include_archived,
        ],
        row_to_comment,
    )?;
    rows.collect()
}

/// Toggle the soft-delete flag. Returns false when the comment is unknown.
pub fn set_comment_archived(
    conn: &Connection,
    id: &RemoteId,
    archived: bool,
) -> Result<bool, rusqlite::Error> {
    let count = conn.execute(
        "UPDATE comments SET archived = ?2, cached_at = datetime('now') WHERE remote_id = ?1",
        params![id.to_string(), archived as i32],
    )?;
    Ok(count > 0)
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Sync Jobs ──────────────────────────────────────────────────────

pub fn insert_sync_job(conn: &Connection, entity_key: &str) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO sync_jobs (entity_key, status, started_at)
         VALUES (?1, 'running', datetime('now'))",
        params![entity_key],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_sync_job(
    conn: &Connection,
    job_id: i64,
    status: &str,
    counts: &SyncCounts,
    error_message: Option<&str>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE sync_jobs SET
            status = ?2, completed_at = datetime('now'),
            fetched_items = ?3, created_items = ?4, updated_items = ?5,
            error_message = ?6
         WHERE id = ?1",
        params![
            job_id,
            status,
            counts.fetched as i64,
            counts.created as i64,
            counts.updated as i64,
            error_message,
        ],
    )?;
    Ok(())
}

/// Per-run tallies recorded on a sync job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
}

pub fn last_completed_sync(conn: &Connection) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT MAX(completed_at) FROM sync_jobs WHERE status = 'completed'",
        [],
        |row| row.get(0),
    )
}

// ── Status ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub albums: i64,
    pub photos: i64,
    pub comments: i64,
    pub archived_comments: i64,
    pub users: i64,
    pub groups: i64,
}

pub fn store_counts(conn: &Connection) -> Result<StoreCounts, rusqlite::Error> {
    let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));
    Ok(StoreCounts {
        albums: count("SELECT COUNT(*) FROM albums")?,
        photos: count("SELECT COUNT(*) FROM photos")?,
        comments: count("SELECT COUNT(*) FROM comments")?,
        archived_comments: count("SELECT COUNT(*) FROM comments WHERE archived = 1")?,
        users: count("SELECT COUNT(*) FROM users")?,
        groups: count("SELECT COUNT(*) FROM groups")?,
    })
}

// ── Helpers ────────────────────────────────────────────────────────

fn exists(conn: &Connection, sql: &str, id: &RemoteId) -> Result<bool, rusqlite::Error> {
    Ok(conn
        .query_row(sql, params![id.to_string()], |_| Ok(()))
        .optional()?
        .is_some())
}

fn remote_id_at(row: &Row<'_>, idx: usize) -> Result<RemoteId, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    pub(crate) fn album(owner_id: i64, album_id: u64, updated: i64) -> Album {
        Album {
            remote_id: RemoteId::new(owner_id, album_id),
            owner: Owner::from_signed(owner_id),
            thumb_id: Some(7),
            thumb_src: String::new(),
            title: format!("album {album_id}"),
            description: String::new(),
            size: 1,
            privacy: Some(Privacy::AllUsers),
            created: Some(t(updated - 10)),
            updated: Some(t(updated)),
        }
    }

    fn photo(album: &Album, photo_id: u64, date: i64) -> Photo {
        Photo {
            remote_id: RemoteId::new(album.remote_id.owner_id, photo_id),
            album_id: album.remote_id,
            owner: album.owner,
            user_id: None,
            sizes: PhotoSizes::default(),
            width: Some(10),
            height: Some(10),
            likes_count: 2,
            comments_count: 1,
            tags_count: 0,
            actions_count: 3,
            text: String::new(),
            date: t(date),
        }
    }

    #[tokio::test]
    async fn test_album_round_trip_and_range() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                for (id, updated) in [(1, 100), (2, 300), (3, 200)] {
                    upsert_album(conn, &album(-16297716, id, updated))?;
                }
                upsert_album(conn, &album(6492, 9, 500))?;

                let loaded = get_album(conn, &RemoteId::new(-16297716, 2))?.unwrap();
                assert_eq!(loaded, album(-16297716, 2, 300));

                let all = list_albums(conn, Owner::Group(16297716), None, None)?;
                let ids: Vec<u64> = all.iter().map(|a| a.remote_id.local_id).collect();
                assert_eq!(ids, vec![2, 3, 1]);

                let cut = list_albums(conn, Owner::Group(16297716), Some(t(100)), Some(t(300)))?;
                assert_eq!(cut.len(), 1);
                assert_eq!(cut[0].remote_id.local_id, 3);

                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_photo_album_foreign_key() {
        let db = Database::open_memory().await.unwrap();

        let result = db
            .writer()
            .call(|conn| {
                let orphan = photo(&album(-1, 1, 100), 5, 100);
                upsert_photo(conn, &orphan)
            })
            .await;
        assert!(result.is_err(), "photo without album must violate the foreign key");
    }

    #[tokio::test]
    async fn test_replace_photo_likes() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                let a = album(-1, 1, 100);
                upsert_album(conn, &a)?;
                let p = photo(&a, 5, 100);
                upsert_photo(conn, &p)?;

                let likes = replace_photo_likes(conn, &p.remote_id, &[10, 11, 12, 11])?;
                assert_eq!(likes, 3);
                let stored = get_photo(conn, &p.remote_id)?.unwrap();
                assert_eq!(stored.likes_count, 3);
                assert_eq!(stored.actions_count, 4);
                assert_eq!(list_photo_likers(conn, &p.remote_id)?, vec![10, 11, 12]);

                replace_photo_likes(conn, &p.remote_id, &[12])?;
                assert_eq!(list_photo_likers(conn, &p.remote_id)?, vec![12]);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_comment_archive_flag() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                let a = album(-1, 1, 100);
                upsert_album(conn, &a)?;
                let p = photo(&a, 5, 100);
                upsert_photo(conn, &p)?;
                let comment = Comment {
                    remote_id: RemoteId::new(-1, 77),
                    photo_id: p.remote_id,
                    author: Owner::User(3),
                    date: t(150),
                    text: "hi".into(),
                    likes_count: 0,
                    archived: false,
                };
                upsert_comment(conn, &comment)?;

                assert!(set_comment_archived(conn, &comment.remote_id, true)?);
                assert!(get_comment(conn, &comment.remote_id)?.unwrap().archived);
                assert!(list_comments(conn, &p.remote_id, None, None, false)?.is_empty());
                assert_eq!(list_comments(conn, &p.remote_id, None, None, true)?.len(), 1);

                assert!(set_comment_archived(conn, &comment.remote_id, false)?);
                assert!(!get_comment(conn, &comment.remote_id)?.unwrap().archived);

                assert!(!set_comment_archived(conn, &RemoteId::new(-1, 78), true)?);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ensure_owner_is_idempotent() {
        let db = Database::open_memory().await.unwrap();

        let counts = db
            .writer()
            .call(|conn| {
                ensure_owner(conn, Owner::Group(5))?;
                ensure_owner(conn, Owner::Group(5))?;
                ensure_owner(conn, Owner::User(5))?;
                store_counts(conn)
            })
            .await
            .unwrap();
        assert_eq!(counts.groups, 1);
        assert_eq!(counts.users, 1);
    }

    #[tokio::test]
    async fn test_sync_job_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                let job_id = insert_sync_job(conn, "album:-1_1")?;
                assert!(job_id > 0);
                assert_eq!(last_completed_sync(conn)?, None);

                let counts = SyncCounts {
                    fetched: 10,
                    created: 7,
                    updated: 3,
                };
                update_sync_job(conn, job_id, "completed", &counts, None)?;

                let (status, created): (String, i64) = conn.query_row(
                    "SELECT status, created_items FROM sync_jobs WHERE id = ?1",
                    params![job_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                assert_eq!(status, "completed");
                assert_eq!(created, 7);
                assert!(last_completed_sync(conn)?.is_some());

                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                assert_eq!(get_config(conn, "page_size")?, None);
                set_config(conn, "page_size", "50")?;
                set_config(conn, "page_size", "75")?;
                set_config(conn, "access_token", "t")?;
                assert_eq!(get_config(conn, "page_size")?, Some("75".to_string()));
                assert_eq!(
                    list_config(conn)?,
                    vec![
                        ("access_token".to_string(), "t".to_string()),
                        ("page_size".to_string(), "75".to_string())
                    ]
                );
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }
}
