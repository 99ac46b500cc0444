//! Merge raw remote records into the local store.
//!
//! Each `reconcile_*` function runs against a connection that the caller has
//! already put inside a transaction, and returns the stored entity together
//! with whether it was newly created.

use rusqlite::Connection;

use crate::api::{RawAlbum, RawComment, RawPhoto};
use crate::error::{Error, Result};
use crate::model::{Album, Comment, Owner, Photo, PhotoSizes, Privacy, RemoteId};
use crate::storage::repository::{self, SyncCounts};
use crate::storage::Database;

/// `user_id` the API reports for photos a group posted as itself.
const GROUP_AUTHOR_PLACEHOLDER: i64 = 100;

pub fn reconcile_album(conn: &Connection, raw: &RawAlbum) -> Result<(Album, bool)> {
    let owner = Owner::from_signed(raw.owner_id);
    let album = Album {
        remote_id: RemoteId::new(raw.owner_id, raw.id),
        owner,
        thumb_id: raw.thumb_id,
        thumb_src: raw.thumb_src.clone().unwrap_or_default(),
        title: raw.title.clone(),
        description: raw.description.clone(),
        size: raw.size.unwrap_or(0),
        privacy: raw.privacy.and_then(Privacy::from_code),
        created: raw.created,
        updated: raw.updated,
    };

    let created = !repository::album_exists(conn, &album.remote_id)?;
    repository::ensure_owner(conn, owner)?;
    repository::upsert_album(conn, &album)?;
    Ok((album, created))
}

/// Fails with [`Error::DanglingReference`] when the photo's album has not
/// been synced; albums are never fetched implicitly.
pub fn reconcile_photo(conn: &Connection, raw: &RawPhoto) -> Result<(Photo, bool)> {
    let album_id = RemoteId::new(raw.owner_id, raw.album_id.unsigned_abs());
    if raw.album_id <= 0 || !repository::album_exists(conn, &album_id)? {
        return Err(Error::DanglingReference {
            entity: "album",
            id: format!("{}_{}", raw.owner_id, raw.album_id),
        });
    }

    let owner = Owner::from_signed(raw.owner_id);
    let user_id = match (owner, raw.user_id) {
        (Owner::Group(_), Some(GROUP_AUTHOR_PLACEHOLDER)) => None,
        (_, Some(id)) if id > 0 => Some(id as u64),
        _ => None,
    };

    let mut photo = Photo {
        remote_id: RemoteId::new(raw.owner_id, raw.id),
        album_id,
        owner,
        user_id,
        sizes: PhotoSizes {
            photo_75: raw.photo_75.clone().unwrap_or_default(),
            photo_130: raw.photo_130.clone().unwrap_or_default(),
            photo_604: raw.photo_604.clone().unwrap_or_default(),
            photo_807: raw.photo_807.clone().unwrap_or_default(),
            photo_1280: raw.photo_1280.clone().unwrap_or_default(),
            photo_2560: raw.photo_2560.clone().unwrap_or_default(),
        },
        width: raw.width,
        height: raw.height,
        likes_count: raw.likes.as_ref().map_or(0, |c| c.count),
        comments_count: raw.comments.as_ref().map_or(0, |c| c.count),
        tags_count: raw.tags.as_ref().map_or(0, |c| c.count),
        actions_count: 0,
        text: raw.text.clone(),
        date: raw.date,
    };
    photo.recount();

    let created = !repository::photo_exists(conn, &photo.remote_id)?;
    repository::ensure_owner(conn, owner)?;
    if let Some(user_id) = photo.user_id {
        repository::upsert_user_minimal(conn, user_id)?;
    }
    repository::upsert_photo(conn, &photo)?;
    Ok((photo, created))
}

/// Comment ids are scoped by the photo owner, so the compound id takes the
/// photo's owner prefix. A re-observed comment keeps its archived flag.
pub fn reconcile_comment(
    conn: &Connection,
    photo_id: &RemoteId,
    raw: &RawComment,
) -> Result<(Comment, bool)> {
    let remote_id = RemoteId::new(photo_id.owner_id, raw.id);
    let existing = repository::get_comment(conn, &remote_id)?;

    let comment = Comment {
        remote_id,
        photo_id: *photo_id,
        author: Owner::from_signed(raw.from_id),
        date: raw.date,
        text: raw.text.clone(),
        likes_count: raw.likes.as_ref().map_or(0, |c| c.count),
        archived: existing.as_ref().is_some_and(|c| c.archived),
    };

    repository::ensure_owner(conn, comment.author)?;
    repository::upsert_comment(conn, &comment)?;
    Ok((comment, existing.is_none()))
}

/// Reconcile `records` in batches of `batch_size`, one transaction per batch.
///
/// A failing record rolls back its whole batch and stops the run; batches
/// committed before it stay committed.
pub async fn reconcile_batches<T, E, F>(
    db: &Database,
    records: Vec<T>,
    batch_size: usize,
    reconcile: F,
) -> Result<(Vec<E>, SyncCounts)>
where
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(&Connection, &T) -> Result<(E, bool)> + Clone + Send + 'static,
{
    let mut counts = SyncCounts {
        fetched: records.len(),
        ..SyncCounts::default()
    };
    let mut entities = Vec::with_capacity(records.len());
    let mut records = records.into_iter().peekable();

    while records.peek().is_some() {
        let batch: Vec<T> = records.by_ref().take(batch_size.max(1)).collect();
        let reconcile = reconcile.clone();
        let (stored, created) = db
            .transaction(move |tx| {
                let mut stored = Vec::with_capacity(batch.len());
                let mut created = 0usize;
                for record in &batch {
                    let (entity, was_created) = reconcile(tx, record)?;
                    if was_created {
                        created += 1;
                    }
                    stored.push(entity);
                }
                Ok((stored, created))
            })
            .await?;

        counts.created += created;
        counts.updated += stored.len() - created;
        entities.extend(stored);
    }

    Ok((entities, counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_album(owner_id: i64, id: u64) -> RawAlbum {
        serde_json::from_value(json!({
            "id": id, "owner_id": owner_id, "title": "Wall", "description": "",
            "created": 1204576880, "updated": 1229532461, "size": 3, "privacy": 0,
            "thumb_id": 98054577
        }))
        .unwrap()
    }

    fn raw_photo(owner_id: i64, album_id: i64, id: u64) -> RawPhoto {
        serde_json::from_value(json!({
            "id": id, "album_id": album_id, "owner_id": owner_id, "user_id": 100,
            "photo_130": "http://example.com/m.jpg", "text": "",
            "date": 1298365200, "likes": {"count": 4}, "comments": {"count": 3}
        }))
        .unwrap()
    }

    fn raw_comment(id: u64, from_id: i64) -> RawComment {
        serde_json::from_value(json!({
            "id": id, "from_id": from_id, "date": 1354592120, "text": "hah"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_album_reconcile_is_idempotent() {
        let db = Database::open_memory().await.unwrap();

        let (first, created) = db
            .transaction(|tx| reconcile_album(tx, &raw_album(-16297716, 154228728)))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.remote_id.to_string(), "-16297716_154228728");
        assert_eq!(first.owner, Owner::Group(16297716));

        let (second, created) = db
            .transaction(|tx| reconcile_album(tx, &raw_album(-16297716, 154228728)))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);

        let counts = db
            .reader()
            .call(|conn| repository::store_counts(conn))
            .await
            .unwrap();
        assert_eq!(counts.albums, 1);
        assert_eq!(counts.groups, 1);
    }

    #[tokio::test]
    async fn test_photo_without_album_is_dangling() {
        let db = Database::open_memory().await.unwrap();

        let err = db
            .transaction(|tx| reconcile_photo(tx, &raw_photo(6492, 100001227, 146771291)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DanglingReference { entity: "album", .. }));

        let counts = db
            .reader()
            .call(|conn| repository::store_counts(conn))
            .await
            .unwrap();
        assert_eq!(counts.photos, 0);
        assert_eq!(counts.users, 0);
    }

    #[tokio::test]
    async fn test_service_album_is_dangling() {
        let db = Database::open_memory().await.unwrap();

        let err = db
            .transaction(|tx| reconcile_photo(tx, &raw_photo(6492, -7, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DanglingReference { .. }));
    }

    #[tokio::test]
    async fn test_photo_counters_and_group_author() {
        let db = Database::open_memory().await.unwrap();

        let (photo, created) = db
            .transaction(|tx| {
                reconcile_album(tx, &raw_album(-16297716, 154228728))?;
                reconcile_photo(tx, &raw_photo(-16297716, 154228728, 280118215))
            })
            .await
            .unwrap();
        assert!(created);
        assert_eq!(photo.actions_count, 7);
        assert_eq!(photo.tags_count, 0);
        assert_eq!(photo.user_id, None);
        assert_eq!(photo.album_id.to_string(), "-16297716_154228728");
    }

    #[tokio::test]
    async fn test_comment_takes_photo_owner_prefix() {
        let db = Database::open_memory().await.unwrap();

        let (comment, _) = db
            .transaction(|tx| {
                reconcile_album(tx, &raw_album(-16297716, 154228728))?;
                let (photo, _) =
                    reconcile_photo(tx, &raw_photo(-16297716, 154228728, 280118215))?;
                reconcile_comment(tx, &photo.remote_id, &raw_comment(91121, 138571769))
            })
            .await
            .unwrap();
        assert_eq!(comment.remote_id.to_string(), "-16297716_91121");
        assert_eq!(comment.author, Owner::User(138571769));
        assert!(!comment.archived);
    }

    #[tokio::test]
    async fn test_recomment_keeps_archived_flag() {
        let db = Database::open_memory().await.unwrap();
        let photo_id = RemoteId::new(-16297716, 280118215);

        db.transaction(move |tx| {
            reconcile_album(tx, &raw_album(-16297716, 154228728))?;
            reconcile_photo(tx, &raw_photo(-16297716, 154228728, 280118215))?;
            let (comment, _) = reconcile_comment(tx, &photo_id, &raw_comment(91121, -5))?;
            repository::set_comment_archived(tx, &comment.remote_id, true)?;
            Ok(())
        })
        .await
        .unwrap();

        let (again, created) = db
            .transaction(move |tx| reconcile_comment(tx, &photo_id, &raw_comment(91121, -5)))
            .await
            .unwrap();
        assert!(!created);
        assert!(again.archived);
        assert_eq!(again.author, Owner::Group(5));
    }

    #[tokio::test]
    async fn test_batches_count_created_and_updated() {
        let db = Database::open_memory().await.unwrap();

        let albums: Vec<RawAlbum> = (1..=5).map(|id| raw_album(-1, id)).collect();
        let (stored, counts) = reconcile_batches(&db, albums.clone(), 2, reconcile_album)
            .await
            .unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(
            counts,
            SyncCounts {
                fetched: 5,
                created: 5,
                updated: 0
            }
        );

        let (_, counts) = reconcile_batches(&db, albums, 2, reconcile_album)
            .await
            .unwrap();
        assert_eq!(counts.created, 0);
        assert_eq!(counts.updated, 5);
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let db = Database::open_memory().await.unwrap();
        db.transaction(|tx| reconcile_album(tx, &raw_album(1, 10)))
            .await
            .unwrap();

        // second record references a missing album
        let photos = vec![raw_photo(1, 10, 1), raw_photo(1, 11, 2)];
        let err = reconcile_batches(&db, photos, 100, reconcile_photo)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DanglingReference { .. }));

        let counts = db
            .reader()
            .call(|conn| repository::store_counts(conn))
            .await
            .unwrap();
        assert_eq!(counts.photos, 0);
    }
}
