use std::collections::HashSet;
use std::future::Future;

use rusqlite::Connection;

use crate::api::{
    AlbumsRequest, CommentsRequest, LikesRequest, PhotoSource, PhotosRequest, RawComment,
};
use crate::error::{Error, Result};
use crate::model::{Album, Comment, Commentable, Likable, Owner, Photo, RemoteId};
use crate::storage::repository::{self, SyncCounts};
use crate::storage::Database;
use crate::sync::pager::{fetch_pages, order_and_cut, PagePlan};
use crate::sync::reconcile::{self, reconcile_batches};
use crate::sync::window::FetchWindow;
use crate::sync::{AlbumsQuery, CommentsQuery, PhotosQuery, SyncOptions, SyncReport, Synced};

/// Sync every album of `owner`.
///
/// Albums are always walked to the end of the collection: the API returns
/// them in no particular order, so the window can only be cut once all of
/// them are known.
pub async fn sync_albums(
    db: &Database,
    source: &dyn PhotoSource,
    owner: Owner,
    query: &AlbumsQuery,
    options: &SyncOptions,
) -> Result<Synced<Album>> {
    let window = FetchWindow::resolve(
        query.after,
        query.before,
        None,
        Some(options.page_size),
        None,
    )?;
    let entity_key = format!("albums:{}", owner.signed());
    let label = entity_key.clone();

    tracked(db, entity_key, async {
        let plan = PagePlan {
            offset: 0,
            page_size: window.count,
            fetch_all: true,
        };
        let raw = fetch_pages(&label, plan, &options.retry, |page| {
            source.get_albums(AlbumsRequest {
                owner_id: owner.signed(),
                album_ids: query.ids.clone(),
                need_covers: query.need_covers,
                offset: page.offset,
                count: page.count,
            })
        })
        .await?;
        let raw = order_and_cut(raw, &window, true);
        reconcile_batches(db, raw, window.count as usize, reconcile::reconcile_album).await
    })
    .await
}

/// Sync photos of one album, newest first.
///
/// Without `all` only the page at `offset` is requested, unless `after` is
/// set, in which case the whole album is walked before the window is cut.
pub async fn sync_photos(
    db: &Database,
    source: &dyn PhotoSource,
    album: RemoteId,
    query: &PhotosQuery,
    options: &SyncOptions,
) -> Result<Synced<Photo>> {
    let window = FetchWindow::resolve(
        query.after,
        query.before,
        query.offset,
        query.count.or(Some(options.page_size)),
        None,
    )?;
    let entity_key = format!("photos:{album}");
    let label = entity_key.clone();

    tracked(db, entity_key, async {
        let plan = PagePlan {
            offset: window.offset,
            page_size: window.count,
            fetch_all: query.all || window.after.is_some(),
        };
        let raw = fetch_pages(&label, plan, &options.retry, |page| {
            source.get_photos(PhotosRequest {
                owner_id: album.owner_id,
                album_id: album.local_id,
                photo_ids: query.ids.clone(),
                extended: query.extended,
                photo_sizes: query.photo_sizes,
                rev: query.rev,
                offset: page.offset,
                count: page.count,
            })
        })
        .await?;
        let raw = order_and_cut(raw, &window, true);
        reconcile_batches(db, raw, window.count as usize, reconcile::reconcile_photo).await
    })
    .await
}

/// Sync comments of a photo. Comments keep the order the API returns them in.
pub async fn sync_comments<C: Commentable + ?Sized>(
    db: &Database,
    source: &dyn PhotoSource,
    target: &C,
    query: &CommentsQuery,
    options: &SyncOptions,
) -> Result<Synced<Comment>> {
    let window = FetchWindow::resolve(
        query.after,
        query.before,
        query.offset,
        query.count.or(Some(options.page_size)),
        query.sort,
    )?;
    let photo_id = target.comments_target();
    let entity_key = format!("comments:{photo_id}");
    let label = entity_key.clone();

    tracked(db, entity_key, async {
        let plan = PagePlan {
            offset: window.offset,
            page_size: window.count,
            fetch_all: query.all || window.after.is_some(),
        };
        let raw = fetch_pages(&label, plan, &options.retry, |page| {
            source.get_comments(CommentsRequest {
                owner_id: photo_id.owner_id,
                photo_id: photo_id.local_id,
                sort: window.sort,
                need_likes: query.need_likes,
                offset: page.offset,
                count: page.count,
            })
        })
        .await?;
        let raw = order_and_cut(raw, &window, false);
        reconcile_batches(
            db,
            raw,
            window.count as usize,
            move |conn: &Connection, raw: &RawComment| {
                reconcile::reconcile_comment(conn, &photo_id, raw)
            },
        )
        .await
    })
    .await
}

/// Replace the stored likers of `target` with the current remote list.
///
/// Returns the liker ids. `created` counts likers not seen before, `updated`
/// the ones already recorded.
pub async fn sync_likes<L: Likable + ?Sized>(
    db: &Database,
    source: &dyn PhotoSource,
    target: &L,
    all: bool,
    options: &SyncOptions,
) -> Result<Synced<u64>> {
    let page_size = FetchWindow::resolve(None, None, None, Some(options.page_size), None)?.count;
    let kind = target.likes_type();
    let item = target.likes_target();
    let entity_key = format!("likes:{item}");
    let label = entity_key.clone();

    tracked(db, entity_key, async {
        let plan = PagePlan {
            offset: 0,
            page_size,
            fetch_all: all,
        };
        let raw = fetch_pages(&label, plan, &options.retry, |page| {
            source.get_likes(LikesRequest {
                kind,
                owner_id: item.owner_id,
                item_id: item.local_id,
                offset: page.offset,
                count: page.count,
            })
        })
        .await?;

        let fetched = raw.len();
        let mut seen = HashSet::new();
        let likers: Vec<u64> = raw
            .into_iter()
            .filter(|id| *id > 0)
            .map(|id| id as u64)
            .filter(|id| seen.insert(*id))
            .collect();

        db.transaction(move |tx| {
            let previous: HashSet<u64> =
                repository::list_photo_likers(tx, &item)?.into_iter().collect();
            if repository::get_photo(tx, &item)?.is_none() {
                return Err(Error::DanglingReference {
                    entity: "photo",
                    id: item.to_string(),
                });
            }
            repository::replace_photo_likes(tx, &item, &likers)?;
            let updated = likers.iter().filter(|id| previous.contains(id)).count();
            let counts = SyncCounts {
                fetched,
                created: likers.len() - updated,
                updated,
            };
            Ok((likers, counts))
        })
        .await
    })
    .await
}

/// Delete a comment remotely and mark it archived locally. The row is kept.
pub async fn archive_comment(
    db: &Database,
    source: &dyn PhotoSource,
    comment_id: RemoteId,
    options: &SyncOptions,
) -> Result<Comment> {
    set_archived(db, source, comment_id, true, options).await
}

/// Restore a previously deleted comment remotely and clear the local flag.
pub async fn restore_comment(
    db: &Database,
    source: &dyn PhotoSource,
    comment_id: RemoteId,
    options: &SyncOptions,
) -> Result<Comment> {
    set_archived(db, source, comment_id, false, options).await
}

async fn set_archived(
    db: &Database,
    source: &dyn PhotoSource,
    comment_id: RemoteId,
    archived: bool,
    options: &SyncOptions,
) -> Result<Comment> {
    let comment = db
        .reader()
        .call(move |conn| repository::get_comment(conn, &comment_id))
        .await?
        .ok_or_else(|| Error::NotFound(format!("comment {comment_id}")))?;

    let (method, label) = if archived {
        ("photos.deleteComment", "archive")
    } else {
        ("photos.restoreComment", "restore")
    };
    options
        .retry
        .run(method, || {
            if archived {
                source.delete_comment(comment_id.owner_id, comment_id.local_id)
            } else {
                source.restore_comment(comment_id.owner_id, comment_id.local_id)
            }
        })
        .await?;

    db.writer()
        .call(move |conn| repository::set_comment_archived(conn, &comment_id, archived))
        .await?;
    log::info!("{label}: comment {comment_id}");

    Ok(Comment { archived, ..comment })
}

/// Run one sync under a `sync_jobs` record: the job is marked completed with
/// the run's counts, or failed with the error message.
async fn tracked<T, Fut>(db: &Database, entity_key: String, work: Fut) -> Result<Synced<T>>
where
    Fut: Future<Output = Result<(Vec<T>, SyncCounts)>>,
{
    let job_id = db
        .writer()
        .call({
            let entity_key = entity_key.clone();
            move |conn| repository::insert_sync_job(conn, &entity_key)
        })
        .await?;

    match work.await {
        Ok((items, counts)) => {
            db.writer()
                .call(move |conn| {
                    repository::update_sync_job(conn, job_id, "completed", &counts, None)
                })
                .await?;
            log::info!(
                "{entity_key}: {} fetched, {} created, {} updated",
                counts.fetched,
                counts.created,
                counts.updated
            );
            Ok(Synced {
                items,
                report: SyncReport::from_counts(entity_key, counts),
            })
        }
        Err(e) => {
            let message = e.to_string();
            let recorded = db
                .writer()
                .call(move |conn| {
                    repository::update_sync_job(
                        conn,
                        job_id,
                        "failed",
                        &SyncCounts::default(),
                        Some(&message),
                    )
                })
                .await;
            if let Err(job_err) = recorded {
                log::warn!("{entity_key}: could not record failed sync job: {job_err}");
            }
            log::warn!("{entity_key}: sync failed: {e}");
            Err(e)
        }
    }
}
