pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::{ApiError, ApiErrorClass, ClientConfig, VkClient};
pub use types::{Counter, RawAlbum, RawComment, RawPhoto, Timeline};

use crate::sync::window::SortOrder;

/// The remote collections the sync engine reads from.
///
/// [`VkClient`] is the production implementation; every method issues at
/// most one HTTP request.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn get_albums(&self, req: AlbumsRequest) -> Result<Vec<RawAlbum>, ApiError>;
    async fn get_photos(&self, req: PhotosRequest) -> Result<Vec<RawPhoto>, ApiError>;
    async fn get_comments(&self, req: CommentsRequest) -> Result<Vec<RawComment>, ApiError>;
    /// User ids of everyone who liked an object.
    async fn get_likes(&self, req: LikesRequest) -> Result<Vec<i64>, ApiError>;
    async fn delete_comment(&self, owner_id: i64, comment_id: u64) -> Result<(), ApiError>;
    async fn restore_comment(&self, owner_id: i64, comment_id: u64) -> Result<(), ApiError>;
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// `photos.getAlbums`
#[derive(Debug, Clone, Default)]
pub struct AlbumsRequest {
    pub owner_id: i64,
    pub album_ids: Vec<u64>,
    pub need_covers: bool,
    pub offset: u32,
    pub count: u32,
}

impl AlbumsRequest {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("owner_id", self.owner_id.to_string()),
            ("need_covers", flag(self.need_covers)),
            ("offset", self.offset.to_string()),
            ("count", self.count.to_string()),
        ];
        if !self.album_ids.is_empty() {
            params.push(("album_ids", join_ids(&self.album_ids)));
        }
        params
    }
}

/// `photos.get`
#[derive(Debug, Clone, Default)]
pub struct PhotosRequest {
    pub owner_id: i64,
    pub album_id: u64,
    pub photo_ids: Vec<u64>,
    pub extended: bool,
    pub photo_sizes: bool,
    /// Oldest first when set.
    pub rev: bool,
    pub offset: u32,
    pub count: u32,
}

impl PhotosRequest {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("owner_id", self.owner_id.to_string()),
            ("album_id", self.album_id.to_string()),
            ("extended", flag(self.extended)),
            ("photo_sizes", flag(self.photo_sizes)),
            ("rev", flag(self.rev)),
            ("offset", self.offset.to_string()),
            ("count", self.count.to_string()),
        ];
        if !self.photo_ids.is_empty() {
            params.push(("photo_ids", join_ids(&self.photo_ids)));
        }
        params
    }
}

/// `photos.getComments`
#[derive(Debug, Clone)]
pub struct CommentsRequest {
    pub owner_id: i64,
    pub photo_id: u64,
    pub sort: SortOrder,
    pub need_likes: bool,
    pub offset: u32,
    pub count: u32,
}

impl CommentsRequest {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("owner_id", self.owner_id.to_string()),
            ("photo_id", self.photo_id.to_string()),
            ("sort", self.sort.as_str().to_string()),
            ("need_likes", flag(self.need_likes)),
            ("offset", self.offset.to_string()),
            ("count", self.count.to_string()),
        ]
    }
}

/// `likes.getList`
#[derive(Debug, Clone)]
pub struct LikesRequest {
    pub kind: &'static str,
    pub owner_id: i64,
    pub item_id: u64,
    pub offset: u32,
    pub count: u32,
}

impl LikesRequest {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("type", self.kind.to_string()),
            ("owner_id", self.owner_id.to_string()),
            ("item_id", self.item_id.to_string()),
            ("offset", self.offset.to_string()),
            ("count", self.count.to_string()),
        ]
    }
}
