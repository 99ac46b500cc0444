use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Who owns an album, photo, or authored a comment.
///
/// The API encodes this as a signed integer: positive ids are users,
/// negative ids are groups. The sign is resolved once, at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Owner {
    User(u64),
    Group(u64),
}

impl Owner {
    pub fn from_signed(id: i64) -> Self {
        if id < 0 {
            Owner::Group(id.unsigned_abs())
        } else {
            Owner::User(id as u64)
        }
    }

    /// A user id as written in `id<N>`. Zero and ids outside the signed
    /// range are rejected.
    pub fn user(id: u64) -> Result<Self> {
        checked_id(id).map(Owner::User)
    }

    /// A group id as written in `club<N>`. Zero and ids outside the signed
    /// range are rejected.
    pub fn group(id: u64) -> Result<Self> {
        checked_id(id).map(Owner::Group)
    }

    /// Signed form used on the wire and in the store.
    ///
    /// Ids too large for `i64` saturate, so the sign always matches the
    /// variant.
    pub fn signed(&self) -> i64 {
        match *self {
            Owner::User(id) => i64::try_from(id).unwrap_or(i64::MAX),
            Owner::Group(id) => i64::try_from(id)
                .map(|id| -id)
                .unwrap_or(i64::MIN),
        }
    }
}

fn checked_id(id: u64) -> Result<u64> {
    if id == 0 || i64::try_from(id).is_err() {
        return Err(Error::InvalidIdentifier(format!(
            "owner id {id} is out of range"
        )));
    }
    Ok(id)
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::User(id) => write!(f, "id{id}"),
            Owner::Group(id) => write!(f, "club{id}"),
        }
    }
}

/// Compound remote identifier: signed owner id plus the owner-local id,
/// rendered as `-16297716_91121`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteId {
    pub owner_id: i64,
    pub local_id: u64,
}

impl RemoteId {
    pub fn new(owner_id: i64, local_id: u64) -> Self {
        Self { owner_id, local_id }
    }

    pub fn owner(&self) -> Owner {
        Owner::from_signed(self.owner_id)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.owner_id, self.local_id)
    }
}

impl FromStr for RemoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (owner, local) = s
            .split_once('_')
            .ok_or_else(|| Error::InvalidIdentifier(format!("expected <owner>_<id>, got '{s}'")))?;
        let owner_id: i64 = owner
            .parse()
            .map_err(|_| Error::InvalidIdentifier(format!("bad owner id in '{s}'")))?;
        let local_id: u64 = local
            .parse()
            .map_err(|_| Error::InvalidIdentifier(format!("bad local id in '{s}'")))?;
        if owner_id == 0 {
            return Err(Error::InvalidIdentifier(format!("owner id cannot be zero in '{s}'")));
        }
        Ok(Self { owner_id, local_id })
    }
}

impl Serialize for RemoteId {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    AllUsers,
    FriendsOnly,
    FriendsOfFriends,
    OnlyMe,
}

impl Privacy {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Privacy::AllUsers),
            1 => Some(Privacy::FriendsOnly),
            2 => Some(Privacy::FriendsOfFriends),
            3 => Some(Privacy::OnlyMe),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Privacy::AllUsers => 0,
            Privacy::FriendsOnly => 1,
            Privacy::FriendsOfFriends => 2,
            Privacy::OnlyMe => 3,
        }
    }
}

// ── Capabilities ───────────────────────────────────────────────────

pub trait Ownerable {
    fn owner(&self) -> Owner;
}

/// Objects that can be liked; `likes_type` is the `type` parameter of
/// `likes.getList`.
pub trait Likable {
    fn likes_type(&self) -> &'static str;
    fn likes_target(&self) -> RemoteId;
}

pub trait Commentable {
    fn comments_target(&self) -> RemoteId;
}

// ── Entities ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Album {
    pub remote_id: RemoteId,
    pub owner: Owner,
    pub thumb_id: Option<u64>,
    pub thumb_src: String,
    pub title: String,
    pub description: String,
    pub size: u32,
    pub privacy: Option<Privacy>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Album {
    pub fn slug(&self) -> String {
        format!("album{}", self.remote_id)
    }

    /// Timestamp used for windowing: last update, else creation.
    pub fn cut_time(&self) -> Option<DateTime<Utc>> {
        self.updated.or(self.created)
    }
}

impl Ownerable for Album {
    fn owner(&self) -> Owner {
        self.owner
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhotoSizes {
    pub photo_75: String,
    pub photo_130: String,
    pub photo_604: String,
    pub photo_807: String,
    pub photo_1280: String,
    pub photo_2560: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub remote_id: RemoteId,
    pub album_id: RemoteId,
    pub owner: Owner,
    pub user_id: Option<u64>,
    pub sizes: PhotoSizes,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub likes_count: u32,
    pub comments_count: u32,
    pub tags_count: u32,
    pub actions_count: u32,
    pub text: String,
    pub date: DateTime<Utc>,
}

impl Photo {
    pub fn slug(&self) -> String {
        format!("photo{}", self.remote_id)
    }

    /// Default thumbnail.
    pub fn src(&self) -> &str {
        &self.sizes.photo_130
    }

    /// Recompute `actions_count` from its parts.
    pub fn recount(&mut self) {
        self.actions_count = self.likes_count.saturating_add(self.comments_count);
    }
}

impl Ownerable for Photo {
    fn owner(&self) -> Owner {
        self.owner
    }
}

impl Likable for Photo {
    fn likes_type(&self) -> &'static str {
        "photo"
    }

    fn likes_target(&self) -> RemoteId {
        self.remote_id
    }
}

impl Commentable for Photo {
    fn comments_target(&self) -> RemoteId {
        self.remote_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub remote_id: RemoteId,
    pub photo_id: RemoteId,
    pub author: Owner,
    pub date: DateTime<Utc>,
    pub text: String,
    pub likes_count: u32,
    pub archived: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_sign() {
        assert_eq!(Owner::from_signed(6492), Owner::User(6492));
        assert_eq!(Owner::from_signed(-16297716), Owner::Group(16297716));
        assert_eq!(Owner::Group(16297716).signed(), -16297716);
        assert_eq!(Owner::User(6492).signed(), 6492);
    }

    #[test]
    fn test_owner_sign_never_flips() {
        assert_eq!(Owner::from_signed(i64::MIN).signed(), i64::MIN);
        assert_eq!(Owner::Group(u64::MAX).signed(), i64::MIN);
        assert_eq!(Owner::User(u64::MAX).signed(), i64::MAX);
        assert_eq!(Owner::Group(1 << 63).signed(), i64::MIN);
    }

    #[test]
    fn test_owner_constructors_check_range() {
        assert_eq!(Owner::group(16297716).unwrap(), Owner::Group(16297716));
        assert_eq!(Owner::user(i64::MAX as u64).unwrap().signed(), i64::MAX);
        assert!(matches!(Owner::group(0), Err(Error::InvalidIdentifier(_))));
        assert!(Owner::user(0).is_err());
        assert!(Owner::user(1 << 63).is_err());
        assert!(Owner::group(u64::MAX).is_err());
    }

    #[test]
    fn test_remote_id_parse() {
        let id: RemoteId = "-16297716_91121".parse().unwrap();
        assert_eq!(id, RemoteId::new(-16297716, 91121));
        assert_eq!(id.owner(), Owner::Group(16297716));
        assert_eq!(id.to_string(), "-16297716_91121");
    }

    #[test]
    fn test_remote_id_rejects_garbage() {
        assert!("16297716".parse::<RemoteId>().is_err());
        assert!("abc_1".parse::<RemoteId>().is_err());
        assert!("1_-5".parse::<RemoteId>().is_err());
        assert!("0_5".parse::<RemoteId>().is_err());
    }

    #[test]
    fn test_recount_actions() {
        let mut photo = Photo {
            remote_id: RemoteId::new(1, 2),
            album_id: RemoteId::new(1, 3),
            owner: Owner::User(1),
            user_id: None,
            sizes: PhotoSizes::default(),
            width: None,
            height: None,
            likes_count: 4,
            comments_count: 3,
            tags_count: 0,
            actions_count: 0,
            text: String::new(),
            date: Utc::now(),
        };
        photo.recount();
        assert_eq!(photo.actions_count, 7);
    }

    #[test]
    fn test_slugs() {
        let album = Album {
            remote_id: RemoteId::new(-16297716, 154228728),
            owner: Owner::Group(16297716),
            thumb_id: None,
            thumb_src: String::new(),
            title: String::new(),
            description: String::new(),
            size: 0,
            privacy: None,
            created: None,
            updated: None,
        };
        assert_eq!(album.slug(), "album-16297716_154228728");
        assert_eq!(album.owner().to_string(), "club16297716");
    }
}
