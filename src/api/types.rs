use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Lenient decoders: the API sends many numeric fields as JSON strings
/// (`"size":"3"`), sometimes as objects where older versions used integers.
pub(crate) mod de {
    use std::str::FromStr;

    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn lenient<T: FromStr + TryFrom<i64>>(v: &Value) -> Option<T> {
        match v {
            Value::Number(n) => n.as_i64().and_then(|n| T::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn int<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + TryFrom<i64>,
    {
        let v = Value::deserialize(d)?;
        lenient(&v).ok_or_else(|| D::Error::custom(format!("expected integer, got {v}")))
    }

    pub fn opt_int<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + TryFrom<i64>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(v.as_ref().and_then(lenient))
    }

    pub fn timestamp<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: i64 = int(d)?;
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {secs}")))
    }

    pub fn opt_timestamp<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<i64> = opt_int(d)?;
        Ok(secs
            .filter(|s| *s > 0)
            .and_then(|s| DateTime::from_timestamp(s, 0)))
    }
}

/// `{"count": N, ...}` counter objects attached to photos and comments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Counter {
    #[serde(default, deserialize_with = "de::int")]
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAlbum {
    #[serde(deserialize_with = "de::int")]
    pub id: u64,
    #[serde(deserialize_with = "de::int")]
    pub owner_id: i64,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub thumb_id: Option<u64>,
    #[serde(default)]
    pub thumb_src: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub size: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub privacy: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPhoto {
    #[serde(deserialize_with = "de::int")]
    pub id: u64,
    /// Negative for service albums (profile, wall, saved).
    #[serde(deserialize_with = "de::int")]
    pub album_id: i64,
    #[serde(deserialize_with = "de::int")]
    pub owner_id: i64,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub photo_75: Option<String>,
    #[serde(default)]
    pub photo_130: Option<String>,
    #[serde(default)]
    pub photo_604: Option<String>,
    #[serde(default)]
    pub photo_807: Option<String>,
    #[serde(default)]
    pub photo_1280: Option<String>,
    #[serde(default)]
    pub photo_2560: Option<String>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub height: Option<u32>,
    #[serde(default)]
    pub text: String,
    #[serde(deserialize_with = "de::timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub likes: Option<Counter>,
    #[serde(default)]
    pub comments: Option<Counter>,
    #[serde(default)]
    pub tags: Option<Counter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    #[serde(alias = "cid", deserialize_with = "de::int")]
    pub id: u64,
    #[serde(deserialize_with = "de::int")]
    pub from_id: i64,
    #[serde(deserialize_with = "de::timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default, alias = "message")]
    pub text: String,
    #[serde(default)]
    pub likes: Option<Counter>,
}

/// Timestamp a raw record is windowed and ordered by.
pub trait Timeline {
    fn cut_time(&self) -> Option<DateTime<Utc>>;
}

impl Timeline for RawAlbum {
    fn cut_time(&self) -> Option<DateTime<Utc>> {
        self.updated.or(self.created)
    }
}

impl Timeline for RawPhoto {
    fn cut_time(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}

impl Timeline for RawComment {
    fn cut_time(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}
