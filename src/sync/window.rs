use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Hard maximum page size accepted by the API.
pub const MAX_COUNT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidWindow(format!(
                "unknown sort direction '{other}', expected asc or desc"
            ))),
        }
    }
}

/// Validated cursor parameters for one sync call.
///
/// `after` and `before` are exclusive bounds on the collection's cut field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchWindow {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub offset: u32,
    pub count: u32,
    pub sort: SortOrder,
}

impl Default for FetchWindow {
    fn default() -> Self {
        Self {
            after: None,
            before: None,
            offset: 0,
            count: MAX_COUNT,
            sort: SortOrder::Desc,
        }
    }
}

impl FetchWindow {
    /// Validate and normalize raw cursor parameters.
    ///
    /// The API walks collections newest-first, so a lower bound only makes
    /// sense with descending order, and an upper bound needs a lower one.
    pub fn resolve(
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
        offset: Option<u32>,
        count: Option<u32>,
        sort: Option<SortOrder>,
    ) -> Result<Self> {
        let sort = sort.unwrap_or_default();

        match (after, before) {
            (None, Some(_)) => {
                return Err(Error::InvalidWindow(
                    "`before` requires `after` to be set".into(),
                ))
            }
            (Some(after), Some(before)) if before <= after => {
                return Err(Error::InvalidWindow(format!(
                    "`before` ({before}) must be later than `after` ({after})"
                )))
            }
            _ => {}
        }

        if sort == SortOrder::Asc && after.is_some() {
            return Err(Error::InvalidWindow(
                "ascending sort cannot be combined with `after`".into(),
            ));
        }

        let count = count.unwrap_or(MAX_COUNT);
        if count == 0 || count > MAX_COUNT {
            return Err(Error::InvalidCount(count));
        }

        Ok(Self {
            after,
            before,
            offset: offset.unwrap_or(0),
            count,
            sort,
        })
    }

    /// True when `t` lies strictly inside the window.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.after.map_or(true, |after| t > after) && self.before.map_or(true, |before| t < before)
    }

    pub fn is_bounded(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }
}
