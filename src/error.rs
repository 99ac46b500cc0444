use std::fmt;
use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid fetch window: {0}")]
    InvalidWindow(String),

    #[error("Invalid count {0}: must be between 1 and {max}", max = crate::sync::window::MAX_COUNT)]
    InvalidCount(u32),

    #[error("Remote API failed after {attempts} attempt(s): {source}")]
    RemoteTransient { attempts: u32, source: ApiError },

    #[error("Remote API error: {0}")]
    RemoteFatal(ApiError),

    #[error("{entity} {id} is not present locally")]
    DanglingReference { entity: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Invalid URL: {0}")]
    UrlParse(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Database(e.to_string())
    }
}

impl From<rusqlite_migration::Error> for Error {
    fn from(e: rusqlite_migration::Error) -> Self {
        Error::Migration(e.to_string())
    }
}

impl<E: fmt::Display> From<tokio_rusqlite::Error<E>> for Error {
    fn from(e: tokio_rusqlite::Error<E>) -> Self {
        Error::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
