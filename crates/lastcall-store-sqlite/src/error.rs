//! Error type for `lastcall-store-sqlite`.

use thiserror::Error;

/// Backend failures. Domain conditions (not-found, full, invalid viewer)
/// are not errors here — they travel through the `EventStore` outcome
/// types so callers can react without knowing this crate.
#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown change kind: {0:?}")]
  UnknownChangeKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
