//! SQLite backend for the Lastcall event store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Also owns the durable change
//! log and the `watch`-channel signal that the fan-out watcher subscribes
//! to.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
