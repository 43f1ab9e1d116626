//! Client-side pieces of the Lastcall notification path.
//!
//! A session receives every broadcast frame and decides locally whether it
//! deserves a user-visible notification: the [`filter`] consults a cached
//! [`snapshot::ViewerSnapshot`] and a [`dedup::DedupGuard`], and produces at
//! most one [`filter::UserNotification`] per logical delivery. Presenting
//! the notification (the OS notification center) is the caller's job.

pub mod client;
pub mod dedup;
pub mod filter;
pub mod snapshot;

pub use client::{ApiClient, ApiConfig, FrameStream, JoinResponse, subscribe};
pub use dedup::DedupGuard;
pub use filter::{relevance, UserNotification};
pub use snapshot::ViewerSnapshot;
