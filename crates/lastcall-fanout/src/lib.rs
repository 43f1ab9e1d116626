//! Change detection and fan-out for the Lastcall event service.
//!
//! Two producer paths feed one sink: the [`watcher::ChangeWatcher`] follows
//! the store's durable insert feed, while update/delete/special-create
//! endpoints publish directly to the [`hub::FanoutHub`] (their messages
//! carry human-readable summaries a raw log cannot supply). The hub pushes
//! every message to every connected session; targeting happens client-side.

pub mod hub;
pub mod watcher;

pub use hub::FanoutHub;
pub use watcher::ChangeWatcher;
