//! The `EventStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `lastcall-store-sqlite`). Higher layers (`lastcall-api`,
//! `lastcall-fanout`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  event::{Event, EventPatch, NewEvent},
  special::{DrinkSpecial, NewSpecial},
  viewer::{NewViewer, NotificationPreferences, Viewer},
};

// ─── RSVP outcomes ───────────────────────────────────────────────────────────

/// Result of a store-level join. The conditional increment and the
/// membership insert commit as one transaction.
///
/// Missing records are outcomes rather than backend errors so callers can
/// react to them without knowing the backend's error type; the
/// [`RsvpCoordinator`](crate::rsvp::RsvpCoordinator) turns them into typed
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
  /// The viewer took a seat. `filled_capacity` is true when this join took
  /// the last one.
  Joined { rsvp_count: u32, filled_capacity: bool },
  /// The viewer already held a seat; nothing changed.
  AlreadyJoined { rsvp_count: u32 },
  /// No seats left. The attempt changed nothing.
  Full,
  EventMissing,
  ViewerMissing,
}

/// Result of a store-level leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
  Left { rsvp_count: u32 },
  /// The viewer held no seat; nothing changed.
  NotJoined,
  EventMissing,
  ViewerMissing,
}

// ─── Change feed ─────────────────────────────────────────────────────────────

/// What a change-log row records. Only inserts flow through the log;
/// updates, deletes and special-creates are endpoint-driven because they
/// carry human-readable summaries a raw log cannot supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
  EventInserted,
}

/// One durable change-log row. `seq` is strictly increasing per store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
  pub seq:        u64,
  pub kind:       ChangeKind,
  pub subject_id: Uuid,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an event store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Events ────────────────────────────────────────────────────────────

  /// Persist a new event with `rsvp_count = 0` and append an
  /// [`ChangeKind::EventInserted`] row to the change log in the same
  /// transaction.
  fn insert_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Retrieve an event by id. Returns `None` if not found.
  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// List all events, sorted by date ascending.
  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Apply a field patch and return the updated record, or `None` if the
  /// event does not exist. Capacity edits clamp to the current
  /// `rsvp_count`.
  fn update_event(
    &self,
    id: Uuid,
    patch: EventPatch,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Delete an event and return the final record (callers need the title
  /// for the deletion notice), or `None` if it did not exist. RSVP
  /// references are left dangling; readers tolerate them.
  fn delete_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  // ── RSVP ──────────────────────────────────────────────────────────────

  /// Take a seat for `viewer` on `event`.
  ///
  /// The capacity check and the increment must be applied as one atomic
  /// conditional update: two concurrent joins for the last open seat must
  /// resolve to exactly one `Joined` and one `Full`.
  fn join_event(
    &self,
    viewer_id: Uuid,
    event_id: Uuid,
  ) -> impl Future<Output = Result<JoinOutcome, Self::Error>> + Send + '_;

  /// Give a seat back. Decrement floors at zero; leaving twice is a no-op.
  fn leave_event(
    &self,
    viewer_id: Uuid,
    event_id: Uuid,
  ) -> impl Future<Output = Result<LeaveOutcome, Self::Error>> + Send + '_;

  // ── Viewers ───────────────────────────────────────────────────────────

  fn insert_viewer(
    &self,
    input: NewViewer,
  ) -> impl Future<Output = Result<Viewer, Self::Error>> + Send + '_;

  fn get_viewer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Viewer>, Self::Error>> + Send + '_;

  /// Replace a viewer's notification preferences wholesale. Returns
  /// `false` if the viewer does not exist.
  fn set_preferences(
    &self,
    viewer_id: Uuid,
    prefs: NotificationPreferences,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Add or remove a viewer → author suppression edge. Returns `false` if
  /// the viewer does not exist.
  fn set_block(
    &self,
    viewer_id: Uuid,
    blocked_id: Uuid,
    blocked: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Visibility ────────────────────────────────────────────────────────

  /// The authoritative per-viewer event list: RSVP'd-or-promoted, minus
  /// blocked authors, sorted by date ascending. Dangling RSVP references
  /// produce no match and are dropped silently. Returns `None` when the
  /// viewer identity does not resolve (an empty list is a valid `Some`).
  fn resolve_visible_events(
    &self,
    viewer_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<Event>>, Self::Error>> + Send + '_;

  // ── Drink specials ────────────────────────────────────────────────────

  /// Persist a special. The promoted-capability check is the caller's job
  /// (the store is not the auth layer).
  fn insert_special(
    &self,
    input: NewSpecial,
  ) -> impl Future<Output = Result<DrinkSpecial, Self::Error>> + Send + '_;

  fn get_special(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DrinkSpecial>, Self::Error>> + Send + '_;

  /// Delete a special and return the final record, or `None` if it did
  /// not exist.
  fn delete_special(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DrinkSpecial>, Self::Error>> + Send + '_;

  /// Specials with `expires_at > now`, newest first.
  fn list_active_specials(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<DrinkSpecial>, Self::Error>> + Send + '_;

  // ── Change feed ───────────────────────────────────────────────────────

  /// Change-log rows with `seq > after_seq`, in seq order, at most `limit`.
  fn changes_since(
    &self,
    after_seq: u64,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ChangeRecord>, Self::Error>> + Send + '_;

  /// The highest seq in the change log (0 when empty). Watchers start
  /// their cursor here.
  fn latest_change_seq(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
