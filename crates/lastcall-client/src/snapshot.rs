//! Locally cached viewer state, passed explicitly to the relevance filter.
//!
//! The fan-out path must not block on a network round-trip, so the filter
//! reads a possibly-stale snapshot (a few seconds is fine). `as_of` records
//! when it was taken; callers refresh it from the API on screen loads.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use lastcall_core::viewer::{NotificationPreferences, Viewer};

/// A value, not a singleton: every call to the filter names the exact state
/// it judged against, which keeps the filter deterministic under test.
#[derive(Debug, Clone)]
pub struct ViewerSnapshot {
  pub viewer_id:   Uuid,
  pub rsvp_events: HashSet<Uuid>,
  pub preferences: NotificationPreferences,
  pub as_of:       DateTime<Utc>,
}

impl ViewerSnapshot {
  pub fn new(
    viewer_id: Uuid,
    rsvp_events: HashSet<Uuid>,
    preferences: NotificationPreferences,
  ) -> Self {
    Self { viewer_id, rsvp_events, preferences, as_of: Utc::now() }
  }
}

impl From<&Viewer> for ViewerSnapshot {
  fn from(viewer: &Viewer) -> Self {
    Self::new(
      viewer.viewer_id,
      viewer.rsvp_events.clone(),
      viewer.preferences.clone(),
    )
  }
}
