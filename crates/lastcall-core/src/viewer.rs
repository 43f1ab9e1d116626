//! Viewer — the slice of a user account this subsystem cares about.
//!
//! Auth, profiles and the friend graph live elsewhere; a viewer here is an
//! identity plus the relationship state that drives visibility (RSVPs,
//! blocks) and notification preferences.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-viewer notification switches.
///
/// The global toggles start enabled; `friend_posting` is strictly opt-in —
/// an author with no entry is treated as `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
  pub drink_specials:        bool,
  pub event_updates:         bool,
  pub event_reminders:       bool,
  pub announcements:         bool,
  pub location_based_offers: bool,
  /// Per-friend "tell me when they post" map, keyed by author id.
  pub friend_posting:        HashMap<Uuid, bool>,
}

impl Default for NotificationPreferences {
  fn default() -> Self {
    Self {
      drink_specials:        true,
      event_updates:         true,
      event_reminders:       true,
      announcements:         true,
      location_based_offers: true,
      friend_posting:        HashMap::new(),
    }
  }
}

impl NotificationPreferences {
  /// Whether posts authored by `author` should be surfaced. Absent entries
  /// are opt-out.
  pub fn wants_posts_from(&self, author: Uuid) -> bool {
    self.friend_posting.get(&author).copied().unwrap_or(false)
  }
}

/// The relationship state the visibility predicate consumes.
#[derive(Debug, Clone, Default)]
pub struct ViewerRelations {
  /// Event ids the viewer has joined. May contain dangling references to
  /// deleted events; readers drop those silently.
  pub rsvp_events:      HashSet<Uuid>,
  /// Authors whose content must never be shown, whatever the reason it
  /// would otherwise be visible.
  pub blocked_user_ids: HashSet<Uuid>,
}

/// A full viewer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewer {
  pub viewer_id:        Uuid,
  pub username:         String,
  /// Capability flag: promoted accounts may post drink specials.
  pub promoted:         bool,
  pub rsvp_events:      HashSet<Uuid>,
  pub blocked_user_ids: HashSet<Uuid>,
  pub preferences:      NotificationPreferences,
  pub created_at:       DateTime<Utc>,
}

impl Viewer {
  pub fn relations(&self) -> ViewerRelations {
    ViewerRelations {
      rsvp_events:      self.rsvp_events.clone(),
      blocked_user_ids: self.blocked_user_ids.clone(),
    }
  }
}

/// Input for registering a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewViewer {
  pub username: String,
  #[serde(default)]
  pub promoted: bool,
}
