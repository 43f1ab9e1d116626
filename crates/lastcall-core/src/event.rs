//! Event — the central record of the service.
//!
//! Events are authored by any user, joined via the RSVP coordinator, and
//! become globally visible when `promoted` is set. `rsvp_count` is owned by
//! the coordinator; nothing else may change it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A social event.
///
/// Invariant: `0 <= rsvp_count <= capacity`. The store enforces this on
/// every join; reads never observe a violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:        Uuid,
  pub title:           String,
  pub description:     Option<String>,
  pub location:        String,
  /// Maximum number of attendees; always positive.
  pub capacity:        u32,
  pub is_21_plus:      bool,
  pub date:            DateTime<Utc>,
  pub image_url:       Option<String>,
  pub author_id:       Uuid,
  pub author_username: String,
  /// Promoted events are visible to every viewer regardless of RSVP.
  pub promoted:        bool,
  pub rsvp_count:      u32,
  pub created_at:      DateTime<Utc>,
}

impl Event {
  /// Whether the last seat has been taken.
  pub fn is_full(&self) -> bool { self.rsvp_count >= self.capacity }
}

/// Input for creating an event. Identity, `rsvp_count` and `created_at`
/// are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  pub title:           String,
  pub description:     Option<String>,
  pub location:        String,
  pub capacity:        u32,
  pub is_21_plus:      bool,
  pub date:            DateTime<Utc>,
  pub image_url:       Option<String>,
  pub author_id:       Uuid,
  pub author_username: String,
  pub promoted:        bool,
}

/// Field-level patch applied by the author. `None` leaves a field as-is.
///
/// Capacity edits are clamped so the new capacity never drops below the
/// current `rsvp_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  pub capacity:    Option<u32>,
  pub is_21_plus:  Option<bool>,
  pub date:        Option<DateTime<Utc>>,
  pub image_url:   Option<String>,
  pub promoted:    Option<bool>,
}
