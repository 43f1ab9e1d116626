//! Fan-out wire types.
//!
//! A [`FanoutMessage`] describes one committed mutation. Messages are
//! ephemeral: they are pushed to every connected session and never
//! persisted. Clients treat them as "something changed, re-fetch if
//! interested", not as incremental patches, so out-of-order delivery is
//! harmless.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One committed mutation, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FanoutMessage {
  EventCreated {
    event_id:        Uuid,
    author_id:       Uuid,
    author_username: String,
    title:           String,
  },
  EventUpdated {
    event_id:  Uuid,
    author_id: Uuid,
    title:     String,
    /// Short human-readable description of what changed, supplied by the
    /// mutation endpoint (not derivable from a raw diff).
    summary:   String,
  },
  EventDeleted {
    event_id:  Uuid,
    author_id: Uuid,
    /// Carried for display; the record itself is already gone.
    title:     String,
  },
  SpecialCreated {
    special_id: Uuid,
    author_id:  Uuid,
    bar_name:   String,
    title:      String,
  },
}

impl FanoutMessage {
  /// The id of the record the message is about.
  pub fn subject_id(&self) -> Uuid {
    match self {
      Self::EventCreated { event_id, .. }
      | Self::EventUpdated { event_id, .. }
      | Self::EventDeleted { event_id, .. } => *event_id,
      Self::SpecialCreated { special_id, .. } => *special_id,
    }
  }

  pub fn author_id(&self) -> Uuid {
    match self {
      Self::EventCreated { author_id, .. }
      | Self::EventUpdated { author_id, .. }
      | Self::EventDeleted { author_id, .. }
      | Self::SpecialCreated { author_id, .. } => *author_id,
    }
  }
}

/// The envelope actually sent to sessions.
///
/// `delivery_id` is assigned once at publish time, so every delivery path
/// for the same logical notification carries the same id — the client dedup
/// guard keys on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanoutFrame {
  pub delivery_id: Uuid,
  #[serde(flatten)]
  pub message:     FanoutMessage,
}
