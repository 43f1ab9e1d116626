//! The relevance filter — turns a broadcast frame into at most one
//! user-visible notification.
//!
//! Per-kind rules:
//! - `EventCreated`: only if someone else authored it AND the viewer opted
//!   in to that author's posts (`friend_posting`, absent ⇒ no).
//! - `EventUpdated` / `EventDeleted`: only if `event_updates` is on AND the
//!   viewer had RSVP'd to the event.
//! - `SpecialCreated`: only if `drink_specials` is on.
//!
//! Constructing the [`UserNotification`] is the filter's whole effect;
//! presentation belongs to the caller. This channel is advisory — dropping
//! a frame is always correct degraded behavior.

use serde::{Deserialize, Serialize};

use lastcall_core::fanout::{FanoutFrame, FanoutMessage};

use crate::{dedup::DedupGuard, snapshot::ViewerSnapshot};

/// What the OS presenter ultimately shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotification {
  pub title: String,
  pub body:  String,
}

/// Decide whether `frame` warrants a notification for the viewer described
/// by `snapshot`, consuming one dedup slot when it does not short-circuit.
///
/// The guard check runs first: a delivery id already acted upon produces
/// nothing, whichever delivery path got here second.
pub fn relevance(
  frame: &FanoutFrame,
  snapshot: &ViewerSnapshot,
  guard: &mut DedupGuard,
) -> Option<UserNotification> {
  if !guard.first_sighting(frame.delivery_id) {
    return None;
  }

  match &frame.message {
    FanoutMessage::EventCreated { author_id, author_username, title, .. } => {
      if *author_id == snapshot.viewer_id {
        return None;
      }
      if !snapshot.preferences.wants_posts_from(*author_id) {
        return None;
      }
      Some(UserNotification {
        title: format!("{author_username} posted an event"),
        body:  title.clone(),
      })
    }

    FanoutMessage::EventUpdated { event_id, title, summary, .. } => {
      if !snapshot.preferences.event_updates
        || !snapshot.rsvp_events.contains(event_id)
      {
        return None;
      }
      Some(UserNotification {
        title: format!("{title} was updated"),
        body:  summary.clone(),
      })
    }

    FanoutMessage::EventDeleted { event_id, title, .. } => {
      if !snapshot.preferences.event_updates
        || !snapshot.rsvp_events.contains(event_id)
      {
        return None;
      }
      Some(UserNotification {
        title: format!("{title} was cancelled"),
        body:  "This event is no longer happening.".into(),
      })
    }

    FanoutMessage::SpecialCreated { bar_name, title, .. } => {
      if !snapshot.preferences.drink_specials {
        return None;
      }
      Some(UserNotification {
        title: format!("New special at {bar_name}"),
        body:  title.clone(),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use lastcall_core::viewer::NotificationPreferences;
  use uuid::Uuid;

  use super::*;

  fn snapshot(prefs: NotificationPreferences) -> ViewerSnapshot {
    ViewerSnapshot::new(Uuid::new_v4(), HashSet::new(), prefs)
  }

  fn frame(message: FanoutMessage) -> FanoutFrame {
    FanoutFrame { delivery_id: Uuid::new_v4(), message }
  }

  fn created_by(author_id: Uuid) -> FanoutMessage {
    FanoutMessage::EventCreated {
      event_id: Uuid::new_v4(),
      author_id,
      author_username: "bea".into(),
      title: "Karaoke".into(),
    }
  }

  // ── EventCreated ──────────────────────────────────────────────────────────

  #[test]
  fn friend_posting_opt_in_surfaces_creates() {
    let author = Uuid::new_v4();
    let mut prefs = NotificationPreferences::default();
    prefs.friend_posting.insert(author, true);

    let snap = snapshot(prefs);
    let mut guard = DedupGuard::new(8);

    let note = relevance(&frame(created_by(author)), &snap, &mut guard).unwrap();
    assert_eq!(note.title, "bea posted an event");
    assert_eq!(note.body, "Karaoke");
  }

  #[test]
  fn creates_without_opt_in_are_silent() {
    let author = Uuid::new_v4();
    let mut guard = DedupGuard::new(8);

    // Absent entry.
    let snap = snapshot(NotificationPreferences::default());
    assert!(relevance(&frame(created_by(author)), &snap, &mut guard).is_none());

    // Explicit false.
    let mut prefs = NotificationPreferences::default();
    prefs.friend_posting.insert(author, false);
    let snap = snapshot(prefs);
    assert!(relevance(&frame(created_by(author)), &snap, &mut guard).is_none());
  }

  #[test]
  fn own_events_never_notify_their_author() {
    let mut snap = snapshot(NotificationPreferences::default());
    // Even a self-referential opt-in does not override the self check.
    snap.preferences.friend_posting.insert(snap.viewer_id, true);
    let message = created_by(snap.viewer_id);

    let mut guard = DedupGuard::new(8);
    assert!(relevance(&frame(message), &snap, &mut guard).is_none());
  }

  // ── EventUpdated / EventDeleted ───────────────────────────────────────────

  #[test]
  fn updates_surface_only_for_rsvpd_events() {
    let event_id = Uuid::new_v4();
    let message = FanoutMessage::EventUpdated {
      event_id,
      author_id: Uuid::new_v4(),
      title: "Trivia Night".into(),
      summary: "moved to 9pm".into(),
    };

    let mut guard = DedupGuard::new(8);

    // Preference on, RSVP'd: surfaced.
    let mut snap = snapshot(NotificationPreferences::default());
    snap.rsvp_events.insert(event_id);
    let note = relevance(&frame(message.clone()), &snap, &mut guard).unwrap();
    assert_eq!(note.body, "moved to 9pm");

    // Preference on, not RSVP'd: silent even with the toggle enabled.
    let snap = snapshot(NotificationPreferences::default());
    assert!(relevance(&frame(message.clone()), &snap, &mut guard).is_none());

    // RSVP'd but preference off: silent.
    let mut prefs = NotificationPreferences::default();
    prefs.event_updates = false;
    let mut snap = snapshot(prefs);
    snap.rsvp_events.insert(event_id);
    assert!(relevance(&frame(message), &snap, &mut guard).is_none());
  }

  #[test]
  fn deletions_follow_the_update_rules_and_carry_the_title() {
    let event_id = Uuid::new_v4();
    let message = FanoutMessage::EventDeleted {
      event_id,
      author_id: Uuid::new_v4(),
      title: "Karaoke".into(),
    };

    let mut snap = snapshot(NotificationPreferences::default());
    snap.rsvp_events.insert(event_id);
    let mut guard = DedupGuard::new(8);

    let note = relevance(&frame(message), &snap, &mut guard).unwrap();
    assert_eq!(note.title, "Karaoke was cancelled");
  }

  // ── SpecialCreated ────────────────────────────────────────────────────────

  #[test]
  fn specials_follow_the_drink_specials_toggle() {
    let message = FanoutMessage::SpecialCreated {
      special_id: Uuid::new_v4(),
      author_id: Uuid::new_v4(),
      bar_name: "The Anchor".into(),
      title: "2-for-1 wells".into(),
    };
    let mut guard = DedupGuard::new(8);

    let snap = snapshot(NotificationPreferences::default());
    let note = relevance(&frame(message.clone()), &snap, &mut guard).unwrap();
    assert_eq!(note.title, "New special at The Anchor");

    let mut prefs = NotificationPreferences::default();
    prefs.drink_specials = false;
    let snap = snapshot(prefs);
    assert!(relevance(&frame(message), &snap, &mut guard).is_none());
  }

  // ── Dedup ─────────────────────────────────────────────────────────────────

  #[test]
  fn same_delivery_twice_produces_one_notification() {
    let author = Uuid::new_v4();
    let mut prefs = NotificationPreferences::default();
    prefs.friend_posting.insert(author, true);
    let snap = snapshot(prefs);

    let frame = frame(created_by(author));
    let mut guard = DedupGuard::new(8);

    // Two delegate callbacks, back to back, same delivery id.
    assert!(relevance(&frame, &snap, &mut guard).is_some());
    assert!(relevance(&frame, &snap, &mut guard).is_none());
  }

  #[test]
  fn an_irrelevant_delivery_still_claims_its_dedup_slot() {
    let snap = snapshot(NotificationPreferences::default());
    let frame = frame(created_by(Uuid::new_v4())); // no opt-in: irrelevant
    let mut guard = DedupGuard::new(8);

    assert!(relevance(&frame, &snap, &mut guard).is_none());
    assert_eq!(guard.len(), 1);
  }
}
