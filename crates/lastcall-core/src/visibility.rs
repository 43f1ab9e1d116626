//! The visibility predicate — which events a viewer is entitled to see.
//!
//! Kept as a pure function over in-memory values so it can be tested
//! without a database; `EventStore::resolve_visible_events` is the
//! store-level operation that applies the same predicate authoritatively.

use crate::{event::Event, viewer::ViewerRelations};

/// One event, one viewer: `(id ∈ rsvp_events ∨ promoted) ∧ author ∉ blocked`.
///
/// Blocking always wins, regardless of why the event would otherwise be
/// visible.
pub fn is_visible(event: &Event, relations: &ViewerRelations) -> bool {
  if relations.blocked_user_ids.contains(&event.author_id) {
    return false;
  }
  event.promoted || relations.rsvp_events.contains(&event.event_id)
}

/// Filter a collection of events down to the viewer-visible subset,
/// preserving input order. Dangling ids in the RSVP set simply never match;
/// an empty result is valid, not an error.
pub fn visible_events(
  events: impl IntoIterator<Item = Event>,
  relations: &ViewerRelations,
) -> Vec<Event> {
  events
    .into_iter()
    .filter(|e| is_visible(e, relations))
    .collect()
}
