//! The dedup guard — collapses duplicate delivery callbacks for one logical
//! notification into a single effect.
//!
//! The platform can invoke two independent delegate paths for the same
//! delivery (presented-while-foregrounded and user-tapped), back-to-back
//! with no intervening await. The guard is a plain synchronous structure:
//! whichever call gets there first wins, the other is a no-op.

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

/// Bounded first-in-first-out set of delivery ids already acted upon.
#[derive(Debug)]
pub struct DedupGuard {
  seen:     HashSet<Uuid>,
  order:    VecDeque<Uuid>,
  capacity: usize,
}

impl DedupGuard {
  /// `capacity` must be positive; the guard holds at most that many ids
  /// and evicts the oldest first.
  pub fn new(capacity: usize) -> Self {
    assert!(capacity > 0, "dedup guard capacity must be positive");
    Self {
      seen:     HashSet::with_capacity(capacity),
      order:    VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Record `delivery_id` and report whether this was its first sighting.
  /// Returns `false` for every call after the first.
  pub fn first_sighting(&mut self, delivery_id: Uuid) -> bool {
    if !self.seen.insert(delivery_id) {
      return false;
    }
    if self.order.len() == self.capacity {
      if let Some(evicted) = self.order.pop_front() {
        self.seen.remove(&evicted);
      }
    }
    self.order.push_back(delivery_id);
    true
  }

  pub fn len(&self) -> usize { self.order.len() }

  pub fn is_empty(&self) -> bool { self.order.is_empty() }
}
