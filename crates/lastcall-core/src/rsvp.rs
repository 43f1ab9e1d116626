//! The RSVP coordinator — the state machine in front of the store's atomic
//! join/leave operations.
//!
//! A viewer is either `NotJoined` or `Joined` with respect to an event.
//! Both transitions are idempotent; the only real race in the system (two
//! concurrent joins for the last seat) is resolved by the backend's
//! conditional update, which this coordinator trusts and surfaces.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::{EventStore, JoinOutcome, LeaveOutcome};

/// Where the viewer stands after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpState {
  Joined,
  NotJoined,
}

/// Returned by a successful [`RsvpCoordinator::join`] or
/// [`RsvpCoordinator::leave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpReceipt {
  pub state:      RsvpState,
  pub rsvp_count: u32,
  /// True exactly when this join took the last seat — informational,
  /// useful as a signal toward the event's author.
  pub capacity_reached: bool,
}

/// Coordinator failures. `EventFull` is caller-visible and must not be
/// retried; the not-found variants map missing records; `Store` carries
/// genuine backend failures.
#[derive(Debug, Error)]
pub enum RsvpError<E: std::error::Error> {
  #[error("event {0} is full")]
  EventFull(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("viewer not found: {0}")]
  ViewerNotFound(Uuid),

  #[error(transparent)]
  Store(#[from] E),
}

/// Thin state-machine wrapper over any [`EventStore`].
#[derive(Debug, Clone)]
pub struct RsvpCoordinator<S> {
  store: S,
}

impl<S: EventStore> RsvpCoordinator<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// `NotJoined -> Joined`. Idempotent: joining twice reports `Joined`
  /// with nothing changed. Fails with [`RsvpError::EventFull`] when the
  /// event is at capacity.
  pub async fn join(
    &self,
    viewer_id: Uuid,
    event_id: Uuid,
  ) -> Result<RsvpReceipt, RsvpError<S::Error>> {
    match self.store.join_event(viewer_id, event_id).await? {
      JoinOutcome::Joined { rsvp_count, filled_capacity } => {
        if filled_capacity {
          tracing::info!(%event_id, rsvp_count, "event reached capacity");
        }
        Ok(RsvpReceipt {
          state: RsvpState::Joined,
          rsvp_count,
          capacity_reached: filled_capacity,
        })
      }
      JoinOutcome::AlreadyJoined { rsvp_count } => Ok(RsvpReceipt {
        state: RsvpState::Joined,
        rsvp_count,
        capacity_reached: false,
      }),
      JoinOutcome::Full          => Err(RsvpError::EventFull(event_id)),
      JoinOutcome::EventMissing  => Err(RsvpError::EventNotFound(event_id)),
      JoinOutcome::ViewerMissing => Err(RsvpError::ViewerNotFound(viewer_id)),
    }
  }

  /// `Joined -> NotJoined`. Idempotent: leaving twice reports `NotJoined`
  /// with nothing changed.
  pub async fn leave(
    &self,
    viewer_id: Uuid,
    event_id: Uuid,
  ) -> Result<RsvpReceipt, RsvpError<S::Error>> {
    let rsvp_count = match self.store.leave_event(viewer_id, event_id).await? {
      LeaveOutcome::Left { rsvp_count } => rsvp_count,
      LeaveOutcome::NotJoined => {
        // No seat held; report the terminal state without a count change.
        self
          .store
          .get_event(event_id)
          .await?
          .map(|e| e.rsvp_count)
          .unwrap_or(0)
      }
      LeaveOutcome::EventMissing => {
        return Err(RsvpError::EventNotFound(event_id));
      }
      LeaveOutcome::ViewerMissing => {
        return Err(RsvpError::ViewerNotFound(viewer_id));
      }
    };
    Ok(RsvpReceipt {
      state: RsvpState::NotJoined,
      rsvp_count,
      capacity_reached: false,
    })
  }
}
