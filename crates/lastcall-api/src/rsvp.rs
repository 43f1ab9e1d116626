//! Handlers for `/events/:id/rsvp`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/events/:id/rsvp` | 409 when the event is full |
//! | `DELETE` | `/events/:id/rsvp` | Idempotent |

use axum::{
  Json,
  extract::{Path, State},
};
use lastcall_core::{
  rsvp::{RsvpCoordinator, RsvpError, RsvpReceipt},
  store::EventStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RsvpBody {
  pub viewer_id: Uuid,
}

fn map_rsvp_error<E>(err: RsvpError<E>) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  match err {
    RsvpError::EventFull(id) => {
      ApiError::Conflict(format!("event {id} is full"))
    }
    RsvpError::EventNotFound(id) => {
      ApiError::NotFound(format!("event {id} not found"))
    }
    RsvpError::ViewerNotFound(id) => {
      ApiError::BadRequest(format!("unknown viewer {id}"))
    }
    RsvpError::Store(e) => ApiError::Store(Box::new(e)),
  }
}

/// `POST /events/:id/rsvp` — body: `{"viewer_id":"<id>"}`
pub async fn join<S>(
  State(state): State<AppState<S>>,
  Path(event_id): Path<Uuid>,
  Json(body): Json<RsvpBody>,
) -> Result<Json<RsvpReceipt>, ApiError>
where
  S: EventStore + Clone,
{
  let coordinator = RsvpCoordinator::new(state.store.as_ref().clone());
  let receipt = coordinator
    .join(body.viewer_id, event_id)
    .await
    .map_err(map_rsvp_error)?;
  Ok(Json(receipt))
}

/// `DELETE /events/:id/rsvp` — body: `{"viewer_id":"<id>"}`
pub async fn leave<S>(
  State(state): State<AppState<S>>,
  Path(event_id): Path<Uuid>,
  Json(body): Json<RsvpBody>,
) -> Result<Json<RsvpReceipt>, ApiError>
where
  S: EventStore + Clone,
{
  let coordinator = RsvpCoordinator::new(state.store.as_ref().clone());
  let receipt = coordinator
    .leave(body.viewer_id, event_id)
    .await
    .map_err(map_rsvp_error)?;
  Ok(Json(receipt))
}
