//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events?viewer_id=<id>` | The viewer's visible set |
//! | `POST`   | `/events` | Body: a full new-event record |
//! | `PUT`    | `/events/:id` | Patch body plus an optional `summary` |
//! | `DELETE` | `/events/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lastcall_core::{
  event::{Event, EventPatch, NewEvent},
  fanout::FanoutMessage,
  store::EventStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub viewer_id: Uuid,
}

/// `GET /events?viewer_id=<id>`
///
/// Resolves the viewer's visible set: their RSVP'd events plus every
/// promoted event, minus blocked authors, sorted by date.
pub async fn list<S: EventStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let events = state
    .store
    .resolve_visible_events(params.viewer_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("unknown viewer {}", params.viewer_id))
    })?;
  Ok(Json(events))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /events`
///
/// The created-event notice reaches the fan-out through the change
/// watcher, not from here.
pub async fn create<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
  if body.capacity == 0 {
    return Err(ApiError::BadRequest("capacity must be positive".into()));
  }
  let event = state
    .store
    .insert_event(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(flatten)]
  pub patch:   EventPatch,
  /// Short human-readable note pushed to sessions with the update notice.
  pub summary: Option<String>,
}

/// `PUT /events/:id`
pub async fn update<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Event>, ApiError> {
  let event = state
    .store
    .update_event(id, body.patch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;

  state.hub.publish(FanoutMessage::EventUpdated {
    event_id:  event.event_id,
    author_id: event.author_id,
    title:     event.title.clone(),
    summary:   body
      .summary
      .unwrap_or_else(|| "Event details were updated.".into()),
  });
  Ok(Json(event))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /events/:id` — returns the final record.
pub async fn remove<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
  let event = state
    .store
    .delete_event(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;

  state.hub.publish(FanoutMessage::EventDeleted {
    event_id:  event.event_id,
    author_id: event.author_id,
    title:     event.title.clone(),
  });
  Ok(Json(event))
}
