//! Handlers for `/viewers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/viewers` | Body: `{"username":"…","promoted":false}` |
//! | `GET`    | `/viewers/:id` | 404 if not found |
//! | `PUT`    | `/viewers/:id/preferences` | Whole-record replace |
//! | `POST`   | `/viewers/:id/blocks/:other` | Block `other` |
//! | `DELETE` | `/viewers/:id/blocks/:other` | Unblock `other` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lastcall_core::{
  store::EventStore,
  viewer::{NewViewer, NotificationPreferences, Viewer},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `POST /viewers`
pub async fn create<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewViewer>,
) -> Result<impl IntoResponse, ApiError> {
  let viewer = state
    .store
    .insert_viewer(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(viewer)))
}

/// `GET /viewers/:id`
pub async fn get_one<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Viewer>, ApiError> {
  let viewer = state
    .store
    .get_viewer(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("viewer {id} not found")))?;
  Ok(Json(viewer))
}

/// `PUT /viewers/:id/preferences`
pub async fn put_preferences<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(prefs): Json<NotificationPreferences>,
) -> Result<StatusCode, ApiError> {
  let found = state
    .store
    .set_preferences(id, prefs)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if found {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("viewer {id} not found")))
  }
}

/// `POST /viewers/:id/blocks/:other`
pub async fn block<S: EventStore>(
  State(state): State<AppState<S>>,
  Path((id, other)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  set_block(&state, id, other, true).await
}

/// `DELETE /viewers/:id/blocks/:other`
pub async fn unblock<S: EventStore>(
  State(state): State<AppState<S>>,
  Path((id, other)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  set_block(&state, id, other, false).await
}

async fn set_block<S: EventStore>(
  state: &AppState<S>,
  viewer_id: Uuid,
  blocked_id: Uuid,
  blocked: bool,
) -> Result<StatusCode, ApiError> {
  let found = state
    .store
    .set_block(viewer_id, blocked_id, blocked)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if found {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("viewer {viewer_id} not found")))
  }
}
