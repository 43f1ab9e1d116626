//! Handlers for `/specials` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/specials` | Active (unexpired) specials only |
//! | `POST`   | `/specials` | The author must be a promoted account |
//! | `DELETE` | `/specials/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use lastcall_core::{
  fanout::FanoutMessage,
  special::{DrinkSpecial, NewSpecial},
  store::EventStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /specials`
pub async fn list<S: EventStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<DrinkSpecial>>, ApiError> {
  let specials = state
    .store
    .list_active_specials(Utc::now())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(specials))
}

/// `POST /specials`
///
/// Posting is a promoted-account capability; the author is checked here
/// because the store is not the auth layer.
pub async fn create<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewSpecial>,
) -> Result<impl IntoResponse, ApiError> {
  let author = state
    .store
    .get_viewer(body.author_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("unknown viewer {}", body.author_id))
    })?;
  if !author.promoted {
    return Err(ApiError::Forbidden(format!(
      "viewer {} may not post specials",
      author.viewer_id
    )));
  }

  let special = state
    .store
    .insert_special(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  state.hub.publish(FanoutMessage::SpecialCreated {
    special_id: special.special_id,
    author_id:  special.author_id,
    bar_name:   special.bar_name.clone(),
    title:      special.title.clone(),
  });
  Ok((StatusCode::CREATED, Json(special)))
}

/// `DELETE /specials/:id` — returns the final record.
pub async fn remove<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DrinkSpecial>, ApiError> {
  let special = state
    .store
    .delete_special(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("special {id} not found")))?;
  Ok(Json(special))
}
