//! HTTP + WebSocket surface for Lastcall.
//!
//! Exposes an axum [`Router`] backed by any [`lastcall_core::store::EventStore`].
//! REST endpoints live under `/api`; `/ws` is the fan-out push feed. Auth,
//! TLS, and transport concerns are the caller's responsibility.

pub mod error;
pub mod events;
pub mod rsvp;
pub mod specials;
pub mod viewers;
pub mod ws;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use lastcall_core::store::EventStore;
use lastcall_fanout::FanoutHub;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub hub:   FanoutHub,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), hub: self.hub.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// REST routes, to be nested under `/api`.
pub fn api_router<S>() -> Router<AppState<S>>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/events/{id}",
      put(events::update::<S>).delete(events::remove::<S>),
    )
    // RSVP
    .route(
      "/events/{id}/rsvp",
      post(rsvp::join::<S>).delete(rsvp::leave::<S>),
    )
    // Drink specials
    .route("/specials", get(specials::list::<S>).post(specials::create::<S>))
    .route("/specials/{id}", delete(specials::remove::<S>))
    // Viewers
    .route("/viewers", post(viewers::create::<S>))
    .route("/viewers/{id}", get(viewers::get_one::<S>))
    .route("/viewers/{id}/preferences", put(viewers::put_preferences::<S>))
    .route(
      "/viewers/{id}/blocks/{other}",
      post(viewers::block::<S>).delete(viewers::unblock::<S>),
    )
}

/// Build the full application: `/api/...` plus the `/ws` push feed.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .nest("/api", api_router::<S>())
    .route("/ws", get(ws::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::{Duration, Utc};
  use lastcall_core::fanout::FanoutMessage;
  use lastcall_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState { store: Arc::new(store), hub: FanoutHub::new() }
  }

  async fn request(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(value) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(value.to_string())
      }
      None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    app(state.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn event_body(author_id: Uuid, capacity: u32, promoted: bool) -> Value {
    json!({
      "title":           "Trivia Night",
      "description":     "weekly pub quiz",
      "location":        "The Anchor",
      "capacity":        capacity,
      "is_21_plus":      false,
      "date":            (Utc::now() + Duration::days(2)).to_rfc3339(),
      "image_url":       null,
      "author_id":       author_id,
      "author_username": "sam",
      "promoted":        promoted,
    })
  }

  fn special_body(author_id: Uuid) -> Value {
    json!({
      "title":       "2-for-1 wells",
      "author_id":   author_id,
      "bar_name":    "The Anchor",
      "description": "all night",
      "image_url":   null,
      "offers":      [{"name": "house lager", "price": 4.0}],
      "expires_at":  (Utc::now() + Duration::hours(4)).to_rfc3339(),
    })
  }

  async fn make_viewer(
    state: &AppState<SqliteStore>,
    username: &str,
    promoted: bool,
  ) -> Uuid {
    let resp = request(
      state,
      "POST",
      "/api/viewers",
      Some(json!({"username": username, "promoted": promoted})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["viewer_id"]
      .as_str()
      .unwrap()
      .parse()
      .unwrap()
  }

  async fn make_event(
    state: &AppState<SqliteStore>,
    author_id: Uuid,
    capacity: u32,
    promoted: bool,
  ) -> Uuid {
    let resp = request(
      state,
      "POST",
      "/api/events",
      Some(event_body(author_id, capacity, promoted)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["event_id"]
      .as_str()
      .unwrap()
      .parse()
      .unwrap()
  }

  // ── Viewers ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_and_fetch_viewer() {
    let state = make_state().await;
    let id = make_viewer(&state, "alice", false).await;

    let resp = request(&state, "GET", &format!("/api/viewers/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let viewer = body_json(resp).await;
    assert_eq!(viewer["username"], "alice");
    assert_eq!(viewer["promoted"], false);
    assert_eq!(viewer["preferences"]["drink_specials"], true);
  }

  #[tokio::test]
  async fn fetching_unknown_viewer_returns_404() {
    let state = make_state().await;
    let resp = request(
      &state,
      "GET",
      &format!("/api/viewers/{}", Uuid::new_v4()),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Events ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn visible_events_require_a_known_viewer() {
    let state = make_state().await;
    let resp = request(
      &state,
      "GET",
      &format!("/api/events?viewer_id={}", Uuid::new_v4()),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn promoted_events_show_up_for_everyone() {
    let state = make_state().await;
    let viewer = make_viewer(&state, "alice", false).await;
    let event = make_event(&state, Uuid::new_v4(), 10, true).await;
    make_event(&state, Uuid::new_v4(), 10, false).await;

    let resp = request(
      &state,
      "GET",
      &format!("/api/events?viewer_id={viewer}"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let events = body_json(resp).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_id"], event.to_string());
  }

  #[tokio::test]
  async fn zero_capacity_events_are_rejected() {
    let state = make_state().await;
    let resp = request(
      &state,
      "POST",
      "/api/events",
      Some(event_body(Uuid::new_v4(), 0, false)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn updating_an_event_pushes_a_summary_frame() {
    let state = make_state().await;
    let event = make_event(&state, Uuid::new_v4(), 10, true).await;
    let mut session = state.hub.subscribe();

    let resp = request(
      &state,
      "PUT",
      &format!("/api/events/{event}"),
      Some(json!({"title": "Trivia Night (moved)", "summary": "moved to 9pm"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["title"], "Trivia Night (moved)");

    let frame = session.try_recv().unwrap();
    match &frame.message {
      FanoutMessage::EventUpdated { event_id, title, summary, .. } => {
        assert_eq!(*event_id, event);
        assert_eq!(title, "Trivia Night (moved)");
        assert_eq!(summary, "moved to 9pm");
      }
      other => panic!("expected EventUpdated, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn deleting_an_event_pushes_a_deleted_frame_once() {
    let state = make_state().await;
    let event = make_event(&state, Uuid::new_v4(), 10, false).await;
    let mut session = state.hub.subscribe();

    let resp =
      request(&state, "DELETE", &format!("/api/events/{event}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let frame = session.try_recv().unwrap();
    assert!(matches!(
      frame.message,
      FanoutMessage::EventDeleted { event_id, .. } if event_id == event
    ));

    // Gone means gone.
    let resp =
      request(&state, "DELETE", &format!("/api/events/{event}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(session.try_recv().is_err());
  }

  // ── RSVP ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn joining_a_full_event_returns_conflict() {
    let state = make_state().await;
    let first = make_viewer(&state, "alice", false).await;
    let second = make_viewer(&state, "bob", false).await;
    let event = make_event(&state, Uuid::new_v4(), 1, false).await;

    let resp = request(
      &state,
      "POST",
      &format!("/api/events/{event}/rsvp"),
      Some(json!({"viewer_id": first})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let receipt = body_json(resp).await;
    assert_eq!(receipt["state"], "joined");
    assert_eq!(receipt["rsvp_count"], 1);
    assert_eq!(receipt["capacity_reached"], true);

    let resp = request(
      &state,
      "POST",
      &format!("/api/events/{event}/rsvp"),
      Some(json!({"viewer_id": second})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn joining_an_unknown_event_returns_404() {
    let state = make_state().await;
    let viewer = make_viewer(&state, "alice", false).await;

    let resp = request(
      &state,
      "POST",
      &format!("/api/events/{}/rsvp", Uuid::new_v4()),
      Some(json!({"viewer_id": viewer})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn leaving_is_idempotent() {
    let state = make_state().await;
    let viewer = make_viewer(&state, "alice", false).await;
    let event = make_event(&state, Uuid::new_v4(), 3, false).await;

    for _ in 0..2 {
      let resp = request(
        &state,
        "DELETE",
        &format!("/api/events/{event}/rsvp"),
        Some(json!({"viewer_id": viewer})),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::OK);
      let receipt = body_json(resp).await;
      assert_eq!(receipt["state"], "not_joined");
      assert_eq!(receipt["rsvp_count"], 0);
    }
  }

  // ── Blocks ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn blocking_hides_an_author_until_unblocked() {
    let state = make_state().await;
    let viewer = make_viewer(&state, "alice", false).await;
    let author = Uuid::new_v4();
    make_event(&state, author, 10, true).await;

    let resp = request(
      &state,
      "POST",
      &format!("/api/viewers/{viewer}/blocks/{author}"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = request(
      &state,
      "GET",
      &format!("/api/events?viewer_id={viewer}"),
      None,
    )
    .await;
    assert!(body_json(resp).await.as_array().unwrap().is_empty());

    let resp = request(
      &state,
      "DELETE",
      &format!("/api/viewers/{viewer}/blocks/{author}"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = request(
      &state,
      "GET",
      &format!("/api/events?viewer_id={viewer}"),
      None,
    )
    .await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
  }

  // ── Preferences ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn preferences_replace_and_round_trip() {
    let state = make_state().await;
    let viewer = make_viewer(&state, "alice", false).await;
    let friend = Uuid::new_v4();

    let resp = request(
      &state,
      "PUT",
      &format!("/api/viewers/{viewer}/preferences"),
      Some(json!({
        "drink_specials": false,
        "friend_posting": { friend.to_string(): true },
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp =
      request(&state, "GET", &format!("/api/viewers/{viewer}"), None).await;
    let prefs = &body_json(resp).await["preferences"];
    assert_eq!(prefs["drink_specials"], false);
    // Unspecified toggles fall back to their defaults.
    assert_eq!(prefs["event_updates"], true);
    assert_eq!(prefs["friend_posting"][friend.to_string()], true);
  }

  #[tokio::test]
  async fn preferences_for_unknown_viewer_return_404() {
    let state = make_state().await;
    let resp = request(
      &state,
      "PUT",
      &format!("/api/viewers/{}/preferences", Uuid::new_v4()),
      Some(json!({})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Drink specials ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn specials_require_a_promoted_author() {
    let state = make_state().await;
    let regular = make_viewer(&state, "alice", false).await;
    let bar = make_viewer(&state, "anchor", true).await;
    let mut session = state.hub.subscribe();

    let resp = request(
      &state,
      "POST",
      "/api/specials",
      Some(special_body(regular)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = request(
      &state,
      "POST",
      "/api/specials",
      Some(special_body(Uuid::new_v4())),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(session.try_recv().is_err(), "rejected posts publish nothing");

    let resp =
      request(&state, "POST", "/api/specials", Some(special_body(bar))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let frame = session.try_recv().unwrap();
    assert!(matches!(
      frame.message,
      FanoutMessage::SpecialCreated { author_id, .. } if author_id == bar
    ));

    let resp = request(&state, "GET", "/api/specials", None).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn deleting_a_special_twice_returns_404() {
    let state = make_state().await;
    let bar = make_viewer(&state, "anchor", true).await;
    let resp =
      request(&state, "POST", "/api/specials", Some(special_body(bar))).await;
    let id = body_json(resp).await["special_id"]
      .as_str()
      .unwrap()
      .to_string();

    let resp =
      request(&state, "DELETE", &format!("/api/specials/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp =
      request(&state, "DELETE", &format!("/api/specials/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── WebSocket ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn ws_sessions_receive_published_frames() {
    use futures_util::StreamExt as _;
    use tokio_tungstenite::tungstenite::Message as TungMessage;

    let state = make_state().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::serve(listener, app(state.clone()));
    let handle = tokio::spawn(async move { server.await.unwrap() });

    let (mut ws_stream, _) =
      tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    // The upgrade completes before connect_async returns, so the session
    // is already subscribed.
    let frame = state.hub.publish(FanoutMessage::SpecialCreated {
      special_id: Uuid::new_v4(),
      author_id:  Uuid::new_v4(),
      bar_name:   "The Anchor".into(),
      title:      "2-for-1 wells".into(),
    });

    let message = tokio::time::timeout(
      std::time::Duration::from_secs(5),
      ws_stream.next(),
    )
    .await
    .expect("frame within deadline")
    .unwrap()
    .unwrap();

    match message {
      TungMessage::Text(text) => {
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "special_created");
        assert_eq!(value["delivery_id"], frame.delivery_id.to_string());
      }
      other => panic!("expected text frame, got {other:?}"),
    }
    handle.abort();
  }
}
