//! Async HTTP/WebSocket client wrapping the Lastcall JSON API.

use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
  connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use uuid::Uuid;

use lastcall_core::{
  event::{Event, NewEvent},
  fanout::FanoutFrame,
  rsvp::RsvpReceipt,
  special::DrinkSpecial,
  viewer::Viewer,
};

use crate::snapshot::ViewerSnapshot;

/// Connection settings for the Lastcall API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Outcome of a join as seen over the wire. A full event is an expected,
/// caller-visible condition, not a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinResponse {
  Ok(RsvpReceipt),
  Full,
}

/// Async HTTP client for the Lastcall JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Visibility ──────────────────────────────────────────────────────────

  /// `GET /api/events?viewer_id=<id>` — the authoritative visible list.
  pub async fn visible_events(&self, viewer_id: Uuid) -> Result<Vec<Event>> {
    let resp = self
      .client
      .get(self.url("/events"))
      .query(&[("viewer_id", viewer_id.to_string())])
      .send()
      .await
      .context("GET /events failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /events → {}", resp.status()));
    }
    resp.json().await.context("deserialising events")
  }

  // ── RSVP ────────────────────────────────────────────────────────────────

  /// `POST /api/events/:id/rsvp`
  pub async fn join(&self, viewer_id: Uuid, event_id: Uuid) -> Result<JoinResponse> {
    let resp = self
      .client
      .post(self.url(&format!("/events/{event_id}/rsvp")))
      .json(&serde_json::json!({ "viewer_id": viewer_id }))
      .send()
      .await
      .context("POST rsvp failed")?;

    match resp.status() {
      StatusCode::CONFLICT => Ok(JoinResponse::Full),
      status if status.is_success() => {
        let receipt = resp.json().await.context("deserialising receipt")?;
        Ok(JoinResponse::Ok(receipt))
      }
      status => Err(anyhow!("POST rsvp → {status}")),
    }
  }

  /// `DELETE /api/events/:id/rsvp`
  pub async fn leave(&self, viewer_id: Uuid, event_id: Uuid) -> Result<RsvpReceipt> {
    let resp = self
      .client
      .delete(self.url(&format!("/events/{event_id}/rsvp")))
      .json(&serde_json::json!({ "viewer_id": viewer_id }))
      .send()
      .await
      .context("DELETE rsvp failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("DELETE rsvp → {}", resp.status()));
    }
    resp.json().await.context("deserialising receipt")
  }

  // ── Events & specials ───────────────────────────────────────────────────

  /// `POST /api/events`
  pub async fn create_event(&self, input: &NewEvent) -> Result<Event> {
    let resp = self
      .client
      .post(self.url("/events"))
      .json(input)
      .send()
      .await
      .context("POST /events failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("POST /events → {}", resp.status()));
    }
    resp.json().await.context("deserialising event")
  }

  /// `GET /api/specials` — active specials only.
  pub async fn active_specials(&self) -> Result<Vec<DrinkSpecial>> {
    let resp = self
      .client
      .get(self.url("/specials"))
      .send()
      .await
      .context("GET /specials failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /specials → {}", resp.status()));
    }
    resp.json().await.context("deserialising specials")
  }

  // ── Viewer state ────────────────────────────────────────────────────────

  /// `GET /api/viewers/:id`
  pub async fn viewer(&self, viewer_id: Uuid) -> Result<Viewer> {
    let resp = self
      .client
      .get(self.url(&format!("/viewers/{viewer_id}")))
      .send()
      .await
      .context("GET viewer failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET viewer → {}", resp.status()));
    }
    resp.json().await.context("deserialising viewer")
  }

  /// Refresh the local snapshot the relevance filter reads. Staleness of a
  /// few seconds between refreshes is acceptable by design.
  pub async fn snapshot(&self, viewer_id: Uuid) -> Result<ViewerSnapshot> {
    let viewer = self.viewer(viewer_id).await?;
    Ok(ViewerSnapshot::from(&viewer))
  }
}

// ─── Live subscription ────────────────────────────────────────────────────────

/// A connected fan-out subscription. One per client session lifetime; drop
/// to disconnect. There is no replay after reconnecting — consistency comes
/// from the next `visible_events` call.
pub struct FrameStream {
  inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

/// Open the live subscription endpoint (e.g. `ws://host:port/ws`).
pub async fn subscribe(ws_url: &str) -> Result<FrameStream> {
  let (inner, _) = connect_async(ws_url)
    .await
    .with_context(|| format!("connecting to {ws_url}"))?;
  Ok(FrameStream { inner })
}

impl FrameStream {
  /// Next decodable frame, or `None` once the server side is gone.
  /// Malformed frames are dropped silently — this channel is best-effort.
  pub async fn next_frame(&mut self) -> Option<FanoutFrame> {
    while let Some(msg) = self.inner.next().await {
      match msg {
        Ok(Message::Text(txt)) => match serde_json::from_str(&txt) {
          Ok(frame) => return Some(frame),
          Err(error) => {
            tracing::debug!(%error, "dropping malformed fanout frame");
          }
        },
        Ok(Message::Close(_)) | Err(_) => return None,
        Ok(_) => {}
      }
    }
    None
  }
}
