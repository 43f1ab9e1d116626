//! `GET /ws` — the fan-out push endpoint.
//!
//! Each upgraded socket is one session: it subscribes to the hub and
//! forwards every frame as a JSON text message until either side goes
//! away. The server pushes everything; relevance filtering and dedup are
//! the client's job.

use axum::{
  extract::{
    State, WebSocketUpgrade,
    ws::{Message, WebSocket},
  },
  response::IntoResponse,
};
use futures_util::{SinkExt as _, StreamExt as _};
use lastcall_core::store::EventStore;
use lastcall_fanout::FanoutHub;
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

/// Handle the HTTP upgrade and hand the socket to the session pump.
pub async fn handler<S: EventStore>(
  ws: WebSocketUpgrade,
  State(state): State<AppState<S>>,
) -> impl IntoResponse {
  let hub = state.hub.clone();
  ws.on_upgrade(move |socket| session(socket, hub))
}

/// Pump hub frames into the socket. Dropping the subscription on exit is
/// the disconnect.
async fn session(socket: WebSocket, hub: FanoutHub) {
  let mut frames = hub.subscribe();
  let (mut outgoing, mut incoming) = socket.split();
  tracing::info!(sessions = hub.session_count(), "fanout session connected");

  loop {
    tokio::select! {
      frame = frames.recv() => match frame {
        Ok(frame) => {
          let text = match serde_json::to_string(&*frame) {
            Ok(text) => text,
            Err(error) => {
              tracing::warn!(%error, "dropping unencodable frame");
              continue;
            }
          };
          if outgoing.send(Message::Text(text.into())).await.is_err() {
            break;
          }
        }
        // A lagged session skips frames; the visibility query is the
        // system of record, so nothing is lost for good.
        Err(RecvError::Lagged(skipped)) => {
          tracing::warn!(skipped, "fanout session lagged");
        }
        Err(RecvError::Closed) => break,
      },
      message = incoming.next() => match message {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
        // The feed is push-only; anything else from the client is ignored.
        Some(Ok(_)) => {}
      },
    }
  }

  tracing::info!("fanout session disconnected");
}
