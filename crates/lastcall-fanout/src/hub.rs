//! Broadcast hub for pushing fan-out frames to connected sessions.
//!
//! A single `tokio::sync::broadcast` channel. Each connected session
//! subscribes once and filters frames locally; there is no per-viewer
//! targeting here. Delivery is try-once: receivers that are gone get
//! nothing, receivers that lag skip frames (`RecvError::Lagged`). Nothing
//! is persisted — the visibility query is the system of record.

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use lastcall_core::fanout::{FanoutFrame, FanoutMessage};

/// Capacity of the broadcast channel. Slow receivers that fall this far
/// behind will skip frames rather than block the publisher.
const BROADCAST_CAPACITY: usize = 4096;

/// The fan-out hub. Cloneable — store in app state.
#[derive(Clone)]
pub struct FanoutHub {
  sender: broadcast::Sender<Arc<FanoutFrame>>,
}

impl Default for FanoutHub {
  fn default() -> Self { Self::new() }
}

impl FanoutHub {
  pub fn new() -> Self {
    let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
    Self { sender }
  }

  /// Connect a session. Dropping the returned receiver is the disconnect.
  pub fn subscribe(&self) -> broadcast::Receiver<Arc<FanoutFrame>> {
    self.sender.subscribe()
  }

  /// Number of currently-connected sessions (informational, for logs).
  pub fn session_count(&self) -> usize {
    self.sender.receiver_count()
  }

  /// Push a message to every connected session and return the frame.
  ///
  /// The delivery id is assigned here, once, so every path that hands this
  /// frame to a user shares one id for the client dedup guard to key on.
  pub fn publish(&self, message: FanoutMessage) -> FanoutFrame {
    let frame = FanoutFrame { delivery_id: Uuid::new_v4(), message };
    tracing::debug!(
      delivery_id = %frame.delivery_id,
      subject_id = %frame.message.subject_id(),
      sessions = self.session_count(),
      "fanout publish",
    );
    // send() errs when there are no receivers — expected when nobody is
    // connected.
    let _ = self.sender.send(Arc::new(frame.clone()));
    frame
  }
}
