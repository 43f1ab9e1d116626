//! The change watcher — a long-lived subscription against the store's
//! insert feed.
//!
//! One watcher runs per process. It holds a cursor into the change log,
//! translates each insert into exactly one [`FanoutMessage`], and hands it
//! to the hub. The cursor advances only after a row is handled, so a failure
//! replays from the failed row — duplicates within that bounded window are
//! possible and are collapsed client-side, not here.

use std::time::Duration;

use tokio::sync::watch;

use lastcall_core::{
  fanout::FanoutMessage,
  store::{ChangeKind, EventStore},
};

use crate::hub::FanoutHub;

/// Rows fetched per `changes_since` call.
const FEED_BATCH: usize = 64;

const INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Follows the change log and publishes insert notices.
pub struct ChangeWatcher<S> {
  store:  S,
  hub:    FanoutHub,
  signal: watch::Receiver<u64>,
  cursor: u64,
}

impl<S: EventStore> ChangeWatcher<S> {
  /// `start_seq` is usually the store's current
  /// [`latest_change_seq`](EventStore::latest_change_seq): history predates
  /// every connected session, so it is never replayed.
  pub fn new(
    store: S,
    signal: watch::Receiver<u64>,
    hub: FanoutHub,
    start_seq: u64,
  ) -> Self {
    Self { store, hub, signal, cursor: start_seq }
  }

  /// Run until the store side of the feed signal goes away.
  ///
  /// Feed errors are logged and retried with capped exponential backoff;
  /// gaps during recovery are acceptable — clients re-fetch through the
  /// visibility query.
  pub async fn run(mut self) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
      match self.catch_up().await {
        Ok(()) => {
          backoff = INITIAL_BACKOFF;
          if self.signal.changed().await.is_err() {
            tracing::info!("change feed closed, watcher stopping");
            return;
          }
        }
        Err(error) => {
          tracing::warn!(%error, ?backoff, "change feed error, resubscribing");
          tokio::time::sleep(backoff).await;
          backoff = (backoff * 2).min(MAX_BACKOFF);
        }
      }
    }
  }

  /// Drain everything past the cursor and publish it. Public so callers
  /// (and tests) can force a deterministic catch-up.
  pub async fn catch_up(&mut self) -> Result<(), S::Error> {
    loop {
      let changes = self.store.changes_since(self.cursor, FEED_BATCH).await?;
      if changes.is_empty() {
        return Ok(());
      }
      for change in changes {
        match change.kind {
          ChangeKind::EventInserted => {
            match self.store.get_event(change.subject_id).await? {
              Some(event) => {
                self.hub.publish(FanoutMessage::EventCreated {
                  event_id:        event.event_id,
                  author_id:       event.author_id,
                  author_username: event.author_username,
                  title:           event.title,
                });
              }
              // Inserted and already deleted before we got here; there is
              // nothing left worth announcing.
              None => {}
            }
          }
        }
        self.cursor = change.seq;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration as ChronoDuration, Utc};
  use lastcall_core::{event::NewEvent, fanout::FanoutMessage, store::EventStore};
  use lastcall_store_sqlite::SqliteStore;
  use uuid::Uuid;

  use super::*;

  fn new_event(title: &str) -> NewEvent {
    NewEvent {
      title: title.into(),
      description: None,
      location: "The Anchor".into(),
      capacity: 10,
      is_21_plus: false,
      date: Utc::now() + ChronoDuration::days(1),
      image_url: None,
      author_id: Uuid::new_v4(),
      author_username: "sam".into(),
      promoted: false,
    }
  }

  async fn watcher(store: &SqliteStore, hub: &FanoutHub) -> ChangeWatcher<SqliteStore> {
    let start = store.latest_change_seq().await.unwrap();
    ChangeWatcher::new(store.clone(), store.feed_signal(), hub.clone(), start)
  }

  #[tokio::test]
  async fn inserts_become_event_created_frames_in_order() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let hub = FanoutHub::new();
    let mut w = watcher(&store, &hub).await;
    let mut session = hub.subscribe();

    let first = store.insert_event(new_event("first")).await.unwrap();
    let second = store.insert_event(new_event("second")).await.unwrap();

    w.catch_up().await.unwrap();

    let frame = session.recv().await.unwrap();
    match &frame.message {
      FanoutMessage::EventCreated { event_id, title, author_id, .. } => {
        assert_eq!(*event_id, first.event_id);
        assert_eq!(title, "first");
        assert_eq!(*author_id, first.author_id);
      }
      other => panic!("expected EventCreated, got {other:?}"),
    }

    let frame = session.recv().await.unwrap();
    assert_eq!(frame.message.subject_id(), second.event_id);
  }

  #[tokio::test]
  async fn history_before_the_start_cursor_is_not_replayed() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.insert_event(new_event("ancient")).await.unwrap();

    let hub = FanoutHub::new();
    let mut w = watcher(&store, &hub).await;
    let mut session = hub.subscribe();

    w.catch_up().await.unwrap();
    assert!(session.try_recv().is_err(), "no frames expected");
  }

  #[tokio::test]
  async fn insert_deleted_before_observation_is_skipped() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let hub = FanoutHub::new();
    let mut w = watcher(&store, &hub).await;
    let mut session = hub.subscribe();

    let event = store.insert_event(new_event("gone")).await.unwrap();
    store.delete_event(event.event_id).await.unwrap();
    let survivor = store.insert_event(new_event("still here")).await.unwrap();

    w.catch_up().await.unwrap();

    // Only the surviving event is announced; the cursor still moved past
    // the deleted one.
    let frame = session.recv().await.unwrap();
    assert_eq!(frame.message.subject_id(), survivor.event_id);
    assert!(session.try_recv().is_err());
  }

  #[tokio::test]
  async fn running_watcher_follows_the_live_signal() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let hub = FanoutHub::new();
    let w = watcher(&store, &hub).await;
    let mut session = hub.subscribe();

    tokio::spawn(w.run());

    let event = store.insert_event(new_event("live")).await.unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), session.recv())
      .await
      .expect("frame within deadline")
      .unwrap();
    assert_eq!(frame.message.subject_id(), event.event_id);
  }
}
