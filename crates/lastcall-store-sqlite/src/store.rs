//! [`SqliteStore`] — the SQLite implementation of [`EventStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tokio::sync::watch;
use uuid::Uuid;

use lastcall_core::{
  event::{Event, EventPatch, NewEvent},
  special::{DrinkSpecial, NewSpecial},
  store::{ChangeKind, ChangeRecord, EventStore, JoinOutcome, LeaveOutcome},
  viewer::{NewViewer, NotificationPreferences, Viewer},
};

use crate::{
  encode::{
    decode_preferences, decode_uuid, encode_dt, encode_offers,
    encode_preferences, encode_uuid, RawEvent, RawSpecial,
  },
  schema::SCHEMA,
  Error, Result,
};

const EVENT_COLS: &str = "event_id, title, description, location, capacity, \
                          is_21_plus, date, image_url, author_id, \
                          author_username, promoted, rsvp_count, created_at";

const SPECIAL_COLS: &str = "special_id, title, author_id, bar_name, \
                            description, image_url, offers, created_at, \
                            expires_at";

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    event_id:        row.get(0)?,
    title:           row.get(1)?,
    description:     row.get(2)?,
    location:        row.get(3)?,
    capacity:        row.get(4)?,
    is_21_plus:      row.get(5)?,
    date:            row.get(6)?,
    image_url:       row.get(7)?,
    author_id:       row.get(8)?,
    author_username: row.get(9)?,
    promoted:        row.get(10)?,
    rsvp_count:      row.get(11)?,
    created_at:      row.get(12)?,
  })
}

fn special_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSpecial> {
  Ok(RawSpecial {
    special_id:  row.get(0)?,
    title:       row.get(1)?,
    author_id:   row.get(2)?,
    bar_name:    row.get(3)?,
    description: row.get(4)?,
    image_url:   row.get(5)?,
    offers:      row.get(6)?,
    created_at:  row.get(7)?,
    expires_at:  row.get(8)?,
  })
}

// Closure results that cross the tokio_rusqlite boundary; the async side
// maps them onto outcomes and domain errors.
enum RawJoin {
  Joined { rsvp_count: i64, filled: bool },
  AlreadyJoined { rsvp_count: i64 },
  Full,
  EventMissing,
  ViewerMissing,
}

enum RawLeave {
  Left { rsvp_count: i64 },
  NotJoined,
  EventMissing,
  ViewerMissing,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lastcall event store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and the
/// feed signal is shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  feed_tx: watch::Sender<u64>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::initialise(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::initialise(conn).await
  }

  async fn initialise(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let seq: i64 = conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        let seq = conn.query_row(
          "SELECT COALESCE(MAX(seq), 0) FROM change_log",
          [],
          |r| r.get(0),
        )?;
        Ok(seq)
      })
      .await?;

    let (feed_tx, _) = watch::channel(seq as u64);
    Ok(Self { conn, feed_tx })
  }

  /// Subscribe to the change-feed signal. The carried value is the latest
  /// change-log seq; subscribers read the rows themselves via
  /// [`EventStore::changes_since`].
  pub fn feed_signal(&self) -> watch::Receiver<u64> {
    self.feed_tx.subscribe()
  }

  async fn viewer_exists(&self, viewer_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(viewer_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM viewers WHERE viewer_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Events ──────────────────────────────────────────────────────────────

  async fn insert_event(&self, input: NewEvent) -> Result<Event> {
    let event = Event {
      event_id:        Uuid::new_v4(),
      title:           input.title,
      description:     input.description,
      location:        input.location,
      capacity:        input.capacity.max(1),
      is_21_plus:      input.is_21_plus,
      date:            input.date,
      image_url:       input.image_url,
      author_id:       input.author_id,
      author_username: input.author_username,
      promoted:        input.promoted,
      rsvp_count:      0,
      created_at:      Utc::now(),
    };

    let id_str     = encode_uuid(event.event_id);
    let title      = event.title.clone();
    let descr      = event.description.clone();
    let location   = event.location.clone();
    let capacity   = event.capacity as i64;
    let is_21_plus = event.is_21_plus;
    let date_str   = encode_dt(event.date);
    let image_url  = event.image_url.clone();
    let author_str = encode_uuid(event.author_id);
    let username   = event.author_username.clone();
    let promoted   = event.promoted;
    let at_str     = encode_dt(event.created_at);

    // The change-log row commits with the insert, so the feed can never
    // observe an event that is not yet readable.
    let seq: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO events (
             event_id, title, description, location, capacity, is_21_plus,
             date, image_url, author_id, author_username, promoted,
             rsvp_count, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12)",
          rusqlite::params![
            id_str, title, descr, location, capacity, is_21_plus, date_str,
            image_url, author_str, username, promoted, at_str,
          ],
        )?;
        tx.execute(
          "INSERT INTO change_log (kind, subject_id, recorded_at)
           VALUES ('event_inserted', ?1, ?2)",
          rusqlite::params![id_str, at_str],
        )?;
        let seq = tx.last_insert_rowid();
        tx.commit()?;
        Ok(seq)
      })
      .await?;

    self.feed_tx.send_replace(seq as u64);
    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);
    let sql    = format!("SELECT {EVENT_COLS} FROM events WHERE event_id = ?1");

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], event_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let sql = format!("SELECT {EVENT_COLS} FROM events ORDER BY date ASC");

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], event_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_event(&self, id: Uuid, patch: EventPatch) -> Result<Option<Event>> {
    let id_str     = encode_uuid(id);
    let title      = patch.title;
    let descr      = patch.description;
    let location   = patch.location;
    let capacity   = patch.capacity.map(|c| c as i64);
    let is_21_plus = patch.is_21_plus;
    let date_str   = patch.date.map(encode_dt);
    let image_url  = patch.image_url;
    let promoted   = patch.promoted;
    let select     = format!("SELECT {EVENT_COLS} FROM events WHERE event_id = ?1");

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Capacity clamps to the current rsvp_count (and stays positive)
        // so an edit can never break the capacity invariant retroactively.
        let changed = tx.execute(
          "UPDATE events SET
             title       = COALESCE(?2, title),
             description = COALESCE(?3, description),
             location    = COALESCE(?4, location),
             capacity    = MAX(COALESCE(?5, capacity), rsvp_count, 1),
             is_21_plus  = COALESCE(?6, is_21_plus),
             date        = COALESCE(?7, date),
             image_url   = COALESCE(?8, image_url),
             promoted    = COALESCE(?9, promoted)
           WHERE event_id = ?1",
          rusqlite::params![
            id_str, title, descr, location, capacity, is_21_plus, date_str,
            image_url, promoted,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(&select, rusqlite::params![id_str], event_from_row)?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn delete_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);
    let select = format!("SELECT {EVENT_COLS} FROM events WHERE event_id = ?1");

    // RSVP rows are left in place on purpose; they dangle and readers
    // drop them.
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(&select, rusqlite::params![id_str], event_from_row)
          .optional()?;
        if raw.is_some() {
          tx.execute(
            "DELETE FROM events WHERE event_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  // ── RSVP ────────────────────────────────────────────────────────────────

  async fn join_event(&self, viewer_id: Uuid, event_id: Uuid) -> Result<JoinOutcome> {
    let v_str  = encode_uuid(viewer_id);
    let e_str  = encode_uuid(event_id);
    let at_str = encode_dt(Utc::now());

    let raw: RawJoin = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let viewer_exists: bool = tx
          .query_row(
            "SELECT 1 FROM viewers WHERE viewer_id = ?1",
            rusqlite::params![v_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !viewer_exists {
          return Ok(RawJoin::ViewerMissing);
        }

        let event_exists: bool = tx
          .query_row(
            "SELECT 1 FROM events WHERE event_id = ?1",
            rusqlite::params![e_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !event_exists {
          return Ok(RawJoin::EventMissing);
        }

        let already: bool = tx
          .query_row(
            "SELECT 1 FROM rsvps WHERE viewer_id = ?1 AND event_id = ?2",
            rusqlite::params![v_str, e_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if already {
          let rsvp_count: i64 = tx.query_row(
            "SELECT rsvp_count FROM events WHERE event_id = ?1",
            rusqlite::params![e_str],
            |r| r.get(0),
          )?;
          tx.commit()?;
          return Ok(RawJoin::AlreadyJoined { rsvp_count });
        }

        // The capacity check and the increment are one conditional
        // statement: two concurrent joins for the last seat resolve to
        // exactly one row change.
        let changed = tx.execute(
          "UPDATE events SET rsvp_count = rsvp_count + 1
           WHERE event_id = ?1 AND rsvp_count < capacity",
          rusqlite::params![e_str],
        )?;
        if changed == 0 {
          tx.commit()?;
          return Ok(RawJoin::Full);
        }

        tx.execute(
          "INSERT INTO rsvps (viewer_id, event_id, recorded_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![v_str, e_str, at_str],
        )?;
        let (rsvp_count, capacity): (i64, i64) = tx.query_row(
          "SELECT rsvp_count, capacity FROM events WHERE event_id = ?1",
          rusqlite::params![e_str],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        tx.commit()?;
        Ok(RawJoin::Joined { rsvp_count, filled: rsvp_count == capacity })
      })
      .await?;

    match raw {
      RawJoin::Joined { rsvp_count, filled } => Ok(JoinOutcome::Joined {
        rsvp_count:      rsvp_count as u32,
        filled_capacity: filled,
      }),
      RawJoin::AlreadyJoined { rsvp_count } => {
        Ok(JoinOutcome::AlreadyJoined { rsvp_count: rsvp_count as u32 })
      }
      RawJoin::Full          => Ok(JoinOutcome::Full),
      RawJoin::EventMissing  => Ok(JoinOutcome::EventMissing),
      RawJoin::ViewerMissing => Ok(JoinOutcome::ViewerMissing),
    }
  }

  async fn leave_event(&self, viewer_id: Uuid, event_id: Uuid) -> Result<LeaveOutcome> {
    let v_str = encode_uuid(viewer_id);
    let e_str = encode_uuid(event_id);

    let raw: RawLeave = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let viewer_exists: bool = tx
          .query_row(
            "SELECT 1 FROM viewers WHERE viewer_id = ?1",
            rusqlite::params![v_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !viewer_exists {
          return Ok(RawLeave::ViewerMissing);
        }

        let event_exists: bool = tx
          .query_row(
            "SELECT 1 FROM events WHERE event_id = ?1",
            rusqlite::params![e_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !event_exists {
          return Ok(RawLeave::EventMissing);
        }

        let removed = tx.execute(
          "DELETE FROM rsvps WHERE viewer_id = ?1 AND event_id = ?2",
          rusqlite::params![v_str, e_str],
        )?;
        if removed == 0 {
          tx.commit()?;
          return Ok(RawLeave::NotJoined);
        }

        // Floored at zero even if counts ever drift.
        tx.execute(
          "UPDATE events SET rsvp_count = MAX(rsvp_count - 1, 0)
           WHERE event_id = ?1",
          rusqlite::params![e_str],
        )?;
        let rsvp_count: i64 = tx.query_row(
          "SELECT rsvp_count FROM events WHERE event_id = ?1",
          rusqlite::params![e_str],
          |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(RawLeave::Left { rsvp_count })
      })
      .await?;

    match raw {
      RawLeave::Left { rsvp_count } => {
        Ok(LeaveOutcome::Left { rsvp_count: rsvp_count as u32 })
      }
      RawLeave::NotJoined     => Ok(LeaveOutcome::NotJoined),
      RawLeave::EventMissing  => Ok(LeaveOutcome::EventMissing),
      RawLeave::ViewerMissing => Ok(LeaveOutcome::ViewerMissing),
    }
  }

  // ── Viewers ─────────────────────────────────────────────────────────────

  async fn insert_viewer(&self, input: NewViewer) -> Result<Viewer> {
    let viewer = Viewer {
      viewer_id:        Uuid::new_v4(),
      username:         input.username,
      promoted:         input.promoted,
      rsvp_events:      Default::default(),
      blocked_user_ids: Default::default(),
      preferences:      NotificationPreferences::default(),
      created_at:       Utc::now(),
    };

    let id_str    = encode_uuid(viewer.viewer_id);
    let username  = viewer.username.clone();
    let promoted  = viewer.promoted;
    let prefs_str = encode_preferences(&viewer.preferences)?;
    let at_str    = encode_dt(viewer.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO viewers (viewer_id, username, promoted, preferences, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, username, promoted, prefs_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(viewer)
  }

  async fn get_viewer(&self, id: Uuid) -> Result<Option<Viewer>> {
    let id_str = encode_uuid(id);

    type RawViewer =
      Option<(String, String, bool, String, String, Vec<String>, Vec<String>)>;

    let raw: RawViewer = self
      .conn
      .call(move |conn| {
        let head = conn
          .query_row(
            "SELECT viewer_id, username, promoted, preferences, created_at
             FROM viewers WHERE viewer_id = ?1",
            rusqlite::params![id_str],
            |r| {
              Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            },
          )
          .optional()?;

        let Some((vid, username, promoted, prefs, created_at)) = head else {
          return Ok(None);
        };

        let mut stmt =
          conn.prepare("SELECT event_id FROM rsvps WHERE viewer_id = ?1")?;
        let rsvps = stmt
          .query_map(rusqlite::params![id_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        let mut stmt =
          conn.prepare("SELECT blocked_id FROM blocks WHERE viewer_id = ?1")?;
        let blocks = stmt
          .query_map(rusqlite::params![id_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(Some((vid, username, promoted, prefs, created_at, rsvps, blocks)))
      })
      .await?;

    let Some((vid, username, promoted, prefs, created_at, rsvps, blocks)) = raw
    else {
      return Ok(None);
    };

    Ok(Some(Viewer {
      viewer_id:        decode_uuid(&vid)?,
      username,
      promoted,
      rsvp_events:      rsvps
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
      blocked_user_ids: blocks
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
      preferences:      decode_preferences(&prefs)?,
      created_at:       crate::encode::decode_dt(&created_at)?,
    }))
  }

  async fn set_preferences(
    &self,
    viewer_id: Uuid,
    prefs: NotificationPreferences,
  ) -> Result<bool> {
    let id_str    = encode_uuid(viewer_id);
    let prefs_str = encode_preferences(&prefs)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE viewers SET preferences = ?2 WHERE viewer_id = ?1",
          rusqlite::params![id_str, prefs_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn set_block(
    &self,
    viewer_id: Uuid,
    blocked_id: Uuid,
    blocked: bool,
  ) -> Result<bool> {
    if !self.viewer_exists(viewer_id).await? {
      return Ok(false);
    }

    let v_str = encode_uuid(viewer_id);
    let b_str = encode_uuid(blocked_id);

    self
      .conn
      .call(move |conn| {
        if blocked {
          conn.execute(
            "INSERT OR IGNORE INTO blocks (viewer_id, blocked_id) VALUES (?1, ?2)",
            rusqlite::params![v_str, b_str],
          )?;
        } else {
          conn.execute(
            "DELETE FROM blocks WHERE viewer_id = ?1 AND blocked_id = ?2",
            rusqlite::params![v_str, b_str],
          )?;
        }
        Ok(())
      })
      .await?;
    Ok(true)
  }

  // ── Visibility ──────────────────────────────────────────────────────────

  async fn resolve_visible_events(&self, viewer_id: Uuid) -> Result<Option<Vec<Event>>> {
    if !self.viewer_exists(viewer_id).await? {
      return Ok(None);
    }

    let id_str = encode_uuid(viewer_id);
    // The single visibility predicate: RSVP'd-or-promoted, minus blocked
    // authors. Dangling RSVP rows join against nothing and fall out.
    let sql = format!(
      "SELECT {EVENT_COLS} FROM events
       WHERE (promoted = 1
              OR event_id IN (SELECT event_id FROM rsvps WHERE viewer_id = ?1))
         AND author_id NOT IN (SELECT blocked_id FROM blocks WHERE viewer_id = ?1)
       ORDER BY date ASC"
    );

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], event_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawEvent::into_event)
      .collect::<Result<Vec<_>>>()
      .map(Some)
  }

  // ── Drink specials ──────────────────────────────────────────────────────

  async fn insert_special(&self, input: NewSpecial) -> Result<DrinkSpecial> {
    let special = DrinkSpecial {
      special_id:  Uuid::new_v4(),
      title:       input.title,
      author_id:   input.author_id,
      bar_name:    input.bar_name,
      description: input.description,
      image_url:   input.image_url,
      offers:      input.offers,
      created_at:  Utc::now(),
      expires_at:  input.expires_at,
    };

    let id_str     = encode_uuid(special.special_id);
    let title      = special.title.clone();
    let author_str = encode_uuid(special.author_id);
    let bar_name   = special.bar_name.clone();
    let descr      = special.description.clone();
    let image_url  = special.image_url.clone();
    let offers_str = encode_offers(&special.offers)?;
    let at_str     = encode_dt(special.created_at);
    let exp_str    = encode_dt(special.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO specials (
             special_id, title, author_id, bar_name, description, image_url,
             offers, created_at, expires_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, title, author_str, bar_name, descr, image_url,
            offers_str, at_str, exp_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(special)
  }

  async fn get_special(&self, id: Uuid) -> Result<Option<DrinkSpecial>> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT {SPECIAL_COLS} FROM specials WHERE special_id = ?1");

    let raw: Option<RawSpecial> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], special_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSpecial::into_special).transpose()
  }

  async fn delete_special(&self, id: Uuid) -> Result<Option<DrinkSpecial>> {
    let id_str = encode_uuid(id);
    let select = format!("SELECT {SPECIAL_COLS} FROM specials WHERE special_id = ?1");

    let raw: Option<RawSpecial> = self
      .conn
      .call(move |conn| {
        let tx  = conn.transaction()?;
        let raw = tx
          .query_row(&select, rusqlite::params![id_str], special_from_row)
          .optional()?;
        if raw.is_some() {
          tx.execute(
            "DELETE FROM specials WHERE special_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawSpecial::into_special).transpose()
  }

  async fn list_active_specials(&self, now: DateTime<Utc>) -> Result<Vec<DrinkSpecial>> {
    let now_str = encode_dt(now);
    let sql = format!(
      "SELECT {SPECIAL_COLS} FROM specials
       WHERE expires_at > ?1
       ORDER BY created_at DESC"
    );

    let raws: Vec<RawSpecial> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![now_str], special_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSpecial::into_special).collect()
  }

  // ── Change feed ─────────────────────────────────────────────────────────

  async fn changes_since(&self, after_seq: u64, limit: usize) -> Result<Vec<ChangeRecord>> {
    let after = after_seq as i64;
    let limit = limit as i64;

    let rows: Vec<(i64, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT seq, kind, subject_id FROM change_log
           WHERE seq > ?1 ORDER BY seq ASC LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![after, limit], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(seq, kind, subject_id)| {
        let kind = match kind.as_str() {
          "event_inserted" => ChangeKind::EventInserted,
          other => return Err(Error::UnknownChangeKind(other.to_owned())),
        };
        Ok(ChangeRecord {
          seq: seq as u64,
          kind,
          subject_id: decode_uuid(&subject_id)?,
        })
      })
      .collect()
  }

  async fn latest_change_seq(&self) -> Result<u64> {
    let seq: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(MAX(seq), 0) FROM change_log",
          [],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(seq as u64)
  }
}
