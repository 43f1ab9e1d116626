//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields
//! (preferences, offers) are stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use lastcall_core::{
  event::Event,
  special::{DrinkSpecial, Offer},
  viewer::NotificationPreferences,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_preferences(p: &NotificationPreferences) -> Result<String> {
  Ok(serde_json::to_string(p)?)
}

pub fn decode_preferences(s: &str) -> Result<NotificationPreferences> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_offers(offers: &[Offer]) -> Result<String> {
  Ok(serde_json::to_string(offers)?)
}

pub fn decode_offers(s: &str) -> Result<Vec<Offer>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Raw row structs ─────────────────────────────────────────────────────────

/// An `events` row as read from SQLite, before decoding.
pub struct RawEvent {
  pub event_id:        String,
  pub title:           String,
  pub description:     Option<String>,
  pub location:        String,
  pub capacity:        i64,
  pub is_21_plus:      bool,
  pub date:            String,
  pub image_url:       Option<String>,
  pub author_id:       String,
  pub author_username: String,
  pub promoted:        bool,
  pub rsvp_count:      i64,
  pub created_at:      String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:        decode_uuid(&self.event_id)?,
      title:           self.title,
      description:     self.description,
      location:        self.location,
      capacity:        self.capacity as u32,
      is_21_plus:      self.is_21_plus,
      date:            decode_dt(&self.date)?,
      image_url:       self.image_url,
      author_id:       decode_uuid(&self.author_id)?,
      author_username: self.author_username,
      promoted:        self.promoted,
      rsvp_count:      self.rsvp_count as u32,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// A `specials` row as read from SQLite, before decoding.
pub struct RawSpecial {
  pub special_id:  String,
  pub title:       String,
  pub author_id:   String,
  pub bar_name:    String,
  pub description: String,
  pub image_url:   Option<String>,
  pub offers:      String,
  pub created_at:  String,
  pub expires_at:  String,
}

impl RawSpecial {
  pub fn into_special(self) -> Result<DrinkSpecial> {
    Ok(DrinkSpecial {
      special_id:  decode_uuid(&self.special_id)?,
      title:       self.title,
      author_id:   decode_uuid(&self.author_id)?,
      bar_name:    self.bar_name,
      description: self.description,
      image_url:   self.image_url,
      offers:      decode_offers(&self.offers)?,
      created_at:  decode_dt(&self.created_at)?,
      expires_at:  decode_dt(&self.expires_at)?,
    })
  }
}
