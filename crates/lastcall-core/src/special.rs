//! DrinkSpecial — a time-limited offer posted by a promoted (bar) account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single item on a special, e.g. `{"name": "house lager", "price": 4.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
  pub name:  String,
  pub price: f64,
}

/// A drink special. Visible only while `now < expires_at`; expiry is
/// passive — there is no explicit transition, readers just filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinkSpecial {
  pub special_id: Uuid,
  pub title:      String,
  /// Must hold the promoted capability; checked at the creation endpoint.
  pub author_id:  Uuid,
  pub bar_name:   String,
  pub description: String,
  pub image_url:  Option<String>,
  pub offers:     Vec<Offer>,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl DrinkSpecial {
  pub fn is_active(&self, now: DateTime<Utc>) -> bool { now < self.expires_at }
}

/// Input for creating a special. Identity and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSpecial {
  pub title:      String,
  pub author_id:  Uuid,
  pub bar_name:   String,
  pub description: String,
  pub image_url:  Option<String>,
  pub offers:     Vec<Offer>,
  pub expires_at: DateTime<Utc>,
}
