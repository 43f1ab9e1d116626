//! SQL schema for the Lastcall SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS events (
    event_id        TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    description     TEXT,
    location        TEXT NOT NULL,
    capacity        INTEGER NOT NULL CHECK (capacity > 0),
    is_21_plus      INTEGER NOT NULL DEFAULT 0,
    date            TEXT NOT NULL,    -- ISO 8601 UTC
    image_url       TEXT,
    author_id       TEXT NOT NULL,
    author_username TEXT NOT NULL,
    promoted        INTEGER NOT NULL DEFAULT 0,
    -- Only the join/leave transactions touch rsvp_count; the CHECK is a
    -- backstop behind the conditional UPDATE that enforces the invariant.
    rsvp_count      INTEGER NOT NULL DEFAULT 0
                    CHECK (rsvp_count >= 0 AND rsvp_count <= capacity),
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS viewers (
    viewer_id   TEXT PRIMARY KEY,
    username    TEXT NOT NULL,
    promoted    INTEGER NOT NULL DEFAULT 0,   -- capability: may post specials
    preferences TEXT NOT NULL,                -- JSON NotificationPreferences
    created_at  TEXT NOT NULL
);

-- No foreign key on event_id: deleting an event leaves RSVP rows dangling,
-- and readers drop references that no longer resolve.
CREATE TABLE IF NOT EXISTS rsvps (
    viewer_id   TEXT NOT NULL REFERENCES viewers(viewer_id),
    event_id    TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (viewer_id, event_id)
);

-- Directed viewer -> author suppression edges.
CREATE TABLE IF NOT EXISTS blocks (
    viewer_id  TEXT NOT NULL REFERENCES viewers(viewer_id),
    blocked_id TEXT NOT NULL,
    PRIMARY KEY (viewer_id, blocked_id)
);

CREATE TABLE IF NOT EXISTS specials (
    special_id  TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    author_id   TEXT NOT NULL,
    bar_name    TEXT NOT NULL,
    description TEXT NOT NULL,
    image_url   TEXT,
    offers      TEXT NOT NULL,    -- JSON array of {name, price}
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL
);

-- Durable insert feed. seq is strictly increasing; rows are appended in
-- the same transaction as the insert they describe.
CREATE TABLE IF NOT EXISTS change_log (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    kind        TEXT NOT NULL,    -- 'event_inserted'
    subject_id  TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS events_date_idx    ON events(date);
CREATE INDEX IF NOT EXISTS events_author_idx  ON events(author_id);
CREATE INDEX IF NOT EXISTS rsvps_event_idx    ON rsvps(event_id);
CREATE INDEX IF NOT EXISTS specials_expiry_idx ON specials(expires_at);

PRAGMA user_version = 1;
";
