//! SQL schema for the Kin SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS people (
    person_id        TEXT PRIMARY KEY,
    first_name       TEXT NOT NULL,
    middle_name      TEXT,
    last_name        TEXT NOT NULL,
    preferred_name   TEXT,
    maiden_name      TEXT,
    gender           TEXT,
    birth_date       TEXT,            -- YYYY-MM-DD
    birth_place      TEXT,
    death_date       TEXT,            -- YYYY-MM-DD
    death_place      TEXT,
    is_living        INTEGER NOT NULL DEFAULT 1,
    biography        TEXT,
    occupation       TEXT,
    personality_tags TEXT NOT NULL DEFAULT '[]',
    profile_photo_id TEXT REFERENCES media(media_id) ON DELETE SET NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

-- Directed edges. `kind` is kept as free text so rows written by older
-- tools ('partner', 'sibling', ...) survive; readers translate it.
CREATE TABLE IF NOT EXISTS relationships (
    relationship_id TEXT PRIMARY KEY,
    from_id         TEXT NOT NULL REFERENCES people(person_id) ON DELETE CASCADE,
    to_id           TEXT NOT NULL REFERENCES people(person_id) ON DELETE CASCADE,
    kind            TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    UNIQUE (from_id, to_id, kind),
    CHECK  (from_id != to_id)
);

CREATE TABLE IF NOT EXISTS media (
    media_id           TEXT PRIMARY KEY,
    person_id          TEXT REFERENCES people(person_id) ON DELETE SET NULL,
    kind               TEXT NOT NULL,   -- 'profile' | 'gallery'
    file_name          TEXT NOT NULL,
    original_file_name TEXT NOT NULL,
    file_path          TEXT NOT NULL,   -- relative to the upload directory
    media_type         TEXT NOT NULL,
    file_size          INTEGER NOT NULL,
    content_hash       TEXT NOT NULL,   -- SHA-256, hex
    title              TEXT,
    caption            TEXT,
    is_featured        INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS relationships_from_idx ON relationships(from_id);
CREATE INDEX IF NOT EXISTS relationships_to_idx   ON relationships(to_id);
CREATE INDEX IF NOT EXISTS media_person_idx       ON media(person_id);

PRAGMA user_version = 1;
";
