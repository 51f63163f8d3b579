//! SQL schema for the Warden SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    administrator INTEGER NOT NULL DEFAULT 0,
    disabled      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS connections (
    connection_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL UNIQUE,
    protocol      TEXT NOT NULL,   -- e.g. 'rdp' | 'vnc' | 'ssh'
    hostname      TEXT NOT NULL,
    port          INTEGER NOT NULL,
    parameters    TEXT NOT NULL DEFAULT '{}',   -- JSON object, string values
    created_at    TEXT NOT NULL
);

-- Per-(subject, object, action) grants. Absence of a row is denial;
-- administrators never consult these tables.
CREATE TABLE IF NOT EXISTS user_permissions (
    user_id           INTEGER NOT NULL REFERENCES users(user_id),
    permission        TEXT NOT NULL,   -- 'read' | 'update' | 'delete' | 'administer'
    affected_username TEXT NOT NULL,
    UNIQUE (user_id, permission, affected_username)
);

CREATE TABLE IF NOT EXISTS connection_permissions (
    user_id         INTEGER NOT NULL REFERENCES users(user_id),
    permission      TEXT NOT NULL,
    connection_name TEXT NOT NULL,
    UNIQUE (user_id, permission, connection_name)
);

-- Type-wide rights, checked before any insert.
CREATE TABLE IF NOT EXISTS system_permissions (
    user_id    INTEGER NOT NULL REFERENCES users(user_id),
    permission TEXT NOT NULL,   -- 'create_user' | 'create_connection'
    UNIQUE (user_id, permission)
);

CREATE INDEX IF NOT EXISTS user_permissions_subject_idx
    ON user_permissions(user_id);
CREATE INDEX IF NOT EXISTS connection_permissions_subject_idx
    ON connection_permissions(user_id);
CREATE INDEX IF NOT EXISTS connection_permissions_object_idx
    ON connection_permissions(connection_name);

PRAGMA user_version = 1;
";
