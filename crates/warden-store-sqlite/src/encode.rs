//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; connection parameter maps as
//! compact JSON objects; permission kinds by their stable lowercase names.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use warden_core::{
  connection::ConnectionRecord,
  permission::PermissionKind,
  user::UserRecord,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PermissionKind ──────────────────────────────────────────────────────────

// Encoding is `PermissionKind::as_str`; only decoding lives here.
pub fn decode_permission_kind(s: &str) -> Result<PermissionKind> {
  match s {
    "read" => Ok(PermissionKind::Read),
    "update" => Ok(PermissionKind::Update),
    "delete" => Ok(PermissionKind::Delete),
    "administer" => Ok(PermissionKind::Administer),
    other => Err(Error::UnknownPermissionKind(other.to_owned())),
  }
}

// ─── Connection parameters ───────────────────────────────────────────────────

pub fn encode_parameters(parameters: &BTreeMap<String, String>) -> Result<String> {
  Ok(serde_json::to_string(parameters)?)
}

pub fn decode_parameters(s: &str) -> Result<BTreeMap<String, String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `users` row as read from SQLite, before decoding.
pub struct RawUser {
  pub user_id:       i64,
  pub username:      String,
  pub administrator: bool,
  pub disabled:      bool,
  pub created_at:    String,
}

pub fn decode_user(raw: RawUser) -> Result<UserRecord> {
  Ok(UserRecord {
    user_id:       Some(raw.user_id),
    username:      raw.username,
    administrator: raw.administrator,
    disabled:      raw.disabled,
    created_at:    decode_dt(&raw.created_at)?,
  })
}

/// A `connections` row as read from SQLite, before decoding.
pub struct RawConnection {
  pub connection_id: i64,
  pub name:          String,
  pub protocol:      String,
  pub hostname:      String,
  pub port:          u16,
  pub parameters:    String,
  pub created_at:    String,
}

pub fn decode_connection(raw: RawConnection) -> Result<ConnectionRecord> {
  Ok(ConnectionRecord {
    connection_id: Some(raw.connection_id),
    name:          raw.name,
    protocol:      raw.protocol,
    hostname:      raw.hostname,
    port:          raw.port,
    parameters:    decode_parameters(&raw.parameters)?,
    created_at:    decode_dt(&raw.created_at)?,
  })
}
