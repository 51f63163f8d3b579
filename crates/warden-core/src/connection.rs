//! Connection entity — a remote-desktop endpoint published through the
//! directory.
//!
//! The connection name is its identifier. Protocol-specific settings live in
//! the free-form `parameters` map; storage backends serialize it as JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object::DirectoryRecord;

/// The external representation of a connection, as seen by API callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
  pub name:       String,
  pub protocol:   String,
  pub hostname:   String,
  pub port:       u16,
  #[serde(default)]
  pub parameters: BTreeMap<String, String>,
}

/// The storage row backing a [`Connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
  pub connection_id: Option<i64>,
  pub name:          String,
  pub protocol:      String,
  pub hostname:      String,
  pub port:          u16,
  pub parameters:    BTreeMap<String, String>,
  pub created_at:    DateTime<Utc>,
}

impl ConnectionRecord {
  /// Build a new, not-yet-persisted record from the external representation.
  pub fn from_connection(connection: &Connection) -> Self {
    Self {
      connection_id: None,
      name:          connection.name.clone(),
      protocol:      connection.protocol.clone(),
      hostname:      connection.hostname.clone(),
      port:          connection.port,
      parameters:    connection.parameters.clone(),
      created_at:    Utc::now(),
    }
  }

  pub fn to_connection(&self) -> Connection {
    Connection {
      name:       self.name.clone(),
      protocol:   self.protocol.clone(),
      hostname:   self.hostname.clone(),
      port:       self.port,
      parameters: self.parameters.clone(),
    }
  }
}

impl DirectoryRecord for ConnectionRecord {
  fn identifier(&self) -> &str {
    &self.name
  }

  fn object_id(&self) -> Option<i64> {
    self.connection_id
  }

  fn set_object_id(&mut self, id: i64) {
    self.connection_id = Some(id);
  }
}
