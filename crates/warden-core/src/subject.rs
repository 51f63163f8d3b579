//! Subject — the authenticated caller on whose behalf operations run.

use serde::{Deserialize, Serialize};

/// The subject's own storage row: numeric id plus unique identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
  pub object_id:  i64,
  pub identifier: String,
}

/// An authenticated subject. Immutable for the duration of a request.
///
/// Administrators bypass all per-object permission checks; everyone else is
/// evaluated strictly against their permission set.
#[derive(Debug, Clone)]
pub struct Subject {
  record:        SubjectRecord,
  administrator: bool,
}

impl Subject {
  pub fn new(record: SubjectRecord, administrator: bool) -> Self {
    Self {
      record,
      administrator,
    }
  }

  pub fn record(&self) -> &SubjectRecord {
    &self.record
  }

  pub fn identifier(&self) -> &str {
    &self.record.identifier
  }

  pub fn is_administrator(&self) -> bool {
    self.administrator
  }
}
