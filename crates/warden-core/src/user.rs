//! User entity — an account in the directory.
//!
//! Users are both directory objects (managed through the same
//! permission-enforcing service as any other entity) and the source of
//! [`Subject`]s. Credential verification is the enclosing application's
//! concern and does not appear here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  object::DirectoryRecord,
  subject::{Subject, SubjectRecord},
};

/// The external representation of a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub username:      String,
  #[serde(default)]
  pub administrator: bool,
  #[serde(default)]
  pub disabled:      bool,
}

/// The storage row backing a [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
  pub user_id:       Option<i64>,
  pub username:      String,
  pub administrator: bool,
  pub disabled:      bool,
  pub created_at:    DateTime<Utc>,
}

impl UserRecord {
  /// Build a new, not-yet-persisted record from the external representation.
  pub fn from_user(user: &User) -> Self {
    Self {
      user_id:       None,
      username:      user.username.clone(),
      administrator: user.administrator,
      disabled:      user.disabled,
      created_at:    Utc::now(),
    }
  }

  pub fn to_user(&self) -> User {
    User {
      username:      self.username.clone(),
      administrator: self.administrator,
      disabled:      self.disabled,
    }
  }

  /// The authenticated subject this account corresponds to, or `None` if the
  /// record has not been persisted yet.
  pub fn to_subject(&self) -> Option<Subject> {
    let object_id = self.user_id?;
    Some(Subject::new(
      SubjectRecord {
        object_id,
        identifier: self.username.clone(),
      },
      self.administrator,
    ))
  }
}

impl DirectoryRecord for UserRecord {
  fn identifier(&self) -> &str {
    &self.username
  }

  fn object_id(&self) -> Option<i64> {
    self.user_id
  }

  fn set_object_id(&mut self, id: i64) {
    self.user_id = Some(id);
  }
}
