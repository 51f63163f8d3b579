//! [`SqliteStore`] — the shared SQLite connection behind all Warden mappers.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use warden_core::subject::{Subject, SubjectRecord};

use crate::{Result, encode::encode_dt, schema::SCHEMA};

/// Build a `?, ?, ...` placeholder list for a dynamic `IN` clause.
pub(crate) fn sql_placeholders(n: usize) -> String {
  vec!["?"; n].join(", ")
}

/// A Warden store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every mapper
/// built from one store shares that connection, which is what gives a
/// create's two writes (record + creator grants) one serialization scope.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) fn conn(&self) -> &tokio_rusqlite::Connection {
    &self.conn
  }

  /// Load the authenticated subject for `username`.
  ///
  /// Returns `None` if no such account exists or the account is disabled.
  /// Credential verification happens upstream; this only resolves identity.
  pub async fn fetch_subject(&self, username: &str) -> Result<Option<Subject>> {
    let name = username.to_owned();
    let row: Option<(i64, bool, bool)> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT user_id, administrator, disabled
               FROM users WHERE username = ?1",
            rusqlite::params![name],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    Ok(row.and_then(|(user_id, administrator, disabled)| {
      if disabled {
        return None;
      }
      Some(Subject::new(
        SubjectRecord {
          object_id:  user_id,
          identifier: username.to_owned(),
        },
        administrator,
      ))
    }))
  }

  /// Ensure an administrator account named `username` exists and return its
  /// subject. Idempotent; used to seed a fresh database.
  pub async fn bootstrap_admin(&self, username: &str) -> Result<Subject> {
    let name = username.to_owned();
    let created_at = encode_dt(Utc::now());
    let user_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO users (username, administrator, disabled, created_at)
           VALUES (?1, 1, 0, ?2)",
          rusqlite::params![name, created_at],
        )?;
        let id: i64 = conn.query_row(
          "SELECT user_id FROM users WHERE username = ?1",
          rusqlite::params![name],
          |r| r.get(0),
        )?;
        Ok(id)
      })
      .await?;

    tracing::debug!(username, user_id, "bootstrapped administrator");

    Ok(Subject::new(
      SubjectRecord {
        object_id:  user_id,
        identifier: username.to_owned(),
      },
      true,
    ))
  }
}
