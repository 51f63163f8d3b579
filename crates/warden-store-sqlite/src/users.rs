//! [`UserMapper`] — CRUD for the `users` table.
//!
//! User accounts are directory objects like any other: visibility of one
//! account to another goes through the same READ-grant filtering as
//! connections.

use std::collections::BTreeSet;

use warden_core::{
  mapper::DirectoryMapper,
  permission::PermissionGrant,
  subject::SubjectRecord,
  user::UserRecord,
};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawUser, decode_user, encode_dt},
  store::sql_placeholders,
};

const COLUMNS: &str =
  "u.user_id, u.username, u.administrator, u.disabled, u.created_at";

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       row.get(0)?,
    username:      row.get(1)?,
    administrator: row.get(2)?,
    disabled:      row.get(3)?,
    created_at:    row.get(4)?,
  })
}

pub struct UserMapper {
  store: SqliteStore,
}

impl UserMapper {
  pub fn new(store: SqliteStore) -> Self {
    Self { store }
  }
}

impl DirectoryMapper for UserMapper {
  type Model = UserRecord;
  type Error = Error;

  async fn select(&self, identifiers: BTreeSet<String>) -> Result<Vec<UserRecord>> {
    if identifiers.is_empty() {
      return Ok(Vec::new());
    }

    let raws = self
      .store
      .conn()
      .call(move |conn| {
        let sql = format!(
          "SELECT {COLUMNS} FROM users u
            WHERE u.username IN ({})
            ORDER BY u.username",
          sql_placeholders(identifiers.len()),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(identifiers.iter()), raw_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(decode_user).collect()
  }

  async fn select_readable(
    &self,
    subject: SubjectRecord,
    identifiers: BTreeSet<String>,
  ) -> Result<Vec<UserRecord>> {
    if identifiers.is_empty() {
      return Ok(Vec::new());
    }

    let raws = self
      .store
      .conn()
      .call(move |conn| {
        let sql = format!(
          "SELECT {COLUMNS} FROM users u
             JOIN user_permissions p ON p.affected_username = u.username
            WHERE p.user_id = ? AND p.permission = 'read'
              AND u.username IN ({})
            ORDER BY u.username",
          sql_placeholders(identifiers.len()),
        );
        let mut params: Vec<rusqlite::types::Value> =
          vec![subject.object_id.into()];
        params.extend(
          identifiers
            .into_iter()
            .map(rusqlite::types::Value::from),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), raw_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(decode_user).collect()
  }

  async fn select_identifiers(&self) -> Result<BTreeSet<String>> {
    let names = self
      .store
      .conn()
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT username FROM users")?;
        let names = stmt
          .query_map([], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn select_readable_identifiers(
    &self,
    subject: SubjectRecord,
  ) -> Result<BTreeSet<String>> {
    let names = self
      .store
      .conn()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT u.username FROM users u
             JOIN user_permissions p ON p.affected_username = u.username
            WHERE p.user_id = ?1 AND p.permission = 'read'",
        )?;
        let names = stmt
          .query_map(rusqlite::params![subject.object_id], |r| {
            r.get::<_, String>(0)
          })?
          .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn insert(
    &self,
    model: &mut UserRecord,
    creator_grants: Vec<PermissionGrant>,
  ) -> Result<()> {
    let username = model.username.clone();
    let administrator = model.administrator;
    let disabled = model.disabled;
    let created_at = encode_dt(model.created_at);

    // Row and creator grants commit together; a failed grant write rolls the
    // row back.
    let id = self
      .store
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (username, administrator, disabled, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![username, administrator, disabled, created_at],
        )?;
        let id = tx.last_insert_rowid();
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO user_permissions (user_id, permission, affected_username)
             VALUES (?1, ?2, ?3)",
          )?;
          for grant in &creator_grants {
            stmt.execute(rusqlite::params![
              grant.subject_id,
              grant.kind.as_str(),
              grant.object_identifier,
            ])?;
          }
        }
        tx.commit()?;
        Ok(id)
      })
      .await?;

    model.user_id = Some(id);
    Ok(())
  }

  async fn update(&self, model: &UserRecord) -> Result<()> {
    let user_id = model.user_id;
    let username = model.username.clone();
    let administrator = model.administrator;
    let disabled = model.disabled;

    self
      .store
      .conn()
      .call(move |conn| {
        conn.execute(
          "UPDATE users
              SET username = ?2, administrator = ?3, disabled = ?4
            WHERE user_id = ?1",
          rusqlite::params![user_id, username, administrator, disabled],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, identifier: &str) -> Result<()> {
    // Removes the account together with every grant naming it, on either
    // side: grants on the account, and grants the account held.
    let username = identifier.to_owned();
    self
      .store
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM user_permissions WHERE affected_username = ?1",
          rusqlite::params![username],
        )?;
        tx.execute(
          "DELETE FROM user_permissions WHERE user_id IN
             (SELECT user_id FROM users WHERE username = ?1)",
          rusqlite::params![username],
        )?;
        tx.execute(
          "DELETE FROM connection_permissions WHERE user_id IN
             (SELECT user_id FROM users WHERE username = ?1)",
          rusqlite::params![username],
        )?;
        tx.execute(
          "DELETE FROM system_permissions WHERE user_id IN
             (SELECT user_id FROM users WHERE username = ?1)",
          rusqlite::params![username],
        )?;
        tx.execute(
          "DELETE FROM users WHERE username = ?1",
          rusqlite::params![username],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
