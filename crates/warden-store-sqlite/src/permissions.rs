//! Permission storage: object-permission mappers, per-subject permission
//! sets, and type-wide system permissions.
//!
//! Grants are rows in `user_permissions` / `connection_permissions`; a
//! missing row is a denial. Permission sets are point-query views built fresh
//! per request — nothing is cached across requests.

use rusqlite::OptionalExtension as _;
use warden_core::{
  mapper::PermissionMapper,
  permission::{PermissionGrant, PermissionKind, PermissionSet},
};

use crate::{Result, SqliteStore, encode::decode_permission_kind};

// ─── Shared SQL helpers ──────────────────────────────────────────────────────

async fn insert_grants(
  store: &SqliteStore,
  insert_sql: &'static str,
  grants: Vec<PermissionGrant>,
) -> Result<()> {
  if grants.is_empty() {
    return Ok(());
  }

  store
    .conn()
    .call(move |conn| {
      let tx = conn.transaction()?;
      {
        let mut stmt = tx.prepare(insert_sql)?;
        for grant in &grants {
          stmt.execute(rusqlite::params![
            grant.subject_id,
            grant.kind.as_str(),
            grant.object_identifier,
          ])?;
        }
      }
      tx.commit()?;
      Ok(())
    })
    .await?;
  Ok(())
}

async fn query_grant(
  store: &SqliteStore,
  select_sql: &'static str,
  subject_id: i64,
  kind: PermissionKind,
  identifier: &str,
) -> Result<bool> {
  let identifier = identifier.to_owned();
  let held = store
    .conn()
    .call(move |conn| {
      let held: Option<i64> = conn
        .query_row(
          select_sql,
          rusqlite::params![subject_id, kind.as_str(), identifier],
          |r| r.get(0),
        )
        .optional()?;
      Ok(held.is_some())
    })
    .await?;
  Ok(held)
}

async fn query_granted_kinds(
  store: &SqliteStore,
  select_sql: &'static str,
  subject_id: i64,
  identifier: &str,
) -> Result<Vec<PermissionKind>> {
  let identifier = identifier.to_owned();
  let names = store
    .conn()
    .call(move |conn| {
      let mut stmt = conn.prepare(select_sql)?;
      let names = stmt
        .query_map(rusqlite::params![subject_id, identifier], |r| {
          r.get::<_, String>(0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(names)
    })
    .await?;

  names.iter().map(|s| decode_permission_kind(s)).collect()
}

// ─── Connection permissions ──────────────────────────────────────────────────

pub struct ConnectionPermissionMapper {
  store: SqliteStore,
}

impl ConnectionPermissionMapper {
  pub fn new(store: SqliteStore) -> Self {
    Self { store }
  }
}

impl PermissionMapper for ConnectionPermissionMapper {
  type Error = crate::Error;

  async fn insert(&self, grants: Vec<PermissionGrant>) -> Result<()> {
    insert_grants(
      &self.store,
      "INSERT OR IGNORE INTO connection_permissions (user_id, permission, connection_name)
       VALUES (?1, ?2, ?3)",
      grants,
    )
    .await
  }
}

/// Per-subject view over `connection_permissions`.
pub struct ConnectionPermissionSet {
  store:      SqliteStore,
  subject_id: i64,
}

impl ConnectionPermissionSet {
  pub fn new(store: SqliteStore, subject_id: i64) -> Self {
    Self { store, subject_id }
  }

  /// Every permission kind this subject holds on one connection.
  pub async fn granted_on(&self, identifier: &str) -> Result<Vec<PermissionKind>> {
    query_granted_kinds(
      &self.store,
      "SELECT permission FROM connection_permissions
        WHERE user_id = ?1 AND connection_name = ?2",
      self.subject_id,
      identifier,
    )
    .await
  }
}

impl PermissionSet for ConnectionPermissionSet {
  type Error = crate::Error;

  async fn has_permission(
    &self,
    kind: PermissionKind,
    identifier: &str,
  ) -> Result<bool> {
    query_grant(
      &self.store,
      "SELECT 1 FROM connection_permissions
        WHERE user_id = ?1 AND permission = ?2 AND connection_name = ?3",
      self.subject_id,
      kind,
      identifier,
    )
    .await
  }
}

// ─── User permissions ────────────────────────────────────────────────────────

pub struct UserPermissionMapper {
  store: SqliteStore,
}

impl UserPermissionMapper {
  pub fn new(store: SqliteStore) -> Self {
    Self { store }
  }
}

impl PermissionMapper for UserPermissionMapper {
  type Error = crate::Error;

  async fn insert(&self, grants: Vec<PermissionGrant>) -> Result<()> {
    insert_grants(
      &self.store,
      "INSERT OR IGNORE INTO user_permissions (user_id, permission, affected_username)
       VALUES (?1, ?2, ?3)",
      grants,
    )
    .await
  }
}

/// Per-subject view over `user_permissions`.
pub struct UserPermissionSet {
  store:      SqliteStore,
  subject_id: i64,
}

impl UserPermissionSet {
  pub fn new(store: SqliteStore, subject_id: i64) -> Self {
    Self { store, subject_id }
  }

  /// Every permission kind this subject holds on one account.
  pub async fn granted_on(&self, identifier: &str) -> Result<Vec<PermissionKind>> {
    query_granted_kinds(
      &self.store,
      "SELECT permission FROM user_permissions
        WHERE user_id = ?1 AND affected_username = ?2",
      self.subject_id,
      identifier,
    )
    .await
  }
}

impl PermissionSet for UserPermissionSet {
  type Error = crate::Error;

  async fn has_permission(
    &self,
    kind: PermissionKind,
    identifier: &str,
  ) -> Result<bool> {
    query_grant(
      &self.store,
      "SELECT 1 FROM user_permissions
        WHERE user_id = ?1 AND permission = ?2 AND affected_username = ?3",
      self.subject_id,
      kind,
      identifier,
    )
    .await
  }
}

// ─── System permissions ──────────────────────────────────────────────────────

/// Type-wide rights that gate object creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPermission {
  CreateUser,
  CreateConnection,
}

impl SystemPermission {
  pub fn as_str(self) -> &'static str {
    match self {
      SystemPermission::CreateUser => "create_user",
      SystemPermission::CreateConnection => "create_connection",
    }
  }
}

/// Accessor for the `system_permissions` table.
#[derive(Clone)]
pub struct SystemPermissions {
  store: SqliteStore,
}

impl SystemPermissions {
  pub fn new(store: SqliteStore) -> Self {
    Self { store }
  }

  pub async fn grant(&self, user_id: i64, permission: SystemPermission) -> Result<()> {
    self
      .store
      .conn()
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO system_permissions (user_id, permission)
           VALUES (?1, ?2)",
          rusqlite::params![user_id, permission.as_str()],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn has(&self, user_id: i64, permission: SystemPermission) -> Result<bool> {
    let held = self
      .store
      .conn()
      .call(move |conn| {
        let held: Option<i64> = conn
          .query_row(
            "SELECT 1 FROM system_permissions
              WHERE user_id = ?1 AND permission = ?2",
            rusqlite::params![user_id, permission.as_str()],
            |r| r.get(0),
          )
          .optional()?;
        Ok(held.is_some())
      })
      .await?;
    Ok(held)
  }
}
