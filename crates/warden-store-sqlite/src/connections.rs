//! [`ConnectionMapper`] — CRUD for the `connections` table.

use std::collections::BTreeSet;

use warden_core::{
  connection::ConnectionRecord,
  mapper::DirectoryMapper,
  permission::PermissionGrant,
  subject::SubjectRecord,
};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawConnection, decode_connection, encode_dt, encode_parameters},
  store::sql_placeholders,
};

const COLUMNS: &str =
  "c.connection_id, c.name, c.protocol, c.hostname, c.port, c.parameters, c.created_at";

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawConnection> {
  Ok(RawConnection {
    connection_id: row.get(0)?,
    name:          row.get(1)?,
    protocol:      row.get(2)?,
    hostname:      row.get(3)?,
    port:          row.get(4)?,
    parameters:    row.get(5)?,
    created_at:    row.get(6)?,
  })
}

pub struct ConnectionMapper {
  store: SqliteStore,
}

impl ConnectionMapper {
  pub fn new(store: SqliteStore) -> Self {
    Self { store }
  }
}

impl DirectoryMapper for ConnectionMapper {
  type Model = ConnectionRecord;
  type Error = Error;

  async fn select(
    &self,
    identifiers: BTreeSet<String>,
  ) -> Result<Vec<ConnectionRecord>> {
    if identifiers.is_empty() {
      return Ok(Vec::new());
    }

    let raws = self
      .store
      .conn()
      .call(move |conn| {
        let sql = format!(
          "SELECT {COLUMNS} FROM connections c
            WHERE c.name IN ({})
            ORDER BY c.name",
          sql_placeholders(identifiers.len()),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(identifiers.iter()), raw_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(decode_connection).collect()
  }

  async fn select_readable(
    &self,
    subject: SubjectRecord,
    identifiers: BTreeSet<String>,
  ) -> Result<Vec<ConnectionRecord>> {
    if identifiers.is_empty() {
      return Ok(Vec::new());
    }

    let raws = self
      .store
      .conn()
      .call(move |conn| {
        let sql = format!(
          "SELECT {COLUMNS} FROM connections c
             JOIN connection_permissions p ON p.connection_name = c.name
            WHERE p.user_id = ? AND p.permission = 'read'
              AND c.name IN ({})
            ORDER BY c.name",
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

    raws.into_iter().map(decode_connection).collect()
  }

  async fn select_identifiers(&self) -> Result<BTreeSet<String>> {
    let names = self
      .store
      .conn()
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM connections")?;
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
          "SELECT c.name FROM connections c
             JOIN connection_permissions p ON p.connection_name = c.name
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
    model: &mut ConnectionRecord,
    creator_grants: Vec<PermissionGrant>,
  ) -> Result<()> {
    let name = model.name.clone();
    let protocol = model.protocol.clone();
    let hostname = model.hostname.clone();
    let port = model.port;
    let parameters = encode_parameters(&model.parameters)?;
    let created_at = encode_dt(model.created_at);

    // Row and creator grants commit together; a failed grant write rolls the
    // row back.
    let id = self
      .store
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO connections (name, protocol, hostname, port, parameters, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![name, protocol, hostname, port, parameters, created_at],
        )?;
        let id = tx.last_insert_rowid();
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO connection_permissions (user_id, permission, connection_name)
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

    model.connection_id = Some(id);
    Ok(())
  }

  async fn update(&self, model: &ConnectionRecord) -> Result<()> {
    // Keyed on the storage id so the identifier itself may change. A NULL id
    // (never persisted) or a deleted row matches nothing: silent no-op.
    let connection_id = model.connection_id;
    let name = model.name.clone();
    let protocol = model.protocol.clone();
    let hostname = model.hostname.clone();
    let port = model.port;
    let parameters = encode_parameters(&model.parameters)?;

    self
      .store
      .conn()
      .call(move |conn| {
        conn.execute(
          "UPDATE connections
              SET name = ?2, protocol = ?3, hostname = ?4, port = ?5, parameters = ?6
            WHERE connection_id = ?1",
          rusqlite::params![connection_id, name, protocol, hostname, port, parameters],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, identifier: &str) -> Result<()> {
    let name = identifier.to_owned();
    self
      .store
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM connection_permissions WHERE connection_name = ?1",
          rusqlite::params![name],
        )?;
        tx.execute(
          "DELETE FROM connections WHERE name = ?1",
          rusqlite::params![name],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
