//! [`DirectoryBacking`] implementations wiring the SQLite mappers into the
//! generic service, plus ready-made service constructors.

use warden_core::{
  Result,
  connection::{Connection, ConnectionRecord},
  object::DirectoryEntry,
  service::{DirectoryBacking, DirectoryService},
  subject::Subject,
  user::{User, UserRecord},
};

use crate::{
  SqliteStore,
  connections::ConnectionMapper,
  permissions::{
    ConnectionPermissionMapper, ConnectionPermissionSet, SystemPermission,
    SystemPermissions, UserPermissionMapper, UserPermissionSet,
  },
  users::UserMapper,
};

// ─── Connections ─────────────────────────────────────────────────────────────

pub struct ConnectionBacking {
  store:       SqliteStore,
  mapper:      ConnectionMapper,
  permissions: ConnectionPermissionMapper,
  system:      SystemPermissions,
}

impl ConnectionBacking {
  pub fn new(store: SqliteStore) -> Self {
    Self {
      mapper:      ConnectionMapper::new(store.clone()),
      permissions: ConnectionPermissionMapper::new(store.clone()),
      system:      SystemPermissions::new(store.clone()),
      store,
    }
  }
}

impl DirectoryBacking for ConnectionBacking {
  type Model = ConnectionRecord;
  type External = Connection;
  type Internal = DirectoryEntry<ConnectionRecord>;
  type Mapper = ConnectionMapper;
  type Permissions = ConnectionPermissionMapper;
  type PermissionView = ConnectionPermissionSet;

  fn mapper(&self) -> &ConnectionMapper {
    &self.mapper
  }

  fn permission_mapper(&self) -> &ConnectionPermissionMapper {
    &self.permissions
  }

  fn permission_set(&self, subject: &Subject) -> ConnectionPermissionSet {
    ConnectionPermissionSet::new(self.store.clone(), subject.record().object_id)
  }

  fn wrap(
    &self,
    subject: &Subject,
    model: ConnectionRecord,
  ) -> DirectoryEntry<ConnectionRecord> {
    DirectoryEntry::new(subject, model)
  }

  fn model_from(&self, _subject: &Subject, object: &Connection) -> ConnectionRecord {
    ConnectionRecord::from_connection(object)
  }

  async fn has_create_permission(&self, subject: &Subject) -> Result<bool> {
    self
      .system
      .has(subject.record().object_id, SystemPermission::CreateConnection)
      .await
      .map_err(warden_core::Error::store)
  }
}

/// A permission-enforcing service over the `connections` table.
pub fn connection_service(store: &SqliteStore) -> DirectoryService<ConnectionBacking> {
  DirectoryService::new(ConnectionBacking::new(store.clone()))
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub struct UserBacking {
  store:       SqliteStore,
  mapper:      UserMapper,
  permissions: UserPermissionMapper,
  system:      SystemPermissions,
}

impl UserBacking {
  pub fn new(store: SqliteStore) -> Self {
    Self {
      mapper:      UserMapper::new(store.clone()),
      permissions: UserPermissionMapper::new(store.clone()),
      system:      SystemPermissions::new(store.clone()),
      store,
    }
  }
}

impl DirectoryBacking for UserBacking {
  type Model = UserRecord;
  type External = User;
  type Internal = DirectoryEntry<UserRecord>;
  type Mapper = UserMapper;
  type Permissions = UserPermissionMapper;
  type PermissionView = UserPermissionSet;

  fn mapper(&self) -> &UserMapper {
    &self.mapper
  }

  fn permission_mapper(&self) -> &UserPermissionMapper {
    &self.permissions
  }

  fn permission_set(&self, subject: &Subject) -> UserPermissionSet {
    UserPermissionSet::new(self.store.clone(), subject.record().object_id)
  }

  fn wrap(&self, subject: &Subject, model: UserRecord) -> DirectoryEntry<UserRecord> {
    DirectoryEntry::new(subject, model)
  }

  fn model_from(&self, _subject: &Subject, object: &User) -> UserRecord {
    UserRecord::from_user(object)
  }

  async fn has_create_permission(&self, subject: &Subject) -> Result<bool> {
    self
      .system
      .has(subject.record().object_id, SystemPermission::CreateUser)
      .await
      .map_err(warden_core::Error::store)
  }
}

/// A permission-enforcing service over the `users` table.
pub fn user_service(store: &SqliteStore) -> DirectoryService<UserBacking> {
  DirectoryService::new(UserBacking::new(store.clone()))
}
