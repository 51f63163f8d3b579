//! Unit tests for the generic directory service, run against an in-memory
//! mock backing that counts storage accesses.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use crate::{
  Error, Result,
  connection::{Connection, ConnectionRecord},
  mapper::{DirectoryMapper, PermissionMapper},
  object::{DirectoryEntry, DirectoryObject, DirectoryRecord},
  permission::{PermissionGrant, PermissionKind, PermissionSet},
  policy::{AccessPolicy, authorize},
  service::{DirectoryBacking, DirectoryService},
  subject::{Subject, SubjectRecord},
};

// ─── Mock backing ────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemState {
  rows:         Vec<ConnectionRecord>,
  grants:       HashSet<(i64, PermissionKind, String)>,
  creators:     HashSet<i64>,
  next_id:      i64,
  select_calls: usize,
}

type Shared = Arc<Mutex<MemState>>;

struct MemMapper {
  state: Shared,
}

impl DirectoryMapper for MemMapper {
  type Model = ConnectionRecord;
  type Error = Infallible;

  async fn select(
    &self,
    identifiers: BTreeSet<String>,
  ) -> Result<Vec<ConnectionRecord>, Infallible> {
    let mut state = self.state.lock().unwrap();
    state.select_calls += 1;
    Ok(
      state
        .rows
        .iter()
        .filter(|r| identifiers.contains(&r.name))
        .cloned()
        .collect(),
    )
  }

  async fn select_readable(
    &self,
    subject: SubjectRecord,
    identifiers: BTreeSet<String>,
  ) -> Result<Vec<ConnectionRecord>, Infallible> {
    let mut state = self.state.lock().unwrap();
    state.select_calls += 1;
    Ok(
      state
        .rows
        .iter()
        .filter(|r| {
          identifiers.contains(&r.name)
            && state.grants.contains(&(
              subject.object_id,
              PermissionKind::Read,
              r.name.clone(),
            ))
        })
        .cloned()
        .collect(),
    )
  }

  async fn select_identifiers(&self) -> Result<BTreeSet<String>, Infallible> {
    let mut state = self.state.lock().unwrap();
    state.select_calls += 1;
    Ok(state.rows.iter().map(|r| r.name.clone()).collect())
  }

  async fn select_readable_identifiers(
    &self,
    subject: SubjectRecord,
  ) -> Result<BTreeSet<String>, Infallible> {
    let mut state = self.state.lock().unwrap();
    state.select_calls += 1;
    Ok(
      state
        .rows
        .iter()
        .filter(|r| {
          state.grants.contains(&(
            subject.object_id,
            PermissionKind::Read,
            r.name.clone(),
          ))
        })
        .map(|r| r.name.clone())
        .collect(),
    )
  }

  async fn insert(
    &self,
    model: &mut ConnectionRecord,
    creator_grants: Vec<PermissionGrant>,
  ) -> Result<(), Infallible> {
    let mut state = self.state.lock().unwrap();
    state.next_id += 1;
    model.set_object_id(state.next_id);
    state.rows.push(model.clone());
    for grant in creator_grants {
      state
        .grants
        .insert((grant.subject_id, grant.kind, grant.object_identifier));
    }
    Ok(())
  }

  async fn update(&self, model: &ConnectionRecord) -> Result<(), Infallible> {
    let mut state = self.state.lock().unwrap();
    if let Some(row) = state
      .rows
      .iter_mut()
      .find(|r| r.connection_id == model.connection_id)
    {
      *row = model.clone();
    }
    Ok(())
  }

  async fn delete(&self, identifier: &str) -> Result<(), Infallible> {
    let mut state = self.state.lock().unwrap();
    state.rows.retain(|r| r.name != identifier);
    Ok(())
  }
}

struct MemPermissionMapper {
  state: Shared,
}

impl PermissionMapper for MemPermissionMapper {
  type Error = Infallible;

  async fn insert(&self, grants: Vec<PermissionGrant>) -> Result<(), Infallible> {
    let mut state = self.state.lock().unwrap();
    for grant in grants {
      state
        .grants
        .insert((grant.subject_id, grant.kind, grant.object_identifier));
    }
    Ok(())
  }
}

struct MemPermissionSet {
  state:      Shared,
  subject_id: i64,
}

impl PermissionSet for MemPermissionSet {
  type Error = Infallible;

  async fn has_permission(
    &self,
    kind: PermissionKind,
    identifier: &str,
  ) -> Result<bool, Infallible> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .grants
        .contains(&(self.subject_id, kind, identifier.to_owned())),
    )
  }
}

struct MemBacking {
  mapper:      MemMapper,
  permissions: MemPermissionMapper,
  state:       Shared,
}

impl MemBacking {
  fn new() -> Self {
    let state = Shared::default();
    Self {
      mapper:      MemMapper {
        state: state.clone(),
      },
      permissions: MemPermissionMapper {
        state: state.clone(),
      },
      state,
    }
  }
}

impl DirectoryBacking for MemBacking {
  type Model = ConnectionRecord;
  type External = Connection;
  type Internal = DirectoryEntry<ConnectionRecord>;
  type Mapper = MemMapper;
  type Permissions = MemPermissionMapper;
  type PermissionView = MemPermissionSet;

  fn mapper(&self) -> &MemMapper {
    &self.mapper
  }

  fn permission_mapper(&self) -> &MemPermissionMapper {
    &self.permissions
  }

  fn permission_set(&self, subject: &Subject) -> MemPermissionSet {
    MemPermissionSet {
      state:      self.state.clone(),
      subject_id: subject.record().object_id,
    }
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
    let state = self.state.lock().unwrap();
    Ok(state.creators.contains(&subject.record().object_id))
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn subject(id: i64, identifier: &str, administrator: bool) -> Subject {
  Subject::new(
    SubjectRecord {
      object_id:  id,
      identifier: identifier.to_owned(),
    },
    administrator,
  )
}

fn admin() -> Subject {
  subject(1, "admin", true)
}

fn alice() -> Subject {
  subject(2, "alice", false)
}

fn rdp(name: &str) -> Connection {
  Connection {
    name:       name.to_owned(),
    protocol:   "rdp".to_owned(),
    hostname:   "host.example.com".to_owned(),
    port:       3389,
    parameters: BTreeMap::new(),
  }
}

fn service() -> DirectoryService<MemBacking> {
  DirectoryService::new(MemBacking::new())
}

fn allow_create(svc: &DirectoryService<MemBacking>, who: &Subject) {
  svc
    .backing()
    .state
    .lock()
    .unwrap()
    .creators
    .insert(who.record().object_id);
}

async fn grant(
  svc: &DirectoryService<MemBacking>,
  who: &Subject,
  kind: PermissionKind,
  identifier: &str,
) {
  svc
    .backing()
    .permission_mapper()
    .insert(vec![PermissionGrant {
      subject_id:         who.record().object_id,
      subject_identifier: who.identifier().to_owned(),
      kind,
      object_identifier:  identifier.to_owned(),
    }])
    .await
    .unwrap();
}

fn ids(names: &[&str]) -> BTreeSet<String> {
  names.iter().map(|s| (*s).to_owned()).collect()
}

// ─── Retrieval ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn administrator_retrieves_everything_without_grants() {
  let svc = service();
  svc.create_object(&admin(), &rdp("db-01")).await.unwrap();
  svc.create_object(&admin(), &rdp("db-02")).await.unwrap();

  // A different administrator with no grants of their own still sees all.
  let other_admin = subject(9, "root", true);
  let objects = svc
    .retrieve_objects(&other_admin, ids(&["db-01", "db-02"]))
    .await
    .unwrap();
  assert_eq!(objects.len(), 2);
}

#[tokio::test]
async fn non_administrator_sees_only_read_granted_objects() {
  let svc = service();
  svc.create_object(&admin(), &rdp("db-01")).await.unwrap();
  svc.create_object(&admin(), &rdp("db-02")).await.unwrap();

  let alice = alice();
  let before = svc
    .retrieve_objects(&alice, ids(&["db-01", "db-02"]))
    .await
    .unwrap();
  assert!(before.is_empty());

  grant(&svc, &alice, PermissionKind::Read, "db-01").await;
  let after = svc
    .retrieve_objects(&alice, ids(&["db-01", "db-02"]))
    .await
    .unwrap();
  assert_eq!(after.len(), 1);
  assert_eq!(after[0].model().name, "db-01");
}

#[tokio::test]
async fn retrieve_object_absent_returns_none() {
  let svc = service();
  let found = svc.retrieve_object(&admin(), "missing").await.unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn retrieve_objects_with_empty_input_never_touches_storage() {
  let svc = service();
  let objects = svc
    .retrieve_objects(&admin(), BTreeSet::new())
    .await
    .unwrap();
  assert!(objects.is_empty());
  assert_eq!(svc.backing().state.lock().unwrap().select_calls, 0);
}

#[tokio::test]
async fn duplicate_identifier_in_storage_is_fatal() {
  let svc = service();
  {
    let mut state = svc.backing().state.lock().unwrap();
    let mut record = ConnectionRecord::from_connection(&rdp("db-01"));
    record.set_object_id(1);
    state.rows.push(record.clone());
    record.set_object_id(2);
    state.rows.push(record);
  }

  let err = svc.retrieve_object(&admin(), "db-01").await.unwrap_err();
  assert!(matches!(
    err,
    Error::DuplicateIdentifier { identifier } if identifier == "db-01"
  ));
}

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn creator_receives_full_permission_bundle() {
  let svc = service();
  let alice = alice();
  allow_create(&svc, &alice);

  let created = svc.create_object(&alice, &rdp("db-01")).await.unwrap();
  assert_eq!(created.model().name, "db-01");
  assert!(created.model().object_id().is_some());

  let set = svc.backing().permission_set(&alice);
  for kind in [
    PermissionKind::Read,
    PermissionKind::Update,
    PermissionKind::Delete,
    PermissionKind::Administer,
  ] {
    assert!(set.has_permission(kind, "db-01").await.unwrap());
  }

  // The creator can read their object back immediately.
  let found = svc.retrieve_object(&alice, "db-01").await.unwrap();
  assert!(found.is_some());
}

#[tokio::test]
async fn create_without_permission_is_denied_and_leaves_no_state() {
  let svc = service();
  let err = svc.create_object(&alice(), &rdp("db-01")).await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied));

  let state = svc.backing().state.lock().unwrap();
  assert!(state.rows.is_empty());
  assert!(state.grants.is_empty());
}

#[tokio::test]
async fn administrator_creates_without_create_permission() {
  let svc = service();
  svc.create_object(&admin(), &rdp("db-01")).await.unwrap();
  assert_eq!(svc.backing().state.lock().unwrap().rows.len(), 1);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_requires_update_permission() {
  let svc = service();
  svc.create_object(&admin(), &rdp("db-01")).await.unwrap();

  let alice = alice();
  grant(&svc, &alice, PermissionKind::Read, "db-01").await;

  let entry = svc
    .retrieve_object(&alice, "db-01")
    .await
    .unwrap()
    .unwrap();
  let err = svc.update_object(&alice, &entry).await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied));
}

#[tokio::test]
async fn update_twice_with_same_data_is_idempotent() {
  let svc = service();
  let mut entry = svc.create_object(&admin(), &rdp("db-01")).await.unwrap();
  entry.model_mut().hostname = "new-host.example.com".to_owned();

  svc.update_object(&admin(), &entry).await.unwrap();
  let once = svc.backing().state.lock().unwrap().rows.clone();

  svc.update_object(&admin(), &entry).await.unwrap();
  let twice = svc.backing().state.lock().unwrap().rows.clone();

  assert_eq!(once, twice);
  assert_eq!(once[0].hostname, "new-host.example.com");
}

#[tokio::test]
async fn update_of_vanished_row_is_a_noop() {
  let svc = service();
  let entry = svc.create_object(&admin(), &rdp("db-01")).await.unwrap();
  svc.delete_object(&admin(), "db-01").await.unwrap();

  svc.update_object(&admin(), &entry).await.unwrap();
  assert!(svc.backing().state.lock().unwrap().rows.is_empty());
}

// ─── Deletion ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_requires_delete_permission() {
  let svc = service();
  svc.create_object(&admin(), &rdp("db-01")).await.unwrap();

  let alice = alice();
  grant(&svc, &alice, PermissionKind::Read, "db-01").await;

  let err = svc.delete_object(&alice, "db-01").await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied));

  // The row is still there for anyone who can read it.
  assert!(
    svc
      .retrieve_object(&alice, "db-01")
      .await
      .unwrap()
      .is_some()
  );
}

#[tokio::test]
async fn delete_of_nonexistent_object_is_a_noop_for_administrators() {
  let svc = service();
  svc.delete_object(&admin(), "missing").await.unwrap();
}

// ─── Identifier listing ──────────────────────────────────────────────────────

#[tokio::test]
async fn identifiers_are_filtered_by_read_permission() {
  let svc = service();
  svc.create_object(&admin(), &rdp("db-01")).await.unwrap();
  svc.create_object(&admin(), &rdp("db-02")).await.unwrap();

  let all = svc.identifiers(&admin()).await.unwrap();
  assert_eq!(all, ids(&["db-01", "db-02"]));

  let alice = alice();
  grant(&svc, &alice, PermissionKind::Read, "db-02").await;
  let readable = svc.identifiers(&alice).await.unwrap();
  assert_eq!(readable, ids(&["db-02"]));
}

// ─── Policy ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn authorize_bypasses_checks_for_administrators_only() {
  let backing = MemBacking::new();
  let admin = admin();
  let alice = alice();

  authorize(&backing, &admin, PermissionKind::Update, "db-01")
    .await
    .unwrap();

  let err = authorize(&backing, &alice, PermissionKind::Update, "db-01")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PermissionDenied));
}

#[tokio::test]
async fn permission_denied_reveals_no_identifier() {
  let svc = service();
  let err = svc.delete_object(&alice(), "secret-db").await.unwrap_err();
  assert_eq!(err.to_string(), "permission denied");
}

#[tokio::test]
async fn custom_policy_can_add_validation_rules() {
  // Forbids the telnet protocol at create time, for everyone.
  struct NoTelnet;

  impl AccessPolicy<MemBacking> for NoTelnet {
    async fn before_create(
      &self,
      backing: &MemBacking,
      subject: &Subject,
      model: &ConnectionRecord,
    ) -> Result<()> {
      if model.protocol == "telnet" {
        return Err(Error::PermissionDenied);
      }
      if !subject.is_administrator()
        && !backing.has_create_permission(subject).await?
      {
        return Err(Error::PermissionDenied);
      }
      Ok(())
    }
  }

  let svc = DirectoryService::with_policy(MemBacking::new(), NoTelnet);

  let mut telnet = rdp("legacy");
  telnet.protocol = "telnet".to_owned();
  let err = svc.create_object(&admin(), &telnet).await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied));

  svc.create_object(&admin(), &rdp("db-01")).await.unwrap();
}
