//! Mapper traits — the storage collaborators consumed by the directory
//! service.
//!
//! Implemented by storage backends (e.g. `warden-store-sqlite`). The service
//! depends on these abstractions, not on any concrete backend. All methods
//! return `Send` futures so the traits can be used in multi-threaded async
//! runtimes.

use std::collections::BTreeSet;
use std::future::Future;

use crate::{
  object::DirectoryRecord,
  permission::PermissionGrant,
  subject::SubjectRecord,
};

// ─── Object mapper ───────────────────────────────────────────────────────────

/// CRUD primitives for one entity type, including permission-filtered reads.
///
/// The filtered variants (`select_readable`, `select_readable_identifiers`)
/// restrict results to objects the given subject holds READ permission on.
/// The mapper enforces no policy of its own; policy lives in
/// [`DirectoryService`](crate::service::DirectoryService).
pub trait DirectoryMapper: Send + Sync {
  type Model: DirectoryRecord;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch all records matching the given identifiers, unfiltered.
  fn select(
    &self,
    identifiers: BTreeSet<String>,
  ) -> impl Future<Output = Result<Vec<Self::Model>, Self::Error>> + Send + '_;

  /// Fetch the records matching the given identifiers that `subject` holds
  /// READ permission on.
  fn select_readable(
    &self,
    subject: SubjectRecord,
    identifiers: BTreeSet<String>,
  ) -> impl Future<Output = Result<Vec<Self::Model>, Self::Error>> + Send + '_;

  /// All identifiers in storage for this entity type.
  fn select_identifiers(
    &self,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + '_;

  /// Identifiers of the objects `subject` holds READ permission on.
  fn select_readable_identifiers(
    &self,
    subject: SubjectRecord,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + '_;

  /// Persist a new record together with the creator's permission grants, as
  /// one atomic unit: a failed grant write must leave no record behind, or
  /// the object would persist with nobody able to see it. The record's
  /// storage id is assigned by this call. Fails if the identifier is already
  /// taken.
  fn insert<'a>(
    &'a self,
    model: &'a mut Self::Model,
    creator_grants: Vec<PermissionGrant>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Apply the record's current state to storage. No-op if the record no
  /// longer exists.
  fn update<'a>(
    &'a self,
    model: &'a Self::Model,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove the record with the given identifier. No-op if absent.
  fn delete<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Permission mapper ───────────────────────────────────────────────────────

/// Bulk insert of permission grants for one entity type, used to share an
/// existing object with further subjects. Creator grants do not pass through
/// here; they travel with [`DirectoryMapper::insert`].
pub trait PermissionMapper: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert all given grants. Already-present grants are ignored (grants are
  /// additive; re-granting is not an error).
  fn insert(
    &self,
    grants: Vec<PermissionGrant>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
