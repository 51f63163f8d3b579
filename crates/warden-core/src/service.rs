//! The generic directory object service.
//!
//! [`DirectoryService`] wraps one entity type's mappers and enforces the
//! calling subject's permissions before every storage operation. Entity types
//! plug in through the [`DirectoryBacking`] capability trait; custom
//! validation rules are injected as an
//! [`AccessPolicy`](crate::policy::AccessPolicy) strategy.

use std::collections::BTreeSet;
use std::future::Future;

use crate::{
  Error, Result,
  mapper::{DirectoryMapper, PermissionMapper},
  object::{DirectoryObject, DirectoryRecord},
  permission::{CREATOR_GRANTS, PermissionGrant, PermissionKind, PermissionSet},
  policy::{AccessPolicy, DefaultPolicy},
  subject::Subject,
};

// ─── Backing ─────────────────────────────────────────────────────────────────

/// The capability interface one entity type supplies to the service: its
/// mappers, its subject-scoped permission view, and the conversions between
/// the external representation, the storage record, and the wrapper handed to
/// callers.
pub trait DirectoryBacking: Send + Sync {
  /// The storage-row representation.
  type Model: DirectoryRecord;
  /// The public-facing representation callers create and mutate.
  type External: Send + Sync;
  /// The transient wrapper returned by the service.
  type Internal: DirectoryObject<Model = Self::Model>;

  type Mapper: DirectoryMapper<Model = Self::Model>;
  type Permissions: PermissionMapper;
  type PermissionView: PermissionSet;

  fn mapper(&self) -> &Self::Mapper;

  fn permission_mapper(&self) -> &Self::Permissions;

  /// The permission view for `subject`, built fresh per request.
  fn permission_set(&self, subject: &Subject) -> Self::PermissionView;

  /// Wrap a stored record for return to `subject`.
  fn wrap(&self, subject: &Subject, model: Self::Model) -> Self::Internal;

  /// Build a new storage record from the external representation.
  fn model_from(&self, subject: &Subject, object: &Self::External) -> Self::Model;

  /// Whether `subject` may create objects of this entity type. Administrators
  /// are never asked; the policy layer bypasses this check for them.
  fn has_create_permission<'a>(
    &'a self,
    subject: &'a Subject,
  ) -> impl Future<Output = Result<bool>> + Send + 'a;

  /// Permissions granted to the creator of a new object. Defaults to
  /// READ + UPDATE + DELETE + ADMINISTER.
  fn creator_grants(&self) -> &[PermissionKind] {
    CREATOR_GRANTS
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Permission-enforcing CRUD over one entity type.
///
/// Every operation takes the calling [`Subject`] first, authorizes it, and
/// only then delegates to the mappers. Reads never fail on missing
/// permission: objects the subject cannot read are silently omitted.
pub struct DirectoryService<B, P = DefaultPolicy> {
  backing: B,
  policy:  P,
}

impl<B: DirectoryBacking> DirectoryService<B> {
  pub fn new(backing: B) -> Self {
    Self {
      backing,
      policy: DefaultPolicy,
    }
  }
}

impl<B, P> DirectoryService<B, P>
where
  B: DirectoryBacking,
  P: AccessPolicy<B>,
{
  /// Build a service with an injected validation policy.
  pub fn with_policy(backing: B, policy: P) -> Self {
    Self { backing, policy }
  }

  pub fn backing(&self) -> &B {
    &self.backing
  }

  /// Retrieve the object with the given identifier, or `None` if it does not
  /// exist or the subject cannot read it.
  ///
  /// More than one matching record means the storage UNIQUE constraint has
  /// been violated and surfaces as [`Error::DuplicateIdentifier`].
  pub async fn retrieve_object(
    &self,
    subject: &Subject,
    identifier: &str,
  ) -> Result<Option<B::Internal>> {
    let mut objects = self
      .retrieve_objects(subject, BTreeSet::from([identifier.to_owned()]))
      .await?;

    if objects.len() > 1 {
      return Err(Error::DuplicateIdentifier {
        identifier: identifier.to_owned(),
      });
    }

    Ok(objects.pop())
  }

  /// Retrieve all requested objects the subject is allowed to see.
  ///
  /// Administrators get every matching record; everyone else gets only the
  /// records they hold READ permission on. Unauthorized objects are left out
  /// of the result, never reported as errors.
  pub async fn retrieve_objects(
    &self,
    subject: &Subject,
    identifiers: BTreeSet<String>,
  ) -> Result<Vec<B::Internal>> {
    // Do not touch storage when there is nothing to look up.
    if identifiers.is_empty() {
      return Ok(Vec::new());
    }

    let models = if subject.is_administrator() {
      self
        .backing
        .mapper()
        .select(identifiers)
        .await
        .map_err(Error::store)?
    } else {
      self
        .backing
        .mapper()
        .select_readable(subject.record().clone(), identifiers)
        .await
        .map_err(Error::store)?
    };

    Ok(
      models
        .into_iter()
        .map(|model| self.backing.wrap(subject, model))
        .collect(),
    )
  }

  /// Create a new object and grant the creator the configured permission
  /// bundle.
  ///
  /// The record and the creator grants are handed to the mapper together and
  /// persist as one atomic unit: a failed grant write leaves no record
  /// behind, never a persisted object nobody can see.
  pub async fn create_object(
    &self,
    subject: &Subject,
    object: &B::External,
  ) -> Result<B::Internal> {
    let mut model = self.backing.model_from(subject, object);
    self
      .policy
      .before_create(&self.backing, subject, &model)
      .await?;

    let grants = self.implicit_grants(subject, &model);
    self
      .backing
      .mapper()
      .insert(&mut model, grants)
      .await
      .map_err(Error::store)?;

    tracing::debug!(
      subject = subject.identifier(),
      identifier = model.identifier(),
      "created directory object"
    );

    Ok(self.backing.wrap(subject, model))
  }

  /// Apply the object's current state to storage. Requires UPDATE permission.
  /// No-op if the record no longer exists.
  pub async fn update_object(
    &self,
    subject: &Subject,
    object: &B::Internal,
  ) -> Result<()> {
    self
      .policy
      .before_update(&self.backing, subject, object.model())
      .await?;

    self
      .backing
      .mapper()
      .update(object.model())
      .await
      .map_err(Error::store)
  }

  /// Delete the object with the given identifier. Requires DELETE permission.
  /// No-op if no such object exists.
  pub async fn delete_object(
    &self,
    subject: &Subject,
    identifier: &str,
  ) -> Result<()> {
    self
      .policy
      .before_delete(&self.backing, subject, identifier)
      .await?;

    self
      .backing
      .mapper()
      .delete(identifier)
      .await
      .map_err(Error::store)?;

    tracing::debug!(
      subject = subject.identifier(),
      identifier,
      "deleted directory object"
    );

    Ok(())
  }

  /// All identifiers the subject may read: everything for administrators,
  /// READ-granted objects for everyone else.
  pub async fn identifiers(&self, subject: &Subject) -> Result<BTreeSet<String>> {
    if subject.is_administrator() {
      self
        .backing
        .mapper()
        .select_identifiers()
        .await
        .map_err(Error::store)
    } else {
      self
        .backing
        .mapper()
        .select_readable_identifiers(subject.record().clone())
        .await
        .map_err(Error::store)
    }
  }

  /// Build the grant rows implied by `subject` creating `model`, from the
  /// backing's configured bundle.
  fn implicit_grants(
    &self,
    subject: &Subject,
    model: &B::Model,
  ) -> Vec<PermissionGrant> {
    self
      .backing
      .creator_grants()
      .iter()
      .map(|&kind| PermissionGrant {
        subject_id:         subject.record().object_id,
        subject_identifier: subject.identifier().to_owned(),
        kind,
        object_identifier:  model.identifier().to_owned(),
      })
      .collect()
  }
}
