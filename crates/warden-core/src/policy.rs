//! Authorization policy.
//!
//! [`authorize`] is the single policy-evaluation function; the administrator
//! bypass is defined here and nowhere else. [`AccessPolicy`] is the
//! per-operation hook trait with default implementations; entity types that
//! need extra rules inject a custom policy into their
//! [`DirectoryService`](crate::service::DirectoryService) instead of
//! overriding service methods.

use std::future::Future;

use crate::{
  Error, Result,
  object::DirectoryRecord,
  permission::{PermissionKind, PermissionSet},
  service::DirectoryBacking,
  subject::Subject,
};

/// Decide whether `subject` may perform `kind` on the object named
/// `identifier`.
///
/// Administrators are allowed unconditionally. Everyone else must hold an
/// explicit grant in their permission set; a missing grant maps to
/// [`Error::PermissionDenied`].
pub async fn authorize<B: DirectoryBacking>(
  backing: &B,
  subject: &Subject,
  kind: PermissionKind,
  identifier: &str,
) -> Result<()> {
  if subject.is_administrator() {
    return Ok(());
  }

  let permitted = backing
    .permission_set(subject)
    .has_permission(kind, identifier)
    .await
    .map_err(Error::store)?;

  if permitted {
    Ok(())
  } else {
    tracing::debug!(
      subject = subject.identifier(),
      action = kind.as_str(),
      identifier,
      "permission denied"
    );
    Err(Error::PermissionDenied)
  }
}

/// Validation hooks run before each mutating operation.
///
/// The defaults perform the standard permission checks: type-level create
/// permission before insert, UPDATE before update, DELETE before delete.
pub trait AccessPolicy<B: DirectoryBacking>: Send + Sync {
  /// Final point of validation before an object is created.
  fn before_create<'a>(
    &'a self,
    backing: &'a B,
    subject: &'a Subject,
    _model: &'a B::Model,
  ) -> impl Future<Output = Result<()>> + Send + 'a {
    async move {
      if !subject.is_administrator()
        && !backing.has_create_permission(subject).await?
      {
        return Err(Error::PermissionDenied);
      }
      Ok(())
    }
  }

  /// Final point of validation before an object is updated.
  fn before_update<'a>(
    &'a self,
    backing: &'a B,
    subject: &'a Subject,
    model: &'a B::Model,
  ) -> impl Future<Output = Result<()>> + Send + 'a {
    authorize(backing, subject, PermissionKind::Update, model.identifier())
  }

  /// Final point of validation before an object is deleted.
  fn before_delete<'a>(
    &'a self,
    backing: &'a B,
    subject: &'a Subject,
    identifier: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a {
    authorize(backing, subject, PermissionKind::Delete, identifier)
  }
}

/// The standard policy: nothing beyond the default permission checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl<B: DirectoryBacking> AccessPolicy<B> for DefaultPolicy {}
