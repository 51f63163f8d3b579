//! Object permission types.
//!
//! A permission is a triple of (subject, object, action). Grants are additive:
//! absence of a grant is denial, unless the subject is an administrator, in
//! which case per-object checks are bypassed entirely (see
//! [`crate::policy::authorize`]).

use std::future::Future;

use serde::{Deserialize, Serialize};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// The action a permission grants on a directory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
  Read,
  Update,
  Delete,
  Administer,
}

impl PermissionKind {
  /// Stable lowercase encoding, used both for logging and storage.
  pub fn as_str(self) -> &'static str {
    match self {
      PermissionKind::Read => "read",
      PermissionKind::Update => "update",
      PermissionKind::Delete => "delete",
      PermissionKind::Administer => "administer",
    }
  }
}

/// Permissions granted to an object's creator as a side effect of creation.
///
/// This is configuration data, not logic: an entity type that needs a
/// different bundle overrides
/// [`creator_grants`](crate::service::DirectoryBacking::creator_grants).
pub const CREATOR_GRANTS: &[PermissionKind] = &[
  PermissionKind::Read,
  PermissionKind::Update,
  PermissionKind::Delete,
  PermissionKind::Administer,
];

// ─── Grants ──────────────────────────────────────────────────────────────────

/// One stored permission grant: subject × object × action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
  /// Numeric storage id of the subject holding the grant.
  pub subject_id:         i64,
  /// Identifier of the subject holding the grant.
  pub subject_identifier: String,
  /// The granted action.
  pub kind:               PermissionKind,
  /// Identifier of the object the grant applies to.
  pub object_identifier:  String,
}

// ─── Permission set ──────────────────────────────────────────────────────────

/// A per-subject view of object permissions: "does this subject hold
/// permission `kind` on object `identifier`?"
///
/// Instances are created per request by a
/// [`DirectoryBacking`](crate::service::DirectoryBacking) and are never cached
/// across requests.
pub trait PermissionSet: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn has_permission<'a>(
    &'a self,
    kind: PermissionKind,
    identifier: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
