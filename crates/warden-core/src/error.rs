//! Error types for `warden-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The subject is not allowed to perform the attempted operation.
  ///
  /// Carries no identifier: callers must not be able to tell a forbidden
  /// object apart from one that does not exist.
  #[error("permission denied")]
  PermissionDenied,

  /// More than one stored object claims the same identifier. Identifiers are
  /// unique per entity type, so this signals storage corruption and is never
  /// handled gracefully.
  #[error("multiple objects share identifier {identifier:?}")]
  DuplicateIdentifier { identifier: String },

  /// An error surfaced by a storage collaborator (mapper or permission set),
  /// propagated unmodified.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a collaborator error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
