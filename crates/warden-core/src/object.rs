//! Directory object abstractions.
//!
//! A *record* is the storage-row representation of an entity; an *object* is
//! the transient wrapper handed out by the service, bound to the subject that
//! requested it. Wrappers are recreated per request and never cached.

use crate::subject::Subject;

// ─── Record ──────────────────────────────────────────────────────────────────

/// A storage row with a unique string identifier and an opaque numeric id
/// assigned on insert.
pub trait DirectoryRecord: Send + Sync {
  /// The stable unique identifier, independent of the storage id.
  fn identifier(&self) -> &str;

  /// The numeric storage id; `None` until the record has been inserted.
  fn object_id(&self) -> Option<i64>;

  /// Set the numeric storage id. Called by mappers on insert.
  fn set_object_id(&mut self, id: i64);
}

// ─── Object ──────────────────────────────────────────────────────────────────

/// The service-facing wrapper around a record, exposing read/write access to
/// the underlying model.
pub trait DirectoryObject: Send + Sync {
  type Model: DirectoryRecord;

  fn model(&self) -> &Self::Model;
  fn model_mut(&mut self) -> &mut Self::Model;
  fn into_model(self) -> Self::Model;
}

/// Default [`DirectoryObject`] implementation: a record bound to the
/// identifier of the subject it was retrieved for.
#[derive(Debug, Clone)]
pub struct DirectoryEntry<M> {
  subject: String,
  model:   M,
}

impl<M> DirectoryEntry<M> {
  pub fn new(subject: &Subject, model: M) -> Self {
    Self {
      subject: subject.identifier().to_owned(),
      model,
    }
  }

  /// Identifier of the subject this entry was produced for.
  pub fn bound_subject(&self) -> &str {
    &self.subject
  }
}

impl<M: DirectoryRecord> DirectoryObject for DirectoryEntry<M> {
  type Model = M;

  fn model(&self) -> &M {
    &self.model
  }

  fn model_mut(&mut self) -> &mut M {
    &mut self.model
  }

  fn into_model(self) -> M {
    self.model
  }
}
