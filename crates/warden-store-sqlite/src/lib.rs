//! SQLite backend for the Warden directory layer.
//!
//! Implements the `warden-core` mapper traits for the user and connection
//! entity types, and provides ready-made
//! [`DirectoryService`](warden_core::service::DirectoryService) constructors
//! in [`backing`]. Wraps [`tokio_rusqlite`] so all database access runs on a
//! dedicated thread without blocking the async runtime.
//!
//! A create persists the record and its creator grants inside one
//! transaction; a failed grant write rolls the record back rather than leave
//! an object nobody can see.

mod encode;
mod schema;

pub mod backing;
pub mod connections;
pub mod error;
pub mod permissions;
pub mod store;
pub mod users;

pub use backing::{
  ConnectionBacking, UserBacking, connection_service, user_service,
};
pub use error::{Error, Result};
pub use store::SqliteStore;
