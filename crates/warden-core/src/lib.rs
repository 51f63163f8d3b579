//! Core types and trait definitions for the Warden directory layer.
//!
//! Warden provides permission-enforcing access to directory-style entities
//! (users, connections) stored in a relational database. Every operation on
//! the generic [`service::DirectoryService`] authorizes the calling
//! [`subject::Subject`] before it touches storage.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! (e.g. `warden-store-sqlite`) implement the mapper traits in [`mapper`] and
//! [`permission`]; this crate supplies the policy layer above them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod connection;
pub mod error;
pub mod mapper;
pub mod object;
pub mod permission;
pub mod policy;
pub mod service;
pub mod subject;
pub mod user;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
