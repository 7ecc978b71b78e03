#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory persistence for PR Reviewer.
//!
//! All units of work created from one [`MemoryStore`] share the same tables.
//! A transaction holds the store's lock from `begin` until `commit` or
//! `rollback` and works on a private copy of the tables, so transactions are
//! fully serialized and a rollback simply drops the copy.

mod store;
mod tables;

pub use store::{FailPoint, InjectedFailure, MemoryStore, MemoryUnitOfWork};
