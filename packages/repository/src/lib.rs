#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Persistence traits for PR Reviewer.
//!
//! Services never talk to a store directly. They obtain a [`UnitOfWork`]
//! from a [`UnitOfWorkFactory`], begin a transaction, and reach the team,
//! user and pull request repositories through it. Implementations live in
//! separate crates (in-memory, `SQLite`) so the services can be tested
//! against either.

mod error;
mod unit_of_work;

pub use error::RepositoryError;
pub use unit_of_work::{
    PullRequestRepository, TeamId, TeamRepository, UnitOfWork, UnitOfWorkFactory, UserRepository,
};
