#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Domain models for PR Reviewer.
//!
//! Teams group users, users author and review pull requests. The types here
//! carry no persistence or transport concerns beyond `serde` derives.

pub mod error;
pub mod pr;
pub mod team;
pub mod user;

pub use error::ValidationError;
pub use pr::{PrStatus, PullRequest};
pub use team::Team;
pub use user::User;
