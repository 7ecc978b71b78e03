#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Business operations of PR Reviewer.
//!
//! Services hold nothing but a shared [`UnitOfWorkFactory`]. Each call
//! takes a [`RequestContext`]; if the context is done before the unit of
//! work is open, the call fails with [`ServiceError::Cancelled`] without
//! touching storage.

mod context;
mod error;
mod pr;
mod team;
mod transaction;
mod user;

use std::sync::Arc;

use reviewer_repository::UnitOfWorkFactory;

pub use context::RequestContext;
pub use error::{ErrorKind, ServiceError};
pub use pr::PrService;
pub use team::TeamService;
pub use user::UserService;

/// The three services over one store.
#[derive(Clone)]
pub struct Services {
    pub pull_requests: PrService,
    pub teams: TeamService,
    pub users: UserService,
}

impl Services {
    #[must_use]
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            pull_requests: PrService::new(Arc::clone(&factory)),
            teams: TeamService::new(Arc::clone(&factory)),
            users: UserService::new(factory),
        }
    }
}
