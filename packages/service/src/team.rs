use std::sync::Arc;

use reviewer_models::{Team, ValidationError};
use reviewer_repository::{RepositoryError, UnitOfWork, UnitOfWorkFactory};

use crate::error::internal;
use crate::transaction::{close, finish, open};
use crate::{RequestContext, ServiceError};

#[derive(Clone)]
pub struct TeamService {
    factory: Arc<dyn UnitOfWorkFactory>,
}

impl TeamService {
    #[must_use]
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { factory }
    }

    /// Create a team and put every member into it, creating unknown users
    /// and moving or updating known ones.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if the name or member list is empty
    /// * [`ServiceError::TeamExists`] if the name is taken
    /// * [`ServiceError::Cancelled`] if `ctx` is done before work starts
    /// * [`ServiceError::Internal`] on storage failure
    pub async fn create_team(&self, ctx: &RequestContext, team: Team) -> Result<Team, ServiceError> {
        team.validate()?;

        let mut uow = open(self.factory.as_ref(), ctx, "create_team", true).await?;
        let outcome = Self::create_in(uow.as_mut(), team).await;
        let created = finish(uow, "create_team", outcome).await?;

        log::info!(
            "create_team: created {} with {} member(s)",
            created.name,
            created.members.len()
        );

        Ok(created)
    }

    async fn create_in(uow: &mut dyn UnitOfWork, team: Team) -> Result<Team, ServiceError> {
        const OPERATION: &str = "create_team";

        let exists = uow
            .teams()
            .exists(&team.name)
            .await
            .map_err(internal(OPERATION, &team.name))?;
        if exists {
            return Err(ServiceError::TeamExists);
        }

        let team_id = uow.teams().create(&team).await.map_err(|error| match error {
            RepositoryError::Conflict(_) => ServiceError::TeamExists,
            error => internal(OPERATION, &team.name)(error),
        })?;

        for member in &team.members {
            let member = member.clone().with_team(&team.name);
            let existing = uow
                .users()
                .get_by_id(&member.id)
                .await
                .map_err(internal(OPERATION, &member.id))?;

            match existing {
                None => {
                    log::debug!("{OPERATION}: creating user {}", member.id);
                    uow.users()
                        .create(&member, team_id)
                        .await
                        .map_err(internal(OPERATION, &member.id))?;
                }
                Some(existing) if !existing.same_profile(&member) => {
                    log::debug!("{OPERATION}: updating user {}", member.id);
                    uow.users()
                        .update(&member, team_id)
                        .await
                        .map_err(internal(OPERATION, &member.id))?;
                }
                Some(_) => {}
            }
        }

        uow.teams()
            .get_by_name(&team.name)
            .await
            .map_err(internal(OPERATION, &team.name))?
            .ok_or(ServiceError::TeamNotFound)
    }

    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if `name` is empty
    /// * [`ServiceError::TeamNotFound`] if no such team exists
    /// * [`ServiceError::Cancelled`] if `ctx` is done before work starts
    /// * [`ServiceError::Internal`] on storage failure
    pub async fn get_team(&self, ctx: &RequestContext, name: &str) -> Result<Team, ServiceError> {
        if name.is_empty() {
            return Err(ValidationError::TeamNameEmpty.into());
        }

        let mut uow = open(self.factory.as_ref(), ctx, "get_team", false).await?;
        let result = uow
            .teams()
            .get_by_name(name)
            .await
            .map_err(internal("get_team", name));
        close(uow, "get_team").await;

        result?.ok_or(ServiceError::TeamNotFound)
    }
}
