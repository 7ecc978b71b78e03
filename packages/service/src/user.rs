use std::sync::Arc;

use reviewer_models::{PullRequest, User, ValidationError};
use reviewer_repository::UnitOfWorkFactory;

use crate::error::internal;
use crate::transaction::{close, open};
use crate::{RequestContext, ServiceError};

#[derive(Clone)]
pub struct UserService {
    factory: Arc<dyn UnitOfWorkFactory>,
}

impl UserService {
    #[must_use]
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { factory }
    }

    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if `user_id` is empty
    /// * [`ServiceError::UserNotFound`] if no such user exists
    /// * [`ServiceError::Cancelled`] if `ctx` is done before work starts
    /// * [`ServiceError::Internal`] on storage failure
    pub async fn set_is_active(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        is_active: bool,
    ) -> Result<User, ServiceError> {
        if user_id.is_empty() {
            return Err(ValidationError::EmptyUserId.into());
        }

        let mut uow = open(self.factory.as_ref(), ctx, "set_is_active", false).await?;
        let result = uow
            .users()
            .set_active(user_id, is_active)
            .await
            .map_err(internal("set_is_active", user_id));
        close(uow, "set_is_active").await;

        let user = result?.ok_or(ServiceError::UserNotFound)?;
        log::info!("set_is_active: {user_id} is_active={is_active}");

        Ok(user)
    }

    /// Pull requests `user_id` is currently assigned to review, newest
    /// first. Unknown users have none.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if `user_id` is empty
    /// * [`ServiceError::Cancelled`] if `ctx` is done before work starts
    /// * [`ServiceError::Internal`] on storage failure
    pub async fn get_review_requests(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<PullRequest>, ServiceError> {
        if user_id.is_empty() {
            return Err(ValidationError::EmptyUserId.into());
        }

        let mut uow = open(self.factory.as_ref(), ctx, "get_review_requests", false).await?;
        let result = uow
            .pull_requests()
            .get_for_reviewer(user_id)
            .await
            .map_err(internal("get_review_requests", user_id));
        close(uow, "get_review_requests").await;

        result
    }
}
