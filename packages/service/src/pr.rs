use std::sync::Arc;

use chrono::Utc;
use reviewer_models::{PrStatus, PullRequest, ValidationError};
use reviewer_repository::{RepositoryError, UnitOfWork, UnitOfWorkFactory};
use reviewer_selection::{MAX_REVIEWERS, filter_candidates, select_random};

use crate::error::internal;
use crate::transaction::{finish, open};
use crate::{RequestContext, ServiceError};

/// Creates, merges and reassigns reviewers on pull requests.
///
/// Every operation runs in its own unit of work and transaction; any
/// failure rolls the transaction back.
#[derive(Clone)]
pub struct PrService {
    factory: Arc<dyn UnitOfWorkFactory>,
}

impl PrService {
    #[must_use]
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { factory }
    }

    /// Create an open pull request and assign up to two random active
    /// teammates of the author as reviewers.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if id, name or author id is empty
    /// * [`ServiceError::UserNotFound`] if the author does not exist
    /// * [`ServiceError::TeamNotFound`] if the author has no team
    /// * [`ServiceError::PullRequestExists`] if the id is taken
    /// * [`ServiceError::Cancelled`] if `ctx` is done before work starts
    /// * [`ServiceError::Internal`] on storage failure
    pub async fn create_pr(
        &self,
        ctx: &RequestContext,
        pr: PullRequest,
    ) -> Result<PullRequest, ServiceError> {
        pr.validate()?;

        let mut uow = open(self.factory.as_ref(), ctx, "create_pr", true).await?;
        let outcome = Self::create_in(uow.as_mut(), pr).await;
        finish(uow, "create_pr", outcome).await
    }

    async fn create_in(
        uow: &mut dyn UnitOfWork,
        mut pr: PullRequest,
    ) -> Result<PullRequest, ServiceError> {
        let author = uow
            .users()
            .get_by_id(&pr.author_id)
            .await
            .map_err(internal("create_pr", &pr.author_id))?
            .ok_or(ServiceError::UserNotFound)?;
        if !author.has_team() {
            log::warn!("create_pr: author {} has no team", author.id);
            return Err(ServiceError::TeamNotFound);
        }

        let existing = uow
            .pull_requests()
            .get_by_id(&pr.id)
            .await
            .map_err(internal("create_pr", &pr.id))?;
        if existing.is_some() {
            return Err(ServiceError::PullRequestExists);
        }

        let teammates = uow
            .users()
            .get_active_teammates(&author.id)
            .await
            .map_err(internal("create_pr", &author.id))?;
        let reviewers = select_random(&teammates, MAX_REVIEWERS, &mut rand::thread_rng());

        pr.status = PrStatus::Open;
        pr.created_at = Some(Utc::now());
        pr.merged_at = None;
        pr.assigned_reviewers = reviewers.into_iter().map(|user| user.id).collect();

        let created = uow.pull_requests().create(&pr).await.map_err(|error| match error {
            RepositoryError::Conflict(_) => ServiceError::PullRequestExists,
            error => internal("create_pr", &pr.id)(error),
        })?;

        log::info!(
            "create_pr: created {} by {} with {} reviewer(s)",
            created.id,
            created.author_id,
            created.assigned_reviewers.len()
        );

        Ok(created)
    }

    /// Mark a pull request as merged.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if `id` is empty
    /// * [`ServiceError::PullRequestNotFound`] if it does not exist
    /// * [`ServiceError::PullRequestAlreadyMerged`] if it is already merged;
    ///   the error carries the stored record, see
    ///   [`ServiceError::pull_request`]
    /// * [`ServiceError::Cancelled`] if `ctx` is done before work starts
    /// * [`ServiceError::Internal`] on storage failure
    pub async fn merge(&self, ctx: &RequestContext, id: &str) -> Result<PullRequest, ServiceError> {
        if id.is_empty() {
            return Err(ValidationError::PullRequestIdEmpty.into());
        }

        let mut uow = open(self.factory.as_ref(), ctx, "merge", true).await?;
        let outcome = Self::merge_in(uow.as_mut(), id).await;
        finish(uow, "merge", outcome).await
    }

    async fn merge_in(uow: &mut dyn UnitOfWork, id: &str) -> Result<PullRequest, ServiceError> {
        let existing = uow
            .pull_requests()
            .get_by_id(id)
            .await
            .map_err(internal("merge", id))?
            .ok_or(ServiceError::PullRequestNotFound)?;
        if existing.is_merged() {
            log::debug!("merge: {id} already merged");
            return Err(ServiceError::already_merged(existing));
        }

        let result = uow.pull_requests().merge(id, Utc::now()).await;
        let merged = match result {
            Ok(merged) => merged,
            Err(RepositoryError::Conflict(reason)) => {
                log::warn!("merge: lost race on {id}: {reason}");
                let current = uow
                    .pull_requests()
                    .get_by_id(id)
                    .await
                    .map_err(internal("merge", id))?;
                return Err(ServiceError::PullRequestAlreadyMerged {
                    existing: current.map(Box::new),
                });
            }
            Err(RepositoryError::NotFound { .. }) => return Err(ServiceError::PullRequestNotFound),
            Err(error) => return Err(internal("merge", id)(error)),
        };

        log::info!("merge: merged {id}");

        Ok(merged)
    }

    /// Replace `old_reviewer_id` on a pull request with a random active
    /// teammate of theirs who is neither the author nor already assigned.
    ///
    /// Returns the updated pull request and the id of the new reviewer.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if either id is empty
    /// * [`ServiceError::PullRequestNotFound`] / [`ServiceError::UserNotFound`]
    /// * [`ServiceError::PullRequestAlreadyMerged`] if it is merged
    /// * [`ServiceError::UserNotReviewer`] if `old_reviewer_id` is not
    ///   assigned
    /// * [`ServiceError::NoCandidateToReassign`] if nobody is eligible
    /// * [`ServiceError::Cancelled`] if `ctx` is done before work starts
    /// * [`ServiceError::Internal`] on storage failure
    pub async fn reassign_reviewer(
        &self,
        ctx: &RequestContext,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String), ServiceError> {
        if pr_id.is_empty() {
            return Err(ValidationError::PullRequestIdEmpty.into());
        }
        if old_reviewer_id.is_empty() {
            return Err(ValidationError::EmptyUserId.into());
        }

        let mut uow = open(self.factory.as_ref(), ctx, "reassign_reviewer", true).await?;
        let outcome = Self::reassign_in(uow.as_mut(), pr_id, old_reviewer_id).await;
        finish(uow, "reassign_reviewer", outcome).await
    }

    async fn reassign_in(
        uow: &mut dyn UnitOfWork,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String), ServiceError> {
        const OPERATION: &str = "reassign_reviewer";

        let pr = uow
            .pull_requests()
            .get_by_id(pr_id)
            .await
            .map_err(internal(OPERATION, pr_id))?
            .ok_or(ServiceError::PullRequestNotFound)?;
        uow.users()
            .get_by_id(old_reviewer_id)
            .await
            .map_err(internal(OPERATION, old_reviewer_id))?
            .ok_or(ServiceError::UserNotFound)?;

        if pr.is_merged() {
            return Err(ServiceError::PullRequestAlreadyMerged { existing: None });
        }
        let reviewers = uow
            .pull_requests()
            .get_reviewers(pr_id)
            .await
            .map_err(internal(OPERATION, pr_id))?;
        if !reviewers.iter().any(|reviewer| reviewer.id == old_reviewer_id) {
            return Err(ServiceError::UserNotReviewer);
        }

        let teammates = uow
            .users()
            .get_active_teammates(old_reviewer_id)
            .await
            .map_err(internal(OPERATION, old_reviewer_id))?;
        let candidates = filter_candidates(teammates, &pr, old_reviewer_id);
        let new_reviewer_id = select_random(&candidates, 1, &mut rand::thread_rng())
            .into_iter()
            .next()
            .map(|user| user.id)
            .ok_or(ServiceError::NoCandidateToReassign)?;

        let updated = uow
            .pull_requests()
            .reassign(pr_id, old_reviewer_id, &new_reviewer_id)
            .await
            .map_err(|error| match error {
                RepositoryError::Conflict(reason) => {
                    log::warn!("{OPERATION}: lost race on {pr_id}: {reason}");
                    ServiceError::UserNotReviewer
                }
                RepositoryError::NotFound { .. } => ServiceError::PullRequestNotFound,
                error => internal(OPERATION, pr_id)(error),
            })?;

        log::info!("{OPERATION}: {pr_id} reassigned from {old_reviewer_id} to {new_reviewer_id}");

        Ok((updated, new_reviewer_id))
    }
}
