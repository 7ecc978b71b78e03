use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewer_models::{PullRequest, Team, User};

use crate::RepositoryError;

/// Store-assigned surrogate key of a team row.
pub type TeamId = i64;

#[async_trait]
pub trait TeamRepository: Send {
    /// Insert a team row (members are written through [`UserRepository`]).
    async fn create(&mut self, team: &Team) -> Result<TeamId, RepositoryError>;

    /// Load a team with all of its members.
    async fn get_by_name(&mut self, name: &str) -> Result<Option<Team>, RepositoryError>;

    async fn exists(&mut self, name: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send {
    async fn create(&mut self, user: &User, team_id: TeamId) -> Result<(), RepositoryError>;

    async fn get_by_id(&mut self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Overwrite username, active flag and team of an existing user.
    async fn update(&mut self, user: &User, team_id: TeamId)
    -> Result<Option<User>, RepositoryError>;

    async fn set_active(&mut self, id: &str, is_active: bool)
    -> Result<Option<User>, RepositoryError>;

    /// Active members of `user_id`'s team, excluding `user_id` itself,
    /// ordered by username. Users without a team have no teammates.
    async fn get_active_teammates(&mut self, user_id: &str) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait PullRequestRepository: Send {
    /// Insert the pull request together with one reviewer row per entry of
    /// `assigned_reviewers`.
    async fn create(&mut self, pr: &PullRequest) -> Result<PullRequest, RepositoryError>;

    /// Mark an open pull request as merged at `merged_at`.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::NotFound`] if no such pull request exists
    /// * [`RepositoryError::Conflict`] if it is no longer open
    async fn merge(
        &mut self,
        id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError>;

    /// Replace the reviewer row of `old_reviewer_id` with one for
    /// `new_reviewer_id`.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::Conflict`] if `old_reviewer_id` is no longer
    ///   assigned or `new_reviewer_id` already is
    async fn reassign(
        &mut self,
        id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest, RepositoryError>;

    async fn get_by_id(&mut self, id: &str) -> Result<Option<PullRequest>, RepositoryError>;

    async fn get_reviewers(&mut self, id: &str) -> Result<Vec<User>, RepositoryError>;

    /// Pull requests `user_id` currently reviews, newest first. Reviewer
    /// lists are not populated.
    async fn get_for_reviewer(&mut self, user_id: &str)
    -> Result<Vec<PullRequest>, RepositoryError>;
}

/// One transactional boundary over the three repositories.
///
/// Repository calls made before [`UnitOfWork::begin`] run in autocommit
/// mode. After `begin`, everything up to [`UnitOfWork::commit`] or
/// [`UnitOfWork::rollback`] is atomic.
#[async_trait]
pub trait UnitOfWork: Send {
    fn teams(&mut self) -> &mut dyn TeamRepository;

    fn users(&mut self) -> &mut dyn UserRepository;

    fn pull_requests(&mut self) -> &mut dyn PullRequestRepository;

    /// # Errors
    ///
    /// Fails if a transaction is already open or the store refuses one.
    async fn begin(&mut self) -> Result<(), RepositoryError>;

    /// # Errors
    ///
    /// Fails if no transaction is open or the store fails to commit.
    async fn commit(&mut self) -> Result<(), RepositoryError>;

    /// Discard the open transaction. A no-op when none is open.
    ///
    /// # Errors
    ///
    /// Fails if the store fails to roll back.
    async fn rollback(&mut self) -> Result<(), RepositoryError>;

    /// Release the unit of work, rolling back anything not committed.
    /// Always safe to call.
    ///
    /// # Errors
    ///
    /// Fails if the implicit rollback fails.
    async fn close(&mut self) -> Result<(), RepositoryError> {
        self.rollback().await
    }
}

/// Hands out a fresh [`UnitOfWork`] per logical operation.
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// # Errors
    ///
    /// Fails if the store cannot provide a unit of work.
    async fn create(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;
}
