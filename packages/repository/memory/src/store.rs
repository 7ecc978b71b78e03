use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewer_models::{PullRequest, Team, User};
use reviewer_repository::{
    PullRequestRepository, RepositoryError, TeamId, TeamRepository, UnitOfWork,
    UnitOfWorkFactory, UserRepository,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::tables::Tables;

/// Operations that can be made to fail on purpose, to exercise the error
/// paths of code running on top of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    Commit,
    CreateTeam,
    CreateUser,
    GetActiveTeammates,
    CreatePullRequest,
    MergePullRequest,
    Reassign,
}

#[derive(Debug, thiserror::Error)]
#[error("Injected failure at {0:?}")]
pub struct InjectedFailure(pub FailPoint);

/// Shared in-memory tables. Cloning is cheap and yields a handle to the
/// same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failures: Arc<std::sync::Mutex<HashSet<FailPoint>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `point` fail until
    /// [`MemoryStore::clear_failures`] is called.
    pub fn inject_failure(&self, point: FailPoint) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(point);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    #[must_use]
    pub fn unit_of_work(&self) -> MemoryUnitOfWork {
        MemoryUnitOfWork {
            store: self.clone(),
            tx: None,
        }
    }

    fn check(&self, point: FailPoint) -> Result<(), RepositoryError> {
        let armed = self
            .failures
            .lock()
            .is_ok_and(|failures| failures.contains(&point));

        if armed {
            log::debug!("memory store: failing {point:?} on request");
            Err(RepositoryError::backend(InjectedFailure(point)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryStore {
    async fn create(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        Ok(Box::new(self.unit_of_work()))
    }
}

struct OpenTransaction {
    /// Held for the lifetime of the transaction; other transactions and
    /// autocommit calls wait on it.
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

/// Unit of work over a [`MemoryStore`].
///
/// Dropping it with an open transaction discards the transaction.
pub struct MemoryUnitOfWork {
    store: MemoryStore,
    tx: Option<OpenTransaction>,
}

impl MemoryUnitOfWork {
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    async fn with_tables<T>(&mut self, op: impl FnOnce(&mut Tables) -> T + Send) -> T {
        if let Some(tx) = self.tx.as_mut() {
            return op(&mut tx.working);
        }
        let mut tables = self.store.tables.lock().await;
        op(&mut tables)
    }
}

#[async_trait]
impl TeamRepository for MemoryUnitOfWork {
    async fn create(&mut self, team: &Team) -> Result<TeamId, RepositoryError> {
        self.store.check(FailPoint::CreateTeam)?;
        self.with_tables(|tables| tables.create_team(team)).await
    }

    async fn get_by_name(&mut self, name: &str) -> Result<Option<Team>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.team_by_name(name)).await)
    }

    async fn exists(&mut self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self.with_tables(|tables| tables.team_exists(name)).await)
    }
}

#[async_trait]
impl UserRepository for MemoryUnitOfWork {
    async fn create(&mut self, user: &User, team_id: TeamId) -> Result<(), RepositoryError> {
        self.store.check(FailPoint::CreateUser)?;
        self.with_tables(|tables| tables.create_user(user, team_id))
            .await
    }

    async fn get_by_id(&mut self, id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.user(id)).await)
    }

    async fn update(
        &mut self,
        user: &User,
        team_id: TeamId,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .with_tables(|tables| tables.update_user(user, team_id))
            .await)
    }

    async fn set_active(
        &mut self,
        id: &str,
        is_active: bool,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .with_tables(|tables| tables.set_user_active(id, is_active))
            .await)
    }

    async fn get_active_teammates(&mut self, user_id: &str) -> Result<Vec<User>, RepositoryError> {
        self.store.check(FailPoint::GetActiveTeammates)?;
        Ok(self
            .with_tables(|tables| tables.active_teammates(user_id))
            .await)
    }
}

#[async_trait]
impl PullRequestRepository for MemoryUnitOfWork {
    async fn create(&mut self, pr: &PullRequest) -> Result<PullRequest, RepositoryError> {
        self.store.check(FailPoint::CreatePullRequest)?;
        self.with_tables(|tables| tables.create_pull_request(pr))
            .await
    }

    async fn merge(
        &mut self,
        id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError> {
        self.store.check(FailPoint::MergePullRequest)?;
        self.with_tables(|tables| tables.merge_pull_request(id, merged_at))
            .await
    }

    async fn reassign(
        &mut self,
        id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest, RepositoryError> {
        self.store.check(FailPoint::Reassign)?;
        self.with_tables(|tables| tables.reassign(id, old_reviewer_id, new_reviewer_id))
            .await
    }

    async fn get_by_id(&mut self, id: &str) -> Result<Option<PullRequest>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.pull_request(id)).await)
    }

    async fn get_reviewers(&mut self, id: &str) -> Result<Vec<User>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.reviewers(id)).await)
    }

    async fn get_for_reviewer(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PullRequest>, RepositoryError> {
        Ok(self
            .with_tables(|tables| tables.pull_requests_for_reviewer(user_id))
            .await)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn teams(&mut self) -> &mut dyn TeamRepository {
        self
    }

    fn users(&mut self) -> &mut dyn UserRepository {
        self
    }

    fn pull_requests(&mut self) -> &mut dyn PullRequestRepository {
        self
    }

    async fn begin(&mut self) -> Result<(), RepositoryError> {
        if self.tx.is_some() {
            return Err(RepositoryError::Transaction("transaction already started"));
        }
        self.store.check(FailPoint::Begin)?;

        let guard = Arc::clone(&self.store.tables).lock_owned().await;
        let working = guard.clone();
        self.tx = Some(OpenTransaction { guard, working });
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        let Some(OpenTransaction { mut guard, working }) = self.tx.take() else {
            return Err(RepositoryError::Transaction("no transaction to commit"));
        };
        self.store.check(FailPoint::Commit)?;

        *guard = working;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        if self.tx.take().is_some() {
            log::trace!("memory store: transaction rolled back");
        }
        Ok(())
    }
}
