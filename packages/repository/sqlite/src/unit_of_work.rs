use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewer_models::{PullRequest, Team, User};
use reviewer_repository::{
    PullRequestRepository, RepositoryError, TeamId, TeamRepository, UnitOfWork, UserRepository,
};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::queries;

const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

/// Unit of work over one pooled connection.
///
/// Outside a transaction, calls share a connection acquired on first use.
/// `begin` releases that connection and starts a pool transaction instead.
/// Dropping an uncommitted transaction rolls it back.
///
/// Transactions take the write lock up front (`BEGIN IMMEDIATE`), so a
/// second writer waits for the first to finish and then reads its
/// committed state instead of failing on a stale WAL snapshot.
pub struct SqliteUnitOfWork {
    pool: SqlitePool,
    conn: Option<PoolConnection<Sqlite>>,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteUnitOfWork {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            conn: None,
            tx: None,
        }
    }

    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    async fn connection(&mut self) -> Result<&mut SqliteConnection, RepositoryError> {
        if self.tx.is_none() && self.conn.is_none() {
            let conn = self.pool.acquire().await.map_err(RepositoryError::backend)?;
            self.conn = Some(conn);
        }

        match (&mut self.tx, &mut self.conn) {
            (Some(tx), _) => Ok(&mut **tx),
            (None, Some(conn)) => Ok(&mut **conn),
            (None, None) => Err(RepositoryError::Transaction("no connection available")),
        }
    }
}

#[async_trait]
impl TeamRepository for SqliteUnitOfWork {
    async fn create(&mut self, team: &Team) -> Result<TeamId, RepositoryError> {
        queries::create_team(self.connection().await?, team).await
    }

    async fn get_by_name(&mut self, name: &str) -> Result<Option<Team>, RepositoryError> {
        queries::team_by_name(self.connection().await?, name).await
    }

    async fn exists(&mut self, name: &str) -> Result<bool, RepositoryError> {
        queries::team_exists(self.connection().await?, name).await
    }
}

#[async_trait]
impl UserRepository for SqliteUnitOfWork {
    async fn create(&mut self, user: &User, team_id: TeamId) -> Result<(), RepositoryError> {
        queries::create_user(self.connection().await?, user, team_id).await
    }

    async fn get_by_id(&mut self, id: &str) -> Result<Option<User>, RepositoryError> {
        queries::user_by_id(self.connection().await?, id).await
    }

    async fn update(
        &mut self,
        user: &User,
        team_id: TeamId,
    ) -> Result<Option<User>, RepositoryError> {
        queries::update_user(self.connection().await?, user, team_id).await
    }

    async fn set_active(
        &mut self,
        id: &str,
        is_active: bool,
    ) -> Result<Option<User>, RepositoryError> {
        queries::set_user_active(self.connection().await?, id, is_active).await
    }

    async fn get_active_teammates(&mut self, user_id: &str) -> Result<Vec<User>, RepositoryError> {
        queries::active_teammates(self.connection().await?, user_id).await
    }
}

#[async_trait]
impl PullRequestRepository for SqliteUnitOfWork {
    async fn create(&mut self, pr: &PullRequest) -> Result<PullRequest, RepositoryError> {
        queries::create_pull_request(self.connection().await?, pr).await
    }

    async fn merge(
        &mut self,
        id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError> {
        queries::merge_pull_request(self.connection().await?, id, merged_at).await
    }

    async fn reassign(
        &mut self,
        id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest, RepositoryError> {
        queries::reassign_reviewer(
            self.connection().await?,
            id,
            old_reviewer_id,
            new_reviewer_id,
        )
        .await
    }

    async fn get_by_id(&mut self, id: &str) -> Result<Option<PullRequest>, RepositoryError> {
        queries::pull_request_by_id(self.connection().await?, id).await
    }

    async fn get_reviewers(&mut self, id: &str) -> Result<Vec<User>, RepositoryError> {
        queries::reviewers(self.connection().await?, id).await
    }

    async fn get_for_reviewer(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PullRequest>, RepositoryError> {
        queries::pull_requests_for_reviewer(self.connection().await?, user_id).await
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
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

        self.conn = None;
        let tx = self
            .pool
            .begin_with(BEGIN_IMMEDIATE)
            .await
            .map_err(RepositoryError::backend)?;
        self.tx = Some(tx);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        let Some(tx) = self.tx.take() else {
            return Err(RepositoryError::Transaction("no transaction to commit"));
        };

        tx.commit().await.map_err(RepositoryError::backend)
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(RepositoryError::backend),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), RepositoryError> {
        let result = self.rollback().await;
        self.conn = None;
        result
    }
}
