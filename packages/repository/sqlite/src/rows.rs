use chrono::{DateTime, Utc};
use reviewer_models::{PrStatus, PullRequest, User};
use reviewer_repository::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub is_active: bool,
    pub team_name: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            is_active: row.is_active,
            team_name: row.team_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PullRequestRow {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRow {
    pub fn into_pull_request(
        self,
        assigned_reviewers: Vec<String>,
    ) -> Result<PullRequest, RepositoryError> {
        let status = self
            .status
            .parse::<PrStatus>()
            .map_err(RepositoryError::backend)?;

        Ok(PullRequest {
            id: self.id,
            name: self.name,
            author_id: self.author_id,
            status,
            assigned_reviewers,
            created_at: Some(self.created_at),
            merged_at: self.merged_at,
        })
    }
}
