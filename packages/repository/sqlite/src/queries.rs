use chrono::{DateTime, Utc};
use reviewer_models::{PrStatus, PullRequest, Team, User};
use reviewer_repository::{RepositoryError, TeamId};
use sqlx::SqliteConnection;

use crate::rows::{PullRequestRow, UserRow};

const USER_COLUMNS: &str = "u.id, u.username, u.is_active, t.name AS team_name";

const PULL_REQUEST_COLUMNS: &str =
    "pr.id, pr.name, pr.author_id, pr.status, pr.created_at, pr.merged_at";

/// Unique and primary key violations become [`RepositoryError::Conflict`],
/// everything else is a backend failure.
pub fn map_sqlx_error(error: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_error) = &error
        && db_error.is_unique_violation()
    {
        return RepositoryError::Conflict(db_error.message().to_string());
    }
    RepositoryError::backend(error)
}

fn pull_request_not_found(id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "pull request",
        id: id.to_string(),
    }
}

pub async fn create_team(
    conn: &mut SqliteConnection,
    team: &Team,
) -> Result<TeamId, RepositoryError> {
    let result = sqlx::query("INSERT INTO teams (name) VALUES (?)")
        .bind(&team.name)
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(result.last_insert_rowid())
}

pub async fn team_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool, RepositoryError> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE name = ?)")
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(map_sqlx_error)
}

pub async fn team_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Team>, RepositoryError> {
    let team_id: Option<TeamId> = sqlx::query_scalar("SELECT id FROM teams WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    let Some(team_id) = team_id else {
        return Ok(None);
    };

    let members: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         LEFT JOIN teams t ON t.id = u.team_id
         WHERE u.team_id = ?
         ORDER BY u.id"
    ))
    .bind(team_id)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(Some(Team::new(
        name,
        members.into_iter().map(User::from).collect(),
    )))
}

pub async fn create_user(
    conn: &mut SqliteConnection,
    user: &User,
    team_id: TeamId,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO users (id, username, is_active, team_id) VALUES (?, ?, ?, ?)")
        .bind(&user.id)
        .bind(&user.username)
        .bind(user.is_active)
        .bind(team_id)
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(())
}

pub async fn user_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<User>, RepositoryError> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         LEFT JOIN teams t ON t.id = u.team_id
         WHERE u.id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.map(User::from))
}

pub async fn update_user(
    conn: &mut SqliteConnection,
    user: &User,
    team_id: TeamId,
) -> Result<Option<User>, RepositoryError> {
    let result = sqlx::query("UPDATE users SET username = ?, is_active = ?, team_id = ? WHERE id = ?")
        .bind(&user.username)
        .bind(user.is_active)
        .bind(team_id)
        .bind(&user.id)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    user_by_id(conn, &user.id).await
}

pub async fn set_user_active(
    conn: &mut SqliteConnection,
    id: &str,
    is_active: bool,
) -> Result<Option<User>, RepositoryError> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    user_by_id(conn, id).await
}

pub async fn active_teammates(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<User>, RepositoryError> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         INNER JOIN users me ON me.team_id = u.team_id
         LEFT JOIN teams t ON t.id = u.team_id
         WHERE me.id = ? AND u.id <> me.id AND u.is_active = 1
         ORDER BY u.username, u.id"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(User::from).collect())
}

async fn reviewer_ids(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<String>, RepositoryError> {
    sqlx::query_scalar(
        "SELECT reviewer_id FROM pull_requests_reviewers
         WHERE pull_request_id = ?
         ORDER BY rowid",
    )
    .bind(pull_request_id)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx_error)
}

async fn is_assigned(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
) -> Result<bool, RepositoryError> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pull_requests_reviewers
         WHERE pull_request_id = ? AND reviewer_id = ?)",
    )
    .bind(pull_request_id)
    .bind(reviewer_id)
    .fetch_one(conn)
    .await
    .map_err(map_sqlx_error)
}

async fn insert_reviewer(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO pull_requests_reviewers (pull_request_id, reviewer_id) VALUES (?, ?)")
        .bind(pull_request_id)
        .bind(reviewer_id)
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(())
}

pub async fn pull_request_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<PullRequest>, RepositoryError> {
    let row: Option<PullRequestRow> = sqlx::query_as(&format!(
        "SELECT {PULL_REQUEST_COLUMNS} FROM pull_requests pr WHERE pr.id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let Some(row) = row else {
        return Ok(None);
    };
    let reviewers = reviewer_ids(conn, id).await?;

    row.into_pull_request(reviewers).map(Some)
}

pub async fn create_pull_request(
    conn: &mut SqliteConnection,
    pr: &PullRequest,
) -> Result<PullRequest, RepositoryError> {
    sqlx::query(
        "INSERT INTO pull_requests (id, name, author_id, status, created_at, merged_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&pr.id)
    .bind(&pr.name)
    .bind(&pr.author_id)
    .bind(pr.status.as_ref())
    .bind(pr.created_at.unwrap_or_else(Utc::now))
    .bind(pr.merged_at)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    for reviewer_id in &pr.assigned_reviewers {
        insert_reviewer(&mut *conn, &pr.id, reviewer_id).await?;
    }

    pull_request_by_id(conn, &pr.id)
        .await?
        .ok_or_else(|| pull_request_not_found(&pr.id))
}

pub async fn merge_pull_request(
    conn: &mut SqliteConnection,
    id: &str,
    merged_at: DateTime<Utc>,
) -> Result<PullRequest, RepositoryError> {
    let result = sqlx::query(
        "UPDATE pull_requests SET status = ?, merged_at = ?
         WHERE id = ? AND status = ?",
    )
    .bind(PrStatus::Merged.as_ref())
    .bind(merged_at)
    .bind(id)
    .bind(PrStatus::Open.as_ref())
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return match pull_request_by_id(conn, id).await? {
            Some(_) => Err(RepositoryError::Conflict(format!(
                "pull request {id} is not open"
            ))),
            None => Err(pull_request_not_found(id)),
        };
    }

    pull_request_by_id(conn, id)
        .await?
        .ok_or_else(|| pull_request_not_found(id))
}

pub async fn reassign_reviewer(
    conn: &mut SqliteConnection,
    id: &str,
    old_reviewer_id: &str,
    new_reviewer_id: &str,
) -> Result<PullRequest, RepositoryError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pull_requests WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    if !exists {
        return Err(pull_request_not_found(id));
    }
    if is_assigned(&mut *conn, id, new_reviewer_id).await? {
        return Err(RepositoryError::Conflict(format!(
            "{new_reviewer_id} is already assigned to {id}"
        )));
    }

    let deleted = sqlx::query(
        "DELETE FROM pull_requests_reviewers WHERE pull_request_id = ? AND reviewer_id = ?",
    )
    .bind(id)
    .bind(old_reviewer_id)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;
    if deleted.rows_affected() != 1 {
        return Err(RepositoryError::Conflict(format!(
            "{old_reviewer_id} is not assigned to {id}"
        )));
    }

    insert_reviewer(&mut *conn, id, new_reviewer_id).await?;

    pull_request_by_id(conn, id)
        .await?
        .ok_or_else(|| pull_request_not_found(id))
}

pub async fn reviewers(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<User>, RepositoryError> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         INNER JOIN pull_requests_reviewers prr ON prr.reviewer_id = u.id
         LEFT JOIN teams t ON t.id = u.team_id
         WHERE prr.pull_request_id = ?
         ORDER BY prr.rowid"
    ))
    .bind(pull_request_id)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(User::from).collect())
}

pub async fn pull_requests_for_reviewer(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<PullRequest>, RepositoryError> {
    let rows: Vec<PullRequestRow> = sqlx::query_as(&format!(
        "SELECT {PULL_REQUEST_COLUMNS} FROM pull_requests pr
         INNER JOIN pull_requests_reviewers prr ON prr.pull_request_id = pr.id
         WHERE prr.reviewer_id = ?
         ORDER BY pr.created_at DESC, pr.rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx_error)?;

    rows.into_iter()
        .map(|row| row.into_pull_request(vec![]))
        .collect()
}
