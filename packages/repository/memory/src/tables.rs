use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reviewer_models::{PrStatus, PullRequest, Team, User};
use reviewer_repository::{RepositoryError, TeamId};

#[derive(Debug, Clone)]
struct UserRow {
    username: String,
    is_active: bool,
    team_id: Option<TeamId>,
}

#[derive(Debug, Clone)]
struct PullRequestRow {
    name: String,
    author_id: String,
    status: PrStatus,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReviewerRow {
    pull_request_id: String,
    reviewer_id: String,
}

/// The whole data set. Cloned at `begin`, swapped back in at `commit`.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    last_team_id: TeamId,
    teams: BTreeMap<TeamId, String>,
    users: BTreeMap<String, UserRow>,
    pull_requests: BTreeMap<String, PullRequestRow>,
    /// Assignment rows in insertion order.
    reviewers: Vec<ReviewerRow>,
}

impl Tables {
    fn team_id(&self, name: &str) -> Option<TeamId> {
        self.teams
            .iter()
            .find_map(|(id, team_name)| (team_name == name).then_some(*id))
    }

    fn to_user(&self, id: &str, row: &UserRow) -> User {
        User {
            id: id.to_string(),
            username: row.username.clone(),
            is_active: row.is_active,
            team_name: row.team_id.and_then(|team_id| self.teams.get(&team_id).cloned()),
        }
    }

    fn reviewer_ids(&self, pull_request_id: &str) -> Vec<String> {
        self.reviewers
            .iter()
            .filter(|row| row.pull_request_id == pull_request_id)
            .map(|row| row.reviewer_id.clone())
            .collect()
    }

    fn is_assigned(&self, pull_request_id: &str, reviewer_id: &str) -> bool {
        self.reviewers
            .iter()
            .any(|row| row.pull_request_id == pull_request_id && row.reviewer_id == reviewer_id)
    }

    fn to_pull_request(&self, id: &str, row: &PullRequestRow, with_reviewers: bool) -> PullRequest {
        PullRequest {
            id: id.to_string(),
            name: row.name.clone(),
            author_id: row.author_id.clone(),
            status: row.status,
            assigned_reviewers: if with_reviewers {
                self.reviewer_ids(id)
            } else {
                vec![]
            },
            created_at: Some(row.created_at),
            merged_at: row.merged_at,
        }
    }

    pub fn create_team(&mut self, team: &Team) -> Result<TeamId, RepositoryError> {
        if self.team_id(&team.name).is_some() {
            return Err(RepositoryError::Conflict(format!(
                "team {} already exists",
                team.name
            )));
        }
        self.last_team_id += 1;
        self.teams.insert(self.last_team_id, team.name.clone());
        Ok(self.last_team_id)
    }

    pub fn team_exists(&self, name: &str) -> bool {
        self.team_id(name).is_some()
    }

    pub fn team_by_name(&self, name: &str) -> Option<Team> {
        let team_id = self.team_id(name)?;
        let members = self
            .users
            .iter()
            .filter(|(_, row)| row.team_id == Some(team_id))
            .map(|(id, row)| self.to_user(id, row))
            .collect();

        Some(Team::new(name, members))
    }

    pub fn create_user(&mut self, user: &User, team_id: TeamId) -> Result<(), RepositoryError> {
        if self.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!(
                "user {} already exists",
                user.id
            )));
        }
        self.users.insert(
            user.id.clone(),
            UserRow {
                username: user.username.clone(),
                is_active: user.is_active,
                team_id: Some(team_id),
            },
        );
        Ok(())
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|row| self.to_user(id, row))
    }

    pub fn update_user(&mut self, user: &User, team_id: TeamId) -> Option<User> {
        let row = self.users.get_mut(&user.id)?;
        row.username.clone_from(&user.username);
        row.is_active = user.is_active;
        row.team_id = Some(team_id);
        self.user(&user.id)
    }

    pub fn set_user_active(&mut self, id: &str, is_active: bool) -> Option<User> {
        self.users.get_mut(id)?.is_active = is_active;
        self.user(id)
    }

    pub fn active_teammates(&self, user_id: &str) -> Vec<User> {
        let Some(team_id) = self.users.get(user_id).and_then(|row| row.team_id) else {
            return vec![];
        };

        let mut teammates: Vec<User> = self
            .users
            .iter()
            .filter(|(id, row)| {
                id.as_str() != user_id && row.is_active && row.team_id == Some(team_id)
            })
            .map(|(id, row)| self.to_user(id, row))
            .collect();
        teammates.sort_by(|a, b| a.username.cmp(&b.username));
        teammates
    }

    pub fn create_pull_request(&mut self, pr: &PullRequest) -> Result<PullRequest, RepositoryError> {
        if self.pull_requests.contains_key(&pr.id) {
            return Err(RepositoryError::Conflict(format!(
                "pull request {} already exists",
                pr.id
            )));
        }
        for (index, reviewer_id) in pr.assigned_reviewers.iter().enumerate() {
            if pr.assigned_reviewers[..index].contains(reviewer_id) {
                return Err(RepositoryError::Conflict(format!(
                    "reviewer {reviewer_id} assigned twice to {}",
                    pr.id
                )));
            }
        }

        self.pull_requests.insert(
            pr.id.clone(),
            PullRequestRow {
                name: pr.name.clone(),
                author_id: pr.author_id.clone(),
                status: pr.status,
                created_at: pr.created_at.unwrap_or_else(Utc::now),
                merged_at: pr.merged_at,
            },
        );
        self.reviewers
            .extend(pr.assigned_reviewers.iter().map(|reviewer_id| ReviewerRow {
                pull_request_id: pr.id.clone(),
                reviewer_id: reviewer_id.clone(),
            }));

        self.pull_request(&pr.id)
            .ok_or_else(|| not_found_pull_request(&pr.id))
    }

    pub fn merge_pull_request(
        &mut self,
        id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError> {
        let row = self
            .pull_requests
            .get_mut(id)
            .ok_or_else(|| not_found_pull_request(id))?;
        if row.status != PrStatus::Open {
            return Err(RepositoryError::Conflict(format!(
                "pull request {id} is not open"
            )));
        }
        row.status = PrStatus::Merged;
        row.merged_at = Some(merged_at);

        self.pull_request(id).ok_or_else(|| not_found_pull_request(id))
    }

    pub fn reassign(
        &mut self,
        id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest, RepositoryError> {
        if !self.pull_requests.contains_key(id) {
            return Err(not_found_pull_request(id));
        }
        let Some(position) = self
            .reviewers
            .iter()
            .position(|row| row.pull_request_id == id && row.reviewer_id == old_reviewer_id)
        else {
            return Err(RepositoryError::Conflict(format!(
                "{old_reviewer_id} is not assigned to {id}"
            )));
        };
        if self.is_assigned(id, new_reviewer_id) {
            return Err(RepositoryError::Conflict(format!(
                "{new_reviewer_id} is already assigned to {id}"
            )));
        }

        self.reviewers.remove(position);
        self.reviewers.push(ReviewerRow {
            pull_request_id: id.to_string(),
            reviewer_id: new_reviewer_id.to_string(),
        });

        self.pull_request(id).ok_or_else(|| not_found_pull_request(id))
    }

    pub fn pull_request(&self, id: &str) -> Option<PullRequest> {
        self.pull_requests
            .get(id)
            .map(|row| self.to_pull_request(id, row, true))
    }

    pub fn reviewers(&self, pull_request_id: &str) -> Vec<User> {
        self.reviewer_ids(pull_request_id)
            .iter()
            .filter_map(|reviewer_id| self.user(reviewer_id))
            .collect()
    }

    pub fn pull_requests_for_reviewer(&self, user_id: &str) -> Vec<PullRequest> {
        let mut prs: Vec<PullRequest> = self
            .reviewers
            .iter()
            .filter(|row| row.reviewer_id == user_id)
            .filter_map(|row| {
                self.pull_requests
                    .get(&row.pull_request_id)
                    .map(|pr| self.to_pull_request(&row.pull_request_id, pr, false))
            })
            .collect();
        prs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        prs
    }
}

fn not_found_pull_request(id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "pull request",
        id: id.to_string(),
    }
}
