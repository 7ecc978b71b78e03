#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod error;

use chrono::{DateTime, Utc};
use reviewer_models::{PrStatus, PullRequest, Team, User};
use serde::{Deserialize, Serialize};

pub use error::{ErrorBody, ErrorCode, ErrorResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBody {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            is_active: user.is_active,
            team_name: user.team_name,
        }
    }
}

impl From<UserBody> for User {
    fn from(body: UserBody) -> Self {
        Self {
            id: body.user_id,
            username: body.username,
            is_active: body.is_active,
            team_name: body.team_name,
        }
    }
}

/// Team member as sent and returned by `/team/*`; the team is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamBody {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

impl From<Team> for TeamBody {
    fn from(team: Team) -> Self {
        Self {
            team_name: team.name,
            members: team
                .members
                .into_iter()
                .map(|user| TeamMember {
                    user_id: user.id,
                    username: user.username,
                    is_active: user.is_active,
                })
                .collect(),
        }
    }
}

impl From<TeamBody> for Team {
    fn from(body: TeamBody) -> Self {
        let members = body
            .members
            .into_iter()
            .map(|member| User::new(member.user_id, member.username, member.is_active))
            .collect();
        Self::new(body.team_name, members)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestBody {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<String>,
    #[serde(
        rename = "mergedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestBody {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: pr.assigned_reviewers,
            merged_at: pr.merged_at,
        }
    }
}

/// Listing form of a pull request, without reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
}

impl From<PullRequest> for PullRequestShort {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamQuery {
    #[serde(default)]
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

impl From<CreatePullRequestRequest> for PullRequest {
    fn from(request: CreatePullRequestRequest) -> Self {
        Self::new(
            request.pull_request_id,
            request.pull_request_name,
            request.author_id,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_reviewer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResponse {
    pub team: TeamBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequestsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestResponse {
    pub pr: PullRequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignResponse {
    pub pr: PullRequestBody,
    pub replaced_by: String,
}
