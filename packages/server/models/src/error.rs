use serde::{Deserialize, Serialize};

use crate::PullRequestBody;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    TeamExists,
    NotFound,
    PrExists,
    PrMerged,
    NotAssigned,
    NoCandidate,
    Cancelled,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// `{"error": {...}}`, plus the unchanged pull request on a merge conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr: Option<PullRequestBody>,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
            },
            pr: None,
        }
    }

    #[must_use]
    pub fn with_pr(mut self, pr: Option<PullRequestBody>) -> Self {
        self.pr = pr;
        self
    }
}
