use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: PrStatus,
    /// Ids of the currently assigned reviewers, in assignment order.
    pub assigned_reviewers: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Set iff `status` is [`PrStatus::Merged`].
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PrStatus {
    #[default]
    Open,
    Merged,
}

impl PullRequest {
    /// A new, not yet persisted, open pull request without reviewers.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author_id: author_id.into(),
            status: PrStatus::Open,
            assigned_reviewers: vec![],
            created_at: None,
            merged_at: None,
        }
    }

    /// # Errors
    ///
    /// Checks id, name and author id in that order and reports the first
    /// empty one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::PullRequestIdEmpty);
        }
        if self.name.is_empty() {
            return Err(ValidationError::PullRequestNameEmpty);
        }
        if self.author_id.is_empty() {
            return Err(ValidationError::AuthorIdEmpty);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }

    #[must_use]
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|id| id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn test_validate_valid_pr() {
        let pr = PullRequest::new("pr-1", "Feature implementation", "u1");
        assert_eq!(pr.validate(), Ok(()));
    }

    #[test]
    fn test_validate_empty_fields() {
        let pr = PullRequest::new("", "Feature implementation", "u1");
        assert_eq!(pr.validate(), Err(ValidationError::PullRequestIdEmpty));

        let pr = PullRequest::new("pr-1", "", "u1");
        assert_eq!(pr.validate(), Err(ValidationError::PullRequestNameEmpty));

        let pr = PullRequest::new("pr-1", "Feature implementation", "");
        assert_eq!(pr.validate(), Err(ValidationError::AuthorIdEmpty));
    }

    #[test]
    fn test_validate_reports_id_first() {
        let pr = PullRequest::new("", "", "");
        assert_eq!(pr.validate(), Err(ValidationError::PullRequestIdEmpty));
    }

    #[test]
    fn test_status_string_forms() {
        assert_eq!(PrStatus::Open.as_ref(), "OPEN");
        assert_eq!(PrStatus::Merged.to_string(), "MERGED");
        assert_eq!(PrStatus::from_str("MERGED").unwrap(), PrStatus::Merged);
        assert!(PrStatus::from_str("CLOSED").is_err());
    }

    #[test]
    fn test_status_serde_matches_strum() {
        let json = serde_json::to_string(&PrStatus::Merged).unwrap();
        assert_eq!(json, "\"MERGED\"");
    }

    #[test]
    fn test_has_reviewer() {
        let mut pr = PullRequest::new("pr-1", "Feature", "u1");
        pr.assigned_reviewers = vec!["u2".to_string(), "u3".to_string()];

        assert!(pr.has_reviewer("u2"));
        assert!(!pr.has_reviewer("u1"));
        assert!(!pr.is_merged());
    }
}
