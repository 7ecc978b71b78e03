use reviewer_models::{PullRequest, ValidationError};
use reviewer_repository::RepositoryError;

/// Coarse classification of [`ServiceError`] for callers that map errors to
/// transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    /// The entity being created already exists.
    ConflictExists,
    /// The entity is in a state that forbids the operation.
    ConflictState,
    /// The reviewer assignment does not allow the operation.
    ConflictAssignment,
    Cancelled,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("team not found")]
    TeamNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("pr not found")]
    PullRequestNotFound,

    #[error("team_name already exists")]
    TeamExists,

    #[error("pr already exists")]
    PullRequestExists,

    /// Carries the stored record when the operation was a merge, so the
    /// caller can still show it.
    #[error("pr already merged")]
    PullRequestAlreadyMerged { existing: Option<Box<PullRequest>> },

    #[error("user is not a reviewer of pr")]
    UserNotReviewer,

    #[error("no candidates to reassign pr")]
    NoCandidateToReassign,

    #[error("request cancelled")]
    Cancelled,

    /// Storage failure. The source is logged where it happens and should not
    /// be shown to clients.
    #[error("internal error")]
    Internal(#[source] RepositoryError),
}

impl ServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::TeamNotFound | Self::UserNotFound | Self::PullRequestNotFound => {
                ErrorKind::NotFound
            }
            Self::TeamExists | Self::PullRequestExists => ErrorKind::ConflictExists,
            Self::PullRequestAlreadyMerged { .. } => ErrorKind::ConflictState,
            Self::UserNotReviewer | Self::NoCandidateToReassign => ErrorKind::ConflictAssignment,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The unchanged stored record attached to a merge conflict.
    #[must_use]
    pub fn pull_request(&self) -> Option<&PullRequest> {
        match self {
            Self::PullRequestAlreadyMerged { existing } => existing.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn already_merged(existing: PullRequest) -> Self {
        Self::PullRequestAlreadyMerged {
            existing: Some(Box::new(existing)),
        }
    }
}

/// Log a storage failure against `operation` and `entity_id` and turn it
/// into [`ServiceError::Internal`].
pub(crate) fn internal<'a>(
    operation: &'static str,
    entity_id: &'a str,
) -> impl FnOnce(RepositoryError) -> ServiceError + 'a {
    move |error| {
        log::error!("{operation}: storage failure for '{entity_id}': {error}");
        ServiceError::Internal(error)
    }
}
