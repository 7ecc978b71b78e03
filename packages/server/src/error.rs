use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use reviewer_server_models::{ErrorCode, ErrorResponse, PullRequestBody};
use reviewer_service::ServiceError;

/// Everything a handler can fail with, rendered as an [`ErrorResponse`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The body or query could not be decoded.
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest(_) | Self::Service(ServiceError::Validation(_)) => {
                ErrorCode::InvalidRequest
            }
            Self::Service(error) => match error {
                ServiceError::TeamExists => ErrorCode::TeamExists,
                ServiceError::TeamNotFound
                | ServiceError::UserNotFound
                | ServiceError::PullRequestNotFound => ErrorCode::NotFound,
                ServiceError::PullRequestExists => ErrorCode::PrExists,
                ServiceError::PullRequestAlreadyMerged { .. } => ErrorCode::PrMerged,
                ServiceError::UserNotReviewer => ErrorCode::NotAssigned,
                ServiceError::NoCandidateToReassign => ErrorCode::NoCandidate,
                ServiceError::Cancelled => ErrorCode::Cancelled,
                ServiceError::Validation(_) | ServiceError::Internal(_) => ErrorCode::Internal,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => message.clone(),
            Self::Service(error) => match error {
                ServiceError::Validation(validation) => validation.to_string(),
                ServiceError::TeamExists => "team_name already exists".to_string(),
                ServiceError::TeamNotFound
                | ServiceError::UserNotFound
                | ServiceError::PullRequestNotFound => "resource not found".to_string(),
                ServiceError::PullRequestExists => "PR id already exists".to_string(),
                ServiceError::PullRequestAlreadyMerged { existing: Some(_) } => {
                    "PR is already merged".to_string()
                }
                ServiceError::PullRequestAlreadyMerged { existing: None } => {
                    "cannot reassign on merged PR".to_string()
                }
                ServiceError::UserNotReviewer => "reviewer is not assigned to this PR".to_string(),
                ServiceError::NoCandidateToReassign => {
                    "no active replacement candidate in team".to_string()
                }
                ServiceError::Cancelled => "request cancelled or timed out".to_string(),
                ServiceError::Internal(_) => "internal server error".to_string(),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest | ErrorCode::TeamExists => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PrExists
            | ErrorCode::PrMerged
            | ErrorCode::NotAssigned
            | ErrorCode::NoCandidate => StatusCode::CONFLICT,
            ErrorCode::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let pr = match self {
            Self::Service(error) => error.pull_request().cloned().map(PullRequestBody::from),
            Self::InvalidRequest(_) => None,
        };
        let body = ErrorResponse::new(self.code(), self.message()).with_pr(pr);

        if self.status_code().is_server_error() {
            log::warn!("Responding with {}: {self}", self.code());
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
