/// A required field was missing on an incoming entity or argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("team_name cannot be empty")]
    TeamNameEmpty,

    #[error("team_members cannot be empty")]
    TeamMembersEmpty,

    #[error("user id cannot be empty")]
    EmptyUserId,

    #[error("pull_request_id cannot be empty")]
    PullRequestIdEmpty,

    #[error("pull_request_name cannot be empty")]
    PullRequestNameEmpty,

    #[error("pr author_id cannot be empty")]
    AuthorIdEmpty,
}
