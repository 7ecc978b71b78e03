/// Errors from persistence operations.
///
/// Missing rows are not errors: lookups return `Option`. Variants here are
/// either optimistic-concurrency conflicts or failures of the store itself.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The row an update targeted no longer exists.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was targeted.
        entity: &'static str,
        /// Identifier of the missing row.
        id: String,
    },

    /// A guarded write found the row in a different state than expected,
    /// typically because a concurrent transaction changed it first.
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// Transaction API misuse, e.g. committing without `begin`.
    #[error("Transaction error: {0}")]
    Transaction(&'static str),

    /// The underlying store failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wrap a store-specific error.
    pub fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }
}
