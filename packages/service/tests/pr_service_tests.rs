use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reviewer_models::{PrStatus, PullRequest, Team, User, ValidationError};
use reviewer_repository::{RepositoryError, UnitOfWork, UnitOfWorkFactory};
use reviewer_repository_memory::{FailPoint, MemoryStore};
use reviewer_service::{ErrorKind, RequestContext, ServiceError, Services};

struct Fixture {
    store: MemoryStore,
    services: Services,
    ctx: RequestContext,
}

impl Fixture {
    fn new() -> Self {
        let store = MemoryStore::new();
        let services = Services::new(Arc::new(store.clone()));
        Self {
            store,
            services,
            ctx: RequestContext::new(),
        }
    }

    async fn team(&self, name: &str, members: &[(&str, bool)]) {
        let members = members
            .iter()
            .map(|(id, is_active)| User::new(*id, format!("user {id}"), *is_active))
            .collect();
        self.services
            .teams
            .create_team(&self.ctx, Team::new(name, members))
            .await
            .unwrap();
    }

    async fn backend(&self) {
        self.team(
            "backend",
            &[("u1", true), ("u2", true), ("u3", true), ("u4", true)],
        )
        .await;
    }

    async fn create(&self, id: &str, author: &str) -> Result<PullRequest, ServiceError> {
        self.services
            .pull_requests
            .create_pr(&self.ctx, PullRequest::new(id, format!("{id} name"), author))
            .await
    }

    async fn stored(&self, id: &str) -> PullRequest {
        let mut uow = self.store.create().await.unwrap();
        uow.pull_requests().get_by_id(id).await.unwrap().unwrap()
    }
}

fn reviewer_set(pr: &PullRequest) -> HashSet<&str> {
    pr.assigned_reviewers.iter().map(String::as_str).collect()
}

#[test_log::test(tokio::test)]
async fn test_create_assigns_two_teammates() {
    let fixture = Fixture::new();
    fixture.backend().await;

    let pr = fixture.create("pr-1", "u1").await.unwrap();

    assert_eq!(pr.status, PrStatus::Open);
    assert_eq!(pr.assigned_reviewers.len(), 2);
    assert!(pr.created_at.is_some());
    assert!(pr.merged_at.is_none());
    let allowed: HashSet<&str> = ["u2", "u3", "u4"].into_iter().collect();
    assert!(reviewer_set(&pr).is_subset(&allowed));
    assert_eq!(reviewer_set(&pr).len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_author_is_never_a_reviewer() {
    let fixture = Fixture::new();
    fixture.backend().await;

    for index in 0..50 {
        let author = ["u1", "u2", "u3", "u4"][index % 4];
        let pr = fixture.create(&format!("pr-{index}"), author).await.unwrap();
        assert!(!pr.has_reviewer(author), "author {author} assigned to {}", pr.id);
    }
}

#[test_log::test(tokio::test)]
async fn test_create_with_small_team() {
    let fixture = Fixture::new();
    fixture
        .team("pair", &[("a1", true), ("a2", true), ("a3", false)])
        .await;
    fixture.team("solo", &[("s1", true)]).await;

    let pr = fixture.create("pr-pair", "a1").await.unwrap();
    assert_eq!(pr.assigned_reviewers, vec!["a2"]);

    let pr = fixture.create("pr-solo", "s1").await.unwrap();
    assert!(pr.assigned_reviewers.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_create_validation_order() {
    let fixture = Fixture::new();

    let error = fixture.create("", "").await.unwrap_err();
    assert!(matches!(
        error,
        ServiceError::Validation(ValidationError::PullRequestIdEmpty)
    ));

    let error = fixture
        .services
        .pull_requests
        .create_pr(&fixture.ctx, PullRequest::new("pr-1", "", "u1"))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ServiceError::Validation(ValidationError::PullRequestNameEmpty)
    ));

    let error = fixture.create("pr-1", "").await.unwrap_err();
    assert!(matches!(
        error,
        ServiceError::Validation(ValidationError::AuthorIdEmpty)
    ));
}

#[test_log::test(tokio::test)]
async fn test_create_unknown_author_and_duplicate() {
    let fixture = Fixture::new();
    fixture.backend().await;

    let error = fixture.create("pr-1", "ghost").await.unwrap_err();
    assert!(matches!(error, ServiceError::UserNotFound));

    fixture.create("pr-1", "u1").await.unwrap();
    let error = fixture.create("pr-1", "u2").await.unwrap_err();
    assert!(matches!(error, ServiceError::PullRequestExists));
    assert_eq!(error.kind(), ErrorKind::ConflictExists);
    assert_eq!(fixture.stored("pr-1").await.author_id, "u1");
}

#[test_log::test(tokio::test)]
async fn test_merge_then_merge_again_returns_unchanged_record() {
    let fixture = Fixture::new();
    fixture.backend().await;
    fixture.create("pr-1", "u1").await.unwrap();

    let merged = fixture
        .services
        .pull_requests
        .merge(&fixture.ctx, "pr-1")
        .await
        .unwrap();
    assert_eq!(merged.status, PrStatus::Merged);
    assert!(merged.merged_at.is_some());

    let error = fixture
        .services
        .pull_requests
        .merge(&fixture.ctx, "pr-1")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ConflictState);
    assert_eq!(error.pull_request(), Some(&merged));
    assert_eq!(fixture.stored("pr-1").await, merged);
}

#[test_log::test(tokio::test)]
async fn test_merge_errors() {
    let fixture = Fixture::new();

    let error = fixture
        .services
        .pull_requests
        .merge(&fixture.ctx, "")
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ServiceError::Validation(ValidationError::PullRequestIdEmpty)
    ));

    let error = fixture
        .services
        .pull_requests
        .merge(&fixture.ctx, "pr-404")
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::PullRequestNotFound));
}

#[test_log::test(tokio::test)]
async fn test_reassign_swaps_exactly_one_reviewer() {
    let fixture = Fixture::new();
    fixture
        .team(
            "backend",
            &[("u1", true), ("u2", true), ("u3", true), ("u4", true), ("u5", true)],
        )
        .await;
    let pr = fixture.create("pr-1", "u1").await.unwrap();
    let old = pr.assigned_reviewers[0].clone();
    let kept = pr.assigned_reviewers[1].clone();

    let (updated, replaced_by) = fixture
        .services
        .pull_requests
        .reassign_reviewer(&fixture.ctx, "pr-1", &old)
        .await
        .unwrap();

    assert_eq!(updated.assigned_reviewers.len(), 2);
    assert!(!updated.has_reviewer(&old));
    assert!(updated.has_reviewer(&kept));
    assert!(updated.has_reviewer(&replaced_by));
    assert_ne!(replaced_by, "u1");
    assert_ne!(replaced_by, old);
    assert_ne!(replaced_by, kept);
    assert_eq!(fixture.stored("pr-1").await, updated);
}

#[test_log::test(tokio::test)]
async fn test_replaced_reviewer_cannot_be_reassigned_again() {
    let fixture = Fixture::new();
    fixture
        .team(
            "backend",
            &[("u1", true), ("u2", true), ("u3", true), ("u4", true), ("u5", true)],
        )
        .await;
    let pr = fixture.create("pr-1", "u1").await.unwrap();
    let old = pr.assigned_reviewers[0].clone();

    let (_, replaced_by) = fixture
        .services
        .pull_requests
        .reassign_reviewer(&fixture.ctx, "pr-1", &old)
        .await
        .unwrap();

    let mut uow = fixture.store.create().await.unwrap();
    let stored: Vec<String> = uow
        .pull_requests()
        .get_reviewers("pr-1")
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert!(!stored.contains(&old));
    assert!(stored.contains(&replaced_by));

    let error = fixture
        .services
        .pull_requests
        .reassign_reviewer(&fixture.ctx, "pr-1", &old)
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::UserNotReviewer));
    assert_eq!(error.kind(), ErrorKind::ConflictAssignment);
}

#[test_log::test(tokio::test)]
async fn test_reassign_without_candidate_rolls_back() {
    let fixture = Fixture::new();
    fixture
        .team("backend", &[("u1", true), ("u2", true), ("u3", true)])
        .await;
    let pr = fixture.create("pr-1", "u1").await.unwrap();
    assert_eq!(reviewer_set(&pr), ["u2", "u3"].into_iter().collect());

    let error = fixture
        .services
        .pull_requests
        .reassign_reviewer(&fixture.ctx, "pr-1", "u2")
        .await
        .unwrap_err();

    assert!(matches!(error, ServiceError::NoCandidateToReassign));
    assert_eq!(error.kind(), ErrorKind::ConflictAssignment);
    assert_eq!(fixture.stored("pr-1").await, pr);
}

#[test_log::test(tokio::test)]
async fn test_reassign_errors() {
    let fixture = Fixture::new();
    fixture.backend().await;
    fixture
        .team("frontend", &[("f1", true), ("f2", true)])
        .await;
    let pr = fixture.create("pr-1", "u1").await.unwrap();
    let reviewer = pr.assigned_reviewers[0].clone();
    let reassign = |pr_id: &'static str, old: String| {
        let services = fixture.services.clone();
        let ctx = fixture.ctx.clone();
        async move {
            services
                .pull_requests
                .reassign_reviewer(&ctx, pr_id, &old)
                .await
                .unwrap_err()
        }
    };

    assert!(matches!(
        reassign("", reviewer.clone()).await,
        ServiceError::Validation(ValidationError::PullRequestIdEmpty)
    ));
    assert!(matches!(
        reassign("pr-1", String::new()).await,
        ServiceError::Validation(ValidationError::EmptyUserId)
    ));
    assert!(matches!(
        reassign("pr-404", reviewer.clone()).await,
        ServiceError::PullRequestNotFound
    ));
    assert!(matches!(
        reassign("pr-1", "ghost".to_string()).await,
        ServiceError::UserNotFound
    ));
    assert!(matches!(
        reassign("pr-1", "f1".to_string()).await,
        ServiceError::UserNotReviewer
    ));

    fixture
        .services
        .pull_requests
        .merge(&fixture.ctx, "pr-1")
        .await
        .unwrap();
    let error = reassign("pr-1", reviewer).await;
    assert!(matches!(error, ServiceError::PullRequestAlreadyMerged { .. }));
    assert!(error.pull_request().is_none());
}

#[test_log::test(tokio::test)]
async fn test_storage_failure_is_internal_and_leaves_state_intact() {
    let fixture = Fixture::new();
    fixture.backend().await;
    let pr = fixture.create("pr-1", "u1").await.unwrap();

    fixture.store.inject_failure(FailPoint::Reassign);
    let error = fixture
        .services
        .pull_requests
        .reassign_reviewer(&fixture.ctx, "pr-1", &pr.assigned_reviewers[0])
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Internal);
    assert_eq!(error.to_string(), "internal error");

    fixture.store.inject_failure(FailPoint::Commit);
    let error = fixture
        .services
        .pull_requests
        .merge(&fixture.ctx, "pr-1")
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Internal);

    fixture.store.clear_failures();
    assert_eq!(fixture.stored("pr-1").await, pr);
}

#[test_log::test(tokio::test)]
async fn test_failure_after_partial_writes_rolls_back() {
    let fixture = Fixture::new();
    fixture.store.inject_failure(FailPoint::CreateUser);

    let error = fixture
        .services
        .teams
        .create_team(
            &fixture.ctx,
            Team::new("backend", vec![User::new("u1", "Alice", true)]),
        )
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Internal);

    fixture.store.clear_failures();
    let error = fixture
        .services
        .teams
        .get_team(&fixture.ctx, "backend")
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::TeamNotFound));
}

/// Counts `create` calls and never hands out a unit of work.
#[derive(Default)]
struct PendingFactory {
    calls: AtomicUsize,
}

#[async_trait]
impl UnitOfWorkFactory for PendingFactory {
    async fn create(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

#[test_log::test(tokio::test)]
async fn test_cancelled_context_never_touches_storage() {
    let factory = Arc::new(PendingFactory::default());
    let services = Services::new(factory.clone());
    let ctx = RequestContext::new();
    ctx.cancel();

    let error = services
        .pull_requests
        .create_pr(&ctx, PullRequest::new("pr-1", "Feature", "u1"))
        .await
        .unwrap_err();

    assert!(matches!(error, ServiceError::Cancelled));
    assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_deadline_while_opening_unit_of_work() {
    let factory = Arc::new(PendingFactory::default());
    let services = Services::new(factory.clone());
    let ctx = RequestContext::with_timeout(Duration::from_secs(1));

    let error = services
        .pull_requests
        .merge(&ctx, "pr-1")
        .await
        .unwrap_err();

    assert!(matches!(error, ServiceError::Cancelled));
    assert_eq!(error.kind(), ErrorKind::Cancelled);
    assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn test_transaction_waits_for_concurrent_writer() {
    let fixture = Fixture::new();
    fixture.backend().await;
    fixture.create("pr-1", "u1").await.unwrap();

    let merges = (0..8).map(|_| {
        let services = fixture.services.clone();
        let ctx = fixture.ctx.clone();
        tokio::spawn(async move { services.pull_requests.merge(&ctx, "pr-1").await })
    });
    let mut merged = 0;
    let mut conflicts = 0;
    for handle in merges.collect::<Vec<_>>() {
        match handle.await.unwrap() {
            Ok(_) => merged += 1,
            Err(error) => {
                assert_eq!(error.kind(), ErrorKind::ConflictState);
                assert!(error.pull_request().is_some());
                conflicts += 1;
            }
        }
    }

    assert_eq!(merged, 1);
    assert_eq!(conflicts, 7);
}
