use actix_web::{HttpResponse, web};
use reviewer_server_models::{
    CreatePullRequestRequest, MergeRequest, PullRequestResponse, ReassignRequest, ReassignResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

#[allow(clippy::future_not_send)]
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreatePullRequestRequest>,
) -> Result<HttpResponse, ApiError> {
    let pr = state
        .services
        .pull_requests
        .create_pr(&state.context(), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(PullRequestResponse { pr: pr.into() }))
}

#[allow(clippy::future_not_send)]
pub async fn merge(
    state: web::Data<AppState>,
    body: web::Json<MergeRequest>,
) -> Result<HttpResponse, ApiError> {
    let pr = state
        .services
        .pull_requests
        .merge(&state.context(), &body.pull_request_id)
        .await?;

    Ok(HttpResponse::Ok().json(PullRequestResponse { pr: pr.into() }))
}

#[allow(clippy::future_not_send)]
pub async fn reassign(
    state: web::Data<AppState>,
    body: web::Json<ReassignRequest>,
) -> Result<HttpResponse, ApiError> {
    let (pr, replaced_by) = state
        .services
        .pull_requests
        .reassign_reviewer(&state.context(), &body.pull_request_id, &body.old_reviewer_id)
        .await?;

    Ok(HttpResponse::Ok().json(ReassignResponse {
        pr: pr.into(),
        replaced_by,
    }))
}
