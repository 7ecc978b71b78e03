use actix_web::{HttpResponse, web};
use reviewer_server_models::{
    PullRequestShort, ReviewRequestsResponse, SetIsActiveRequest, UserQuery, UserResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

#[allow(clippy::future_not_send)]
pub async fn set_is_active(
    state: web::Data<AppState>,
    body: web::Json<SetIsActiveRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .services
        .users
        .set_is_active(&state.context(), &body.user_id, body.is_active)
        .await?;

    Ok(HttpResponse::Ok().json(UserResponse { user: user.into() }))
}

#[allow(clippy::future_not_send)]
pub async fn get_review(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = query.into_inner().user_id;
    let prs = state
        .services
        .users
        .get_review_requests(&state.context(), &user_id)
        .await?;

    Ok(HttpResponse::Ok().json(ReviewRequestsResponse {
        user_id,
        pull_requests: prs.into_iter().map(PullRequestShort::from).collect(),
    }))
}
