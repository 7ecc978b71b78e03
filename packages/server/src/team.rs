use actix_web::{HttpResponse, web};
use reviewer_server_models::{TeamBody, TeamQuery, TeamResponse};

use crate::error::ApiError;
use crate::state::AppState;

#[allow(clippy::future_not_send)]
pub async fn add(
    state: web::Data<AppState>,
    body: web::Json<TeamBody>,
) -> Result<HttpResponse, ApiError> {
    let team = state
        .services
        .teams
        .create_team(&state.context(), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(TeamResponse { team: team.into() }))
}

#[allow(clippy::future_not_send)]
pub async fn get(
    state: web::Data<AppState>,
    query: web::Query<TeamQuery>,
) -> Result<HttpResponse, ApiError> {
    let team = state
        .services
        .teams
        .get_team(&state.context(), &query.team_name)
        .await?;

    Ok(HttpResponse::Ok().json(TeamResponse { team: team.into() }))
}
