use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::assignment_dto::{IssueShareLinkRequest, PlayAssignmentResponse, ShareLinkResponse};
use crate::AppState;

#[axum::debug_handler]
pub async fn issue_share_link(
    State(state): State<AppState>,
    Path(assignment_id): Path<i64>,
    body: Option<Json<IssueShareLinkRequest>>,
) -> crate::error::Result<Response> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let link = state
        .share_links
        .issue(&assignment_id.to_string(), req.expires_in_days)
        .await?;
    Ok((StatusCode::CREATED, Json(ShareLinkResponse::from(link))).into_response())
}

#[axum::debug_handler]
pub async fn play_assignment(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> crate::error::Result<Json<PlayAssignmentResponse>> {
    let detail = state.share_links.open(&token).await?;
    Ok(Json(PlayAssignmentResponse::from(detail)))
}
