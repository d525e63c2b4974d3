use axum::{
    extract::{Path, State},
    response::Json,
};
use validator::Validate;

use crate::dto::assignment_dto::{SaveQuestionsRequest, SaveQuestionsResponse};
use crate::AppState;

#[axum::debug_handler]
pub async fn save_questions(
    State(state): State<AppState>,
    Path(assignment_id): Path<i64>,
    Json(req): Json<SaveQuestionsRequest>,
) -> crate::error::Result<Json<SaveQuestionsResponse>> {
    req.validate()?;
    let outcome = state
        .question_persister
        .replace(assignment_id, &req.questions)
        .await?;
    Ok(Json(SaveQuestionsResponse::from(outcome)))
}
