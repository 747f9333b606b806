use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    handlers::ApiError,
    middlewares::auth::JwtClaims,
    models::{
        PromptRequest, PromptResponse, RosterResponse, SubmitAnswerRequest,
        SubmitAnswerResponse, UserRecord,
    },
    services::AppState,
};

/// POST /submit_answer
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    let (outcome, user) = state
        .quiz
        .submit_answer(&claims.sub, req.question_id, &req.answer)
        .await?;

    Ok(Json(SubmitAnswerResponse {
        ok: outcome.is_accepted(),
        description: outcome.description().to_string(),
        outcome,
        total_score: user.total_score,
        last_solved_question: user.last_solved_question,
    }))
}

/// GET /user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Json<UserRecord> {
    Json(state.quiz.get_user_state(&claims.sub).await)
}

/// POST /prompt
pub async fn submit_prompt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<PromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    if let Err(e) = req.validate() {
        tracing::warn!("Prompt validation failed for {}: {}", claims.sub, e);
        return Err(ApiError::bad_request("invalid request body"));
    }

    let result = state
        .quiz
        .submit_prompt(
            &claims.sub,
            req.question_id,
            req.system_prompt_id,
            &req.user_prompt,
        )
        .await?;

    Ok(Json(PromptResponse { result }))
}

/// GET /users
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<RosterResponse> {
    Json(RosterResponse {
        users: state.quiz.list_all_users().await,
    })
}
