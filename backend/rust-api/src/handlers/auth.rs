use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    handlers::ApiError,
    models::{BaseResponse, LoginRequest, LoginResponse},
    services::AppState,
};

/// POST /login - Check credentials and issue the session cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(e) = req.validate() {
        tracing::warn!("Login validation failed: {}", e);
        return Err(ApiError::bad_request("invalid request body"));
    }

    state
        .quiz
        .authenticate_login(&req.username, &req.password)
        .await?;

    let (token, expires_at) = state.jwt.issue_token(&req.username).map_err(|e| {
        tracing::error!("Failed to sign token for {}: {}", req.username, e);
        ApiError::internal("failed to generate token")
    })?;

    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.auth.cookie_secure)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(state.config.auth.token_ttl_seconds))
        .build();

    Ok((
        StatusCode::OK,
        jar.add(cookie),
        Json(LoginResponse {
            ok: true,
            description: "login successful".to_string(),
            access_token: token,
            expires_at,
        }),
    ))
}

/// POST /logout - Drop the session cookie
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(state.config.auth.cookie_secure)
        .same_site(SameSite::None)
        .max_age(time::Duration::ZERO)
        .build();

    (
        StatusCode::OK,
        jar.add(cookie),
        Json(BaseResponse::ok("logged out")),
    )
}
