//! Drive authorization routes
//!
//! Redirect flow against Google. The generated `state` token is held in
//! process state and must match on the callback; the resulting credential
//! replaces any previous one (single trusted user).

use crate::source::oauth;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// GET /auth/login
pub async fn login(State(state): State<AppState>) -> ApiResult<Redirect> {
    let oauth_config = state.config.oauth.as_ref().ok_or_else(|| {
        ApiError::BadRequest(
            "Google OAuth client not configured. Set google_client_id and \
             google_client_secret in the config file, or pass \
             --google-client-id / --google-client-secret."
                .to_string(),
        )
    })?;

    let csrf_state = Uuid::new_v4().to_string();
    let url = oauth::authorization_url(oauth_config, &csrf_state);
    *state.pending_oauth_state.write().await = Some(csrf_state);

    tracing::info!("redirecting to drive consent page");
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/callback
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Redirect> {
    if let Some(error) = query.error {
        return Err(ApiError::BadRequest(format!("authorization denied: {error}")));
    }

    let expected = state.pending_oauth_state.write().await.take();
    if expected.is_none() || expected != query.state {
        return Err(ApiError::BadRequest(
            "authorization state mismatch; start again from the login page".to_string(),
        ));
    }

    let code = query
        .code
        .ok_or_else(|| ApiError::BadRequest("missing authorization code".to_string()))?;

    let oauth_config = state
        .config
        .oauth
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("Google OAuth client not configured".to_string()))?;

    let credentials = oauth::exchange_code(&state.http, oauth_config, &code).await?;
    *state.credentials.write().await = Some(credentials);

    Ok(Redirect::to("/"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
}
