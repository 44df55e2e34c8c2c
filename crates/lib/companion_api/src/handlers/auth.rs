//! Login handler.

use axum::extract::State;
use axum::{Form, Json};
use companion_core::auth::TOKEN_TYPE;
use tracing::info;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{LoginForm, TokenResponse};

/// `POST /login` — form-encoded username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .credentials
        .login(&form.username, &form.password)
        .inspect_err(|_| info!(username = %form.username, "login rejected"))?;

    info!(username = %form.username, "login succeeded");

    Ok(Json(TokenResponse {
        access_token: token.into_string(),
        token_type: TOKEN_TYPE.to_string(),
    }))
}
