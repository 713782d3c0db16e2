//! Authentication route handlers.
//!
//! There are no passwords: a customer identifies with an email and a display
//! name, the user record is created or refreshed, and the session carries a
//! [`CurrentUser`] from then on.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sml_market_core::{Email, User};

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Longest display name kept.
const MAX_NAME_LENGTH: usize = 100;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Response of `/auth/login` and `/auth/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: Option<CurrentUser>,
}

/// Display name to store: the trimmed name, or the email's local part.
fn display_name_for(email: &Email, name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return email
            .as_str()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_owned();
    }
    name.chars().take(MAX_NAME_LENGTH).collect()
}

/// Log in, creating the user on first visit.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>> {
    let email = Email::parse(body.email.trim()).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let display_name = display_name_for(&email, &body.name);

    let user = state
        .users()
        .upsert(&email, &display_name, Utc::now())
        .await?;

    set_current_user(
        &session,
        &CurrentUser {
            email: email.clone(),
            display_name,
        },
    )
    .await?;

    set_sentry_user(&email.user_key(), Some(email.as_str()));
    add_breadcrumb("auth", "Customer logged in", None);
    tracing::info!(user = %email, "Customer logged in");

    Ok(Json(user))
}

/// Log out and drop the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// The logged-in customer, or `null`.
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<MeResponse> {
    Json(MeResponse { user })
}
