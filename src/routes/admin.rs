//! Admin routes: login, logout and current-admin lookup, plus the auth extractor.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, State};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::info;

use super::response::{ApiError, ok};
use crate::services::admin::{self as admin_svc, Admin};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated admin extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthAdmin {
    pub admin: Admin,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::unauthorized());
        }

        let app_state = AppState::from_ref(state);
        let admin = app_state
            .admins
            .get_by_session(token)
            .await?
            .ok_or_else(ApiError::unauthorized)?;

        Ok(Self { admin, token: token.to_owned() })
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

impl LoginBody {
    fn validate(&self) -> Result<(), ApiError> {
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'));
        if !well_formed {
            return Err(ApiError::bad_request("email: not a valid email address"));
        }
        if self.password.is_empty() {
            return Err(ApiError::bad_request("password: must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: i64,
    pub email: String,
}

impl From<&Admin> for AdminResponse {
    fn from(admin: &Admin) -> Self {
        Self { id: admin.id, email: admin.email.clone() }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /admin.login`: check credentials, set session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    body.validate()?;

    let (admin, token) = admin_svc::login(state.admins.as_ref(), body.email.trim(), &body.password).await?;
    info!(admin_id = admin.id, "admin logged in");

    let cookie = Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure)
        .max_age(Duration::days(admin_svc::SESSION_TTL_DAYS));

    Ok((jar.add(cookie), ok(AdminResponse::from(&admin))).into_response())
}

/// `GET /admin.current`: return the logged-in admin.
pub async fn current(auth: AuthAdmin) -> Json<serde_json::Value> {
    ok(AdminResponse::from(&auth.admin))
}

/// `POST /admin.logout`: drop the session and clear the cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthAdmin) -> Result<Response, ApiError> {
    state.admins.delete_session(&auth.token).await?;

    let cookie = Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure)
        .max_age(Duration::ZERO);

    Ok((CookieJar::new().add(cookie), ok(serde_json::json!({}))).into_response())
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
