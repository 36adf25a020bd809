use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{Arrival, Viewer};
use crate::model::{
    LoginRequest, LoginResponse, MagicLinkRequest, MagicLinkResponse, RegisterRequest, Session,
    SessionResponse, UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password};

/// Cookie set on magic-link arrival so the browser stays logged in after
/// the redirect strips the token.
pub const SESSION_COOKIE: &str = "statemark_session";

/// Pull the bearer token from the Authorization header, falling back to
/// the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Every request has a viewer; an unrecognized or missing token is just
/// an anonymous one.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = extract_token(&parts.headers).and_then(|t| state.sessions.resolve(&t));
        Ok(match session {
            Some(session) => Viewer::Authenticated(session),
            None => Viewer::Anonymous,
        })
    }
}

/// Extractor for endpoints that require an authenticated session.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        extract_token(&parts.headers)
            .and_then(|t| state.sessions.resolve(&t))
            .ok_or_else(|| ApiError::unauthorized("You must be logged in to do that"))
    }
}

fn validate_credentials_shape(email: &str, password: &str) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_email(email.trim()) {
        errors.add("email", e);
    }

    if let Err(e) = validate_password(password) {
        errors.add("password", e);
    }

    errors.finish()
}

/// Create an account and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    validate_credentials_shape(&req.email, &req.password)?;

    let user = state.users.register(&req.email, &req.password)?;
    info!(email = %user.email, "Account registered");

    let (session, token) = state.sessions.create(&user)?;
    let maps = state.maps.list_owned_by(&session.email);

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            user: user.into(),
            maps,
        }),
    ))
}

/// Password login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_credentials_shape(&req.email, &req.password)?;

    let user = state.users.verify_credentials(&req.email, &req.password)?;
    let (session, token) = state.sessions.create(&user)?;
    let maps = state.maps.list_owned_by(&session.email);

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
        maps,
    }))
}

/// Destroy the current session. Idempotent: an unknown token is already
/// logged out.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, StatusCode), ApiError> {
    if let Some(token) = extract_token(&headers) {
        state.sessions.destroy(&token)?;
    }

    Ok((
        jar.remove(Cookie::from(SESSION_COOKIE)),
        StatusCode::NO_CONTENT,
    ))
}

/// Issue a magic login link. The account is created on first request for
/// an unseen email; the link is handed back to the caller, not mailed.
pub async fn magic_link(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MagicLinkRequest>,
) -> Result<Json<MagicLinkResponse>, ApiError> {
    if let Err(e) = validate_email(req.email.trim()) {
        return Err(ApiError::validation_field("email", e));
    }

    let link = state.magic.issue(&req.email)?;
    Ok(Json(MagicLinkResponse { link }))
}

/// Current identity plus a fresh owned-maps listing.
pub async fn session(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Json<SessionResponse> {
    let maps = state.maps.list_owned_by(&session.email);
    Json(SessionResponse {
        user: UserResponse {
            id: session.user_id,
            email: session.email,
        },
        maps,
    })
}

#[derive(Debug, Deserialize)]
pub struct LoginLinkParams {
    pub token: Option<String>,
}

/// Magic-link landing. Redeems the single-use token, sets the session
/// cookie, and redirects to the bare path so the token never stays in
/// the address bar. A token that does not match falls through
/// silently; the address is stripped either way.
pub async fn login_link(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoginLinkParams>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let mut jar = jar;

    if let Some(url_token) = params.token.as_deref() {
        match state.sessions.arrive(Some(url_token), None, &state.magic) {
            Ok(Arrival::Redeemed { session, token }) => {
                info!(email = %session.email, "Magic link redeemed");
                let cookie = Cookie::build((SESSION_COOKIE, token))
                    .path("/")
                    .http_only(true)
                    .build();
                jar = jar.add(cookie);
            }
            Ok(_) => debug!("Login link token did not match any account"),
            Err(e) => warn!(error = %e, "Login link redemption failed"),
        }
    }

    (jar, Redirect::to("/"))
}
