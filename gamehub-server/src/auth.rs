use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap},
    routing::{get, post},
    Json,
};
use gamehub_tracker::{AdminAuth, AdminSession, AuthError, ADMIN_COOKIE};

use crate::{
    context::ServerContext,
    cookies::{read_cookie, Cookie},
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, ValidatedJson},
    serialized::AdminStatus,
    Router,
};

/// Wraps [AdminSession] so [FromRequestParts] can be implemented for it.
/// Rejects with 503 when no admin is configured and 401 without a valid session cookie.
pub struct Admin(pub AdminSession);

#[async_trait]
impl FromRequestParts<ServerContext> for Admin {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, ADMIN_COOKIE).unwrap_or_default();
        let session = context.tracker.auth.verify(token)?;

        Ok(Self(session))
    }
}

/// Rejects with 503 before anything else is read when no admin is configured
pub struct AdminConfigured;

#[async_trait]
impl FromRequestParts<ServerContext> for AdminConfigured {
    type Rejection = ServerError;

    async fn from_request_parts(
        _parts: &mut Parts,
        context: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        if !context.tracker.auth.is_configured() {
            return Err(AuthError::NotConfigured.into());
        }

        Ok(Self)
    }
}

#[utoipa::path(
    post,
    path = "/v1/admin/login",
    tag = "admin",
    request_body = LoginSchema,
    responses(
        (status = 200, body = AdminStatus, description = "Logged in, the session cookie is set"),
        (status = 401, description = "Invalid password"),
        (status = 503, description = "No admin password is configured")
    )
)]
pub async fn login(
    _: AdminConfigured,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<(HeaderMap, Json<AdminStatus>)> {
    let session = context.tracker.auth.login(&body.password)?;

    let cookie = Cookie::new(ADMIN_COOKIE, session.token())
        .max_age_days(AdminAuth::SESSION_DURATION_IN_DAYS)
        .http_only()
        .secure(context.secure_cookies)
        .to_header_value()
        .map_err(|e| ServerError::Unknown(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);

    Ok((
        headers,
        Json(AdminStatus {
            configured: true,
            authenticated: true,
        }),
    ))
}

/// Removes the session cookie. The token itself stays valid until the password changes.
#[utoipa::path(
    post,
    path = "/v1/admin/logout",
    tag = "admin",
    responses(
        (status = 200, body = AdminStatus, description = "The session cookie is cleared")
    )
)]
pub async fn logout(
    State(context): State<ServerContext>,
) -> ServerResult<(HeaderMap, Json<AdminStatus>)> {
    let cookie = Cookie::removal(ADMIN_COOKIE)
        .http_only()
        .secure(context.secure_cookies)
        .to_header_value()
        .map_err(|e| ServerError::Unknown(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);

    Ok((
        headers,
        Json(AdminStatus {
            configured: context.tracker.auth.is_configured(),
            authenticated: false,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/admin/session",
    tag = "admin",
    responses(
        (status = 200, body = AdminStatus)
    )
)]
pub async fn session(State(context): State<ServerContext>, headers: HeaderMap) -> Json<AdminStatus> {
    let auth = &context.tracker.auth;

    Json(AdminStatus {
        configured: auth.is_configured(),
        authenticated: auth.is_authenticated(read_cookie(&headers, ADMIN_COOKIE)),
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}
