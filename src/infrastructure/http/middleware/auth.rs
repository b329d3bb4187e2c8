use crate::application::services::{
    AiService, AuthService, DocumentService, MessageService, TicketService, UserService,
};
use crate::domain::entities::{Session, User};
use crate::domain::services::{home_path, path_allowed, Actor};
use crate::infrastructure::http::middleware::error::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const SESSION_COOKIE: &str = "autocrm_session";
pub const SIGN_IN_PATH: &str = "/auth/sign-in";

#[derive(Clone)]
pub struct AppState {
    pub session_duration_hours: i64,
    pub cookie_secure: bool,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub ticket_service: TicketService,
    pub message_service: MessageService,
    pub document_service: DocumentService,
    pub ai_service: AiService,
}

impl AppState {
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(time::Duration::hours(self.session_duration_hours))
            .build()
    }

    pub fn expired_session_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE).path("/").build()
    }
}

/// Caller resolved by [`require_session`], available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session: Session,
    pub token: String,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.user)
    }
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Session token from the cookie, or from `Authorization: Bearer` for API clients.
fn session_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn unauthenticated(path: &str) -> Response {
    if is_api_path(path) {
        ApiError::Unauthorized.into_response()
    } else {
        Redirect::to(SIGN_IN_PATH).into_response()
    }
}

/// Resolve the session, slide its expiry and enforce the role's path allow-list.
///
/// Pages answer with redirects, `/api` paths with JSON errors.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let Some(token) = session_token(&jar, &request) else {
        return unauthenticated(&path);
    };

    let (user, session) = match state.auth_service.authenticate(&token).await {
        Ok(resolved) => resolved,
        Err(ApiError::Unauthorized) => {
            return (jar.remove(state.expired_session_cookie()), unauthenticated(&path))
                .into_response();
        }
        Err(e) => return e.into_response(),
    };

    if !path_allowed(user.role, &path) {
        tracing::debug!(user_id = %user.id, role = %user.role, %path, "path outside role allow-list");
        return if is_api_path(&path) {
            ApiError::Forbidden("Your role cannot access this resource".to_string()).into_response()
        } else {
            Redirect::to(home_path(user.role)).into_response()
        };
    }

    let jar = jar.add(state.session_cookie(token.clone()));
    request.extensions_mut().insert(AuthenticatedUser {
        user,
        session,
        token,
    });

    let response = next.run(request).await;
    (jar, response).into_response()
}
