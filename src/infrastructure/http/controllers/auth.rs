use crate::{
    domain::services::home_path,
    infrastructure::http::middleware::{ApiError, AppState, SESSION_COOKIE, SIGN_IN_PATH},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

const SIGN_UP_PATH: &str = "/auth/sign-up";

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

fn redirect_with_error(path: &str, message: &str) -> Response {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(message))).into_response()
}

fn form_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => "Invalid email or password".to_string(),
        ApiError::Database(_) | ApiError::Internal(_) | ApiError::Ai(_) => {
            "Something went wrong. Please try again".to_string()
        }
        other => other.public_message(),
    }
}

pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignUpForm>,
) -> Response {
    match state
        .auth_service
        .sign_up(&form.email, &form.password, form.name.as_deref())
        .await
    {
        Ok(result) => (
            jar.add(state.session_cookie(result.session.token)),
            Redirect::to(home_path(result.user.role)),
        )
            .into_response(),
        Err(e) => {
            if matches!(e, ApiError::Database(_) | ApiError::Internal(_)) {
                tracing::error!(error = %e, "sign-up failed");
            }
            redirect_with_error(SIGN_UP_PATH, &form_error_message(&e))
        }
    }
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Response {
    match state.auth_service.sign_in(&form.email, &form.password).await {
        Ok(result) => {
            tracing::info!(user_id = %result.user.id, "sign-in successful");
            (
                jar.add(state.session_cookie(result.session.token)),
                Redirect::to(home_path(result.user.role)),
            )
                .into_response()
        }
        Err(e) => {
            if matches!(e, ApiError::Database(_) | ApiError::Internal(_)) {
                tracing::error!(error = %e, "sign-in failed");
            }
            redirect_with_error(SIGN_IN_PATH, &form_error_message(&e))
        }
    }
}

/// Works without a valid session so a stale cookie can always be cleared.
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state.auth_service.sign_out(cookie.value()).await {
            tracing::warn!(error = %e, "failed to delete session on sign-out");
        }
    }

    (
        jar.remove(state.expired_session_cookie()),
        Redirect::to(SIGN_IN_PATH),
    )
        .into_response()
}
