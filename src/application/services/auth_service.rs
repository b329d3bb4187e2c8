use crate::{
    domain::entities::{Role, Session, User},
    domain::ports::{SessionRepository, UserRepository},
    domain::services::{hash_password, validate_password_complexity, verify_password},
    infrastructure::http::middleware::error::{ApiError, ApiResult},
    shared::utils::{email_validator, generate_session_token},
    shared::SignInRateLimiter,
};
use std::sync::Arc;

const MAX_NAME_LEN: usize = 100;

/// Result of a successful sign-up or sign-in
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub session: Session,
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    rate_limiter: SignInRateLimiter,
    session_duration_hours: i64,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        rate_limiter: SignInRateLimiter,
        session_duration_hours: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            rate_limiter,
            session_duration_hours,
        }
    }

    pub fn session_duration_hours(&self) -> i64 {
        self.session_duration_hours
    }

    /// Register a customer account and open a session for it.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> ApiResult<AuthResult> {
        let user = self
            .create_account(email, password, name, Role::Customer)
            .await?;
        let session = self.open_session(&user).await?;

        tracing::info!(user_id = %user.id, "customer signed up");

        Ok(AuthResult { user, session })
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown email and wrong password both answer `Unauthorized`.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<AuthResult> {
        let email =
            email_validator::validate_and_normalize_email(email).map_err(|_| ApiError::Unauthorized)?;

        if let Err(wait) = self.rate_limiter.check(&email) {
            metrics::counter!("autocrm_sign_in_total", "outcome" => "rate_limited").increment(1);
            let minutes = wait.as_secs().div_ceil(60).max(1);
            return Err(ApiError::TooManyRequests(format!(
                "Too many sign-in attempts. Try again in {} minute(s)",
                minutes
            )));
        }

        let user = match self.verify_credentials(&email, password).await? {
            Some(user) => user,
            None => {
                metrics::counter!("autocrm_sign_in_total", "outcome" => "failure").increment(1);
                tracing::warn!(email = %email, "sign-in failed");
                return Err(ApiError::Unauthorized);
            }
        };

        let session = self.open_session(&user).await?;
        metrics::counter!("autocrm_sign_in_total", "outcome" => "success").increment(1);

        Ok(AuthResult { user, session })
    }

    pub async fn sign_out(&self, token: &str) -> ApiResult<()> {
        self.session_repo.delete_session(token).await
    }

    /// Resolve a session token to its user, sliding the session's expiry forward.
    pub async fn authenticate(&self, token: &str) -> ApiResult<(User, Session)> {
        let session = self
            .session_repo
            .get_session_by_token(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if session.is_expired() {
            self.session_repo.delete_session(token).await?;
            return Err(ApiError::Unauthorized);
        }

        let session = session.refreshed(self.session_duration_hours);
        self.session_repo
            .touch_session(token, &session.expires_at, &session.last_accessed_at)
            .await?;

        let user = self
            .user_repo
            .get_user_by_id(&session.user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok((user, session))
    }

    /// Purge expired sessions and idle rate-limit entries.
    pub async fn cleanup_expired_sessions(&self) -> ApiResult<u64> {
        let removed = self.session_repo.cleanup_expired_sessions().await?;
        let limiters = self.rate_limiter.cleanup();
        tracing::debug!(sessions = removed, limiters, "session cleanup finished");
        Ok(removed)
    }

    /// Create the bootstrap admin unless an account with that email exists.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> ApiResult<bool> {
        let normalized = email_validator::validate_and_normalize_email(email)?;
        if self.user_repo.get_user_by_email(&normalized).await?.is_some() {
            return Ok(false);
        }

        self.create_account(&normalized, password, Some("Administrator"), Role::Admin)
            .await?;
        Ok(true)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        role: Role,
    ) -> ApiResult<User> {
        let email = email_validator::validate_and_normalize_email(email)?;
        validate_password_complexity(password)?;

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) if name.chars().count() > MAX_NAME_LEN => {
                return Err(ApiError::BadRequest(format!(
                    "Name must be at most {} characters",
                    MAX_NAME_LEN
                )))
            }
            Some(name) => name.to_string(),
            None => email_validator::email_local_part(&email).to_string(),
        };

        if self.user_repo.get_user_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let user = User::new(email, name, role);
        self.user_repo.create_user(&user, &password_hash).await?;

        Ok(user)
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> ApiResult<Option<User>> {
        let Some(user) = self.user_repo.get_user_by_email(email).await? else {
            return Ok(None);
        };
        let Some(hash) = self.user_repo.get_password_hash(&user.id).await? else {
            return Ok(None);
        };

        if verify_password(password, &hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    async fn open_session(&self, user: &User) -> ApiResult<Session> {
        let session = Session::new(
            user.id.clone(),
            generate_session_token(),
            self.session_duration_hours,
        );
        self.session_repo.create_session(&session).await?;
        Ok(session)
    }
}
