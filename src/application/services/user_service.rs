use crate::{
    domain::entities::{Page, Role, User, UserListResponse},
    domain::ports::UserRepository,
    domain::services::{require_admin, Actor},
    infrastructure::http::middleware::error::{ApiError, ApiResult},
    shared::utils::now_rfc3339,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn list_users(&self, actor: &Actor, page: Page) -> ApiResult<UserListResponse> {
        require_admin(actor)?;

        let users = self.user_repo.list_users(page.limit, page.offset).await?;
        let total = self.user_repo.count_users().await?;

        Ok(UserListResponse {
            users,
            pagination: page.metadata(total),
        })
    }

    /// Change a user's role. The last remaining admin cannot be demoted.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn update_role(&self, actor: &Actor, user_id: &str, role: Role) -> ApiResult<User> {
        require_admin(actor)?;

        let mut user = self
            .user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if user.role == role {
            return Ok(user);
        }

        if user.role == Role::Admin && self.user_repo.count_users_with_role(Role::Admin).await? <= 1
        {
            return Err(ApiError::Conflict(
                "Cannot demote the last admin".to_string(),
            ));
        }

        let now = now_rfc3339();
        self.user_repo.update_user_role(user_id, role, &now).await?;

        tracing::info!(user_id = %user_id, from = %user.role, to = %role, "user role changed");

        user.role = role;
        user.updated_at = now;
        Ok(user)
    }
}
