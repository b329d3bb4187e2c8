use crate::domain::entities::{Role, User};
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User, password_hash: &str) -> ApiResult<()>;
    async fn get_user_by_id(&self, id: &str) -> ApiResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> ApiResult<Option<User>>;
    async fn get_password_hash(&self, user_id: &str) -> ApiResult<Option<String>>;
    async fn list_users(&self, limit: i64, offset: i64) -> ApiResult<Vec<User>>;
    async fn count_users(&self) -> ApiResult<i64>;
    async fn count_users_with_role(&self, role: Role) -> ApiResult<i64>;
    async fn update_user_role(&self, id: &str, role: Role, updated_at: &str) -> ApiResult<()>;
}
