use crate::domain::entities::{field_map_from_json, field_map_to_json, Role, User};
use crate::domain::errors::{decode_error, DatabaseResultExt};
use crate::domain::ports::user_repository::UserRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{any::AnyRow, Row};

const USER_COLUMNS: &str = "id, email, name, role, metadata, created_at, updated_at";

fn row_to_user(row: &AnyRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let metadata: String = row.try_get("metadata")?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role: role.parse().map_err(decode_error)?,
        metadata: field_map_from_json(&metadata).map_err(|e| decode_error(e.to_string()))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for Database {
    async fn create_user(&self, user: &User, password_hash: &str) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, role, password_hash, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(password_hash)
        .bind(field_map_to_json(&user.metadata))
        .bind(&user.created_at)
        .bind(&user.updated_at)
        .execute(&self.pool)
        .await
        .op("create_user")?;

        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get_user_by_id")?;

        Ok(row
            .as_ref()
            .map(row_to_user)
            .transpose()
            .op("get_user_by_id")?)
    }

    async fn get_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .op("get_user_by_email")?;

        Ok(row
            .as_ref()
            .map(row_to_user)
            .transpose()
            .op("get_user_by_email")?)
    }

    async fn get_password_hash(&self, user_id: &str) -> ApiResult<Option<String>> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .op("get_password_hash")?;

        Ok(hash)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> ApiResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .op("list_users")?;

        Ok(rows
            .iter()
            .map(row_to_user)
            .collect::<Result<Vec<_>, _>>()
            .op("list_users")?)
    }

    async fn count_users(&self) -> ApiResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .op("count_users")?;
        Ok(count)
    }

    async fn count_users_with_role(&self, role: Role) -> ApiResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .op("count_users_with_role")?;
        Ok(count)
    }

    async fn update_user_role(&self, id: &str, role: Role, updated_at: &str) -> ApiResult<()> {
        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .op("update_user_role")?;
        Ok(())
    }
}
