use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
    pub last_accessed_at: String,
}

impl Session {
    pub fn new(user_id: String, token: String, duration_hours: i64) -> Self {
        let now = chrono::Utc::now();
        let expires_at = now + chrono::Duration::hours(duration_hours);

        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            token,
            expires_at: to_timestamp(expires_at),
            created_at: to_timestamp(now),
            last_accessed_at: to_timestamp(now),
        }
    }

    /// Unparseable expiry counts as expired.
    pub fn is_expired(&self) -> bool {
        match chrono::DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => expires_at <= chrono::Utc::now(),
            Err(_) => true,
        }
    }

    /// Slide the expiry window forward from now.
    pub fn refreshed(mut self, duration_hours: i64) -> Self {
        let now = chrono::Utc::now();
        self.expires_at = to_timestamp(now + chrono::Duration::hours(duration_hours));
        self.last_accessed_at = to_timestamp(now);
        self
    }
}

fn to_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
