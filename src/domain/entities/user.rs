use crate::domain::entities::fields::FieldMap;
use crate::domain::entities::PaginationMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The sole authorization axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Agent | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "agent" => Ok(Role::Agent),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub metadata: FieldMap,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn new(email: String, name: String, role: Role) -> Self {
        let now = crate::shared::utils::now_rfc3339();

        Self {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            role,
            metadata: FieldMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: PaginationMetadata,
}
