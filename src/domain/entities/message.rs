use crate::domain::entities::fields::{validate_field_map, FieldMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_MESSAGE_LEN: usize = 10_000;

/// Who may read a message. Internal notes never reach customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "internal" => Ok(Visibility::Internal),
            _ => Err(format!("Invalid visibility: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    StatusChange,
    AssignmentChange,
    Note,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::StatusChange => "status_change",
            MessageType::AssignmentChange => "assignment_change",
            MessageType::Note => "note",
            MessageType::System => "system",
        }
    }

    /// Types written by the service itself rather than posted by a user.
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            MessageType::StatusChange | MessageType::AssignmentChange | MessageType::System
        )
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "status_change" => Ok(MessageType::StatusChange),
            "assignment_change" => Ok(MessageType::AssignmentChange),
            "note" => Ok(MessageType::Note),
            "system" => Ok(MessageType::System),
            _ => Err(format!("Invalid message type: {}", s)),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub ticket_id: String,
    pub user_id: String,
    pub content: String,
    pub visibility: Visibility,
    pub message_type: MessageType,
    pub is_ai_generated: bool,
    pub metadata: FieldMap,
    pub created_at: String,
    pub updated_at: String,
}

impl Message {
    pub fn new(
        ticket_id: String,
        user_id: String,
        content: String,
        visibility: Visibility,
        message_type: MessageType,
    ) -> Self {
        let now = crate::shared::utils::now_rfc3339();

        Self {
            id: Uuid::new_v4().to_string(),
            ticket_id,
            user_id,
            content,
            visibility,
            message_type,
            is_ai_generated: false,
            metadata: FieldMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Public record of a status transition, attributed to the actor.
    pub fn status_change(ticket_id: &str, actor_id: &str, from: &str, to: &str) -> Self {
        Self::new(
            ticket_id.to_string(),
            actor_id.to_string(),
            format!("Status changed from {} to {}", from, to),
            Visibility::Public,
            MessageType::StatusChange,
        )
    }

    /// Internal record of an assignee change.
    pub fn assignment_change(ticket_id: &str, actor_id: &str, assignee: Option<&str>) -> Self {
        let content = match assignee {
            Some(user) => format!("Ticket assigned to {}", user),
            None => "Ticket unassigned".to_string(),
        };

        Self::new(
            ticket_id.to_string(),
            actor_id.to_string(),
            content,
            Visibility::Internal,
            MessageType::AssignmentChange,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub is_ai_generated: bool,
    #[serde(default)]
    pub metadata: FieldMap,
}

impl CreateMessageRequest {
    pub fn validate(&self) -> Result<(), String> {
        let len = self.content.trim().chars().count();
        if len == 0 {
            return Err("Message content cannot be empty".to_string());
        }
        if self.content.chars().count() > MAX_MESSAGE_LEN {
            return Err(format!(
                "Message content must be at most {} characters",
                MAX_MESSAGE_LEN
            ));
        }
        if self.message_type.is_event() {
            return Err(format!(
                "Message type '{}' is reserved for system events",
                self.message_type
            ));
        }
        validate_field_map(&self.metadata)
    }
}
