use crate::domain::entities::fields::{validate_field_map, FieldMap};
use crate::domain::entities::PaginationMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::Pending,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    /// Statuses that count against a customer's active ticket limit.
    pub const ACTIVE: [TicketStatus; 2] = [TicketStatus::Open, TicketStatus::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "pending" => Ok(TicketStatus::Pending),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Invalid ticket status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            _ => Err(format!("Invalid ticket priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub tags: Vec<String>,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub customer_email: String,
    pub custom_fields: FieldMap,
    pub created_at: String,
    pub updated_at: String,
    pub last_activity_at: String,
}

impl Ticket {
    pub fn new(
        title: String,
        description: String,
        priority: TicketPriority,
        tags: Vec<String>,
        created_by: String,
        customer_email: String,
        custom_fields: FieldMap,
    ) -> Self {
        let now = crate::shared::utils::now_rfc3339();

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            status: TicketStatus::Open,
            priority,
            tags,
            assigned_to: None,
            created_by,
            customer_email,
            custom_fields,
            created_at: now.clone(),
            updated_at: now.clone(),
            last_activity_at: now,
        }
    }
}

/// Lower-case, trim, drop empties and duplicates while keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, String> {
    let mut normalized: Vec<String> = Vec::new();

    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(format!("Tags must be at most {} characters", MAX_TAG_LEN));
        }
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }

    if normalized.len() > MAX_TAGS {
        return Err(format!("A ticket can have at most {} tags", MAX_TAGS));
    }

    Ok(normalized)
}

fn validate_title(title: &str) -> Result<(), String> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err("Title cannot be empty".to_string());
    }
    if len > MAX_TITLE_LEN {
        return Err(format!("Title must be at most {} characters", MAX_TITLE_LEN));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), String> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Required for staff opening a ticket on a customer's behalf; ignored otherwise.
    pub customer_email: Option<String>,
    #[serde(default)]
    pub custom_fields: FieldMap,
}

impl CreateTicketRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        normalize_tags(&self.tags)?;
        validate_field_map(&self.custom_fields)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<FieldMap>,
}

impl UpdateTicketRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(tags) = &self.tags {
            normalize_tags(tags)?;
        }
        if let Some(fields) = &self.custom_fields {
            validate_field_map(fields)?;
        }
        Ok(())
    }
}

/// Column changes applied by a single UPDATE.
///
/// `assigned_to: Some(None)` clears the assignee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<FieldMap>,
    pub assigned_to: Option<Option<String>>,
}

impl TicketChanges {
    pub fn is_empty(&self) -> bool {
        *self == TicketChanges::default()
    }

    /// Keep only the fields that differ from the current ticket.
    pub fn against(mut self, ticket: &Ticket) -> Self {
        if self.title.as_deref() == Some(ticket.title.as_str()) {
            self.title = None;
        }
        if self.description.as_deref() == Some(ticket.description.as_str()) {
            self.description = None;
        }
        if self.status == Some(ticket.status) {
            self.status = None;
        }
        if self.priority == Some(ticket.priority) {
            self.priority = None;
        }
        if self.tags.as_ref() == Some(&ticket.tags) {
            self.tags = None;
        }
        if self.custom_fields.as_ref() == Some(&ticket.custom_fields) {
            self.custom_fields = None;
        }
        if self.assigned_to.as_ref() == Some(&ticket.assigned_to) {
            self.assigned_to = None;
        }
        self
    }

    /// True when the change moves `ticket` from an inactive status back into
    /// the active set, taking one of the customer's active slots.
    pub fn reactivates(&self, ticket: &Ticket) -> bool {
        self.status.map_or(false, |s| s.is_active()) && !ticket.status.is_active()
    }
}

impl TryFrom<UpdateTicketRequest> for TicketChanges {
    type Error = String;

    fn try_from(req: UpdateTicketRequest) -> Result<Self, Self::Error> {
        req.validate()?;

        Ok(Self {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            status: req.status,
            priority: req.priority,
            tags: req.tags.as_deref().map(normalize_tags).transpose()?,
            custom_fields: req.custom_fields,
            assigned_to: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignTicketRequest {
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    SetStatus { status: TicketStatus },
    SetPriority { priority: TicketPriority },
    Assign { assigned_to: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub ticket_ids: Vec<String>,
    #[serde(flatten)]
    pub action: BulkAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateResponse {
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<Ticket>,
    pub pagination: PaginationMetadata,
}

/// Customer home page payload.
#[derive(Debug, Clone, Serialize)]
pub struct PortalSummary {
    pub active_tickets: i64,
    pub max_active_tickets: i64,
    pub recent_tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: TicketStatus,
    pub count: i64,
}

/// Staff home page payload, scoped to what the caller can see.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub status_counts: Vec<StatusCount>,
    pub unassigned_count: i64,
    pub my_open_tickets: Vec<Ticket>,
}
