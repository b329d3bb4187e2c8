//! What each role may do with tickets, messages and pages.
//!
//! Services call these checks with the caller's [`Actor`] before touching the
//! store; the same rules back the session middleware's path allow-list.

use crate::domain::entities::{
    CreateMessageRequest, MessageType, Role, Ticket, TicketChanges, TicketPredicate,
    TicketStatus, User, Visibility,
};
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};

const CUSTOMER_PATHS: &[&str] = &[
    "/portal",
    "/api/me",
    "/api/tickets",
    "/api/search",
    "/api/docs",
];
const AGENT_EXTRA_PATHS: &[&str] = &["/dashboard", "/api/messages"];

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAccess {
    Granted,
    /// The caller must not learn the ticket exists.
    Hidden,
    Denied,
}

pub fn ticket_access(actor: &Actor, ticket: &Ticket) -> TicketAccess {
    match actor.role {
        Role::Admin => TicketAccess::Granted,
        Role::Agent => match ticket.assigned_to.as_deref() {
            None => TicketAccess::Granted,
            Some(assignee) if assignee == actor.id => TicketAccess::Granted,
            Some(_) => TicketAccess::Denied,
        },
        Role::Customer => {
            if ticket.customer_email == actor.email {
                TicketAccess::Granted
            } else {
                TicketAccess::Hidden
            }
        }
    }
}

pub fn require_ticket_access(actor: &Actor, ticket: &Ticket) -> ApiResult<()> {
    match ticket_access(actor, ticket) {
        TicketAccess::Granted => Ok(()),
        TicketAccess::Hidden => Err(ApiError::NotFound("Ticket not found".to_string())),
        TicketAccess::Denied => Err(ApiError::Forbidden(
            "Ticket is assigned to another agent".to_string(),
        )),
    }
}

/// Predicates that restrict a ticket listing to what the actor may see.
pub fn ticket_scope(actor: &Actor) -> Vec<TicketPredicate> {
    match actor.role {
        Role::Admin => Vec::new(),
        Role::Agent => vec![TicketPredicate::AssignedToOrUnassigned(actor.id.clone())],
        Role::Customer => vec![TicketPredicate::CustomerEmail(actor.email.clone())],
    }
}

pub fn check_ticket_update(actor: &Actor, changes: &TicketChanges) -> ApiResult<()> {
    if changes.assigned_to.is_some() {
        return Err(ApiError::BadRequest(
            "Use the assign endpoint to change the assignee".to_string(),
        ));
    }

    if actor.role != Role::Customer {
        return Ok(());
    }

    if changes.priority.is_some() || changes.custom_fields.is_some() {
        return Err(ApiError::Forbidden(
            "Customers may only change title, description, tags and status".to_string(),
        ));
    }

    match changes.status {
        None | Some(TicketStatus::Open) | Some(TicketStatus::Closed) => Ok(()),
        Some(status) => Err(ApiError::Forbidden(format!(
            "Customers cannot set status to {}",
            status
        ))),
    }
}

/// Role rules for moving `ticket` to `target`. Whether `target` is a staff
/// account is checked by the caller against the store.
pub fn check_assignment(actor: &Actor, ticket: &Ticket, target: Option<&str>) -> ApiResult<()> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Customer => Err(ApiError::Forbidden(
            "Customers cannot assign tickets".to_string(),
        )),
        Role::Agent => {
            let target = target.ok_or_else(|| {
                ApiError::Forbidden("Agents cannot unassign tickets".to_string())
            })?;
            if target != actor.id {
                return Err(ApiError::Forbidden(
                    "Agents can only assign tickets to themselves".to_string(),
                ));
            }
            match ticket.assigned_to.as_deref() {
                Some(current) if current != actor.id => Err(ApiError::Forbidden(
                    "Ticket is already assigned to another agent".to_string(),
                )),
                _ => Ok(()),
            }
        }
    }
}

pub fn check_new_message(actor: &Actor, req: &CreateMessageRequest) -> ApiResult<()> {
    if actor.is_staff() {
        return Ok(());
    }

    if req.visibility != Visibility::Public
        || req.message_type != MessageType::Text
        || req.is_ai_generated
    {
        return Err(ApiError::Forbidden(
            "Customers may only post public text messages".to_string(),
        ));
    }

    Ok(())
}

pub fn require_admin(actor: &Actor) -> ApiResult<()> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin role required".to_string()))
    }
}

pub fn require_staff(actor: &Actor) -> ApiResult<()> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Staff role required".to_string()))
    }
}

/// Path allow-list check. Prefixes match whole segments only, so `/portal`
/// admits `/portal/x` but not `/portalx`.
pub fn path_allowed(role: Role, path: &str) -> bool {
    let prefixes: Vec<&str> = match role {
        Role::Admin => return true,
        Role::Agent => CUSTOMER_PATHS
            .iter()
            .chain(AGENT_EXTRA_PATHS)
            .copied()
            .collect(),
        Role::Customer => CUSTOMER_PATHS.to_vec(),
    };

    prefixes.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
    })
}

/// Landing page after sign-in.
pub fn home_path(role: Role) -> &'static str {
    match role {
        Role::Customer => "/portal",
        Role::Agent | Role::Admin => "/dashboard",
    }
}
