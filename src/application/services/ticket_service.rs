use crate::{
    domain::entities::{
        normalize_tags, BulkAction, BulkUpdateRequest, BulkUpdateResponse, CreateTicketRequest,
        DashboardSummary, Message, Page, PortalSummary, Role, StatusCount, Ticket, TicketChanges,
        TicketFilter, TicketListResponse, TicketPredicate, TicketStatus, UpdateTicketRequest,
    },
    domain::ports::{MessageRepository, TicketRepository, UserRepository},
    domain::services::{
        check_assignment, check_ticket_update, require_admin, require_staff,
        require_ticket_access, ticket_access, ticket_scope, Actor, TicketAccess,
    },
    infrastructure::http::middleware::error::{ApiError, ApiResult},
    shared::utils::{email_validator, now_rfc3339},
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Open plus pending tickets a single customer may hold.
pub const MAX_ACTIVE_TICKETS: i64 = 10;
pub const MAX_BULK_TICKETS: usize = 100;

#[derive(Clone)]
pub struct TicketService {
    ticket_repo: Arc<dyn TicketRepository>,
    message_repo: Arc<dyn MessageRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl TicketService {
    pub fn new(
        ticket_repo: Arc<dyn TicketRepository>,
        message_repo: Arc<dyn MessageRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            ticket_repo,
            message_repo,
            user_repo,
        }
    }

    #[tracing::instrument(skip(self, actor, req), fields(actor_id = %actor.id))]
    pub async fn create_ticket(&self, actor: &Actor, req: CreateTicketRequest) -> ApiResult<Ticket> {
        req.validate().map_err(ApiError::BadRequest)?;

        let customer_email = match actor.role {
            Role::Customer => actor.email.clone(),
            Role::Agent | Role::Admin => {
                let email = req.customer_email.as_deref().ok_or_else(|| {
                    ApiError::BadRequest(
                        "customer_email is required when staff open a ticket".to_string(),
                    )
                })?;
                email_validator::validate_and_normalize_email(email)?
            }
        };

        self.require_active_slot(&customer_email).await?;

        let tags = normalize_tags(&req.tags).map_err(ApiError::BadRequest)?;
        let ticket = Ticket::new(
            req.title.trim().to_string(),
            req.description,
            req.priority.unwrap_or_default(),
            tags,
            actor.id.clone(),
            customer_email,
            req.custom_fields,
        );

        self.ticket_repo.create_ticket(&ticket).await?;
        metrics::counter!("autocrm_tickets_created_total").increment(1);
        tracing::info!(ticket_id = %ticket.id, "ticket created");

        Ok(ticket)
    }

    pub async fn get_ticket(&self, actor: &Actor, id: &str) -> ApiResult<Ticket> {
        let ticket = self
            .ticket_repo
            .get_ticket(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

        require_ticket_access(actor, &ticket)?;
        Ok(ticket)
    }

    /// Caller's filter ANDed with the role scope.
    pub async fn list_tickets(
        &self,
        actor: &Actor,
        filter: &TicketFilter,
        page: Page,
    ) -> ApiResult<TicketListResponse> {
        let mut predicates = ticket_scope(actor);
        predicates.extend(filter.predicates());

        let (tickets, total) = self.ticket_repo.list_tickets(&predicates, page).await?;

        Ok(TicketListResponse {
            tickets,
            pagination: page.metadata(total),
        })
    }

    #[tracing::instrument(skip(self, actor, req), fields(actor_id = %actor.id))]
    pub async fn update_ticket(
        &self,
        actor: &Actor,
        id: &str,
        req: UpdateTicketRequest,
    ) -> ApiResult<Ticket> {
        let ticket = self.get_ticket(actor, id).await?;

        let changes = TicketChanges::try_from(req)
            .map_err(ApiError::BadRequest)?
            .against(&ticket);
        check_ticket_update(actor, &changes)?;

        if changes.is_empty() {
            return Ok(ticket);
        }
        if changes.reactivates(&ticket) {
            self.require_active_slot(&ticket.customer_email).await?;
        }

        let now = now_rfc3339();
        self.ticket_repo.update_ticket(id, &changes, &now).await?;

        if let Some(status) = changes.status {
            let message = Message::status_change(
                id,
                &actor.id,
                ticket.status.as_str(),
                status.as_str(),
            );
            self.message_repo.create_message(&message).await?;
        }

        self.reload(id).await
    }

    /// Move a ticket to `target` (or unassign with `None`). Re-assigning to the
    /// current assignee is a no-op.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn assign_ticket(
        &self,
        actor: &Actor,
        id: &str,
        target: Option<String>,
    ) -> ApiResult<Ticket> {
        let ticket = self.get_ticket(actor, id).await?;
        check_assignment(actor, &ticket, target.as_deref())?;

        let assignee_email = match target.as_deref() {
            Some(target_id) => Some(self.require_staff_user(target_id).await?),
            None => None,
        };

        if ticket.assigned_to == target {
            return Ok(ticket);
        }

        let changes = TicketChanges {
            assigned_to: Some(target),
            ..Default::default()
        };
        self.ticket_repo
            .update_ticket(id, &changes, &now_rfc3339())
            .await?;

        let message = Message::assignment_change(id, &actor.id, assignee_email.as_deref());
        self.message_repo.create_message(&message).await?;

        self.reload(id).await
    }

    pub async fn delete_ticket(&self, actor: &Actor, id: &str) -> ApiResult<()> {
        require_admin(actor)?;

        if self.ticket_repo.get_ticket(id).await?.is_none() {
            return Err(ApiError::NotFound("Ticket not found".to_string()));
        }

        self.ticket_repo.delete_ticket(id).await?;
        tracing::info!(ticket_id = %id, actor_id = %actor.id, "ticket deleted");
        Ok(())
    }

    /// Apply one action to many tickets: one UPDATE for the whole set, then one
    /// batch of event messages. The two steps are not atomic.
    ///
    /// Tickets the caller cannot see, missing ids and tickets already in the
    /// requested state are reported as skipped.
    #[tracing::instrument(skip(self, actor, req), fields(actor_id = %actor.id, count = req.ticket_ids.len()))]
    pub async fn bulk_update(
        &self,
        actor: &Actor,
        req: BulkUpdateRequest,
    ) -> ApiResult<BulkUpdateResponse> {
        require_staff(actor)?;

        let mut seen = HashSet::new();
        let ids: Vec<String> = req
            .ticket_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if ids.is_empty() {
            return Err(ApiError::BadRequest("ticket_ids cannot be empty".to_string()));
        }
        if ids.len() > MAX_BULK_TICKETS {
            return Err(ApiError::BadRequest(format!(
                "At most {} tickets can be updated at once",
                MAX_BULK_TICKETS
            )));
        }

        let changes = match &req.action {
            BulkAction::SetStatus { status } => TicketChanges {
                status: Some(*status),
                ..Default::default()
            },
            BulkAction::SetPriority { priority } => TicketChanges {
                priority: Some(*priority),
                ..Default::default()
            },
            BulkAction::Assign { assigned_to } => TicketChanges {
                assigned_to: Some(assigned_to.clone()),
                ..Default::default()
            },
        };

        let assignee_email = match &req.action {
            BulkAction::Assign { assigned_to } => {
                if actor.role == Role::Agent && assigned_to.as_deref() != Some(actor.id.as_str()) {
                    return Err(ApiError::Forbidden(
                        "Agents can only assign tickets to themselves".to_string(),
                    ));
                }
                match assigned_to.as_deref() {
                    Some(target_id) => Some(self.require_staff_user(target_id).await?),
                    None => None,
                }
            }
            _ => None,
        };

        let tickets = self.ticket_repo.get_tickets_by_ids(&ids).await?;
        let by_id: HashMap<&str, &Ticket> = tickets.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut targets: Vec<&Ticket> = ids
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .filter(|t| ticket_access(actor, t) == TicketAccess::Granted)
            .filter(|t| !changes.clone().against(t).is_empty())
            .collect();
        if changes.status.map_or(false, |s| s.is_active()) {
            targets = self.within_active_limit(targets, &changes).await?;
        }

        let updated: Vec<String> = targets.iter().map(|t| t.id.clone()).collect();
        let skipped: Vec<String> = ids
            .iter()
            .filter(|id| !updated.contains(id))
            .cloned()
            .collect();

        if updated.is_empty() {
            return Ok(BulkUpdateResponse { updated, skipped });
        }

        let now = now_rfc3339();
        self.ticket_repo
            .bulk_update_tickets(&updated, &changes, &now)
            .await?;

        let messages: Vec<Message> = match &req.action {
            BulkAction::SetStatus { status } => targets
                .iter()
                .map(|t| Message::status_change(&t.id, &actor.id, t.status.as_str(), status.as_str()))
                .collect(),
            BulkAction::Assign { .. } => targets
                .iter()
                .map(|t| Message::assignment_change(&t.id, &actor.id, assignee_email.as_deref()))
                .collect(),
            BulkAction::SetPriority { .. } => Vec::new(),
        };

        if !messages.is_empty() {
            self.message_repo.create_messages(&messages).await?;
        }

        tracing::info!(updated = updated.len(), skipped = skipped.len(), "bulk update applied");

        Ok(BulkUpdateResponse { updated, skipped })
    }

    pub async fn portal_summary(&self, actor: &Actor) -> ApiResult<PortalSummary> {
        let active_tickets = self.ticket_repo.count_active_tickets(&actor.email).await?;
        let (recent_tickets, _) = self
            .ticket_repo
            .list_tickets(&ticket_scope(actor), Page::new(Some(0), Some(5)))
            .await?;

        Ok(PortalSummary {
            active_tickets,
            max_active_tickets: MAX_ACTIVE_TICKETS,
            recent_tickets,
        })
    }

    pub async fn dashboard_summary(&self, actor: &Actor) -> ApiResult<DashboardSummary> {
        require_staff(actor)?;

        let scope = ticket_scope(actor);
        let mut status_counts = Vec::with_capacity(TicketStatus::ALL.len());
        for status in TicketStatus::ALL {
            let mut predicates = scope.clone();
            predicates.push(TicketPredicate::StatusIn(vec![status]));
            let count = self.ticket_repo.count_tickets(&predicates).await?;
            status_counts.push(StatusCount { status, count });
        }

        let mut unassigned = scope.clone();
        unassigned.push(TicketPredicate::Unassigned);
        let unassigned_count = self.ticket_repo.count_tickets(&unassigned).await?;

        let mine = vec![
            TicketPredicate::AssignedTo(actor.id.clone()),
            TicketPredicate::StatusIn(TicketStatus::ACTIVE.to_vec()),
        ];
        let (my_open_tickets, _) = self
            .ticket_repo
            .list_tickets(&mine, Page::new(Some(0), Some(10)))
            .await?;

        Ok(DashboardSummary {
            status_counts,
            unassigned_count,
            my_open_tickets,
        })
    }

    async fn require_active_slot(&self, customer_email: &str) -> ApiResult<()> {
        let active = self.ticket_repo.count_active_tickets(customer_email).await?;
        if active >= MAX_ACTIVE_TICKETS {
            return Err(ApiError::BadRequest(
                "maximum active tickets reached".to_string(),
            ));
        }
        Ok(())
    }

    /// Drop reactivations that would take a customer past the active limit.
    /// Tickets earlier in the request win the remaining slots.
    async fn within_active_limit<'a>(
        &self,
        targets: Vec<&'a Ticket>,
        changes: &TicketChanges,
    ) -> ApiResult<Vec<&'a Ticket>> {
        let mut slots: HashMap<String, i64> = HashMap::new();
        let mut kept = Vec::with_capacity(targets.len());

        for ticket in targets {
            if !changes.reactivates(ticket) {
                kept.push(ticket);
                continue;
            }
            if !slots.contains_key(&ticket.customer_email) {
                let active = self
                    .ticket_repo
                    .count_active_tickets(&ticket.customer_email)
                    .await?;
                slots.insert(ticket.customer_email.clone(), MAX_ACTIVE_TICKETS - active);
            }
            let free = slots.entry(ticket.customer_email.clone()).or_default();
            if *free > 0 {
                *free -= 1;
                kept.push(ticket);
            } else {
                tracing::debug!(ticket_id = %ticket.id, "reopen skipped, customer at active limit");
            }
        }

        Ok(kept)
    }

    /// Resolve an assignment target, returning its email for the event message.
    async fn require_staff_user(&self, user_id: &str) -> ApiResult<String> {
        let user = self
            .user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Assignee not found".to_string()))?;

        if !user.role.is_staff() {
            return Err(ApiError::BadRequest(
                "Tickets can only be assigned to agents or admins".to_string(),
            ));
        }
        Ok(user.email)
    }

    async fn reload(&self, id: &str) -> ApiResult<Ticket> {
        self.ticket_repo
            .get_ticket(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))
    }
}
