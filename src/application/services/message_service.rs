use crate::{
    domain::entities::{Attachment, CreateAttachmentRequest, CreateMessageRequest, Message, Role},
    domain::ports::{AttachmentRepository, MessageRepository, TicketRepository},
    domain::services::{
        check_new_message, require_staff, require_ticket_access, ticket_access, Actor,
        TicketAccess,
    },
    infrastructure::http::middleware::error::{ApiError, ApiResult},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct MessageService {
    message_repo: Arc<dyn MessageRepository>,
    ticket_repo: Arc<dyn TicketRepository>,
    attachment_repo: Arc<dyn AttachmentRepository>,
}

impl MessageService {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        ticket_repo: Arc<dyn TicketRepository>,
        attachment_repo: Arc<dyn AttachmentRepository>,
    ) -> Self {
        Self {
            message_repo,
            ticket_repo,
            attachment_repo,
        }
    }

    /// Post a message on a ticket and bump the ticket's activity time.
    #[tracing::instrument(skip(self, actor, req), fields(actor_id = %actor.id))]
    pub async fn create_message(
        &self,
        actor: &Actor,
        ticket_id: &str,
        req: CreateMessageRequest,
    ) -> ApiResult<Message> {
        req.validate().map_err(ApiError::BadRequest)?;

        let ticket = self
            .ticket_repo
            .get_ticket(ticket_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;
        require_ticket_access(actor, &ticket)?;
        check_new_message(actor, &req)?;

        let mut message = Message::new(
            ticket.id.clone(),
            actor.id.clone(),
            req.content,
            req.visibility,
            req.message_type,
        );
        message.is_ai_generated = req.is_ai_generated;
        message.metadata = req.metadata;

        self.message_repo.create_message(&message).await?;
        self.ticket_repo
            .touch_last_activity(&ticket.id, &message.created_at)
            .await?;

        metrics::counter!("autocrm_messages_created_total").increment(1);
        tracing::info!(message_id = %message.id, ticket_id = %ticket.id, "message created");

        Ok(message)
    }

    /// Messages of a ticket in posting order.
    ///
    /// Customers get only public messages, and an empty list for tickets that
    /// are not theirs or do not exist.
    pub async fn list_messages(&self, actor: &Actor, ticket_id: &str) -> ApiResult<Vec<Message>> {
        let ticket = match self.ticket_repo.get_ticket(ticket_id).await? {
            Some(ticket) => ticket,
            None if actor.role == Role::Customer => return Ok(Vec::new()),
            None => return Err(ApiError::NotFound("Ticket not found".to_string())),
        };

        match ticket_access(actor, &ticket) {
            TicketAccess::Granted => {
                self.message_repo
                    .get_ticket_messages(&ticket.id, actor.is_staff())
                    .await
            }
            TicketAccess::Hidden => Ok(Vec::new()),
            TicketAccess::Denied => Err(ApiError::Forbidden(
                "Ticket is assigned to another agent".to_string(),
            )),
        }
    }

    pub async fn add_attachment(
        &self,
        actor: &Actor,
        message_id: &str,
        req: CreateAttachmentRequest,
    ) -> ApiResult<Attachment> {
        require_staff(actor)?;
        req.validate().map_err(ApiError::BadRequest)?;
        self.accessible_message(actor, message_id).await?;

        let attachment = Attachment::new(message_id.to_string(), req);
        self.attachment_repo.create_attachment(&attachment).await?;

        Ok(attachment)
    }

    pub async fn list_attachments(
        &self,
        actor: &Actor,
        message_id: &str,
    ) -> ApiResult<Vec<Attachment>> {
        require_staff(actor)?;
        self.accessible_message(actor, message_id).await?;
        self.attachment_repo.list_message_attachments(message_id).await
    }

    async fn accessible_message(&self, actor: &Actor, message_id: &str) -> ApiResult<Message> {
        let message = self
            .message_repo
            .get_message(message_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;

        let ticket = self
            .ticket_repo
            .get_ticket(&message.ticket_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;
        require_ticket_access(actor, &ticket)?;

        Ok(message)
    }
}
