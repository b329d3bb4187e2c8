use crate::{
    application::services::{DocumentService, TicketService},
    domain::entities::{
        AiReplyResponse, ChatMessage, DocSource, MessageCheck, ReplyDraft, SearchResult, Ticket,
        User,
    },
    domain::errors::AiError,
    domain::ports::{ChatModel, MessageRepository, UserRepository},
    domain::services::{prompts, require_staff, Actor},
    infrastructure::http::middleware::error::{ApiError, ApiResult},
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Ticket context shared by both chains.
struct TicketContext {
    ticket: String,
    history: String,
    docs: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct AiService {
    ticket_service: TicketService,
    document_service: DocumentService,
    message_repo: Arc<dyn MessageRepository>,
    user_repo: Arc<dyn UserRepository>,
    chat: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl AiService {
    pub fn new(
        ticket_service: TicketService,
        document_service: DocumentService,
        message_repo: Arc<dyn MessageRepository>,
        user_repo: Arc<dyn UserRepository>,
        chat: Arc<dyn ChatModel>,
        timeout: Duration,
    ) -> Self {
        Self {
            ticket_service,
            document_service,
            message_repo,
            user_repo,
            chat,
            timeout,
        }
    }

    /// Draft a reply for the ticket. Nothing is stored.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn generate_reply(&self, actor: &Actor, ticket_id: &str) -> ApiResult<AiReplyResponse> {
        require_staff(actor)?;
        let ticket = self.ticket_service.get_ticket(actor, ticket_id).await?;

        self.race("reply", async {
            let context = self.context(&ticket).await?;
            let docs = prompts::format_docs(&context.docs);
            let prompt = prompts::render(
                prompts::REPLY_TEMPLATE,
                &[
                    ("ticket", context.ticket.as_str()),
                    ("history", context.history.as_str()),
                    ("docs", docs.as_str()),
                ],
            );

            let raw = self
                .chat
                .complete(vec![
                    ChatMessage::system(prompts::REPLY_SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ])
                .await?;
            let draft: ReplyDraft = prompts::decode_model_json(&raw)?;

            Ok::<_, ApiError>(AiReplyResponse {
                reply: draft.reply,
                sources: sources(&context.docs),
            })
        })
        .await
    }

    /// Review a staff-written draft against the ticket context.
    #[tracing::instrument(skip(self, actor, draft), fields(actor_id = %actor.id))]
    pub async fn check_reply(
        &self,
        actor: &Actor,
        ticket_id: &str,
        draft: &str,
    ) -> ApiResult<MessageCheck> {
        require_staff(actor)?;
        if draft.trim().is_empty() {
            return Err(ApiError::BadRequest("Draft cannot be empty".to_string()));
        }
        let ticket = self.ticket_service.get_ticket(actor, ticket_id).await?;

        self.race("check", async {
            let context = self.context(&ticket).await?;
            let docs = prompts::format_docs(&context.docs);
            let prompt = prompts::render(
                prompts::CHECK_TEMPLATE,
                &[
                    ("ticket", context.ticket.as_str()),
                    ("history", context.history.as_str()),
                    ("docs", docs.as_str()),
                    ("draft", draft.trim()),
                ],
            );

            let raw = self
                .chat
                .complete(vec![
                    ChatMessage::system(prompts::CHECK_SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ])
                .await?;
            Ok::<_, ApiError>(prompts::decode_model_json::<MessageCheck>(&raw)?)
        })
        .await
    }

    /// Run a chain against the configured timeout and record its outcome.
    async fn race<T>(
        &self,
        chain: &'static str,
        fut: impl Future<Output = ApiResult<T>>,
    ) -> ApiResult<T> {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout(self.timeout.as_secs()).into()),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(ApiError::Ai(AiError::Timeout(_))) => "timeout",
            Err(ApiError::Ai(AiError::InvalidResponse(_))) => "invalid_response",
            Err(_) => "error",
        };
        metrics::counter!("autocrm_ai_requests_total", "chain" => chain, "outcome" => outcome)
            .increment(1);

        result
    }

    /// Message history and help-doc excerpts are fetched concurrently.
    async fn context(&self, ticket: &Ticket) -> ApiResult<TicketContext> {
        let query = format!("{}\n{}", ticket.title, ticket.description);
        let (history, docs) = futures::try_join!(
            self.history(ticket),
            self.document_service.related_docs(&query)
        )?;

        Ok(TicketContext {
            ticket: prompts::format_ticket_context(ticket),
            history,
            docs,
        })
    }

    async fn history(&self, ticket: &Ticket) -> ApiResult<String> {
        let messages = self.message_repo.get_ticket_messages(&ticket.id, true).await?;

        let mut authors: HashMap<String, User> = HashMap::new();
        for message in &messages {
            if authors.contains_key(&message.user_id) {
                continue;
            }
            if let Some(user) = self.user_repo.get_user_by_id(&message.user_id).await? {
                authors.insert(user.id.clone(), user);
            }
        }

        Ok(prompts::format_message_history(&messages, &authors))
    }
}

/// Distinct documents behind the excerpts, in rank order.
fn sources(docs: &[SearchResult]) -> Vec<DocSource> {
    let mut out: Vec<DocSource> = Vec::new();
    for doc in docs {
        if out
            .iter()
            .any(|s| s.category == doc.category && s.slug == doc.slug)
        {
            continue;
        }
        out.push(DocSource {
            category: doc.category.clone(),
            slug: doc.slug.clone(),
            title: doc.title.clone(),
        });
    }
    out
}
