use crate::domain::entities::{Page, Ticket, TicketChanges, TicketPredicate};
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create_ticket(&self, ticket: &Ticket) -> ApiResult<()>;
    async fn get_ticket(&self, id: &str) -> ApiResult<Option<Ticket>>;
    async fn get_tickets_by_ids(&self, ids: &[String]) -> ApiResult<Vec<Ticket>>;
    /// Apply `changes` and bump `updated_at`/`last_activity_at` to `now`.
    async fn update_ticket(&self, id: &str, changes: &TicketChanges, now: &str) -> ApiResult<()>;
    /// Page of tickets matching every predicate, newest activity first, plus the total.
    async fn list_tickets(
        &self,
        predicates: &[TicketPredicate],
        page: Page,
    ) -> ApiResult<(Vec<Ticket>, i64)>;
    async fn count_tickets(&self, predicates: &[TicketPredicate]) -> ApiResult<i64>;
    /// Open plus pending tickets for a customer.
    async fn count_active_tickets(&self, customer_email: &str) -> ApiResult<i64>;
    async fn delete_ticket(&self, id: &str) -> ApiResult<()>;
    /// One UPDATE over the whole id set. Returns the number of rows changed.
    async fn bulk_update_tickets(
        &self,
        ids: &[String],
        changes: &TicketChanges,
        now: &str,
    ) -> ApiResult<u64>;
    async fn touch_last_activity(&self, id: &str, now: &str) -> ApiResult<()>;
}
