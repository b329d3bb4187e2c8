use crate::domain::entities::{
    field_map_from_json, field_map_to_json, Page, Ticket, TicketChanges, TicketPredicate,
    TicketStatus,
};
use crate::domain::errors::{decode_error, DatabaseResultExt};
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{any::AnyRow, Any, QueryBuilder, Row};

const TICKET_COLUMNS: &str = "id, title, description, status, priority, tags, assigned_to, \
     created_by, customer_email, custom_fields, created_at, updated_at, last_activity_at";

fn row_to_ticket(row: &AnyRow) -> Result<Ticket, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    let tags: String = row.try_get("tags")?;
    let custom_fields: String = row.try_get("custom_fields")?;

    Ok(Ticket {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: status.parse().map_err(decode_error)?,
        priority: priority.parse().map_err(decode_error)?,
        tags: serde_json::from_str(&tags).map_err(|e| decode_error(e.to_string()))?,
        // The Any driver cannot decode NULL into Option<String>
        assigned_to: row.try_get::<String, _>("assigned_to").ok(),
        created_by: row.try_get("created_by")?,
        customer_email: row.try_get("customer_email")?,
        custom_fields: field_map_from_json(&custom_fields)
            .map_err(|e| decode_error(e.to_string()))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_activity_at: row.try_get("last_activity_at")?,
    })
}

fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// Append ` AND <predicate>` for each predicate. The builder must already
/// hold a `WHERE` clause.
fn push_predicates(qb: &mut QueryBuilder<'_, Any>, predicates: &[TicketPredicate]) {
    for predicate in predicates {
        match predicate {
            TicketPredicate::StatusIn(statuses) => {
                qb.push(" AND status IN (");
                let mut list = qb.separated(", ");
                for status in statuses {
                    list.push_bind(status.as_str().to_string());
                }
                list.push_unseparated(")");
            }
            TicketPredicate::PriorityIn(priorities) => {
                qb.push(" AND priority IN (");
                let mut list = qb.separated(", ");
                for priority in priorities {
                    list.push_bind(priority.as_str().to_string());
                }
                list.push_unseparated(")");
            }
            TicketPredicate::AssignedTo(user_id) => {
                qb.push(" AND assigned_to = ").push_bind(user_id.clone());
            }
            TicketPredicate::Unassigned => {
                qb.push(" AND assigned_to IS NULL");
            }
            TicketPredicate::AssignedToOrUnassigned(user_id) => {
                qb.push(" AND (assigned_to = ")
                    .push_bind(user_id.clone())
                    .push(" OR assigned_to IS NULL)");
            }
            TicketPredicate::CreatedBy(user_id) => {
                qb.push(" AND created_by = ").push_bind(user_id.clone());
            }
            TicketPredicate::CustomerEmail(email) => {
                qb.push(" AND customer_email = ").push_bind(email.clone());
            }
            TicketPredicate::Search(pattern) => {
                qb.push(" AND (title LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR description LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\')");
            }
            TicketPredicate::HasTag(tag) => {
                qb.push(" AND EXISTS (SELECT 1 FROM json_each(tickets.tags) WHERE json_each.value = ")
                    .push_bind(tag.clone())
                    .push(")");
            }
        }
    }
}

/// Append the `SET` list for `changes`. Timestamps are always bumped.
fn push_changes(qb: &mut QueryBuilder<'_, Any>, changes: &TicketChanges, now: &str) {
    qb.push(" SET updated_at = ")
        .push_bind(now.to_string())
        .push(", last_activity_at = ")
        .push_bind(now.to_string());

    if let Some(title) = &changes.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    if let Some(description) = &changes.description {
        qb.push(", description = ").push_bind(description.clone());
    }
    if let Some(status) = changes.status {
        qb.push(", status = ").push_bind(status.as_str().to_string());
    }
    if let Some(priority) = changes.priority {
        qb.push(", priority = ").push_bind(priority.as_str().to_string());
    }
    if let Some(tags) = &changes.tags {
        qb.push(", tags = ").push_bind(tags_to_json(tags));
    }
    if let Some(fields) = &changes.custom_fields {
        qb.push(", custom_fields = ").push_bind(field_map_to_json(fields));
    }
    if let Some(assigned_to) = &changes.assigned_to {
        qb.push(", assigned_to = ").push_bind(assigned_to.clone());
    }
}

fn push_id_list(qb: &mut QueryBuilder<'_, Any>, ids: &[String]) {
    qb.push(" IN (");
    let mut list = qb.separated(", ");
    for id in ids {
        list.push_bind(id.clone());
    }
    list.push_unseparated(")");
}

#[async_trait]
impl TicketRepository for Database {
    async fn create_ticket(&self, ticket: &Ticket) -> ApiResult<()> {
        sqlx::query(&format!(
            "INSERT INTO tickets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TICKET_COLUMNS
        ))
        .bind(&ticket.id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(tags_to_json(&ticket.tags))
        .bind(ticket.assigned_to.clone())
        .bind(&ticket.created_by)
        .bind(&ticket.customer_email)
        .bind(field_map_to_json(&ticket.custom_fields))
        .bind(&ticket.created_at)
        .bind(&ticket.updated_at)
        .bind(&ticket.last_activity_at)
        .execute(&self.pool)
        .await
        .op("create_ticket")?;

        Ok(())
    }

    async fn get_ticket(&self, id: &str) -> ApiResult<Option<Ticket>> {
        let row = sqlx::query(&format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get_ticket")?;

        Ok(row.as_ref().map(row_to_ticket).transpose().op("get_ticket")?)
    }

    async fn get_tickets_by_ids(&self, ids: &[String]) -> ApiResult<Vec<Ticket>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Any>::new(format!("SELECT {} FROM tickets WHERE id", TICKET_COLUMNS));
        push_id_list(&mut qb, ids);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .op("get_tickets_by_ids")?;

        Ok(rows
            .iter()
            .map(row_to_ticket)
            .collect::<Result<Vec<_>, _>>()
            .op("get_tickets_by_ids")?)
    }

    async fn update_ticket(&self, id: &str, changes: &TicketChanges, now: &str) -> ApiResult<()> {
        let mut qb = QueryBuilder::<Any>::new("UPDATE tickets");
        push_changes(&mut qb, changes, now);
        qb.push(" WHERE id = ").push_bind(id.to_string());

        qb.build()
            .execute(&self.pool)
            .await
            .op("update_ticket")?;

        Ok(())
    }

    async fn list_tickets(
        &self,
        predicates: &[TicketPredicate],
        page: Page,
    ) -> ApiResult<(Vec<Ticket>, i64)> {
        let total = self.count_tickets(predicates).await?;

        let mut qb = QueryBuilder::<Any>::new(format!("SELECT {} FROM tickets WHERE 1 = 1", TICKET_COLUMNS));
        push_predicates(&mut qb, predicates);
        qb.push(" ORDER BY last_activity_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list_tickets")?;

        let tickets = rows
            .iter()
            .map(row_to_ticket)
            .collect::<Result<Vec<_>, _>>()
            .op("list_tickets")?;

        Ok((tickets, total))
    }

    async fn count_tickets(&self, predicates: &[TicketPredicate]) -> ApiResult<i64> {
        let mut qb = QueryBuilder::<Any>::new("SELECT COUNT(*) FROM tickets WHERE 1 = 1");
        push_predicates(&mut qb, predicates);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .op("count_tickets")?;

        Ok(count)
    }

    async fn count_active_tickets(&self, customer_email: &str) -> ApiResult<i64> {
        self.count_tickets(&[
            TicketPredicate::CustomerEmail(customer_email.to_string()),
            TicketPredicate::StatusIn(TicketStatus::ACTIVE.to_vec()),
        ])
        .await
    }

    async fn delete_ticket(&self, id: &str) -> ApiResult<()> {
        sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .op("delete_ticket")?;

        Ok(())
    }

    async fn bulk_update_tickets(
        &self,
        ids: &[String],
        changes: &TicketChanges,
        now: &str,
    ) -> ApiResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Any>::new("UPDATE tickets");
        push_changes(&mut qb, changes, now);
        qb.push(" WHERE id");
        push_id_list(&mut qb, ids);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .op("bulk_update_tickets")?;

        Ok(result.rows_affected())
    }

    async fn touch_last_activity(&self, id: &str, now: &str) -> ApiResult<()> {
        sqlx::query("UPDATE tickets SET last_activity_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .op("touch_last_activity")?;

        Ok(())
    }
}
