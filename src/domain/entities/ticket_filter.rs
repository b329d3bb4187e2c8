use crate::domain::entities::{TicketPriority, TicketStatus};

/// Who a listed ticket must be assigned to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssigneeFilter {
    #[default]
    Any,
    Unassigned,
    User(String),
    UserOrUnassigned(String),
}

/// Caller-supplied ticket list filter. Every set field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Vec<TicketStatus>,
    pub priority: Vec<TicketPriority>,
    pub assignee: AssigneeFilter,
    pub created_by: Option<String>,
    pub customer_email: Option<String>,
    pub search: Option<String>,
    pub tags: Vec<String>,
}

/// One SQL condition; a filter is the AND of its predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketPredicate {
    StatusIn(Vec<TicketStatus>),
    PriorityIn(Vec<TicketPriority>),
    AssignedTo(String),
    Unassigned,
    AssignedToOrUnassigned(String),
    CreatedBy(String),
    CustomerEmail(String),
    /// LIKE pattern with `%`, `_` and `\` already escaped and wrapped in `%`.
    Search(String),
    HasTag(String),
}

impl TicketFilter {
    pub fn predicates(&self) -> Vec<TicketPredicate> {
        let mut predicates = Vec::new();

        if !self.status.is_empty() {
            predicates.push(TicketPredicate::StatusIn(self.status.clone()));
        }
        if !self.priority.is_empty() {
            predicates.push(TicketPredicate::PriorityIn(self.priority.clone()));
        }

        match &self.assignee {
            AssigneeFilter::Any => {}
            AssigneeFilter::Unassigned => predicates.push(TicketPredicate::Unassigned),
            AssigneeFilter::User(id) => predicates.push(TicketPredicate::AssignedTo(id.clone())),
            AssigneeFilter::UserOrUnassigned(id) => {
                predicates.push(TicketPredicate::AssignedToOrUnassigned(id.clone()))
            }
        }

        if let Some(created_by) = &self.created_by {
            predicates.push(TicketPredicate::CreatedBy(created_by.clone()));
        }
        if let Some(email) = &self.customer_email {
            predicates.push(TicketPredicate::CustomerEmail(email.trim().to_lowercase()));
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            predicates.push(TicketPredicate::Search(like_pattern(term)));
        }
        for tag in &self.tags {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() {
                predicates.push(TicketPredicate::HasTag(tag));
            }
        }

        predicates
    }
}

/// Escape LIKE wildcards (escape char `\`) and wrap in `%`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_predicates() {
        assert!(TicketFilter::default().predicates().is_empty());
    }

    #[test]
    fn test_predicates_are_collected_in_order() {
        let filter = TicketFilter {
            status: vec![TicketStatus::Open, TicketStatus::Pending],
            assignee: AssigneeFilter::Unassigned,
            customer_email: Some(" Jane@Example.com ".into()),
            search: Some("refund".into()),
            tags: vec!["Billing".into(), " ".into()],
            ..Default::default()
        };

        assert_eq!(
            filter.predicates(),
            vec![
                TicketPredicate::StatusIn(vec![TicketStatus::Open, TicketStatus::Pending]),
                TicketPredicate::Unassigned,
                TicketPredicate::CustomerEmail("jane@example.com".into()),
                TicketPredicate::Search("%refund%".into()),
                TicketPredicate::HasTag("billing".into()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = TicketFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(filter.predicates().is_empty());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
