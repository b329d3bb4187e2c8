//! Prompt templates for the reply and check chains, plus decoding of the
//! model's JSON answer.

use crate::domain::entities::{Message, SearchResult, Ticket, User, Visibility};
use crate::domain::errors::AiError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Write;

pub const REPLY_SYSTEM_PROMPT: &str = "You are a customer support agent for AutoCRM. \
Write clear, friendly and accurate replies. Only state facts found in the ticket, \
the conversation or the help documents. Answer with a single JSON object and nothing else.";

pub const REPLY_TEMPLATE: &str = r#"Draft the next public reply to the customer for this ticket.

## Ticket
{ticket}

## Conversation so far
{history}

## Relevant help documents
{docs}

Respond with JSON of exactly this shape: {"reply": "<the reply text>"}"#;

pub const CHECK_SYSTEM_PROMPT: &str = "You review support replies before they are sent. \
Flag factual errors, missing answers, unclear wording and tone problems. \
Answer with a single JSON object and nothing else.";

pub const CHECK_TEMPLATE: &str = r#"Review the draft reply below for this ticket.

## Ticket
{ticket}

## Conversation so far
{history}

## Relevant help documents
{docs}

## Draft reply
{draft}

Respond with JSON of exactly this shape:
{"is_valid": true or false, "issues": ["..."], "suggestions": ["..."]}"#;

/// Replace `{name}` placeholders in one pass. Unknown placeholders and braces
/// that do not wrap an identifier are kept; substituted values are not rescanned.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let name_len = after
            .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let closed = after[name_len..].starts_with('}');

        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) if closed && !name.is_empty() => {
                out.push_str(value);
                rest = &after[name_len + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn format_ticket_context(ticket: &Ticket) -> String {
    let tags = if ticket.tags.is_empty() {
        "none".to_string()
    } else {
        ticket.tags.join(", ")
    };

    format!(
        "Title: {}\nStatus: {}\nPriority: {}\nTags: {}\nCustomer: {}\n\n{}",
        ticket.title,
        ticket.status,
        ticket.priority,
        tags,
        ticket.customer_email,
        ticket.description.trim()
    )
}

/// Conversation in posting order, one entry per message. Internal notes are marked.
pub fn format_message_history(messages: &[Message], authors: &HashMap<String, User>) -> String {
    if messages.is_empty() {
        return "(no messages yet)".to_string();
    }

    let mut out = String::new();
    for message in messages {
        let author = match authors.get(&message.user_id) {
            Some(user) => format!("{} ({})", user.name, user.role),
            None => "Unknown".to_string(),
        };
        let marker = match message.visibility {
            Visibility::Internal => " [internal note]",
            Visibility::Public => "",
        };
        let _ = writeln!(
            out,
            "[{}] {}{}: {}",
            message.created_at,
            author,
            marker,
            message.content.trim()
        );
    }
    out.trim_end().to_string()
}

pub fn format_docs(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "(no matching help documents)".to_string();
    }

    results
        .iter()
        .map(|r| format!("### {} ({}/{})\n{}", r.title, r.category, r.slug, r.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Strip one surrounding markdown code fence and decode strictly into `T`.
pub fn decode_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, AiError> {
    let body = strip_code_fence(raw.trim());
    serde_json::from_str(body).map_err(|e| AiError::InvalidResponse(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    // Drop the info string (```json) on the opening line
    match inner.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => inner.trim(),
    }
}
