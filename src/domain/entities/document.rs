use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MATCH_COUNT: usize = 5;
pub const MAX_MATCH_COUNT: usize = 20;
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.3;

/// Stored, embedded slice of a help document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub category: String,
    pub slug: String,
    pub title: String,
    pub tags: Vec<String>,
    pub content: String,
    pub line_start: i64,
    pub line_end: i64,
    #[serde(skip_serializing)]
    pub embedding: Vec<f32>,
    pub created_at: String,
}

impl DocumentChunk {
    pub fn new(doc: &HelpDoc, chunk: TextChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category: doc.category.clone(),
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            tags: doc.tags.clone(),
            content: chunk.content,
            line_start: chunk.line_start as i64,
            line_end: chunk.line_end as i64,
            embedding,
            created_at: crate::shared::utils::now_rfc3339(),
        }
    }
}

/// Chunker output. Line numbers are 1-based and inclusive, relative to the
/// normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    pub line_start: usize,
    pub line_end: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelpDoc {
    pub category: String,
    pub slug: String,
    pub title: String,
    /// From the `tags:` line of the front matter block, if any.
    pub tags: Vec<String>,
    /// Body without the front matter block.
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocSummary {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub category: Option<String>,
    pub match_threshold: Option<f32>,
    pub match_count: Option<usize>,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.query.trim().is_empty() {
            return Err("Search query cannot be empty".to_string());
        }
        if let Some(threshold) = self.match_threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err("match_threshold must be between -1 and 1".to_string());
            }
        }
        if let Some(count) = self.match_count {
            if count == 0 || count > MAX_MATCH_COUNT {
                return Err(format!("match_count must be between 1 and {}", MAX_MATCH_COUNT));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub category: String,
    pub slug: String,
    pub title: String,
    pub tags: Vec<String>,
    pub content: String,
    pub line_start: i64,
    pub line_end: i64,
    pub similarity: f32,
}

impl SearchResult {
    pub fn from_chunk(chunk: &DocumentChunk, similarity: f32) -> Self {
        Self {
            category: chunk.category.clone(),
            slug: chunk.slug.clone(),
            title: chunk.title.clone(),
            tags: chunk.tags.clone(),
            content: chunk.content.clone(),
            line_start: chunk.line_start,
            line_end: chunk.line_end,
            similarity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReindexResponse {
    pub documents: usize,
    pub chunks: usize,
    /// Previously indexed documents no longer on disk.
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_bounds() {
        let mut req = SearchRequest {
            query: "reset password".into(),
            category: None,
            match_threshold: None,
            match_count: None,
        };
        assert!(req.validate().is_ok());

        req.match_count = Some(0);
        assert!(req.validate().is_err());
        req.match_count = Some(MAX_MATCH_COUNT);
        assert!(req.validate().is_ok());

        req.match_threshold = Some(1.5);
        assert!(req.validate().is_err());

        req.match_threshold = None;
        req.query = " ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_embedding_not_serialized() {
        let doc = HelpDoc {
            category: "billing".into(),
            slug: "refunds".into(),
            title: "Refunds".into(),
            tags: vec!["payments".into()],
            content: String::new(),
        };
        let chunk = DocumentChunk::new(
            &doc,
            TextChunk {
                content: "Refunds take five days.".into(),
                line_start: 1,
                line_end: 1,
            },
            vec![0.1, 0.2],
        );
        let json = serde_json::to_value(&chunk).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["tags"][0], "payments");
    }
}
