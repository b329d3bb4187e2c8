use crate::{
    domain::entities::{
        DocSummary, DocumentChunk, HelpDoc, ReindexResponse, SearchRequest, SearchResult,
        TextChunk,
    },
    domain::errors::AiError,
    domain::ports::{DocumentRepository, EmbeddingModel},
    domain::services::{rank, require_admin, Actor, Chunker},
    infrastructure::http::middleware::error::{ApiError, ApiResult},
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Chunks sent to the embedding provider per request.
pub const EMBED_BATCH_SIZE: usize = 16;

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid regex"))
}

/// Category and slug path segments; anything else never touches the filesystem.
pub fn is_valid_segment(segment: &str) -> bool {
    segment.len() <= 100 && segment_regex().is_match(segment)
}

/// First `# ` heading, else the slug.
pub fn extract_title(content: &str, slug: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(slug)
        .to_string()
}

/// Split an optional leading `---` block off `content`, returning the tags
/// from its `tags:` line and the remaining body. Tags may be written as
/// `a, b` or `[a, b]`; they are trimmed, lower-cased and de-duplicated.
pub fn split_front_matter(content: &str) -> (Vec<String>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (Vec::new(), content);
    };

    let mut offset = 0;
    let mut tags = Vec::new();
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim();
        if line == "---" {
            return (tags, &rest[offset..]);
        }
        if let Some(value) = line.strip_prefix("tags:") {
            let value = value.trim().trim_start_matches('[').trim_end_matches(']');
            for tag in value.split(',') {
                let tag = tag.trim().trim_matches(|c: char| c == '"' || c == '\'').to_lowercase();
                if !tag.is_empty() && !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
    }

    // Unterminated block: treat the whole file as body
    (Vec::new(), content)
}

#[derive(Clone)]
pub struct DocumentService {
    document_repo: Arc<dyn DocumentRepository>,
    embedder: Arc<dyn EmbeddingModel>,
    docs_path: PathBuf,
    chunker: Chunker,
    default_threshold: f32,
    default_count: usize,
}

impl DocumentService {
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        embedder: Arc<dyn EmbeddingModel>,
        docs_path: PathBuf,
        default_threshold: f32,
        default_count: usize,
    ) -> Self {
        Self {
            document_repo,
            embedder,
            docs_path,
            chunker: Chunker::default(),
            default_threshold,
            default_count,
        }
    }

    pub async fn list_category(&self, category: &str) -> ApiResult<Vec<DocSummary>> {
        if !is_valid_segment(category) {
            return Err(category_not_found());
        }

        let dir = self.docs_path.join(category);
        if !tokio::fs::metadata(&dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(category_not_found());
        }

        let mut docs = Vec::new();
        for slug in markdown_slugs(&dir).await? {
            let doc = self.read_doc(category, &slug).await?;
            docs.push(DocSummary {
                slug: doc.slug,
                title: doc.title,
            });
        }
        Ok(docs)
    }

    pub async fn get_doc(&self, category: &str, slug: &str) -> ApiResult<HelpDoc> {
        if !is_valid_segment(category) || !is_valid_segment(slug) {
            return Err(doc_not_found());
        }
        self.read_doc(category, slug).await
    }

    /// Re-chunk and re-embed every document under the docs root.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn reindex(&self, actor: &Actor) -> ApiResult<ReindexResponse> {
        require_admin(actor)?;

        let mut response = ReindexResponse::default();
        let mut seen = Vec::new();
        for doc in self.load_all().await? {
            let chunks = self.index_document(&doc).await?;
            response.documents += 1;
            response.chunks += chunks;
            seen.push((doc.category, doc.slug));
        }
        response.removed = self.document_repo.prune_documents(&seen).await?;

        tracing::info!(
            documents = response.documents,
            chunks = response.chunks,
            removed = response.removed,
            "help documents reindexed"
        );
        Ok(response)
    }

    pub async fn search(&self, req: &SearchRequest) -> ApiResult<Vec<SearchResult>> {
        req.validate().map_err(ApiError::BadRequest)?;

        let threshold = req.match_threshold.unwrap_or(self.default_threshold);
        let count = req.match_count.unwrap_or(self.default_count);
        self.ranked(req.query.trim(), req.category.as_deref(), threshold, count)
            .await
    }

    /// Best matching excerpts for free text, with the configured defaults.
    pub async fn related_docs(&self, query: &str) -> ApiResult<Vec<SearchResult>> {
        self.ranked(query, None, self.default_threshold, self.default_count)
            .await
    }

    async fn ranked(
        &self,
        query: &str,
        category: Option<&str>,
        threshold: f32,
        count: usize,
    ) -> ApiResult<Vec<SearchResult>> {
        let chunks = self.document_repo.list_chunks(category).await?;
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| AiError::Provider("embedding response was empty".to_string()))?;

        Ok(rank(&chunks, &query_vector, threshold, count))
    }

    async fn index_document(&self, doc: &HelpDoc) -> ApiResult<usize> {
        let text_chunks: Vec<TextChunk> = self.chunker.chunks(&doc.content).collect();

        let mut stored = Vec::with_capacity(text_chunks.len());
        for batch in text_chunks.chunks(EMBED_BATCH_SIZE) {
            let inputs: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed(&inputs).await?;
            if vectors.len() != batch.len() {
                return Err(AiError::Provider(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                ))
                .into());
            }
            stored.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(vectors)
                    .map(|(chunk, vector)| DocumentChunk::new(doc, chunk, vector)),
            );
        }

        self.document_repo
            .replace_document_chunks(&doc.category, &doc.slug, &stored)
            .await?;
        metrics::counter!("autocrm_doc_chunks_indexed_total").increment(stored.len() as u64);

        Ok(stored.len())
    }

    async fn load_all(&self) -> ApiResult<Vec<HelpDoc>> {
        let mut categories = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.docs_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.docs_path, e)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.docs_path, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if let Some(name) = entry.file_name().to_str() {
                if is_dir && is_valid_segment(name) {
                    categories.push(name.to_string());
                }
            }
        }
        categories.sort();

        let mut docs = Vec::new();
        for category in categories {
            for slug in markdown_slugs(&self.docs_path.join(&category)).await? {
                docs.push(self.read_doc(&category, &slug).await?);
            }
        }
        Ok(docs)
    }

    async fn read_doc(&self, category: &str, slug: &str) -> ApiResult<HelpDoc> {
        let path = self.docs_path.join(category).join(format!("{}.md", slug));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(doc_not_found()),
            Err(e) => return Err(io_error(&path, e)),
        };

        let (tags, body) = split_front_matter(&content);
        Ok(HelpDoc {
            category: category.to_string(),
            slug: slug.to_string(),
            title: extract_title(body, slug),
            tags,
            content: body.to_string(),
        })
    }
}

/// Sorted slugs of the `*.md` files in `dir` with valid names.
async fn markdown_slugs(dir: &Path) -> ApiResult<Vec<String>> {
    let mut slugs = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| io_error(dir, e))?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if is_valid_segment(stem) {
                slugs.push(stem.to_string());
            }
        }
    }

    slugs.sort();
    Ok(slugs)
}

fn category_not_found() -> ApiError {
    ApiError::NotFound("Category not found".to_string())
}

fn doc_not_found() -> ApiError {
    ApiError::NotFound("Document not found".to_string())
}

fn io_error(path: &Path, err: std::io::Error) -> ApiError {
    tracing::error!(path = %path.display(), error = %err, "help document read failed");
    ApiError::Internal("Failed to read help documents".to_string())
}
