use crate::domain::entities::{DocumentChunk, SearchResult};

/// Cosine similarity in [-1, 1]. Mismatched or zero-length vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Chunks scoring at least `threshold` against `query`, best first, at most `count`.
pub fn rank(
    chunks: &[DocumentChunk],
    query: &[f32],
    threshold: f32,
    count: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<(f32, &DocumentChunk)> = chunks
        .iter()
        .map(|chunk| (cosine_similarity(&chunk.embedding, query), chunk))
        .filter(|(score, _)| *score >= threshold)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(count);

    scored
        .into_iter()
        .map(|(score, chunk)| SearchResult::from_chunk(chunk, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(slug: &str, embedding: Vec<f32>) -> DocumentChunk {
        DocumentChunk {
            id: slug.to_string(),
            category: "general".into(),
            slug: slug.to_string(),
            title: slug.to_string(),
            tags: vec![],
            content: format!("content of {}", slug),
            line_start: 1,
            line_end: 1,
            embedding,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_rank_filters_sorts_and_truncates() {
        let chunks = vec![
            chunk("far", vec![0.0, 1.0]),
            chunk("near", vec![0.9, 0.1]),
            chunk("exact", vec![1.0, 0.0]),
            chunk("close", vec![0.7, 0.3]),
        ];

        let results = rank(&chunks, &[1.0, 0.0], 0.5, 2);
        let slugs: Vec<_> = results.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["exact", "near"]);

        let all = rank(&chunks, &[1.0, 0.0], 0.5, 10);
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }
}
