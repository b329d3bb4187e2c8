use crate::domain::entities::TextChunk;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::OnceLock;

pub const DEFAULT_MAX_CHARS: usize = 1000;
pub const DEFAULT_MIN_CHARS: usize = 100;

/// Words whose trailing period does not end a sentence (compared lower-cased,
/// without the final period).
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "inc", "ltd",
    "co", "no", "fig", "approx", "cf", "al", "dept", "est",
];

fn html_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"))
}

/// Canonical form for chunking: LF line endings, no HTML comments, no trailing
/// whitespace, at most one blank line in a row, no leading/trailing blank lines.
pub fn normalize_markdown(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");
    let without_comments = html_comment_regex().replace_all(&unified, "");

    let mut out = String::with_capacity(without_comments.len());
    let mut pending_blank = false;

    for line in without_comments.lines().map(str::trim_end) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }

    out
}

/// Splits markdown into search-sized chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
    min_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS, DEFAULT_MIN_CHARS)
    }
}

impl Chunker {
    pub fn new(max_chars: usize, min_chars: usize) -> Self {
        let max_chars = max_chars.max(1);
        Self {
            max_chars,
            min_chars: min_chars.min(max_chars),
        }
    }

    /// Normalize `text` and return a lazy iterator over its chunks.
    pub fn chunks(&self, text: &str) -> Chunks {
        Chunks {
            paragraphs: paragraphs(&normalize_markdown(text)),
            buffer: None,
            max_chars: self.max_chars,
            min_chars: self.min_chars,
        }
    }
}

#[derive(Debug)]
struct Paragraph {
    text: String,
    line_start: usize,
    line_end: usize,
}

/// Blank-line separated blocks of normalized text with 1-based line numbers.
fn paragraphs(normalized: &str) -> VecDeque<Paragraph> {
    let mut out = VecDeque::new();
    let mut current: Option<Paragraph> = None;

    for (idx, line) in normalized.lines().enumerate() {
        let line_no = idx + 1;
        if line.is_empty() {
            out.extend(current.take());
            continue;
        }
        match current.as_mut() {
            Some(p) => {
                p.text.push('\n');
                p.text.push_str(line);
                p.line_end = line_no;
            }
            None => {
                current = Some(Paragraph {
                    text: line.to_string(),
                    line_start: line_no,
                    line_end: line_no,
                })
            }
        }
    }
    out.extend(current);
    out
}

pub struct Chunks {
    paragraphs: VecDeque<Paragraph>,
    buffer: Option<Paragraph>,
    max_chars: usize,
    min_chars: usize,
}

impl Chunks {
    /// Cut the oversized buffer once, returning the head and keeping the rest.
    fn split_buffer(&mut self) -> Option<TextChunk> {
        let buffer = self.buffer.take()?;
        let cut = find_break(&buffer.text, self.min_chars, self.max_chars);

        let head = &buffer.text[..cut];
        let rest = buffer.text[cut..].trim_start();
        let rest_offset = buffer.text.len() - rest.len();

        let head_end = buffer.line_start + newlines(head);
        let rest_start = buffer.line_start + newlines(&buffer.text[..rest_offset]);

        let chunk = TextChunk {
            content: head.to_string(),
            line_start: buffer.line_start,
            line_end: head_end,
        };

        if !rest.is_empty() {
            self.buffer = Some(Paragraph {
                text: rest.to_string(),
                line_start: rest_start,
                line_end: buffer.line_end,
            });
        }

        Some(chunk)
    }

    fn next_raw(&mut self) -> Option<TextChunk> {
        loop {
            if let Some(buffer) = &self.buffer {
                if char_len(&buffer.text) > self.max_chars {
                    return self.split_buffer();
                }
            }

            let Some(paragraph) = self.paragraphs.pop_front() else {
                return self.buffer.take().map(into_chunk);
            };

            match self.buffer.as_mut() {
                None => self.buffer = Some(paragraph),
                Some(buffer) => {
                    let joined = char_len(&buffer.text) + 2 + char_len(&paragraph.text);
                    if joined > self.max_chars && char_len(&buffer.text) >= self.min_chars {
                        return self.buffer.replace(paragraph).map(into_chunk);
                    }
                    // Undersized buffers absorb the next paragraph; the split
                    // above then cuts inside [min, max].
                    buffer.text.push_str("\n\n");
                    buffer.text.push_str(&paragraph.text);
                    buffer.line_end = paragraph.line_end;
                }
            }
        }
    }
}

impl Iterator for Chunks {
    type Item = TextChunk;

    fn next(&mut self) -> Option<TextChunk> {
        loop {
            let chunk = self.next_raw()?;
            if chunk.content.chars().any(char::is_alphanumeric) {
                return Some(chunk);
            }
        }
    }
}

fn into_chunk(p: Paragraph) -> TextChunk {
    TextChunk {
        content: p.text,
        line_start: p.line_start,
        line_end: p.line_end,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn newlines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}

/// Byte offset at which to cut `text` so the head holds between `min` and
/// `max` characters: last sentence end, else last word end, else exactly `max`.
fn find_break(text: &str, min: usize, max: usize) -> usize {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let limit = max.min(chars.len());
    let byte_at = |i: usize| chars.get(i).map(|(b, _)| *b).unwrap_or(text.len());
    let lower = min.max(1);

    for end in (lower..=limit).rev() {
        let (pos, c) = chars[end - 1];
        let followed_by_space = chars.get(end).map_or(true, |(_, n)| n.is_whitespace());
        if matches!(c, '.' | '!' | '?')
            && followed_by_space
            && !(c == '.' && ends_with_abbreviation(&text[..pos]))
        {
            return byte_at(end);
        }
    }

    for end in (lower..=limit).rev() {
        if end >= chars.len() {
            continue;
        }
        if chars[end].1.is_whitespace() && !chars[end - 1].1.is_whitespace() {
            return byte_at(end);
        }
    }

    byte_at(limit.max(1))
}

/// Whether the word right before a period is an abbreviation or an initial.
fn ends_with_abbreviation(before_period: &str) -> bool {
    let word = before_period
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    if word.is_empty() {
        return false;
    }
    if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
        return true;
    }
    ABBREVIATIONS.contains(&word.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_normalize_markdown() {
        let input = "# Title  \r\n\r\n\r\n<!-- hidden\nnote -->Intro text\t\n\n\n\nBody\n\n";
        assert_eq!(normalize_markdown(input), "# Title\n\nIntro text\n\nBody");
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let chunks: Vec<_> = Chunker::default().chunks("# Title\n\nHello there.").collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "# Title\n\nHello there.");
        assert_eq!((chunks[0].line_start, chunks[0].line_end), (1, 3));
    }

    #[test]
    fn test_paragraphs_pack_up_to_max() {
        let para = "word ".repeat(30).trim_end().to_string(); // 149 chars
        let text = vec![para.as_str(); 10].join("\n\n");
        let chunker = Chunker::new(400, 100);
        let chunks: Vec<_> = chunker.chunks(&text).collect();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 400);
        }
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.content.chars().count() >= 100);
        }
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(squash(&joined), squash(&text));
    }

    #[test]
    fn test_oversized_paragraph_cuts_at_sentence() {
        let sentence = "This sentence has exactly enough words to matter. ";
        let text = sentence.repeat(40);
        let chunker = Chunker::new(300, 100);
        let chunks: Vec<_> = chunker.chunks(&text).collect();

        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.content.ends_with('.'), "chunk: {:?}", chunk.content);
            let len = chunk.content.chars().count();
            assert!((100..=300).contains(&len));
        }
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(squash(&joined), squash(&text));
    }

    #[test]
    fn test_abbreviations_are_not_sentence_ends() {
        assert!(ends_with_abbreviation("see e.g"));
        assert!(ends_with_abbreviation("call Dr"));
        assert!(ends_with_abbreviation("John F"));
        assert!(ends_with_abbreviation("(etc"));
        assert!(!ends_with_abbreviation("the end"));

        let text = format!("{} e.g. more words follow here", "a".repeat(20));
        let cut = find_break(&text, 5, 30);
        assert_ne!(&text[..cut], format!("{} e.g.", "a".repeat(20)));
    }

    #[test]
    fn test_falls_back_to_whitespace_then_hard_cut() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let cut = find_break(text, 5, 20);
        assert_eq!(&text[..cut], "alpha beta gamma");

        let solid = "x".repeat(50);
        let cut = find_break(&solid, 5, 20);
        assert_eq!(cut, 20);
    }

    #[test]
    fn test_hard_cut_respects_char_boundaries() {
        let text = "é".repeat(30);
        let cut = find_break(&text, 5, 10);
        assert_eq!(text[..cut].chars().count(), 10);
    }

    #[test]
    fn test_line_numbers_follow_split() {
        let first = "First paragraph is here and it is long enough.";
        let second = "Second paragraph follows.";
        let text = format!("{}\n\n{}", first, second);
        let chunks: Vec<_> = Chunker::new(50, 10).chunks(&text).collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].line_start, chunks[0].line_end), (1, 1));
        assert_eq!((chunks[1].line_start, chunks[1].line_end), (3, 3));
    }

    #[test]
    fn test_skips_chunks_without_alphanumerics() {
        let chunks: Vec<_> = Chunker::new(20, 1).chunks("---\n\n***").collect();
        assert!(chunks.is_empty());
    }
}
