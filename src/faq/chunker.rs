//! Whitespace-token chunking with overlap.
//!
//! Text is split into token spans (a run of non-whitespace plus its
//! trailing whitespace; the first span also carries leading whitespace).
//! Spans tile the input exactly, so every chunk is a verbatim substring
//! and concatenating non-overlapped chunks reconstructs the original.

/// A chunk of text plus its token (span) count.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub token_count: usize,
}

/// Split text into overlapping chunks of at most `chunk_size` tokens,
/// stepping `chunk_size - overlap` tokens between windows. An overlap
/// `>= chunk_size` is clamped down to avoid a zero step.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    if text.trim().is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let overlap = if overlap >= chunk_size {
        tracing::warn!(chunk_size, overlap, "overlap clamped below chunk size");
        chunk_size - 1
    } else {
        overlap
    };
    let step = chunk_size - overlap;

    let spans = token_spans(text);
    if spans.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + chunk_size).min(spans.len());
        let byte_start = spans[start].0;
        let byte_end = spans[end - 1].1;
        chunks.push(Chunk {
            content: text[byte_start..byte_end].to_string(),
            token_count: end - start,
        });
        if end == spans.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Byte ranges of token spans. Each span covers one non-whitespace run
/// and any whitespace that follows it; leading whitespace attaches to
/// the first span. Spans cover the full input with no gaps.
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0usize;
    let mut span_start = 0usize;
    let mut in_token = false;
    let mut seen_token = false;

    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_token = false;
        } else {
            if !in_token && seen_token {
                // whitespace run ended, close the previous span
                spans.push((span_start, i));
                span_start = i;
            }
            in_token = true;
            seen_token = true;
        }
        pos = i + ch.len_utf8();
    }

    if seen_token {
        spans.push((span_start, pos));
    }
    spans
}
