//! Context assembly from ranked document chunks

use super::document::DocumentChunk;

/// Source label used when a chunk carries none
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Deterministic serializer turning ranked chunks into the single context
/// string handed to the generator.
///
/// One block per chunk, `[Chunk i]` numbering 1-based in input order, blocks
/// separated by a blank line. Never reorders, filters, or deduplicates. An
/// optional character budget truncates assembly: blocks are appended until
/// the budget would be exceeded, the current block is cut to exactly fill
/// what remains, and later blocks are never considered.
#[derive(Debug, Clone, Default)]
pub struct ContextFormatter {
    max_chars: Option<usize>,
}

impl ContextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total output to `max_chars` characters
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars: Some(max_chars),
        }
    }

    /// Format chunks into a single context string
    pub fn format(&self, chunks: &[DocumentChunk]) -> String {
        match self.max_chars {
            None => render_unbounded(chunks),
            Some(budget) => render_budgeted(chunks, budget),
        }
    }
}

fn render_block(index: usize, chunk: &DocumentChunk) -> String {
    let source = chunk.source.as_deref().unwrap_or(UNKNOWN_SOURCE);
    format!(
        "[Chunk {}]\nSource: {}\nContent:\n{}",
        index, source, chunk.text
    )
    .trim()
    .to_string()
}

fn render_unbounded(chunks: &[DocumentChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| render_block(i + 1, chunk))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_budgeted(chunks: &[DocumentChunk], budget: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for (i, chunk) in chunks.iter().enumerate() {
        let remaining = budget - used;
        if remaining == 0 {
            break;
        }

        let mut piece = render_block(i + 1, chunk);
        if i > 0 {
            piece.insert_str(0, "\n\n");
        }

        let piece_len = piece.chars().count();
        if piece_len <= remaining {
            used += piece_len;
            out.push_str(&piece);
        } else {
            out.extend(piece.chars().take(remaining));
            break;
        }
    }

    out
}
