//! Sentence-aligned chunking of document text.
//!
//! Text is split on the literal `". "` delimiter and sentences are packed
//! greedily into chunks of at most `max_chars` characters. A sentence is
//! never cut: one longer than the budget becomes a chunk of its own.

/// Sentence delimiter.
pub const SENTENCE_DELIMITER: &str = ". ";

/// Default character budget per chunk.
pub const DEFAULT_MAX_CHARS: usize = 1000;

/// Split `text` into ordered chunks of at most `max_chars` characters.
///
/// Each chunk is trimmed. Empty or whitespace-only input yields no chunks.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let fragments: Vec<&str> = text.split(SENTENCE_DELIMITER).collect();
    let last = fragments.len() - 1;

    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0;

    for (i, fragment) in fragments.into_iter().enumerate() {
        // Every fragment but the last lost its delimiter in the split.
        let suffix = if i < last { SENTENCE_DELIMITER } else { "" };
        let piece_chars = fragment.chars().count() + suffix.chars().count();

        if buffer_chars > 0 && buffer_chars + piece_chars > max_chars {
            flush(&mut chunks, &mut buffer);
            buffer_chars = 0;
        }

        buffer.push_str(fragment);
        buffer.push_str(suffix);
        buffer_chars += piece_chars;
    }

    flush(&mut chunks, &mut buffer);
    chunks
}

fn flush(chunks: &mut Vec<String>, buffer: &mut String) {
    let chunk = buffer.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
    buffer.clear();
}
