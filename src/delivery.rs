//! Answer delivery pipeline.
//!
//! Pure text transforms at the transport boundary: optional condensing of
//! long answers through one chat-completion call, masking of credentials in
//! diagnostic output, and fixed-size chunking for transports with a
//! message-size ceiling.

use tracing::debug;

use crate::chat::ChatClient;
use crate::error::OrchestratorError;

/// Instruction prefix for the condensing call.
const SUMMARY_INSTRUCTION: &str =
    "Condense the following answer. Keep every key point and factual detail, \
     remove repetition, and answer in the same language:\n\n";

const MASK_CHAR: char = '*';

/// Generic user-facing text a conversational front end substitutes for any
/// processing failure, instead of internal error detail.
pub fn apology() -> &'static str {
    "There was an error processing your question. Please try again later."
}

/// Condense `answer` when it exceeds `budget` characters.
///
/// Returns `Ok(None)` when the answer is within budget, `Ok(Some(summary))`
/// on a successful condensing call, and the completion failure as an error
/// value so callers can report "summarization unavailable" distinctly from
/// a retrieval failure.
pub async fn summarize_if_long(
    chat: &ChatClient,
    answer: &str,
    budget: usize,
) -> Result<Option<String>, OrchestratorError> {
    if answer.chars().count() <= budget {
        return Ok(None);
    }

    debug!(budget, length = answer.chars().count(), "condensing long answer");
    let prompt = format!("{SUMMARY_INSTRUCTION}{answer}");
    let summary = chat.complete(&prompt).await?;
    Ok(Some(summary))
}

/// Mask a credential for diagnostic output.
///
/// Keeps `prefix` leading and `suffix` trailing characters and replaces the
/// interior with `*`. Credentials no longer than `prefix + suffix` are
/// fully masked rather than partially revealed.
pub fn mask_secret(secret: &str, prefix: usize, suffix: usize) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let n = chars.len();

    if n <= prefix + suffix {
        return MASK_CHAR.to_string().repeat(n);
    }

    let mut masked = String::with_capacity(n);
    masked.extend(&chars[..prefix]);
    masked.extend(std::iter::repeat(MASK_CHAR).take(n - prefix - suffix));
    masked.extend(&chars[n - suffix..]);
    masked
}

/// Split `text` into `ceil(len/size)` chunks of exactly `size` characters
/// (the last may be shorter), preserving order.
///
/// Boundaries are character-count based, never semantic; concatenating the
/// chunks reproduces the input exactly.
pub fn chunk_for_transport(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if size == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_exact_sizes() {
        let text = "a".repeat(10_000);
        let chunks = chunk_for_transport(&text, 4096);

        assert_eq!(chunks.len(), 3); // ceil(10000 / 4096)
        assert_eq!(chunks[0].chars().count(), 4096);
        assert_eq!(chunks[1].chars().count(), 4096);
        assert_eq!(chunks[2].chars().count(), 10_000 - 2 * 4096);
    }

    #[test]
    fn test_chunk_concatenation_is_identity() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(321);
        let chunks = chunk_for_transport(&text, 100);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunk_boundary_multiple() {
        let text = "x".repeat(8192);
        let chunks = chunk_for_transport(&text, 4096);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() == 4096));
    }

    #[test]
    fn test_chunk_never_splits_code_points() {
        let text = "日本語のテキスト".repeat(1000);
        let chunks = chunk_for_transport(&text, 13);
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.chars().count(), 13);
        }
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_for_transport("", 4096).is_empty());
    }

    #[test]
    fn test_chunk_short_text() {
        let chunks = chunk_for_transport("short", 4096);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn test_mask_long_secret() {
        assert_eq!(mask_secret("sk-abcdef123456", 4, 4), "sk-a*******3456");
    }

    #[test]
    fn test_mask_short_secret_fully_masked() {
        assert_eq!(mask_secret("abcd", 4, 4), "****");
        assert_eq!(mask_secret("abcdefgh", 4, 4), "********");
    }

    #[test]
    fn test_mask_empty_secret() {
        assert_eq!(mask_secret("", 4, 4), "");
    }

    #[test]
    fn test_mask_interior_width() {
        let masked = mask_secret(&"k".repeat(20), 4, 4);
        assert_eq!(masked.len(), 20);
        assert_eq!(masked.matches('*').count(), 12);
    }
}
