//! Fixed-window text splitter.
//!
//! Splits document text into overlapping, order-preserving windows of a
//! fixed character width. Windows are purely length-based; no sentence or
//! paragraph awareness. The same text and parameters always produce the
//! same chunk sequence.

use thiserror::Error;

/// Errors from chunking parameter validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    /// The overlap must be strictly smaller than the window, otherwise the
    /// slide step would be zero and the splitter could never make progress.
    #[error("invalid chunk window: window={window}, overlap={overlap} (require window > 0 and overlap < window)")]
    InvalidWindow { window: usize, overlap: usize },
}

/// Split `text` into windows of `window` characters, advancing
/// `window - overlap` characters per step.
///
/// The input is trimmed first; a trimmed length of at most `window`
/// yields a single chunk, and empty or whitespace-only input yields no
/// chunks. Each window is trimmed and dropped if it becomes empty. The
/// final partial window is still emitted when non-empty.
///
/// Offsets are counted in Unicode scalar values, not bytes, so multibyte
/// text never splits inside a character.
pub fn split_text(text: &str, window: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    if window == 0 || overlap >= window {
        return Err(ChunkError::InvalidWindow { window, overlap });
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= window {
        return Ok(vec![trimmed.to_string()]);
    }

    let step = window - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + window).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        if start + window >= chars.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_text("  hello world  ", 900, 120).unwrap();
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        assert!(split_text("", 900, 120).unwrap().is_empty());
        assert!(split_text("   \n\t  ", 900, 120).unwrap().is_empty());
    }

    #[test]
    fn invalid_window_fails_fast() {
        assert_eq!(
            split_text("abc", 10, 10).unwrap_err(),
            ChunkError::InvalidWindow { window: 10, overlap: 10 }
        );
        assert!(split_text("abc", 10, 11).is_err());
        assert!(split_text("abc", 0, 0).is_err());
    }

    #[test]
    fn worked_example_window_10_overlap_3() {
        // step = 7: offsets 0 and 7 over 15 chars.
        let chunks = split_text("ABCDEFGHIJKLMNO", 10, 3).unwrap();
        assert_eq!(chunks, vec!["ABCDEFGHIJ".to_string(), "HIJKLMNO".to_string()]);
    }

    #[test]
    fn consecutive_chunks_overlap_by_exactly_v() {
        let text: String = ('a'..='z').cycle().take(100).collect();
        let (n, v) = (30, 10);
        let chunks = split_text(&text, n, v).unwrap();
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            // No whitespace in this input, so trims are no-ops and the
            // tail of each chunk equals the head of the next.
            let tail: String = prev[prev.len() - v..].iter().collect();
            let head: String = next[..v].iter().collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn chunk_count_matches_step_rule() {
        let (n, v) = (10, 3);
        let step = n - v;
        for len in [11usize, 15, 20, 31, 64, 99] {
            let text: String = std::iter::repeat('x').take(len).collect();
            let chunks = split_text(&text, n, v).unwrap();
            // ceil((len - v) / step) windows from the slide rule.
            let expected = (len - v).div_ceil(step);
            assert_eq!(chunks.len(), expected, "len={}", len);
        }
    }

    #[test]
    fn whitespace_only_window_is_dropped() {
        // The middle window is entirely spaces and must not be emitted.
        let text = format!("{}{}{}", "a".repeat(5), " ".repeat(5), "b".repeat(2));
        let chunks = split_text(&text, 5, 0).unwrap();
        assert_eq!(chunks, vec!["a".repeat(5), "b".repeat(2)]);
    }

    #[test]
    fn multibyte_text_splits_on_character_boundaries() {
        let text = "가나다라마바사아자차카타파하".repeat(10);
        let chunks = split_text(&text, 40, 10).unwrap();
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.chars().count() <= 40);
        }
    }

    #[test]
    fn deterministic() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(40);
        let a = split_text(&text, 100, 25).unwrap();
        let b = split_text(&text, 100, 25).unwrap();
        assert_eq!(a, b);
    }
}
