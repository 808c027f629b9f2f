//! Ingestion text sanitation.
//!
//! Upstream extraction (PDF readers in particular) can emit NUL bytes and
//! stray control characters that storage layers reject. Sanitation runs
//! before change detection and chunking: NUL is dropped, other
//! non-printable control characters (except newline, carriage return, and
//! tab) become spaces, runs of horizontal whitespace collapse to a single
//! space, and the result is trimmed.

/// Clean raw document text for storage.
pub fn sanitize_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\0' => {}
            '\n' | '\r' | '\t' => cleaned.push(ch),
            c if c.is_control() => cleaned.push(' '),
            c => cleaned.push(c),
        }
    }

    let mut out = String::with_capacity(cleaned.len());
    let mut in_run = false;
    for ch in cleaned.chars() {
        if ch == ' ' || ch == '\t' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            in_run = false;
            out.push(ch);
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_nul_bytes() {
        assert_eq!(sanitize_text("ab\0cd"), "abcd");
    }

    #[test]
    fn control_characters_become_spaces() {
        assert_eq!(sanitize_text("a\x01\x02b"), "a b");
        assert_eq!(sanitize_text("a\x0bb"), "a b");
    }

    #[test]
    fn newlines_survive() {
        assert_eq!(sanitize_text("line one\nline two"), "line one\nline two");
    }

    #[test]
    fn horizontal_whitespace_collapses() {
        assert_eq!(sanitize_text("a  \t  b"), "a b");
        assert_eq!(sanitize_text("a\t\tb"), "a b");
    }

    #[test]
    fn trims_and_preserves_unicode() {
        assert_eq!(sanitize_text("  안녕하세요  세계  "), "안녕하세요 세계");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(sanitize_text(""), "");
        assert_eq!(sanitize_text("\0\x01  "), "");
    }
}
