//! Budget-constrained context packing.
//!
//! Takes ranked hits and concatenates their formatted lines in rank order
//! until the character budget would be exceeded. Budget enforcement is a
//! prefix cut, not bin-packing: the first line that does not fit stops
//! accumulation, no later (shorter) hit is considered.

use crate::models::{Hit, RetrievedChunk};

/// Pack ranked chunks into a single attributed text block of at most
/// `budget` characters, returning the block and the hits actually
/// included.
///
/// Each line reads `- (source_kind:source_id) text`; lines are joined by
/// a newline, which counts against the budget. Empty input produces an
/// empty block and an empty hit list — "no grounding available", not an
/// error.
pub fn assemble_context(chunks: &[RetrievedChunk], budget: usize) -> (String, Vec<Hit>) {
    let mut block = String::new();
    let mut included: Vec<Hit> = Vec::new();
    let mut used = 0usize;

    for chunk in chunks {
        let line = format!(
            "- ({}:{}) {}",
            chunk.hit.source_kind, chunk.hit.source_id, chunk.content
        );
        let line_len = line.chars().count();
        let added = if included.is_empty() { line_len } else { line_len + 1 };

        if used + added > budget {
            break;
        }

        if !included.is_empty() {
            block.push('\n');
        }
        block.push_str(&line);
        used += added;
        included.push(chunk.hit.clone());
    }

    (block, included)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HitMode, RetrievedChunk};

    fn chunk(id: i64, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            hit: Hit {
                mode: HitMode::Keyword,
                score: 1.0,
                source_kind: "pdf".to_string(),
                source_id: id,
                chunk_index: 0,
            },
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_input_gives_empty_context() {
        let (block, hits) = assemble_context(&[], 2500);
        assert!(block.is_empty());
        assert!(hits.is_empty());
    }

    #[test]
    fn single_fitting_hit_is_included() {
        let (block, hits) = assemble_context(&[chunk(0, "hello")], 2500);
        assert_eq!(block, "- (pdf:0) hello");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn budget_is_a_prefix_cut() {
        // Lines are "- (pdf:N) " + 20 chars = 30 chars each.
        let chunks: Vec<_> = (0..5).map(|i| chunk(i, &"x".repeat(20))).collect();
        // 30 + 31 + 31 = 92 fits; the fourth line would need 123.
        let (block, hits) = assemble_context(&chunks, 100);
        assert_eq!(hits.len(), 3);
        assert!(block.chars().count() <= 100);
        // The omitted hits are exactly the tail, never a later short one.
        assert_eq!(hits[0].source_id, 0);
        assert_eq!(hits[2].source_id, 2);
    }

    #[test]
    fn oversized_first_hit_gives_empty_context() {
        let (block, hits) = assemble_context(&[chunk(0, &"x".repeat(200))], 50);
        assert!(block.is_empty());
        assert!(hits.is_empty());
    }

    #[test]
    fn exact_fit_is_included() {
        let text = "abc";
        let line_len = format!("- (pdf:0) {}", text).chars().count();
        let (block, hits) = assemble_context(&[chunk(0, text)], line_len);
        assert_eq!(block.chars().count(), line_len);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn output_never_exceeds_budget() {
        let chunks: Vec<_> = (0..8).map(|i| chunk(i, &"y".repeat(400))).collect();
        for budget in [100, 500, 1000, 2500, 10_000] {
            let (block, _) = assemble_context(&chunks, budget);
            assert!(
                block.chars().count() <= budget,
                "budget {} exceeded: {}",
                budget,
                block.chars().count()
            );
        }
    }

    #[test]
    fn adding_next_hit_would_exceed_budget() {
        let chunks: Vec<_> = (0..8).map(|i| chunk(i, &"z".repeat(400))).collect();
        let budget = 2500;
        let (block, hits) = assemble_context(&chunks, budget);
        if hits.len() < chunks.len() {
            let next = &chunks[hits.len()];
            let next_line_len = format!(
                "- ({}:{}) {}",
                next.hit.source_kind, next.hit.source_id, next.content
            )
            .chars()
            .count();
            assert!(block.chars().count() + 1 + next_line_len > budget);
        }
    }
}
