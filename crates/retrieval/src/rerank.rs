//! Rerankers
//!
//! The second retrieval stage: score each (query, candidate) pair
//! independently and re-sort the fused top-k. The trait is the seam for a
//! model-backed cross-encoder; the default implementation is a token
//! overlap scorer that needs no model and is fully deterministic.

use async_trait::async_trait;

use crate::RetrievalError;

/// Pairwise relevance scorer
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn score(&self, query: &str, candidate: &str) -> Result<f32, RetrievalError>;
}

/// Token-overlap scorer.
///
/// Fraction of the candidate's tokens found in the query (stopwords
/// removed), with a bonus when the candidate appears verbatim. Alias
/// strings are short, so candidate-side coverage discriminates better than
/// query-side coverage.
pub struct LexicalScorer;

impl LexicalScorer {
    const STOPWORDS: &'static [&'static str] = &[
        "the", "a", "an", "is", "are", "was", "were", "i", "you", "we", "to", "of", "in", "for",
        "on", "with", "at", "by", "from", "and", "or", "please", "me", "my", "want", "get",
        "give", "show", "report",
    ];

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1 && !Self::STOPWORDS.contains(t))
            .map(|t| t.to_string())
            .collect()
    }

    pub fn score_sync(query: &str, candidate: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let candidate_lower = candidate.to_lowercase();

        let candidate_tokens = Self::tokens(candidate);
        if candidate_tokens.is_empty() {
            return 0.0;
        }
        let query_tokens = Self::tokens(query);

        let matched = candidate_tokens
            .iter()
            .filter(|t| query_tokens.contains(t))
            .count();
        let overlap = matched as f32 / candidate_tokens.len() as f32;

        let bonus = if query_lower.contains(candidate_lower.trim()) {
            0.3
        } else {
            0.0
        };

        (overlap + bonus).min(1.0)
    }
}

#[async_trait]
impl Reranker for LexicalScorer {
    async fn score(&self, query: &str, candidate: &str) -> Result<f32, RetrievalError> {
        Ok(Self::score_sync(query, candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_overlap_beats_partial() {
        let query = "i want win loss detail for sportsbook";
        let full = LexicalScorer::score_sync(query, "win loss detail");
        let partial = LexicalScorer::score_sync(query, "win loss summary");
        assert!(full > partial);
    }

    #[test]
    fn verbatim_candidate_gets_bonus() {
        let with = LexicalScorer::score_sync("wl report please", "wl");
        let without = LexicalScorer::score_sync("turnover please", "wl");
        assert!(with > without);
        assert_eq!(without, 0.0);
    }

    #[test]
    fn score_is_bounded() {
        let score = LexicalScorer::score_sync("wl wl wl", "wl");
        assert!((0.0..=1.0).contains(&score));
    }
}
