//! Distance threshold filtering.

use mmrag_core::{RetrievalResult, SearchMode};
use tracing::debug;

/// Call-site defaults for retrieval.
pub struct RetrievalDefaults;

impl RetrievalDefaults {
    /// Items retrieved per query.
    pub const TOP_K: usize = 3;
    /// Threshold used by the interactive loops.
    pub const LOOSE: f32 = 1.0;
    /// Tighter threshold for callers that want only close matches.
    pub const STRICT: f32 = 0.65;
}

/// Keep items whose distance is at most `threshold`, in their original order.
///
/// Diverse-mode results are returned unchanged: their scores are sentinels,
/// not distances.
pub fn filter_by_threshold(result: RetrievalResult, threshold: f32) -> RetrievalResult {
    if result.mode == SearchMode::Diverse {
        debug!("Skipping threshold filter for diverse result");
        return result;
    }

    let before = result.items.len();
    let items: Vec<_> = result
        .items
        .into_iter()
        .filter(|item| item.score <= threshold)
        .collect();
    debug!(
        "Threshold {} kept {} of {} items",
        threshold,
        items.len(),
        before
    );

    RetrievalResult {
        mode: result.mode,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmrag_core::{Payload, ScoredPayload};

    fn result(mode: SearchMode, scores: &[f32]) -> RetrievalResult {
        RetrievalResult {
            mode,
            items: scores
                .iter()
                .enumerate()
                .map(|(i, &score)| ScoredPayload {
                    payload: Payload::text(format!("item {i}")),
                    score,
                })
                .collect(),
        }
    }

    fn scores(result: &RetrievalResult) -> Vec<f32> {
        result.iter().map(|item| item.score).collect()
    }

    #[test]
    fn test_filter_keeps_order() {
        let filtered = filter_by_threshold(result(SearchMode::Similarity, &[0.1, 0.9, 0.3, 0.7]), 0.5);
        assert_eq!(scores(&filtered), vec![0.1, 0.3]);
        assert_eq!(filtered.items[1].payload, Payload::text("item 2"));
    }

    #[test]
    fn test_filter_is_inclusive() {
        let filtered = filter_by_threshold(result(SearchMode::Similarity, &[0.65, 0.66]), RetrievalDefaults::STRICT);
        assert_eq!(scores(&filtered), vec![0.65]);
    }

    #[test]
    fn test_filter_empty() {
        let filtered = filter_by_threshold(RetrievalResult::empty(SearchMode::Similarity), 1.0);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_filter_everything_out() {
        let filtered = filter_by_threshold(result(SearchMode::Similarity, &[0.8, 0.9]), 0.1);
        assert!(filtered.is_empty());
        assert_eq!(filtered.mode, SearchMode::Similarity);
    }

    #[test]
    fn test_filter_is_monotonic() {
        let base = result(SearchMode::Similarity, &[0.05, 0.4, 0.2, 0.95, 0.6, 1.3]);
        let thresholds = [0.0, 0.1, 0.3, 0.65, 1.0, 2.0];
        for pair in thresholds.windows(2) {
            let tight = filter_by_threshold(base.clone(), pair[0]);
            let loose = filter_by_threshold(base.clone(), pair[1]);
            // Every tight item appears in the loose result, in the same relative order.
            let mut loose_items = loose.iter();
            for item in tight.iter() {
                assert!(loose_items.any(|l| l == item));
            }
        }
    }

    #[test]
    fn test_diverse_passes_through() {
        let base = result(SearchMode::Diverse, &[0.0, 0.0, 0.0]);
        let filtered = filter_by_threshold(base.clone(), -1.0);
        assert_eq!(filtered, base);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(RetrievalDefaults::TOP_K, 3);
        assert_eq!(RetrievalDefaults::LOOSE, 1.0);
        assert_eq!(RetrievalDefaults::STRICT, 0.65);
    }
}
