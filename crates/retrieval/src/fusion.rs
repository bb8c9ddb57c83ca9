//! Weighted-confidence vote fusion
//!
//! Each retrieval contributes a per-item probability mass of
//! `source_weight / list_len`; masses for items in both lists are summed
//! and the final ranking sorts by total mass descending. Ties break by
//! item index so a fixed corpus and query always fuse identically.

/// Fuse ranked lists of entry positions into one ranking.
///
/// `lists` and `weights` are parallel; an empty list contributes nothing.
pub fn weighted_vote(lists: &[Vec<usize>], weights: &[f32]) -> Vec<usize> {
    debug_assert_eq!(lists.len(), weights.len());

    let mut mass: std::collections::BTreeMap<usize, f32> = std::collections::BTreeMap::new();
    for (list, weight) in lists.iter().zip(weights.iter()) {
        if list.is_empty() {
            continue;
        }
        let share = weight / list.len() as f32;
        for &item in list {
            *mass.entry(item).or_insert(0.0) += share;
        }
    }

    let mut ranked: Vec<(usize, f32)> = mass.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.into_iter().map(|(item, _)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_in_both_lists_rank_first() {
        let semantic = vec![0, 1, 2];
        let keyword = vec![2, 3];
        let fused = weighted_vote(&[semantic, keyword], &[0.9, 0.1]);
        // 2 gets 0.9/3 + 0.1/2 = 0.35, 0 and 1 get 0.3, 3 gets 0.05
        assert_eq!(fused, vec![2, 0, 1, 3]);
    }

    #[test]
    fn deterministic_tie_break() {
        let fused_a = weighted_vote(&[vec![5, 7], vec![]], &[0.9, 0.1]);
        let fused_b = weighted_vote(&[vec![5, 7], vec![]], &[0.9, 0.1]);
        assert_eq!(fused_a, fused_b);
        // Equal mass: lower index first
        assert_eq!(fused_a, vec![5, 7]);
    }

    #[test]
    fn empty_lists_fuse_to_empty() {
        assert!(weighted_vote(&[vec![], vec![]], &[0.9, 0.1]).is_empty());
    }

    #[test]
    fn weights_shift_single_source_items() {
        // One item per list; the heavier source must win
        let fused = weighted_vote(&[vec![1], vec![2]], &[0.9, 0.1]);
        assert_eq!(fused, vec![1, 2]);
        let fused = weighted_vote(&[vec![1], vec![2]], &[0.1, 0.9]);
        assert_eq!(fused, vec![2, 1]);
    }
}
