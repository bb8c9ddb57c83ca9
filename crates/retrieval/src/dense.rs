//! In-memory dense index
//!
//! A flat inner-product index over normalized vectors. The alias corpora
//! are tens of entries, so exhaustive scoring beats any approximate
//! structure and keeps ranking exactly reproducible.

/// Immutable dense index over one collection
pub struct DenseIndex {
    vectors: Vec<Vec<f32>>,
}

impl DenseIndex {
    /// Build from pre-normalized vectors; position in the slice is the
    /// document id.
    pub fn build(vectors: Vec<Vec<f32>>) -> Self {
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Top-k document positions by inner product, ties broken by insertion
    /// index so repeated searches return identical orderings.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<usize> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(query, v)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        scored.into_iter().take(top_k).map(|(i, _)| i).collect()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_similarity() {
        let index = DenseIndex::build(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.7, 0.7],
        ]);
        let results = index.search(&[1.0, 0.0], 2);
        assert_eq!(results, vec![0, 2]);
    }

    #[test]
    fn ties_break_by_insertion_index() {
        let index = DenseIndex::build(vec![
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ]);
        let first = index.search(&[0.0, 1.0], 3);
        let second = index.search(&[0.0, 1.0], 3);
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(first, second);
    }
}
