//! k-nearest-neighbor store over embedding vectors.
//!
//! The user trains it live: each button press files the current embedding
//! under that button's class. Classification takes the k most similar
//! stored examples (cosine similarity over L2-normalized vectors) and
//! returns the majority label among them, nearest example breaking ties.

use std::collections::HashMap;

struct Example {
    embedding: Vec<f32>,
    label: usize,
}

pub struct KnnStore {
    k: usize,
    examples: Vec<Example>,
}

impl KnnStore {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            examples: Vec::new(),
        }
    }

    pub fn add_example(&mut self, embedding: Vec<f32>, label: usize) {
        self.examples.push(Example {
            embedding: normalize(embedding),
            label,
        });
    }

    /// Forget everything the user taught.
    pub fn clear(&mut self) {
        self.examples.clear();
    }

    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Label of the embedding, or None when nothing has been taught yet.
    pub fn classify(&self, embedding: &[f32]) -> Option<usize> {
        if self.examples.is_empty() {
            return None;
        }

        let query = normalize(embedding.to_vec());
        let mut scored: Vec<(f32, usize)> = self
            .examples
            .iter()
            .map(|ex| (dot(&ex.embedding, &query), ex.label))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let top = &scored[..self.k.min(scored.len())];

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for (_, label) in top {
            *counts.entry(*label).or_insert(0) += 1;
        }
        let best_count = counts.values().copied().max()?;
        // Nearest neighbor wins among tied labels
        top.iter()
            .find(|(_, label)| counts[label] == best_count)
            .map(|(_, label)| *label)
    }
}

pub fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
