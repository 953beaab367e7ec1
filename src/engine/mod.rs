//! Embedding engine: a TFLite feature extractor plus a trainable k-NN store.

pub mod embedding;
pub mod knn;

pub use embedding::TfliteEmbedder;
pub use knn::KnnStore;

use crate::error::Result;
use crate::vision::Frame;

/// Turns a frame into an embedding vector.
pub trait Embedder: Send {
    fn embed(&mut self, frame: &Frame) -> Result<Vec<f32>>;
}
