mod remote;

pub use remote::RemoteEmbedder;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::EmbeddingConfig;

/// Embedding capability consumed at index-build time and per query.
/// Implementations must return unit-length vectors of `dimensions()` floats.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn dimensions(&self) -> usize;
    async fn health_check(&self) -> Result<()>;
}

pub fn create_embedder(config: &EmbeddingConfig) -> Box<dyn Embedder> {
    Box::new(RemoteEmbedder::new(
        &config.endpoint,
        &config.model,
        config.dimensions,
    ))
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
