//! Shared mathematical utilities for style-vector operations.

/// Compute cosine similarity between two vectors.
/// Returns dot(a,b) / (norm(a) * norm(b)), or 0.0 if either vector has zero norm.
///
/// Stored embeddings are unit-normalized at fusion time, but legacy vectors may
/// not be, so this never assumes norm = 1.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Euclidean (L2) norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector to unit length. Returns the zero vector unchanged.
pub fn vector_normalize(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if norm == 0.0 {
        v.to_vec()
    } else {
        v.iter().map(|x| x / norm).collect()
    }
}

/// Weighted element-wise sum of two vectors: wa * a + wb * b.
pub fn weighted_sum(a: &[f32], wa: f32, b: &[f32], wb: f32) -> Vec<f32> {
    a.iter().zip(b.iter()).map(|(x, y)| wa * x + wb * y).collect()
}
