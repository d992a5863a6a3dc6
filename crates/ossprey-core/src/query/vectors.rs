//! Vector helpers: cosine similarity, L2 normalization, and prefix slicing of
//! Matryoshka-style embeddings into a cheaper shortlist vector.

const NORM_EPSILON: f64 = 1e-10;

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, and
/// zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < NORM_EPSILON {
        return 0.0;
    }
    dot / denom
}

pub fn all_finite(vector: &[f32]) -> bool {
    vector.iter().all(|v| v.is_finite())
}

/// L2-normalize a vector. Near-zero vectors are returned unchanged.
pub fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt();
    if norm < NORM_EPSILON {
        return vector.to_vec();
    }
    vector.iter().map(|v| (f64::from(*v) / norm) as f32).collect()
}

/// Take the first `dims` components and re-normalize them.
///
/// Prefix slices of a Matryoshka embedding live in a smaller subspace; without
/// re-normalization their cosine scores drift. A `dims` larger than the vector
/// keeps the whole vector.
pub fn slice_and_normalize(full: &[f32], dims: usize) -> Vec<f32> {
    let end = dims.min(full.len());
    normalize(&full[..end])
}
