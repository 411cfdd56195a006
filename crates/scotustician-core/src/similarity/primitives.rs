//! Core dense vector similarity primitives.

use super::error::SimilarityError;

/// L2 norm (magnitude) of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Internal dot product without validation.
/// Caller must ensure vectors have equal length.
#[inline]
fn dot_product_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn check_pair(a: &[f32], b: &[f32]) -> Result<(), SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Dot product between two dense vectors.
///
/// # Errors
/// - `SimilarityError::EmptyVector` if either vector is empty
/// - `SimilarityError::DimensionMismatch` if vectors have different lengths
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    check_pair(a, b)?;
    Ok(dot_product_unchecked(a, b))
}

/// Cosine similarity between two dense vectors, clamped to [-1.0, 1.0].
///
/// Invariant to vector magnitude, so aggregated case vectors need not be
/// unit-normalized before comparison.
///
/// # Errors
/// - `SimilarityError::EmptyVector` if either vector is empty
/// - `SimilarityError::DimensionMismatch` if vectors have different lengths
/// - `SimilarityError::ZeroMagnitude` if either vector has zero norm
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    check_pair(a, b)?;

    let dot = dot_product_unchecked(a, b);
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return Err(SimilarityError::ZeroMagnitude);
    }

    // Clamp to valid range to handle floating point errors
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Cosine distance: `1 - cosine_similarity`, in [0.0, 2.0].
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    Ok(1.0 - cosine_similarity(a, b)?)
}

/// Euclidean distance (L2 norm of the difference).
///
/// # Errors
/// - `SimilarityError::EmptyVector` if either vector is empty
/// - `SimilarityError::DimensionMismatch` if vectors have different lengths
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    check_pair(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    #[test]
    fn l2_norm_pythagorean() {
        assert!((l2_norm(&[3.0, 4.0]) - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn dot_product_known_value() {
        let result = dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!((result - 32.0).abs() < TOLERANCE);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < TOLERANCE);
    }

    #[test]
    fn cosine_parallel_is_one_regardless_of_magnitude() {
        let sim = cosine_similarity(&[1.0, 2.0], &[10.0, 20.0]).unwrap();
        assert!((sim - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn cosine_opposite_is_minus_one() {
        let sim = cosine_similarity(&[1.0, 1.0], &[-2.0, -2.0]).unwrap();
        assert!((sim + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn cosine_rejects_zero_vector() {
        assert_eq!(
            cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]),
            Err(SimilarityError::ZeroMagnitude)
        );
    }

    #[test]
    fn dimension_mismatch_detected() {
        assert_eq!(
            euclidean_distance(&[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(SimilarityError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn empty_vector_rejected() {
        assert_eq!(dot_product(&[], &[]), Err(SimilarityError::EmptyVector));
    }

    #[test]
    fn euclidean_distance_known_value() {
        let d = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < TOLERANCE);
    }
}
