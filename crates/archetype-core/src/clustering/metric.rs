//! Distance metrics for centroid clustering.
//!
//! Exactly one metric is active per clustering population. Under
//! [`DistanceMetric::Cosine`] vectors and centroids are kept at unit length;
//! under [`DistanceMetric::Euclidean`] they keep their raw magnitude. The two
//! scales are never mixed within one population.

use serde::{Deserialize, Serialize};

/// Norm below which a vector is treated as zero.
pub const ZERO_NORM_EPSILON: f32 = 1e-9;

/// Distance metric used to compare signatures with centroids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance over raw vectors.
    #[default]
    Euclidean,
    /// Cosine distance `1 − cos θ` over unit-normalized vectors.
    Cosine,
}

impl DistanceMetric {
    /// Distance between two vectors under this metric.
    ///
    /// Vectors of different length are compared best-effort: missing
    /// trailing entries count as zero. The result is always finite and
    /// non-negative.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let d = match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        };
        if d.is_finite() {
            d.max(0.0)
        } else {
            f32::MAX
        }
    }

    /// Map a distance produced by this metric to a similarity in `[0, 1]`.
    ///
    /// Euclidean uses `1 / (1 + d)`; cosine recovers `cos θ` and clamps
    /// negative correlation to zero.
    pub fn similarity_from_distance(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Euclidean => 1.0 / (1.0 + distance.max(0.0)),
            DistanceMetric::Cosine => (1.0 - distance).clamp(0.0, 1.0),
        }
    }

    /// Similarity in `[0, 1]` between two vectors.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        self.similarity_from_distance(self.distance(a, b))
    }

    /// Bring a vector onto this metric's scale (unit length for cosine).
    ///
    /// Zero-norm vectors are left untouched.
    pub fn prepare(&self, vector: &mut [f32]) {
        if *self == DistanceMetric::Cosine {
            normalize_in_place(vector);
        }
    }

    /// Whether vectors must be unit length under this metric.
    #[inline]
    pub fn requires_unit_length(&self) -> bool {
        matches!(self, DistanceMetric::Cosine)
    }

    /// Whether centroids built under `self` can be reused under `target`.
    ///
    /// Unit-length centroids lost their magnitude, so they cannot serve a
    /// metric that compares raw positions.
    pub fn converts_to(&self, target: DistanceMetric) -> bool {
        !self.requires_unit_length() || target.requires_unit_length()
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Euclidean => write!(f, "euclidean"),
            DistanceMetric::Cosine => write!(f, "cosine"),
        }
    }
}

/// Euclidean distance; missing trailing entries count as zero.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().max(b.len());
    let mut sum = 0.0f32;
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0.0);
        let y = b.get(i).copied().unwrap_or(0.0);
        let diff = x - y;
        sum += diff * diff;
    }
    sum.sqrt()
}

/// Cosine similarity in `[-1, 1]`; zero vectors yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let dot: f32 = a[..len].iter().zip(&b[..len]).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < ZERO_NORM_EPSILON || norm_b < ZERO_NORM_EPSILON {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// L2 norm of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit length in place.
///
/// Returns `false` (leaving the vector unchanged) for zero-norm input.
pub fn normalize_in_place(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if norm < ZERO_NORM_EPSILON || !norm.is_finite() {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}
