//! The signature vector.

use serde::{Deserialize, Serialize};

use super::layout::{SegmentKind, SignatureLayout};

/// Fixed-length feature vector derived from one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    values: Vec<f32>,
    normalized: bool,
}

impl Signature {
    pub(crate) fn new(values: Vec<f32>, normalized: bool) -> Self {
        Self { values, normalized }
    }

    /// Wrap raw values, e.g. a stored centroid.
    pub fn from_values(values: Vec<f32>) -> Self {
        Self::new(values, false)
    }

    /// Vector values.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Vector length.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the vector was scaled to unit length.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// One segment of the vector.
    pub fn segment<'a>(&'a self, layout: &SignatureLayout, kind: SegmentKind) -> Option<&'a [f32]> {
        layout.slice(&self.values, kind)
    }

    /// Consume into the raw values.
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

impl AsRef<[f32]> for Signature {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}
