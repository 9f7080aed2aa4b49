//! Transformation signatures.
//!
//! A signature is the fixed-length vector the clustering populations work
//! on. It is assembled from independent blocks (see [`SignatureLayout`] for
//! the order) and is never shorter than `D`: absent data resolves to
//! neutral values. Unit normalization is optional and off by default, since
//! Euclidean clustering relies on the raw magnitudes.

pub mod blocks;
mod extractor;
mod layout;
mod vector;


pub use self::extractor::SignatureExtractor;
pub use self::layout::{
    Segment, SegmentKind, SignatureLayout, DRIVE_DIM, SCALAR_DIM, TRAJECTORY_DIM,
};
pub use self::vector::Signature;
