/// This crate is a scoring core for sparse bag-of-words descriptors.
pub mod bow;
pub mod scoring;

/// Sparse Bag-of-Words Vector
/// An ordered mapping from visual-word id to non-negative weight, with
/// unique keys and ascending iteration order. An absent id means weight `0`.
///
/// Vectors are built by the caller through repeated insertion (in any order)
/// or through validated bulk construction, and are only ever borrowed
/// read-only by the scoring layer. Concurrent scoring over shared vectors is
/// safe.
///
/// Persistence is the caller's concern; `BowVector` merely derives serde so
/// it can ride whatever format the surrounding system uses.
pub use bow::BowVector;

/// Word identifier and weight types stored in a `BowVector`.
pub use bow::{WordId, WordValue};

/// Norm selector for `BowVector::normalize`.
/// Scoring never normalizes on its own; callers that want the documented
/// `[0, 1]` output ranges apply the norm recommended by
/// `ScoringAlgorithm::must_normalize` beforehand.
pub use bow::Norm;

/// Error returned by `BowVector::from_entries` on duplicate word ids or
/// negative weights.
pub use bow::BowError;

/// Scoring Algorithm family
/// A closed set of six interchangeable similarity/distance measures over two
/// `BowVector`s: L1, L2, chi-square, Kullback-Leibler, Bhattacharyya and dot
/// product. Pick one at configuration time and call
/// `score(&a, &b) -> f64`; every call is a pure, synchronous single pass
/// over the two vectors.
pub use scoring::ScoringAlgorithm;

/// Floor value substituted for `ln(0)` by the Kullback-Leibler variant,
/// computed once from the weight type's machine epsilon.
pub use scoring::LOG_EPS;
