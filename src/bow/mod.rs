use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a discrete visual word (vocabulary token id).
pub type WordId = u32;
/// Weight attached to a word in a descriptor. Non-negative.
pub type WordValue = f64;

/// Error returned by validated bulk construction of a [`BowVector`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BowError {
    /// Two entries carried the same word id.
    #[error("duplicate word id {0}")]
    DuplicateWordId(WordId),
    /// Weights are non-negative by contract.
    #[error("negative weight {weight} for word id {id}")]
    NegativeWeight { id: WordId, weight: WordValue },
}

/// Norm used by [`BowVector::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
    /// Sum of absolute weights
    L1,
    /// Euclidean norm
    L2,
}

/// BowVector 構造体
/// A sparse bag-of-words descriptor: an ordered mapping from word id to
/// weight. Keys are unique and iteration always yields strictly ascending
/// word ids; an absent id means weight `0`.
///
/// The entries are kept as two parallel sorted arrays (indices and values),
/// so lookup and lower-bound are binary searches and a full traversal is a
/// plain zip of two slices.
///
/// # Examples
/// ```
/// use bow_scorer::BowVector;
/// let mut bow = BowVector::new();
/// bow.add_weight(7, 0.5);
/// bow.add_weight(2, 0.25);
/// bow.add_weight(7, 0.25);
///
/// let entries: Vec<_> = bow.iter().collect();
/// assert_eq!(entries, vec![(2, 0.25), (7, 0.75)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BowVector {
    ids: Vec<WordId>,
    weights: Vec<WordValue>,
}

impl BowVector {
    /// Create an empty vector.
    #[inline]
    pub fn new() -> Self {
        BowVector {
            ids: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Create an empty vector with room for `capacity` entries.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        BowVector {
            ids: Vec::with_capacity(capacity),
            weights: Vec::with_capacity(capacity),
        }
    }

    /// Build a vector from a complete entry list, validating the invariant.
    ///
    /// Entries may arrive in any order. A repeated word id or a negative
    /// weight is rejected; use [`add_weight`](Self::add_weight) instead when
    /// repeated ids are meant to accumulate.
    ///
    /// # Arguments
    /// * `entries` - `(word_id, weight)` pairs
    pub fn from_entries<I>(entries: I) -> Result<Self, BowError>
    where
        I: IntoIterator<Item = (WordId, WordValue)>,
    {
        let mut bow = BowVector::new();
        for (id, weight) in entries {
            if weight < 0.0 {
                return Err(BowError::NegativeWeight { id, weight });
            }
            match bow.ids.binary_search(&id) {
                Ok(_) => return Err(BowError::DuplicateWordId(id)),
                Err(pos) => {
                    bow.ids.insert(pos, id);
                    bow.weights.insert(pos, weight);
                }
            }
        }
        Ok(bow)
    }

    /// Set the weight of `id`, replacing any previous value.
    #[inline]
    pub fn insert(&mut self, id: WordId, weight: WordValue) {
        match self.ids.binary_search(&id) {
            Ok(pos) => self.weights[pos] = weight,
            Err(pos) => {
                self.ids.insert(pos, id);
                self.weights.insert(pos, weight);
            }
        }
    }

    /// Add `weight` to the entry of `id`, inserting it if absent.
    #[inline]
    pub fn add_weight(&mut self, id: WordId, weight: WordValue) {
        match self.ids.binary_search(&id) {
            Ok(pos) => self.weights[pos] += weight,
            Err(pos) => {
                self.ids.insert(pos, id);
                self.weights.insert(pos, weight);
            }
        }
    }

    /// Insert `(id, weight)` only when `id` has no entry yet.
    #[inline]
    pub fn add_if_absent(&mut self, id: WordId, weight: WordValue) {
        if let Err(pos) = self.ids.binary_search(&id) {
            self.ids.insert(pos, id);
            self.weights.insert(pos, weight);
        }
    }

    /// Weight stored for `id`, or `None` when absent.
    #[inline]
    pub fn get(&self, id: WordId) -> Option<WordValue> {
        self.ids.binary_search(&id).ok().map(|pos| self.weights[pos])
    }

    /// Position of the first entry with word id `>= id`.
    ///
    /// Returns [`len`](Self::len) when every stored id is smaller.
    #[inline]
    pub fn lower_bound(&self, id: WordId) -> usize {
        self.ids.partition_point(|&k| k < id)
    }

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Stored word ids, ascending.
    #[inline]
    pub fn word_ids(&self) -> &[WordId] {
        &self.ids
    }

    /// Stored weights, in word-id order.
    #[inline]
    pub fn weights(&self) -> &[WordValue] {
        &self.weights
    }

    /// Iterate over `(word_id, weight)` pairs in ascending id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (WordId, WordValue)> + '_ {
        self.ids.iter().copied().zip(self.weights.iter().copied())
    }

    /// Sum of all stored weights.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Scale the vector in place so its chosen norm becomes `1`.
    ///
    /// Leaves the vector untouched when the norm is zero (empty or all-zero
    /// vector).
    pub fn normalize(&mut self, norm: Norm) {
        let n = match norm {
            Norm::L1 => self.weights.iter().map(|w| w.abs()).sum::<f64>(),
            Norm::L2 => self.weights.iter().map(|w| w * w).sum::<f64>().sqrt(),
        };
        if n > 0.0 {
            for w in &mut self.weights {
                *w /= n;
            }
        }
    }
}

impl fmt::Display for BowVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (id, weight) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "<{}, {}>", id, weight)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_does_not_matter() {
        let mut bow = BowVector::new();
        bow.insert(42, 0.1);
        bow.insert(7, 0.2);
        bow.insert(1000, 0.3);
        bow.insert(0, 0.4);

        let ids: Vec<_> = bow.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 7, 42, 1000]);
        for pair in bow.word_ids().windows(2) {
            assert!(pair[0] < pair[1], "ids must be strictly ascending");
        }
    }

    #[test]
    fn insert_replaces_and_add_weight_accumulates() {
        let mut bow = BowVector::new();
        bow.insert(3, 0.5);
        bow.insert(3, 0.25);
        assert_eq!(bow.get(3), Some(0.25));
        assert_eq!(bow.len(), 1);

        bow.add_weight(3, 0.25);
        assert_eq!(bow.get(3), Some(0.5));

        bow.add_if_absent(3, 9.0);
        assert_eq!(bow.get(3), Some(0.5));
        bow.add_if_absent(4, 9.0);
        assert_eq!(bow.get(4), Some(9.0));
    }

    #[test]
    fn get_and_lower_bound() {
        let bow = BowVector::from_entries([(2, 0.1), (5, 0.2), (9, 0.3)]).unwrap();
        assert_eq!(bow.get(5), Some(0.2));
        assert_eq!(bow.get(4), None);

        assert_eq!(bow.lower_bound(0), 0);
        assert_eq!(bow.lower_bound(2), 0);
        assert_eq!(bow.lower_bound(3), 1);
        assert_eq!(bow.lower_bound(9), 2);
        assert_eq!(bow.lower_bound(10), 3);
    }

    #[test]
    fn from_entries_rejects_duplicates() {
        let result = BowVector::from_entries([(1, 0.5), (2, 0.5), (1, 0.1)]);
        assert_eq!(result.unwrap_err(), BowError::DuplicateWordId(1));
    }

    #[test]
    fn from_entries_rejects_negative_weights() {
        let result = BowVector::from_entries([(1, 0.5), (2, -0.5)]);
        assert_eq!(
            result.unwrap_err(),
            BowError::NegativeWeight { id: 2, weight: -0.5 }
        );
    }

    #[test]
    fn normalize_l1_and_l2() {
        let mut bow = BowVector::from_entries([(1, 3.0), (2, 1.0)]).unwrap();
        bow.normalize(Norm::L1);
        assert!((bow.total_weight() - 1.0).abs() < 1e-12);
        assert_eq!(bow.get(1), Some(0.75));

        let mut bow = BowVector::from_entries([(1, 3.0), (2, 4.0)]).unwrap();
        bow.normalize(Norm::L2);
        let norm_sq: f64 = bow.weights().iter().map(|w| w * w).sum();
        assert!((norm_sq - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_zero_vector_is_a_noop() {
        let mut bow = BowVector::new();
        bow.insert(1, 0.0);
        bow.normalize(Norm::L1);
        assert_eq!(bow.get(1), Some(0.0));

        let mut empty = BowVector::new();
        empty.normalize(Norm::L2);
        assert!(empty.is_empty());
    }

    #[test]
    fn cbor_roundtrip() {
        let bow = BowVector::from_entries([(1, 0.5), (800_000, 0.25)]).unwrap();
        let bytes = serde_cbor::to_vec(&bow).unwrap();
        let back: BowVector = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(bow, back);
    }
}
