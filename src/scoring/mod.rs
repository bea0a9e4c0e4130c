use std::cmp::Ordering;
use std::sync::LazyLock;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bow::{BowVector, Norm, WordId};

/// Floor substituted for `ln(0)` when a word carries weight in only one of
/// the two vectors. Computed once, process wide, from the machine epsilon of
/// the weight type.
pub static LOG_EPS: LazyLock<f64> = LazyLock::new(|| f64::EPSILON.ln());

/// Enum for scoring algorithms used to compare two bag-of-words vectors
///
/// Every variant is a pure function of the two vectors: calls never fail,
/// share no mutable state and can run concurrently over the same inputs.
/// Stored zero weights score exactly like absent entries in every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringAlgorithm {
    /// L1 similarity
    /// 1.0 for identical L1-normalized vectors, 0.0 for disjoint ones
    L1Norm,
    /// Same quantity as `L1Norm`, evaluated as a parallel reduction
    /// Matched terms are independent, so they are summed out of order
    L2Norm,
    /// Chi-square kernel
    /// In [0, 1] for L1-normalized vectors
    ChiSquare,
    /// Kullback-Leibler divergence of `a` against `b`
    /// Unbounded and asymmetric; missing words in `b` are penalized
    /// through the `LOG_EPS` floor
    KlDivergence,
    /// Bhattacharyya coefficient
    /// In [0, 1] for L1-normalized vectors
    Bhattacharyya,
    /// Plain dot product
    /// Unbounded; the only variant that needs no prior normalization
    DotProduct,
}

impl ScoringAlgorithm {
    /// Score `a` against `b`.
    ///
    /// Both vectors are borrowed read-only; the result is a finite real for
    /// finite non-negative weights, except that `KlDivergence` and
    /// `DotProduct` grow without bound and follow IEEE-754 on overflow.
    pub fn score(&self, a: &BowVector, b: &BowVector) -> f64 {
        match self {
            ScoringAlgorithm::L1Norm => scoring_l1(a, b),
            ScoringAlgorithm::L2Norm => scoring_l2(a, b),
            ScoringAlgorithm::ChiSquare => scoring_chi_square(a, b),
            ScoringAlgorithm::KlDivergence => scoring_kl(a, b),
            ScoringAlgorithm::Bhattacharyya => scoring_bhattacharyya(a, b),
            ScoringAlgorithm::DotProduct => scoring_dot(a, b),
        }
    }

    /// Normalization the caller should apply to both vectors before scoring
    /// to land in the documented output range. `None` means the variant is
    /// meaningful on raw weights.
    pub fn must_normalize(&self) -> Option<Norm> {
        match self {
            ScoringAlgorithm::L1Norm => Some(Norm::L1),
            ScoringAlgorithm::L2Norm => Some(Norm::L2),
            ScoringAlgorithm::ChiSquare => Some(Norm::L1),
            ScoringAlgorithm::KlDivergence => Some(Norm::L1),
            ScoringAlgorithm::Bhattacharyya => Some(Norm::L1),
            ScoringAlgorithm::DotProduct => None,
        }
    }
}

/// First position in `ids` at or after `start` whose id is `>= key`.
#[inline]
fn lower_bound_from(ids: &[WordId], start: usize, key: WordId) -> usize {
    start + ids[start..].partition_point(|&id| id < key)
}

/// Two-cursor walk, single-step on both sides.
/// Words present in only one vector drop out algebraically:
/// |v| + |w| - |v - w| is zero whenever v or w is zero.
fn scoring_l1(a: &BowVector, b: &BowVector) -> f64 {
    let (a_ids, a_weights) = (a.word_ids(), a.weights());
    let (b_ids, b_weights) = (b.word_ids(), b.weights());
    let mut i = 0;
    let mut j = 0;
    let mut sum = 0.0;
    while i < a_ids.len() && j < b_ids.len() {
        match a_ids[i].cmp(&b_ids[j]) {
            Ordering::Equal => {
                let vi = a_weights[i];
                let wi = b_weights[j];
                sum += (vi - wi).abs() - vi.abs() - wi.abs();
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    -sum / 2.0
}

/// Same matched-term formula as [`scoring_l1`], but each of `a`'s entries is
/// resolved against `b` independently and the partial terms are combined by
/// an order-independent parallel sum. Pure zero-valued matches are skipped;
/// their term is zero either way.
fn scoring_l2(a: &BowVector, b: &BowVector) -> f64 {
    let sum: f64 = a
        .word_ids()
        .par_iter()
        .zip(a.weights().par_iter())
        .map(|(&id, &vi)| match b.get(id) {
            Some(wi) if vi != 0.0 || wi != 0.0 => (vi - wi).abs() - vi.abs() - wi.abs(),
            _ => 0.0,
        })
        .sum();
    -sum / 2.0
}

fn scoring_chi_square(a: &BowVector, b: &BowVector) -> f64 {
    let (a_ids, a_weights) = (a.word_ids(), a.weights());
    let (b_ids, b_weights) = (b.word_ids(), b.weights());
    let mut i = 0;
    let mut j = 0;
    let mut sum = 0.0;
    while i < a_ids.len() && j < b_ids.len() {
        match a_ids[i].cmp(&b_ids[j]) {
            Ordering::Equal => {
                let vi = a_weights[i];
                let wi = b_weights[j];
                // (v-w)^2/(v+w) - v - w = -4 vw/(v+w), the -4 folds into
                // the final scaling
                if vi + wi != 0.0 {
                    sum += vi * wi / (vi + wi);
                }
                i += 1;
                j += 1;
            }
            // jump the lagging cursor straight to the other key
            Ordering::Less => i = lower_bound_from(a_ids, i, b_ids[j]),
            Ordering::Greater => j = lower_bound_from(b_ids, j, a_ids[i]),
        }
    }
    2.0 * sum
}

/// Divergence of `a` against `b`. Not symmetric: words weighted in `a` but
/// not in `b` count as evidence against `b`, with `LOG_EPS` standing in for
/// the untaken `ln(0)`.
fn scoring_kl(a: &BowVector, b: &BowVector) -> f64 {
    let (a_ids, a_weights) = (a.word_ids(), a.weights());
    let (b_ids, b_weights) = (b.word_ids(), b.weights());
    let mut i = 0;
    let mut j = 0;
    let mut sum = 0.0;
    while i < a_ids.len() && j < b_ids.len() {
        let vi = a_weights[i];
        match a_ids[i].cmp(&b_ids[j]) {
            Ordering::Equal => {
                if vi != 0.0 {
                    let wi = b_weights[j];
                    if wi != 0.0 {
                        sum += vi * (vi / wi).ln();
                    } else {
                        // a stored zero on b's side scores like an absent word
                        sum += vi * (vi.ln() - *LOG_EPS);
                    }
                }
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                // approximates vi * ln(vi / eps)
                if vi != 0.0 {
                    sum += vi * (vi.ln() - *LOG_EPS);
                }
                i += 1;
            }
            // words of b without counterpart in a contribute nothing
            Ordering::Greater => j = lower_bound_from(b_ids, j, a_ids[i]),
        }
    }
    // rest of a, past the end of b
    for k in i..a_ids.len() {
        let vi = a_weights[k];
        if vi != 0.0 {
            sum += vi * (vi.ln() - *LOG_EPS);
        }
    }
    sum
}

fn scoring_bhattacharyya(a: &BowVector, b: &BowVector) -> f64 {
    let (a_ids, a_weights) = (a.word_ids(), a.weights());
    let (b_ids, b_weights) = (b.word_ids(), b.weights());
    let mut i = 0;
    let mut j = 0;
    let mut sum = 0.0;
    while i < a_ids.len() && j < b_ids.len() {
        match a_ids[i].cmp(&b_ids[j]) {
            Ordering::Equal => {
                sum += (a_weights[i] * b_weights[j]).sqrt();
                i += 1;
                j += 1;
            }
            Ordering::Less => i = lower_bound_from(a_ids, i, b_ids[j]),
            Ordering::Greater => j = lower_bound_from(b_ids, j, a_ids[i]),
        }
    }
    sum
}

fn scoring_dot(a: &BowVector, b: &BowVector) -> f64 {
    let (a_ids, a_weights) = (a.word_ids(), a.weights());
    let (b_ids, b_weights) = (b.word_ids(), b.weights());
    let mut i = 0;
    let mut j = 0;
    let mut sum = 0.0;
    while i < a_ids.len() && j < b_ids.len() {
        match a_ids[i].cmp(&b_ids[j]) {
            Ordering::Equal => {
                sum += a_weights[i] * b_weights[j];
                i += 1;
                j += 1;
            }
            Ordering::Less => i = lower_bound_from(a_ids, i, b_ids[j]),
            Ordering::Greater => j = lower_bound_from(b_ids, j, a_ids[i]),
        }
    }
    sum
}
