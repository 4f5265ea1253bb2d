// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Adaptive weight matrix with a bounded online Hebbian update.
//!
//! `WeightMatrix` is a dense row-major store with bounds-checked access.
//! `AdaptiveWeightMatrix` owns one and applies Oja's rule, the Hebbian update
//! with an implicit activity-dependent decay:
//!
//! ```text
//! x = clamp(activity, ±ACTIVITY_LIMIT)
//! y = tanh(W · x)
//! W_ij ← clamp(W_ij + η · (y_i · x_j − y_i² · W_ij), ±WEIGHT_LIMIT)
//! ```
//!
//! With `y` bounded by tanh, `x` clamped and `η ∈ (0, 1]`, every entry stays
//! finite after each update. The final clamp also catches anything the
//! algebra misses.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::numeric::bounded;
use crate::rng::ReservoirRng;

/// Bound on every weight entry after an update.
pub const WEIGHT_LIMIT: f32 = 4.0;
/// Activity values are saturated at this magnitude before use.
pub const ACTIVITY_LIMIT: f32 = 10.0;

/// Allocate a zeroed buffer, surfacing allocation failure as an error.
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<f32>, FieldError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| FieldError::Allocation { elements: len })?;
    data.resize(len, 0.0);
    Ok(data)
}

/// Dense `rows × cols` matrix, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl WeightMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, FieldError> {
        let len = rows
            .checked_mul(cols)
            .ok_or(FieldError::Allocation { elements: usize::MAX })?;
        Ok(Self {
            rows,
            cols,
            data: try_zeroed(len)?,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.offset(row, col).map(|i| self.data[i])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<(), FieldError> {
        let i = self.offset(row, col).ok_or(FieldError::IndexOutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        })?;
        self.data[i] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Option<&[f32]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Row-major view of all entries.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// `out = W · x`
    pub fn matvec_into(&self, x: &[f32], out: &mut [f32]) -> Result<(), FieldError> {
        if x.len() != self.cols {
            return Err(FieldError::DimensionMismatch {
                expected: self.cols,
                actual: x.len(),
            });
        }
        if out.len() != self.rows {
            return Err(FieldError::DimensionMismatch {
                expected: self.rows,
                actual: out.len(),
            });
        }
        for (o, row) in out.iter_mut().zip(self.data.chunks_exact(self.cols.max(1))) {
            *o = row.iter().zip(x.iter()).map(|(w, v)| w * v).sum();
        }
        if self.cols == 0 {
            out.iter_mut().for_each(|o| *o = 0.0);
        }
        Ok(())
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|w| w.is_finite())
    }

    pub fn frobenius_norm(&self) -> f32 {
        self.data.iter().map(|w| w * w).sum::<f32>().sqrt()
    }

    pub fn memory_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Weight matrix adapted online from reservoir activity.
///
/// Not synchronized: `update` takes `&mut self`, so concurrent updates on one
/// instance are ruled out by the borrow checker.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveWeightMatrix {
    weights: WeightMatrix,
    seed: u64,
    updates: u64,
    /// Clamped presynaptic activity (cols)
    pre: Vec<f32>,
    /// Postsynaptic response (rows)
    post: Vec<f32>,
}

impl AdaptiveWeightMatrix {
    /// Seeded bounded-uniform initialization in `±1/√cols`.
    ///
    /// Identical `(rows, cols, seed)` produce bit-identical matrices.
    pub fn new(rows: usize, cols: usize, seed: u64) -> Result<Self, FieldError> {
        let mut weights = WeightMatrix::zeros(rows, cols)?;
        let mut rng = ReservoirRng::new(seed);
        let bound = if cols > 0 { 1.0 / (cols as f32).sqrt() } else { 0.0 };
        for w in weights.data.iter_mut() {
            *w = rng.uniform_range(-bound, bound);
        }

        Ok(Self {
            weights,
            seed,
            updates: 0,
            pre: try_zeroed(cols)?,
            post: try_zeroed(rows)?,
        })
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    pub fn rows(&self) -> usize {
        self.weights.rows
    }

    pub fn cols(&self) -> usize {
        self.weights.cols
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of successful `update` calls.
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Apply one Oja-rule step driven by `activity` (length = cols).
    pub fn update(&mut self, activity: &[f32], learning_rate: f32) -> Result<(), FieldError> {
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(FieldError::InvalidLearningRate(learning_rate));
        }
        let cols = self.weights.cols;
        if activity.len() != cols {
            return Err(FieldError::DimensionMismatch {
                expected: cols,
                actual: activity.len(),
            });
        }

        for (p, &a) in self.pre.iter_mut().zip(activity.iter()) {
            *p = bounded(a, ACTIVITY_LIMIT);
        }
        self.weights.matvec_into(&self.pre, &mut self.post)?;
        for y in self.post.iter_mut() {
            *y = y.tanh();
        }

        if cols > 0 {
            for (row, &y) in self.weights.data.chunks_exact_mut(cols).zip(self.post.iter()) {
                let y = bounded(y, 1.0);
                let y2 = y * y;
                for (w, &x) in row.iter_mut().zip(self.pre.iter()) {
                    let delta = learning_rate * (y * x - y2 * *w);
                    *w = bounded(*w + delta, WEIGHT_LIMIT);
                }
            }
        }

        self.updates += 1;
        debug_assert!(self.weights.is_finite());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization_deterministic() {
        let a = AdaptiveWeightMatrix::new(50, 50, 42).unwrap();
        let b = AdaptiveWeightMatrix::new(50, 50, 42).unwrap();
        let bits_a: Vec<u32> = a.weights().as_slice().iter().map(|w| w.to_bits()).collect();
        let bits_b: Vec<u32> = b.weights().as_slice().iter().map(|w| w.to_bits()).collect();
        assert_eq!(bits_a, bits_b);

        let c = AdaptiveWeightMatrix::new(50, 50, 43).unwrap();
        assert_ne!(a.weights(), c.weights());
    }

    #[test]
    fn test_initialization_bounded() {
        let m = AdaptiveWeightMatrix::new(20, 16, 7).unwrap();
        let bound = 1.0 / 4.0;
        assert!(m.weights().as_slice().iter().all(|w| w.abs() <= bound));
        assert!(m.weights().frobenius_norm() > 0.0);
    }

    #[test]
    fn test_rectangular_update() {
        let mut m = AdaptiveWeightMatrix::new(3, 5, 1).unwrap();
        let before = m.weights().clone();
        m.update(&[0.5, -0.2, 0.9, 0.1, 0.0], 0.1).unwrap();
        assert_ne!(&before, m.weights());
        assert_eq!(m.update_count(), 1);
    }

    #[test]
    fn test_update_rejects_bad_learning_rate() {
        let mut m = AdaptiveWeightMatrix::new(4, 4, 1).unwrap();
        for lr in [0.0, -0.1, 1.5, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                m.update(&[0.1; 4], lr),
                Err(FieldError::InvalidLearningRate(_))
            ));
        }
        assert_eq!(m.update_count(), 0);
    }

    #[test]
    fn test_update_rejects_wrong_length() {
        let mut m = AdaptiveWeightMatrix::new(4, 4, 1).unwrap();
        assert_eq!(
            m.update(&[0.1; 3], 0.1),
            Err(FieldError::DimensionMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_extreme_activity_stays_finite() {
        let mut m = AdaptiveWeightMatrix::new(8, 8, 3).unwrap();
        let activity = [1e30, -1e30, f32::MAX, f32::MIN, f32::NAN, f32::INFINITY, 0.0, 1.0];
        for _ in 0..100 {
            m.update(&activity, 1.0).unwrap();
        }
        assert!(m.weights().is_finite());
        assert!(m.weights().as_slice().iter().all(|w| w.abs() <= WEIGHT_LIMIT));
    }

    #[test]
    fn test_many_updates_stable() {
        let mut m = AdaptiveWeightMatrix::new(150, 150, 11).unwrap();
        let mut rng = ReservoirRng::new(12);
        for _ in 0..50 {
            let activity: Vec<f32> = (0..150).map(|_| rng.uniform()).collect();
            m.update(&activity, 0.01).unwrap();
        }
        assert!(m.weights().is_finite());
        assert_eq!(m.update_count(), 50);
    }

    #[test]
    fn test_identical_updates_identical_weights() {
        let mut a = AdaptiveWeightMatrix::new(10, 10, 300).unwrap();
        let mut b = AdaptiveWeightMatrix::new(10, 10, 300).unwrap();
        for step in 0..5 {
            let activity: Vec<f32> = (0..10).map(|i| ((i + step) as f32 * 0.3).sin()).collect();
            a.update(&activity, 0.05).unwrap();
            b.update(&activity, 0.05).unwrap();
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_bounds_checked_access() {
        let mut w = WeightMatrix::zeros(2, 3).unwrap();
        assert_eq!(w.get(1, 2), Some(0.0));
        assert_eq!(w.get(2, 0), None);
        assert_eq!(w.get(0, 3), None);
        w.set(1, 2, 0.5).unwrap();
        assert_eq!(w.get(1, 2), Some(0.5));
        assert_eq!(w.row(1), Some(&[0.0, 0.0, 0.5][..]));
        assert!(w.row(2).is_none());
        assert!(matches!(
            w.set(5, 0, 1.0),
            Err(FieldError::IndexOutOfBounds { row: 5, .. })
        ));
    }

    #[test]
    fn test_matvec() {
        let mut w = WeightMatrix::zeros(2, 2).unwrap();
        w.set(0, 0, 1.0).unwrap();
        w.set(0, 1, 2.0).unwrap();
        w.set(1, 0, -1.0).unwrap();
        let mut out = [0.0; 2];
        w.matvec_into(&[3.0, 4.0], &mut out).unwrap();
        assert_eq!(out, [11.0, -3.0]);
        assert!(w.matvec_into(&[1.0], &mut out).is_err());
    }
}
