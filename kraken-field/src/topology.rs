// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Sparse recurrent topology with CSR storage
//!
//! Each of the `n²` candidate connections is realized independently with
//! probability `connectivity`, so the density of the matrix is ≈ connectivity.
//! Realized weights are drawn uniform in [-1, 1] and the whole matrix is then
//! rescaled so its estimated spectral radius equals the requested target.
//! Keeping ρ(W) < 1 gives the reservoir its fading memory (echo state property).
//!
//! The CSR format stores rows as:
//! - `row_offsets[i]..row_offsets[i+1]` gives the range of connections into neuron `i`
//! - `col_indices[k]` gives the presynaptic neuron, ascending within a row
//! - `weights[k]` gives the connection strength
//!
//! The topology is immutable after construction.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FieldError;
use crate::numeric::l2_norm;
use crate::rng::ReservoirRng;

/// Power iterations used by the spectral radius estimate.
const POWER_ITERATIONS: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentTopology {
    size: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<u32>,
    weights: Vec<f32>,
}

impl RecurrentTopology {
    /// Sample a topology from `rng`.
    ///
    /// Consumes exactly `size²` uniform draws for the connection mask plus one
    /// per realized connection, so identical `(size, connectivity, rng state)`
    /// produce identical topologies.
    pub fn build(
        size: usize,
        connectivity: f32,
        spectral_radius: f32,
        rng: &mut ReservoirRng,
    ) -> Result<Self, FieldError> {
        if !(0.0..=1.0).contains(&connectivity) {
            return Err(FieldError::InvalidParameter {
                name: "connectivity",
                value: connectivity,
            });
        }
        if !spectral_radius.is_finite() || spectral_radius <= 0.0 {
            return Err(FieldError::InvalidParameter {
                name: "spectral_radius",
                value: spectral_radius,
            });
        }
        if size > u32::MAX as usize {
            return Err(FieldError::Allocation { elements: size });
        }

        let candidates = size
            .checked_mul(size)
            .ok_or(FieldError::Allocation { elements: usize::MAX })?;
        let expected = ((candidates as f64) * connectivity as f64).ceil() as usize;

        let mut row_offsets = Vec::new();
        row_offsets
            .try_reserve_exact(size + 1)
            .map_err(|_| FieldError::Allocation { elements: size + 1 })?;
        let mut col_indices = Vec::new();
        col_indices
            .try_reserve(expected)
            .map_err(|_| FieldError::Allocation { elements: expected })?;
        let mut weights = Vec::new();
        weights
            .try_reserve(expected)
            .map_err(|_| FieldError::Allocation { elements: expected })?;

        row_offsets.push(0);
        for _ in 0..size {
            for j in 0..size {
                if rng.chance(connectivity) {
                    col_indices.push(j as u32);
                    weights.push(rng.uniform_range(-1.0, 1.0));
                }
            }
            row_offsets.push(col_indices.len());
        }

        let mut topology = Self {
            size,
            row_offsets,
            col_indices,
            weights,
        };

        let raw_radius = topology.spectral_radius_estimate();
        if raw_radius > f32::EPSILON {
            let factor = spectral_radius / raw_radius;
            topology.weights.iter_mut().for_each(|w| *w *= factor);
        }

        debug!(
            size,
            nnz = topology.nnz(),
            density = topology.density(),
            raw_radius,
            "built recurrent topology"
        );

        Ok(topology)
    }

    /// Number of neurons.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of realized connections.
    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    /// Fraction of the `n²` possible connections that are realized.
    pub fn density(&self) -> f32 {
        if self.size == 0 {
            0.0
        } else {
            self.nnz() as f32 / (self.size * self.size) as f32
        }
    }

    /// Weight of connection `from → to`; `Some(0.0)` for an absent connection,
    /// `None` out of bounds.
    pub fn get(&self, to: usize, from: usize) -> Option<f32> {
        if to >= self.size || from >= self.size {
            return None;
        }
        let (start, end) = (self.row_offsets[to], self.row_offsets[to + 1]);
        let row = &self.col_indices[start..end];
        Some(match row.binary_search(&(from as u32)) {
            Ok(k) => self.weights[start + k],
            Err(_) => 0.0,
        })
    }

    /// Iterator over (presynaptic_idx, weight) for neuron `i`
    pub fn connections_of(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let start = self.row_offsets[i];
        let end = self.row_offsets[i + 1];
        self.col_indices[start..end]
            .iter()
            .zip(self.weights[start..end].iter())
            .map(|(&idx, &w)| (idx as usize, w))
    }

    /// `out = W · state`
    pub fn propagate_into(&self, state: &[f32], out: &mut [f32]) {
        debug_assert_eq!(state.len(), self.size);
        debug_assert_eq!(out.len(), self.size);
        for (i, o) in out.iter_mut().enumerate().take(self.size) {
            *o = self.connections_of(i).map(|(j, w)| w * state[j]).sum();
        }
    }

    /// Estimate ρ(W) as the geometric-mean growth rate of `‖Wᵏv‖` over the
    /// second half of a fixed power iteration from the uniform vector.
    ///
    /// Deterministic, and linear in the weight scale, which is what the
    /// rescaling in [`build`](Self::build) relies on.
    pub fn spectral_radius_estimate(&self) -> f32 {
        if self.size == 0 || self.nnz() == 0 {
            return 0.0;
        }
        let mut v = vec![1.0 / (self.size as f32).sqrt(); self.size];
        let mut w = vec![0.0; self.size];
        let mut log_growth = 0.0f64;
        let mut counted = 0usize;

        for iter in 0..POWER_ITERATIONS {
            self.propagate_into(&v, &mut w);
            let norm = l2_norm(&w);
            if !norm.is_finite() || norm <= f32::MIN_POSITIVE {
                // Nilpotent (or degenerate) structure: every trajectory dies out.
                return 0.0;
            }
            if iter >= POWER_ITERATIONS / 2 {
                log_growth += (norm as f64).ln();
                counted += 1;
            }
            for (vi, wi) in v.iter_mut().zip(w.iter()) {
                *vi = wi / norm;
            }
        }

        (log_growth / counted as f64).exp() as f32
    }

    pub fn memory_bytes(&self) -> usize {
        self.row_offsets.len() * std::mem::size_of::<usize>()
            + self.col_indices.len() * std::mem::size_of::<u32>()
            + self.weights.len() * std::mem::size_of::<f32>()
    }
}
