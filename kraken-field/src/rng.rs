// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Explicit seeded pseudorandom stream.
//!
//! Every stochastic component of the reservoir (topology sampling, input
//! weights, liquid noise, weight initialization) draws from a `ReservoirRng`
//! that is owned by, or threaded through, the component using it. There is no
//! process-global generator: two instances built from the same seed replay the
//! same stream regardless of what other instances do in between.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

/// Stride between derived sub-stream seeds.
const STREAM_STRIDE: u64 = 7919;

#[derive(Debug, Clone)]
pub struct ReservoirRng {
    inner: SmallRng,
    seed: u64,
}

impl ReservoirRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from OS entropy. The drawn seed is recorded so the run can be replayed.
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    /// The seed this stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Independent child stream for a sub-component.
    ///
    /// Depends only on the parent seed and `stream`, not on how many values
    /// the parent has already produced.
    pub fn derive(&self, stream: u64) -> Self {
        Self::new(
            self.seed
                .wrapping_add(stream.wrapping_add(1).wrapping_mul(STREAM_STRIDE)),
        )
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform f32 in [0, 1)
    pub fn uniform(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Uniform f32 in [lo, hi)
    pub fn uniform_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.uniform()
    }

    /// Standard normal via Box-Muller
    pub fn normal(&mut self) -> f32 {
        let u1 = self.uniform().max(1e-10);
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
    }

    /// Bernoulli trial with success probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.uniform() < p
    }
}
