// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

#![allow(dead_code)]

use kraken_field::ReservoirRng;

/// Noisy sinusoid of `len` samples, reproducible from `seed`.
pub fn generate_test_sequence(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = ReservoirRng::new(seed);
    let freq = rng.uniform_range(0.05, 0.3);
    let phase = rng.uniform_range(0.0, std::f32::consts::TAU);
    (0..len)
        .map(|t| (freq * t as f32 + phase).sin() + 0.1 * rng.normal())
        .collect()
}

/// `count` sequences with consecutive seeds starting at `base_seed`.
pub fn generate_batch(count: usize, len: usize, base_seed: u64) -> Vec<Vec<f32>> {
    (0..count as u64)
        .map(|i| generate_test_sequence(len, base_seed + i))
        .collect()
}
