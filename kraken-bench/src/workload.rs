// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Input generation and timing helpers shared by the benchmarks.

use std::future::Future;
use std::time::{Duration, Instant};

use kraken_field::ReservoirRng;

/// Noisy sinusoid of `len` samples, reproducible from `seed`.
pub fn generate_sequence(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = ReservoirRng::new(seed);
    let freq = rng.uniform_range(0.05, 0.3);
    let phase = rng.uniform_range(0.0, std::f32::consts::TAU);
    (0..len)
        .map(|t| (freq * t as f32 + phase).sin() + 0.1 * rng.normal())
        .collect()
}

pub fn generate_batch(count: usize, len: usize, base_seed: u64) -> Vec<Vec<f32>> {
    (0..count as u64)
        .map(|i| generate_sequence(len, base_seed.wrapping_add(i * 7919)))
        .collect()
}

/// Run `f` once and return its result with the elapsed time.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

/// Await `fut` and return its output with the elapsed time.
pub async fn timed_async<F: Future>(fut: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let out = fut.await;
    (out, start.elapsed())
}

pub fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
