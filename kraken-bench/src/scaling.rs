// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Scaling benchmarks: how cost grows with reservoir size, sequence length,
//! connectivity, memory size and batch size.

use std::time::Instant;

use anyhow::Result;
use kraken_engine::{KrakenLNN, LiquidStateMachine, ProcessOptions};
use kraken_field::{AdaptiveWeightMatrix, DynamicsParams, LiquidDynamics, ReservoirRng};

use crate::workload::{generate_batch, generate_sequence, ms, timed, timed_async};

pub async fn run_all(seed: u64) -> Result<()> {
    println!("=== Kraken LNN Scaling Benchmarks ===\n");
    bench_initialization(seed)?;
    bench_reservoir_size(seed).await?;
    bench_sequence_length(seed).await?;
    bench_connectivity(seed).await?;
    bench_memory_consolidation(seed).await?;
    bench_batch(seed).await?;
    bench_dynamics(seed)?;
    bench_weight_updates(seed)?;
    println!("=== All scaling benchmarks complete ===");
    Ok(())
}

fn bench_initialization(seed: u64) -> Result<()> {
    for size in [50usize, 100, 200, 500] {
        let (lnn, elapsed) = timed(|| KrakenLNN::new(size, 0.1, Some(seed), 1000));
        let lnn = lnn?;
        println!(
            "[init] size {size}: {:.2}ms ({} recurrent connections, {:.1} KiB)",
            ms(elapsed),
            lnn.reservoir().topology().nnz(),
            lnn.reservoir().memory_bytes() as f64 / 1024.0,
        );
    }
    println!();
    Ok(())
}

async fn bench_reservoir_size(seed: u64) -> Result<()> {
    let sequence = generate_sequence(100, seed);
    for size in [50usize, 100, 200, 500] {
        let mut lnn = KrakenLNN::new(size, 0.1, Some(seed), 1000)?;
        let (result, elapsed) = timed_async(lnn.process(&sequence)).await;
        println!(
            "[size] {size} neurons: {:.2}ms for {} steps ({:.1}us/step, success={})",
            ms(elapsed),
            sequence.len(),
            elapsed.as_micros() as f64 / sequence.len() as f64,
            result.success,
        );
    }
    println!();
    Ok(())
}

async fn bench_sequence_length(seed: u64) -> Result<()> {
    for len in [10usize, 50, 100, 500, 1000] {
        let sequence = generate_sequence(len, seed);
        let mut lnn = KrakenLNN::new(100, 0.1, Some(seed), 1000)?;
        let (_, elapsed) = timed_async(lnn.process(&sequence)).await;
        println!(
            "[length] {len} steps: {:.2}ms ({:.1}us/step)",
            ms(elapsed),
            elapsed.as_micros() as f64 / len as f64,
        );
    }
    println!();
    Ok(())
}

async fn bench_connectivity(seed: u64) -> Result<()> {
    let sequence = generate_sequence(100, seed);
    for connectivity in [0.01f32, 0.05, 0.1, 0.2, 0.5] {
        let mut lnn = KrakenLNN::new(200, connectivity, Some(seed), 1000)?;
        let nnz = lnn.reservoir().topology().nnz();
        let (_, elapsed) = timed_async(lnn.process(&sequence)).await;
        println!(
            "[connectivity] {connectivity:.2}: {:.2}ms ({nnz} connections)",
            ms(elapsed),
        );
    }
    println!();
    Ok(())
}

async fn bench_memory_consolidation(seed: u64) -> Result<()> {
    for count in [10usize, 50, 100, 200] {
        let mut lnn = KrakenLNN::new(100, 0.1, Some(seed), 1000)?;
        for sequence in generate_batch(count, 20, seed) {
            lnn.process_sequence(&sequence, ProcessOptions::without_consolidation())
                .await;
        }
        let before = lnn.temporal_memory().len();
        let (report, elapsed) = timed(|| lnn.temporal_memory_mut().consolidate());
        println!(
            "[consolidation] {before} entries: {:.3}ms (merged {}, evicted {}, {} remain)",
            ms(elapsed),
            report.merged,
            report.evicted,
            lnn.temporal_memory().len(),
        );
    }
    println!();
    Ok(())
}

async fn bench_batch(seed: u64) -> Result<()> {
    for batch_size in [1usize, 5, 10, 20] {
        let batch = generate_batch(batch_size, 50, seed);
        let mut lnn = KrakenLNN::new(100, 0.1, Some(seed), 1000)?;
        let start = Instant::now();
        let mut ok = 0;
        for sequence in &batch {
            if lnn.process(sequence).await.success {
                ok += 1;
            }
        }
        let elapsed = start.elapsed();
        println!(
            "[batch] {batch_size} sequences: {:.2}ms ({:.2}ms/sequence, {ok}/{batch_size} ok)",
            ms(elapsed),
            ms(elapsed) / batch_size as f64,
        );
    }
    println!();
    Ok(())
}

fn bench_dynamics(seed: u64) -> Result<()> {
    let dynamics = LiquidDynamics::new(DynamicsParams::default())?;
    let mut rng = ReservoirRng::new(seed);
    for size in [100usize, 500, 1000] {
        let state: Vec<f32> = (0..size).map(|_| rng.uniform_range(-1.0, 1.0)).collect();
        let mut out = vec![0.0; size];
        let iters = 1000u32;
        let (_, elapsed) = timed(|| {
            for i in 0..iters {
                dynamics.calculate_perturbation_into(i as f32 * 0.01, &state, &mut rng, &mut out);
            }
        });
        println!(
            "[dynamics] {size} neurons: {iters} perturbations in {:.2}ms ({:.2}us each)",
            ms(elapsed),
            elapsed.as_micros() as f64 / iters as f64,
        );
    }
    println!();
    Ok(())
}

fn bench_weight_updates(seed: u64) -> Result<()> {
    let mut rng = ReservoirRng::new(seed);
    for size in [50usize, 100, 200] {
        let mut weights = AdaptiveWeightMatrix::new(size, size, seed)?;
        let activity: Vec<f32> = (0..size).map(|_| rng.uniform()).collect();
        let iters = 100u32;
        let (result, elapsed) = timed(|| -> Result<()> {
            for _ in 0..iters {
                weights.update(&activity, 0.01)?;
            }
            Ok(())
        });
        result?;
        println!(
            "[weights] {size}x{size}: {iters} updates in {:.2}ms (norm {:.3})",
            ms(elapsed),
            weights.weights().frobenius_norm(),
        );
    }

    let mut lsm = LiquidStateMachine::new(100, 0.1, Some(seed))?;
    let sequence = generate_sequence(100, seed);
    let (outputs, elapsed) = timed(|| lsm.process_sequence(&sequence, true));
    println!(
        "[weights] learning pass over {} steps: {:.2}ms",
        outputs?.len(),
        ms(elapsed),
    );
    println!();
    Ok(())
}
