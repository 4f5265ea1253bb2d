// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Kraken LNN benchmarks and command-line driver
//!
//! - `run`: process one generated sequence and print the result as JSON
//! - `scaling`: cost versus size, length, connectivity, memory and batch size
//! - `concurrent`: independent instances in parallel, and one shared instance

mod scaling;
mod workload;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kraken_engine::{KrakenConfig, KrakenLNN, ProcessOptions, SharedKraken};

use crate::workload::{generate_batch, generate_sequence, ms};

#[derive(Parser)]
#[command(name = "kraken-bench")]
#[command(about = "Benchmarks and driver for the Kraken liquid neural network")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one generated sequence and print the result as JSON.
    Run {
        /// TOML config file (KRAKEN_* environment overrides still apply)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Reservoir size
        #[arg(long)]
        size: Option<usize>,
        /// Recurrent connection probability
        #[arg(long)]
        connectivity: Option<f32>,
        /// Reservoir seed
        #[arg(long)]
        seed: Option<u64>,
        /// Generated sequence length
        #[arg(long, default_value = "100")]
        length: usize,
        /// Seed for the generated input sequence
        #[arg(long, default_value = "42")]
        input_seed: u64,
        /// Let the readout learn from the sequence
        #[arg(long)]
        learning: bool,
        /// Skip the consolidation pass
        #[arg(long)]
        no_consolidation: bool,
    },

    /// Run the scaling benchmark suite.
    Scaling {
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Process sequences concurrently.
    Concurrent {
        /// Number of concurrent sequences
        #[arg(short, long, default_value = "5")]
        instances: usize,
        /// Reservoir size
        #[arg(long, default_value = "100")]
        size: usize,
        /// Sequence length
        #[arg(long, default_value = "100")]
        length: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            size,
            connectivity,
            seed,
            length,
            input_seed,
            learning,
            no_consolidation,
        } => {
            let mut config = match config {
                Some(path) => KrakenConfig::load(&path)
                    .with_context(|| format!("loading config from {}", path.display()))?,
                None => KrakenConfig::from_env().context("reading KRAKEN_* environment")?,
            };
            if let Some(size) = size {
                config.reservoir.reservoir_size = size;
            }
            if let Some(connectivity) = connectivity {
                config.reservoir.connectivity = connectivity;
            }
            if seed.is_some() {
                config.reservoir.seed = seed;
            }

            let mut lnn = KrakenLNN::from_config(config).context("building kraken lnn")?;
            info!(seed = lnn.seed(), length, "processing sequence");

            let options = ProcessOptions {
                memory_consolidation: !no_consolidation,
                learning_enabled: learning,
            };
            let sequence = generate_sequence(length, input_seed);
            let result = lnn.process_sequence(&sequence, options).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                anyhow::bail!(result.error.unwrap_or_else(|| "processing failed".into()));
            }
        }
        Commands::Scaling { seed } => {
            scaling::run_all(seed).await?;
        }
        Commands::Concurrent {
            instances,
            size,
            length,
            seed,
        } => {
            bench_concurrent(instances, size, length, seed).await?;
        }
    }

    Ok(())
}

async fn bench_concurrent(instances: usize, size: usize, length: usize, seed: u64) -> Result<()> {
    println!("=== Kraken LNN Concurrency Benchmark ===\n");
    let batch = generate_batch(instances, length, seed);

    // Independent instances, one task each.
    let start = Instant::now();
    let handles: Vec<_> = batch
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, sequence)| {
            tokio::spawn(async move {
                let mut lnn = KrakenLNN::new(size, 0.1, Some(seed.wrapping_add(i as u64)), 1000)?;
                Ok::<_, kraken_engine::KrakenError>(lnn.process(&sequence).await)
            })
        })
        .collect();
    let mut ok = 0;
    for joined in join_all(handles).await {
        if joined??.success {
            ok += 1;
        }
    }
    let elapsed = start.elapsed();
    println!(
        "[independent] {instances} instances x {length} steps: {:.2}ms ({ok}/{instances} ok)",
        ms(elapsed),
    );

    // One instance shared by every caller; calls serialize on its lock.
    let shared = SharedKraken::new(KrakenLNN::new(size, 0.1, Some(seed), 1000)?);
    let start = Instant::now();
    let calls = batch.iter().map(|sequence| {
        let shared = shared.clone();
        async move { shared.process(sequence).await }
    });
    let results = join_all(calls).await;
    let elapsed = start.elapsed();
    let ok = results.iter().filter(|r| r.success).count();
    println!(
        "[shared] {instances} calls x {length} steps: {:.2}ms ({ok}/{instances} ok, {} memories)",
        ms(elapsed),
        shared.memory_count().await,
    );
    println!();
    Ok(())
}
