// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Concurrent use of independent and shared instances.

mod common;

use common::{generate_batch, generate_test_sequence};
use futures::future::join_all;
use kraken_engine::{KrakenLNN, ProcessOptions, SharedKraken};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_instances_match_sequential_runs() {
    let batch = generate_batch(6, 40, 900);

    let mut expected = Vec::new();
    for (i, seq) in batch.iter().enumerate() {
        let mut lnn = KrakenLNN::new(50, 0.1, Some(i as u64), 20).unwrap();
        expected.push(lnn.process(seq).await);
    }

    let handles: Vec<_> = batch
        .into_iter()
        .enumerate()
        .map(|(i, seq)| {
            tokio::spawn(async move {
                let mut lnn = KrakenLNN::new(50, 0.1, Some(i as u64), 20).unwrap();
                lnn.process(&seq).await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(results, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_instance_accepts_concurrent_callers() {
    let shared = SharedKraken::new(KrakenLNN::new(100, 0.1, Some(42), 100).unwrap());

    let calls = (0..5u64).map(|i| {
        let shared = shared.clone();
        async move {
            let seq = generate_test_sequence(30, i);
            shared
                .process_sequence(&seq, ProcessOptions::without_consolidation())
                .await
        }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(|r| r.success));
    assert!(results.iter().all(|r| r.liquid_outputs.len() == 30));
    let mut counts: Vec<usize> = results.iter().map(|r| r.memory_count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3, 4, 5]);
    assert_eq!(shared.memory_count().await, 5);
}

#[tokio::test]
async fn shared_instance_equals_sequential_replay_in_lock_order() {
    let batch = generate_batch(4, 25, 10);
    let shared: SharedKraken = KrakenLNN::new(30, 0.2, Some(5), 10).unwrap().into();
    let mut serial = KrakenLNN::new(30, 0.2, Some(5), 10).unwrap();

    for seq in &batch {
        let a = shared.process(seq).await;
        let b = serial.process(seq).await;
        assert_eq!(a, b);
    }
    let guard = shared.lock().await;
    assert_eq!(guard.sequences_processed(), 4);
    assert_eq!(guard.reservoir().state(), serial.reservoir().state());
}
