// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Property tests over arbitrary inputs and parameters.

use kraken_engine::reservoir::{OUTPUT_LIMIT, STATE_LIMIT};
use kraken_engine::{KrakenLNN, LiquidStateMachine, MemoryEntry, ProcessOptions, TemporalMemory};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn outputs_are_finite_and_bounded(
        seed in any::<u64>(),
        size in 1usize..48,
        connectivity in 0.0f32..=1.0,
        inputs in prop::collection::vec(-1e6f32..1e6, 0..40),
    ) {
        let mut lsm = LiquidStateMachine::new(size, connectivity, Some(seed)).unwrap();
        let outputs = lsm.process_sequence(&inputs, true).unwrap();
        prop_assert_eq!(outputs.len(), inputs.len());
        for y in outputs {
            prop_assert!(y.is_finite() && y.abs() <= OUTPUT_LIMIT);
        }
        for s in lsm.state() {
            prop_assert!(s.abs() <= STATE_LIMIT);
        }
        prop_assert!(lsm.is_finite());
    }

    #[test]
    fn same_seed_replays(seed in any::<u64>(), inputs in prop::collection::vec(-5.0f32..5.0, 1..20)) {
        let mut a = LiquidStateMachine::new(16, 0.3, Some(seed)).unwrap();
        let mut b = LiquidStateMachine::new(16, 0.3, Some(seed)).unwrap();
        prop_assert_eq!(
            a.process_sequence(&inputs, false).unwrap(),
            b.process_sequence(&inputs, false).unwrap()
        );
    }

    #[test]
    fn memory_respects_capacity(
        capacity in 1usize..12,
        states in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 20), 0..40),
    ) {
        let mut memory = TemporalMemory::new(capacity).unwrap();
        for state in &states {
            memory.add(MemoryEntry::from_sequence(&state[..3], state));
            prop_assert!(memory.len() <= capacity);
        }
        let before = memory.len();
        memory.consolidate();
        prop_assert!(memory.len() <= before);
    }

    #[test]
    fn non_finite_inputs_never_commit(
        prefix in prop::collection::vec(-1.0f32..1.0, 0..10),
        bad in prop::sample::select(vec![f32::NAN, f32::INFINITY, f32::NEG_INFINITY]),
    ) {
        let mut lnn = KrakenLNN::new(12, 0.2, Some(1), 4).unwrap();
        let mut seq = prefix.clone();
        seq.push(bad);
        let state = lnn.reservoir().state().to_vec();
        let r = lnn.process_sequence_sync(&seq, ProcessOptions::default());
        prop_assert!(!r.success);
        prop_assert_eq!(r.memory_count, 0);
        prop_assert_eq!(lnn.reservoir().state(), &state[..]);
    }
}
