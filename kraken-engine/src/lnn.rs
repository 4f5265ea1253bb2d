// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Kraken LNN orchestrator
//!
//! Owns one liquid state machine and one temporal memory. A processed
//! sequence becomes one memory entry; consolidation and learning are
//! per-call options.
//!
//! Processing never fails through the return type: a failure yields a
//! [`ProcessingResult`] with `success == false` and the error message.
//! Non-finite inputs are rejected before anything is touched. A reservoir
//! that still goes non-finite after clamping is reported and nothing is
//! stored in memory.

use std::sync::Arc;

use kraken_field::numeric::all_finite;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::config::{KrakenConfig, ReservoirConfig};
use crate::error::{KrakenError, Result};
use crate::memory::{MemoryEntry, TemporalMemory};
use crate::reservoir::LiquidStateMachine;

/// Per-call processing switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Run a consolidation pass after storing the new entry
    pub memory_consolidation: bool,
    /// Let the adaptive readout learn from this sequence
    pub learning_enabled: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            memory_consolidation: true,
            learning_enabled: false,
        }
    }
}

impl ProcessOptions {
    pub fn without_consolidation() -> Self {
        Self {
            memory_consolidation: false,
            ..Self::default()
        }
    }

    pub fn with_learning(mut self) -> Self {
        self.learning_enabled = true;
        self
    }
}

/// Outcome of one call, in the wire shape consumers read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    /// One output per input, in order (empty on failure)
    pub liquid_outputs: Vec<f32>,
    /// Reservoir state after the call
    pub reservoir_state: Vec<f32>,
    /// Temporal memory size after the call
    pub memory_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    fn failure(err: &KrakenError, reservoir_state: Vec<f32>, memory_count: usize) -> Self {
        Self {
            success: false,
            liquid_outputs: Vec::new(),
            reservoir_state,
            memory_count,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct KrakenLNN {
    reservoir: LiquidStateMachine,
    temporal_memory: TemporalMemory,
    sequences_processed: u64,
}

impl KrakenLNN {
    pub fn new(
        reservoir_size: usize,
        connectivity: f32,
        seed: Option<u64>,
        max_memory_entries: usize,
    ) -> Result<Self> {
        let mut config = KrakenConfig {
            reservoir: ReservoirConfig::new(reservoir_size, connectivity, seed),
            ..KrakenConfig::default()
        };
        config.memory.max_entries = max_memory_entries;
        Self::from_config(config)
    }

    pub fn from_config(config: KrakenConfig) -> Result<Self> {
        config.validate()?;
        let temporal_memory = TemporalMemory::from_config(&config.memory)?;
        let reservoir = LiquidStateMachine::from_config(config.reservoir)?;
        debug!(
            reservoir_size = reservoir.reservoir_size(),
            seed = reservoir.seed(),
            max_memory_entries = temporal_memory.max_entries(),
            strategy = temporal_memory.strategy_name(),
            "kraken lnn ready"
        );
        Ok(Self {
            reservoir,
            temporal_memory,
            sequences_processed: 0,
        })
    }

    /// Process one sequence. Yields to the runtime once before doing work.
    pub async fn process_sequence(
        &mut self,
        sequence: &[f32],
        options: ProcessOptions,
    ) -> ProcessingResult {
        tokio::task::yield_now().await;
        self.process_sequence_sync(sequence, options)
    }

    /// [`process_sequence`](Self::process_sequence) with default options.
    pub async fn process(&mut self, sequence: &[f32]) -> ProcessingResult {
        self.process_sequence(sequence, ProcessOptions::default())
            .await
    }

    /// Synchronous core of [`process_sequence`](Self::process_sequence).
    pub fn process_sequence_sync(
        &mut self,
        sequence: &[f32],
        options: ProcessOptions,
    ) -> ProcessingResult {
        match self.try_process(sequence, options) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, len = sequence.len(), "sequence rejected");
                ProcessingResult::failure(
                    &err,
                    self.reservoir.state().to_vec(),
                    self.temporal_memory.len(),
                )
            }
        }
    }

    fn try_process(
        &mut self,
        sequence: &[f32],
        options: ProcessOptions,
    ) -> Result<ProcessingResult> {
        if let Some((index, &value)) = sequence.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(KrakenError::NonFiniteInput { index, value });
        }

        let outputs = self
            .reservoir
            .process_sequence(sequence, options.learning_enabled)?;
        if !all_finite(&outputs) || !self.reservoir.is_finite() {
            return Err(KrakenError::NonFiniteState);
        }

        self.temporal_memory
            .add(MemoryEntry::from_sequence(&outputs, self.reservoir.state()));
        if options.memory_consolidation {
            self.temporal_memory.consolidate();
        }
        self.sequences_processed += 1;

        debug!(
            len = sequence.len(),
            memory_count = self.temporal_memory.len(),
            learning = options.learning_enabled,
            "sequence processed"
        );

        Ok(ProcessingResult {
            success: true,
            liquid_outputs: outputs,
            reservoir_state: self.reservoir.state().to_vec(),
            memory_count: self.temporal_memory.len(),
            error: None,
        })
    }

    pub fn reservoir(&self) -> &LiquidStateMachine {
        &self.reservoir
    }

    pub fn temporal_memory(&self) -> &TemporalMemory {
        &self.temporal_memory
    }

    pub fn temporal_memory_mut(&mut self) -> &mut TemporalMemory {
        &mut self.temporal_memory
    }

    pub fn sequences_processed(&self) -> u64 {
        self.sequences_processed
    }

    pub fn seed(&self) -> u64 {
        self.reservoir.seed()
    }
}

/// A [`KrakenLNN`] shared between tasks. Calls on the same instance are
/// serialized by the lock; each call sees the state left by the previous one.
#[derive(Debug, Clone)]
pub struct SharedKraken {
    inner: Arc<Mutex<KrakenLNN>>,
}

impl SharedKraken {
    pub fn new(lnn: KrakenLNN) -> Self {
        Self {
            inner: Arc::new(Mutex::new(lnn)),
        }
    }

    pub async fn process_sequence(
        &self,
        sequence: &[f32],
        options: ProcessOptions,
    ) -> ProcessingResult {
        let mut lnn = self.inner.lock().await;
        lnn.process_sequence(sequence, options).await
    }

    pub async fn process(&self, sequence: &[f32]) -> ProcessingResult {
        self.process_sequence(sequence, ProcessOptions::default())
            .await
    }

    /// Exclusive access for inspection or configuration.
    pub async fn lock(&self) -> MutexGuard<'_, KrakenLNN> {
        self.inner.lock().await
    }

    pub async fn memory_count(&self) -> usize {
        self.inner.lock().await.temporal_memory().len()
    }
}

impl From<KrakenLNN> for SharedKraken {
    fn from(lnn: KrakenLNN) -> Self {
        Self::new(lnn)
    }
}
