// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Kraken LNN engine
//!
//! Liquid state machine, bounded temporal memory and the async orchestrator
//! that ties them together. Numerical building blocks live in `kraken-field`.

pub mod config;
pub mod error;
pub mod lnn;
pub mod memory;
pub mod reservoir;

pub use config::{ConsolidationKind, KrakenConfig, MemoryConfig, ReservoirConfig};
pub use error::{KrakenError, Result};
pub use lnn::{KrakenLNN, ProcessOptions, ProcessingResult, SharedKraken};
pub use memory::{
    ConsolidationReport, ConsolidationStrategy, LeastRecent, MemoryEntry, MemoryStats,
    OutputSummary, SimilarityMerge, TemporalMemory,
};
pub use reservoir::LiquidStateMachine;
