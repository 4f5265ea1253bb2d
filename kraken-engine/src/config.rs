// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Runtime configuration for the Kraken LNN
//!
//! Configuration is layered: compiled defaults (or a preset), then an
//! optional TOML file, then `KRAKEN_*` environment overrides. Every layer
//! ends in [`KrakenConfig::validate`] so an invalid value fails at
//! construction rather than mid-sequence.

use std::path::Path;
use std::str::FromStr;

use kraken_field::DynamicsParams;
use serde::{Deserialize, Serialize};

use crate::error::{KrakenError, Result};

/// Upper bound on reservoir size. The adaptive readout is dense, so this
/// caps it at 256 MiB of `f32`.
pub const MAX_RESERVOIR_SIZE: usize = 8192;

/// Environment variables consulted by [`KrakenConfig::apply_env_overrides`].
pub const ENV_RESERVOIR_SIZE: &str = "KRAKEN_RESERVOIR_SIZE";
pub const ENV_CONNECTIVITY: &str = "KRAKEN_CONNECTIVITY";
pub const ENV_SEED: &str = "KRAKEN_SEED";
pub const ENV_MAX_MEMORY_ENTRIES: &str = "KRAKEN_MAX_MEMORY_ENTRIES";
pub const ENV_VISCOSITY: &str = "KRAKEN_VISCOSITY";
pub const ENV_TEMPERATURE: &str = "KRAKEN_TEMPERATURE";
pub const ENV_PRESSURE: &str = "KRAKEN_PRESSURE";
pub const ENV_LEARNING_RATE: &str = "KRAKEN_LEARNING_RATE";

/// Which consolidation policy temporal memory runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationKind {
    /// Merge near-duplicate fingerprints, then evict by decayed strength
    #[default]
    SimilarityMerge,
    /// Evict the least recently seen entries, never merge
    LeastRecent,
}

/// Liquid state machine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirConfig {
    /// Number of neurons
    pub reservoir_size: usize,
    /// Probability of each directed recurrent connection, in [0, 1]
    pub connectivity: f32,
    /// Master seed; `None` draws one from entropy (and records it)
    pub seed: Option<u64>,
    /// Target spectral radius of the recurrent weights
    pub spectral_radius: f32,
    /// Fraction of the state replaced per step, in (0, 1]
    pub leak_rate: f32,
    /// Half-width of the uniform input weight distribution
    pub input_scaling: f32,
    /// Half-width of the uniform initial state distribution, in [0, 1]
    pub initial_state_amplitude: f32,
    /// Add thermal noise to each readout
    pub noise_injection: bool,
    /// Oja learning rate used when learning is enabled, in (0, 1]
    pub learning_rate: f32,
    pub dynamics: DynamicsParams,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            reservoir_size: 100,
            connectivity: 0.1,
            seed: None,
            spectral_radius: 0.9,
            leak_rate: 0.3,
            input_scaling: 1.0,
            initial_state_amplitude: 0.1,
            noise_injection: true,
            learning_rate: 0.01,
            dynamics: DynamicsParams::default(),
        }
    }
}

impl ReservoirConfig {
    pub fn new(reservoir_size: usize, connectivity: f32, seed: Option<u64>) -> Self {
        Self {
            reservoir_size,
            connectivity,
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.reservoir_size == 0 {
            return Err(KrakenError::InvalidReservoirSize(self.reservoir_size));
        }
        if self.reservoir_size > MAX_RESERVOIR_SIZE {
            return Err(KrakenError::ResourceLimit {
                size: self.reservoir_size,
                max: MAX_RESERVOIR_SIZE,
            });
        }
        if !(0.0..=1.0).contains(&self.connectivity) {
            return Err(KrakenError::InvalidConnectivity(self.connectivity));
        }
        check(
            "spectral_radius",
            self.spectral_radius,
            self.spectral_radius.is_finite() && self.spectral_radius > 0.0,
            "must be finite and positive",
        )?;
        check(
            "leak_rate",
            self.leak_rate,
            self.leak_rate > 0.0 && self.leak_rate <= 1.0,
            "must be in (0, 1]",
        )?;
        check(
            "input_scaling",
            self.input_scaling,
            self.input_scaling.is_finite() && self.input_scaling >= 0.0,
            "must be finite and non-negative",
        )?;
        check(
            "initial_state_amplitude",
            self.initial_state_amplitude,
            (0.0..=1.0).contains(&self.initial_state_amplitude),
            "must be in [0, 1]",
        )?;
        check(
            "learning_rate",
            self.learning_rate,
            self.learning_rate > 0.0 && self.learning_rate <= 1.0,
            "must be in (0, 1]",
        )?;
        self.dynamics.validate()?;
        Ok(())
    }
}

/// Temporal memory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Hard capacity of the store
    pub max_entries: usize,
    pub strategy: ConsolidationKind,
    /// Cosine similarity at or above which two entries merge
    pub similarity_threshold: f32,
    /// Per-tick decay applied to an entry's strength since it was last seen
    pub recency_decay: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            strategy: ConsolidationKind::SimilarityMerge,
            similarity_threshold: 0.98,
            recency_decay: 0.99,
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(KrakenError::InvalidMemoryCapacity(self.max_entries));
        }
        check(
            "similarity_threshold",
            self.similarity_threshold,
            (-1.0..=1.0).contains(&self.similarity_threshold),
            "must be in [-1, 1]",
        )?;
        check(
            "recency_decay",
            self.recency_decay,
            self.recency_decay > 0.0 && self.recency_decay <= 1.0,
            "must be in (0, 1]",
        )?;
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KrakenConfig {
    pub reservoir: ReservoirConfig,
    pub memory: MemoryConfig,
}

impl KrakenConfig {
    /// Small, fast configuration for tests and smoke runs.
    pub fn small() -> Self {
        Self {
            reservoir: ReservoirConfig::new(50, 0.1, None),
            memory: MemoryConfig {
                max_entries: 100,
                ..MemoryConfig::default()
            },
        }
    }

    /// Larger reservoir with sparser wiring and a deeper memory.
    pub fn large() -> Self {
        Self {
            reservoir: ReservoirConfig::new(500, 0.05, None),
            memory: MemoryConfig {
                max_entries: 5000,
                ..MemoryConfig::default()
            },
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reservoir.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.reservoir.validate()?;
        self.memory.validate()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&text)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_with(|key| std::env::var(key).ok())
    }

    /// Apply `KRAKEN_*` overrides read through `lookup`.
    ///
    /// Does not validate; callers validate once all layers are applied.
    pub fn apply_overrides_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_RESERVOIR_SIZE) {
            self.reservoir.reservoir_size = parse_override(ENV_RESERVOIR_SIZE, raw)?;
        }
        if let Some(raw) = lookup(ENV_CONNECTIVITY) {
            self.reservoir.connectivity = parse_override(ENV_CONNECTIVITY, raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            self.reservoir.seed = if raw.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse_override(ENV_SEED, raw)?)
            };
        }
        if let Some(raw) = lookup(ENV_MAX_MEMORY_ENTRIES) {
            self.memory.max_entries = parse_override(ENV_MAX_MEMORY_ENTRIES, raw)?;
        }
        if let Some(raw) = lookup(ENV_VISCOSITY) {
            self.reservoir.dynamics.viscosity = parse_override(ENV_VISCOSITY, raw)?;
        }
        if let Some(raw) = lookup(ENV_TEMPERATURE) {
            self.reservoir.dynamics.temperature = parse_override(ENV_TEMPERATURE, raw)?;
        }
        if let Some(raw) = lookup(ENV_PRESSURE) {
            self.reservoir.dynamics.pressure = parse_override(ENV_PRESSURE, raw)?;
        }
        if let Some(raw) = lookup(ENV_LEARNING_RATE) {
            self.reservoir.learning_rate = parse_override(ENV_LEARNING_RATE, raw)?;
        }
        Ok(())
    }

    /// Bytes held by the reservoir and its dense readout, ignoring memory entries.
    pub fn estimated_memory_bytes(&self) -> usize {
        let n = self.reservoir.reservoir_size;
        let f = std::mem::size_of::<f32>();
        let dense = n * n * f;
        let sparse = (n as f64 * n as f64 * self.reservoir.connectivity as f64) as usize
            * (f + std::mem::size_of::<u32>());
        dense + sparse + 6 * n * f
    }
}

fn check(name: &'static str, value: f32, ok: bool, reason: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(KrakenError::InvalidParameter { name, value, reason })
    }
}

fn parse_override<T: FromStr>(key: &str, raw: String) -> Result<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => Err(KrakenError::EnvOverride {
            key: key.to_string(),
            value: raw,
        }),
    }
}
