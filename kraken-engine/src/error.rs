// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Error taxonomy for the Kraken engine.
//!
//! Configuration and allocation failures surface at construction. Numeric
//! problems are corrected locally by clamping; the only numeric errors that
//! reach a caller are rejected inputs and a state that clamping could not
//! bring back to finite values.

use kraken_field::FieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KrakenError {
    #[error("reservoir_size must be positive, got {0}")]
    InvalidReservoirSize(usize),

    #[error("reservoir_size {size} exceeds the supported maximum of {max}")]
    ResourceLimit { size: usize, max: usize },

    #[error("connectivity must be in [0, 1], got {0}")]
    InvalidConnectivity(f32),

    #[error("max_memory_entries must be positive, got {0}")]
    InvalidMemoryCapacity(usize),

    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("non-finite input at index {index}: {value}")]
    NonFiniteInput { index: usize, value: f32 },

    #[error("reservoir produced non-finite values")]
    NonFiniteState,

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid environment override {key}={value:?}")]
    EnvOverride { key: String, value: String },
}

impl KrakenError {
    /// True for errors that reject a configuration. Resource and allocation
    /// failures are also fatal to construction but are not configuration errors.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidReservoirSize(_)
                | Self::InvalidConnectivity(_)
                | Self::InvalidMemoryCapacity(_)
                | Self::InvalidParameter { .. }
                | Self::ConfigParse(_)
                | Self::EnvOverride { .. }
                | Self::Field(FieldError::InvalidParameter { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, KrakenError>;
