// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod error;
pub mod numeric;
pub mod rng;
pub mod dynamics;
pub mod weights;
pub mod topology;

pub use error::FieldError;
pub use rng::ReservoirRng;
pub use dynamics::{DynamicsParams, LiquidDynamics};
pub use weights::{AdaptiveWeightMatrix, WeightMatrix};
pub use topology::RecurrentTopology;
