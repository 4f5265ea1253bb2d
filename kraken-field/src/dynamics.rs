// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Liquid dynamics: the perturbation a scalar input force induces on the reservoir
//!
//! The reservoir is modelled as a viscous liquid: an input force pushes every
//! neuron toward the force value while each neuron's own activation pulls back
//! (a tanh restoring term). Thermal noise rides on top.
//!
//! ```text
//! p_i = pressure · damping · (f − tanh(s_i) + temperature · σ · n_i)
//! damping = 1 / (1 + viscosity)
//! n_i ~ N(0, 1)   drawn from the caller's ReservoirRng
//! ```
//!
//! - **viscosity** damps the whole response (monotone: more viscous, smaller |p|)
//! - **temperature** scales the stochastic component
//! - **pressure** scales the overall response linearly
//!
//! One normal deviate is drawn per element on every call, independent of the
//! parameter values, so changing temperature never shifts the downstream stream.
//! Output elements are clamped to `[-PERTURBATION_LIMIT, PERTURBATION_LIMIT]`.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::numeric::{bounded, finite_or_zero};
use crate::rng::ReservoirRng;

/// Input forces are saturated at this magnitude before use.
pub const FORCE_LIMIT: f32 = 100.0;
/// Bound on every perturbation element.
pub const PERTURBATION_LIMIT: f32 = 10.0;
/// Standard deviation of the thermal noise at temperature 1.0.
pub const NOISE_SCALE: f32 = 0.01;

/// Physical parameters of the liquid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsParams {
    /// Damping of the perturbation magnitude (>= 0)
    pub viscosity: f32,
    /// Thermal noise magnitude (>= 0)
    pub temperature: f32,
    /// Overall response scaling (>= 0)
    pub pressure: f32,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            viscosity: 0.1,
            temperature: 1.0,
            pressure: 1.0,
        }
    }
}

impl DynamicsParams {
    /// Multiplicative damping factor `1 / (1 + viscosity)`, in (0, 1].
    pub fn damping(&self) -> f32 {
        1.0 / (1.0 + self.viscosity)
    }

    /// Check every parameter is finite and non-negative.
    pub fn validate(&self) -> Result<(), FieldError> {
        for (name, value) in [
            ("viscosity", self.viscosity),
            ("temperature", self.temperature),
            ("pressure", self.pressure),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FieldError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Stateless perturbation kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidDynamics {
    params: DynamicsParams,
}

impl LiquidDynamics {
    pub fn new(params: DynamicsParams) -> Result<Self, FieldError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DynamicsParams {
        &self.params
    }

    /// Perturbation vector of the same length as `reservoir_state`.
    pub fn calculate_perturbation(
        &self,
        input_force: f32,
        reservoir_state: &[f32],
        rng: &mut ReservoirRng,
    ) -> Vec<f32> {
        let mut out = vec![0.0; reservoir_state.len()];
        self.calculate_perturbation_into(input_force, reservoir_state, rng, &mut out);
        out
    }

    /// Allocation-free form of [`calculate_perturbation`](Self::calculate_perturbation).
    ///
    /// `out` must have the same length as `reservoir_state`; extra elements on
    /// either side are ignored.
    pub fn calculate_perturbation_into(
        &self,
        input_force: f32,
        reservoir_state: &[f32],
        rng: &mut ReservoirRng,
        out: &mut [f32],
    ) {
        debug_assert_eq!(reservoir_state.len(), out.len());

        let force = bounded(input_force, FORCE_LIMIT);
        let gain = self.params.pressure * self.params.damping();
        let noise_amp = self.params.temperature * NOISE_SCALE;

        for (p, &s) in out.iter_mut().zip(reservoir_state.iter()) {
            let restoring = finite_or_zero(s).tanh();
            let noise = noise_amp * rng.normal();
            *p = bounded(gain * (force - restoring + noise), PERTURBATION_LIMIT);
        }
    }
}
