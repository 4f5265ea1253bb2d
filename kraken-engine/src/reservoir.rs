// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Liquid state machine
//!
//! A fixed sparse recurrent reservoir driven through the liquid dynamics
//! kernel, read out through an adaptive weight matrix. Per step:
//!
//! ```text
//! p   = dynamics(u, s)                       // perturbation, one noise draw per neuron
//! pre = W_rec · s + w_in ⊙ p
//! s   = (1 − leak) · s + leak · tanh(pre)    // clamped to ±STATE_LIMIT
//! y   = mean(tanh(W_adaptive · s)) + noise   // clamped to ±OUTPUT_LIMIT
//! ```
//!
//! All randomness comes from one [`ReservoirRng`] seeded at construction, so
//! two machines built from the same config and seed replay the same outputs.

use kraken_field::numeric::{all_finite, bounded};
use kraken_field::{AdaptiveWeightMatrix, LiquidDynamics, RecurrentTopology, ReservoirRng};
use tracing::debug;

use crate::config::ReservoirConfig;
use crate::error::Result;

/// Neuron activations never leave `[-STATE_LIMIT, STATE_LIMIT]`.
pub const STATE_LIMIT: f32 = 1.0;
/// Readout values never leave `[-OUTPUT_LIMIT, OUTPUT_LIMIT]`.
pub const OUTPUT_LIMIT: f32 = 10.0;
/// Readout noise per unit temperature.
pub const LIQUID_NOISE_SCALE: f32 = 0.01;

const READOUT_STREAM: u64 = 1;

#[derive(Debug, Clone)]
pub struct LiquidStateMachine {
    config: ReservoirConfig,
    seed: u64,
    state: Vec<f32>,
    topology: RecurrentTopology,
    input_weights: Vec<f32>,
    adaptive_weights: AdaptiveWeightMatrix,
    dynamics: LiquidDynamics,
    rng: ReservoirRng,
    steps: u64,
    perturbation: Vec<f32>,
    recurrent: Vec<f32>,
}

impl LiquidStateMachine {
    pub fn new(reservoir_size: usize, connectivity: f32, seed: Option<u64>) -> Result<Self> {
        Self::from_config(ReservoirConfig::new(reservoir_size, connectivity, seed))
    }

    pub fn from_config(config: ReservoirConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => ReservoirRng::new(seed),
            None => ReservoirRng::from_entropy(),
        };
        let seed = rng.seed();
        let n = config.reservoir_size;

        let topology =
            RecurrentTopology::build(n, config.connectivity, config.spectral_radius, &mut rng)?;
        let scale = config.input_scaling;
        let input_weights: Vec<f32> = (0..n).map(|_| rng.uniform_range(-scale, scale)).collect();
        let amp = config.initial_state_amplitude;
        let state: Vec<f32> = (0..n).map(|_| rng.uniform_range(-amp, amp)).collect();
        let adaptive_weights = AdaptiveWeightMatrix::new(n, n, rng.derive(READOUT_STREAM).seed())?;
        let dynamics = LiquidDynamics::new(config.dynamics)?;

        debug!(
            reservoir_size = n,
            connectivity = config.connectivity,
            seed,
            nnz = topology.nnz(),
            "liquid state machine initialized"
        );

        Ok(Self {
            config,
            seed,
            state,
            topology,
            input_weights,
            adaptive_weights,
            dynamics,
            rng,
            steps: 0,
            perturbation: vec![0.0; n],
            recurrent: vec![0.0; n],
        })
    }

    /// Advance the reservoir by one input and return the readout.
    pub fn process_input(&mut self, value: f32) -> f32 {
        self.dynamics.calculate_perturbation_into(
            value,
            &self.state,
            &mut self.rng,
            &mut self.perturbation,
        );
        self.topology.propagate_into(&self.state, &mut self.recurrent);

        let leak = self.config.leak_rate;
        for (((s, &r), &p), &w) in self
            .state
            .iter_mut()
            .zip(&self.recurrent)
            .zip(&self.perturbation)
            .zip(&self.input_weights)
        {
            let pre = r + w * p;
            *s = bounded((1.0 - leak) * *s + leak * pre.tanh(), STATE_LIMIT);
        }

        let mut output = self.readout();
        if self.config.noise_injection {
            output = self.inject_noise(output);
        }
        self.steps += 1;
        bounded(output, OUTPUT_LIMIT)
    }

    /// Process a sequence in order, one output per input.
    ///
    /// With `learning_enabled`, the readout weights take one Oja step on the
    /// new state after every input.
    pub fn process_sequence(&mut self, sequence: &[f32], learning_enabled: bool) -> Result<Vec<f32>> {
        let mut outputs = Vec::with_capacity(sequence.len());
        for &value in sequence {
            outputs.push(self.process_input(value));
            if learning_enabled {
                self.adaptive_weights
                    .update(&self.state, self.config.learning_rate)?;
            }
        }
        Ok(outputs)
    }

    /// Perturb a scalar with thermal noise from the reservoir's own stream.
    pub fn inject_noise(&mut self, value: f32) -> f32 {
        let amp = self.config.dynamics.temperature * LIQUID_NOISE_SCALE;
        bounded(value + amp * self.rng.normal(), OUTPUT_LIMIT)
    }

    fn readout(&self) -> f32 {
        let n = self.state.len();
        if n == 0 {
            return 0.0;
        }
        let total: f32 = self
            .adaptive_weights
            .weights()
            .as_slice()
            .chunks_exact(n)
            .map(|row| {
                row.iter()
                    .zip(&self.state)
                    .map(|(w, s)| w * s)
                    .sum::<f32>()
                    .tanh()
            })
            .sum();
        total / n as f32
    }

    pub fn state(&self) -> &[f32] {
        &self.state
    }

    pub fn topology(&self) -> &RecurrentTopology {
        &self.topology
    }

    pub fn adaptive_weights(&self) -> &AdaptiveWeightMatrix {
        &self.adaptive_weights
    }

    pub fn input_weights(&self) -> &[f32] {
        &self.input_weights
    }

    pub fn config(&self) -> &ReservoirConfig {
        &self.config
    }

    /// The seed actually used, including one drawn from entropy.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn reservoir_size(&self) -> usize {
        self.config.reservoir_size
    }

    pub fn connectivity(&self) -> f32 {
        self.config.connectivity
    }

    pub fn is_finite(&self) -> bool {
        all_finite(&self.state) && self.adaptive_weights.weights().is_finite()
    }

    pub fn memory_bytes(&self) -> usize {
        let f = std::mem::size_of::<f32>();
        self.topology.memory_bytes()
            + self.adaptive_weights.weights().memory_bytes()
            + (self.state.len()
                + self.input_weights.len()
                + self.perturbation.len()
                + self.recurrent.len())
                * f
    }
}
