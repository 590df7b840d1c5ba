//! Adaptive block subsidy.
//!
//! The subsidy is a bounded linear function of a handful of network metrics.
//! Weights start at zero, so out of the box the policy pays its base value.
//! Nothing in the ledger trains the policy: [`IssuancePolicy::update`] is only
//! ever called by code that owns the ledger and decides to do so.

use crate::core::monetary::{BASE_SUBSIDY, MAX_SUBSIDY, MIN_SUBSIDY};
use serde::{Deserialize, Serialize};

/// Miner population used until real network telemetry exists
pub const STAND_IN_MINERS: u64 = 100;
/// Node population used until real network telemetry exists
pub const STAND_IN_NODES: u64 = 200;

pub const DEFAULT_LEARNING_RATE: f64 = 1e-4;

/// Number of features fed to the policy
pub const FEATURE_COUNT: usize = 5;

/// Inputs to the issuance policy, in weight order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub miners: u64,
    pub nodes: u64,
    pub tx_count: u64,
    pub mempool_size: u64,
    /// Average fee per transaction
    pub fee_pressure: f64,
}

impl NetworkMetrics {
    /// Aggregate counters for `tx_count` transactions paying `total_fees`,
    /// with stand-in values for the miner and node populations.
    pub fn observe(tx_count: usize, total_fees: u64, mempool_size: usize) -> NetworkMetrics {
        let tx_count = tx_count as u64;
        NetworkMetrics {
            miners: STAND_IN_MINERS,
            nodes: STAND_IN_NODES,
            tx_count,
            mempool_size: mempool_size as u64,
            fee_pressure: total_fees as f64 / tx_count.max(1) as f64,
        }
    }

    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.miners as f64,
            self.nodes as f64,
            self.tx_count as f64,
            self.mempool_size as f64,
            self.fee_pressure,
        ]
    }
}

/// Online-updated linear subsidy model with bounded output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuancePolicy {
    base: u64,
    min: u64,
    max: u64,
    weights: [f64; FEATURE_COUNT],
    learning_rate: f64,
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        Self::new(BASE_SUBSIDY, MIN_SUBSIDY, MAX_SUBSIDY)
    }
}

impl IssuancePolicy {
    pub fn new(base: u64, min: u64, max: u64) -> IssuancePolicy {
        IssuancePolicy {
            base,
            min,
            max,
            weights: [0.0; FEATURE_COUNT],
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> IssuancePolicy {
        self.learning_rate = learning_rate;
        self
    }

    /// Subsidy for the given metrics: `base + Σ wᵢ·xᵢ`, rounded half to even,
    /// then raised to `min` and capped at `max`.
    pub fn predict(&self, metrics: &NetworkMetrics) -> u64 {
        let raw = self
            .weights
            .iter()
            .zip(metrics.features())
            .fold(self.base as f64, |acc, (w, x)| acc + w * x);

        let rounded = raw.round_ties_even();
        // float-to-int casts saturate, so negatives land on 0 and huge values on u64::MAX
        let mut subsidy = if rounded.is_nan() {
            self.min
        } else {
            rounded as u64
        };
        if subsidy < self.min {
            subsidy = self.min;
        }
        if subsidy > self.max {
            subsidy = self.max;
        }
        subsidy
    }

    /// One gradient step moving the prediction for `metrics` toward `target_subsidy`.
    pub fn update(&mut self, metrics: &NetworkMetrics, target_subsidy: u64) {
        let prediction = self.predict(metrics);
        let error = target_subsidy as f64 - prediction as f64;
        for (weight, feature) in self.weights.iter_mut().zip(metrics.features()) {
            *weight += self.learning_rate * error * feature;
        }
    }

    pub fn weights(&self) -> &[f64; FEATURE_COUNT] {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: [f64; FEATURE_COUNT]) {
        self.weights = weights;
    }
}
