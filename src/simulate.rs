//! Monte Carlo simulation of fitted ETS models.
//!
//! Each path draws one Gaussian error per step with the fit's concentrated
//! residual variance, applies it additively or multiplicatively per the
//! model's error type, and pushes the realized value through the state
//! transition. Randomness comes exclusively from the caller-supplied
//! generator, so identical seeds give identical path matrices.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{EtsError, Result};
use crate::model::FittedEts;
use crate::recursion::{one_step_mean, update};
use crate::spec::ErrorComponent;

/// Where a simulation starts relative to the observed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Before the first observation (the initial state).
    Start,
    /// After the last observation (the first out-of-sample step).
    End,
    /// After `k` observed updates; `Index(0)` equals `Start` and
    /// `Index(n)` equals `End`.
    Index(usize),
}

impl Anchor {
    fn resolve(self, n: usize) -> Result<usize> {
        match self {
            Anchor::Start => Ok(0),
            Anchor::End => Ok(n),
            Anchor::Index(k) => {
                if k > n {
                    Err(EtsError::IndexOutOfBounds { index: k, size: n })
                } else {
                    Ok(k)
                }
            }
        }
    }
}

/// A (steps x repetitions) matrix of simulated observations.
#[derive(Debug, Clone)]
pub struct SimulatedPaths {
    steps: usize,
    repetitions: usize,
    /// Path-major storage: `values[rep * steps + step]`.
    values: Vec<f64>,
}

impl SimulatedPaths {
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Simulated value at `(step, rep)`.
    pub fn value(&self, step: usize, rep: usize) -> f64 {
        self.values[rep * self.steps + step]
    }

    /// One full sample path.
    pub fn path(&self, rep: usize) -> &[f64] {
        &self.values[rep * self.steps..(rep + 1) * self.steps]
    }

    /// All repetitions' values at one step (used for empirical interval
    /// percentiles).
    pub fn step_values(&self, step: usize) -> Vec<f64> {
        (0..self.repetitions)
            .map(|rep| self.value(step, rep))
            .collect()
    }
}

impl FittedEts {
    /// Generate `repetitions` independent sample paths of length `steps`,
    /// starting from `anchor`.
    ///
    /// The anchor state is recovered by re-running the recursion over the
    /// observed prefix, so in-sample anchors see exactly the states the fit
    /// saw. Simulated values can leave the model's domain on extreme draws
    /// of a multiplicative model; that surfaces as a computation error
    /// rather than NaN propagation.
    pub fn simulate<R: Rng>(
        &self,
        anchor: Anchor,
        steps: usize,
        repetitions: usize,
        rng: &mut R,
    ) -> Result<SimulatedPaths> {
        let n = self.n_obs();
        let start = anchor.resolve(n)?;
        let spec = *self.spec();
        let params = *self.params();
        let m = spec.seasonal_periods;

        // Re-run the recursion up to the anchor.
        let mut anchor_state = self.initial_state().clone();
        for (t, &y) in self.data()[..start].iter().enumerate() {
            let phase = if spec.has_seasonal() { t % m } else { 0 };
            update(&spec, &params, &mut anchor_state, phase, y).map_err(|_| {
                EtsError::ComputationError("state recursion left the model's domain".into())
            })?;
        }

        let normal = Normal::new(0.0, self.sigma2().max(0.0).sqrt())
            .map_err(|e| EtsError::ComputationError(format!("invalid residual variance: {}", e)))?;

        let mut values = Vec::with_capacity(steps * repetitions);
        for _ in 0..repetitions {
            let mut state = anchor_state.clone();
            for h in 0..steps {
                let phase = if spec.has_seasonal() {
                    (start + h) % m
                } else {
                    0
                };
                let mu = one_step_mean(&spec, &params, &state, phase);
                let eps = normal.sample(rng);
                let y = match spec.error {
                    ErrorComponent::Additive => mu + eps,
                    ErrorComponent::Multiplicative => mu * (1.0 + eps),
                };
                update(&spec, &params, &mut state, phase, y).map_err(|_| {
                    EtsError::ComputationError(
                        "simulated path left the model's domain (non-positive value in a multiplicative component)"
                            .into(),
                    )
                })?;
                values.push(y);
            }
        }

        Ok(SimulatedPaths {
            steps,
            repetitions,
            values,
        })
    }
}
