//! Model construction, maximum-likelihood estimation, and the fitted model.

use tracing::debug;

use crate::error::{EtsError, Result};
use crate::initialization::heuristic_initial_state;
use crate::likelihood::{
    log_likelihood, neg_log_likelihood, unpack, PHI_MAX, PHI_MIN, WEIGHT_MAX, WEIGHT_MIN,
};
use crate::optimize::{minimize, SimplexOptions};
use crate::recursion::{smooth_pass, Params, State};
use crate::spec::{InitializationMethod, ModelSpec, SeasonalComponent, TrendComponent};

/// Options for the fit operation.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Iteration budget for the optimizer.
    pub maxiter: usize,
    /// Convergence tolerance passed to the optimizer.
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            maxiter: 1000,
            tolerance: 1e-8,
        }
    }
}

impl FitOptions {
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }
}

/// An unfitted ETS model: an observation sequence plus a validated
/// specification.
///
/// Construction performs all configuration checks (fail fast); `fit` and
/// `smooth` then produce immutable [`FittedEts`] values.
#[derive(Debug, Clone)]
pub struct EtsModel {
    data: Vec<f64>,
    spec: ModelSpec,
}

impl EtsModel {
    /// Create a model from an observation sequence and a specification.
    ///
    /// Fails fast on configuration errors: inconsistent specification,
    /// non-finite observations, non-positive observations combined with a
    /// multiplicative component, or too short a series.
    pub fn new(data: Vec<f64>, spec: ModelSpec) -> Result<Self> {
        spec.validate()?;

        if data.is_empty() {
            return Err(EtsError::EmptyData);
        }
        if let Some(idx) = data.iter().position(|v| !v.is_finite()) {
            return Err(EtsError::InvalidParameter(format!(
                "series contains a non-finite value at index {}",
                idx
            )));
        }
        if spec.requires_positive_data() {
            if let Some(idx) = data.iter().position(|&v| v <= 0.0) {
                return Err(EtsError::NonPositiveData {
                    index: idx,
                    value: data[idx],
                });
            }
        }
        let needed = spec.min_observations();
        if data.len() < needed {
            return Err(EtsError::InsufficientData {
                needed,
                got: data.len(),
            });
        }

        Ok(Self { data, spec })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Estimate parameters (and, in estimated mode, initial states) by
    /// maximizing the concentrated log-likelihood.
    ///
    /// Exhausting the iteration budget returns the best-found fit flagged
    /// `converged = false` rather than an error.
    pub fn fit(&self, options: &FitOptions) -> Result<FittedEts> {
        let spec = &self.spec;
        let heuristic = heuristic_initial_state(spec, &self.data)?;

        let (seed, bounds) = self.seed_and_bounds(&heuristic);
        let simplex = SimplexOptions {
            max_iter: options.maxiter,
            tolerance: options.tolerance,
            ..Default::default()
        };

        let outcome = minimize(
            |x| neg_log_likelihood(spec, &self.data, x, &heuristic),
            &seed,
            &bounds,
            &simplex,
        );
        debug!(
            model = %spec.short_name(),
            iterations = outcome.iterations,
            converged = outcome.converged,
            nll = outcome.value,
            "ETS fit complete"
        );

        if !outcome.value.is_finite() {
            return Err(EtsError::ComputationError(
                "optimizer found no feasible parameter vector".into(),
            ));
        }

        let (params, initial_state) = unpack(spec, &outcome.point, &heuristic);
        let mut fitted = self.evaluate(params, initial_state)?;
        fitted.converged = outcome.converged;
        fitted.iterations = outcome.iterations;
        fitted.standard_errors = standard_errors(
            |x| neg_log_likelihood(spec, &self.data, x, &heuristic),
            &outcome.point,
        );
        Ok(fitted)
    }

    /// Evaluate the model at an externally supplied parameter vector
    /// `[alpha, beta?, gamma?, phi?, l0, b0?, s_1..s_m?]` without any
    /// optimization.
    ///
    /// This path is exact and deterministic: no clamping, no seasonal
    /// re-normalization, a single recursion pass.
    pub fn smooth(&self, params: &[f64]) -> Result<FittedEts> {
        let spec = &self.spec;
        let expected = spec.n_smoothing_params() + spec.n_initial_states();
        if params.len() != expected {
            return Err(EtsError::InvalidParameter(format!(
                "smooth expects {} values ([alpha, beta?, gamma?, phi?, l0, b0?, s_1..s_m?] for {}), got {}",
                expected,
                spec.short_name(),
                params.len()
            )));
        }

        let mut p = Params {
            alpha: params[0],
            beta: 0.0,
            gamma: 0.0,
            phi: 1.0,
        };
        let mut i = 1;
        if spec.has_trend() {
            p.beta = params[i];
            i += 1;
        }
        if spec.has_seasonal() {
            p.gamma = params[i];
            i += 1;
        }
        if spec.damped {
            p.phi = params[i];
            i += 1;
        }
        let level = params[i];
        i += 1;
        let trend = if spec.has_trend() {
            let b = params[i];
            i += 1;
            b
        } else {
            0.0
        };
        let seasonal = params[i..].to_vec();
        let state = State::new(level, trend, seasonal);

        self.evaluate(p, state)
    }

    /// Single recursion pass producing a fitted model.
    fn evaluate(&self, params: Params, initial_state: State) -> Result<FittedEts> {
        let spec = self.spec;
        let out = smooth_pass(&spec, &params, &initial_state, &self.data).map_err(|_| {
            EtsError::ComputationError(
                "state recursion left the model's domain (non-positive value in a multiplicative component)"
                    .into(),
            )
        })?;

        let n = self.data.len() as f64;
        let sigma2 = out.residuals.iter().map(|r| r * r).sum::<f64>() / n;
        let loglik = log_likelihood(&spec, &self.data, &out.residuals);
        let k = spec.n_params() as f64;
        let aic = -2.0 * loglik + 2.0 * k;
        let aicc = if n - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (n - k - 1.0)
        } else {
            f64::INFINITY
        };
        let bic = -2.0 * loglik + k * n.ln();

        Ok(FittedEts {
            spec,
            data: self.data.clone(),
            params,
            initial_state,
            final_state: out.final_state,
            fitted: out.fitted,
            residuals: out.residuals,
            sigma2,
            loglik,
            aic,
            aicc,
            bic,
            standard_errors: None,
            converged: true,
            iterations: 0,
        })
    }

    /// Seed vector and bounds for the optimizer, laid out like the free
    /// parameter vector.
    fn seed_and_bounds(&self, heuristic: &State) -> (Vec<f64>, Vec<(f64, f64)>) {
        let spec = &self.spec;
        let mut seed = vec![0.3];
        let mut bounds = vec![(WEIGHT_MIN, WEIGHT_MAX)];
        if spec.has_trend() {
            seed.push(0.1);
            bounds.push((WEIGHT_MIN, WEIGHT_MAX));
        }
        if spec.has_seasonal() {
            seed.push(0.1);
            bounds.push((WEIGHT_MIN, WEIGHT_MAX));
        }
        if spec.damped {
            seed.push(0.95);
            bounds.push((PHI_MIN, PHI_MAX));
        }

        if spec.initialization == InitializationMethod::Estimated {
            let free = (f64::NEG_INFINITY, f64::INFINITY);
            let positive = (1e-8, f64::INFINITY);

            seed.push(heuristic.level);
            bounds.push(if spec.requires_positive_data() {
                positive
            } else {
                free
            });
            if spec.has_trend() {
                seed.push(heuristic.trend);
                bounds.push(if spec.trend == TrendComponent::Multiplicative {
                    positive
                } else {
                    free
                });
            }
            for &s in &heuristic.seasonal {
                seed.push(s);
                bounds.push(if spec.seasonal == SeasonalComponent::Multiplicative {
                    positive
                } else {
                    free
                });
            }
        }

        (seed, bounds)
    }
}

/// A fitted ETS model: immutable after creation.
///
/// Owns the parameter vector, initial and final states, the fitted-value and
/// residual sequences, the log-likelihood, and the estimation status.
/// Forecasting and simulation borrow from it read-only.
#[derive(Debug, Clone)]
pub struct FittedEts {
    pub(crate) spec: ModelSpec,
    pub(crate) data: Vec<f64>,
    pub(crate) params: Params,
    pub(crate) initial_state: State,
    pub(crate) final_state: State,
    pub(crate) fitted: Vec<f64>,
    pub(crate) residuals: Vec<f64>,
    pub(crate) sigma2: f64,
    pub(crate) loglik: f64,
    pub(crate) aic: f64,
    pub(crate) aicc: f64,
    pub(crate) bic: f64,
    pub(crate) standard_errors: Option<Vec<f64>>,
    pub(crate) converged: bool,
    pub(crate) iterations: usize,
}

impl FittedEts {
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Observed series the model was fitted to.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn n_obs(&self) -> usize {
        self.data.len()
    }

    /// Smoothing parameters (neutral values for absent components).
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn alpha(&self) -> f64 {
        self.params.alpha
    }

    /// Trend smoothing parameter, if the model has a trend.
    pub fn beta(&self) -> Option<f64> {
        self.spec.has_trend().then_some(self.params.beta)
    }

    /// Seasonal smoothing parameter, if the model has a seasonal component.
    pub fn gamma(&self) -> Option<f64> {
        self.spec.has_seasonal().then_some(self.params.gamma)
    }

    /// Damping parameter, if the trend is damped.
    pub fn phi(&self) -> Option<f64> {
        self.spec.damped.then_some(self.params.phi)
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    /// State after the final in-sample update.
    pub fn final_state(&self) -> &State {
        &self.final_state
    }

    /// In-sample one-step-ahead expectations.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Model residuals (absolute for additive error, relative for
    /// multiplicative error).
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Concentrated residual variance.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.loglik
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn aicc(&self) -> f64 {
        self.aicc
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Standard errors of the free parameter vector, from the curvature of
    /// the negative log-likelihood at the optimum. `None` when the curvature
    /// is singular or ill-conditioned, or for `smooth`-constructed fits.
    pub fn standard_errors(&self) -> Option<&[f64]> {
        self.standard_errors.as_deref()
    }

    /// Whether the optimizer's stopping criterion was met within its budget.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Optimizer iterations used (0 for `smooth`-constructed fits).
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Standard errors from a central-difference Hessian of `f` at `x`.
///
/// Returns `None` if any evaluation is non-finite (optimum at the feasible
/// boundary), the Hessian cannot be inverted, or a diagonal of the inverse
/// is not a positive finite number.
fn standard_errors<F: Fn(&[f64]) -> f64>(f: F, x: &[f64]) -> Option<Vec<f64>> {
    let n = x.len();
    if n == 0 {
        return None;
    }
    let f0 = f(x);
    if !f0.is_finite() {
        return None;
    }

    let steps: Vec<f64> = x.iter().map(|xi| 1e-4 * xi.abs().max(1.0)).collect();
    let shifted = |signs: &[(usize, f64)]| -> f64 {
        let mut p = x.to_vec();
        for &(i, sign) in signs {
            p[i] += sign * steps[i];
        }
        f(&p)
    };

    let mut hessian = vec![vec![0.0; n]; n];
    for i in 0..n {
        let fp = shifted(&[(i, 1.0)]);
        let fm = shifted(&[(i, -1.0)]);
        if !fp.is_finite() || !fm.is_finite() {
            return None;
        }
        hessian[i][i] = (fp - 2.0 * f0 + fm) / (steps[i] * steps[i]);
        for j in (i + 1)..n {
            let fpp = shifted(&[(i, 1.0), (j, 1.0)]);
            let fpm = shifted(&[(i, 1.0), (j, -1.0)]);
            let fmp = shifted(&[(i, -1.0), (j, 1.0)]);
            let fmm = shifted(&[(i, -1.0), (j, -1.0)]);
            if ![fpp, fpm, fmp, fmm].iter().all(|v| v.is_finite()) {
                return None;
            }
            let hij = (fpp - fpm - fmp + fmm) / (4.0 * steps[i] * steps[j]);
            hessian[i][j] = hij;
            hessian[j][i] = hij;
        }
    }

    let cov = crate::stats::invert_matrix(&hessian)?;
    let mut se = Vec::with_capacity(n);
    for (i, row) in cov.iter().enumerate() {
        let v = row[i];
        if !v.is_finite() || v <= 0.0 {
            return None;
        }
        se.push(v.sqrt());
    }
    Some(se)
}
