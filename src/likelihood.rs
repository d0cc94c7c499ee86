//! Likelihood evaluation and the parameter-vector layout used by the
//! optimizer.
//!
//! The Gaussian likelihood is concentrated over the residual variance, so
//! the optimizer never sees sigma^2 as a free parameter. Infeasible
//! candidates (outside the admissible region, or hitting a domain violation
//! in the recursion) return an infinite penalty instead of an error, which
//! lets the search steer away from them.

use std::f64::consts::PI;

use crate::recursion::{smooth_pass, Params, State};
use crate::spec::{ErrorComponent, InitializationMethod, ModelSpec, SeasonalComponent, TrendComponent};

/// Open-interval margin for the smoothing weights.
pub const WEIGHT_MIN: f64 = 1e-4;
pub const WEIGHT_MAX: f64 = 1.0 - 1e-4;
/// Damping bounds; phi close to 1 is numerically indistinguishable from an
/// undamped trend, phi below 0.8 rarely fits real data.
pub const PHI_MIN: f64 = 0.8;
pub const PHI_MAX: f64 = 0.98;

/// Unpack a free-parameter vector `[alpha, beta?, gamma?, phi?, states...?]`
/// into smoothing parameters and an initial state.
///
/// In heuristic mode the state part is absent and `fixed_state` is used
/// instead. In estimated mode the seasonal states are re-normalized on every
/// unpack (sum 0 / mean 1) to keep the seasonal component identifiable.
/// Assumes `x.len() == spec.n_free_params()`.
pub fn unpack(spec: &ModelSpec, x: &[f64], fixed_state: &State) -> (Params, State) {
    let mut params = Params {
        alpha: x[0],
        beta: 0.0,
        gamma: 0.0,
        phi: 1.0,
    };
    let mut i = 1;
    if spec.has_trend() {
        params.beta = x[i];
        i += 1;
    }
    if spec.has_seasonal() {
        params.gamma = x[i];
        i += 1;
    }
    if spec.damped {
        params.phi = x[i];
        i += 1;
    }

    let state = match spec.initialization {
        InitializationMethod::Heuristic => fixed_state.clone(),
        InitializationMethod::Estimated => {
            let level = x[i];
            i += 1;
            let trend = if spec.has_trend() {
                let b = x[i];
                i += 1;
                b
            } else {
                0.0
            };
            let mut seasonal: Vec<f64> = x[i..].to_vec();
            if !seasonal.is_empty() {
                let mean = seasonal.iter().sum::<f64>() / seasonal.len() as f64;
                match spec.seasonal {
                    SeasonalComponent::Additive => {
                        for s in seasonal.iter_mut() {
                            *s -= mean;
                        }
                    }
                    SeasonalComponent::Multiplicative => {
                        if mean > 0.0 {
                            for s in seasonal.iter_mut() {
                                *s /= mean;
                            }
                        }
                    }
                    SeasonalComponent::None => {}
                }
            }
            State::new(level, trend, seasonal)
        }
    };

    (params, state)
}

/// Whether a candidate lies in the admissible (usual) region.
///
/// The usual region 0 < beta < alpha, 0 < gamma < 1 - alpha is a sufficient
/// condition for a stable (non-divergent) state recursion across the ETS
/// family.
pub fn admissible(spec: &ModelSpec, params: &Params, state: &State) -> bool {
    if !(WEIGHT_MIN..=WEIGHT_MAX).contains(&params.alpha) {
        return false;
    }
    if spec.has_trend() && !(WEIGHT_MIN..=params.alpha).contains(&params.beta) {
        return false;
    }
    if spec.has_seasonal() && !(WEIGHT_MIN..=(1.0 - params.alpha)).contains(&params.gamma) {
        return false;
    }
    if spec.damped && !(PHI_MIN..=PHI_MAX).contains(&params.phi) {
        return false;
    }

    // State-space positivity for multiplicative components.
    if spec.trend == TrendComponent::Multiplicative && state.trend <= 0.0 {
        return false;
    }
    if spec.seasonal == SeasonalComponent::Multiplicative
        && state.seasonal.iter().any(|&s| s <= 0.0)
    {
        return false;
    }
    if spec.requires_positive_data() && state.level <= 0.0 {
        return false;
    }

    true
}

/// Concentrated Gaussian log-likelihood from the residual sequence.
///
/// Additive errors: -n/2 (ln(2 pi sigma^2) + 1) with sigma^2 = mean squared
/// residual. Multiplicative errors additionally subtract the Jacobian term
/// sum(ln|y_t|) since the error is defined relative to the mean.
pub fn log_likelihood(spec: &ModelSpec, data: &[f64], residuals: &[f64]) -> f64 {
    let n = residuals.len() as f64;
    if n == 0.0 {
        return f64::NEG_INFINITY;
    }
    let sigma2 = residuals.iter().map(|r| r * r).sum::<f64>() / n;
    if !(sigma2 > 0.0) || !sigma2.is_finite() {
        return f64::NEG_INFINITY;
    }

    let mut ll = -0.5 * n * ((2.0 * PI * sigma2).ln() + 1.0);
    if spec.error == ErrorComponent::Multiplicative {
        ll -= data.iter().map(|y| y.abs().ln()).sum::<f64>();
    }
    ll
}

/// Negative log-likelihood of a free-parameter vector, as minimized by the
/// optimizer. Infeasible candidates yield `f64::INFINITY`.
pub fn neg_log_likelihood(spec: &ModelSpec, data: &[f64], x: &[f64], fixed_state: &State) -> f64 {
    let (params, state) = unpack(spec, x, fixed_state);
    if !admissible(spec, &params, &state) {
        return f64::INFINITY;
    }
    match smooth_pass(spec, &params, &state, data) {
        Ok(out) => {
            let ll = log_likelihood(spec, data, &out.residuals);
            if ll.is_finite() {
                -ll
            } else {
                f64::INFINITY
            }
        }
        Err(_) => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::InitializationMethod;
    use approx::assert_relative_eq;

    fn flat_state() -> State {
        State::new(10.0, 0.0, vec![])
    }

    #[test]
    fn unpack_heuristic_uses_fixed_state() {
        let spec = ModelSpec::aadn().with_initialization(InitializationMethod::Heuristic);
        let fixed = State::new(5.0, 1.0, vec![]);
        let (params, state) = unpack(&spec, &[0.3, 0.1, 0.9], &fixed);
        assert_relative_eq!(params.alpha, 0.3);
        assert_relative_eq!(params.beta, 0.1);
        assert_relative_eq!(params.phi, 0.9);
        assert_eq!(state, fixed);
    }

    #[test]
    fn unpack_estimated_reads_states_from_vector() {
        let spec = ModelSpec::aan();
        let fixed = flat_state();
        let (params, state) = unpack(&spec, &[0.4, 0.2, 7.0, 0.5], &fixed);
        assert_relative_eq!(params.alpha, 0.4);
        assert_relative_eq!(params.beta, 0.2);
        assert_relative_eq!(state.level, 7.0);
        assert_relative_eq!(state.trend, 0.5);
    }

    #[test]
    fn unpack_normalizes_additive_seasonal_states() {
        let spec = ModelSpec::aaa(3);
        let fixed = State::new(0.0, 0.0, vec![0.0; 3]);
        // seasonal part [2, 3, 4] has mean 3; normalized to [-1, 0, 1]
        let x = [0.3, 0.1, 0.1, 10.0, 0.5, 2.0, 3.0, 4.0];
        let (_, state) = unpack(&spec, &x, &fixed);
        assert_relative_eq!(state.seasonal[0], -1.0);
        assert_relative_eq!(state.seasonal[1], 0.0);
        assert_relative_eq!(state.seasonal[2], 1.0);
    }

    #[test]
    fn admissible_region_bounds() {
        let spec = ModelSpec::aan();
        let state = State::new(10.0, 1.0, vec![]);
        let ok = Params {
            alpha: 0.5,
            beta: 0.1,
            gamma: 0.0,
            phi: 1.0,
        };
        assert!(admissible(&spec, &ok, &state));

        // beta above alpha violates the usual region
        let bad = Params {
            alpha: 0.2,
            beta: 0.5,
            gamma: 0.0,
            phi: 1.0,
        };
        assert!(!admissible(&spec, &bad, &state));

        let out_of_range = Params {
            alpha: 1.5,
            beta: 0.1,
            gamma: 0.0,
            phi: 1.0,
        };
        assert!(!admissible(&spec, &out_of_range, &state));
    }

    #[test]
    fn infeasible_candidates_get_infinite_penalty() {
        let spec = ModelSpec::ann();
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let nll = neg_log_likelihood(&spec, &data, &[1.5, 2.0], &flat_state());
        assert_eq!(nll, f64::INFINITY);
    }

    #[test]
    fn feasible_candidates_are_finite() {
        let spec = ModelSpec::ann();
        let data = vec![10.0, 12.0, 11.0, 13.0, 12.5, 14.0];
        let nll = neg_log_likelihood(&spec, &data, &[0.3, 10.0], &flat_state());
        assert!(nll.is_finite());
    }

    #[test]
    fn multiplicative_error_includes_jacobian() {
        let data = vec![10.0, 12.0, 11.0, 13.0];
        let residuals = vec![0.1, -0.05, 0.08, -0.02];
        let add = log_likelihood(&ModelSpec::ann(), &data, &residuals);
        let mul = log_likelihood(&ModelSpec::mnn(), &data, &residuals);
        let jacobian: f64 = data.iter().map(|y| y.abs().ln()).sum();
        assert_relative_eq!(add - mul, jacobian, epsilon = 1e-10);
    }

    #[test]
    fn better_fit_has_higher_likelihood() {
        let spec = ModelSpec::ann();
        let data = vec![10.0, 10.0, 10.0, 10.0];
        let tight = log_likelihood(&spec, &data, &[0.1, -0.1, 0.1, -0.1]);
        let loose = log_likelihood(&spec, &data, &[1.0, -1.0, 1.0, -1.0]);
        assert!(tight > loose);
    }
}
