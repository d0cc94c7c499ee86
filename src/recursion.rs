//! State recursion engine: one-step transition and observation equations for
//! the full ETS family.
//!
//! The equations follow the innovations state-space form. One explicit match
//! arm exists per (error, trend, seasonal) combination, so every one of the
//! 30 model variants (damping enters through phi) is enumerable without
//! additive/multiplicative fallthrough.

use crate::spec::{ErrorComponent, ModelSpec, SeasonalComponent, TrendComponent};

/// Smoothing parameters. Unused components are carried at neutral values
/// (beta/gamma 0.0, phi 1.0) so the same struct serves every specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub phi: f64,
}

impl Params {
    /// Parameters with only a level-smoothing weight.
    pub fn level_only(alpha: f64) -> Self {
        Self {
            alpha,
            beta: 0.0,
            gamma: 0.0,
            phi: 1.0,
        }
    }
}

/// State vector: level, trend, and a rotating seasonal buffer of length m.
///
/// `seasonal[t % m]` holds s_{t-m} before the update at time t and s_t after
/// it. The trend slot is unused (0.0) for trendless models; the seasonal
/// buffer is empty for non-seasonal models.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub level: f64,
    pub trend: f64,
    pub seasonal: Vec<f64>,
}

impl State {
    pub fn new(level: f64, trend: f64, seasonal: Vec<f64>) -> Self {
        Self {
            level,
            trend,
            seasonal,
        }
    }
}

/// A multiplicative branch required a strictly positive quantity that was
/// not positive (or an update produced a non-finite state).
///
/// This is deliberately a zero-sized rejection signal: during optimization
/// the likelihood turns it into an infinite penalty rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainViolation;

/// Output of a single transition: the one-step mean and the model residual
/// (absolute error for additive-error models, relative for multiplicative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub mean: f64,
    pub residual: f64,
}

/// Output of a full smoothing pass over an observation sequence.
#[derive(Debug, Clone)]
pub struct SmoothOutput {
    /// One-step-ahead expectations, one per observation.
    pub fitted: Vec<f64>,
    /// Model residuals, one per observation.
    pub residuals: Vec<f64>,
    /// State after the final update.
    pub final_state: State,
}

/// Trend-damped combination of level and trend: l, l + phi*b, or l * b^phi.
fn trend_op(spec: &ModelSpec, params: &Params, state: &State) -> f64 {
    match spec.trend {
        TrendComponent::None => state.level,
        TrendComponent::Additive => state.level + params.phi * state.trend,
        TrendComponent::Multiplicative => state.level * state.trend.powf(params.phi),
    }
}

/// Deterministic one-step forecast mean mu_t from the state at t-1.
///
/// `phase` selects the seasonal slot, i.e. `t % m` for the step producing
/// y_t; it is ignored for non-seasonal models.
pub fn one_step_mean(spec: &ModelSpec, params: &Params, state: &State, phase: usize) -> f64 {
    let b = trend_op(spec, params, state);
    match spec.seasonal {
        SeasonalComponent::None => b,
        SeasonalComponent::Additive => b + state.seasonal[phase],
        SeasonalComponent::Multiplicative => b * state.seasonal[phase],
    }
}

/// Advance the state by one step given the realized observation `y`.
///
/// Returns the one-step mean and residual for this step. Fails with
/// [`DomainViolation`] whenever a multiplicative branch would divide by (or
/// take a power of) a non-positive quantity, instead of producing NaN/Inf.
pub fn update(
    spec: &ModelSpec,
    params: &Params,
    state: &mut State,
    phase: usize,
    y: f64,
) -> Result<Step, DomainViolation> {
    let l = state.level;
    let b = state.trend;
    let alpha = params.alpha;
    let beta = params.beta;
    let gamma = params.gamma;
    let phi = params.phi;

    if spec.trend == TrendComponent::Multiplicative && (l <= 0.0 || b <= 0.0) {
        return Err(DomainViolation);
    }
    let s_old = if spec.has_seasonal() {
        state.seasonal[phase]
    } else {
        0.0
    };
    if spec.seasonal == SeasonalComponent::Multiplicative && s_old <= 0.0 {
        return Err(DomainViolation);
    }

    // tb: trend-damped combination; mu: one-step mean.
    let tb = trend_op(spec, params, state);
    if spec.seasonal == SeasonalComponent::Multiplicative && tb <= 0.0 {
        return Err(DomainViolation);
    }
    let mu = one_step_mean(spec, params, state, phase);

    let residual = match spec.error {
        ErrorComponent::Additive => y - mu,
        ErrorComponent::Multiplicative => {
            if mu <= 0.0 {
                return Err(DomainViolation);
            }
            (y - mu) / mu
        }
    };
    // e: the absolute innovation y - mu; the multiplicative-error equations
    // below are the additive ones with e = mu * residual, which is the same
    // quantity, so both error types share it.
    let e = y - mu;

    let (new_level, new_trend, new_seasonal) = match (spec.error, spec.trend, spec.seasonal) {
        // --- Additive error ---
        (ErrorComponent::Additive, TrendComponent::None, SeasonalComponent::None) => {
            (l + alpha * e, b, 0.0)
        }
        (ErrorComponent::Additive, TrendComponent::None, SeasonalComponent::Additive) => {
            (l + alpha * e, b, s_old + gamma * e)
        }
        (ErrorComponent::Additive, TrendComponent::None, SeasonalComponent::Multiplicative) => {
            if l <= 0.0 {
                return Err(DomainViolation);
            }
            (l + alpha * e / s_old, b, s_old + gamma * e / l)
        }
        (ErrorComponent::Additive, TrendComponent::Additive, SeasonalComponent::None) => {
            (tb + alpha * e, phi * b + beta * e, 0.0)
        }
        (ErrorComponent::Additive, TrendComponent::Additive, SeasonalComponent::Additive) => {
            (tb + alpha * e, phi * b + beta * e, s_old + gamma * e)
        }
        (ErrorComponent::Additive, TrendComponent::Additive, SeasonalComponent::Multiplicative) => (
            tb + alpha * e / s_old,
            phi * b + beta * e / s_old,
            s_old + gamma * e / tb,
        ),
        (ErrorComponent::Additive, TrendComponent::Multiplicative, SeasonalComponent::None) => {
            (tb + alpha * e, b.powf(phi) + beta * e / l, 0.0)
        }
        (ErrorComponent::Additive, TrendComponent::Multiplicative, SeasonalComponent::Additive) => {
            (tb + alpha * e, b.powf(phi) + beta * e / l, s_old + gamma * e)
        }
        (
            ErrorComponent::Additive,
            TrendComponent::Multiplicative,
            SeasonalComponent::Multiplicative,
        ) => (
            tb + alpha * e / s_old,
            b.powf(phi) + beta * e / (s_old * l),
            s_old + gamma * e / tb,
        ),

        // --- Multiplicative error (innovations form with eps = residual) ---
        (ErrorComponent::Multiplicative, TrendComponent::None, SeasonalComponent::None) => {
            (l * (1.0 + alpha * residual), b, 0.0)
        }
        (ErrorComponent::Multiplicative, TrendComponent::None, SeasonalComponent::Additive) => (
            l + alpha * mu * residual,
            b,
            s_old + gamma * mu * residual,
        ),
        (
            ErrorComponent::Multiplicative,
            TrendComponent::None,
            SeasonalComponent::Multiplicative,
        ) => (
            l * (1.0 + alpha * residual),
            b,
            s_old * (1.0 + gamma * residual),
        ),
        (ErrorComponent::Multiplicative, TrendComponent::Additive, SeasonalComponent::None) => (
            tb * (1.0 + alpha * residual),
            phi * b + beta * tb * residual,
            0.0,
        ),
        (ErrorComponent::Multiplicative, TrendComponent::Additive, SeasonalComponent::Additive) => (
            tb + alpha * mu * residual,
            phi * b + beta * mu * residual,
            s_old + gamma * mu * residual,
        ),
        (
            ErrorComponent::Multiplicative,
            TrendComponent::Additive,
            SeasonalComponent::Multiplicative,
        ) => (
            tb * (1.0 + alpha * residual),
            phi * b + beta * tb * residual,
            s_old * (1.0 + gamma * residual),
        ),
        (
            ErrorComponent::Multiplicative,
            TrendComponent::Multiplicative,
            SeasonalComponent::None,
        ) => (
            tb * (1.0 + alpha * residual),
            b.powf(phi) * (1.0 + beta * residual),
            0.0,
        ),
        (
            ErrorComponent::Multiplicative,
            TrendComponent::Multiplicative,
            SeasonalComponent::Additive,
        ) => (
            tb + alpha * mu * residual,
            b.powf(phi) + beta * mu * residual / l,
            s_old + gamma * mu * residual,
        ),
        (
            ErrorComponent::Multiplicative,
            TrendComponent::Multiplicative,
            SeasonalComponent::Multiplicative,
        ) => (
            tb * (1.0 + alpha * residual),
            b.powf(phi) * (1.0 + beta * residual),
            s_old * (1.0 + gamma * residual),
        ),
    };

    if !new_level.is_finite() || !new_trend.is_finite() || !new_seasonal.is_finite() {
        return Err(DomainViolation);
    }

    state.level = new_level;
    state.trend = new_trend;
    if spec.has_seasonal() {
        state.seasonal[phase] = new_seasonal;
    }

    Ok(Step { mean: mu, residual })
}

/// Run the recursion over a full observation sequence from a given initial
/// state, producing fitted values and residuals.
///
/// Pure function of its inputs; the same inputs yield bit-identical output.
pub fn smooth_pass(
    spec: &ModelSpec,
    params: &Params,
    initial: &State,
    data: &[f64],
) -> Result<SmoothOutput, DomainViolation> {
    let m = spec.seasonal_periods;
    let mut state = initial.clone();
    let mut fitted = Vec::with_capacity(data.len());
    let mut residuals = Vec::with_capacity(data.len());

    for (t, &y) in data.iter().enumerate() {
        let phase = if spec.has_seasonal() { t % m } else { 0 };
        let step = update(spec, params, &mut state, phase, y)?;
        fitted.push(step.mean);
        residuals.push(step.residual);
    }

    Ok(SmoothOutput {
        fitted,
        residuals,
        final_state: state,
    })
}

/// Deterministic mean path: recurse `steps` ahead of position `start_t`
/// with all future errors set to zero.
///
/// Feeding y = mu back into [`update`] makes every residual exactly zero,
/// which reduces the transition to its deterministic part for all 30
/// variants (including the damped multiplicative b^(phi + phi^2 + ...)
/// trend path).
pub fn mean_path(
    spec: &ModelSpec,
    params: &Params,
    state: &State,
    start_t: usize,
    steps: usize,
) -> Result<Vec<f64>, DomainViolation> {
    let m = spec.seasonal_periods;
    let mut state = state.clone();
    let mut path = Vec::with_capacity(steps);

    for h in 0..steps {
        let phase = if spec.has_seasonal() {
            (start_t + h) % m
        } else {
            0
        };
        let mu = one_step_mean(spec, params, &state, phase);
        update(spec, params, &mut state, phase, mu)?;
        path.push(mu);
    }

    Ok(path)
}
