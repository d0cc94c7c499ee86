//! Heuristic initial states via classical decomposition of the start of the
//! series.
//!
//! Seasonal indices come from subseries averages of the first few complete
//! cycles relative to a centered moving average; level and trend come from an
//! OLS line over the first (deseasonalized) points. The result either seeds
//! the joint optimization or is held fixed, depending on the initialization
//! method.

use crate::error::{EtsError, Result};
use crate::recursion::State;
use crate::spec::{ModelSpec, SeasonalComponent, TrendComponent};

/// Number of leading points used for the level/trend line.
const TREND_POINTS: usize = 10;
/// Maximum number of complete seasonal cycles used for the seasonal indices.
const SEASONAL_CYCLES: usize = 4;

/// Compute heuristic initial states for `spec` on `data`.
///
/// Expects `data` to have passed the model's length and positivity
/// validation.
pub fn heuristic_initial_state(spec: &ModelSpec, data: &[f64]) -> Result<State> {
    let seasonal = if spec.has_seasonal() {
        seasonal_indices(spec, data)?
    } else {
        Vec::new()
    };

    // Deseasonalize the prefix used for the trend line.
    let k = TREND_POINTS.min(data.len());
    let prefix: Vec<f64> = data
        .iter()
        .take(k)
        .enumerate()
        .map(|(t, &y)| match spec.seasonal {
            SeasonalComponent::None => y,
            SeasonalComponent::Additive => y - seasonal[t % spec.seasonal_periods],
            SeasonalComponent::Multiplicative => y / seasonal[t % spec.seasonal_periods],
        })
        .collect();

    // `intercept` is the line's value at the first observation; the initial
    // state sits one step earlier so that l0 (+) b0 predicts that first
    // observation.
    let (intercept, slope) = ols_line(&prefix)?;
    let (level, trend) = match spec.trend {
        TrendComponent::None => (intercept, 0.0),
        TrendComponent::Additive => (intercept - slope, slope),
        TrendComponent::Multiplicative => {
            let growth = 1.0 + slope / intercept;
            if growth.is_finite() && growth > 0.0 {
                (intercept / growth, growth)
            } else {
                (intercept, 1.0)
            }
        }
    };

    Ok(State::new(level, trend, seasonal))
}

/// Seasonal indices from subseries averages of the detrended prefix,
/// normalized to sum 0 (additive) or mean 1 (multiplicative).
fn seasonal_indices(spec: &ModelSpec, data: &[f64]) -> Result<Vec<f64>> {
    let m = spec.seasonal_periods;
    let n_use = (SEASONAL_CYCLES * m).min(data.len());
    let ma = centered_moving_average(&data[..n_use], m);

    let mut sums = vec![0.0; m];
    let mut counts = vec![0usize; m];
    for (t, ma_t) in ma.iter().enumerate() {
        let Some(ma_t) = ma_t else { continue };
        let detrended = match spec.seasonal {
            SeasonalComponent::Additive => data[t] - ma_t,
            SeasonalComponent::Multiplicative => {
                if *ma_t <= 0.0 {
                    continue;
                }
                data[t] / ma_t
            }
            SeasonalComponent::None => unreachable!("seasonal_indices requires a seasonal spec"),
        };
        sums[t % m] += detrended;
        counts[t % m] += 1;
    }

    let neutral = match spec.seasonal {
        SeasonalComponent::Additive => 0.0,
        _ => 1.0,
    };
    let mut indices: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { neutral })
        .collect();

    // Identifiability normalization.
    let mean = indices.iter().sum::<f64>() / m as f64;
    match spec.seasonal {
        SeasonalComponent::Additive => {
            for s in indices.iter_mut() {
                *s -= mean;
            }
        }
        SeasonalComponent::Multiplicative => {
            if mean <= 0.0 {
                return Err(EtsError::ComputationError(
                    "heuristic seasonal indices are not positive".into(),
                ));
            }
            for s in indices.iter_mut() {
                *s /= mean;
            }
        }
        SeasonalComponent::None => {}
    }

    Ok(indices)
}

/// Centered moving average of window `m`, using the standard 2xMA for even
/// `m`. Positions without a full window are `None`.
fn centered_moving_average(data: &[f64], m: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let mut out = vec![None; n];
    if m == 0 || n < m + 1 {
        return out;
    }

    if m % 2 == 1 {
        let h = m / 2;
        for t in h..n - h {
            let sum: f64 = data[t - h..=t + h].iter().sum();
            out[t] = Some(sum / m as f64);
        }
    } else {
        let h = m / 2;
        for t in h..n.saturating_sub(h) {
            let mut sum = 0.5 * data[t - h] + 0.5 * data[t + h];
            sum += data[t - h + 1..t + h].iter().sum::<f64>();
            out[t] = Some(sum / m as f64);
        }
    }
    out
}

/// Simple-regression line y = intercept + slope * t over t = 0..k.
fn ols_line(values: &[f64]) -> Result<(f64, f64)> {
    let k = values.len();
    if k < 2 {
        return Err(EtsError::InsufficientData { needed: 2, got: k });
    }
    let x_mean = (k - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / k as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (t, &y) in values.iter().enumerate() {
        let dx = t as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    Ok((intercept, slope))
}
