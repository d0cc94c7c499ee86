//! Out-of-sample forecasting, in-sample prediction, and prediction
//! intervals.
//!
//! Point forecasts recurse the state forward with zero future errors. For
//! the class of additive-error models whose forecast-error variance has a
//! closed form, intervals are analytic; every other variant falls back to
//! empirical percentiles of simulated sample paths.

use rand::Rng;

use crate::error::{EtsError, Result};
use crate::model::FittedEts;
use crate::recursion::mean_path;
use crate::simulate::Anchor;
use crate::spec::{ErrorComponent, ModelSpec, SeasonalComponent, TrendComponent};
use crate::stats::quantile_normal;

/// Configuration for interval-bearing predictions.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    /// Two-sided miss probability; 0.05 gives a 95% interval.
    pub alpha: f64,
    /// Repetitions used when intervals require simulation.
    pub repetitions: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            repetitions: 1000,
        }
    }
}

/// A prediction over a contiguous range of positions, in- and/or
/// out-of-sample.
#[derive(Debug, Clone)]
pub struct Prediction {
    start: usize,
    mean: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    observed: Vec<Option<f64>>,
}

impl Prediction {
    /// First position covered by this prediction.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Point expectations per position.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Observed values where the range overlaps the sample.
    pub fn observed(&self) -> &[Option<f64>] {
        &self.observed
    }
}

impl FittedEts {
    /// Point forecasts for `steps` periods past the end of the sample.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>> {
        let n = self.n_obs();
        mean_path(&self.spec, &self.params, &self.final_state, n, steps).map_err(|_| {
            EtsError::ComputationError("forecast recursion left the model's domain".into())
        })
    }

    /// Point predictions for positions `start..=end` (in-sample positions
    /// reuse stored fitted values, later positions are forecasts).
    pub fn predict(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        if start > end {
            return Err(EtsError::InvalidParameter(format!(
                "prediction start {} is after end {}",
                start, end
            )));
        }
        let n = self.n_obs();
        let mut out = Vec::with_capacity(end - start + 1);
        if start < n {
            for t in start..=end.min(n - 1) {
                out.push(self.fitted_values()[t]);
            }
        }
        if end >= n {
            let fc = self.forecast(end - n + 1)?;
            out.extend(fc.into_iter().skip(start.saturating_sub(n)));
        }
        Ok(out)
    }

    /// Predictions with interval bounds for positions `start..=end`.
    ///
    /// The RNG is only consulted when the model has no analytic variance
    /// formula and intervals must be simulated.
    pub fn get_prediction<R: Rng>(
        &self,
        start: usize,
        end: usize,
        config: &PredictionConfig,
        rng: &mut R,
    ) -> Result<Prediction> {
        if !(config.alpha > 0.0 && config.alpha < 1.0) {
            return Err(EtsError::InvalidParameter(format!(
                "interval alpha must lie in (0, 1), got {}",
                config.alpha
            )));
        }
        let mean = self.predict(start, end)?;
        let n = self.n_obs();
        let z = quantile_normal(1.0 - config.alpha / 2.0);
        let sigma = self.sigma2().sqrt();

        let out_steps = if end >= n { end - n + 1 } else { 0 };
        let out_variances = if out_steps > 0 {
            Some(self.horizon_variances(out_steps, config.repetitions, rng)?)
        } else {
            None
        };

        let mut lower = Vec::with_capacity(mean.len());
        let mut upper = Vec::with_capacity(mean.len());
        let mut observed = Vec::with_capacity(mean.len());

        for (offset, &mu) in mean.iter().enumerate() {
            let t = start + offset;
            if t < n {
                // One-step in-sample error.
                let half = z * self.scale_error(mu, sigma);
                lower.push(mu - half);
                upper.push(mu + half);
                observed.push(Some(self.data()[t]));
            } else {
                let h = t - n; // 0-based horizon offset
                let Some(spread) = out_variances.as_ref() else {
                    return Err(EtsError::ComputationError(
                        "missing horizon variances for out-of-sample position".into(),
                    ));
                };
                match spread {
                    HorizonSpread::Analytic(vars) => {
                        let half = z * vars[h].sqrt();
                        lower.push(mu - half);
                        upper.push(mu + half);
                    }
                    HorizonSpread::Simulated(paths) => {
                        let draws = paths.step_values(h);
                        lower.push(crate::stats::empirical_quantile(&draws, config.alpha / 2.0));
                        upper.push(crate::stats::empirical_quantile(
                            &draws,
                            1.0 - config.alpha / 2.0,
                        ));
                    }
                }
                observed.push(None);
            }
        }

        // Simulated percentiles can land on either side of the mean path in
        // finite samples; force the ordering invariant.
        for ((lo, hi), &mu) in lower.iter_mut().zip(upper.iter_mut()).zip(mean.iter()) {
            *lo = lo.min(mu);
            *hi = hi.max(mu);
        }

        Ok(Prediction {
            start,
            mean,
            lower,
            upper,
            observed,
        })
    }

    /// One-step error scale at mean `mu`: sigma for additive errors,
    /// mu-proportional for multiplicative errors.
    fn scale_error(&self, mu: f64, sigma: f64) -> f64 {
        match self.spec.error {
            ErrorComponent::Additive => sigma,
            ErrorComponent::Multiplicative => sigma * mu.abs(),
        }
    }

    fn horizon_variances<R: Rng>(
        &self,
        steps: usize,
        repetitions: usize,
        rng: &mut R,
    ) -> Result<HorizonSpread> {
        if let Some(vars) = analytic_variances(&self.spec, self.params(), self.sigma2(), steps) {
            Ok(HorizonSpread::Analytic(vars))
        } else {
            if repetitions == 0 {
                return Err(EtsError::InvalidParameter(format!(
                    "{} has no analytic interval formula; simulated intervals require repetitions >= 1",
                    self.spec.short_name()
                )));
            }
            let paths = self.simulate(Anchor::End, steps, repetitions, rng)?;
            Ok(HorizonSpread::Simulated(paths))
        }
    }
}

enum HorizonSpread {
    Analytic(Vec<f64>),
    Simulated(crate::simulate::SimulatedPaths),
}

/// Closed-form h-step forecast-error variances for class-1 models
/// (additive error, none/additive trend with optional damping, none/additive
/// seasonal). `None` for every other variant.
fn analytic_variances(
    spec: &ModelSpec,
    params: &crate::recursion::Params,
    sigma2: f64,
    steps: usize,
) -> Option<Vec<f64>> {
    if spec.error != ErrorComponent::Additive {
        return None;
    }
    if spec.trend == TrendComponent::Multiplicative
        || spec.seasonal == SeasonalComponent::Multiplicative
    {
        return None;
    }

    let a = params.alpha;
    let b = params.beta;
    let g = params.gamma;
    let phi = params.phi;
    let m = spec.seasonal_periods;
    let has_trend = spec.has_trend();
    let has_seasonal = spec.has_seasonal();
    let damped = spec.damped;

    let mut vars = Vec::with_capacity(steps);
    for h in 1..=steps {
        let hf = h as f64;
        let k = if has_seasonal {
            ((h - 1) / m) as f64
        } else {
            0.0
        };

        let mut ratio = if !has_trend {
            1.0 + a * a * (hf - 1.0)
        } else if !damped {
            1.0 + (hf - 1.0) * (a * a + a * b * hf + b * b * hf * (2.0 * hf - 1.0) / 6.0)
        } else {
            let one_m = 1.0 - phi;
            let one_m2 = 1.0 - phi * phi;
            let phih = phi.powi(h as i32);
            1.0 + a * a * (hf - 1.0)
                + (b * phi * hf) / (one_m * one_m) * (2.0 * a * one_m + b * phi)
                - (b * phi * (1.0 - phih)) / (one_m * one_m * one_m2)
                    * (2.0 * a * one_m2 + b * phi * (1.0 + 2.0 * phi - phih))
        };

        if has_seasonal {
            ratio += g * k * (2.0 * a + g);
            if has_trend {
                if !damped {
                    ratio += b * g * (m as f64) * k * (k + 1.0);
                } else {
                    let phim = phi.powi(m as i32);
                    let phimk = phi.powi((m as f64 * k) as i32);
                    ratio += (2.0 * b * g * phi) / ((1.0 - phi) * (1.0 - phim))
                        * (k * (1.0 - phim) - phim * (1.0 - phimk));
                }
            }
        }

        vars.push(sigma2 * ratio);
    }
    Some(vars)
}
