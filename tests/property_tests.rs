//! Cross-cutting behavioral checks exercised through the public API.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use ets_forecast::prelude::*;

fn trend_series(n: usize, noise: f64) -> Vec<f64> {
    (0..n)
        .map(|t| 20.0 + 1.5 * t as f64 + if t % 2 == 0 { noise } else { -noise })
        .collect()
}

fn seasonal_series(n: usize, m: usize) -> Vec<f64> {
    let pattern = [1.08, 0.95, 1.03, 0.94];
    (0..n)
        .map(|t| (50.0 + 0.8 * t as f64) * pattern[t % m] + if t % 3 == 0 { 0.4 } else { -0.4 })
        .collect()
}

/// Series drawn from a known ETS(A,N,N) process.
fn gen_ann(n: usize, alpha: f64, level: f64, sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).unwrap();
    let mut l = level;
    (0..n)
        .map(|_| {
            let e = normal.sample(&mut rng);
            let y = l + e;
            l += alpha * e;
            y
        })
        .collect()
}

/// Series drawn from a known ETS(A,A,N) process.
fn gen_aan(n: usize, alpha: f64, beta: f64, level: f64, trend: f64, sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).unwrap();
    let mut l = level;
    let mut b = trend;
    (0..n)
        .map(|_| {
            let e = normal.sample(&mut rng);
            let mu = l + b;
            let y = mu + e;
            l = mu + alpha * e;
            b += beta * e;
            y
        })
        .collect()
}

/// Series drawn from a known ETS(M,N,N) process (relative errors).
fn gen_mnn(n: usize, alpha: f64, level: f64, rel_sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, rel_sigma).unwrap();
    let mut l = level;
    (0..n)
        .map(|_| {
            let eps = normal.sample(&mut rng);
            let y = l * (1.0 + eps);
            l *= 1.0 + alpha * eps;
            y
        })
        .collect()
}

#[test]
fn residuals_are_data_minus_fitted_for_additive_errors() {
    let model = EtsModel::new(trend_series(30, 0.5), ModelSpec::aan()).unwrap();
    let fit = model.fit(&FitOptions::default()).unwrap();
    for ((y, f), e) in fit
        .data()
        .iter()
        .zip(fit.fitted_values())
        .zip(fit.residuals())
    {
        assert_eq!(y - f, *e);
    }
}

#[test]
fn additive_residuals_average_to_zero_at_the_optimum() {
    // Maximizing the Gaussian likelihood with a free initial level drives
    // the residual sample mean toward zero; a visible bias means the fit
    // stopped short of the optimum.
    let model = EtsModel::new(trend_series(60, 0.5), ModelSpec::aan()).unwrap();
    let fit = model.fit(&FitOptions::default()).unwrap();

    let mean = ets_forecast::stats::mean(fit.residuals());
    assert!(mean.abs() < 0.2 * fit.sigma2().sqrt());
}

#[test]
fn ann_fit_recovers_generating_alpha() {
    let data = gen_ann(400, 0.5, 50.0, 2.0, 2024);
    let fit = EtsModel::new(data, ModelSpec::ann())
        .unwrap()
        .fit(&FitOptions::default())
        .unwrap();

    assert!((fit.alpha() - 0.5).abs() < 0.2);
    // Variance recovery: sigma^2 was 4.
    assert!(fit.sigma2() > 2.0 && fit.sigma2() < 8.0);
}

#[test]
fn aan_fit_recovers_generating_parameters() {
    let data = gen_aan(400, 0.5, 0.1, 20.0, 0.5, 1.5, 7);
    let fit = EtsModel::new(data, ModelSpec::aan())
        .unwrap()
        .fit(&FitOptions::default().with_maxiter(2000))
        .unwrap();

    assert!((fit.alpha() - 0.5).abs() < 0.25);
    let beta = fit.beta().unwrap();
    assert!((beta - 0.1).abs() < 0.2);
    // sigma^2 was 2.25.
    assert!(fit.sigma2() > 1.0 && fit.sigma2() < 5.0);
}

#[test]
fn mnn_fit_recovers_generating_parameters() {
    let data = gen_mnn(400, 0.4, 100.0, 0.05, 99);
    let fit = EtsModel::new(data, ModelSpec::mnn())
        .unwrap()
        .fit(&FitOptions::default())
        .unwrap();

    assert!((fit.alpha() - 0.4).abs() < 0.2);
    // Relative variance recovery: sigma^2 was 0.0025.
    assert!(fit.sigma2() > 0.00125 && fit.sigma2() < 0.005);
}

#[test]
fn wider_confidence_levels_nest() {
    let model = EtsModel::new(trend_series(40, 0.5), ModelSpec::aan()).unwrap();
    let fit = model.fit(&FitOptions::default()).unwrap();
    let n = fit.n_obs();

    let mut rng = StdRng::seed_from_u64(11);
    let narrow = PredictionConfig {
        alpha: 0.20,
        ..PredictionConfig::default()
    };
    let wide = PredictionConfig {
        alpha: 0.01,
        ..PredictionConfig::default()
    };
    // Additive-error, additive-trend intervals are analytic, so RNG state
    // does not affect them.
    let p20 = fit.get_prediction(0, n + 7, &narrow, &mut rng).unwrap();
    let p01 = fit.get_prediction(0, n + 7, &wide, &mut rng).unwrap();

    for i in 0..p20.len() {
        assert!(p01.lower()[i] <= p20.lower()[i]);
        assert!(p20.upper()[i] <= p01.upper()[i]);
        assert!(p20.lower()[i] <= p20.mean()[i]);
        assert!(p20.mean()[i] <= p20.upper()[i]);
    }
}

#[test]
fn simulated_intervals_are_seed_reproducible() {
    let spec = ModelSpec::mam(4);
    let model = EtsModel::new(seasonal_series(32, 4), spec).unwrap();
    let fit = model.fit(&FitOptions::default()).unwrap();
    let n = fit.n_obs();

    let config = PredictionConfig {
        repetitions: 200,
        ..PredictionConfig::default()
    };
    let mut rng1 = StdRng::seed_from_u64(77);
    let mut rng2 = StdRng::seed_from_u64(77);
    let a = fit.get_prediction(n, n + 5, &config, &mut rng1).unwrap();
    let b = fit.get_prediction(n, n + 5, &config, &mut rng2).unwrap();

    assert_eq!(a.lower(), b.lower());
    assert_eq!(a.upper(), b.upper());
    assert_eq!(a.mean(), b.mean());
}

#[test]
fn simulation_matrix_reproduces_under_one_seed() {
    let spec = ModelSpec::mam(4);
    let model = EtsModel::new(seasonal_series(32, 4), spec).unwrap();
    let fit = model.fit(&FitOptions::default()).unwrap();

    let mut rng1 = StdRng::seed_from_u64(5);
    let mut rng2 = StdRng::seed_from_u64(5);
    let a = fit.simulate(Anchor::End, 6, 25, &mut rng1).unwrap();
    let b = fit.simulate(Anchor::End, 6, 25, &mut rng2).unwrap();
    for rep in 0..25 {
        assert_eq!(a.path(rep), b.path(rep));
    }
}

#[test]
fn positive_data_requirement_fails_at_construction() {
    let mut data = seasonal_series(32, 4);
    data[10] = -2.0;
    let err = EtsModel::new(data, ModelSpec::mam(4)).unwrap_err();
    assert!(matches!(err, EtsError::NonPositiveData { index: 10, .. }));
}

#[test]
fn too_short_series_fails_at_construction() {
    // MAM with m = 4 needs enough data for both the seasonal heuristic
    // and the free parameter count.
    let err = EtsModel::new(seasonal_series(5, 4), ModelSpec::mam(4)).unwrap_err();
    assert!(matches!(err, EtsError::InsufficientData { .. }));
}

#[test]
fn non_finite_observations_are_rejected() {
    let mut data = trend_series(20, 0.5);
    data[3] = f64::NAN;
    assert!(EtsModel::new(data, ModelSpec::ann()).is_err());
}

#[test]
fn noisier_data_estimates_larger_variance() {
    let quiet = EtsModel::new(trend_series(40, 0.2), ModelSpec::aan())
        .unwrap()
        .fit(&FitOptions::default())
        .unwrap();
    let loud = EtsModel::new(trend_series(40, 4.0), ModelSpec::aan())
        .unwrap()
        .fit(&FitOptions::default())
        .unwrap();
    assert!(loud.sigma2() > quiet.sigma2());
}

#[test]
fn seasonal_fit_keeps_cycle_length_in_state() {
    let model = EtsModel::new(seasonal_series(32, 4), ModelSpec::aaa(4)).unwrap();
    let fit = model.fit(&FitOptions::default()).unwrap();
    assert_eq!(fit.initial_state().seasonal.len(), 4);
    assert_eq!(fit.final_state().seasonal.len(), 4);
    assert!(fit.gamma().is_some());
}

#[test]
fn forecast_of_damped_trend_levels_off() {
    let spec = ModelSpec::aan().with_damped(true);
    let model = EtsModel::new(trend_series(40, 0.5), spec).unwrap();
    let fit = model.fit(&FitOptions::default()).unwrap();

    let fc = fit.forecast(200).unwrap();
    // Damped increments shrink geometrically, so far-horizon steps are
    // smaller than near ones.
    let early = (fc[1] - fc[0]).abs();
    let late = (fc[199] - fc[198]).abs();
    assert!(late <= early + 1e-9);
}

#[test]
fn invalid_specifications_fail_before_fitting() {
    let damped_without_trend = ModelSpec::ann().with_damped(true);
    assert!(EtsModel::new(trend_series(20, 0.5), damped_without_trend).is_err());

    let one_period_season = ModelSpec::aaa(4).with_seasonal_periods(1);
    assert!(EtsModel::new(seasonal_series(32, 4), one_period_season).is_err());
}
