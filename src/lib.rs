//! # ets-forecast
//!
//! Exponential smoothing (ETS) state-space models for univariate time
//! series, following the innovations formulation of Hyndman et al.
//!
//! Covers the full taxonomy of error (additive/multiplicative), trend
//! (none/additive/multiplicative, optionally damped) and seasonal
//! (none/additive/multiplicative) components, with maximum-likelihood
//! estimation, forecasting with analytic or simulated prediction
//! intervals, and seedable Monte Carlo simulation.
//!
//! ```no_run
//! use ets_forecast::{EtsModel, FitOptions, ModelSpec};
//!
//! let data = vec![12.3, 14.1, 13.8, 15.2, 14.9, 16.4, 15.8, 17.1];
//! let model = EtsModel::new(data, ModelSpec::aan()).unwrap();
//! let fit = model.fit(&FitOptions::default()).unwrap();
//! let point = fit.forecast(4).unwrap();
//! ```

#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod error;
pub mod forecast;
pub mod initialization;
pub mod likelihood;
pub mod model;
pub mod optimize;
pub mod recursion;
pub mod simulate;
pub mod spec;
pub mod stats;

pub use error::{EtsError, Result};
pub use forecast::{Prediction, PredictionConfig};
pub use model::{EtsModel, FitOptions, FittedEts};
pub use simulate::{Anchor, SimulatedPaths};
pub use spec::{
    ErrorComponent, InitializationMethod, ModelSpec, SeasonalComponent, TrendComponent,
};

pub mod prelude {
    pub use crate::error::{EtsError, Result};
    pub use crate::forecast::{Prediction, PredictionConfig};
    pub use crate::model::{EtsModel, FitOptions, FittedEts};
    pub use crate::simulate::{Anchor, SimulatedPaths};
    pub use crate::spec::{
        ErrorComponent, InitializationMethod, ModelSpec, SeasonalComponent, TrendComponent,
    };
}
