//! ETS model specification: the (error, trend, seasonal) component choices.

use crate::error::{EtsError, Result};

/// Error component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorComponent {
    /// Additive errors: y_t = mu_t + e_t.
    #[default]
    Additive,
    /// Multiplicative errors: y_t = mu_t * (1 + e_t).
    Multiplicative,
}

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendComponent {
    /// No trend.
    #[default]
    None,
    /// Additive trend.
    Additive,
    /// Multiplicative trend.
    Multiplicative,
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalComponent {
    /// No seasonality.
    #[default]
    None,
    /// Additive seasonality.
    Additive,
    /// Multiplicative seasonality.
    Multiplicative,
}

/// How initial states are determined before/during estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitializationMethod {
    /// Initial states are free parameters, optimized jointly with the
    /// smoothing parameters.
    #[default]
    Estimated,
    /// Initial states come from a classical-decomposition heuristic on the
    /// start of the series and are held fixed during optimization.
    Heuristic,
}

/// Full ETS model specification.
///
/// Combines error, trend (optionally damped), and seasonal component choices
/// with the seasonal period and the initialization method. All 30 valid
/// (error x trend x damped x seasonal) combinations can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub error: ErrorComponent,
    pub trend: TrendComponent,
    pub damped: bool,
    pub seasonal: SeasonalComponent,
    /// Seasonal period m; only meaningful when `seasonal` is not `None`.
    pub seasonal_periods: usize,
    pub initialization: InitializationMethod,
}

impl ModelSpec {
    /// Create a non-damped, non-seasonal specification. Use the builder
    /// methods to add damping, a seasonal period, or a different
    /// initialization method.
    pub fn new(error: ErrorComponent, trend: TrendComponent, seasonal: SeasonalComponent) -> Self {
        Self {
            error,
            trend,
            damped: false,
            seasonal,
            seasonal_periods: 0,
            initialization: InitializationMethod::default(),
        }
    }

    /// ETS(A,N,N) - simple exponential smoothing with additive errors.
    pub fn ann() -> Self {
        Self::new(
            ErrorComponent::Additive,
            TrendComponent::None,
            SeasonalComponent::None,
        )
    }

    /// ETS(A,A,N) - Holt's linear method with additive errors.
    pub fn aan() -> Self {
        Self::new(
            ErrorComponent::Additive,
            TrendComponent::Additive,
            SeasonalComponent::None,
        )
    }

    /// ETS(A,Ad,N) - damped trend with additive errors.
    pub fn aadn() -> Self {
        Self::aan().with_damped(true)
    }

    /// ETS(A,A,A) - additive Holt-Winters with seasonal period `m`.
    pub fn aaa(m: usize) -> Self {
        Self::new(
            ErrorComponent::Additive,
            TrendComponent::Additive,
            SeasonalComponent::Additive,
        )
        .with_seasonal_periods(m)
    }

    /// ETS(M,N,N) - simple exponential smoothing with multiplicative errors.
    pub fn mnn() -> Self {
        Self::new(
            ErrorComponent::Multiplicative,
            TrendComponent::None,
            SeasonalComponent::None,
        )
    }

    /// ETS(M,A,M) - multiplicative Holt-Winters with seasonal period `m`.
    pub fn mam(m: usize) -> Self {
        Self::new(
            ErrorComponent::Multiplicative,
            TrendComponent::Additive,
            SeasonalComponent::Multiplicative,
        )
        .with_seasonal_periods(m)
    }

    /// Set the damped-trend flag.
    pub fn with_damped(mut self, damped: bool) -> Self {
        self.damped = damped;
        self
    }

    /// Set the seasonal period.
    pub fn with_seasonal_periods(mut self, m: usize) -> Self {
        self.seasonal_periods = m;
        self
    }

    /// Set the initialization method.
    pub fn with_initialization(mut self, method: InitializationMethod) -> Self {
        self.initialization = method;
        self
    }

    /// Validate internal consistency of the specification.
    ///
    /// This catches configuration errors that are independent of the data;
    /// data-dependent checks (positivity, length) happen at model
    /// construction.
    pub fn validate(&self) -> Result<()> {
        if self.damped && self.trend == TrendComponent::None {
            return Err(EtsError::InvalidSpecification(
                "damped trend requires a trend component".into(),
            ));
        }
        if self.has_seasonal() && self.seasonal_periods < 2 {
            return Err(EtsError::InvalidSpecification(format!(
                "seasonal component requires seasonal_periods >= 2, got {}",
                self.seasonal_periods
            )));
        }
        Ok(())
    }

    /// Whether the model has a trend component.
    pub fn has_trend(&self) -> bool {
        self.trend != TrendComponent::None
    }

    /// Whether the model has a seasonal component.
    pub fn has_seasonal(&self) -> bool {
        self.seasonal != SeasonalComponent::None
    }

    /// Whether any component requires strictly positive observations.
    pub fn requires_positive_data(&self) -> bool {
        self.error == ErrorComponent::Multiplicative
            || self.trend == TrendComponent::Multiplicative
            || self.seasonal == SeasonalComponent::Multiplicative
    }

    /// Number of free smoothing parameters (alpha, beta?, gamma?, phi?).
    pub fn n_smoothing_params(&self) -> usize {
        1 + usize::from(self.has_trend())
            + usize::from(self.has_seasonal())
            + usize::from(self.damped)
    }

    /// Number of initial-state values (l0, b0?, s_1..s_m?).
    pub fn n_initial_states(&self) -> usize {
        1 + usize::from(self.has_trend())
            + if self.has_seasonal() {
                self.seasonal_periods
            } else {
                0
            }
    }

    /// Total number of model parameters (smoothing + initial states), as
    /// counted by the information criteria.
    pub fn n_params(&self) -> usize {
        self.n_smoothing_params() + self.n_initial_states()
    }

    /// Number of free parameters seen by the optimizer for this
    /// initialization method.
    pub fn n_free_params(&self) -> usize {
        match self.initialization {
            InitializationMethod::Estimated => self.n_params(),
            InitializationMethod::Heuristic => self.n_smoothing_params(),
        }
    }

    /// Minimum series length needed to fit this specification.
    pub fn min_observations(&self) -> usize {
        let base = if self.has_seasonal() {
            2 * self.seasonal_periods
        } else {
            2
        };
        base.max(self.n_free_params() + 1)
    }

    /// Short name in the conventional `ETS(E,T,S)` notation, with `d`
    /// marking a damped trend.
    pub fn short_name(&self) -> String {
        let e = match self.error {
            ErrorComponent::Additive => "A",
            ErrorComponent::Multiplicative => "M",
        };
        let t = match (self.trend, self.damped) {
            (TrendComponent::None, _) => "N",
            (TrendComponent::Additive, false) => "A",
            (TrendComponent::Additive, true) => "Ad",
            (TrendComponent::Multiplicative, false) => "M",
            (TrendComponent::Multiplicative, true) => "Md",
        };
        let s = match self.seasonal {
            SeasonalComponent::None => "N",
            SeasonalComponent::Additive => "A",
            SeasonalComponent::Multiplicative => "M",
        };
        format!("ETS({},{},{})", e, t, s)
    }
}
