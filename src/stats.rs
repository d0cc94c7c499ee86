//! Small statistical helpers shared across the engine.

/// Approximate quantile function for the standard normal distribution.
///
/// Uses the Abramowitz and Stegun approximation (formula 26.2.23), accurate
/// to about 4.5e-4 in the central range.
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let t = if p < 0.5 {
        (-2.0 * p.ln()).sqrt()
    } else {
        (-2.0 * (1.0 - p).ln()).sqrt()
    };

    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let result = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    if p < 0.5 {
        -result
    } else {
        result
    }
}

/// Mean of a slice. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// `p` is clamped to [0, 1]. NaN for empty input.
pub fn empirical_quantile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let p = p.clamp(0.0, 1.0);
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let w = pos - lo as f64;
        sorted[lo] * (1.0 - w) + sorted[hi] * w
    }
}

/// Invert a small dense matrix in place via Gauss-Jordan elimination with
/// partial pivoting. Returns `None` if the matrix is singular or
/// ill-conditioned (pivot below tolerance).
pub fn invert_matrix(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    if n == 0 || a.iter().any(|row| row.len() != n) {
        return None;
    }

    // Augment [A | I]
    let mut aug: Vec<Vec<f64>> = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            r
        })
        .collect();

    for col in 0..n {
        // Partial pivot
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                aug[i][col]
                    .abs()
                    .partial_cmp(&aug[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        let pivot = aug[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() < 1e-12 {
            return None;
        }
        aug.swap(col, pivot_row);

        let inv_pivot = 1.0 / pivot;
        for x in aug[col].iter_mut() {
            *x *= inv_pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[row][col];
                if factor != 0.0 {
                    for k in 0..2 * n {
                        aug[row][k] -= factor * aug[col][k];
                    }
                }
            }
        }
    }

    Some(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 0.01);
        assert_relative_eq!(quantile_normal(0.975), 1.96, epsilon = 0.01);
        assert_relative_eq!(quantile_normal(0.025), -1.96, epsilon = 0.01);
        assert_relative_eq!(quantile_normal(0.995), 2.576, epsilon = 0.01);
    }

    #[test]
    fn quantile_normal_boundaries() {
        assert_eq!(quantile_normal(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile_normal(1.0), f64::INFINITY);
    }

    #[test]
    fn empirical_quantile_interpolates() {
        let values = vec![4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(empirical_quantile(&values, 0.0), 1.0);
        assert_relative_eq!(empirical_quantile(&values, 1.0), 4.0);
        assert_relative_eq!(empirical_quantile(&values, 0.5), 2.5);
    }

    #[test]
    fn invert_identity_and_simple() {
        let identity = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let inv = invert_matrix(&identity).unwrap();
        assert_relative_eq!(inv[0][0], 1.0);
        assert_relative_eq!(inv[1][1], 1.0);

        let a = vec![vec![4.0, 7.0], vec![2.0, 6.0]];
        let inv = invert_matrix(&a).unwrap();
        // A^-1 = 1/10 * [6 -7; -2 4]
        assert_relative_eq!(inv[0][0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(inv[0][1], -0.7, epsilon = 1e-12);
        assert_relative_eq!(inv[1][0], -0.2, epsilon = 1e-12);
        assert_relative_eq!(inv[1][1], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn invert_singular_is_none() {
        let singular = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(invert_matrix(&singular).is_none());
    }
}
