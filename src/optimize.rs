//! Bounded Nelder-Mead simplex minimization.
//!
//! The likelihood surface is cheap to evaluate but not smooth near the
//! admissible-region boundary (infeasible candidates return an infinite
//! penalty), so a derivative-free simplex search is used. The optimizer is
//! kept behind a minimal objective -> outcome interface so a different
//! solver could be swapped in without touching the likelihood code.

/// Options for the simplex search.
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    /// Maximum number of iterations; exhausting it reports non-convergence.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub reflection: f64,
    /// Expansion coefficient.
    pub expansion: f64,
    /// Contraction coefficient.
    pub contraction: f64,
    /// Shrink coefficient.
    pub shrink: f64,
    /// Relative step used to seed the initial simplex.
    pub initial_step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex run.
#[derive(Debug, Clone)]
pub struct SimplexOutcome {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective value at the best point.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the stopping criterion was met within the iteration budget.
    pub converged: bool,
}

/// Minimize `objective` starting from `initial`, clamping every candidate to
/// `bounds` (per-dimension `(min, max)`; infinite bounds leave a dimension
/// unconstrained).
///
/// Objective values of `f64::INFINITY` are handled as worst-rank candidates;
/// convergence additionally requires a finite best value, so a search that
/// never finds a feasible point reports non-convergence.
pub fn minimize<F>(
    objective: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    options: &SimplexOptions,
) -> SimplexOutcome
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return SimplexOutcome {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }
    debug_assert_eq!(bounds.len(), n);

    // Seed a simplex around the initial point, stepping away from the
    // nearer bound so a seed at a bound still produces distinct vertices.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial, bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let scale = if initial[i].abs() > 1e-10 {
            options.initial_step * initial[i].abs()
        } else {
            options.initial_step
        };
        let stepped_up = initial[i] + scale;
        vertex[i] = if stepped_up <= bounds[i].1 {
            stepped_up
        } else {
            initial[i] - scale
        };
        simplex.push(clamp(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = values[worst] - values[best];
        if values[best].is_finite() && spread.is_finite() && spread < options.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);

        // Collapsed simplex: nothing left to explore.
        let max_dist = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        if max_dist < options.tolerance {
            converged = values[best].is_finite();
            break;
        }

        // Reflection
        let reflected = clamp(
            &affine(&centroid, &simplex[worst], -options.reflection),
            bounds,
        );
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            // Expansion
            let expanded = clamp(&affine(&centroid, &reflected, options.expansion), bounds);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        // Contraction, outside or inside of the reflected point.
        let toward = if reflected_value < values[worst] {
            &reflected
        } else {
            &simplex[worst]
        };
        let contracted = clamp(&affine(&centroid, toward, options.contraction), bounds);
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink toward the best vertex.
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                for j in 0..n {
                    simplex[i][j] = anchor[j] + options.shrink * (simplex[i][j] - anchor[j]);
                }
                simplex[i] = clamp(&simplex[i], bounds);
                values[i] = objective(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    SimplexOutcome {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged: converged && values[best].is_finite(),
    }
}

fn centroid_excluding(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude {
            for (c, v) in centroid.iter_mut().zip(vertex.iter()) {
                *c += v;
            }
        }
    }
    for c in centroid.iter_mut() {
        *c /= count;
    }
    centroid
}

/// Point on the line through `from` towards `to`, scaled by `coeff`
/// relative to `from` (negative coefficients reflect through `from`).
fn affine(from: &[f64], to: &[f64], coeff: f64) -> Vec<f64> {
    from.iter()
        .zip(to.iter())
        .map(|(f, t)| f + coeff * (t - f))
        .collect()
}

fn clamp(point: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    point
        .iter()
        .zip(bounds.iter())
        .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
