//! Exact-gradient t-SNE with a seeded RNG.
//!
//! Projects case vectors to 2D while preserving local neighborhood
//! structure. The implementation is the standard formulation: perplexity
//! binary search for per-point Gaussian bandwidths, symmetrized joint
//! affinities, Student-t low-dimensional kernel, gradient descent with
//! momentum, per-coordinate adaptive gains, and early exaggeration.
//! O(n^2) per iteration, which is fine at case-docket scale (a few
//! thousand points).
//!
//! Determinism: for a fixed input set, perplexity, and seed, repeated
//! runs produce identical coordinates. The only stochastic step is the
//! Gaussian initialization, drawn from `ChaCha8Rng::seed_from_u64(seed)`;
//! everything after it is deterministic f64 arithmetic.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info, warn};

use super::error::ReduceError;
use crate::types::{CaseVector, ProjectedPoint};

/// Iterations spent in the early-exaggeration phase.
const EXAGGERATION_ITERS: usize = 250;
/// Iteration at which momentum switches from initial to final.
const MOMENTUM_SWITCH_ITER: usize = 250;
const INITIAL_MOMENTUM: f64 = 0.5;
const FINAL_MOMENTUM: f64 = 0.8;
/// Floor for the per-coordinate adaptive gains.
const MIN_GAIN: f64 = 0.01;
/// Floor for joint affinities, prevents log/divide blowups.
const P_FLOOR: f64 = 1e-12;
/// Binary search iterations for per-point bandwidth.
const BANDWIDTH_SEARCH_ITERS: usize = 50;
const ENTROPY_TOLERANCE: f64 = 1e-5;

/// Parameters for the t-SNE reducer.
#[derive(Debug, Clone, PartialEq)]
pub struct TsneParams {
    /// Effective neighborhood size per point. Clamped at fit time to
    /// `max(5, n_cases / 4)` (never above `n_cases - 1`) when the case
    /// set is small.
    pub perplexity: usize,
    /// Gradient-descent iterations.
    pub iterations: usize,
    /// Gradient-descent step size.
    pub learning_rate: f64,
    /// Affinity multiplier during the early-exaggeration phase.
    pub early_exaggeration: f64,
    /// Seed for the initialization RNG.
    pub seed: u64,
}

impl Default for TsneParams {
    fn default() -> Self {
        Self {
            perplexity: 30,
            iterations: 1000,
            learning_rate: 200.0,
            early_exaggeration: 12.0,
            seed: 42,
        }
    }
}

impl TsneParams {
    /// Set perplexity.
    #[must_use]
    pub fn with_perplexity(mut self, perplexity: usize) -> Self {
        self.perplexity = perplexity;
        self
    }

    /// Set iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ReduceError> {
        if self.perplexity < 2 {
            return Err(ReduceError::InvalidParameter(format!(
                "perplexity must be >= 2, got {}",
                self.perplexity
            )));
        }
        if self.iterations == 0 {
            return Err(ReduceError::InvalidParameter(
                "iterations must be > 0".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(ReduceError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// t-SNE reducer producing one [`ProjectedPoint`] per case.
pub struct TsneReducer {
    params: TsneParams,
}

impl TsneReducer {
    /// Create a reducer with the given parameters.
    pub fn new(params: TsneParams) -> Self {
        Self { params }
    }

    /// Create a reducer with default parameters.
    pub fn with_defaults() -> Self {
        Self::new(TsneParams::default())
    }

    /// Project the full case set into 2D.
    ///
    /// # Errors
    ///
    /// - `ReduceError::InsufficientData` if fewer than 2 cases
    /// - `ReduceError::DimensionMismatch` if case vectors disagree on
    ///   dimension (mixed embedding models)
    /// - `ReduceError::InvalidParameter` on bad params
    pub fn project(&self, cases: &[CaseVector]) -> Result<Vec<ProjectedPoint>, ReduceError> {
        self.params.validate()?;

        let n = cases.len();
        if n < 2 {
            return Err(ReduceError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let dim = cases[0].dim();
        for case in cases {
            if case.dim() != dim {
                return Err(ReduceError::DimensionMismatch {
                    expected: dim,
                    actual: case.dim(),
                    case_id: case.case_id.clone(),
                });
            }
        }

        // Clamp perplexity downward for small case sets instead of
        // failing. A perplexity near the point count spreads each point's
        // affinity mass over the whole set and washes out local
        // structure, so the cap is n/4 (floor 5), never above n-1.
        let effective_perplexity = effective_perplexity(self.params.perplexity, n);
        if effective_perplexity != self.params.perplexity {
            warn!(
                requested = self.params.perplexity,
                effective = effective_perplexity,
                n_cases = n,
                "Clamped perplexity for small case set"
            );
        }

        info!(
            n_cases = n,
            dim,
            perplexity = effective_perplexity,
            iterations = self.params.iterations,
            seed = self.params.seed,
            "Computing t-SNE projection"
        );

        let d2 = pairwise_squared_distances(cases);
        let p = joint_affinities(&d2, effective_perplexity as f64);
        let coords = self.gradient_descent(&p, n);

        Ok(cases
            .iter()
            .zip(coords.iter())
            .map(|(case, &[x, y])| ProjectedPoint {
                case_id: case.case_id.clone(),
                x: x as f32,
                y: y as f32,
            })
            .collect())
    }

    /// Run gradient descent on the 2D embedding.
    fn gradient_descent(&self, p: &[Vec<f64>], n: usize) -> Vec<[f64; 2]> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        // Normal(0, 1e-4) cannot fail: std dev is finite and positive.
        let init = Normal::new(0.0f64, 1e-4)
            .unwrap_or_else(|_| unreachable!("fixed valid std dev"));

        let mut y: Vec<[f64; 2]> = (0..n)
            .map(|_| [init.sample(&mut rng), init.sample(&mut rng)])
            .collect();
        let mut velocity = vec![[0.0f64; 2]; n];
        let mut gains = vec![[1.0f64; 2]; n];

        for iter in 0..self.params.iterations {
            let exaggeration = if iter < EXAGGERATION_ITERS {
                self.params.early_exaggeration
            } else {
                1.0
            };
            let momentum = if iter < MOMENTUM_SWITCH_ITER {
                INITIAL_MOMENTUM
            } else {
                FINAL_MOMENTUM
            };

            // Student-t kernel and its normalizer.
            let mut q_num = vec![vec![0.0f64; n]; n];
            let mut q_sum = 0.0f64;
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = y[i][0] - y[j][0];
                    let dy = y[i][1] - y[j][1];
                    let num = 1.0 / (1.0 + dx * dx + dy * dy);
                    q_num[i][j] = num;
                    q_num[j][i] = num;
                    q_sum += 2.0 * num;
                }
            }
            let q_sum = q_sum.max(P_FLOOR);

            // Gradient: 4 * sum_j (p_ij - q_ij) * kernel_ij * (y_i - y_j)
            for i in 0..n {
                let mut grad = [0.0f64; 2];
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let q_ij = (q_num[i][j] / q_sum).max(P_FLOOR);
                    let coeff = 4.0 * (exaggeration * p[i][j] - q_ij) * q_num[i][j];
                    grad[0] += coeff * (y[i][0] - y[j][0]);
                    grad[1] += coeff * (y[i][1] - y[j][1]);
                }
                // Delta-bar-delta gain schedule: a gradient that keeps
                // opposing the velocity direction means steady progress,
                // so the gain grows; matching signs mean oscillation, so
                // it shrinks. Without this the embedding never expands
                // out of its near-origin initialization and tight input
                // groups fail to condense.
                for d in 0..2 {
                    gains[i][d] = if grad[d].signum() == velocity[i][d].signum() {
                        (gains[i][d] * 0.8).max(MIN_GAIN)
                    } else {
                        gains[i][d] + 0.2
                    };
                    velocity[i][d] = momentum * velocity[i][d]
                        - self.params.learning_rate * gains[i][d] * grad[d];
                }
            }
            for i in 0..n {
                y[i][0] += velocity[i][0];
                y[i][1] += velocity[i][1];
            }

            // Recenter so the embedding stays near the origin.
            let mean_x = y.iter().map(|p| p[0]).sum::<f64>() / n as f64;
            let mean_y = y.iter().map(|p| p[1]).sum::<f64>() / n as f64;
            for point in y.iter_mut() {
                point[0] -= mean_x;
                point[1] -= mean_y;
            }

            if iter % 100 == 0 {
                debug!(iter, exaggeration, momentum, "t-SNE iteration");
            }
        }

        y
    }
}

/// Perplexity actually used for `n` points: the requested value capped
/// at `max(5, n / 4)` and never above `max(2, n - 1)`.
fn effective_perplexity(requested: usize, n: usize) -> usize {
    requested.min((n / 4).max(5)).min((n - 1).max(2))
}

/// Pairwise squared Euclidean distances between case vectors.
fn pairwise_squared_distances(cases: &[CaseVector]) -> Vec<Vec<f64>> {
    let n = cases.len();
    let mut d2 = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let dist: f64 = cases[i]
                .vector
                .iter()
                .zip(cases[j].vector.iter())
                .map(|(&a, &b)| {
                    let diff = a as f64 - b as f64;
                    diff * diff
                })
                .sum();
            d2[i][j] = dist;
            d2[j][i] = dist;
        }
    }
    d2
}

/// Symmetrized joint affinities P from squared distances and perplexity.
fn joint_affinities(d2: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
    let n = d2.len();
    let target_entropy = perplexity.ln();

    // Conditional affinities p_{j|i} via per-point bandwidth search.
    let mut conditional = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        let row = conditional_row(&d2[i], i, target_entropy);
        conditional[i] = row;
    }

    // Symmetrize and normalize: p_ij = (p_{j|i} + p_{i|j}) / 2n
    let mut p = vec![vec![0.0f64; n]; n];
    let scale = 1.0 / (2.0 * n as f64);
    for i in 0..n {
        for j in 0..n {
            if i != j {
                p[i][j] = ((conditional[i][j] + conditional[j][i]) * scale).max(P_FLOOR);
            }
        }
    }
    p
}

/// Binary search the Gaussian bandwidth (precision beta) for point `i`
/// until the conditional distribution's entropy matches the target.
fn conditional_row(distances: &[f64], i: usize, target_entropy: f64) -> Vec<f64> {
    let n = distances.len();
    let mut beta = 1.0f64;
    let mut beta_min = f64::NEG_INFINITY;
    let mut beta_max = f64::INFINITY;
    let mut row = vec![0.0f64; n];

    for _ in 0..BANDWIDTH_SEARCH_ITERS {
        let mut sum_p = 0.0f64;
        let mut sum_dp = 0.0f64;
        for (j, &d) in distances.iter().enumerate() {
            if j == i {
                row[j] = 0.0;
                continue;
            }
            let p = (-beta * d).exp();
            row[j] = p;
            sum_p += p;
            sum_dp += d * p;
        }

        if sum_p <= 0.0 {
            // All mass collapsed (huge beta or identical points): fall
            // back to a uniform distribution over the other points.
            let uniform = 1.0 / (n - 1) as f64;
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = if j == i { 0.0 } else { uniform };
            }
            return row;
        }

        // Shannon entropy of the conditional distribution.
        let entropy = sum_p.ln() + beta * sum_dp / sum_p;
        let diff = entropy - target_entropy;
        if diff.abs() < ENTROPY_TOLERANCE {
            break;
        }

        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_finite() {
                (beta + beta_max) / 2.0
            } else {
                beta * 2.0
            };
        } else {
            beta_max = beta;
            beta = if beta_min.is_finite() {
                (beta + beta_min) / 2.0
            } else {
                beta / 2.0
            };
        }
    }

    let sum_p: f64 = row.iter().sum();
    if sum_p > 0.0 {
        for p in row.iter_mut() {
            *p /= sum_p;
        }
    }
    row
}
