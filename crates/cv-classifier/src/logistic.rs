//! Multinomial logistic regression fitted by Newton's method.
//!
//! Objective: `sum_i -log softmax(W x_i + b)[y_i] + 1/(2C) * ||W||^2`, intercepts
//! unpenalized, inputs used as-is (no scaling). With eight features and at most
//! four classes the Hessian is at most 36x36, so a dense Cholesky solve per
//! iteration is cheap and converges in a handful of steps.

use serde::{Deserialize, Serialize};

use cv_core::config::TrainingConfig;
use cv_core::{FeatureVector, Result, TriageError};

const DIM: usize = FeatureVector::DIM;
const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialLogit {
    classes: usize,
    dim: usize,
    /// Row-major `classes x (dim + 1)`; the last entry of each row is the intercept.
    coefficients: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    pub iterations: usize,
    pub loss: f64,
    pub converged: bool,
}

impl MultinomialLogit {
    pub fn fit(
        samples: &[[f64; DIM]],
        targets: &[usize],
        classes: usize,
        cfg: &TrainingConfig,
    ) -> Result<(Self, FitSummary)> {
        if samples.is_empty() {
            return Err(TriageError::Configuration("cannot fit on an empty dataset".into()));
        }
        if samples.len() != targets.len() {
            return Err(TriageError::schema(format!(
                "{} samples but {} targets",
                samples.len(),
                targets.len()
            )));
        }
        if classes < 2 {
            return Err(TriageError::Configuration(format!(
                "need at least 2 distinct urgency labels to fit, got {classes}"
            )));
        }
        if let Some(bad) = targets.iter().find(|&&t| t >= classes) {
            return Err(TriageError::schema(format!("target {bad} outside 0..{classes}")));
        }
        if !(cfg.inverse_regularization.is_finite() && cfg.inverse_regularization > 0.0) {
            return Err(TriageError::Configuration(format!(
                "inverse regularization must be positive, got {}",
                cfg.inverse_regularization
            )));
        }

        let lambda = 1.0 / cfg.inverse_regularization;
        let n = samples.len() as f64;
        let mut model = Self {
            classes,
            dim: DIM,
            coefficients: vec![0.0; classes * (DIM + 1)],
        };
        let mut loss = model.objective(samples, targets, lambda);
        let mut summary = FitSummary { iterations: 0, loss, converged: false };

        for iter in 0..cfg.max_iter {
            let (grad, hess) = model.gradient_hessian(samples, targets, lambda);
            let grad_norm = grad.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            if grad_norm / n <= cfg.tolerance {
                summary.converged = true;
                break;
            }

            let mut direction = solve_damped(hess, &grad).unwrap_or_else(|| grad.clone());
            let mut slope = dot(&grad, &direction);
            if !(slope.is_finite() && slope > 0.0) {
                direction = grad.clone();
                slope = dot(&grad, &grad);
            }

            let mut t = 1.0;
            let mut accepted = false;
            while t >= MIN_STEP {
                let candidate = model.stepped(&direction, t);
                let candidate_loss = candidate.objective(samples, targets, lambda);
                if candidate_loss.is_finite() && candidate_loss <= loss - ARMIJO * t * slope {
                    model = candidate;
                    loss = candidate_loss;
                    accepted = true;
                    break;
                }
                t *= 0.5;
            }

            summary.iterations = iter + 1;
            summary.loss = loss;
            if !accepted {
                // No descent possible at machine precision: we are at the optimum.
                summary.converged = true;
                break;
            }
        }

        Ok((model, summary))
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Shape and finiteness check for models loaded from disk.
    pub fn validate(&self) -> Result<()> {
        if self.dim != DIM {
            return Err(TriageError::schema(format!(
                "model expects {} features, schema has {DIM}",
                self.dim
            )));
        }
        if self.coefficients.len() != self.classes * (self.dim + 1) {
            return Err(TriageError::Storage("model coefficient table has wrong shape".into()));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(TriageError::Storage("model coefficients are not finite".into()));
        }
        Ok(())
    }

    pub fn decision_function(&self, x: &[f64; DIM]) -> Vec<f64> {
        let p = self.dim + 1;
        (0..self.classes)
            .map(|k| {
                let row = &self.coefficients[k * p..(k + 1) * p];
                row[..DIM].iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f64>() + row[DIM]
            })
            .collect()
    }

    pub fn predict_proba(&self, x: &[f64; DIM]) -> Vec<f64> {
        softmax(&self.decision_function(x))
    }

    /// Index of the highest-scoring class; ties go to the lower index.
    pub fn predict(&self, x: &[f64; DIM]) -> usize {
        let scores = self.decision_function(x);
        let mut best = 0;
        for (k, s) in scores.iter().enumerate().skip(1) {
            if *s > scores[best] {
                best = k;
            }
        }
        best
    }

    fn objective(&self, samples: &[[f64; DIM]], targets: &[usize], lambda: f64) -> f64 {
        let data: f64 = samples
            .iter()
            .zip(targets)
            .map(|(x, &y)| {
                let z = self.decision_function(x);
                log_sum_exp(&z) - z[y]
            })
            .sum();
        data + 0.5 * lambda * self.penalized().map(|w| w * w).sum::<f64>()
    }

    fn gradient_hessian(&self, samples: &[[f64; DIM]], targets: &[usize], lambda: f64) -> (Vec<f64>, Vec<f64>) {
        let k_count = self.classes;
        let p = DIM + 1;
        let size = k_count * p;
        let mut grad = vec![0.0; size];
        let mut hess = vec![0.0; size * size];

        for (x, &y) in samples.iter().zip(targets) {
            let probs = self.predict_proba(x);
            let mut xa = [1.0; DIM + 1];
            xa[..DIM].copy_from_slice(x);

            for k in 0..k_count {
                let residual = probs[k] - if k == y { 1.0 } else { 0.0 };
                for j in 0..p {
                    grad[k * p + j] += residual * xa[j];
                }
                for l in 0..k_count {
                    let w = probs[k] * (if k == l { 1.0 } else { 0.0 } - probs[l]);
                    if w == 0.0 {
                        continue;
                    }
                    for j in 0..p {
                        let base = (k * p + j) * size + l * p;
                        let wx = w * xa[j];
                        for m in 0..p {
                            hess[base + m] += wx * xa[m];
                        }
                    }
                }
            }
        }

        for k in 0..k_count {
            for j in 0..DIM {
                let idx = k * p + j;
                grad[idx] += lambda * self.coefficients[idx];
                hess[idx * size + idx] += lambda;
            }
        }
        (grad, hess)
    }

    fn stepped(&self, direction: &[f64], t: f64) -> Self {
        Self {
            classes: self.classes,
            dim: self.dim,
            coefficients: self
                .coefficients
                .iter()
                .zip(direction)
                .map(|(c, d)| c - t * d)
                .collect(),
        }
    }

    fn penalized(&self) -> impl Iterator<Item = f64> + '_ {
        let p = self.dim + 1;
        self.coefficients
            .chunks(p)
            .flat_map(|row| row[..row.len() - 1].iter().copied())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn log_sum_exp(z: &[f64]) -> f64 {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max + z.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Newton direction `H^-1 g`. The intercepts are unpenalized and softmax is
/// shift-invariant, so `H` is only semi-definite; a small ridge is added and
/// grown until the Cholesky factorization succeeds.
fn solve_damped(hess: Vec<f64>, grad: &[f64]) -> Option<Vec<f64>> {
    let n = grad.len();
    let max_diag = (0..n).map(|i| hess[i * n + i].abs()).fold(1.0_f64, f64::max);
    let mut ridge = 1e-6 * max_diag;
    for _ in 0..12 {
        let mut a = hess.clone();
        for i in 0..n {
            a[i * n + i] += ridge;
        }
        if let Some(x) = cholesky_solve(a, grad, n) {
            return Some(x);
        }
        ridge *= 10.0;
    }
    None
}

fn cholesky_solve(mut a: Vec<f64>, b: &[f64], n: usize) -> Option<Vec<f64>> {
    for j in 0..n {
        let mut d = a[j * n + j];
        for k in 0..j {
            d -= a[j * n + k] * a[j * n + k];
        }
        if !(d.is_finite() && d > 0.0) {
            return None;
        }
        let d = d.sqrt();
        a[j * n + j] = d;
        for i in (j + 1)..n {
            let mut s = a[i * n + j];
            for k in 0..j {
                s -= a[i * n + k] * a[j * n + k];
            }
            a[i * n + j] = s / d;
        }
    }

    let mut y = b.to_vec();
    for i in 0..n {
        let mut s = y[i];
        for k in 0..i {
            s -= a[i * n + k] * y[k];
        }
        y[i] = s / a[i * n + i];
    }
    for i in (0..n).rev() {
        let mut s = y[i];
        for k in (i + 1)..n {
            s -= a[k * n + i] * y[k];
        }
        y[i] = s / a[i * n + i];
    }
    Some(y)
}
