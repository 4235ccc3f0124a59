//! Ridge and L2-logistic regression by full-batch gradient descent.
//!
//! Weights start at zero and gradients are averaged over the batch, so a fit
//! is fully determined by its inputs and hyperparameters. The first weight is
//! the bias and is never penalised.

use serde::{Deserialize, Serialize};

use crate::config::GradientDescentParams;

pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn dot(w: &[f64], x: &[f64]) -> f64 {
    w.iter().zip(x).map(|(a, b)| a * b).sum()
}

/// Dense linear weight vector, bias first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
}

impl LinearModel {
    pub fn zeros(dim: usize) -> Self {
        Self {
            weights: vec![0.0; dim],
        }
    }

    /// `w · x`; the logit for a classifier.
    pub fn score(&self, x: &[f64]) -> f64 {
        dot(&self.weights, x)
    }

    pub fn probability(&self, x: &[f64]) -> f64 {
        sigmoid(self.score(x))
    }

    fn l2_step(&mut self, grad: &mut [f64], params: &GradientDescentParams) {
        for (g, w) in grad.iter_mut().zip(&self.weights).skip(1) {
            *g += params.l2 * w;
        }
        for (w, g) in self.weights.iter_mut().zip(grad.iter()) {
            *w -= params.learning_rate * g;
        }
    }
}

/// Ridge regression: minimises `mean((w·x - y)^2) / 2 + (l2 / 2) * |w[1..]|^2`.
pub fn fit_ridge(xs: &[Vec<f64>], ys: &[f64], dim: usize, params: &GradientDescentParams) -> LinearModel {
    let mut model = LinearModel::zeros(dim);
    if xs.is_empty() {
        return model;
    }
    let n = xs.len() as f64;

    for _ in 0..params.epochs {
        let mut grad = vec![0.0; dim];
        for (x, y) in xs.iter().zip(ys) {
            let residual = model.score(x) - y;
            for (g, xj) in grad.iter_mut().zip(x) {
                *g += residual * xj;
            }
        }
        grad.iter_mut().for_each(|g| *g /= n);
        model.l2_step(&mut grad, params);
    }
    model
}

/// Positive-class weight `neg / pos`, or 1 when either class is absent.
pub fn positive_class_weight(labels: &[bool]) -> f64 {
    let positives = labels.iter().filter(|l| **l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        1.0
    } else {
        negatives as f64 / positives as f64
    }
}

/// Class-balanced L2-logistic regression.
pub fn fit_logistic(xs: &[Vec<f64>], labels: &[bool], dim: usize, params: &GradientDescentParams) -> LinearModel {
    let mut model = LinearModel::zeros(dim);
    if xs.is_empty() {
        return model;
    }
    let n = xs.len() as f64;
    let pos_weight = positive_class_weight(labels);

    for _ in 0..params.epochs {
        let mut grad = vec![0.0; dim];
        for (x, &label) in xs.iter().zip(labels) {
            let (y, weight) = if label { (1.0, pos_weight) } else { (0.0, 1.0) };
            let err = weight * (model.probability(x) - y);
            for (g, xj) in grad.iter_mut().zip(x) {
                *g += err * xj;
            }
        }
        grad.iter_mut().for_each(|g| *g /= n);
        model.l2_step(&mut grad, params);
    }
    model
}
