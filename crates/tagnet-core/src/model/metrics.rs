//! Classification metrics over probability and label matrices.

use ndarray::{ArrayView1, ArrayView2, Axis};

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logs.
pub const EPSILON: f32 = 1e-7;

/// Index of the largest value; ties go to the first occurrence.
pub fn argmax(row: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in row.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first entry equal to 1 in a multi-hot row.
///
/// Evaluation treats this as the single ground-truth class even when a row
/// carries several labels.
pub fn ground_truth_index(row: ArrayView1<f32>) -> Option<usize> {
    row.iter().position(|&v| v == 1.0)
}

/// Fraction of rows whose predicted argmax equals the label argmax.
pub fn categorical_accuracy(predictions: ArrayView2<f32>, labels: ArrayView2<f32>) -> f32 {
    let n = predictions.nrows();
    if n == 0 {
        return 0.0;
    }
    let correct = predictions
        .axis_iter(Axis(0))
        .zip(labels.axis_iter(Axis(0)))
        .filter(|(p, y)| argmax(p.view()) == argmax(y.view()))
        .count();
    correct as f32 / n as f32
}

/// Mean over rows of `-Σ y · ln(p)`.
pub fn categorical_crossentropy(predictions: ArrayView2<f32>, labels: ArrayView2<f32>) -> f32 {
    let n = predictions.nrows();
    if n == 0 {
        return 0.0;
    }
    let total: f32 = predictions
        .iter()
        .zip(labels.iter())
        .filter(|(_, y)| **y != 0.0)
        .map(|(p, y)| -y * p.clamp(EPSILON, 1.0 - EPSILON).ln())
        .sum();
    total / n as f32
}
