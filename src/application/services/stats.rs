//! Acceptance statistics over simulation results.

use crate::domain::EvaluationOutcome;

/// 1.0 for an accepted offer, 0.0 otherwise.
pub fn outcome_value(outcome: EvaluationOutcome) -> f64 {
    if outcome.is_accepted() {
        1.0
    } else {
        0.0
    }
}

/// Mean and population standard deviation over each full sliding window.
///
/// Yields `len - window + 1` points; a zero window or one longer than the
/// sequence yields nothing.
pub fn moving_mean_std(sequence: &[f64], window: usize) -> (Vec<f64>, Vec<f64>) {
    if window == 0 || window > sequence.len() {
        return (Vec::new(), Vec::new());
    }

    let n = window as f64;
    sequence
        .windows(window)
        .map(|w| {
            let mean = w.iter().sum::<f64>() / n;
            let variance = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        })
        .unzip()
}
