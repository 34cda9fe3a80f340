//! # Fast Fourier Transform (FFT) Module
//!
//! FFT helpers backing the YIN difference function. The cross term of the
//! difference function is a correlation, which is computed in the frequency
//! domain instead of with the quadratic time-domain loop.
//!
//! ## Features
//! - DC offset removal ahead of pitch estimation
//! - FFT cross-correlation using RustFFT
//! - YIN squared-difference function in O(n log n)

use rustfft::{FftPlanner, num_complex::Complex};

/// Removes the DC offset from a signal by making its average value zero.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
pub fn remove_dc_offset(signal: &mut [f64]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f64>() / len as f64;
    if avg.abs() > 1e-9 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Correlates the first `max_lag` samples of `signal` against the signal
/// itself at every lag in `0..max_lag`.
///
/// `out[tau] = Σ_{i < max_lag} signal[i] * signal[i + tau]`
///
/// Requires `2 * max_lag <= signal.len()` so the circular transform never
/// wraps around.
fn windowed_correlation(signal: &[f64], max_lag: usize) -> Vec<f64> {
    let n = signal.len();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut full: Vec<Complex<f64>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    let mut head: Vec<Complex<f64>> = signal
        .iter()
        .enumerate()
        .map(|(i, &s)| Complex::new(if i < max_lag { s } else { 0.0 }, 0.0))
        .collect();

    forward.process(&mut full);
    forward.process(&mut head);
    for (x, k) in full.iter_mut().zip(head.iter()) {
        *x *= k.conj();
    }
    inverse.process(&mut full);

    // RustFFT leaves the inverse unnormalized.
    let scale = 1.0 / n as f64;
    full.iter().take(max_lag).map(|c| c.re * scale).collect()
}

/// YIN squared-difference function for lags `0..max_lag`.
///
/// `d(tau) = Σ_{i < max_lag} (x[i] - x[i + tau])²`, expanded into two
/// energy terms (prefix sums) and the FFT correlation term.
///
/// # Panics
/// * If `2 * max_lag` exceeds the signal length
pub fn difference_function(signal: &[f64], max_lag: usize) -> Vec<f64> {
    assert!(2 * max_lag <= signal.len(), "lag range exceeds half the window");
    if max_lag == 0 {
        return Vec::new();
    }

    let mut prefix = Vec::with_capacity(signal.len() + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &s in signal {
        acc += s * s;
        prefix.push(acc);
    }

    let head_energy = prefix[max_lag];
    let correlation = windowed_correlation(signal, max_lag);

    correlation
        .iter()
        .enumerate()
        .map(|(tau, &corr)| {
            let shifted_energy = prefix[tau + max_lag] - prefix[tau];
            // Rounding in the transform can push a perfect match slightly negative.
            (head_energy + shifted_energy - 2.0 * corr).max(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn naive_difference(signal: &[f64], max_lag: usize) -> Vec<f64> {
        (0..max_lag)
            .map(|tau| {
                (0..max_lag)
                    .map(|i| {
                        let delta = signal[i] - signal[i + tau];
                        delta * delta
                    })
                    .sum()
            })
            .collect()
    }

    #[test]
    fn matches_time_domain_difference() {
        let signal: Vec<f64> = (0..256)
            .map(|i| (i as f64 * 0.3).sin() + 0.25 * (i as f64 * 1.7).cos())
            .collect();
        let fast = difference_function(&signal, 128);
        let slow = naive_difference(&signal, 128);
        for (a, b) in fast.iter().zip(slow.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_lag_is_zero() {
        let signal: Vec<f64> = (0..64).map(|i| (i as f64).sin()).collect();
        assert_abs_diff_eq!(difference_function(&signal, 32)[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn dc_offset_is_removed() {
        let mut signal = vec![1.5, 2.5, 1.5, 2.5];
        remove_dc_offset(&mut signal);
        assert_abs_diff_eq!(signal.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(signal[0], -0.5, epsilon = 1e-12);
    }
}
