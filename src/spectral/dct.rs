//! Orthonormal discrete cosine transform.
//!
//! `dct_ortho` is the type-II DCT and `idct_ortho` the type-III DCT, both
//! with orthonormal scaling, so `idct_ortho(dct_ortho(x)) == x` up to
//! rounding. Both are evaluated through a `2N`-point FFT.

use rustfft::{num_complex::Complex64, FftPlanner};
use std::f64::consts::PI;

/// Forward orthonormal DCT-II.
///
/// `X[k] = s(k) * sum_n x[n] * cos(pi * k * (2n + 1) / (2N))` with
/// `s(0) = sqrt(1/N)` and `s(k) = sqrt(2/N)` otherwise.
pub fn dct_ortho(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    // Even symmetric extension: x[0..N] followed by x reversed.
    let mut buffer: Vec<Complex64> = signal
        .iter()
        .chain(signal.iter().rev())
        .map(|&x| Complex64::new(x, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(2 * n);
    fft.process(&mut buffer);

    let n_f64 = n as f64;
    let first = (1.0 / n_f64).sqrt();
    let rest = (2.0 / n_f64).sqrt();

    (0..n)
        .map(|k| {
            let twiddle = Complex64::from_polar(1.0, -PI * k as f64 / (2.0 * n_f64));
            let c = (twiddle * buffer[k]).re / 2.0;
            if k == 0 {
                c * first
            } else {
                c * rest
            }
        })
        .collect()
}

/// Inverse of [`dct_ortho`] (orthonormal DCT-III).
pub fn idct_ortho(coefficients: &[f64]) -> Vec<f64> {
    let n = coefficients.len();
    if n == 0 {
        return Vec::new();
    }

    let n_f64 = n as f64;
    let first = (1.0 / n_f64).sqrt();
    let rest = (2.0 / n_f64).sqrt();

    let mut buffer = vec![Complex64::new(0.0, 0.0); 2 * n];
    for (k, &c) in coefficients.iter().enumerate() {
        let scale = if k == 0 { first } else { rest };
        let twiddle = Complex64::from_polar(1.0, PI * k as f64 / (2.0 * n_f64));
        buffer[k] = twiddle * (scale * c);
    }

    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(2 * n);
    ifft.process(&mut buffer);

    buffer.iter().take(n).map(|z| z.re).collect()
}
