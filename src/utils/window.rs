//! Window helpers shared by the smoothers and rolling statistics.

/// Trailing moving average over complete windows only.
///
/// Output has `series.len() - window + 1` entries; entry `i` averages
/// `series[i..i + window]`. Empty if the window does not fit.
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    if window == 0 || window > n {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(n - window + 1);
    let mut sum: f64 = series[..window].iter().sum();
    result.push(sum / window as f64);
    for i in window..n {
        sum += series[i] - series[i - window];
        result.push(sum / window as f64);
    }
    result
}

/// Bounds `[start, end)` of a centred window of width `window` around `i`.
///
/// Returns `None` when the window would run past either end of a series of
/// length `n`. Even widths put the extra sample on the left, the way pandas
/// centres rolling windows.
pub fn centered_bounds(i: usize, n: usize, window: usize) -> Option<(usize, usize)> {
    if window == 0 {
        return None;
    }
    let before = window / 2;
    let after = window - before - 1;
    if i < before || i + after >= n {
        return None;
    }
    Some((i - before, i + after + 1))
}
