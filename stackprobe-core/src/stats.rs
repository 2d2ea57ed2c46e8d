//! Trend statistics for long-run degradation analysis.
//!
//! Performance and resource series are noisy and rarely normal, so the
//! summarizer leans on non-parametric tools: the Mann-Kendall test for
//! monotonic trend and the Theil-Sen estimator for a robust slope.

/// Two-sided Mann-Kendall p-value for a monotonic trend.
///
/// Compares all pairs (i < j) and counts upward vs downward steps, with tie
/// correction for repeated values and a continuity correction on the z score.
/// Returns NaN when fewer than 3 non-NaN points remain.
pub fn mann_kendall_pvalue(values: &[f64]) -> f64 {
    let y: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = y.len();
    if n < 3 {
        return f64::NAN;
    }

    let mut s: i64 = 0;
    for i in 0..n - 1 {
        for j in (i + 1)..n {
            let d = y[j] - y[i];
            if d > 0.0 {
                s += 1;
            } else if d < 0.0 {
                s -= 1;
            }
        }
    }

    // Tie correction over groups of equal values
    let mut sorted = y.clone();
    sorted.sort_by(f64::total_cmp);
    let mut tie_term = 0.0;
    let mut run = 1usize;
    for k in 1..=n {
        if k < n && sorted[k] == sorted[k - 1] {
            run += 1;
        } else {
            let t = run as f64;
            tie_term += t * (t - 1.0) * (2.0 * t + 5.0);
            run = 1;
        }
    }

    let nf = n as f64;
    let var_s = (nf * (nf - 1.0) * (2.0 * nf + 5.0) - tie_term) / 18.0;
    if var_s <= 0.0 {
        return 1.0;
    }

    let z = if s > 0 {
        (s as f64 - 1.0) / var_s.sqrt()
    } else if s < 0 {
        (s as f64 + 1.0) / var_s.sqrt()
    } else {
        0.0
    };

    2.0 * (1.0 - normal_cdf(z.abs()))
}

/// Theil-Sen slope: the median of all pairwise slopes.
///
/// Robust to outliers; a few spikes do not dominate the estimate. Pairs with
/// NaN coordinates or zero x-distance are skipped. Returns NaN with fewer
/// than 2 valid points or no valid pairs.
pub fn theil_sen_slope(y: &[f64], x: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(xv, yv)| !xv.is_nan() && !yv.is_nan())
        .map(|(&xv, &yv)| (xv, yv))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let mut slopes = Vec::with_capacity(pairs.len() * (pairs.len() - 1) / 2);
    for i in 0..pairs.len() - 1 {
        for j in (i + 1)..pairs.len() {
            let dx = pairs[j].0 - pairs[i].0;
            if dx != 0.0 {
                slopes.push((pairs[j].1 - pairs[i].1) / dx);
            }
        }
    }

    if slopes.is_empty() {
        return f64::NAN;
    }
    slopes.sort_by(f64::total_cmp);
    median_of_sorted(&slopes)
}

/// Quantile with linear interpolation (matches the conventional definition
/// used by numpy/pandas). `q` in [0, 1]. NaN values are filtered out first;
/// returns NaN on an empty series.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return v[lo];
    }
    let frac = pos - lo as f64;
    v[lo] + (v[hi] - v[lo]) * frac
}

/// Median of a series (NaN-filtered).
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Standard normal CDF via the Abramowitz-Stegun erf approximation
/// (formula 7.1.26, absolute error below 1.5e-7).
fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erf_known_values() {
        assert!((erf(0.0)).abs() < 1e-7);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
        assert!((erf(3.0) - 0.999_977_91).abs() < 1e-6);
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
    }

    #[test]
    fn test_mann_kendall_monotonic_series() {
        let rising: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let p = mann_kendall_pvalue(&rising);
        assert!(p < 0.001, "strictly rising series must have tiny p, got {}", p);
    }

    #[test]
    fn test_mann_kendall_flat_series() {
        // All ties: variance collapses, p-value saturates at 1
        let flat = vec![5.0; 20];
        assert_eq!(mann_kendall_pvalue(&flat), 1.0);
    }

    #[test]
    fn test_mann_kendall_short_series_is_nan() {
        assert!(mann_kendall_pvalue(&[1.0, 2.0]).is_nan());
        assert!(mann_kendall_pvalue(&[1.0, f64::NAN, 2.0]).is_nan());
    }

    #[test]
    fn test_theil_sen_exact_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        assert!((theil_sen_slope(&y, &x) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_theil_sen_resists_outlier() {
        let x: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let mut y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        y[5] = 1000.0;
        let slope = theil_sen_slope(&y, &x);
        assert!((slope - 2.0).abs() < 0.5, "outlier should not dominate, got {}", slope);
    }

    #[test]
    fn test_theil_sen_degenerate() {
        assert!(theil_sen_slope(&[1.0], &[0.0]).is_nan());
        assert!(theil_sen_slope(&[1.0, 2.0], &[3.0, 3.0]).is_nan());
    }

    #[test]
    fn test_quantile_interpolation() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&v, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile(&v, 1.0) - 4.0).abs() < 1e-12);
        // p95 of 1..=100
        let big: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        assert!((quantile(&big, 0.95) - 95.05).abs() < 1e-9);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(median(&[]).is_nan());
    }
}
