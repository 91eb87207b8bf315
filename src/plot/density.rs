//! Gaussian kernel density estimation on a regular grid.

use std::f64::consts::PI;

/// Kernel is cut off this many bandwidths from its center.
const KERNEL_CUTOFF: f64 = 4.0;

/// Silverman's rule of thumb: `0.9 · min(sd, IQR / 1.34) · n^(-1/5)`.
///
/// Falls back to the standard deviation, then `|x₀|`, then 1 when the
/// spread is zero.
pub fn silverman_bandwidth(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 1.0;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let sd = standard_deviation(&sorted);
    let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);

    let mut spread = sd.min(iqr / 1.34);
    if spread <= 0.0 {
        spread = if sd > 0.0 {
            sd
        } else if sorted[0] != 0.0 {
            sorted[0].abs()
        } else {
            1.0
        };
    }
    0.9 * spread * n.powf(-0.2)
}

fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

/// Linear-interpolated quantile of sorted data.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// `points` evenly spaced values from `lo` to `hi` inclusive.
pub fn grid(lo: f64, hi: f64, points: usize) -> Vec<f64> {
    let points = points.max(2);
    let step = (hi - lo) / (points - 1) as f64;
    (0..points)
        .map(|i| if i == points - 1 { hi } else { lo + step * i as f64 })
        .collect()
}

/// Kernel density of `values` evaluated on `grid(lo, hi, points)`.
///
/// Values are linearly binned onto the grid, then convolved with the
/// Gaussian kernel. The result is normalised by the number of finite values,
/// so mass falling outside `[lo, hi]` is lost rather than redistributed.
pub fn kde(values: &[f64], lo: f64, hi: f64, points: usize, bandwidth: f64) -> Vec<f64> {
    let points = points.max(2);
    let mut density = vec![0.0; points];
    if !(hi > lo) || !(bandwidth > 0.0) {
        return density;
    }

    let last = (points - 1) as f64;
    let step = (hi - lo) / last;
    let mut weights = vec![0.0; points];
    let mut counted = 0usize;

    for &v in values.iter().filter(|v| v.is_finite()) {
        counted += 1;
        let pos = (v - lo) / step;
        if pos < 0.0 || pos > last {
            continue;
        }
        let left = pos.floor() as usize;
        let frac = pos - left as f64;
        if left + 1 < points {
            weights[left] += 1.0 - frac;
            weights[left + 1] += frac;
        } else {
            weights[left] += 1.0;
        }
    }
    if counted == 0 {
        return density;
    }

    let radius = ((KERNEL_CUTOFF * bandwidth / step).ceil() as usize).min(points - 1);
    let kernel: Vec<f64> = (0..=radius)
        .map(|k| gaussian(k as f64 * step / bandwidth) / bandwidth)
        .collect();

    for (i, &w) in weights.iter().enumerate().filter(|(_, w)| **w > 0.0) {
        let from = i.saturating_sub(radius);
        let to = (i + radius).min(points - 1);
        for (j, d) in density.iter_mut().enumerate().take(to + 1).skip(from) {
            *d += w * kernel[i.abs_diff(j)];
        }
    }

    let n = counted as f64;
    density.iter_mut().for_each(|d| *d /= n);
    density
}

fn gaussian(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic normal sample (LCG + Box-Muller).
    fn bell(center: f64, spread: f64, n: usize) -> Vec<f64> {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..n)
            .map(|_| {
                let u1 = next().max(1e-12);
                let u2 = next();
                center + spread * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
            })
            .collect()
    }

    fn integrate(xs: &[f64], ys: &[f64]) -> f64 {
        xs.windows(2)
            .zip(ys.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
            .sum()
    }

    #[test]
    fn test_bandwidth_fallbacks() {
        assert_eq!(silverman_bandwidth(&[]), 1.0);
        // Zero spread: falls back to |x0|.
        let bw = silverman_bandwidth(&[4.0, 4.0, 4.0, 4.0]);
        assert!((bw - 0.9 * 4.0 * 4f64.powf(-0.2)).abs() < 1e-12);
        assert!(silverman_bandwidth(&[0.0]) > 0.0);
    }

    #[test]
    fn test_bandwidth_matches_rule_of_thumb() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let sd = standard_deviation(&values);
        let iqr = quantile(&values, 0.75) - quantile(&values, 0.25);
        let expected = 0.9 * sd.min(iqr / 1.34) * 100f64.powf(-0.2);
        assert!((silverman_bandwidth(&values) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_density_integrates_to_one_and_peaks_at_center() {
        let values = bell(2.0e6, 3.0e5, 5_000);
        let bw = silverman_bandwidth(&values);
        let (lo, hi) = (2.0e6 - 2.0e6 * 0.6, 2.0e6 + 2.0e6 * 0.6);
        let xs = grid(lo, hi, 512);
        let ys = kde(&values, lo, hi, 512, bw);

        let area = integrate(&xs, &ys);
        assert!((area - 1.0).abs() < 0.02, "area = {area}");

        let peak = ys
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| xs[i])
            .unwrap();
        assert!((peak - 2.0e6).abs() < 1.5e5, "peak at {peak}");
    }

    #[test]
    fn test_degenerate_inputs_give_zero_density() {
        assert!(kde(&[], 0.0, 1.0, 16, 0.1).iter().all(|&d| d == 0.0));
        assert!(kde(&[0.5], 1.0, 1.0, 16, 0.1).iter().all(|&d| d == 0.0));
        assert!(kde(&[f64::NAN], 0.0, 1.0, 16, 0.1).iter().all(|&d| d == 0.0));
        assert_eq!(kde(&[0.5], 0.0, 1.0, 0, 0.1).len(), 2);
    }

    #[test]
    fn test_grid_endpoints() {
        let xs = grid(-1.0, 1.0, 5);
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }
}
