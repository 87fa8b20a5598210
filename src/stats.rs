use crate::error::{WealthError, WealthResult};
use serde::{Deserialize, Serialize};

/// Streaming mean and variance (Welford's algorithm).
#[derive(Debug, Clone)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn mean(&self) -> f64 {
        if self.n_vals == 0 {
            return f64::NAN;
        }
        self.mean
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: self.mean(),
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Percentile `p` (in `[0, 100]`) of already sorted values.
///
/// Linear interpolation between the order statistics around the
/// position `p / 100 * (n - 1)`. `sorted` must not be empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        (sorted[lower] + w * (sorted[upper] - sorted[lower])).min(sorted[upper])
    }
}

/// One bin of a [`Histogram`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    /// Share of all binned values (`count / total`).
    pub fraction: f64,
}

/// Equal-width histogram over a closed range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Bin `vals` into `n_bins` equal-width bins spanning `[lower, upper]`.
    ///
    /// The last bin is closed on the right. Values outside the range are
    /// clamped into the first or last bin; NaN values are not counted but
    /// still count towards the total. A zero-width range collapses to a
    /// single bin holding every value.
    ///
    /// # Errors
    /// Returns an error if `vals` is empty, `n_bins` is zero, or the range
    /// bounds are not finite and ordered.
    pub fn new(vals: &[f64], lower: f64, upper: f64, n_bins: usize) -> WealthResult<Self> {
        if vals.is_empty() {
            return Err(WealthError::EmptyInput("no values to bin"));
        }
        if n_bins == 0 {
            return Err(WealthError::InvalidParameter {
                name: "n_bins",
                reason: "number of bins must be at least 1".to_string(),
            });
        }
        if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
            return Err(WealthError::InvalidParameter {
                name: "range",
                reason: format!("range must be finite and ordered, but is [{lower}, {upper}]"),
            });
        }

        let total = vals.len() as f64;

        let width = upper - lower;
        if width == 0.0 {
            let count = vals.iter().filter(|val| !val.is_nan()).count();
            let bins = vec![Bin {
                lower,
                upper,
                count,
                fraction: count as f64 / total,
            }];
            return Ok(Self { bins });
        }

        let step = width / n_bins as f64;
        let mut counts = vec![0; n_bins];
        for &val in vals {
            if val.is_nan() {
                continue;
            }
            // Saturating float-to-int cast clamps out-of-range values.
            let i_bin = (((val - lower) / step).floor().max(0.0) as usize).min(n_bins - 1);
            counts[i_bin] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i_bin, count)| Bin {
                lower: lower + i_bin as f64 * step,
                upper: if i_bin + 1 == n_bins {
                    upper
                } else {
                    lower + (i_bin + 1) as f64 * step
                },
                count,
                fraction: count as f64 / total,
            })
            .collect();

        Ok(Self { bins })
    }
}
