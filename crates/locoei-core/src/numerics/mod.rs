use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NumericTolerance {
    #[serde(rename = "absTol")]
    pub abs_tol: f64,
    #[serde(rename = "relTol")]
    pub rel_tol: f64,
}

impl NumericTolerance {
    /// `|actual - expected| <= abs_tol + rel_tol * |expected|`, the same test
    /// `numpy.allclose` applies with its default tolerances.
    pub const ALLCLOSE: NumericTolerance = NumericTolerance {
        abs_tol: 1.0e-8,
        rel_tol: 1.0e-5,
    };

    pub const SHARE_SUM: NumericTolerance = NumericTolerance {
        abs_tol: 1.0e-9,
        rel_tol: 0.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceComparison {
    pub abs_diff: f64,
    pub passes: bool,
}

pub fn compare_with_tolerance(
    expected: f64,
    actual: f64,
    tolerance: NumericTolerance,
) -> ToleranceComparison {
    let abs_diff = (actual - expected).abs();
    let passes = abs_diff <= tolerance.abs_tol + tolerance.rel_tol * expected.abs();
    ToleranceComparison { abs_diff, passes }
}

pub fn is_close(expected: f64, actual: f64, tolerance: NumericTolerance) -> bool {
    compare_with_tolerance(expected, actual, tolerance).passes
}

pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

pub fn kahan_add(sum: &mut f64, compensation: &mut f64, value: f64) {
    let adjusted = value - *compensation;
    let next = *sum + adjusted;
    *compensation = (next - *sum) - adjusted;
    *sum = next;
}

pub fn kahan_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for value in values {
        kahan_add(&mut sum, &mut compensation, value);
    }
    sum
}

/// Running arithmetic mean used when collapsing rate columns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}
