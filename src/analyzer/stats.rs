//! Small numeric helpers shared by the KPI builders.

/// Arithmetic mean. Returns 0.0 if the slice is empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Whole-number percentage, 0 when the base is empty.
pub fn pct_rounded(count: usize, base: usize) -> u32 {
    if base == 0 {
        0
    } else {
        (count as f64 / base as f64 * 100.0).round() as u32
    }
}

/// Percentage with one decimal, 0.0 when the base is empty.
pub fn pct1(count: usize, base: usize) -> f64 {
    if base == 0 {
        0.0
    } else {
        round1(count as f64 / base as f64 * 100.0)
    }
}
