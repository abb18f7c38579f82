//! The transform engine: pure functions over aligned observation values.
//!
//! Input is a value slice sorted by its (external) date index, possibly
//! containing nulls. Output always has the same length; positions inside a
//! transformation's lookback are null. Lookback is counted in observations
//! on whatever index the caller aligned, the engine never resamples.

use crate::models::transformation::Transformation;

/// Applies `tag` to `values`, preserving length and index positions.
pub fn apply(tag: Transformation, values: &[Option<f64>]) -> Vec<Option<f64>> {
    match tag {
        Transformation::None => values.to_vec(),
        Transformation::Diff => offset_map(values, 1, |curr, prev| Some(curr - prev)),
        Transformation::PctChange => offset_map(values, 1, ratio_minus_one),
        Transformation::MoM => offset_map(values, 1, |c, p| ratio_minus_one(c, p).map(|v| v * 100.0)),
        Transformation::QoQ => offset_map(values, 3, |c, p| ratio_minus_one(c, p).map(|v| v * 100.0)),
        Transformation::YoY => offset_map(values, 12, |c, p| ratio_minus_one(c, p).map(|v| v * 100.0)),
        Transformation::Log => values.iter().map(|v| v.and_then(safe_ln)).collect(),
        Transformation::LogDiff => offset_map(values, 1, |curr, prev| {
            Some(safe_ln(curr)? - safe_ln(prev)?)
        }),
    }
}

fn ratio_minus_one(curr: f64, prev: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some(curr / prev - 1.0)
    }
}

fn safe_ln(x: f64) -> Option<f64> {
    if x > 0.0 { Some(x.ln()) } else { None }
}

/// Pairs each value with the one `lookback` positions earlier and applies
/// `f`. Null if either operand is null, or if `f` declines the pair.
fn offset_map<F>(values: &[Option<f64>], lookback: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if i < lookback {
                return None;
            }
            let curr = (*v)?;
            let prev = values[i - lookback].as_ref().copied()?;
            f(curr, prev)
        })
        .collect()
}
