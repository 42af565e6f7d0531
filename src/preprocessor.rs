//! VictoriaMetrics-style value preprocessing (spec §4.1): an optional,
//! always-reversible transform applied to the value stream before the XOR
//! codec sees it. Pure functions over slices — no shared state, grounded on
//! the leaves-first delta/undelta helpers real time-series compressors keep
//! separate from the bit-level codec itself.

/// Resolved scale factor actually used, recorded in the outer header so
/// decode can reverse it without guessing.
pub type ResolvedScale = u32;

/// Reverses the preprocessor's transforms in encode order, applied bottom-up:
/// unscale, then undo the counter delta.
pub fn reverse(mut values: Vec<f64>, is_counter: bool, scale_decimals: u32) -> Vec<f64> {
    if scale_decimals > 0 {
        let factor = 10f64.powi(scale_decimals as i32);
        for v in values.iter_mut() {
            *v /= factor;
        }
    }
    if is_counter {
        undo_counter_delta(&mut values);
    }
    values
}

/// Applies counter-delta (if requested) then decimal scaling (resolving
/// `auto` if requested), returning the transformed values and the scale
/// actually used.
pub fn apply(
    values: &[f64],
    is_counter: bool,
    scale_decimals: ScaleOption,
) -> (Vec<f64>, ResolvedScale) {
    let mut out = values.to_vec();
    if is_counter {
        counter_delta(&mut out);
    }

    let resolved = match scale_decimals {
        ScaleOption::Fixed(0) => 0,
        ScaleOption::Fixed(n) => n,
        ScaleOption::Auto => resolve_auto_scale(&out),
    };

    if resolved > 0 {
        let factor = 10f64.powi(resolved as i32);
        for v in out.iter_mut() {
            *v = (*v * factor).round();
        }
    }

    (out, resolved)
}

/// Caller-facing scale request: either a fixed `0..=9` digit count or
/// automatic detection (spec §4.1, capped at 6 decimal digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleOption {
    #[default]
    Auto,
    Fixed(u32),
}

const AUTO_SCALE_CAP: u32 = 6;

/// Finds the largest `n <= 6` such that every value equals its rounding to
/// `n` decimals, inspected via the decimal-string representation so float
/// drift in the comparison itself cannot produce a false negative. Falls
/// back to `0` (identity) rather than ever failing — the preprocessor never
/// errors.
fn resolve_auto_scale(values: &[f64]) -> u32 {
    for n in 0..=AUTO_SCALE_CAP {
        if values.iter().all(|v| decimal_digits_within(*v, n)) {
            return n;
        }
    }
    0
}

/// `true` if `v`, formatted with exactly `n` fractional digits, round-trips
/// back to a value equal to `v` (i.e. `v` has no more than `n` significant
/// fractional decimal digits).
fn decimal_digits_within(v: f64, n: u32) -> bool {
    if !v.is_finite() {
        // NaN/infinity pass through scaling unaffected; they never constrain
        // the chosen digit count.
        return true;
    }
    let formatted = format!("{v:.*}", n as usize);
    match formatted.parse::<f64>() {
        Ok(parsed) => parsed == v,
        Err(_) => false,
    }
}

fn counter_delta(values: &mut [f64]) {
    if values.len() < 2 {
        return;
    }
    let mut prev = values[0];
    for v in values[1..].iter_mut() {
        let cur = *v;
        *v = cur - prev;
        prev = cur;
    }
}

fn undo_counter_delta(values: &mut [f64]) {
    if values.len() < 2 {
        return;
    }
    let mut running = values[0];
    for v in values[1..].iter_mut() {
        running += *v;
        *v = running;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_delta_roundtrip_monotonic() {
        let values: Vec<f64> = (0..1000).map(|i| 1000.0 + 10.0 * i as f64).collect();
        let (encoded, scale) = apply(&values, true, ScaleOption::Fixed(0));
        assert_eq!(scale, 0);
        let decoded = reverse(encoded, true, 0);
        assert_eq!(decoded, values);
    }

    #[test]
    fn fixed_scale_roundtrips_within_half_ulp() {
        let values = vec![1.23, 4.56, -7.89, 0.0, 100.10];
        let (encoded, scale) = apply(&values, false, ScaleOption::Fixed(2));
        assert_eq!(scale, 2);
        let decoded = reverse(encoded, false, 2);
        for (a, b) in values.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 0.5 * 10f64.powi(-2), "{a} vs {b}");
        }
    }

    #[test]
    fn auto_scale_picks_minimal_exact_digit_count() {
        let values = vec![1.5, 2.25, 3.125];
        let (_, scale) = apply(&values, false, ScaleOption::Auto);
        assert_eq!(scale, 3); // 3.125 needs 3 digits
    }

    #[test]
    fn auto_scale_falls_back_to_zero_for_irrational_like_values() {
        let values = vec![std::f64::consts::PI, std::f64::consts::E];
        let (_, scale) = apply(&values, false, ScaleOption::Auto);
        assert_eq!(scale, 0);
    }

    #[test]
    fn combined_counter_and_scale_roundtrip() {
        let values: Vec<f64> = (0..50).map(|i| 1000.0 + 0.25 * i as f64).collect();
        let (encoded, scale) = apply(&values, true, ScaleOption::Fixed(2));
        let decoded = reverse(encoded, true, scale);
        for (a, b) in values.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 0.5 * 10f64.powi(-(scale as i32)));
        }
    }
}
