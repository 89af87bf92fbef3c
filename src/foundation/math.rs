/// Linear interpolation between `a` and `b` at parameter `t` in [0,1].
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Percentile of `values` with linear interpolation between closest ranks
/// (the numpy definition): rank = q/100 * (n-1), interpolated between the
/// surrounding order statistics.
///
/// `q` must be in [0,100] and `values` non-empty; callers uphold both.
pub(crate) fn percentile(values: &[f32], q: f32) -> f32 {
    debug_assert!(!values.is_empty());
    debug_assert!((0.0..=100.0).contains(&q));

    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (q / 100.0) * ((n - 1) as f32);
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let frac = rank - (lower as f32);
    lerp(sorted[lower], sorted[upper], frac)
}

/// Quantize a [0,1] channel value to u8 with rounding.
pub(crate) fn channel_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
