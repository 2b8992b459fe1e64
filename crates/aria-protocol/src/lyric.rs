//! Lyric timestamp sanitization.
//!
//! Lyric sources are not trustworthy about timing: negative offsets, NaN,
//! and absurdly large values all show up in the wild. The companion expects
//! plain non-negative integer milliseconds that survive a JavaScript number,
//! so every timestamp is clamped here before it reaches the wire.

/// Largest timestamp the companion can represent exactly (2^53 - 1).
pub const MAX_SAFE_TIME: u64 = 9_007_199_254_740_991;

/// Clamp a raw timestamp into `[0, MAX_SAFE_TIME]` integer milliseconds.
///
/// NaN and negative values map to 0; the fraction is truncated.
pub fn clamp_time(ms: f64) -> u64 {
    if ms.is_nan() || ms <= 0.0 {
        return 0;
    }
    let truncated = ms.trunc();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    if truncated >= MAX_SAFE_TIME as f64 {
        MAX_SAFE_TIME
    } else {
        truncated as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_times_clamp_to_zero() {
        assert_eq!(clamp_time(-1.0), 0);
        assert_eq!(clamp_time(-0.0), 0);
        assert_eq!(clamp_time(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn nan_clamps_to_zero() {
        assert_eq!(clamp_time(f64::NAN), 0);
    }

    #[test]
    fn fractions_truncate_toward_zero() {
        assert_eq!(clamp_time(0.9), 0);
        assert_eq!(clamp_time(1234.999), 1234);
    }

    #[test]
    fn huge_times_clamp_to_max_safe() {
        assert_eq!(clamp_time(1e300), MAX_SAFE_TIME);
        assert_eq!(clamp_time(f64::INFINITY), MAX_SAFE_TIME);
    }

    #[test]
    fn ordinary_times_pass_through() {
        assert_eq!(clamp_time(0.0), 0);
        assert_eq!(clamp_time(42.0), 42);
        assert_eq!(clamp_time(183_000.0), 183_000);
    }
}
