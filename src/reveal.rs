//! Count-up animation for the power level reveal.

/// Easing curve over `progress` in `[0, 1]`: a slow quadratic start up to
/// 10 %, cubic acceleration to 90 % of the target by 70 % progress, then a
/// cubic ease-out.
pub fn ease(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    if p < 0.1 {
        p * p * 0.1
    } else if p < 0.7 {
        let t = (p - 0.1) / 0.6;
        0.01 + t * t * t * 0.89
    } else {
        let t = (p - 0.7) / 0.3;
        0.9 + (1.0 - (1.0 - t).powi(3)) * 0.1
    }
}

/// `count` display values climbing to `target`. Non-decreasing, and the
/// last value is always exactly `target`.
pub fn frames(target: u64, count: usize) -> Vec<u64> {
    if count == 0 {
        return Vec::new();
    }
    let steps = count.saturating_sub(1).max(1) as f64;
    let mut values: Vec<u64> = (0..count)
        .map(|i| (target as f64 * ease(i as f64 / steps)).floor() as u64)
        .map(|v| v.min(target))
        .collect();
    if let Some(last) = values.last_mut() {
        *last = target;
    }
    values
}

/// Applies display jitter to an intermediate frame, never going below zero.
pub fn jitter(value: u64, offset: i64) -> u64 {
    value.saturating_add_signed(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_knots() {
        assert_eq!(ease(0.0), 0.0);
        assert!((ease(0.1) - 0.01).abs() < 1e-9);
        assert!((ease(0.7) - 0.9).abs() < 1e-9);
        assert!((ease(1.0) - 1.0).abs() < 1e-9);
        assert_eq!(ease(2.0), ease(1.0));
    }

    #[test]
    fn test_ease_is_monotonic() {
        let mut previous = 0.0;
        for i in 0..=1000 {
            let value = ease(i as f64 / 1000.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_frames_end_at_target() {
        let values = frames(123_456, 60);
        assert_eq!(values.len(), 60);
        assert_eq!(values[0], 0);
        assert_eq!(*values.last().unwrap(), 123_456);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(frames(10, 1), vec![10]);
        assert!(frames(10, 0).is_empty());
    }

    #[test]
    fn test_jitter_floors_at_zero() {
        assert_eq!(jitter(3, -5), 0);
        assert_eq!(jitter(100, 4), 104);
    }
}
