use std::time::Duration as StdDuration;

use time::Duration;

/// Extension methods for signed [`time::Duration`] values.
pub trait DurationExt {
    /// Converts negative durations to zero.
    fn zero_if_negative(self) -> StdDuration;
}

impl DurationExt for Duration {
    fn zero_if_negative(self) -> StdDuration {
        StdDuration::try_from(self).unwrap_or(StdDuration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::ext::NumericalDuration;

    #[test]
    fn keeps_positive_durations() {
        assert_eq!(
            250.milliseconds().zero_if_negative(),
            StdDuration::from_millis(250)
        );
    }

    #[test]
    fn clamps_zero_and_negative_durations() {
        assert_eq!(Duration::ZERO.zero_if_negative(), StdDuration::ZERO);
        assert_eq!((-1).milliseconds().zero_if_negative(), StdDuration::ZERO);
        assert_eq!((-42).seconds().zero_if_negative(), StdDuration::ZERO);
        assert_eq!(Duration::MIN.zero_if_negative(), StdDuration::ZERO);
    }
}
