use std::time::{Duration, Instant};

/// Remaining time at or below this threshold puts the timer surface into its
/// warning state.
pub const WARNING_THRESHOLD_SECS: u64 = 10 * 60;

/// Wall-clock countdown anchored to an absolute deadline.
///
/// Every query recomputes the remainder from `now` against the deadline
/// instead of decrementing a counter, so accuracy is unaffected by tick
/// drift or a suspended event loop. Reaching zero is a one-way edge: the
/// owner locks the session and drops the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    ends_at: Instant,
}

impl Countdown {
    /// Starts a countdown of `total_secs` measured from `now`. Starting a
    /// new countdown replaces any previous one by construction: the app owns
    /// at most one `Countdown` value at a time.
    pub fn start(total_secs: u64, now: Instant) -> Self {
        Self {
            ends_at: now + Duration::from_secs(total_secs),
        }
    }

    /// Whole seconds left, clamped at zero.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.ends_at.saturating_duration_since(now).as_secs()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining_secs(now) == 0
    }

    /// True once remaining time is at or below ten minutes. Reverts if a
    /// later `start` resets the deadline above the threshold.
    pub fn is_warning(&self, now: Instant) -> bool {
        self.remaining_secs(now) <= WARNING_THRESHOLD_SECS
    }

    /// Zero-padded `MM:SS` for the timer surface.
    pub fn display(&self, now: Instant) -> String {
        fmt_mm_ss(self.remaining_secs(now))
    }
}

pub fn fmt_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_derives_from_deadline() {
        let t0 = Instant::now();
        let cd = Countdown::start(90, t0);

        assert_eq!(cd.remaining_secs(t0), 90);
        assert_eq!(cd.remaining_secs(t0 + Duration::from_secs(30)), 60);
        // Skipped ticks do not matter: only the query instant does
        assert_eq!(cd.remaining_secs(t0 + Duration::from_secs(89)), 1);
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let t0 = Instant::now();
        let cd = Countdown::start(5, t0);

        assert_eq!(cd.remaining_secs(t0 + Duration::from_secs(5)), 0);
        assert_eq!(cd.remaining_secs(t0 + Duration::from_secs(500)), 0);
        assert!(cd.is_expired(t0 + Duration::from_secs(5)));
        assert!(!cd.is_expired(t0 + Duration::from_secs(4)));
    }

    #[test]
    fn warning_at_ten_minutes() {
        let t0 = Instant::now();
        let cd = Countdown::start(60 * 60, t0);

        assert!(!cd.is_warning(t0));
        assert!(!cd.is_warning(t0 + Duration::from_secs(49 * 60 + 59)));
        assert!(cd.is_warning(t0 + Duration::from_secs(50 * 60)));
        assert!(cd.is_warning(t0 + Duration::from_secs(60 * 60)));
    }

    #[test]
    fn restart_replaces_deadline() {
        let t0 = Instant::now();
        let mut cd = Countdown::start(30, t0);
        assert!(cd.is_warning(t0));

        cd = Countdown::start(30 * 60, t0);
        assert!(!cd.is_warning(t0));
        assert_eq!(cd.remaining_secs(t0), 30 * 60);
    }

    #[test]
    fn mm_ss_is_zero_padded() {
        assert_eq!(fmt_mm_ss(0), "00:00");
        assert_eq!(fmt_mm_ss(9), "00:09");
        assert_eq!(fmt_mm_ss(70), "01:10");
        assert_eq!(fmt_mm_ss(1800), "30:00");
        assert_eq!(fmt_mm_ss(3600), "60:00");
    }

    #[test]
    fn display_formats_remaining() {
        let t0 = Instant::now();
        let cd = Countdown::start(1800, t0);
        assert_eq!(cd.display(t0), "30:00");
        assert_eq!(cd.display(t0 + Duration::from_secs(61)), "28:59");
        assert_eq!(cd.display(t0 + Duration::from_secs(9999)), "00:00");
    }
}
