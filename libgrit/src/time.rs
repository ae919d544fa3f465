use std::fmt::{self, Display, Formatter};

/// a point in time plus the offset-from-UTC it should be rendered with,
/// matching the `<unix-ts> <±HHMM>` pair in a commit's author/committer
/// lines (§3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    /// offset from UTC in minutes, east positive
    pub offset_minutes: i32,
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.offset_minutes >= 0 { '+' } else { '-' };
        let abs = self.offset_minutes.abs();
        write!(f, "{} {}{:02}{:02}", self.seconds, sign, abs / 60, abs % 60)
    }
}

/// seam for injecting the wall clock, so commit identity is reproducible
/// under test without a global time source
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// the host's current local wall time and UTC offset
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let now = chrono::Local::now();
        Timestamp { seconds: now.timestamp(), offset_minutes: now.offset().local_minus_utc() / 60 }
    }
}

/// a clock that always returns the same instant, used by tests that need a
/// deterministic commit identity
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positive_offset() {
        let ts = Timestamp { seconds: 1700000000, offset_minutes: 0 };
        assert_eq!(ts.to_string(), "1700000000 +0000");
    }

    #[test]
    fn formats_negative_offset() {
        let ts = Timestamp { seconds: 1700000000, offset_minutes: -330 };
        assert_eq!(ts.to_string(), "1700000000 -0530");
    }
}
