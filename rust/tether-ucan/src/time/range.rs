//! Validity windows.

use std::fmt;

/// A `[not_before, expiration]` window in unix seconds.
///
/// `None` leaves that end open. For a single token the upper bound is its
/// `exp`; for a delegation chain it is the intersection of every token on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    /// Earliest valid time.
    pub not_before: Option<u64>,
    /// Latest valid time.
    pub expiration: Option<u64>,
}

impl TimeRange {
    /// An unbounded time range (no constraints).
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            not_before: None,
            expiration: None,
        }
    }

    /// Creates a time range from optional bounds.
    #[must_use]
    pub const fn new(not_before: Option<u64>, expiration: Option<u64>) -> Self {
        Self {
            not_before,
            expiration,
        }
    }

    /// Returns `true` if some instant lies within this range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match (self.not_before, self.expiration) {
            (Some(nbf), Some(exp)) => nbf <= exp,
            _ => true,
        }
    }

    /// Whether neither range starts after the other ends.
    ///
    /// This is the nesting rule between a token and each of its proofs:
    /// the proof must not start after the token expires, and the token must
    /// not start after the proof expires.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let starts_after = |start: Option<u64>, end: Option<u64>| match (start, end) {
            (Some(start), Some(end)) => start > end,
            _ => false,
        };
        !starts_after(other.not_before, self.expiration)
            && !starts_after(self.not_before, other.expiration)
    }

    /// The later of the two lower bounds and the earlier of the two upper
    /// bounds.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let not_before = match (self.not_before, other.not_before) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let expiration = match (self.expiration, other.expiration) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            not_before,
            expiration,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(nbf) = self.not_before {
            write!(f, "{nbf}")?;
        }
        write!(f, "..")?;
        match self.expiration {
            Some(exp) => write!(f, "={exp}"),
            None => Ok(()),
        }
    }
}
