use serde::{Deserialize, Serialize};

/// Closed interval `[lo, hi]`. Serialised as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub const UNIT: Self = Self { lo: 0.0, hi: 1.0 };

    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Smallest interval covering both.
    pub fn union(self, other: Self) -> Self {
        Self::new(self.lo.min(other.lo), self.hi.max(other.hi))
    }

    pub fn length(self) -> f64 {
        self.hi - self.lo
    }

    /// Point at parameter `t`, where 0 is `lo` and 1 is `hi`.
    pub fn lerp(self, t: f64) -> f64 {
        self.lo + (self.hi - self.lo) * t
    }

    /// `lo < hi` and both bounds finite.
    pub fn is_valid(self) -> bool {
        self.lo.is_finite() && self.hi.is_finite() && self.lo < self.hi
    }

    pub fn contains(self, v: f64) -> bool {
        self.lo <= v && v <= self.hi
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::UNIT
    }
}

impl From<[f64; 2]> for Interval {
    fn from([lo, hi]: [f64; 2]) -> Self {
        Self::new(lo, hi)
    }
}

impl From<Interval> for [f64; 2] {
    fn from(interval: Interval) -> Self {
        [interval.lo, interval.hi]
    }
}

/// Affine map taking `domain` onto `range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapping {
    domain: Interval,
    range: Interval,
}

impl Mapping {
    pub fn new(domain: Interval, range: Interval) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> Interval {
        self.domain
    }

    pub fn range(&self) -> Interval {
        self.range
    }

    /// A zero-length domain collapses onto the start of the range instead of producing NaN.
    pub fn apply(&self, v: f64) -> f64 {
        let span = self.domain.length();
        if span == 0.0 || !span.is_finite() {
            return self.range.lo;
        }
        self.range.lerp((v - self.domain.lo) / span)
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.range, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both() {
        assert_eq!(
            Interval::new(0.0, 5.0).union(Interval::new(3.0, 10.0)),
            Interval::new(0.0, 10.0)
        );
        assert_eq!(
            Interval::new(-2.0, 1.0).union(Interval::new(-5.0, -3.0)),
            Interval::new(-5.0, 1.0)
        );
    }

    #[test]
    fn lerp_and_length() {
        let i = Interval::new(2.0, 6.0);
        assert_eq!(i.length(), 4.0);
        assert_eq!(i.lerp(0.5), 4.0);
        assert_eq!(i.lerp(0.0), 2.0);
        assert_eq!(i.lerp(1.0), 6.0);
    }

    #[test]
    fn mapping_is_affine() {
        let m = Mapping::new(Interval::new(100.0, 200.0), Interval::new(0.0, 0.2));
        assert!((m.apply(150.0) - 0.1).abs() < 1e-12);
        assert!((m.apply(100.0)).abs() < 1e-12);
        assert!((m.inverse().apply(0.2) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_domain_does_not_produce_nan() {
        let m = Mapping::new(Interval::new(3.0, 3.0), Interval::new(0.0, 1.0));
        assert_eq!(m.apply(3.0), 0.0);
        assert!(m.apply(7.0).is_finite());
    }

    #[test]
    fn validity() {
        assert!(Interval::new(0.0, 1.0).is_valid());
        assert!(!Interval::new(1.0, 1.0).is_valid());
        assert!(!Interval::new(2.0, 1.0).is_valid());
        assert!(!Interval::new(0.0, f64::NAN).is_valid());
    }
}
