//! Trailing-edge debouncing driven by caller-supplied instants.
//!
//! [`Debouncer`] never reads the clock itself. Callers pass `now` into
//! [`Debouncer::push`] and [`Debouncer::poll`] and use
//! [`Debouncer::deadline`] to decide when to wake up, which keeps the commit
//! contract testable without real timers.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::filter::FilterSpec;

/// Coalesces rapid updates into the last value once input goes quiet.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet window.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// When the pending value becomes due, if there is one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if `delay` has elapsed since the last push.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.deadline().is_some_and(|deadline| now >= deadline);
        if due {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Drop the pending value without committing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

/// Quiet period before a price range edit is committed.
pub const PRICE_RANGE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Lower bound shown when no minimum price is set.
pub const DEFAULT_MIN_PRICE: Decimal = Decimal::ZERO;

/// Upper bound shown when no maximum price is set.
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Price range input whose edits reach the filter only after a quiet period.
#[derive(Debug, Clone)]
pub struct PriceRange {
    min: Decimal,
    max: Decimal,
    debouncer: Debouncer<(Decimal, Decimal)>,
}

impl PriceRange {
    /// Start from the current bounds of `spec`, falling back to the defaults.
    #[must_use]
    pub fn from_spec(spec: &FilterSpec, delay: Duration) -> Self {
        Self {
            min: spec.min_price.unwrap_or(DEFAULT_MIN_PRICE),
            max: spec.max_price.unwrap_or(DEFAULT_MAX_PRICE),
            debouncer: Debouncer::new(delay),
        }
    }

    /// Bounds as currently typed, committed or not.
    #[must_use]
    pub const fn local(&self) -> (Decimal, Decimal) {
        (self.min, self.max)
    }

    pub fn set_min(&mut self, min: Decimal, now: Instant) {
        self.min = min.max(Decimal::ZERO);
        self.debouncer.push((self.min, self.max), now);
    }

    pub fn set_max(&mut self, max: Decimal, now: Instant) {
        self.max = max.max(Decimal::ZERO);
        self.debouncer.push((self.min, self.max), now);
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Commit the typed bounds into `spec` once the quiet period has passed.
    ///
    /// Returns whether `spec` changed.
    pub fn poll_into(&mut self, spec: &mut FilterSpec, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some((min, max)) => {
                spec.set_price_range(Some(min), Some(max));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_nothing_due_before_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push(1, start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(499)), None);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.poll(start + DELAY), Some(1));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + DELAY * 2), None);
    }

    #[test]
    fn test_rapid_pushes_coalesce_to_last() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push("1", start);
        debouncer.push("10", start + Duration::from_millis(200));
        debouncer.push("100", start + Duration::from_millis(400));

        // Window restarted by the last push.
        assert_eq!(debouncer.poll(start + Duration::from_millis(600)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(900))
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), Some("100"));
    }

    #[test]
    fn test_cancel_discards_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push(5, start);
        assert_eq!(debouncer.cancel(), Some(5));
        assert_eq!(debouncer.poll(start + DELAY), None);
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn test_price_range_commits_once_after_quiet_period() {
        let start = Instant::now();
        let mut spec = FilterSpec::default();
        let mut range = PriceRange::from_spec(&spec, PRICE_RANGE_DEBOUNCE);
        assert_eq!(range.local(), (Decimal::ZERO, Decimal::new(100_000, 0)));

        range.set_min(Decimal::new(1, 0), start);
        range.set_min(Decimal::new(10, 0), start + Duration::from_millis(100));
        range.set_max(Decimal::new(500, 0), start + Duration::from_millis(300));

        assert!(!range.poll_into(&mut spec, start + Duration::from_millis(700)));
        assert!(spec.min_price.is_none());

        assert!(range.poll_into(&mut spec, start + Duration::from_millis(800)));
        assert_eq!(spec.min_price, Some(Decimal::new(10, 0)));
        assert_eq!(spec.max_price, Some(Decimal::new(500, 0)));
        assert!(!range.poll_into(&mut spec, start + Duration::from_secs(5)));
    }

    #[test]
    fn test_negative_bounds_clamp_to_zero() {
        let mut range = PriceRange::from_spec(&FilterSpec::default(), DELAY);
        range.set_min(Decimal::new(-5, 0), Instant::now());
        assert_eq!(range.local().0, Decimal::ZERO);
    }
}
