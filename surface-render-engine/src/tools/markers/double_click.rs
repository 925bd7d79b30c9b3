//! Double-click detection from raw pointer presses.
use std::time::Duration;

use constants::surface::DOUBLE_CLICK_WINDOW_MS;

/// A deadline owned by whoever scheduled it. Dropping or replacing it is the
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    due: Duration,
}

impl ScheduledTask {
    pub fn after(now: Duration, delay: Duration) -> Self {
        Self { due: now + delay }
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.due
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// First press; waiting for a second one.
    Armed,
    /// Second press inside the window.
    Confirmed,
}

/// Arms on a first press and confirms on a second press inside the window.
///
/// Expiry is evaluated before every press, so a press landing exactly on the
/// deadline starts a new arm rather than confirming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleClickDetector {
    window: Duration,
    pending: Option<ScheduledTask>,
}

impl Default for DoubleClickDetector {
    fn default() -> Self {
        Self::new(Duration::from_millis(DOUBLE_CLICK_WINDOW_MS))
    }
}

impl DoubleClickDetector {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Disarm if the pending deadline has passed. Returns true when it expired.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.pending {
            Some(task) if task.is_due(now) => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn press(&mut self, now: Duration) -> ClickOutcome {
        self.poll(now);
        if self.pending.take().is_some() {
            ClickOutcome::Confirmed
        } else {
            self.pending = Some(ScheduledTask::after(now, self.window));
            ClickOutcome::Armed
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn second_press_inside_window_confirms() {
        let mut d = DoubleClickDetector::default();
        assert_eq!(d.press(ms(0)), ClickOutcome::Armed);
        assert!(d.is_armed());
        assert_eq!(d.press(ms(400)), ClickOutcome::Confirmed);
        assert!(!d.is_armed());
    }

    #[test]
    fn late_press_rearms() {
        let mut d = DoubleClickDetector::default();
        d.press(ms(0));
        assert_eq!(d.press(ms(600)), ClickOutcome::Armed);
        assert_eq!(d.press(ms(900)), ClickOutcome::Confirmed);
    }

    #[test]
    fn press_on_deadline_rearms() {
        let mut d = DoubleClickDetector::default();
        d.press(ms(0));
        assert_eq!(d.press(ms(500)), ClickOutcome::Armed);
        assert!(d.is_armed());
    }

    #[test]
    fn poll_expires_stale_arm() {
        let mut d = DoubleClickDetector::default();
        d.press(ms(100));
        assert!(!d.poll(ms(550)));
        assert!(d.poll(ms(600)));
        assert!(!d.is_armed());
    }

    #[test]
    fn third_press_starts_over() {
        let mut d = DoubleClickDetector::default();
        d.press(ms(0));
        d.press(ms(100));
        assert_eq!(d.press(ms(200)), ClickOutcome::Armed);
    }
}
