//! Scroll activity tracking: a leading-edge sample throttle plus a trailing
//! quiet period that decides when the page has settled.
//!
//! The browser fires scroll events far faster than work should be scheduled,
//! so samples are accepted at most once per display frame and the page only
//! counts as settled after a fixed delay with no accepted sample. Time is
//! passed in as milliseconds so the state machine is host-independent.

pub const SCROLL_SAMPLE_INTERVAL_MS: u64 = 16;
pub const SCROLL_SETTLE_DELAY_MS: u64 = 150;

/// Leading-edge rate limiter: the first event in an interval window is
/// accepted immediately, the rest are dropped until the window elapses.
#[derive(Clone, Debug)]
pub struct LeadingThrottle {
    interval_ms: u64,
    window_opened_at_ms: Option<u64>,
}

impl LeadingThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            window_opened_at_ms: None,
        }
    }

    /// Accepts or drops an event arriving at `now_ms`.
    pub fn try_accept(&mut self, now_ms: u64) -> bool {
        if let Some(opened_at) = self.window_opened_at_ms {
            if now_ms < opened_at.saturating_add(self.interval_ms) {
                return false;
            }
        }

        self.window_opened_at_ms = Some(now_ms);
        true
    }
}

/// Scrolling/settled state derived from throttled scroll samples.
///
/// `is_scrolling` flips true on the first accepted sample and back to false
/// only once the settle delay passes with no further accepted samples.
/// Consumers read the same state two ways: `should_pause` gates work already
/// running, `should_load_content` gates starting new work.
#[derive(Clone, Debug)]
pub struct ScrollActivity {
    throttle: LeadingThrottle,
    settle_delay_ms: u64,
    scrolling: bool,
    settle_deadline_ms: Option<u64>,
}

impl ScrollActivity {
    pub fn new() -> Self {
        Self::with_timing(SCROLL_SAMPLE_INTERVAL_MS, SCROLL_SETTLE_DELAY_MS)
    }

    pub fn with_timing(sample_interval_ms: u64, settle_delay_ms: u64) -> Self {
        Self {
            throttle: LeadingThrottle::new(sample_interval_ms),
            settle_delay_ms,
            scrolling: false,
            settle_deadline_ms: None,
        }
    }

    /// Feeds one raw scroll event. Returns true when the sample was accepted
    /// by the throttle; callers re-arm their settle timer on acceptance.
    pub fn on_scroll(&mut self, now_ms: u64) -> bool {
        if !self.throttle.try_accept(now_ms) {
            return false;
        }

        self.scrolling = true;
        self.settle_deadline_ms = Some(now_ms.saturating_add(self.settle_delay_ms));
        true
    }

    /// Applies the passage of time. Returns true when the state flipped to
    /// settled because the quiet period elapsed.
    pub fn on_time_passed(&mut self, now_ms: u64) -> bool {
        match self.settle_deadline_ms {
            Some(deadline) if self.scrolling && now_ms >= deadline => {
                self.settle();
                true
            }
            _ => false,
        }
    }

    /// Marks the state settled immediately. Used when an armed quiet-period
    /// timer fires, since the timer only survives if no later sample re-armed
    /// it.
    pub fn settle(&mut self) {
        self.scrolling = false;
        self.settle_deadline_ms = None;
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    /// Pause signal for work that should not run mid-scroll.
    pub fn should_pause(&self) -> bool {
        self.scrolling
    }

    /// Gate for initiating new expensive work.
    pub fn should_load_content(&self) -> bool {
        !self.scrolling
    }

    pub fn settle_delay_ms(&self) -> u64 {
        self.settle_delay_ms
    }
}

impl Default for ScrollActivity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_accepted_immediately() {
        let mut throttle = LeadingThrottle::new(16);

        assert!(throttle.try_accept(0));
        assert!(!throttle.try_accept(1));
        assert!(!throttle.try_accept(15));
        assert!(throttle.try_accept(16));
    }

    #[test]
    fn events_every_millisecond_are_bounded_by_the_sample_interval() {
        let mut throttle = LeadingThrottle::new(16);
        let mut accepted = 0usize;

        for now_ms in 0..500u64 {
            if throttle.try_accept(now_ms) {
                accepted += 1;
            }
        }

        let ceiling = 500usize.div_ceil(16) + 1;
        assert!(accepted <= ceiling, "{accepted} accepted, limit {ceiling}");
        assert!(accepted >= 500 / 16);
    }

    #[test]
    fn scrolling_flips_true_on_first_accepted_sample() {
        let mut activity = ScrollActivity::new();

        assert!(!activity.is_scrolling());
        assert!(activity.on_scroll(1_000));
        assert!(activity.is_scrolling());
        assert!(activity.should_pause());
        assert!(!activity.should_load_content());
    }

    #[test]
    fn quiet_period_settles_only_after_the_full_delay() {
        let mut activity = ScrollActivity::new();
        let last_sample_at = 2_000u64;

        assert!(activity.on_scroll(last_sample_at));

        assert!(!activity.on_time_passed(last_sample_at + 1));
        assert!(activity.is_scrolling(), "must still be scrolling at T+1ms");

        assert!(activity.on_time_passed(last_sample_at + 151));
        assert!(!activity.is_scrolling(), "must be settled at T+151ms");
        assert!(activity.should_load_content());
    }

    #[test]
    fn later_samples_push_the_settle_deadline_forward() {
        let mut activity = ScrollActivity::new();

        assert!(activity.on_scroll(0));
        assert!(activity.on_scroll(100));

        // The deadline from the first sample has passed, the second has not.
        assert!(!activity.on_time_passed(151));
        assert!(activity.is_scrolling());
        assert!(activity.on_time_passed(250));
        assert!(!activity.is_scrolling());
    }

    #[test]
    fn dropped_samples_do_not_rearm_the_deadline() {
        let mut activity = ScrollActivity::new();

        assert!(activity.on_scroll(0));
        assert!(!activity.on_scroll(5), "sample inside the window is dropped");

        assert!(activity.on_time_passed(150));
        assert!(!activity.is_scrolling());
    }

    #[test]
    fn settle_is_idempotent() {
        let mut activity = ScrollActivity::new();

        activity.on_scroll(0);
        activity.settle();
        activity.settle();

        assert!(!activity.is_scrolling());
        assert!(!activity.on_time_passed(10_000));
    }
}
