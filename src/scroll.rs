use std::time::Duration;

/// Where the scroll-expansion loop stands after an event. The driver in
/// `render` owns the browser and the clock; this machine only decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPhase {
    /// Keep scrolling, no sample due.
    Scrolling,
    /// A height/link-count sample is due this iteration.
    Checking,
    /// Height unchanged across the stability threshold; content is loaded.
    Stable,
    /// Time budget or attempt cap exhausted; return whatever is there.
    Expired,
}

#[derive(Debug, Clone)]
pub struct ScrollPolicy {
    pub budget: Duration,
    pub max_attempts: u32,
    pub sample_every: u32,
    pub stable_samples: u32,
    pub pause: Duration,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        ScrollPolicy {
            budget: Duration::from_secs(60),
            max_attempts: 500,
            sample_every: 5,
            stable_samples: 5,
            pause: Duration::from_millis(20),
        }
    }
}

/// Termination tracker for one listing expansion. Rendered height can
/// plateau transiently while a batch of cards hydrates, so a single
/// unchanged sample must not stop the loop.
pub struct ScrollSampler {
    policy: ScrollPolicy,
    attempts: u32,
    last_height: Option<u64>,
    unchanged: u32,
}

impl ScrollSampler {
    pub fn new(policy: ScrollPolicy) -> Self {
        ScrollSampler {
            policy,
            attempts: 0,
            last_height: None,
            unchanged: 0,
        }
    }

    /// Account for one scroll attempt. Returns `Expired` when the budget or
    /// cap is gone, `Checking` when a periodic sample is due.
    pub fn tick(&mut self, elapsed: Duration) -> ScrollPhase {
        if elapsed >= self.policy.budget || self.attempts >= self.policy.max_attempts {
            return ScrollPhase::Expired;
        }
        self.attempts += 1;
        if self.attempts % self.policy.sample_every == 0 {
            ScrollPhase::Checking
        } else {
            ScrollPhase::Scrolling
        }
    }

    /// Feed one sampled content height.
    pub fn observe_height(&mut self, height: u64) -> ScrollPhase {
        match self.last_height {
            Some(prev) if prev == height => {
                self.unchanged += 1;
                if self.unchanged >= self.policy.stable_samples {
                    ScrollPhase::Stable
                } else {
                    ScrollPhase::Scrolling
                }
            }
            _ => {
                self.last_height = Some(height);
                self.unchanged = 0;
                ScrollPhase::Scrolling
            }
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn pause(&self) -> Duration {
        self.policy.pause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_policy() -> ScrollPolicy {
        ScrollPolicy {
            budget: Duration::from_secs(10),
            max_attempts: 20,
            sample_every: 5,
            stable_samples: 3,
            pause: Duration::from_millis(1),
        }
    }

    #[test]
    fn samples_on_every_fifth_attempt() {
        let mut s = ScrollSampler::new(quick_policy());
        let phases: Vec<ScrollPhase> = (0..10).map(|_| s.tick(Duration::ZERO)).collect();
        let checks = phases.iter().filter(|p| **p == ScrollPhase::Checking).count();
        assert_eq!(checks, 2);
        assert_eq!(phases[4], ScrollPhase::Checking);
        assert_eq!(phases[9], ScrollPhase::Checking);
    }

    #[test]
    fn expires_on_time_budget() {
        let mut s = ScrollSampler::new(quick_policy());
        assert_eq!(s.tick(Duration::from_secs(11)), ScrollPhase::Expired);
    }

    #[test]
    fn expires_on_attempt_cap() {
        let mut s = ScrollSampler::new(quick_policy());
        for _ in 0..20 {
            assert_ne!(s.tick(Duration::ZERO), ScrollPhase::Expired);
        }
        assert_eq!(s.tick(Duration::ZERO), ScrollPhase::Expired);
    }

    #[test]
    fn stable_needs_consecutive_unchanged_samples() {
        let mut s = ScrollSampler::new(quick_policy());
        assert_eq!(s.observe_height(100), ScrollPhase::Scrolling);
        assert_eq!(s.observe_height(100), ScrollPhase::Scrolling);
        assert_eq!(s.observe_height(100), ScrollPhase::Scrolling);
        assert_eq!(s.observe_height(100), ScrollPhase::Stable);
    }

    #[test]
    fn height_change_resets_stability() {
        let mut s = ScrollSampler::new(quick_policy());
        s.observe_height(100);
        s.observe_height(100);
        s.observe_height(100);
        // A transient plateau broken by late-loading content starts over.
        assert_eq!(s.observe_height(250), ScrollPhase::Scrolling);
        s.observe_height(250);
        s.observe_height(250);
        assert_eq!(s.observe_height(250), ScrollPhase::Stable);
    }
}
