use std::time::{Duration, Instant};

/// Trailing-edge debouncer driven by caller-supplied instants.
///
/// Every `push` replaces the pending value and restarts the quiet period; `poll` hands the value
/// out once the deadline has passed with no newer input.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    /// When the pending value becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now >= *at => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn fires_once_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.push("db", t0);
        assert_eq!(d.poll(t0 + Duration::from_millis(499)), None);
        assert_eq!(d.poll(t0 + WINDOW), Some("db"));
        assert_eq!(d.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn new_input_resets_rather_than_stacks() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.push("d", t0);
        d.push("da", t0 + Duration::from_millis(400));
        d.push("dat", t0 + Duration::from_millis(800));

        assert_eq!(d.poll(t0 + Duration::from_millis(1000)), None);
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(1300)));
        assert_eq!(d.poll(t0 + Duration::from_millis(1300)), Some("dat"));
    }

    #[test]
    fn cancel_drops_pending_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.push(1, t0);
        d.cancel();
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + WINDOW), None);
    }
}
