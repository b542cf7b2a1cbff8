use std::time::{Duration, Instant};

/// Posts "redraw this surface" requests for later delivery on the render loop.
pub trait FrameScheduler {
    /// Ask for a redraw no earlier than `delay` from now.
    fn post_delayed(&mut self, delay: Duration);

    /// Drop any pending request.
    fn cancel(&mut self);
}

/// Single-slot deadline polled by the host loop. Holds at most one pending
/// request; a second post keeps whichever deadline comes first.
#[derive(Debug, Default)]
pub struct TickScheduler {
    deadline: Option<Instant>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_at(&mut self, at: Instant) {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(at),
            None => at,
        });
    }

    /// Consume the pending request if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if d <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

impl FrameScheduler for TickScheduler {
    fn post_delayed(&mut self, delay: Duration) {
        self.post_at(Instant::now() + delay);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_slot_keeps_earliest() {
        let mut s = TickScheduler::new();
        let t0 = Instant::now();
        s.post_at(t0 + Duration::from_millis(50));
        s.post_at(t0 + Duration::from_millis(10));
        s.post_at(t0 + Duration::from_millis(30));
        assert_eq!(s.next_deadline(), Some(t0 + Duration::from_millis(10)));
    }

    #[test]
    fn test_take_due_consumes_once() {
        let mut s = TickScheduler::new();
        let t0 = Instant::now();
        s.post_at(t0 + Duration::from_millis(10));
        assert!(!s.take_due(t0));
        assert!(s.take_due(t0 + Duration::from_millis(10)));
        assert!(!s.take_due(t0 + Duration::from_millis(20)));
        assert!(!s.is_pending());
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut s = TickScheduler::new();
        s.post_delayed(Duration::ZERO);
        assert!(s.is_pending());
        s.cancel();
        assert!(!s.take_due(Instant::now() + Duration::from_secs(1)));
    }
}
