/// Fixed-cadence periodic timer driven by externally supplied clock samples.
///
/// Ticks land on `start + k * interval`; a frame that spans several intervals
/// yields several ticks, up to the caller's cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    interval: f32,
    next_due: Option<f32>,
}

impl Timer {
    /// A timer whose first tick is due at the first poll.
    pub fn immediate(interval: f32) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Takes effect from the next rearm.
    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval;
    }

    pub fn next_due(&self) -> Option<f32> {
        self.next_due
    }

    pub fn is_due(&self, now: f32) -> bool {
        self.next_due.map_or(true, |due| now >= due)
    }

    /// Counts the ticks elapsed up to `now` and advances past them.
    ///
    /// Returns at most `cap`; when more were pending the timer resynchronises to
    /// `now + interval` rather than letting the backlog grow.
    pub fn poll(&mut self, now: f32, cap: u32) -> u32 {
        let mut due = self.next_due.unwrap_or(now);
        let mut ticks = 0;
        while now >= due {
            if ticks == cap {
                self.next_due = Some(now + self.interval);
                return ticks;
            }
            ticks += 1;
            due += self.interval;
        }
        self.next_due = Some(due);
        ticks
    }

    /// Next tick one interval from `now`.
    pub fn rearm(&mut self, now: f32) {
        self.next_due = Some(now + self.interval);
    }
}
