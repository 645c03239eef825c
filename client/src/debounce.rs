use std::time::{Duration, Instant};

/// Holds back submission until the user has stopped typing for `quiet`.
#[derive(Debug, Clone)]
pub struct SubmitDebouncer {
    quiet: Duration,
    last_edit: Option<Instant>,
}

impl SubmitDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_edit: None,
        }
    }

    /// Records a keystroke, pushing the deadline back.
    pub fn touch(&mut self, now: Instant) {
        self.last_edit = Some(now);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.last_edit.map(|t| t + self.quiet)
    }

    /// Drops a pending submission, e.g. after submitting by hand.
    pub fn cancel(&mut self) {
        self.last_edit = None;
    }

    pub fn is_pending(&self) -> bool {
        self.last_edit.is_some()
    }

    /// True once per burst of edits, when the quiet period has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_edit = None;
                true
            }
            _ => false,
        }
    }
}
