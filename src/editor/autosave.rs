use crate::clock::Millis;
use crate::config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingWrite {
    Idle,
    Scheduled { due_at: Millis },
    InFlight,
}

/// Debounce for draft writes. Every edit pushes the deadline out again; the
/// write that eventually fires carries whatever the draft holds at that time.
#[derive(Clone, Debug)]
pub struct Autosave {
    delay_ms: Millis,
    state: PendingWrite,
    /// An edit arrived while a write was in flight.
    rescheduled: Option<Millis>,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new(config::AUTOSAVE_DELAY_MS)
    }
}

impl Autosave {
    pub fn new(delay_ms: Millis) -> Self {
        Self {
            delay_ms,
            state: PendingWrite::Idle,
            rescheduled: None,
        }
    }

    pub fn state(&self) -> PendingWrite {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state != PendingWrite::Idle || self.rescheduled.is_some()
    }

    pub fn on_edit(&mut self, now: Millis) {
        let due_at = now + self.delay_ms;
        match self.state {
            PendingWrite::InFlight => self.rescheduled = Some(due_at),
            _ => self.state = PendingWrite::Scheduled { due_at },
        }
    }

    /// Returns `true` when the caller should perform the write now.
    pub fn poll(&mut self, now: Millis) -> bool {
        match self.state {
            PendingWrite::Scheduled { due_at } if now >= due_at => {
                self.state = PendingWrite::InFlight;
                true
            }
            _ => false,
        }
    }

    /// Forces a pending write to fire immediately (used before solidify and on
    /// shutdown).
    pub fn take_now(&mut self) -> bool {
        match self.state {
            PendingWrite::Scheduled { .. } => {
                self.state = PendingWrite::InFlight;
                true
            }
            _ => false,
        }
    }

    /// Completes the in-flight write. Success or failure, the machine goes
    /// back to idle unless another edit arrived meanwhile; a failed write is
    /// retried by the next edit's debounce.
    pub fn on_write_complete(&mut self) {
        if self.state != PendingWrite::InFlight {
            return;
        }
        self.state = match self.rescheduled.take() {
            Some(due_at) => PendingWrite::Scheduled { due_at },
            None => PendingWrite::Idle,
        };
    }

    pub fn cancel(&mut self) {
        self.state = PendingWrite::Idle;
        self.rescheduled = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_schedules_after_delay() {
        let mut autosave = Autosave::new(1_000);
        autosave.on_edit(100);
        assert_eq!(autosave.state(), PendingWrite::Scheduled { due_at: 1_100 });
        assert!(!autosave.poll(1_099));
        assert!(autosave.poll(1_100));
        assert_eq!(autosave.state(), PendingWrite::InFlight);
    }

    #[test]
    fn new_edit_supersedes_pending_deadline() {
        let mut autosave = Autosave::new(1_000);
        autosave.on_edit(0);
        autosave.on_edit(800);
        assert!(!autosave.poll(1_000));
        assert!(autosave.poll(1_800));
    }

    #[test]
    fn fires_once_per_quiet_period() {
        let mut autosave = Autosave::new(1_000);
        autosave.on_edit(0);
        assert!(autosave.poll(1_000));
        assert!(!autosave.poll(1_001));
        autosave.on_write_complete();
        assert_eq!(autosave.state(), PendingWrite::Idle);
        assert!(!autosave.poll(5_000));
    }

    #[test]
    fn edit_during_flight_reschedules_after_completion() {
        let mut autosave = Autosave::new(1_000);
        autosave.on_edit(0);
        assert!(autosave.poll(1_000));
        autosave.on_edit(1_010);
        assert_eq!(autosave.state(), PendingWrite::InFlight);
        autosave.on_write_complete();
        assert_eq!(autosave.state(), PendingWrite::Scheduled { due_at: 2_010 });
    }

    #[test]
    fn take_now_only_fires_when_scheduled() {
        let mut autosave = Autosave::new(1_000);
        assert!(!autosave.take_now());
        autosave.on_edit(0);
        assert!(autosave.take_now());
        assert!(!autosave.take_now());
    }

    #[test]
    fn cancel_clears_everything() {
        let mut autosave = Autosave::new(1_000);
        autosave.on_edit(0);
        autosave.cancel();
        assert!(!autosave.is_pending());
        assert!(!autosave.poll(10_000));
    }
}
