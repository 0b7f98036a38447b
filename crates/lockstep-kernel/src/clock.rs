//! Time sources for [`Wait`][crate::wait::Wait].

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time backed by [`Instant`].
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.  Clones share the same time.
///
/// ```
/// use std::time::Duration;
/// use lockstep_kernel::{Clock, ManualClock};
///
/// let clock = ManualClock::default();
/// let view = clock.clone();
/// clock.advance(Duration::from_millis(20));
/// assert_eq!(view.now(), Duration::from_millis(20));
/// ```
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
