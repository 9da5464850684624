use std::cell::Cell;
use std::rc::Rc;

/// Host clock abstraction: a monotonic millisecond timestamp.
///
/// The browser client reads `performance.now()`; the headless runner and
/// tests drive a [`ManualTime`] by hand.
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// A time source that only moves when told to. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<f64>>,
}

impl ManualTime {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_time_clones_share_state() {
        let time = ManualTime::new(10.0);
        let other = time.clone();
        time.advance(5.0);
        assert_eq!(other.now_ms(), 15.0);
        other.set(100.0);
        assert_eq!(time.now_ms(), 100.0);
    }
}
