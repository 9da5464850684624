//! Frame clock with delta clamping and visibility suspension.

use serde::Serialize;

use crate::config::ClockConfig;

/// One discrete simulation/render step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameTick {
    /// Host timestamp at which the tick was produced.
    pub timestamp_ms: f64,
    /// Elapsed time since the previous tick, clamped to the configured maximum.
    pub delta_ms: f64,
    /// Sequence number since the last `start()`.
    pub frame: u64,
}

/// Turns host timestamps into a stream of [`FrameTick`]s.
///
/// The clock does not schedule anything itself; the host feeds it a timestamp
/// per animation frame and gets back a tick, or `None` while the clock is
/// stopped or suspended.
#[derive(Debug)]
pub struct Clock {
    max_delta_ms: f64,
    running: bool,
    suspended: bool,
    last_timestamp: Option<f64>,
    frame: u64,
    /// Incremented on every `stop()`; lets hosts discard callbacks that were
    /// scheduled before the stop.
    epoch: u64,
}

impl Clock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            max_delta_ms: config.max_delta_ms,
            running: false,
            suspended: false,
            last_timestamp: None,
            frame: 0,
            epoch: 0,
        }
    }

    /// Begin the tick stream. The first tick after a start carries a zero delta.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_timestamp = None;
        self.frame = 0;
        tracing::debug!(epoch = self.epoch, "clock started");
    }

    /// Cancel the tick stream. No tick is produced after this returns.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.last_timestamp = None;
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, "clock stopped");
    }

    /// Stop delivering ticks while the host surface is hidden.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Resume delivery. The next tick's delta covers the hidden interval and
    /// is therefore clamped.
    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// True when a tick would be delivered for the next timestamp.
    pub fn is_ticking(&self) -> bool {
        self.running && !self.suspended
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn max_delta_ms(&self) -> f64 {
        self.max_delta_ms
    }

    /// Produce the tick for host timestamp `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> Option<FrameTick> {
        if !self.is_ticking() {
            return None;
        }

        let raw = match self.last_timestamp {
            Some(last) => now_ms - last,
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        // Host timestamps can step backwards across suspends; never report negative time.
        let delta_ms = raw.clamp(0.0, self.max_delta_ms);
        if raw > self.max_delta_ms {
            tracing::debug!(raw_ms = raw, clamped_ms = delta_ms, "frame delta clamped");
        }

        let tick = FrameTick {
            timestamp_ms: now_ms,
            delta_ms,
            frame: self.frame,
        };
        self.frame += 1;
        Some(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(max_delta_ms: f64) -> Clock {
        Clock::new(&ClockConfig { max_delta_ms })
    }

    #[test]
    fn stopped_clock_produces_nothing() {
        let mut c = clock(100.0);
        assert!(c.tick(0.0).is_none());
        c.start();
        assert!(c.tick(0.0).is_some());
        c.stop();
        assert!(c.tick(16.0).is_none());
    }

    #[test]
    fn first_tick_has_zero_delta() {
        let mut c = clock(100.0);
        c.start();
        let t = c.tick(1234.0).unwrap();
        assert_eq!(t.delta_ms, 0.0);
        assert_eq!(t.frame, 0);

        let t = c.tick(1250.0).unwrap();
        assert_eq!(t.delta_ms, 16.0);
        assert_eq!(t.frame, 1);
    }

    #[test]
    fn five_second_stall_is_clamped() {
        let mut c = clock(100.0);
        c.start();
        c.tick(0.0);
        let t = c.tick(5000.0).unwrap();
        assert!(t.delta_ms <= 100.0);
        assert_eq!(t.delta_ms, 100.0);
    }

    #[test]
    fn backwards_timestamp_reports_zero() {
        let mut c = clock(100.0);
        c.start();
        c.tick(500.0);
        let t = c.tick(400.0).unwrap();
        assert_eq!(t.delta_ms, 0.0);
    }

    #[test]
    fn suspended_clock_skips_ticks_and_resumes_clamped() {
        let mut c = clock(100.0);
        c.start();
        c.tick(0.0);
        c.suspend();
        assert!(c.tick(16.0).is_none());
        assert!(c.tick(60_000.0).is_none());
        c.resume();
        let t = c.tick(60_016.0).unwrap();
        assert_eq!(t.delta_ms, 100.0);
    }

    #[test]
    fn stop_bumps_epoch_and_restart_resets_frames() {
        let mut c = clock(100.0);
        c.start();
        c.tick(0.0);
        c.tick(16.0);
        let epoch = c.epoch();
        c.stop();
        assert_eq!(c.epoch(), epoch + 1);
        c.start();
        let t = c.tick(10_000.0).unwrap();
        assert_eq!(t.frame, 0);
        assert_eq!(t.delta_ms, 0.0);
    }

    #[test]
    fn double_start_and_stop_are_harmless() {
        let mut c = clock(100.0);
        c.start();
        c.tick(0.0);
        c.start();
        let t = c.tick(10.0).unwrap();
        assert_eq!(t.frame, 1);
        c.stop();
        let epoch = c.epoch();
        c.stop();
        assert_eq!(c.epoch(), epoch);
    }
}
