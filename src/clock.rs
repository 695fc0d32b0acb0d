use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time reading, as an offset from an arbitrary fixed origin.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Production time source backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicSource {
    origin: Instant,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time source for headless tests.
/// Clones share the same reading, so two clocks built from one source stay in lockstep.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    now: Rc<Cell<Duration>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// A stopwatch that accumulates time across start/stop windows.
#[derive(Debug, Clone)]
pub struct Clock<S: TimeSource> {
    source: S,
    started_at: Option<Duration>,
    accumulated: Duration,
}

impl<S: TimeSource> Clock<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Start or resume; a running clock is left alone
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.source.now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += self.source.now().saturating_sub(started);
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    /// Zero the clock and keep it running
    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        let current = self
            .started_at
            .map(|started| self.source.now().saturating_sub(started))
            .unwrap_or_default();
        self.accumulated + current
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}
