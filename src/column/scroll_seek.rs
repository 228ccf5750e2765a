//! Fast-scroll detection.
//!
//! While the list is flung faster than `enter` rows per second, rows are drawn
//! as cheap placeholders. They switch back to real content only once the
//! speed falls under `exit`, which is strictly lower than `enter`, so a
//! velocity hovering around a single threshold cannot make rows flicker.

use std::time::{Duration, Instant};

/// Smoothing factor for new velocity samples.
const SMOOTHING: f64 = 0.6;

/// Shortest interval used when two scroll events land in the same instant.
const MIN_SAMPLE: Duration = Duration::from_millis(8);

#[derive(Debug, Clone)]
pub struct ScrollSeek {
    enter: f64,
    exit: f64,
    active: bool,
}

impl ScrollSeek {
    /// `enter` must be greater than `exit`; config validation enforces it.
    pub fn new(enter: f64, exit: f64) -> Self {
        debug_assert!(enter > exit, "scroll seek enter threshold must exceed exit");
        Self {
            enter,
            exit,
            active: false,
        }
    }

    /// Feed the current velocity and return whether placeholders are shown.
    pub fn update(&mut self, velocity: f64) -> bool {
        let speed = velocity.abs();
        if self.active {
            if speed < self.exit {
                self.active = false;
            }
        } else if speed > self.enter {
            self.active = true;
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reset(&mut self) {
        self.active = false;
    }
}

/// Estimates scroll velocity in rows per second from user scroll deltas.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    settle: Duration,
    last_event: Option<Instant>,
    velocity: f64,
}

impl VelocityTracker {
    /// Velocity drops to zero once no scroll arrives for `settle`.
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            last_event: None,
            velocity: 0.0,
        }
    }

    pub fn record(&mut self, delta_rows: f64, now: Instant) -> f64 {
        let sample = match self.last_event {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed >= self.settle {
                    // First movement after a pause: no meaningful rate yet.
                    self.velocity = 0.0;
                    0.0
                } else {
                    delta_rows / elapsed.max(MIN_SAMPLE).as_secs_f64()
                }
            }
            None => 0.0,
        };

        self.velocity = SMOOTHING * sample + (1.0 - SMOOTHING) * self.velocity;
        self.last_event = Some(now);
        self.velocity
    }

    /// Called on every tick; decays to zero when scrolling has stopped.
    pub fn settle(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last_event {
            if now.saturating_duration_since(last) >= self.settle {
                self.velocity = 0.0;
                self.last_event = None;
            }
        }
        self.velocity
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn reset(&mut self) {
        self.velocity = 0.0;
        self.last_event = None;
    }
}
