//! Acquisition stop conditions.

use std::cell::Cell;
use std::time::{Duration, Instant};
use strum_macros::Display;
use tracing::info;

/// Counters a session reports to and polls for its stop condition.
pub trait Limits {
    /// Called when acquisition starts; resets all counters.
    fn start(&mut self);
    fn on_samples_read(&mut self, count: u64);
    fn on_frame(&mut self);
    fn samples_read(&self) -> u64;
    fn limit_reached(&self) -> bool;
}

/// Which limit ended an acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LimitKind {
    #[strum(to_string = "samples")]
    Samples,
    #[strum(to_string = "frames")]
    Frames,
    #[strum(to_string = "time")]
    Time,
}

/// Sample, frame and wall-clock limits; zero or `None` means unlimited.
#[derive(Debug, Clone, Default)]
pub struct SoftwareLimits {
    pub limit_samples: u64,
    pub limit_frames: u64,
    pub limit_time: Option<Duration>,
    samples_read: u64,
    frames_read: u64,
    started: Option<Instant>,
    reached: Cell<Option<LimitKind>>,
}

impl SoftwareLimits {
    pub fn new(limit_samples: u64, limit_frames: u64, limit_time: Option<Duration>) -> Self {
        Self {
            limit_samples,
            limit_frames,
            limit_time,
            ..Self::default()
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// The limit that was hit first since [`start`](Limits::start), if any.
    pub fn reached(&self) -> Option<LimitKind> {
        self.reached.get()
    }

    fn check(&self) -> Option<LimitKind> {
        if self.limit_samples > 0 && self.samples_read >= self.limit_samples {
            Some(LimitKind::Samples)
        } else if self.limit_frames > 0 && self.frames_read >= self.limit_frames {
            Some(LimitKind::Frames)
        } else if self.time_exceeded(Instant::now()) {
            Some(LimitKind::Time)
        } else {
            None
        }
    }

    fn time_exceeded(&self, now: Instant) -> bool {
        match (self.limit_time, self.started) {
            (Some(limit), Some(started)) => now.saturating_duration_since(started) >= limit,
            _ => false,
        }
    }
}

impl Limits for SoftwareLimits {
    fn start(&mut self) {
        self.samples_read = 0;
        self.frames_read = 0;
        self.started = Some(Instant::now());
        self.reached.set(None);
    }

    fn on_samples_read(&mut self, count: u64) {
        self.samples_read += count;
    }

    fn on_frame(&mut self) {
        self.frames_read += 1;
    }

    fn samples_read(&self) -> u64 {
        self.samples_read
    }

    fn limit_reached(&self) -> bool {
        if self.reached.get().is_some() {
            return true;
        }
        let Some(kind) = self.check() else {
            return false;
        };
        info!(
            samples = self.samples_read,
            frames = self.frames_read,
            "Requested {} limit reached",
            kind
        );
        self.reached.set(Some(kind));
        true
    }
}
