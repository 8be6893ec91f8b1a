//! Frame clock for the Squirrel game loop.
//!
//! The client runs one game-loop iteration per rendered frame. Unlike a
//! fixed-timestep simulation, movement is integrated with the *measured*
//! time since the previous frame, so [`FrameInfo::dt`] is wall-clock
//! elapsed time (clamped, so a stall does not teleport the player).
//!
//! ```ignore
//! let mut clock = FrameClock::new(FrameConfig::default());
//! loop {
//!     let frame = clock.wait_for_frame().await;
//!     driver.tick(frame.dt_secs()).await?;
//!     clock.record_frame_end();
//! }
//! ```
//!
//! All timing goes through `tokio::time`, so tests can run it under a
//! paused clock.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the frame clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frames per second.
    pub frame_rate_hz: u32,
    /// Largest `dt` handed to the game. Longer gaps are clamped.
    pub max_dt: Duration,
    /// Warn when frame work exceeds this fraction of the frame budget.
    pub budget_warn_threshold: f64,
    /// Collect per-frame timing metrics.
    pub metrics_enabled: bool,
    /// Random delay (0..max µs) before the first frame.
    pub initial_jitter_us: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            max_dt: Duration::from_millis(100),
            budget_warn_threshold: 0.80,
            metrics_enabled: true,
            initial_jitter_us: 1_000,
        }
    }
}

impl FrameConfig {
    /// Maximum supported frame rate.
    pub const MAX_FRAME_RATE_HZ: u32 = 240;

    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self {
            frame_rate_hz,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values.
    ///
    /// - `frame_rate_hz` in `1..=MAX_FRAME_RATE_HZ`.
    /// - `max_dt` at least one frame.
    /// - `budget_warn_threshold` in `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.frame_rate_hz == 0 {
            warn!("frame_rate_hz is 0, using 1");
            self.frame_rate_hz = 1;
        }
        if self.frame_rate_hz > Self::MAX_FRAME_RATE_HZ {
            warn!(
                rate = self.frame_rate_hz,
                max = Self::MAX_FRAME_RATE_HZ,
                "frame_rate_hz exceeds maximum, clamping"
            );
            self.frame_rate_hz = Self::MAX_FRAME_RATE_HZ;
        }
        let frame = self.frame_duration();
        if self.max_dt < frame {
            self.max_dt = frame;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Frame info
// ---------------------------------------------------------------------------

/// One frame, as returned by [`FrameClock::wait_for_frame`].
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Time since the previous frame, clamped to `max_dt`.
    pub dt: Duration,
    /// The frame fired late by more than a tenth of a frame.
    pub overrun: bool,
    /// Whole frames missed before this one.
    pub frames_skipped: u64,
}

impl FrameInfo {
    /// `dt` in seconds, the unit movement is integrated in.
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Timing counters, updated by [`FrameClock::record_frame_end`].
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    pub total_frames: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Frames whose `dt` was clamped to `max_dt`.
    pub clamped_frames: u64,
    /// Exponential moving average of frame work time (α = 0.1).
    pub avg_frame_time: Duration,
    pub max_frame_time: Duration,
    /// Work time of the last frame over the frame budget.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Paces the game loop at a fixed frame rate.
pub struct FrameClock {
    config: FrameConfig,
    frame_duration: Duration,
    frame_count: u64,
    next_frame: Instant,
    last_frame: Instant,
    /// When the current frame's work started; consumed by `record_frame_end`.
    frame_start: Option<Instant>,
    metrics: FrameMetrics,
}

impl FrameClock {
    pub fn new(config: FrameConfig) -> Self {
        let config = config.validated();
        let frame_duration = config.frame_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        let now = Instant::now();

        debug!(
            rate_hz = config.frame_rate_hz,
            budget_ms = frame_duration.as_secs_f64() * 1000.0,
            "frame clock created"
        );

        Self {
            config,
            frame_duration,
            frame_count: 0,
            next_frame: now + frame_duration + jitter,
            last_frame: now,
            frame_start: None,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self::new(FrameConfig::with_rate(frame_rate_hz))
    }

    /// Sleeps until the next frame is due.
    ///
    /// A late frame is not followed by a burst of catch-up frames: the next
    /// one is scheduled a full frame from now.
    pub async fn wait_for_frame(&mut self) -> FrameInfo {
        let due = self.next_frame;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.frame_count += 1;
        self.frame_start = Some(now);

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > self.frame_duration / 10;
        let frames_skipped = if overrun {
            (late_by.as_nanos() / self.frame_duration.as_nanos()) as u64
        } else {
            0
        };
        if frames_skipped > 0 {
            warn!(
                frame = self.frame_count,
                skipped = frames_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "frame overrun, skipping ahead"
            );
        }
        self.next_frame = now + self.frame_duration;

        let elapsed = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        let dt = if elapsed > self.config.max_dt {
            debug!(
                frame = self.frame_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "long frame, clamping dt"
            );
            self.metrics.clamped_frames += 1;
            self.config.max_dt
        } else {
            elapsed
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += frames_skipped;
        self.metrics.total_frames += 1;

        trace!(frame = self.frame_count, ?dt, overrun, "frame");

        FrameInfo {
            frame: self.frame_count,
            dt,
            overrun,
            frames_skipped,
        }
    }

    /// Marks the current frame's work as done and checks it against the
    /// budget. Does nothing if no frame is in progress.
    pub fn record_frame_end(&mut self) {
        let Some(start) = self.frame_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.frame_duration.as_secs_f64();
        self.metrics.budget_utilization = utilization;

        if utilization >= self.config.budget_warn_threshold {
            warn!(
                frame = self.frame_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.frame_duration.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "frame work approaching budget"
            );
        }

        if self.config.metrics_enabled {
            if elapsed > self.metrics.max_frame_time {
                self.metrics.max_frame_time = elapsed;
            }
            let alpha = 0.1;
            let prev = self.metrics.avg_frame_time.as_secs_f64();
            let curr = elapsed.as_secs_f64();
            self.metrics.avg_frame_time =
                Duration::from_secs_f64(prev * (1.0 - alpha) + curr * alpha);
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frame_rate_hz(&self) -> u32 {
        self.config.frame_rate_hz
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_clamps_rate() {
        assert_eq!(FrameConfig::with_rate(0).validated().frame_rate_hz, 1);
        assert_eq!(
            FrameConfig::with_rate(1000).validated().frame_rate_hz,
            FrameConfig::MAX_FRAME_RATE_HZ
        );
    }

    #[test]
    fn test_validated_raises_max_dt_to_one_frame() {
        let config = FrameConfig {
            frame_rate_hz: 10,
            max_dt: Duration::from_millis(1),
            ..FrameConfig::default()
        }
        .validated();
        assert_eq!(config.max_dt, Duration::from_millis(100));
    }

    #[test]
    fn test_validated_clamps_threshold() {
        let config = FrameConfig {
            budget_warn_threshold: 3.0,
            ..FrameConfig::default()
        }
        .validated();
        assert_eq!(config.budget_warn_threshold, 1.0);
    }
}
