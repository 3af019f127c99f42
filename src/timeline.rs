//! # BAC Timeline Generation
//!
//! Samples the Widmark curve across a window of past and future instants so the
//! caller can draw a chart and answer "when will I be sober?".
//!
//! ## Sampling Grid
//!
//! Samples sit at `now - past`, `now - past + step`, ..., up to `now + future`:
//! - **Count**: `floor((past + future) / step) + 1`
//! - **Inclusive ends**: the first sample is exactly `now - past`; the last lands on
//!   `now + future` when the window is a whole number of steps, otherwise short of it
//! - **Now marker**: when `past` is a multiple of `step` one sample falls exactly on `now`
//!
//! Every sample reuses [`BacModel::contribution`], so a drink logged at `t0`
//! contributes nothing to samples before `t0`.
//!
//! ## Window Presets
//! - [`TimelineWindow::rolling`]: 8 h back, 4 h ahead, 5-minute steps (145 samples)
//! - [`TimelineWindow::trailing_day`]: 24 h back, nothing ahead, 15-minute steps (97 samples)

use crate::{BacError, BacModel, DrinkEvent, TimelineSample, UserProfile};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Current BAC at or above this reports the time it drops below 0.5 g/L
const SOBER_TARGET_HIGH: f64 = 0.5;

/// Current BAC at or above this (and below 0.5) reports the time it drops below 0.2 g/L
const SOBER_TARGET_LOW: f64 = 0.2;

/// Longest span (past plus future) a window may cover
const MAX_WINDOW_SPAN_HOURS: i64 = 7 * 24;

/// Most samples a single window may produce
const MAX_WINDOW_SAMPLES: usize = 10_000;

/// Span of a timeline around "now" and its sampling step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineWindow {
    past: Duration,
    future: Duration,
    step: Duration,
}

impl Default for TimelineWindow {
    fn default() -> Self {
        Self::rolling()
    }
}

impl TimelineWindow {
    /// Build a window, rejecting a non-positive step, negative spans, a span over a
    /// week, or more than 10 000 samples.
    pub fn new(past: Duration, future: Duration, step: Duration) -> Result<Self, BacError> {
        if step <= Duration::zero() {
            return Err(BacError::InvalidWindow(format!(
                "step must be positive, got {} s",
                step.num_seconds()
            )));
        }
        if past < Duration::zero() || future < Duration::zero() {
            return Err(BacError::InvalidWindow(
                "past and future spans must not be negative".to_string(),
            ));
        }
        let max_span = Duration::hours(MAX_WINDOW_SPAN_HOURS);
        match past.checked_add(&future) {
            Some(span) if span <= max_span => {}
            _ => {
                return Err(BacError::InvalidWindow(format!(
                    "past plus future exceeds {MAX_WINDOW_SPAN_HOURS} h"
                )))
            }
        }
        let window = Self { past, future, step };
        if window.sample_count() > MAX_WINDOW_SAMPLES {
            return Err(BacError::InvalidWindow(format!(
                "{} samples exceeds {MAX_WINDOW_SAMPLES}",
                window.sample_count()
            )));
        }
        Ok(window)
    }

    /// 8 hours of history and 4 hours of projection at 5-minute steps.
    pub fn rolling() -> Self {
        Self {
            past: Duration::hours(8),
            future: Duration::hours(4),
            step: Duration::minutes(5),
        }
    }

    /// A single trailing 24-hour window at 15-minute steps.
    pub fn trailing_day() -> Self {
        Self {
            past: Duration::hours(24),
            future: Duration::zero(),
            step: Duration::minutes(15),
        }
    }

    pub fn past(&self) -> Duration {
        self.past
    }

    pub fn future(&self) -> Duration {
        self.future
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Number of samples the window produces, both ends included.
    pub fn sample_count(&self) -> usize {
        let span_ms = (self.past + self.future).num_milliseconds();
        let step_ms = self.step.num_milliseconds().max(1);
        (span_ms / step_ms) as usize + 1
    }
}

/// Sampled BAC curve anchored on the instant it was generated for.
///
/// # Example
/// ```
/// use bac_tracker_lib::{generate_timeline, DrinkEvent, Sex, TimelineWindow, UserProfile};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2025, 7, 24, 22, 0, 0).unwrap();
/// let profile = UserProfile::new(70.0, Sex::Male).unwrap();
/// let wine = DrinkEvent::new("Wine", 125.0, 12.0, now - Duration::minutes(30)).unwrap();
///
/// let timeline = generate_timeline(&[wine], &profile, now, &TimelineWindow::rolling());
/// assert_eq!(timeline.samples.len(), 145);
/// assert!(timeline.current().unwrap().bac > 0.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BacTimeline {
    /// Samples in ascending time order
    pub samples: Vec<TimelineSample>,
    /// Instant the window was centred on
    pub now: DateTime<Utc>,
}

/// "Sober at" report: the threshold being waited for and when it is reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoberTarget {
    /// 0.5, 0.2 or 0 g/L depending on the current level
    pub threshold: f64,
    /// First sample at or after now below the threshold, if inside the window
    pub at: Option<DateTime<Utc>>,
}

impl BacTimeline {
    /// Latest sample at or before `now`.
    pub fn current(&self) -> Option<&TimelineSample> {
        self.samples.iter().rev().find(|sample| sample.time <= self.now)
    }

    /// Sample with the highest BAC (earliest one on ties).
    pub fn peak(&self) -> Option<&TimelineSample> {
        self.samples
            .iter()
            .fold(None, |best: Option<&TimelineSample>, sample| match best {
                Some(b) if b.bac >= sample.bac => Some(b),
                _ => Some(sample),
            })
    }

    /// Samples worth plotting: those with alcohol still in the blood.
    pub fn nonzero(&self) -> impl Iterator<Item = &TimelineSample> {
        self.samples.iter().filter(|sample| sample.bac > 0.0)
    }

    /// First sample at or after `now` whose BAC has dropped below `threshold`.
    ///
    /// A threshold of zero waits for the BAC to reach exactly zero.
    pub fn crossing_below(&self, threshold: f64) -> Option<&TimelineSample> {
        self.samples
            .iter()
            .filter(|sample| sample.time >= self.now)
            .find(|sample| {
                if threshold <= 0.0 {
                    sample.bac <= 0.0
                } else {
                    sample.bac < threshold
                }
            })
    }

    /// First zero sample that follows a positive one anywhere in the window.
    pub fn first_zero(&self) -> Option<&TimelineSample> {
        self.samples
            .windows(2)
            .find(|pair| pair[0].bac > 0.0 && pair[1].bac <= 0.0)
            .map(|pair| &pair[1])
    }

    /// Pick the next threshold below the current level and find when it is crossed.
    ///
    /// `None` when there is no current sample or the BAC is already zero.
    pub fn sober_target(&self) -> Option<SoberTarget> {
        let current = self.current()?.bac;
        if current <= 0.0 {
            return None;
        }

        let threshold = if current >= SOBER_TARGET_HIGH {
            SOBER_TARGET_HIGH
        } else if current >= SOBER_TARGET_LOW {
            SOBER_TARGET_LOW
        } else {
            0.0
        };

        Some(SoberTarget {
            threshold,
            at: self.crossing_below(threshold).map(|sample| sample.time),
        })
    }

    /// When the BAC reaches zero, if that happens inside the window.
    pub fn sober_at(&self) -> Option<DateTime<Utc>> {
        self.crossing_below(0.0).map(|sample| sample.time)
    }
}

impl BacModel {
    /// Sample this model across `window` around `now`.
    pub fn timeline(
        &self,
        drinks: &[DrinkEvent],
        profile: &UserProfile,
        now: DateTime<Utc>,
        window: &TimelineWindow,
    ) -> BacTimeline {
        let start = now - window.past;
        let count = window.sample_count();
        let mut samples = Vec::with_capacity(count);

        for step in 0..count {
            let time = start + window.step * step as i32;
            samples.push(TimelineSample {
                time,
                bac: self.bac_at(drinks, profile, time),
            });
        }

        BacTimeline { samples, now }
    }
}

/// Sample the default model across `window` around `now`.
pub fn generate_timeline(
    drinks: &[DrinkEvent],
    profile: &UserProfile,
    now: DateTime<Utc>,
    window: &TimelineWindow,
) -> BacTimeline {
    BacModel::default().timeline(drinks, profile, now, window)
}
