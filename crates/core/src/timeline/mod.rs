use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{InsoleError, Result};

/// Sample rate of the reference insole firmware.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100;

/// Slowest and fastest accepted playback multipliers.
pub const MIN_RATE: f64 = 0.01;
pub const MAX_RATE: f64 = 1_000.0;

/// Playback state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    /// No source attached, or playback explicitly disabled.
    Disabled,
    Paused,
    Playing,
}

/// Virtual-time tick generator driving playback.
///
/// The clock never reads wall time itself; the host feeds elapsed time into
/// [`advance`](Self::advance) and receives the number of ticks that fell due.
/// Pausing, disabling or changing the rate drops any partially elapsed
/// interval, so nothing scheduled before the change can fire after it.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    base_interval: Duration,
    default_rate: f64,
    rate: f64,
    state: ClockState,
    until_next_tick: Duration,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE_HZ)
    }
}

impl PlaybackClock {
    /// Creates a disabled clock ticking once per sample at `sample_rate_hz`.
    pub fn new(sample_rate_hz: u32) -> Self {
        let base_interval = Duration::from_secs(1) / sample_rate_hz.max(1);
        Self {
            base_interval,
            default_rate: 1.0,
            rate: 1.0,
            state: ClockState::Disabled,
            until_next_tick: Duration::ZERO,
        }
    }

    /// Uses `rate` instead of 1.0 after construction and after every
    /// [`disable`](Self::disable).
    pub fn with_default_rate(mut self, rate: f64) -> Result<Self> {
        validate_rate(rate)?;
        self.default_rate = rate;
        self.rate = rate;
        Ok(self)
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == ClockState::Playing
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// Time between two ticks at the current rate.
    pub fn tick_interval(&self) -> Duration {
        // A zero interval would make `advance` spin forever.
        self.base_interval
            .div_f64(self.rate)
            .max(Duration::from_nanos(1))
    }

    /// Moves from `Disabled` to `Paused`. Other states are left alone.
    pub fn enable(&mut self) {
        if self.state == ClockState::Disabled {
            self.transition(ClockState::Paused);
        }
    }

    /// Stops ticking and restores the default rate.
    pub fn disable(&mut self) {
        self.rate = self.default_rate;
        self.transition(ClockState::Disabled);
    }

    /// Starts ticking; the first tick is due one interval from now.
    /// Ignored unless paused.
    pub fn play(&mut self) {
        if self.state == ClockState::Paused {
            self.transition(ClockState::Playing);
        }
    }

    /// Cancels the pending tick. Ignored unless playing.
    pub fn pause(&mut self) {
        if self.state == ClockState::Playing {
            self.transition(ClockState::Paused);
        }
    }

    /// Changes the rate multiplier. While playing, the pending tick is
    /// cancelled and rescheduled at the new interval.
    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        validate_rate(rate)?;
        self.rate = rate;
        if self.state == ClockState::Playing {
            self.until_next_tick = self.tick_interval();
        }
        tracing::debug!(rate, interval = ?self.tick_interval(), "playback rate changed");
        Ok(())
    }

    /// Feeds `elapsed` wall time into the clock and returns how many ticks
    /// fell due, saturating at `u32::MAX`. Always zero unless playing.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.state != ClockState::Playing {
            return 0;
        }
        if elapsed < self.until_next_tick {
            self.until_next_tick -= elapsed;
            return 0;
        }

        let interval = self.tick_interval();
        let interval_ns = interval.as_nanos();
        let past_due = (elapsed - self.until_next_tick).as_nanos();
        let into_interval = (past_due % interval_ns) as u64;
        self.until_next_tick = interval - Duration::from_nanos(into_interval);

        u32::try_from(past_due / interval_ns + 1).unwrap_or(u32::MAX)
    }

    fn transition(&mut self, next: ClockState) {
        self.until_next_tick = match next {
            ClockState::Playing => self.tick_interval(),
            ClockState::Paused | ClockState::Disabled => Duration::ZERO,
        };
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "playback clock transition");
            self.state = next;
        }
    }
}

fn validate_rate(rate: f64) -> Result<()> {
    if (MIN_RATE..=MAX_RATE).contains(&rate) {
        Ok(())
    } else {
        Err(InsoleError::InvalidInput(
            "playback rate must be between 0.01 and 1000",
        ))
    }
}

/// Formats a millisecond timestamp as `mm:ss.mmm`. Minutes keep growing past 59.
pub fn format_timestamp(millis: u64) -> String {
    let total_seconds = millis / 1_000;
    format!(
        "{:02}:{:02}.{:03}",
        total_seconds / 60,
        total_seconds % 60,
        millis % 1_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn playing_clock() -> PlaybackClock {
        let mut clock = PlaybackClock::new(100);
        clock.enable();
        clock.play();
        clock
    }

    #[test]
    fn starts_disabled_and_never_ticks() {
        let mut clock = PlaybackClock::default();
        assert_eq!(clock.state(), ClockState::Disabled);
        clock.play();
        assert_eq!(clock.state(), ClockState::Disabled);
        assert_eq!(clock.advance(ms(1_000)), 0);
    }

    #[test]
    fn ticks_once_per_interval() {
        let mut clock = playing_clock();
        assert_eq!(clock.tick_interval(), ms(10));

        assert_eq!(clock.advance(ms(9)), 0);
        assert_eq!(clock.advance(ms(1)), 1);
        assert_eq!(clock.advance(ms(35)), 3);
        assert_eq!(clock.advance(ms(5)), 1);
    }

    #[test]
    fn rate_multiplier_shortens_interval() {
        let mut clock = playing_clock();
        clock.set_rate(2.0).unwrap();
        assert_eq!(clock.tick_interval(), ms(5));
        assert_eq!(clock.advance(ms(20)), 4);

        clock.set_rate(0.5).unwrap();
        assert_eq!(clock.tick_interval(), ms(20));
    }

    #[test]
    fn rate_change_while_playing_reschedules_pending_tick() {
        let mut clock = playing_clock();
        assert_eq!(clock.advance(ms(8)), 0);

        clock.set_rate(0.5).unwrap();
        assert_eq!(clock.advance(ms(2)), 0);
        assert_eq!(clock.advance(ms(18)), 1);
    }

    #[test]
    fn pause_cancels_pending_tick() {
        let mut clock = playing_clock();
        assert_eq!(clock.advance(ms(9)), 0);
        clock.pause();
        assert_eq!(clock.advance(ms(100)), 0);

        clock.play();
        assert_eq!(clock.advance(ms(1)), 0);
        assert_eq!(clock.advance(ms(9)), 1);
    }

    #[test]
    fn rate_is_kept_across_pause_and_reset_by_disable() {
        let mut clock = PlaybackClock::new(100);
        clock.set_rate(4.0).unwrap();
        clock.enable();
        clock.play();
        assert_eq!(clock.advance(ms(10)), 4);

        clock.disable();
        assert_eq!(clock.rate(), 1.0);
        assert_eq!(clock.state(), ClockState::Disabled);
    }

    #[test]
    fn long_gaps_are_counted_without_stepping() {
        let mut clock = playing_clock();
        clock.advance(ms(4));
        assert_eq!(clock.advance(Duration::from_secs(1_000)), 100_000);
        assert_eq!(clock.advance(ms(5)), 0);
        assert_eq!(clock.advance(ms(1)), 1);
    }

    #[test]
    fn due_ticks_saturate_instead_of_overflowing() {
        let mut clock = playing_clock();
        clock.set_rate(MAX_RATE).unwrap();
        assert_eq!(clock.advance(Duration::from_secs(43_200)), u32::MAX);
        assert_eq!(clock.advance(Duration::ZERO), 0);
        assert!(clock.is_playing());
    }

    #[test]
    fn rejects_invalid_rates() {
        let mut clock = playing_clock();
        for rate in [0.0, -1.0, 1e-9, 1e9, f64::NAN, f64::INFINITY] {
            assert!(clock.set_rate(rate).is_err());
        }
        assert_eq!(clock.rate(), 1.0);
        assert!(PlaybackClock::new(100).with_default_rate(0.0).is_err());
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_timestamp(0), "00:00.000");
        assert_eq!(format_timestamp(61_005), "01:01.005");
        assert_eq!(format_timestamp(6_000_000), "100:00.000");
    }
}
