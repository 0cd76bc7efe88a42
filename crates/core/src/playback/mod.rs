//! Scrubbing and timed playback over a recorded store.
//!
//! [`Player`] is the only writer of the head: clock ticks and user scrubbing
//! both end up in the same cursor setters, and each effective change is
//! published through the [`SyncHub`] before the call returns.

use std::{sync::Arc, time::Duration};

use crate::{
    config::AppConfig,
    cursor::{CursorPosition, CursorWindow},
    store::SampleStore,
    sync::{SyncHub, WindowUpdate},
    timeline::{format_timestamp, ClockState, PlaybackClock},
    Result,
};

/// `mm:ss.mmm` labels for the store start, the head and the store end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampLabels {
    pub start: String,
    pub head: String,
    pub end: String,
}

impl Default for TimestampLabels {
    fn default() -> Self {
        let zero = format_timestamp(0);
        Self {
            start: zero.clone(),
            head: zero.clone(),
            end: zero,
        }
    }
}

#[derive(Debug)]
pub struct Player {
    max_range: usize,
    skip_step: usize,
    clock: PlaybackClock,
    window: Option<CursorWindow>,
    visible: Option<Arc<SampleStore>>,
    hub: SyncHub,
}

impl Player {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let clock = PlaybackClock::new(config.playback.sample_rate_hz)
            .with_default_rate(config.playback.default_rate)?;
        Ok(Self {
            max_range: config.window.max_range,
            skip_step: config.playback.skip_step,
            clock,
            window: None,
            visible: None,
            hub: SyncHub::new(),
        })
    }

    pub fn hub(&self) -> &SyncHub {
        &self.hub
    }

    pub fn hub_mut(&mut self) -> &mut SyncHub {
        &mut self.hub
    }

    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn position(&self) -> Option<CursorPosition> {
        self.window.as_ref().map(CursorWindow::position)
    }

    pub fn store(&self) -> Option<&SampleStore> {
        self.window.as_ref().map(CursorWindow::store)
    }

    /// Attaches a fresh cursor window to `store` and pauses. An empty store
    /// leaves the player disabled.
    pub fn enable(&mut self, store: SampleStore) {
        self.disable();

        let len = store.len();
        let Some(window) = CursorWindow::attach(store, self.max_range) else {
            tracing::info!("empty store, playback stays disabled");
            return;
        };
        tracing::info!(samples = len, "playback enabled");

        self.window = Some(window);
        self.clock.enable();
        self.publish(true);
    }

    /// Cancels playback, drops the window and restores the default rate.
    pub fn disable(&mut self) {
        if self.window.take().is_some() {
            tracing::info!("playback disabled");
        }
        self.visible = None;
        self.clock.disable();
    }

    /// Starts ticking. Stays paused when the head already sits on the last
    /// sample, since there is nothing left to play.
    pub fn play(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        if window.head() + 1 >= window.store().len() {
            tracing::debug!("head at end of data, not starting playback");
            return;
        }
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Play/pause button behaviour.
    pub fn toggle(&mut self) {
        match self.clock.state() {
            ClockState::Playing => self.pause(),
            ClockState::Paused => self.play(),
            ClockState::Disabled => {}
        }
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        self.clock.set_rate(rate)
    }

    /// Feeds elapsed wall time to the clock and applies the ticks that fell
    /// due, never more than the samples left after the head. Returns the
    /// number of ticks applied.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let left = self.window.as_ref().map_or(0, |window| {
            let left = window.store().len() - 1 - window.head();
            u32::try_from(left).unwrap_or(u32::MAX)
        });
        let due = self.clock.advance(elapsed).min(left);
        let mut applied = 0;
        for _ in 0..due {
            if !self.clock.is_playing() || !self.tick() {
                break;
            }
            applied += 1;
        }
        applied
    }

    /// Moves the head one sample forward, pausing once it lands on the last
    /// sample. Returns `false` when there was nothing left to advance.
    fn tick(&mut self) -> bool {
        let Some(window) = self.window.as_mut() else {
            return false;
        };

        let last = window.store().len() - 1;
        if window.head() >= last {
            self.clock.pause();
            return false;
        }

        let next = window.head() + 1;
        let shifted = window.set_head(next as i64);
        if next >= last {
            tracing::debug!(head = last, "playback reached end of data");
            self.clock.pause();
        }
        self.publish(shifted);
        true
    }

    pub fn set_start(&mut self, value: i64) -> Option<WindowUpdate> {
        self.mutate(|window| {
            window.set_start(value);
            true
        })
    }

    pub fn set_end(&mut self, value: i64) -> Option<WindowUpdate> {
        self.mutate(|window| {
            window.set_end(value);
            true
        })
    }

    pub fn set_head(&mut self, value: i64) -> Option<WindowUpdate> {
        self.mutate(|window| window.set_head(value))
    }

    pub fn skip_forward(&mut self) -> Option<WindowUpdate> {
        let step = self.skip_step as i64;
        let head = self.window.as_ref()?.head() as i64;
        self.set_head(head + step)
    }

    pub fn skip_backward(&mut self) -> Option<WindowUpdate> {
        let step = self.skip_step as i64;
        let head = self.window.as_ref()?.head() as i64;
        self.set_head(head - step)
    }

    /// Drags the visible range, head included, by `delta` samples.
    pub fn shift_window(&mut self, delta: i64) -> Option<WindowUpdate> {
        self.mutate(|window| window.shift_by(delta))
    }

    /// Widens the window to the configured maximum around the head.
    pub fn maximize_window(&mut self) -> Option<WindowUpdate> {
        self.mutate(CursorWindow::maximize_around_head)
    }

    /// Replaces the store with the visible range and re-enables playback on it.
    pub fn trim_to_window(&mut self) -> Option<SampleStore> {
        let trimmed = self.window.as_ref()?.slice().samples;
        tracing::info!(samples = trimmed.len(), "trimming to visible window");
        self.enable(trimmed.clone());
        Some(trimmed)
    }

    /// The update describing the current window, without notifying anyone.
    pub fn current(&mut self) -> Option<WindowUpdate> {
        let position = self.window.as_ref()?.position();
        Some(self.build_update(position, false))
    }

    pub fn timestamps(&self) -> TimestampLabels {
        let Some(window) = &self.window else {
            return TimestampLabels::default();
        };
        let store = window.store();
        let at = |index: usize| {
            format_timestamp(store.get(index).map_or(0, |sample| sample.timestamp_ms))
        };
        TimestampLabels {
            start: at(0),
            head: at(window.head()),
            end: at(store.len() - 1),
        }
    }

    /// Runs `change` against the window and publishes the result if the
    /// cursors moved. `change` reports whether start or end may have moved.
    /// Ignored while disabled.
    fn mutate<F>(&mut self, change: F) -> Option<WindowUpdate>
    where
        F: FnOnce(&mut CursorWindow) -> bool,
    {
        let window = self.window.as_mut()?;
        let before = window.position();
        let range_touched = change(window);
        let after = window.position();
        if before == after {
            return None;
        }

        let window_shifted =
            range_touched && (before.start != after.start || before.end != after.end);
        self.publish(window_shifted)
    }

    fn publish(&mut self, window_shifted: bool) -> Option<WindowUpdate> {
        let position = self.window.as_ref()?.position();
        let update = self.build_update(position, window_shifted);
        self.hub.notify(&update);
        Some(update)
    }

    fn build_update(&mut self, position: CursorPosition, window_shifted: bool) -> WindowUpdate {
        if window_shifted || self.visible.is_none() {
            let samples = self
                .window
                .as_ref()
                .map(|window| window.slice().samples)
                .unwrap_or_default();
            self.visible = Some(Arc::new(samples));
        }
        WindowUpdate {
            slice: self.visible.clone().unwrap_or_default(),
            head_offset: position.head_offset(),
            window_shifted,
            position,
        }
    }
}
