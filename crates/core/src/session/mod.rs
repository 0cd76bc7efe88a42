//! The single active source / window / clock triple of the viewer.
//!
//! A [`Session`] owns every data source the user can pick from and routes the
//! selected one either to the live view or to the [`Player`]. Switching
//! sources always disables the player first so no clock keeps driving a
//! window over a store that is about to be replaced.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    calibration::{CalibrationSet, RawReading},
    config::AppConfig,
    cursor::CursorPosition,
    playback::Player,
    store::{Sample, SampleStore, CHANNEL_COUNT},
    sync::WindowUpdate,
    Result,
};

/// Data sources selectable in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Ring of the most recent streamed samples.
    Live,
    /// Samples captured from the live stream while recording was on.
    Recorded,
    /// A recording handed over by the file import collaborator.
    File,
}

#[derive(Debug)]
pub struct Session {
    calibration: CalibrationSet,
    live: SampleStore,
    recorded: SampleStore,
    file: SampleStore,
    recording: bool,
    selected: SourceKind,
    player: Player,
}

impl Session {
    /// Creates a session showing the (empty) live source.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let player = Player::new(config)?;
        Ok(Self {
            calibration: config.calibration,
            live: SampleStore::live_window(config.live.capacity),
            recorded: SampleStore::recording(),
            file: SampleStore::recording(),
            recording: false,
            selected: SourceKind::Live,
            player,
        })
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn selected(&self) -> SourceKind {
        self.selected
    }

    pub fn source(&self, kind: SourceKind) -> &SampleStore {
        match kind {
            SourceKind::Live => &self.live,
            SourceKind::Recorded => &self.recorded,
            SourceKind::File => &self.file,
        }
    }

    pub fn calibration(&self) -> &CalibrationSet {
        &self.calibration
    }

    /// Swaps the calibration applied to samples ingested from now on.
    pub fn set_calibration(&mut self, calibration: CalibrationSet) {
        self.calibration = calibration;
    }

    /// Switches the viewer to `kind`. Recorded and file sources enable the
    /// player on a copy of the store; the live source leaves it disabled.
    pub fn select(&mut self, kind: SourceKind) {
        self.player.disable();
        self.selected = kind;
        tracing::info!(source = ?kind, "source selected");

        match kind {
            SourceKind::Live => {
                self.publish_live();
            }
            SourceKind::Recorded | SourceKind::File => {
                let store = self.source(kind).clone();
                self.player.enable(store);
            }
        }
    }

    /// Ingestion boundary: calibrates a raw frame once and appends it to the
    /// live ring, and to the recording while recording is on.
    pub fn ingest(&mut self, timestamp_ms: u64, raw: [RawReading; CHANNEL_COUNT]) -> Sample {
        let sample = Sample::calibrated(timestamp_ms, raw, &self.calibration);
        self.push(sample);
        sample
    }

    /// Appends an already calibrated sample to the live stream.
    pub fn push(&mut self, sample: Sample) {
        self.live.append(sample);
        if self.recording {
            self.recorded.append(sample);
        }
        if self.selected == SourceKind::Live {
            self.publish_live();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn start_recording(&mut self) {
        if !self.recording {
            tracing::info!("recording started");
            self.recording = true;
        }
    }

    /// Stops appending live samples to the recording. The recording is kept.
    pub fn stop_recording(&mut self) -> &SampleStore {
        if self.recording {
            tracing::info!(samples = self.recorded.len(), "recording stopped");
            self.recording = false;
        }
        &self.recorded
    }

    pub fn recording(&self) -> &SampleStore {
        &self.recorded
    }

    /// Drops the recording; playback over it is disabled first.
    pub fn clear_recording(&mut self) {
        if self.selected == SourceKind::Recorded {
            self.player.disable();
        }
        self.recorded.clear();
        tracing::info!("recording cleared");
    }

    /// Replaces the file source with `store` and shows it.
    pub fn load_file(&mut self, store: SampleStore) {
        tracing::info!(samples = store.len(), "file source loaded");
        self.file = store;
        self.select(SourceKind::File);
    }

    /// Cuts the selected recorded or file source down to the visible window.
    /// Returns `false` for the live source or when nothing is visible.
    pub fn trim_selection(&mut self) -> bool {
        if self.selected == SourceKind::Live {
            return false;
        }
        let Some(trimmed) = self.player.trim_to_window() else {
            return false;
        };

        match self.selected {
            SourceKind::Recorded => self.recorded = trimmed,
            SourceKind::File => self.file = trimmed,
            SourceKind::Live => {}
        }
        true
    }

    /// Publishes the whole live ring with the head on the newest sample. An
    /// empty ring still publishes an empty slice so listeners drop whatever
    /// the previous source showed.
    fn publish_live(&mut self) {
        let last = self.live.len().saturating_sub(1);
        let update = WindowUpdate {
            slice: Arc::new(self.live.clone()),
            head_offset: last,
            window_shifted: true,
            position: CursorPosition {
                start: 0,
                head: last,
                end: last,
            },
        };
        self.player.hub_mut().notify(&update);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use super::*;
    use crate::{calibration::ChannelCalibration, timeline::ClockState};

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.window.max_range = 40;
        config.live.capacity = 5;
        config
    }

    fn feed(session: &mut Session, from: u64, count: u64) {
        for i in from..from + count {
            session.ingest(i * 10, [i as u16; CHANNEL_COUNT]);
        }
    }

    fn recorder(session: &mut Session) -> Rc<RefCell<Vec<WindowUpdate>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        session
            .player_mut()
            .hub_mut()
            .on_window_update(move |update: &WindowUpdate| sink.borrow_mut().push(update.clone()));
        log
    }

    #[test]
    fn live_source_publishes_whole_ring() {
        let mut session = Session::new(&config()).unwrap();
        let log = recorder(&mut session);

        feed(&mut session, 0, 8);

        let updates = log.borrow();
        assert_eq!(updates.len(), 8);
        let latest = updates.last().unwrap();
        assert_eq!(latest.slice.len(), 5);
        assert_eq!(latest.head_offset, 4);
        assert!(latest.window_shifted);
        assert_eq!(latest.head_sample().map(|s| s.timestamp_ms), Some(70));
        assert_eq!(session.player().state(), ClockState::Disabled);
    }

    #[test]
    fn recording_captures_only_while_active() {
        let mut session = Session::new(&config()).unwrap();
        feed(&mut session, 0, 3);
        session.start_recording();
        feed(&mut session, 3, 20);
        assert_eq!(session.stop_recording().len(), 20);
        feed(&mut session, 23, 3);

        assert_eq!(session.recording().len(), 20);
        assert_eq!(session.recording().first().map(|s| s.timestamp_ms), Some(30));
        assert_eq!(session.source(SourceKind::Live).len(), 5);
    }

    #[test]
    fn selecting_recorded_source_enables_playback() {
        let mut session = Session::new(&config()).unwrap();
        session.start_recording();
        feed(&mut session, 0, 100);
        session.stop_recording();

        session.select(SourceKind::Recorded);
        assert_eq!(session.player().state(), ClockState::Paused);
        assert_eq!(session.player().position().map(|p| p.end), Some(39));

        session.select(SourceKind::Live);
        assert_eq!(session.player().state(), ClockState::Disabled);
    }

    #[test]
    fn selecting_empty_live_ring_clears_listeners() {
        let mut session = Session::new(&config()).unwrap();
        session.load_file(SampleStore::from_samples(
            (0..10).map(|i| Sample::uncalibrated(i * 10, [0; CHANNEL_COUNT])),
        ));

        let log = recorder(&mut session);
        session.select(SourceKind::Live);

        let updates = log.borrow();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].slice.is_empty());
        assert!(updates[0].window_shifted);
        assert!(updates[0].head_sample().is_none());
        assert_eq!(
            updates[0].position,
            CursorPosition {
                start: 0,
                head: 0,
                end: 0
            }
        );
        assert_eq!(session.player().state(), ClockState::Disabled);
    }

    #[test]
    fn loading_a_file_replaces_a_playing_one() {
        let mut session = Session::new(&config()).unwrap();
        session.load_file(SampleStore::from_samples(
            (0..100).map(|i| Sample::uncalibrated(i * 10, [0; CHANNEL_COUNT])),
        ));
        session.player_mut().play();
        session.player_mut().advance(Duration::from_millis(50));

        let log = recorder(&mut session);
        session.load_file(SampleStore::from_samples(
            (0..20).map(|i| Sample::uncalibrated(5_000 + i * 10, [0; CHANNEL_COUNT])),
        ));

        assert_eq!(session.player_mut().advance(Duration::from_millis(50)), 0);
        assert_eq!(session.player().state(), ClockState::Paused);
        assert_eq!(
            session.player().position(),
            Some(CursorPosition {
                start: 0,
                head: 0,
                end: 19
            })
        );
        let updates = log.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].head_sample().map(|s| s.timestamp_ms), Some(5_000));
    }

    #[test]
    fn selecting_empty_source_stays_disabled() {
        let mut session = Session::new(&config()).unwrap();
        session.select(SourceKind::File);
        assert_eq!(session.player().state(), ClockState::Disabled);
    }

    #[test]
    fn clearing_selected_recording_disables_playback() {
        let mut session = Session::new(&config()).unwrap();
        session.start_recording();
        feed(&mut session, 0, 10);
        session.select(SourceKind::Recorded);
        session.player_mut().play();

        session.clear_recording();
        assert_eq!(session.player().state(), ClockState::Disabled);
        assert!(session.recording().is_empty());
        assert!(session.is_recording());
    }

    #[test]
    fn trim_selection_replaces_file_source() {
        let mut session = Session::new(&config()).unwrap();
        session.load_file(SampleStore::from_samples(
            (0..100).map(|i| Sample::uncalibrated(i * 10, [0; CHANNEL_COUNT])),
        ));
        session.player_mut().set_head(70);

        assert!(session.trim_selection());
        let file = session.source(SourceKind::File);
        assert_eq!(file.len(), 40);
        assert_eq!(file.first().map(|s| s.timestamp_ms), Some(390));

        session.select(SourceKind::Live);
        assert!(!session.trim_selection());
    }

    #[test]
    fn calibration_applies_at_ingestion_only() {
        let mut session = Session::new(&config()).unwrap();
        let first = session.ingest(0, [100; CHANNEL_COUNT]);
        assert_eq!(first.values, [100.0; CHANNEL_COUNT]);

        let mut calibration = CalibrationSet::default();
        calibration.set_channel(0, ChannelCalibration::force_sensor());
        session.set_calibration(calibration);
        let second = session.ingest(10, [100; CHANNEL_COUNT]);

        let live = session.source(SourceKind::Live);
        assert_eq!(live.get(0).map(|s| s.values[0]), Some(100.0));
        assert_eq!(live.get(1).map(|s| s.values[0]), Some(second.values[0]));
        assert!(second.values[0] < 5.0);
    }
}
