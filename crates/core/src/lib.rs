//! Core library for the Insole Viewer.
//!
//! The crate holds the multi-channel pressure samples streamed from the
//! insole and the engine that navigates them: a cursor window over a store,
//! a playback clock that walks the head through it, and a hub that tells
//! renderers what became visible. Transports, file formats and drawing live
//! with the callers.

pub mod calibration;
pub mod config;
pub mod cursor;
pub mod error;
pub mod playback;
pub mod session;
pub mod store;
pub mod sync;
pub mod timeline;

pub use calibration::{CalibrationSet, ChannelCalibration, RawReading};
pub use config::{AppConfig, LiveConfig, PlaybackConfig, WindowConfig};
pub use cursor::{CursorPosition, CursorWindow, WindowSlice};
pub use error::{InsoleError, Result};
pub use playback::{Player, TimestampLabels};
pub use session::{Session, SourceKind};
pub use store::{Sample, SampleStore, StoreKind, CHANNEL_COUNT};
pub use sync::{HeatmapMode, ListenerId, SyncHub, WindowListener, WindowUpdate};
pub use timeline::{format_timestamp, ClockState, PlaybackClock};
