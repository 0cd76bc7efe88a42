use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationSet, RawReading};

/// Number of pressure channels carried by every sample.
pub const CHANNEL_COUNT: usize = 5;

/// One multi-channel reading. Raw values are kept next to their calibrated
/// counterparts so that calibration never runs on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub raw: [RawReading; CHANNEL_COUNT],
    pub values: [f64; CHANNEL_COUNT],
}

impl Sample {
    /// Builds a sample by running `calibration` over the raw readings once.
    pub fn calibrated(
        timestamp_ms: u64,
        raw: [RawReading; CHANNEL_COUNT],
        calibration: &CalibrationSet,
    ) -> Self {
        Self {
            timestamp_ms,
            raw,
            values: calibration.apply(&raw),
        }
    }

    /// Builds a sample with identity calibration.
    pub fn uncalibrated(timestamp_ms: u64, raw: [RawReading; CHANNEL_COUNT]) -> Self {
        Self {
            timestamp_ms,
            raw,
            values: raw.map(f64::from),
        }
    }
}

/// Retention policy of a [`SampleStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Unbounded; grows until replaced.
    Recording,
    /// Fixed-capacity FIFO keeping only the most recent `capacity` samples.
    LiveWindow { capacity: usize },
}

/// Ordered, index-addressable multi-channel sample buffer.
///
/// For [`StoreKind::LiveWindow`] indices are positions within the current
/// window and shift by one on every eviction, so they must not be cached
/// across appends.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStore {
    kind: StoreKind,
    samples: VecDeque<Sample>,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::recording()
    }
}

impl SampleStore {
    /// Creates an empty, unbounded recording.
    pub fn recording() -> Self {
        Self {
            kind: StoreKind::Recording,
            samples: VecDeque::new(),
        }
    }

    /// Creates an empty ring holding at most `capacity` samples. A zero
    /// capacity is bumped to one so the ring can always show the latest sample.
    pub fn live_window(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            kind: StoreKind::LiveWindow { capacity },
            samples: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Builds a recording from an already ordered sequence.
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut store = Self::recording();
        for sample in samples {
            store.append(sample);
        }
        store
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Ring capacity, or `None` for unbounded recordings.
    pub fn capacity(&self) -> Option<usize> {
        match self.kind {
            StoreKind::Recording => None,
            StoreKind::LiveWindow { capacity } => Some(capacity),
        }
    }

    /// Appends a sample, evicting the oldest one first when a live ring is full.
    pub fn append(&mut self, mut sample: Sample) {
        if let Some(last) = self.samples.back() {
            if sample.timestamp_ms < last.timestamp_ms {
                tracing::warn!(
                    previous = last.timestamp_ms,
                    received = sample.timestamp_ms,
                    "out-of-order sample timestamp, holding previous value"
                );
                sample.timestamp_ms = last.timestamp_ms;
            }
        }

        if let StoreKind::LiveWindow { capacity } = self.kind {
            while self.samples.len() >= capacity {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Calibrated values of one channel, oldest first.
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = f64> + '_ {
        self.samples
            .iter()
            .filter_map(move |sample| sample.values.get(channel).copied())
    }

    /// Raw readings of one channel, oldest first.
    pub fn raw_channel(&self, channel: usize) -> impl Iterator<Item = RawReading> + '_ {
        self.samples
            .iter()
            .filter_map(move |sample| sample.raw.get(channel).copied())
    }

    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().map(|sample| sample.timestamp_ms)
    }

    /// Time covered between the first and last sample.
    pub fn duration_ms(&self) -> u64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0,
        }
    }

    /// Copies `[start, end)` into a new recording. Bounds are clamped to
    /// `[0, len]`; inverted bounds yield an empty store.
    pub fn slice(&self, start: i64, end: i64) -> SampleStore {
        let len = self.samples.len();
        let start = clamp_index(start, len);
        let end = clamp_index(end, len);
        if start >= end {
            return Self::recording();
        }

        Self {
            kind: StoreKind::Recording,
            samples: self.samples.range(start..end).copied().collect(),
        }
    }

    /// Mean of every calibrated channel, or `None` when the store is empty.
    pub fn channel_means(&self) -> Option<[f64; CHANNEL_COUNT]> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sums = [0.0; CHANNEL_COUNT];
        for sample in &self.samples {
            for (sum, value) in sums.iter_mut().zip(sample.values) {
                *sum += value;
            }
        }
        let count = self.samples.len() as f64;
        Some(sums.map(|sum| sum / count))
    }

    /// Drops every sample while keeping the retention policy.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

fn clamp_index(index: i64, len: usize) -> usize {
    if index <= 0 {
        0
    } else {
        usize::try_from(index).map_or(len, |index| index.min(len))
    }
}
