use std::{f64::consts::PI, path::Path};

use insole_viewer_core::{CalibrationSet, RawReading, Result, Sample, SampleStore, CHANNEL_COUNT};
use serde::{Deserialize, Serialize};

/// Highest reading the insole ADC produces.
const ADC_MAX: f64 = 1023.0;
/// Length of one simulated step.
const STRIDE_MS: f64 = 1_100.0;
/// Fraction of the stride each sensor spends loaded, heel to toe.
const CHANNEL_PHASES: [(f64, f64); CHANNEL_COUNT] = [
    (0.00, 0.30),
    (0.10, 0.45),
    (0.20, 0.55),
    (0.30, 0.60),
    (0.40, 0.62),
];

/// On-disk frame: a timestamp and the uncalibrated readings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RecordedFrame {
    timestamp_ms: u64,
    raw: [RawReading; CHANNEL_COUNT],
}

/// Parses a JSON array of frames, calibrating each one once.
pub fn parse_recording(json: &str, calibration: &CalibrationSet) -> Result<SampleStore> {
    let frames: Vec<RecordedFrame> = serde_json::from_str(json)?;
    Ok(SampleStore::from_samples(frames.into_iter().map(|frame| {
        Sample::calibrated(frame.timestamp_ms, frame.raw, calibration)
    })))
}

pub fn load_recording(path: &Path, calibration: &CalibrationSet) -> Result<SampleStore> {
    let store = parse_recording(&std::fs::read_to_string(path)?, calibration)?;
    tracing::info!(?path, samples = store.len(), "loaded recording");
    Ok(store)
}

/// Writes raw readings only; calibration is re-applied on load.
pub fn save_recording(path: &Path, store: &SampleStore) -> Result<()> {
    let frames: Vec<RecordedFrame> = store
        .iter()
        .map(|sample| RecordedFrame {
            timestamp_ms: sample.timestamp_ms,
            raw: sample.raw,
        })
        .collect();
    std::fs::write(path, serde_json::to_vec_pretty(&frames)?)?;
    tracing::info!(?path, samples = frames.len(), "saved recording");
    Ok(())
}

/// Deterministic stand-in for the insole: a steady gait where pressure rolls
/// from the heel sensor to the toe sensors.
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    interval_ms: u64,
    next_index: u64,
}

impl SensorSimulator {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            interval_ms: (1_000 / u64::from(sample_rate_hz.max(1))).max(1),
            next_index: 0,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn reading(timestamp_ms: u64) -> [RawReading; CHANNEL_COUNT] {
        let phase = (timestamp_ms as f64 % STRIDE_MS) / STRIDE_MS;
        CHANNEL_PHASES.map(|(on, off)| {
            if phase < on || phase >= off {
                return 0;
            }
            let local = (phase - on) / (off - on);
            ((local * PI).sin() * ADC_MAX).round() as RawReading
        })
    }
}

impl Iterator for SensorSimulator {
    type Item = (u64, [RawReading; CHANNEL_COUNT]);

    fn next(&mut self) -> Option<Self::Item> {
        let timestamp_ms = self.next_index * self.interval_ms;
        self.next_index += 1;
        Some((timestamp_ms, Self::reading(timestamp_ms)))
    }
}

/// Builds a recording of `seconds` of simulated walking.
pub fn demo_recording(
    seconds: u32,
    sample_rate_hz: u32,
    calibration: &CalibrationSet,
) -> SampleStore {
    let count = u64::from(seconds) * u64::from(sample_rate_hz.max(1));
    SampleStore::from_samples(
        SensorSimulator::new(sample_rate_hz)
            .take(count as usize)
            .map(|(timestamp_ms, raw)| Sample::calibrated(timestamp_ms, raw, calibration)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_calibrates_frames() {
        let json = r#"[
            {"timestamp_ms": 0, "raw": [0, 1, 2, 3, 4]},
            {"timestamp_ms": 10, "raw": [100, 100, 100, 100, 100]}
        ]"#;
        let store = parse_recording(json, &CalibrationSet::insole_defaults()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).map(|s| s.raw), Some([100; CHANNEL_COUNT]));
        assert!(store.get(1).map_or(false, |s| s.values[2] > s.values[0]));
    }

    #[test]
    fn rejects_frames_with_wrong_channel_count() {
        let json = r#"[{"timestamp_ms": 0, "raw": [1, 2, 3]}]"#;
        assert!(parse_recording(json, &CalibrationSet::default()).is_err());
    }

    #[test]
    fn simulator_is_periodic_and_in_range() {
        let frames: Vec<_> = SensorSimulator::new(100).take(300).collect();
        assert_eq!(frames[1].0, 10);
        assert_eq!(frames[0].1, frames[110].1);
        assert!(frames.iter().any(|(_, raw)| raw[0] > 900));
        assert!(frames
            .iter()
            .all(|(_, raw)| raw.iter().all(|value| f64::from(*value) <= ADC_MAX)));
    }

    #[test]
    fn demo_recording_has_requested_length() {
        let store = demo_recording(3, 100, &CalibrationSet::default());
        assert_eq!(store.len(), 300);
        assert_eq!(store.duration_ms(), 2_990);
    }
}
