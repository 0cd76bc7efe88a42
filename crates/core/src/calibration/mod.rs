use serde::{Deserialize, Serialize};

use crate::store::CHANNEL_COUNT;

/// Raw reading produced by the sensor ADC (0 - 1023 on the reference board).
pub type RawReading = u16;

/// Mapping from a raw reading to a calibrated value for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelCalibration {
    /// Pass the raw reading through unchanged.
    #[default]
    Identity,
    /// `gain * raw + offset`, optionally clamped from below by `floor`.
    Linear {
        gain: f64,
        offset: f64,
        #[serde(default)]
        floor: Option<f64>,
    },
}

impl ChannelCalibration {
    /// Linear force sensor curve used by the stock insole, floored at zero.
    pub fn force_sensor() -> Self {
        Self::Linear {
            gain: 0.038,
            offset: -0.2048,
            floor: Some(0.0),
        }
    }

    /// Same curve as [`force_sensor`](Self::force_sensor) for the 100 lb cell,
    /// whose readings sit on a quarter of the ADC range.
    pub fn force_sensor_100lb() -> Self {
        Self::Linear {
            gain: 0.038 * 4.0,
            offset: -0.2048,
            floor: Some(0.0),
        }
    }

    pub fn apply(&self, raw: RawReading) -> f64 {
        match *self {
            Self::Identity => f64::from(raw),
            Self::Linear {
                gain,
                offset,
                floor,
            } => {
                let value = gain * f64::from(raw) + offset;
                match floor {
                    Some(floor) => value.max(floor),
                    None => value,
                }
            }
        }
    }
}

/// Per-channel calibrations, swappable independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CalibrationSet {
    channels: [ChannelCalibration; CHANNEL_COUNT],
}

impl CalibrationSet {
    pub fn new(channels: [ChannelCalibration; CHANNEL_COUNT]) -> Self {
        Self { channels }
    }

    /// The calibration the reference insole ships with: channel 2 carries the
    /// 100 lb cell, every other channel the standard one.
    pub fn insole_defaults() -> Self {
        let mut set = Self::new([ChannelCalibration::force_sensor(); CHANNEL_COUNT]);
        set.set_channel(2, ChannelCalibration::force_sensor_100lb());
        set
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelCalibration> {
        self.channels.get(index)
    }

    /// Replaces the calibration of one channel. Out-of-range indices are ignored.
    pub fn set_channel(&mut self, index: usize, calibration: ChannelCalibration) {
        if let Some(slot) = self.channels.get_mut(index) {
            *slot = calibration;
        } else {
            tracing::warn!(index, "ignoring calibration for unknown channel");
        }
    }

    /// Restores identity on every channel.
    pub fn reset(&mut self) {
        self.channels = [ChannelCalibration::Identity; CHANNEL_COUNT];
    }

    pub fn apply(&self, raw: &[RawReading; CHANNEL_COUNT]) -> [f64; CHANNEL_COUNT] {
        std::array::from_fn(|i| self.channels[i].apply(raw[i]))
    }
}
