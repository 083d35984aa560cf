//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default registry capacity.
pub const DEFAULT_CAPACITY: usize = 32;

/// Default baud rate for the serial link opened at initialization.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Options applied by [`crate::Engine`] at construction and initialization.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Maximum number of registered units.
    pub capacity: usize,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Fixed sample rate in Hz applied at initialization; `None` = automatic.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub sample_rate: Option<f64>,
    /// Wait for real time to catch up in fixed-rate mode.
    pub pace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            baud_rate: DEFAULT_BAUD_RATE,
            sample_rate: None,
            pace: true,
        }
    }
}

impl EngineConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_pacing(mut self, pace: bool) -> Self {
        self.pace = pace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.capacity, 32);
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.sample_rate, None);
        assert!(config.pace);
    }

    #[test]
    fn config_builders() {
        let config = EngineConfig::default()
            .with_capacity(4)
            .with_sample_rate(250.0)
            .with_pacing(false);
        assert_eq!(config.capacity, 4);
        assert_eq!(config.sample_rate, Some(250.0));
        assert!(!config.pace);
    }
}
