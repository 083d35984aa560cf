//! Patch schema definitions.

use ag_core::EngineConfig;
use serde::{Deserialize, Serialize};

/// Newest patch format version understood by this crate.
pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Units in registration (and update) order.
    #[serde(default)]
    pub units: Vec<UnitDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitDef {
    pub id: String,
    #[serde(flatten)]
    pub kind: UnitKindDef,
    /// Id of an earlier unit whose output is put into this one after each step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum UnitKindDef {
    TriOsc {
        #[serde(default = "default_period")]
        period: f64,
        #[serde(default = "default_width")]
        width: f64,
    },
    Normalizer {
        #[serde(default = "default_mean")]
        mean: f64,
        #[serde(default = "default_stddev")]
        stddev: f64,
    },
}

impl UnitKindDef {
    /// Type name as written in patch files.
    pub fn type_name(&self) -> &'static str {
        match self {
            UnitKindDef::TriOsc { .. } => "TriOsc",
            UnitKindDef::Normalizer { .. } => "Normalizer",
        }
    }

    /// Whether the unit accepts values through `put`.
    pub fn is_putter(&self) -> bool {
        matches!(self, UnitKindDef::Normalizer { .. })
    }
}

fn default_period() -> f64 {
    ag_units::oscillator::DEFAULT_PERIOD
}

fn default_width() -> f64 {
    ag_units::oscillator::DEFAULT_WIDTH
}

fn default_mean() -> f64 {
    ag_units::normalizer::DEFAULT_MEAN
}

fn default_stddev() -> f64 {
    ag_units::normalizer::DEFAULT_STDDEV
}

impl Patch {
    /// Built-in patch: a slow triangle feeding a normalizer.
    pub fn demo() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "demo".to_string(),
            engine: EngineConfig::default(),
            units: vec![
                UnitDef {
                    id: "lfo".to_string(),
                    kind: UnitKindDef::TriOsc {
                        period: 2.0,
                        width: 0.5,
                    },
                    input: None,
                },
                UnitDef {
                    id: "norm".to_string(),
                    kind: UnitKindDef::Normalizer {
                        mean: 0.5,
                        stddev: 0.25,
                    },
                    input: Some("lfo".to_string()),
                },
            ],
        }
    }
}
