//! Patch validation logic.

use crate::schema::{LATEST_VERSION, Patch, UnitDef, UnitKindDef};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_patch(patch: &Patch) -> Result<(), ValidationError> {
    if patch.version == 0 || patch.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: patch.version,
        });
    }

    if patch.engine.capacity == 0 {
        return Err(ValidationError::InvalidValue {
            field: "engine.capacity".to_string(),
            value: "0".to_string(),
            reason: "engine must hold at least one unit".to_string(),
        });
    }
    if patch.units.len() > patch.engine.capacity {
        return Err(ValidationError::InvalidValue {
            field: "units".to_string(),
            value: patch.units.len().to_string(),
            reason: format!("exceeds engine capacity {}", patch.engine.capacity),
        });
    }
    if let Some(rate) = patch.engine.sample_rate {
        check_positive("engine.sample_rate", rate)?;
    }

    // Earlier ids only: inputs must point backwards in registration order.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut putters = Vec::new();
    for unit in &patch.units {
        if unit.id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "units.id".to_string(),
                value: format!("{:?}", unit.id),
                reason: "id must not be empty".to_string(),
            });
        }
        if seen.contains(unit.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: unit.id.clone(),
                context: "units".to_string(),
            });
        }
        validate_unit(unit)?;

        if let Some(input) = &unit.input {
            if !unit.kind.is_putter() {
                return Err(ValidationError::Unsupported {
                    feature: format!("input on {}", unit.id),
                    reason: format!("{} does not accept input", unit.kind.type_name()),
                });
            }
            if !seen.contains(input.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: input.clone(),
                    context: format!("input of {}", unit.id),
                });
            }
            putters.push(unit.id.as_str());
        }
        seen.insert(unit.id.as_str());
    }

    tracing::debug!(
        name = %patch.name,
        units = patch.units.len(),
        wired = putters.len(),
        "patch validated"
    );
    Ok(())
}

fn validate_unit(unit: &UnitDef) -> Result<(), ValidationError> {
    match &unit.kind {
        UnitKindDef::TriOsc { period, width } => {
            check_positive(&format!("{}.period", unit.id), *period)?;
            check_finite(&format!("{}.width", unit.id), *width)?;
            if !(0.0..=1.0).contains(width) {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}.width", unit.id),
                    value: width.to_string(),
                    reason: "must be within [0, 1]".to_string(),
                });
            }
        }
        UnitKindDef::Normalizer { mean, stddev } => {
            check_finite(&format!("{}.mean", unit.id), *mean)?;
            check_finite(&format!("{}.stddev", unit.id), *stddev)?;
            if *stddev < 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}.stddev", unit.id),
                    value: stddev.to_string(),
                    reason: "must not be negative".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    Ok(())
}

fn check_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_is_valid() {
        assert!(validate_patch(&Patch::demo()).is_ok());
    }

    #[test]
    fn empty_patch_is_valid() {
        let mut patch = Patch::demo();
        patch.units.clear();
        assert!(validate_patch(&patch).is_ok());
    }

    #[test]
    fn version_zero_rejected() {
        let mut patch = Patch::demo();
        patch.version = 0;
        assert_eq!(
            validate_patch(&patch),
            Err(ValidationError::UnsupportedVersion { version: 0 })
        );
    }

    #[test]
    fn blank_id_rejected() {
        let mut patch = Patch::demo();
        patch.units[0].id = "  ".to_string();
        patch.units[1].input = None;
        assert!(matches!(
            validate_patch(&patch),
            Err(ValidationError::InvalidValue { field, .. }) if field == "units.id"
        ));
    }
}
