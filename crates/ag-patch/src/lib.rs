//! ag-patch: declarative patch files and their instantiation.
//!
//! A patch lists units in registration order, optionally wiring each putter
//! to an earlier unit's output. Loading validates the file; instantiating
//! registers the units with an engine and returns the handles plus the wiring.

pub mod instance;
pub mod schema;
pub mod validate;

pub use instance::{PatchInstance, UnitHandle, instantiate};
pub use schema::*;
pub use validate::{ValidationError, validate_patch};

pub type PatchResult<T> = Result<T, PatchError>;

#[derive(thiserror::Error, Debug)]
pub enum PatchError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Engine error: {0}")]
    Engine(#[from] ag_core::EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> PatchResult<Patch> {
    let content = std::fs::read_to_string(path)?;
    let patch: Patch = serde_yaml::from_str(&content)?;
    validate_patch(&patch)?;
    Ok(patch)
}

pub fn save_yaml(path: &std::path::Path, patch: &Patch) -> PatchResult<()> {
    validate_patch(patch)?;
    let content = serde_yaml::to_string(patch)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> PatchResult<Patch> {
    let content = std::fs::read_to_string(path)?;
    let patch: Patch = serde_json::from_str(&content)?;
    validate_patch(&patch)?;
    Ok(patch)
}

pub fn save_json(path: &std::path::Path, patch: &Patch) -> PatchResult<()> {
    validate_patch(patch)?;
    let content = serde_json::to_string_pretty(patch)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a patch, picking the format from the file extension (`.json` or YAML).
pub fn load(path: &std::path::Path) -> PatchResult<Patch> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
