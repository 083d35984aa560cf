//! Turning a validated patch into live units.
//!
//! Units are registered in file order with strict registration, so a patch
//! that does not fit the engine fails loudly instead of silently dropping
//! units. Wiring is applied by the host after every step via
//! [`PatchInstance::propagate`], source before destination.

use std::cell::RefCell;
use std::rc::Rc;

use ag_core::{Engine, EngineConfig, Getter, Platform, Putter, Shared, UnitId};
use ag_units::{Normalizer, TriOsc};

use crate::schema::{Patch, UnitKindDef};
use crate::validate::validate_patch;
use crate::PatchResult;

/// Typed handle to a unit created from a patch.
#[derive(Debug, Clone)]
pub enum UnitHandle {
    TriOsc(Shared<TriOsc>),
    Normalizer(Shared<Normalizer>),
}

impl UnitHandle {
    fn from_kind(kind: &UnitKindDef) -> Self {
        match *kind {
            UnitKindDef::TriOsc { period, width } => {
                UnitHandle::TriOsc(Rc::new(RefCell::new(TriOsc::new(period, width))))
            }
            UnitKindDef::Normalizer { mean, stddev } => {
                UnitHandle::Normalizer(Rc::new(RefCell::new(Normalizer::new(mean, stddev))))
            }
        }
    }

    fn register<P: Platform>(&self, engine: &mut Engine<P>) -> PatchResult<UnitId> {
        let id = match self {
            UnitHandle::TriOsc(unit) => engine.try_add(unit)?,
            UnitHandle::Normalizer(unit) => engine.try_add(unit)?,
        };
        Ok(id)
    }

    /// Current output of the unit.
    pub fn get(&self) -> f64 {
        match self {
            UnitHandle::TriOsc(unit) => unit.borrow().get(),
            UnitHandle::Normalizer(unit) => unit.borrow().get(),
        }
    }

    /// Feed a value; `None` when the unit does not accept input.
    pub fn put(&self, value: f64) -> Option<f64> {
        match self {
            UnitHandle::TriOsc(_) => None,
            UnitHandle::Normalizer(unit) => Some(unit.borrow_mut().put(value)),
        }
    }
}

/// One live unit of a patch.
#[derive(Debug, Clone)]
pub struct PatchUnit {
    pub name: String,
    pub id: UnitId,
    pub handle: UnitHandle,
    /// Index of the source unit within [`PatchInstance::units`].
    pub input: Option<usize>,
}

/// Units built from a patch, in registration order.
#[derive(Debug, Clone, Default)]
pub struct PatchInstance {
    units: Vec<PatchUnit>,
}

impl PatchInstance {
    /// Validate `patch` and register its units with `engine`.
    pub fn build<P: Platform>(patch: &Patch, engine: &mut Engine<P>) -> PatchResult<Self> {
        validate_patch(patch)?;

        let mut units: Vec<PatchUnit> = Vec::with_capacity(patch.units.len());
        for def in &patch.units {
            let handle = UnitHandle::from_kind(&def.kind);
            let id = handle.register(engine)?;
            // Validation guarantees the source appears earlier.
            let input = def
                .input
                .as_ref()
                .and_then(|src| units.iter().position(|u| &u.name == src));
            tracing::debug!(unit = %def.id, %id, kind = def.kind.type_name(), "unit built");
            units.push(PatchUnit {
                name: def.id.clone(),
                id,
                handle,
                input,
            });
        }

        tracing::info!(name = %patch.name, units = units.len(), "patch instantiated");
        Ok(Self { units })
    }

    /// Forward each wired source's output into its destination.
    pub fn propagate(&self) {
        for unit in &self.units {
            if let Some(src) = unit.input {
                let value = self.units[src].handle.get();
                unit.handle.put(value);
            }
        }
    }

    /// Current output of every unit, in registration order.
    pub fn values(&self) -> Vec<(&str, f64)> {
        self.units
            .iter()
            .map(|u| (u.name.as_str(), u.handle.get()))
            .collect()
    }

    /// Current output of the unit named `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.handle(name).map(UnitHandle::get)
    }

    pub fn handle(&self, name: &str) -> Option<&UnitHandle> {
        self.units.iter().find(|u| u.name == name).map(|u| &u.handle)
    }

    pub fn units(&self) -> &[PatchUnit] {
        &self.units
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Build a fresh engine from the patch's engine section and populate it.
///
/// The engine is returned uninitialized.
pub fn instantiate<P: Platform>(
    patch: &Patch,
    platform: P,
) -> PatchResult<(Engine<P>, PatchInstance)> {
    let config: EngineConfig = patch.engine.clone();
    let mut engine = Engine::new(platform, config);
    let instance = PatchInstance::build(patch, &mut engine)?;
    Ok((engine, instance))
}
