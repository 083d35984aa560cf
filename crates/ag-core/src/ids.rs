use core::fmt;
use core::num::NonZeroU32;

/// Registry handle for a unit, stable for the lifetime of the engine.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<UnitId>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(NonZeroU32);

impl UnitId {
    /// Create an id from a 0-based registry slot by storing slot+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based registry slot, which is also the update position.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.index())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}
