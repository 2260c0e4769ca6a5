//! Single-owner storage for locals, parameters and temporaries.

use std::rc::Rc;

use crate::error::{RtError, RtResult};
use crate::value::Value;

/// Storage cell for one local/parameter/temporary variable within one
/// activation. May be unbound: before first assignment and after deletion.
///
/// A `Slot` is not `Clone`. Duplicating one would create two owners of a
/// single logical binding; only the stored handle may be copied, explicitly,
/// via `get().clone()`.
#[derive(Debug)]
pub struct Slot {
    name: Rc<str>,
    value: Option<Value>,
}

impl Slot {
    /// Create an unbound slot.
    pub fn new(name: Rc<str>) -> Self {
        Slot { name, value: None }
    }

    /// Create a slot bound from an argument handle. Ownership of the
    /// handle transfers in.
    pub fn bound(name: Rc<str>, value: Value) -> Self {
        Slot {
            name,
            value: Some(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a handle, releasing any previous one exactly once.
    ///
    /// The incoming handle is already owned by `value`, so assigning the
    /// slot's own currently-held handle back to it is safe: the object's
    /// count never transiently reaches zero.
    pub fn set(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Borrow the held handle without transferring ownership. Callers that
    /// keep a reference past the slot's next mutation must clone it.
    pub fn get(&self) -> RtResult<&Value> {
        self.value
            .as_ref()
            .ok_or_else(|| RtError::unbound_variable(&*self.name))
    }

    /// Release the held handle and transition to unbound. Deleting an
    /// unbound slot fails, mirroring deletion of a never-assigned variable.
    pub fn delete(&mut self) -> RtResult<()> {
        match self.value.take() {
            Some(_) => Ok(()),
            None => Err(RtError::unbound_variable(&*self.name)),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }
}
