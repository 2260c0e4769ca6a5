//! Shared cells for closure-captured variables.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{RtError, RtResult};
use crate::value::Value;

/// A counted reference to a shared storage box.
///
/// The cell's container lifetime is reference counted independently of the
/// content handle it holds: cloning a `CellRef` is closure capture and bumps
/// the container count whether or not the cell is currently bound. A write
/// through one holder is visible to every other holder immediately; that is
/// what lets closures observe mutation of captured variables in either
/// direction. The cell is freed when its last holder releases it, which may
/// be long after the defining frame tore down.
#[derive(Debug, Clone)]
pub struct CellRef {
    name: Rc<str>,
    inner: Rc<RefCell<Option<Value>>>,
}

impl CellRef {
    /// Create a fresh, unbound cell with a single holder.
    pub fn new(name: Rc<str>) -> Self {
        CellRef {
            name,
            inner: Rc::new(RefCell::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a handle, releasing any previous content exactly once.
    /// Safe under self-assignment for the same reason as `Slot::set`: the
    /// incoming handle is owned before the old one drops.
    pub fn set(&self, value: Value) {
        *self.inner.borrow_mut() = Some(value);
    }

    /// Read the content, returning a counted handle the caller owns.
    /// The content sits behind a shared borrow, so unlike `Slot::get`
    /// this hands out a clone rather than a reference.
    pub fn get(&self) -> RtResult<Value> {
        self.inner
            .borrow()
            .as_ref()
            .cloned()
            .ok_or_else(|| RtError::unbound_cell(&*self.name))
    }

    /// Release the content and transition to unbound.
    pub fn delete(&self) -> RtResult<()> {
        match self.inner.borrow_mut().take() {
            Some(_) => Ok(()),
            None => Err(RtError::unbound_cell(&*self.name)),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Number of live holders of this cell's container.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Identity comparison: do two refs share one container?
    pub fn ptr_eq(a: &CellRef, b: &CellRef) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}
