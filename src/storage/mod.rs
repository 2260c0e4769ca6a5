//! Runtime storage for variable bindings.
//!
//! One activation frame per call owns single-owner slots for locals,
//! parameters and temporaries, shared cells for closure variables, and
//! name-indexed references into the module namespace for globals.

mod cell;
mod frame;
mod globals;
mod slot;

pub use cell::CellRef;
pub use frame::{unwind_stack, Frame, FrameState};
pub use globals::{ModuleGlobalRef, ModuleNamespace};
pub use slot::Slot;
