//! # Tern runtime — variable storage for ahead-of-time compiled code
//!
//! Tern translates a dynamically typed source language to native code built
//! on a reference-counted object runtime. This crate is the storage layer
//! the generated code runs on: it preserves the source language's binding
//! semantics (locals, closures, globals, deletion, unbound-state errors)
//! without a garbage collector, and without leaking or double-releasing.
//!
//! ## Quick Start
//!
//! ```
//! use tern_runtime::{Frame, FramePlan, ModuleNamespace, Value, VarId, Variable};
//!
//! // The classification pass decided: two parameters and a local.
//! let plan = FramePlan::new(vec![
//!     Variable::parameter("a"),
//!     Variable::parameter("b"),
//!     Variable::local("c"),
//! ]).unwrap();
//!
//! let namespace = ModuleNamespace::new();
//! let mut frame = Frame::allocate(
//!     &plan,
//!     vec![Value::int(1), Value::int(2)],
//!     vec![],
//!     &namespace,
//! ).unwrap();
//! frame.enter();
//!
//! let a = frame.get(VarId(0)).unwrap();
//! frame.set(VarId(2), a);
//! assert_eq!(frame.get(VarId(2)).unwrap().as_int(), Some(1));
//!
//! frame.teardown();
//! ```
//!
//! ## Architecture
//!
//! Generated code flows through three layers:
//!
//! 1. **Classification** - the optimizer's per-function (name, kind) list,
//!    validated into a [`FramePlan`] at translation time
//! 2. **Storage** - [`Slot`]s for single-owner bindings, [`CellRef`]s for
//!    closure-shared bindings, [`ModuleGlobalRef`]s into the shared
//!    namespace
//! 3. **Frames** - one [`Frame`] per activation, owning its storage and
//!    torn down exactly once on every terminal exit path
//!
//! Suspension (generators, coroutines) is not an exit: a suspended frame
//! persists untouched and resumes with identical binding state.

pub mod binding;
pub mod error;
pub mod storage;
pub mod value;

pub use binding::{FramePlan, VarId, VarKind, Variable};
pub use error::{RtError, RtResult};
pub use storage::{
    unwind_stack, CellRef, Frame, FrameState, ModuleGlobalRef, ModuleNamespace, Slot,
};
pub use value::{Obj, Value};
