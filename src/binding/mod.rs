//! Binding classification consumed from the front end.
//!
//! The optimizer decides, per variable, which storage kind applies. This
//! module only represents that decision; it never makes one.

mod plan;

pub use plan::{FramePlan, VarId, VarKind, Variable};
