//! Frame plans: the per-function variable classification.
//!
//! The classification pass hands each compiled function an ordered list of
//! (name, kind) pairs, fixed before any frame exists. A `FramePlan` is that
//! list after validation. Accessors address variables by `VarId`, the
//! position assigned here at translation time; no runtime name lookup
//! happens for anything except module globals.

use std::rc::Rc;

use crate::error::{RtError, RtResult};

/// Compile-time identity of a variable: its position in the declaring
/// function's classification list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub u32);

/// Storage kind for one variable. Decided upstream, immutable for the
/// variable's whole existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Function-local variable, single-owner slot, created unbound.
    Local,
    /// Like `Local`, but bound from an argument handle at call entry.
    Parameter,
    /// Shared cell. `captured` is false when this function defines the
    /// cell (a fresh cell per activation) and true when the cell is
    /// adopted from an enclosing frame. Whether a cell variable is free
    /// or defining is a static property of the function, so it lives in
    /// the plan rather than at the call site.
    ClosureCell { captured: bool },
    /// Name-indexed reference into the module namespace. No per-frame
    /// storage.
    ModuleGlobal,
    /// Generator-introduced temporary, stored like a local.
    Temporary,
}

impl VarKind {
    pub fn is_slot(&self) -> bool {
        matches!(
            self,
            VarKind::Local | VarKind::Parameter | VarKind::Temporary
        )
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, VarKind::ClosureCell { .. })
    }

    pub fn is_global(&self) -> bool {
        matches!(self, VarKind::ModuleGlobal)
    }
}

/// One classified variable: name plus storage kind.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: Rc<str>,
    pub kind: VarKind,
}

impl Variable {
    pub fn new(name: &str, kind: VarKind) -> Self {
        Variable {
            name: name.into(),
            kind,
        }
    }

    pub fn local(name: &str) -> Self {
        Variable::new(name, VarKind::Local)
    }

    pub fn parameter(name: &str) -> Self {
        Variable::new(name, VarKind::Parameter)
    }

    /// Cell variable defined by this function.
    pub fn cell(name: &str) -> Self {
        Variable::new(name, VarKind::ClosureCell { captured: false })
    }

    /// Cell variable captured from an enclosing function.
    pub fn captured_cell(name: &str) -> Self {
        Variable::new(name, VarKind::ClosureCell { captured: true })
    }

    pub fn module_global(name: &str) -> Self {
        Variable::new(name, VarKind::ModuleGlobal)
    }

    pub fn temporary(name: &str) -> Self {
        Variable::new(name, VarKind::Temporary)
    }
}

/// Validated classification list for one function.
///
/// Built once at translation time. `Frame::allocate` consumes it for every
/// activation of the function.
#[derive(Debug, Clone)]
pub struct FramePlan {
    vars: Vec<Variable>,
    param_count: usize,
}

impl FramePlan {
    /// Validate a classification list.
    ///
    /// Rejects duplicate names among frame-stored entries and parameters
    /// declared after non-parameter entries (argument binding is
    /// positional, so the generator keeps parameters contiguous at the
    /// front). Failures are translator defects.
    pub fn new(vars: Vec<Variable>) -> RtResult<Self> {
        let mut param_count = 0;
        let mut seen_non_param = false;
        for (i, var) in vars.iter().enumerate() {
            match var.kind {
                VarKind::Parameter => {
                    if seen_non_param {
                        return Err(RtError::invalid_classification(format!(
                            "parameter '{}' declared after a non-parameter entry",
                            var.name
                        )));
                    }
                    param_count += 1;
                }
                _ => seen_non_param = true,
            }
            // Module globals may legitimately shadow nothing and repeat
            // nowhere; frame-stored names must be unique.
            if !var.kind.is_global() {
                for earlier in &vars[..i] {
                    if !earlier.kind.is_global() && earlier.name == var.name {
                        return Err(RtError::invalid_classification(format!(
                            "duplicate variable name '{}'",
                            var.name
                        )));
                    }
                }
            }
        }
        Ok(FramePlan { vars, param_count })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Number of `Parameter` entries; `Frame::allocate` expects exactly
    /// this many argument handles.
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    pub fn var(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, v)| (VarId(i as u32), v))
    }

    /// Ids of the cell variables this function captures from its
    /// enclosing scope, in plan order. A call site must supply exactly
    /// these cells.
    pub fn captured_cells(&self) -> Vec<VarId> {
        self.iter()
            .filter(|(_, v)| v.kind == VarKind::ClosureCell { captured: true })
            .map(|(id, _)| id)
            .collect()
    }

    /// Look up a variable's id by name. Translation-time convenience for
    /// wiring capture lists; generated code never does this at runtime.
    pub fn id_of(&self, name: &str) -> Option<VarId> {
        self.iter()
            .find(|(_, v)| &*v.name == name)
            .map(|(id, _)| id)
    }
}
