//! Activation frames: per-call ownership of slots and cell references.
//!
//! The code generator emits one `allocate` per call entry and one
//! `teardown` per terminal exit path (return, unwind, abandonment).
//! Suspension is not an exit: a suspended frame is a persisted data
//! structure, retained untouched until resumed or abandoned, so
//! suspend/resume is a state flip rather than a control-flow primitive.

use smallvec::SmallVec;

use rustc_hash::FxHashMap;

use crate::binding::{FramePlan, VarId, VarKind};
use crate::error::{RtError, RtResult};
use crate::storage::{CellRef, ModuleGlobalRef, ModuleNamespace, Slot};
use crate::value::Value;

/// Lifecycle of one activation. `TornDown` is terminal; no storage access
/// is valid afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Storage exists; the function body has not started.
    Allocated,
    /// The body is executing.
    Active,
    /// The activation yielded; storage is retained as-is.
    Suspended,
    /// All storage released. Terminal.
    TornDown,
}

/// Storage for one classified variable, dispatched by kind at allocation.
#[derive(Debug)]
enum VarStorage {
    Slot(Slot),
    Cell(CellRef),
    Global(ModuleGlobalRef),
}

/// The runtime record of one function invocation.
///
/// Owns its slots outright and holds counted co-ownership of its cells,
/// including cells adopted from an enclosing frame. Most functions have a
/// handful of variables, so storage is inline up to eight entries.
#[derive(Debug)]
pub struct Frame {
    storage: SmallVec<[VarStorage; 8]>,
    state: FrameState,
}

impl Frame {
    /// Build the frame for one call.
    ///
    /// `args` supplies one handle per `Parameter` entry, ownership
    /// transferring in. `captures` supplies the outer cells to adopt,
    /// matched by variable id. Mismatches of any sort are translator
    /// defects, never a property of the program being run.
    ///
    /// Cell resolution happens before parameter binding: captured cells
    /// are adopted first, then fresh cells created, so adoption never
    /// observes a partially initialized frame and argument binding cannot
    /// clobber an adopted cell.
    pub fn allocate(
        plan: &FramePlan,
        args: Vec<Value>,
        captures: Vec<(VarId, CellRef)>,
        namespace: &ModuleNamespace,
    ) -> RtResult<Frame> {
        if args.len() != plan.param_count() {
            return Err(RtError::invalid_classification(format!(
                "function takes {} argument(s), call site supplied {}",
                plan.param_count(),
                args.len()
            )));
        }

        let mut cells: FxHashMap<u32, CellRef> = FxHashMap::default();
        for (id, cell) in captures {
            let var = plan.var(id).ok_or_else(|| {
                RtError::invalid_classification(format!(
                    "capture references out-of-range variable id {}",
                    id.0
                ))
            })?;
            if var.kind != (VarKind::ClosureCell { captured: true }) {
                return Err(RtError::invalid_classification(format!(
                    "capture supplied for non-captured variable '{}'",
                    var.name
                )));
            }
            if cells.insert(id.0, cell).is_some() {
                return Err(RtError::invalid_classification(format!(
                    "duplicate capture for variable '{}'",
                    var.name
                )));
            }
        }
        for (id, var) in plan.iter() {
            if var.kind == (VarKind::ClosureCell { captured: false }) {
                cells.insert(id.0, CellRef::new(var.name.clone()));
            }
        }

        let mut args = args.into_iter();
        let mut storage = SmallVec::with_capacity(plan.len());
        for (id, var) in plan.iter() {
            let entry = match var.kind {
                VarKind::Parameter => {
                    let value = args.next().expect("arity checked above");
                    VarStorage::Slot(Slot::bound(var.name.clone(), value))
                }
                VarKind::Local | VarKind::Temporary => {
                    VarStorage::Slot(Slot::new(var.name.clone()))
                }
                VarKind::ClosureCell { .. } => {
                    let cell = cells.remove(&id.0).ok_or_else(|| {
                        RtError::invalid_classification(format!(
                            "captured variable '{}' was not supplied a cell",
                            var.name
                        ))
                    })?;
                    VarStorage::Cell(cell)
                }
                VarKind::ModuleGlobal => VarStorage::Global(namespace.global(&var.name)),
            };
            storage.push(entry);
        }

        Ok(Frame {
            storage,
            state: FrameState::Allocated,
        })
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Begin executing the function body.
    pub fn enter(&mut self) {
        assert!(
            self.state == FrameState::Allocated,
            "Frame::enter: frame already entered"
        );
        self.state = FrameState::Active;
    }

    /// Suspend at a yield point. Storage is retained exactly as-is.
    pub fn suspend(&mut self) {
        assert!(
            self.state == FrameState::Active,
            "Frame::suspend: frame is not active"
        );
        self.state = FrameState::Suspended;
    }

    /// Resume a suspended activation. The bound/unbound state and handle
    /// values are identical to those at the suspension point.
    pub fn resume(&mut self) {
        assert!(
            self.state == FrameState::Suspended,
            "Frame::resume: frame is not suspended"
        );
        self.state = FrameState::Active;
    }

    /// Release every slot and cell reference. Runs exactly once per
    /// activation, on every terminal exit path.
    pub fn teardown(&mut self) {
        assert!(
            self.state != FrameState::TornDown,
            "Frame::teardown: frame already torn down"
        );
        self.storage.clear();
        self.state = FrameState::TornDown;
    }

    /// Tear down a suspended activation that will never resume.
    pub fn abandon(&mut self) {
        assert!(
            self.state == FrameState::Suspended,
            "Frame::abandon: frame is not suspended"
        );
        self.teardown();
    }

    fn entry(&self, var: VarId) -> &VarStorage {
        assert!(
            self.state != FrameState::TornDown,
            "variable access on a torn-down frame"
        );
        self.storage
            .get(var.0 as usize)
            .expect("variable id out of range for this frame")
    }

    fn entry_mut(&mut self, var: VarId) -> &mut VarStorage {
        assert!(
            self.state != FrameState::TornDown,
            "variable access on a torn-down frame"
        );
        self.storage
            .get_mut(var.0 as usize)
            .expect("variable id out of range for this frame")
    }

    /// Read a variable, returning a counted handle the caller owns.
    pub fn get(&self, var: VarId) -> RtResult<Value> {
        match self.entry(var) {
            VarStorage::Slot(slot) => slot.get().cloned(),
            VarStorage::Cell(cell) => cell.get(),
            VarStorage::Global(global) => global.get(),
        }
    }

    /// Assign a variable; ownership of the handle transfers in.
    pub fn set(&mut self, var: VarId, value: Value) {
        match self.entry_mut(var) {
            VarStorage::Slot(slot) => slot.set(value),
            VarStorage::Cell(cell) => cell.set(value),
            VarStorage::Global(global) => global.set(value),
        }
    }

    /// Delete a variable, releasing its handle.
    pub fn delete(&mut self, var: VarId) -> RtResult<()> {
        match self.entry_mut(var) {
            VarStorage::Slot(slot) => slot.delete(),
            VarStorage::Cell(cell) => cell.delete(),
            VarStorage::Global(global) => global.delete(),
        }
    }

    pub fn is_bound(&self, var: VarId) -> bool {
        match self.entry(var) {
            VarStorage::Slot(slot) => slot.is_bound(),
            VarStorage::Cell(cell) => cell.is_bound(),
            VarStorage::Global(global) => global.is_bound(),
        }
    }

    /// Hand out this frame's cell for `var`, for a nested frame's capture
    /// list. Asking for the cell of a non-cell variable means the
    /// classification pass and the capture wiring disagree.
    pub fn cell(&self, var: VarId) -> RtResult<CellRef> {
        match self.entry(var) {
            VarStorage::Cell(cell) => Ok(cell.clone()),
            VarStorage::Slot(slot) => Err(RtError::invalid_classification(format!(
                "variable '{}' is not a closure cell",
                slot.name()
            ))),
            VarStorage::Global(global) => Err(RtError::invalid_classification(format!(
                "variable '{}' is not a closure cell",
                global.name()
            ))),
        }
    }
}

/// Tear down every live frame of a call stack being unwound, innermost
/// first. Exception propagation and external cancellation share this path.
pub fn unwind_stack(stack: &mut Vec<Frame>) {
    while let Some(mut frame) = stack.pop() {
        if frame.state() != FrameState::TornDown {
            frame.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Variable;

    fn ns() -> ModuleNamespace {
        ModuleNamespace::new()
    }

    fn plan(vars: Vec<Variable>) -> FramePlan {
        FramePlan::new(vars).unwrap()
    }

    #[test]
    fn test_allocate_binds_parameters_in_order() {
        let p = plan(vec![
            Variable::parameter("a"),
            Variable::parameter("b"),
            Variable::local("c"),
        ]);
        let mut frame = Frame::allocate(
            &p,
            vec![Value::int(1), Value::int(2)],
            vec![],
            &ns(),
        )
        .unwrap();
        frame.enter();
        assert_eq!(frame.get(VarId(0)).unwrap().as_int(), Some(1));
        assert_eq!(frame.get(VarId(1)).unwrap().as_int(), Some(2));
        assert!(!frame.is_bound(VarId(2)));
    }

    #[test]
    fn test_allocate_arity_mismatch_is_fatal() {
        let p = plan(vec![Variable::parameter("a")]);
        let err = Frame::allocate(&p, vec![], vec![], &ns()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_local_read_before_assignment() {
        let p = plan(vec![Variable::local("x")]);
        let mut frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        frame.enter();
        let err = frame.get(VarId(0)).unwrap_err();
        assert_eq!(err, RtError::unbound_variable("x"));
    }

    #[test]
    fn test_fresh_cell_created_per_activation() {
        let p = plan(vec![Variable::cell("n")]);
        let f1 = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        let f2 = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        let c1 = f1.cell(VarId(0)).unwrap();
        let c2 = f2.cell(VarId(0)).unwrap();
        assert!(!CellRef::ptr_eq(&c1, &c2));
    }

    #[test]
    fn test_adopted_cell_is_shared() {
        let outer_plan = plan(vec![Variable::cell("n")]);
        let inner_plan = plan(vec![Variable::captured_cell("n")]);
        let namespace = ns();

        let mut outer = Frame::allocate(&outer_plan, vec![], vec![], &namespace).unwrap();
        outer.enter();
        outer.set(VarId(0), Value::int(10));

        let captures = vec![(VarId(0), outer.cell(VarId(0)).unwrap())];
        let mut inner = Frame::allocate(&inner_plan, vec![], captures, &namespace).unwrap();
        inner.enter();

        // Visible both ways
        assert_eq!(inner.get(VarId(0)).unwrap().as_int(), Some(10));
        inner.set(VarId(0), Value::int(11));
        assert_eq!(outer.get(VarId(0)).unwrap().as_int(), Some(11));
    }

    #[test]
    fn test_missing_capture_is_fatal() {
        let p = plan(vec![Variable::captured_cell("n")]);
        let err = Frame::allocate(&p, vec![], vec![], &ns()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.description().contains("'n'"));
    }

    #[test]
    fn test_capture_for_non_captured_variable_is_fatal() {
        let p = plan(vec![Variable::local("x")]);
        let stray = CellRef::new("x".into());
        let err = Frame::allocate(&p, vec![], vec![(VarId(0), stray)], &ns()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_duplicate_capture_is_fatal() {
        let p = plan(vec![Variable::captured_cell("n")]);
        let c = CellRef::new("n".into());
        let err = Frame::allocate(
            &p,
            vec![],
            vec![(VarId(0), c.clone()), (VarId(0), c)],
            &ns(),
        )
        .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_out_of_range_capture_is_fatal() {
        let p = plan(vec![Variable::local("x")]);
        let stray = CellRef::new("n".into());
        let err = Frame::allocate(&p, vec![], vec![(VarId(9), stray)], &ns()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_module_global_dispatch() {
        let p = plan(vec![Variable::module_global("g")]);
        let namespace = ns();
        let mut frame = Frame::allocate(&p, vec![], vec![], &namespace).unwrap();
        frame.enter();
        assert_eq!(
            frame.get(VarId(0)).unwrap_err(),
            RtError::name_not_found("g")
        );
        frame.set(VarId(0), Value::int(5));
        // Visible through the shared namespace, not just the frame
        assert_eq!(namespace.global("g").get().unwrap().as_int(), Some(5));
        frame.delete(VarId(0)).unwrap();
        assert_eq!(
            frame.delete(VarId(0)).unwrap_err(),
            RtError::name_not_found("g")
        );
    }

    #[test]
    fn test_cell_of_non_cell_variable_is_fatal() {
        let p = plan(vec![Variable::local("x")]);
        let frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        assert!(frame.cell(VarId(0)).unwrap_err().is_fatal());
    }

    #[test]
    fn test_teardown_releases_storage_exactly_once() {
        let p = plan(vec![Variable::parameter("a"), Variable::local("b")]);
        let v = Value::int(1);
        let w = Value::int(2);
        let mut frame = Frame::allocate(&p, vec![v.clone()], vec![], &ns()).unwrap();
        frame.enter();
        frame.set(VarId(1), w.clone());
        assert_eq!(v.refcount(), 2);
        assert_eq!(w.refcount(), 2);
        frame.teardown();
        assert_eq!(v.refcount(), 1);
        assert_eq!(w.refcount(), 1);
        assert_eq!(frame.state(), FrameState::TornDown);
    }

    #[test]
    #[should_panic(expected = "already torn down")]
    fn test_double_teardown_panics() {
        let p = plan(vec![Variable::local("x")]);
        let mut frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        frame.enter();
        frame.teardown();
        frame.teardown();
    }

    #[test]
    #[should_panic(expected = "torn-down frame")]
    fn test_access_after_teardown_panics() {
        let p = plan(vec![Variable::local("x")]);
        let mut frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        frame.enter();
        frame.teardown();
        let _ = frame.is_bound(VarId(0));
    }

    #[test]
    fn test_suspension_retains_storage() {
        let p = plan(vec![Variable::local("x"), Variable::local("y")]);
        let v = Value::int(42);
        let mut frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        frame.enter();
        frame.set(VarId(0), v.clone());
        frame.suspend();
        assert_eq!(frame.state(), FrameState::Suspended);
        assert_eq!(v.refcount(), 2);
        frame.resume();
        // Identical bound/unbound state and handle values
        assert!(Value::ptr_eq(&frame.get(VarId(0)).unwrap(), &v));
        assert!(!frame.is_bound(VarId(1)));
    }

    #[test]
    fn test_abandon_tears_down_suspended_frame() {
        let p = plan(vec![Variable::local("x")]);
        let v = Value::int(1);
        let mut frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        frame.enter();
        frame.set(VarId(0), v.clone());
        frame.suspend();
        frame.abandon();
        assert_eq!(frame.state(), FrameState::TornDown);
        assert_eq!(v.refcount(), 1);
    }

    #[test]
    #[should_panic(expected = "not suspended")]
    fn test_abandon_of_active_frame_panics() {
        let p = plan(vec![Variable::local("x")]);
        let mut frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        frame.enter();
        frame.abandon();
    }

    #[test]
    #[should_panic(expected = "not active")]
    fn test_suspend_before_enter_panics() {
        let p = plan(vec![Variable::local("x")]);
        let mut frame = Frame::allocate(&p, vec![], vec![], &ns()).unwrap();
        frame.suspend();
    }

    #[test]
    fn test_unwind_stack_tears_down_innermost_first() {
        let p = plan(vec![Variable::local("x")]);
        let namespace = ns();
        let v = Value::int(1);
        let mut stack = Vec::new();
        for _ in 0..3 {
            let mut frame = Frame::allocate(&p, vec![], vec![], &namespace).unwrap();
            frame.enter();
            frame.set(VarId(0), v.clone());
            stack.push(frame);
        }
        assert_eq!(v.refcount(), 4);
        unwind_stack(&mut stack);
        assert!(stack.is_empty());
        assert_eq!(v.refcount(), 1);
    }
}
