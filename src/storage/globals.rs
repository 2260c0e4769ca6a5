//! Module-level namespace and name-indexed global references.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{RtError, RtResult};
use crate::value::Value;

/// The namespace mapping of one module.
///
/// One instance is shared by every frame of every function belonging to the
/// module, for the module's entire process lifetime. Cloning is handle
/// semantics: all clones view the same mapping.
#[derive(Debug, Clone, Default)]
pub struct ModuleNamespace {
    map: Rc<RefCell<FxHashMap<Rc<str>, Value>>>,
}

impl ModuleNamespace {
    pub fn new() -> Self {
        ModuleNamespace::default()
    }

    /// Construct the per-name ref the code generator binds at translation
    /// time for each global the function mentions.
    pub fn global(&self, name: &str) -> ModuleGlobalRef {
        ModuleGlobalRef {
            name: name.into(),
            namespace: self.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

/// A name plus a reference to its module's namespace. Never owns storage:
/// "bound or absent" is a property of the shared mapping, not of this ref.
#[derive(Debug, Clone)]
pub struct ModuleGlobalRef {
    name: Rc<str>,
    namespace: ModuleNamespace,
}

impl ModuleGlobalRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the mapped handle, returning a counted copy the caller owns.
    pub fn get(&self) -> RtResult<Value> {
        self.namespace
            .map
            .borrow()
            .get(&self.name)
            .cloned()
            .ok_or_else(|| RtError::name_not_found(&*self.name))
    }

    /// Insert or overwrite. A displaced handle is released exactly once by
    /// the map replacement.
    pub fn set(&self, value: Value) {
        self.namespace
            .map
            .borrow_mut()
            .insert(self.name.clone(), value);
    }

    /// Remove and release the mapping.
    pub fn delete(&self) -> RtResult<()> {
        match self.namespace.map.borrow_mut().remove(&self.name) {
            Some(_) => Ok(()),
            None => Err(RtError::name_not_found(&*self.name)),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.namespace.map.borrow().contains_key(&self.name)
    }
}
