//! Reference-counted value handles.
//!
//! The storage layer is deliberately payload-agnostic: slots, cells and
//! namespaces move opaque handles around without ever inspecting what they
//! point at. `Obj` carries just enough variants for compiled programs and
//! tests to have something to store.

use std::fmt;
use std::rc::Rc;

/// Payload of a runtime object.
///
/// The storage layer never matches on this. It exists behind the handle so
/// that ownership has something to count.
#[derive(Debug, PartialEq)]
pub enum Obj {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Box<str>),
}

/// An owned, reference-counted handle to a runtime object.
///
/// Cloning a `Value` increments the object's count; dropping one decrements
/// it exactly once. Every live `Value` corresponds to exactly one unit of
/// ownership.
#[derive(Clone, PartialEq)]
pub struct Value(Rc<Obj>);

impl Value {
    pub fn unit() -> Self {
        Value(Rc::new(Obj::Unit))
    }

    pub fn boolean(b: bool) -> Self {
        Value(Rc::new(Obj::Bool(b)))
    }

    pub fn int(n: i64) -> Self {
        Value(Rc::new(Obj::Int(n)))
    }

    pub fn float(f: f64) -> Self {
        Value(Rc::new(Obj::Float(f)))
    }

    pub fn string(s: &str) -> Self {
        Value(Rc::new(Obj::Str(s.into())))
    }

    /// Number of live handles to the underlying object.
    ///
    /// Diagnostic only; the release-exactly-once tests observe counts
    /// through this.
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Identity comparison: do two handles point at the same object?
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn as_int(&self) -> Option<i64> {
        match &*self.0 {
            Obj::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &*self.0 {
            Obj::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &*self.0 {
            Obj::Unit => "unit",
            Obj::Bool(_) => "bool",
            Obj::Int(_) => "int",
            Obj::Float(_) => "float",
            Obj::Str(_) => "string",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Obj::Unit => write!(f, "unit"),
            Obj::Bool(b) => write!(f, "{}", b),
            Obj::Int(n) => write!(f, "{}", n),
            Obj::Float(fl) => write!(f, "{}", fl),
            Obj::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Obj::Str(s) => write!(f, "{}", s),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_increments_refcount() {
        let v = Value::int(42);
        assert_eq!(v.refcount(), 1);
        let w = v.clone();
        assert_eq!(v.refcount(), 2);
        drop(w);
        assert_eq!(v.refcount(), 1);
    }

    #[test]
    fn test_ptr_eq_identity() {
        let v = Value::int(1);
        let w = v.clone();
        let x = Value::int(1);
        assert!(Value::ptr_eq(&v, &w));
        assert!(!Value::ptr_eq(&v, &x));
        // Structural equality still holds for equal payloads
        assert_eq!(v, x);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::int(7).as_int(), Some(7));
        assert_eq!(Value::string("hi").as_int(), None);
        assert_eq!(Value::string("hi").as_str(), Some("hi"));
        assert_eq!(Value::unit().type_name(), "unit");
        assert_eq!(Value::float(1.5).type_name(), "float");
    }

    #[test]
    fn test_display_and_debug() {
        assert_eq!(format!("{}", Value::string("hi")), "hi");
        assert_eq!(format!("{:?}", Value::string("hi")), "\"hi\"");
        assert_eq!(format!("{}", Value::int(3)), "3");
        assert_eq!(format!("{}", Value::boolean(true)), "true");
    }
}
