//! [`PropValue`]: the dynamically-typed prop/output value carried through the tree.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// The name → value bag attached to an element or instance node.
pub type Props = IndexMap<String, PropValue>;

/// A prop or output value. Mirrors the JSON-ish value model providers exchange with the core:
/// scalars, nested objects/arrays, and an explicit [`PropValue::Undefined`] distinct from `null`
/// (§3: "`undefined` meaning input not yet available").
#[derive(Clone)]
pub enum PropValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<PropValue>),
    Object(IndexMap<String, PropValue>),
    /// Compared by reference (`Rc::ptr_eq`), never by calling it, per §4.6 "treating functions by
    /// reference".
    Function(Rc<dyn Fn(&[PropValue]) -> PropValue>),
}

/// Recursion past this depth is treated as unequal rather than walked further. Props in this
/// system are an owned tree (no `Rc`-shared sub-objects), so a true reference cycle cannot be
/// constructed; this bound only guards against pathologically deep nesting.
const MAX_COMPARE_DEPTH: usize = 256;

impl PropValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, PropValue::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        PropValue::String(s.into())
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Undefined => write!(f, "undefined"),
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Number(n) => write!(f, "{n}"),
            PropValue::String(s) => write!(f, "{s:?}"),
            PropValue::Array(items) => f.debug_list().entries(items).finish(),
            PropValue::Object(map) => f.debug_map().entries(map.iter()).finish(),
            PropValue::Function(rc) => write!(f, "function@{:p}", Rc::as_ptr(rc)),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        deep_eq(self, other, 0)
    }
}

fn deep_eq(a: &PropValue, b: &PropValue, depth: usize) -> bool {
    if depth > MAX_COMPARE_DEPTH {
        return false;
    }
    match (a, b) {
        (PropValue::Undefined, PropValue::Undefined) => true,
        (PropValue::Null, PropValue::Null) => true,
        (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
        (PropValue::Number(a), PropValue::Number(b)) => a == b,
        (PropValue::String(a), PropValue::String(b)) => a == b,
        (PropValue::Function(a), PropValue::Function(b)) => Rc::ptr_eq(a, b),
        (PropValue::Array(a), PropValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_eq(x, y, depth + 1))
        }
        (PropValue::Object(a), PropValue::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|bv| deep_eq(v, bv, depth + 1)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_compare_by_value() {
        assert_eq!(PropValue::Number(1.0), PropValue::Number(1.0));
        assert_ne!(PropValue::Number(1.0), PropValue::Number(2.0));
        assert_ne!(PropValue::Undefined, PropValue::Null);
    }

    #[test]
    fn functions_compare_by_reference() {
        let f: Rc<dyn Fn(&[PropValue]) -> PropValue> = Rc::new(|_: &[PropValue]| PropValue::Null);
        let a = PropValue::Function(Rc::clone(&f));
        let b = PropValue::Function(Rc::clone(&f));
        let c = PropValue::Function(Rc::new(|_: &[PropValue]| PropValue::Null));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn objects_compare_deeply_ignoring_order() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), PropValue::Number(1.0));
        a.insert("y".to_string(), PropValue::Number(2.0));
        let mut b = IndexMap::new();
        b.insert("y".to_string(), PropValue::Number(2.0));
        b.insert("x".to_string(), PropValue::Number(1.0));
        assert_eq!(PropValue::Object(a), PropValue::Object(b));
    }
}
