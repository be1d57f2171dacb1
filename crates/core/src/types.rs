//! Lookup results and the node abstraction the resolver walks.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Outcome of a fail-soft lookup: a value borrowed from the graph, or the
/// `Nothing` marker.
///
/// `Nothing` carries no payload and cannot be produced from data, so a
/// caller-built `{"isNothing": true}` is always `Found`. Test for the marker
/// with [`Lookup::is_nothing`] or [`is_nothing`].
#[derive(Debug, PartialEq)]
pub enum Lookup<'a, N: ?Sized = Value> {
    Found(&'a N),
    Nothing,
}

impl<N: ?Sized> Clone for Lookup<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: ?Sized> Copy for Lookup<'_, N> {}

impl<'a, N: ?Sized> Lookup<'a, N> {
    #[inline]
    pub fn is_nothing(&self) -> bool {
        matches!(self, Lookup::Nothing)
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        !self.is_nothing()
    }

    /// The borrowed value, or `None` for the marker.
    pub fn found(self) -> Option<&'a N> {
        match self {
            Lookup::Found(node) => Some(node),
            Lookup::Nothing => None,
        }
    }

    /// Replaces the marker with `fallback`; found values pass through untouched.
    pub fn or(self, fallback: &'a N) -> &'a N {
        self.found().unwrap_or(fallback)
    }
}

impl<'a, N: ?Sized> From<Lookup<'a, N>> for Option<&'a N> {
    fn from(lookup: Lookup<'a, N>) -> Self {
        lookup.found()
    }
}

/// True iff `lookup` is the `Nothing` marker.
pub fn is_nothing<N: ?Sized>(lookup: &Lookup<'_, N>) -> bool {
    lookup.is_nothing()
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A schema-less value that can be indexed by field name.
///
/// Implementations must never panic: keys a node cannot hold simply yield
/// `None`.
pub trait Node {
    /// Child stored under `key`, if any.
    fn child(&self, key: &str) -> Option<&Self>;

    /// Values that count as absent even when present (JSON `null`).
    fn is_absent(&self) -> bool;
}

impl Node for Value {
    fn child(&self, key: &str) -> Option<&Self> {
        match self {
            Value::Object(map) => map.get(key),
            Value::Array(items) => array_index(key).and_then(|i| items.get(i)),
            _ => None,
        }
    }

    #[inline]
    fn is_absent(&self) -> bool {
        self.is_null()
    }
}

/// Parses a canonical decimal index: `"0"`, `"12"`, but not `"012"` or `"+1"`.
fn array_index(key: &str) -> Option<usize> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn look_alike_object_is_not_nothing() {
        let fake = json!({ "isNothing": true });
        assert!(!is_nothing(&Lookup::Found(&fake)));
        assert!(is_nothing(&Lookup::<Value>::Nothing));
    }

    #[test]
    fn falsy_values_are_not_nothing() {
        for v in [json!(null), json!(0), json!(false), json!(""), json!({}), json!([])] {
            assert!(!Lookup::Found(&v).is_nothing(), "{v} must not be the marker");
        }
    }

    #[test]
    fn or_only_replaces_marker() {
        let real = json!(0);
        let fallback = json!(42);
        assert_eq!(Lookup::Found(&real).or(&fallback), &json!(0));
        assert_eq!(Lookup::<Value>::Nothing.or(&fallback), &json!(42));
    }

    #[test]
    fn child_on_primitives_is_none() {
        assert!(json!(5).child("a").is_none());
        assert!(json!("abc").child("0").is_none());
        assert!(json!(null).child("a").is_none());
    }

    #[test]
    fn array_children_need_canonical_index() {
        let arr = json!(["x", "y"]);
        assert_eq!(arr.child("1"), Some(&json!("y")));
        assert!(arr.child("01").is_none());
        assert!(arr.child("+1").is_none());
        assert!(arr.child("2").is_none());
        assert!(arr.child("length").is_none());
    }
}
