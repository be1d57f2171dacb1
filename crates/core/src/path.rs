//! Dotted paths and the fail-soft resolver built on them.
//!
//! ```ignore
//! let doc = json!({ "a": { "b": { "c": 5 } } });
//! assert_eq!(deep_get(&doc, "a.b.c"), Some(Lookup::Found(&json!(5))));
//! assert_eq!(deep_get_or_else(&doc, "a.x", &json!(42)), Some(&json!(42)));
//! ```

use crate::types::{Lookup, Node};
use smallvec::SmallVec;
use std::fmt;

/// Segment separator. There is no escape for a literal dot.
pub const DELIMITER: char = '.';

/// A parsed, non-empty sequence of field names.
///
/// Segments borrow from the source string. Most paths are shallow, so the
/// inline capacity avoids heap allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<'p> {
    segments: SmallVec<[&'p str; 8]>,
}

impl<'p> Path<'p> {
    /// Splits `raw` on [`DELIMITER`]. Returns `None` for the empty string.
    ///
    /// Empty segments (`"a..b"`) are kept and looked up as the empty key.
    pub fn parse(raw: &'p str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            segments: raw.split(DELIMITER).collect(),
        })
    }

    pub fn segments(&self) -> &[&'p str] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a parsed path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Folds [`step`] over the segments starting from `root`.
    pub fn resolve<'a, N: Node + ?Sized>(&self, root: &'a N) -> Lookup<'a, N> {
        self.segments
            .iter()
            .fold(Lookup::Found(root), |current, key| step(current, key))
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{DELIMITER}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// One field access. The marker is sticky: stepping from `Nothing` stays
/// `Nothing`, and a missing or null child becomes `Nothing`.
#[inline]
pub fn step<'a, N: Node + ?Sized>(current: Lookup<'a, N>, key: &str) -> Lookup<'a, N> {
    match current {
        Lookup::Nothing => Lookup::Nothing,
        Lookup::Found(node) => match node.child(key) {
            Some(child) if !child.is_absent() => Lookup::Found(child),
            _ => Lookup::Nothing,
        },
    }
}

/// Resolves `path` against `obj`.
///
/// An empty or absent path yields `None` (undefined), which is distinct from
/// `Some(Lookup::Nothing)`. Kept for compatibility: it means an empty path
/// never reaches the fallback in [`deep_get_or_else`].
pub fn deep_get<'a, 'p, N, P>(obj: &'a N, path: P) -> Option<Lookup<'a, N>>
where
    N: Node + ?Sized,
    P: Into<Option<&'p str>>,
{
    let path = Path::parse(path.into()?)?;
    Some(path.resolve(obj))
}

/// [`deep_get`] with the marker replaced by `coalesce`.
///
/// The undefined outcome of an empty path passes through as `None`.
pub fn deep_get_or_else<'a, 'p, N, P>(obj: &'a N, path: P, coalesce: &'a N) -> Option<&'a N>
where
    N: Node + ?Sized,
    P: Into<Option<&'p str>>,
{
    deep_get(obj, path).map(|lookup| lookup.or(coalesce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn parse_splits_on_dots() {
        let path = Path::parse("a.b.c").unwrap();
        assert_eq!(path.segments(), &["a", "b", "c"]);
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "a.b.c");
    }

    #[test]
    fn parse_empty_is_none() {
        assert!(Path::parse("").is_none());
    }

    #[test]
    fn parse_keeps_empty_segments() {
        let path = Path::parse("a..b").unwrap();
        assert_eq!(path.segments(), &["a", "", "b"]);
        assert!(!path.is_empty());
    }

    #[test]
    fn step_is_sticky() {
        let doc = json!({ "a": 1 });
        assert!(step(Lookup::<Value>::Nothing, "a").is_nothing());
        assert_eq!(step(Lookup::Found(&doc), "a"), Lookup::Found(&json!(1)));
    }

    #[test]
    fn step_treats_null_as_missing() {
        let doc = json!({ "a": null });
        assert!(step(Lookup::Found(&doc), "a").is_nothing());
    }

    #[test]
    fn step_into_primitive_is_nothing() {
        let doc = json!({ "a": 5 });
        let a = step(Lookup::Found(&doc), "a");
        assert!(step(a, "b").is_nothing());
    }

    #[test]
    fn empty_key_segment_is_looked_up() {
        let doc = json!({ "a": { "": { "b": 1 } } });
        assert_eq!(deep_get(&doc, "a..b"), Some(Lookup::Found(&json!(1))));
    }

    #[test]
    fn resolve_through_array_index() {
        let doc = json!({ "items": [{ "id": 7 }, { "id": 8 }] });
        assert_eq!(deep_get(&doc, "items.1.id"), Some(Lookup::Found(&json!(8))));
        assert_eq!(deep_get(&doc, "items.5.id"), Some(Lookup::Nothing));
    }
}
