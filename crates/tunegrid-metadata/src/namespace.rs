//! Namespace paths for the metadata tree and their string encoding.
//!
//! A [`Namespace`] is an ordered sequence of components. It can be built in
//! two ways:
//!
//! - [`Namespace::decode`] parses an encoded string: leading colons are
//!   ignored, colons separate components and `\:` is a literal colon inside
//!   a component.
//! - [`Namespace::from_components`] takes the components verbatim; colons
//!   are ordinary characters.
//!
//! [`Namespace::encode`] (and `Display`) produce the encoded form, so
//! `Namespace::decode(&ns.encode()) == ns`.

use std::fmt;
use std::ops::{Bound, Index, RangeBounds};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

/// An immutable path of string components into the metadata tree.
///
/// Ordering is lexicographic over the components, so `a` < `a:b` < `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    components: Vec<String>,
}

impl Namespace {
    /// The root (empty) namespace.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a namespace from components, without any parsing.
    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse an encoded namespace string.
    ///
    /// The input is split on every colon, then fragments that were split at
    /// an escaped colon (the fragment ends in `\`) are joined back together
    /// with a literal `:`, dropping the escape character.
    pub fn decode(encoded: &str) -> Self {
        let trimmed = encoded.trim_start_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Self::root();
        }

        let mut components: Vec<String> = Vec::new();
        let mut joining = false;
        for fragment in trimmed.split(SEPARATOR) {
            let (body, escaped) = match fragment.strip_suffix(ESCAPE) {
                Some(body) => (body, true),
                None => (fragment, false),
            };
            match components.last_mut() {
                Some(last) if joining => {
                    last.push(SEPARATOR);
                    last.push_str(body);
                }
                _ => components.push(body.to_string()),
            }
            joining = escaped;
        }
        Self { components }
    }

    /// Encode as a colon-separated string, escaping literal colons as `\:`.
    ///
    /// Components ending in a backslash, and a leading empty component, do
    /// not survive a decode of the result.
    pub fn encode(&self) -> String {
        let escaped: Vec<String> = self
            .components
            .iter()
            .map(|c| c.replace(SEPARATOR, "\\:"))
            .collect();
        escaped.join(":")
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.is_empty()
    }

    /// Component at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// Sub-namespace over a range of components. Out-of-range bounds are
    /// clamped, so `ns.slice(5..)` on a shorter namespace is the root.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Namespace {
        let len = self.components.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .min(len);
        if start >= end {
            return Self::root();
        }
        Self::from_components(self.components[start..end].iter().cloned())
    }

    /// True if the first components of `self` equal `prefix`.
    pub fn starts_with(&self, prefix: &Namespace) -> bool {
        self.components.starts_with(&prefix.components)
    }

    /// Path of `self` below `prefix`, if `self` lies at or under it.
    pub fn strip_prefix(&self, prefix: &Namespace) -> Option<Namespace> {
        self.starts_with(prefix).then(|| self.slice(prefix.len()..))
    }

    /// Append every component of `other`.
    pub fn join(&self, other: &Namespace) -> Namespace {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Self { components }
    }

    /// Append exactly one component. Colons are not interpreted.
    pub fn child(&self, component: impl Into<String>) -> Namespace {
        let mut components = self.components.clone();
        components.push(component.into());
        Self { components }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Namespace {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(s))
    }
}

impl From<&str> for Namespace {
    fn from(encoded: &str) -> Self {
        Self::decode(encoded)
    }
}

impl From<String> for Namespace {
    fn from(encoded: String) -> Self {
        Self::decode(&encoded)
    }
}

impl From<&Namespace> for Namespace {
    fn from(ns: &Namespace) -> Self {
        ns.clone()
    }
}

impl From<Vec<String>> for Namespace {
    fn from(components: Vec<String>) -> Self {
        Self { components }
    }
}

impl<S: Into<String>> FromIterator<S> for Namespace {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_components(iter)
    }
}

impl Index<usize> for Namespace {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.components[index]
    }
}

impl<'a> IntoIterator for &'a Namespace {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Ok(Self::decode(&encoded))
    }
}

/// Components appended by [`crate::Metadata::ns`].
///
/// A string is always exactly one component; a [`Namespace`] contributes all
/// of its components.
pub trait NamespaceSuffix {
    fn append_to(self, base: &Namespace) -> Namespace;
}

impl NamespaceSuffix for &str {
    fn append_to(self, base: &Namespace) -> Namespace {
        base.child(self)
    }
}

impl NamespaceSuffix for String {
    fn append_to(self, base: &Namespace) -> Namespace {
        base.child(self)
    }
}

impl NamespaceSuffix for &String {
    fn append_to(self, base: &Namespace) -> Namespace {
        base.child(self.as_str())
    }
}

impl NamespaceSuffix for Namespace {
    fn append_to(self, base: &Namespace) -> Namespace {
        base.join(&self)
    }
}

impl NamespaceSuffix for &Namespace {
    fn append_to(self, base: &Namespace) -> Namespace {
        base.join(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_splits_on_colons() {
        let ns = Namespace::decode("a:b");
        assert_eq!(ns.len(), 2);
        assert_eq!(&ns[0], "a");
        assert_eq!(&ns[1], "b");
    }

    #[test]
    fn decode_keeps_escaped_colon_in_component() {
        let ns = Namespace::decode("a\\:b");
        assert_eq!(ns.len(), 1);
        assert_eq!(&ns[0], "a:b");
    }

    #[test]
    fn decode_joins_consecutive_escapes() {
        let ns = Namespace::decode("a\\:b\\:c:d");
        assert_eq!(ns, Namespace::from_components(["a:b:c", "d"]));
    }

    #[test]
    fn leading_colons_are_ignored() {
        assert_eq!(Namespace::decode(":a"), Namespace::decode("a"));
        assert_eq!(Namespace::decode(":::a:b"), Namespace::from_components(["a", "b"]));
    }

    #[test]
    fn empty_and_degenerate_inputs_are_root() {
        assert!(Namespace::decode("").is_root());
        assert!(Namespace::decode(":").is_root());
        assert!(Namespace::decode(":::").is_root());
    }

    #[test]
    fn trailing_colon_keeps_empty_component() {
        let ns = Namespace::decode("a:");
        assert_eq!(ns, Namespace::from_components(["a", ""]));
        assert_eq!(Namespace::decode(&ns.encode()), ns);
    }

    #[test]
    fn components_are_not_parsed() {
        let ns = Namespace::from_components(["a:b", "c"]);
        assert_eq!(ns.len(), 2);
        assert_eq!(ns.encode(), "a\\:b:c");
        assert_eq!(ns.to_string(), "a\\:b:c");
    }

    #[test]
    fn slicing_and_indexing() {
        let ns = Namespace::decode("a:b:c");
        assert_eq!(ns.slice(1..), Namespace::decode("b:c"));
        assert_eq!(ns.slice(..2), Namespace::decode("a:b"));
        assert_eq!(ns.slice(1..=1), Namespace::decode("b"));
        assert!(ns.slice(5..).is_root());
        assert!(ns.slice(2..1).is_root());
        assert_eq!(ns.get(2), Some("c"));
        assert_eq!(ns.get(3), None);
    }

    #[test]
    fn starts_with_is_component_wise() {
        let ns = Namespace::decode("ab:c");
        assert!(ns.starts_with(&Namespace::decode("ab")));
        assert!(ns.starts_with(&Namespace::root()));
        assert!(!ns.starts_with(&Namespace::decode("a")));
        assert_eq!(ns.strip_prefix(&Namespace::decode("ab")), Some(Namespace::decode("c")));
        assert_eq!(ns.strip_prefix(&Namespace::decode("x")), None);
    }

    #[test]
    fn ordering_is_lexicographic_over_components() {
        let mut all = vec![
            Namespace::decode("b"),
            Namespace::decode("a:b"),
            Namespace::root(),
            Namespace::decode("a"),
        ];
        all.sort();
        assert_eq!(
            all,
            vec![
                Namespace::root(),
                Namespace::decode("a"),
                Namespace::decode("a:b"),
                Namespace::decode("b"),
            ]
        );
    }

    #[test]
    fn suffix_string_is_single_component() {
        let base = Namespace::decode("x");
        assert_eq!("a:b".append_to(&base), Namespace::from_components(["x", "a:b"]));
        assert_eq!(
            Namespace::decode("a:b").append_to(&base),
            Namespace::from_components(["x", "a", "b"])
        );
    }

    #[test]
    fn serde_uses_encoded_form() {
        let ns = Namespace::from_components(["a:b", "c"]);
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, r#""a\\:b:c""#);
        let back: Namespace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ns);
    }

    fn component() -> impl Strategy<Value = String> {
        "[a-z0-9_:. ]{1,8}"
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(components in proptest::collection::vec(component(), 0..6)) {
            let ns = Namespace::from_components(components);
            prop_assert_eq!(Namespace::decode(&ns.encode()), ns);
        }
    }
}
