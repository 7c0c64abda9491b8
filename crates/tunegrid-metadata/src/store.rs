//! Metadata — namespaced key-value store with shared views.
//!
//! All views created from one [`Metadata`] (via [`Metadata::ns`],
//! [`Metadata::abs_ns`] or `clone`) share a single backing tree that maps
//! each [`Namespace`] to a flat `key → value` dictionary. Each view carries
//! its own current namespace, and dictionary access only ever touches that
//! namespace's dictionary.
//!
//! The backing tree sits behind an `Arc<RwLock<..>>`, so views are cheap to
//! create, `Send + Sync`, and can be mutated from several threads.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{MetadataError, MetadataResult};
use crate::namespace::{Namespace, NamespaceSuffix};
use crate::types::{Message, MetadataEntry, MetadataValue};

type Dictionary = BTreeMap<String, MetadataValue>;
type Tree = BTreeMap<Namespace, Dictionary>;

/// A view into a shared metadata tree, positioned at one namespace.
///
/// `Clone` is a shallow copy: the clone keeps the namespace and shares the
/// backing tree. Use [`Metadata::deep_copy`] for an independent tree.
#[derive(Clone, Default)]
pub struct Metadata {
    tree: Arc<RwLock<Tree>>,
    namespace: Namespace,
}

impl Metadata {
    /// An empty store, viewed at the root namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `pairs` in the root namespace.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        let md = Self::new();
        md.update(pairs);
        md
    }

    /// Rebuild a store from flattened entries. The returned view is at the root.
    pub fn from_entries<I: IntoIterator<Item = MetadataEntry>>(entries: I) -> Self {
        let md = Self::new();
        {
            let mut tree = md.tree.write();
            for entry in entries {
                tree.entry(entry.ns).or_default().insert(entry.key, entry.value);
            }
            debug!(namespaces = tree.len(), "metadata rebuilt from entries");
        }
        md
    }

    /// Flatten every non-empty namespace of the backing tree, in namespace
    /// then key order.
    pub fn to_entries(&self) -> Vec<MetadataEntry> {
        let tree = self.tree.read();
        tree.iter()
            .flat_map(|(ns, dict)| {
                dict.iter().map(move |(key, value)| MetadataEntry {
                    ns: ns.clone(),
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }

    // ── Views ──────────────────────────────────────────────────────

    /// A view one or more levels deeper.
    ///
    /// A string argument is a single component and is not split on colons;
    /// `md.ns("a:b")` is one level deeper than `md`. Pass a [`Namespace`] to
    /// append several components.
    pub fn ns<S: NamespaceSuffix>(&self, suffix: S) -> Metadata {
        self.view_at(suffix.append_to(&self.namespace))
    }

    /// A view at an absolute namespace.
    ///
    /// A string argument is decoded, so `md.abs_ns("a:b")` is the two-level
    /// namespace `a` → `b`. `md.abs_ns("")` is the root.
    pub fn abs_ns<N: Into<Namespace>>(&self, namespace: N) -> Metadata {
        self.view_at(namespace.into())
    }

    fn view_at(&self, namespace: Namespace) -> Metadata {
        Metadata {
            tree: Arc::clone(&self.tree),
            namespace,
        }
    }

    pub fn current_namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// True if both views share the same backing tree.
    pub fn ptr_eq(&self, other: &Metadata) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
    }

    /// Copy the whole backing tree into a new, unshared store at the same
    /// namespace.
    pub fn deep_copy(&self) -> Metadata {
        let tree = self.tree.read().clone();
        Metadata {
            tree: Arc::new(RwLock::new(tree)),
            namespace: self.namespace.clone(),
        }
    }

    // ── Dictionary access (current namespace only) ─────────────────

    /// Raw value under `key`, if present.
    pub fn get(&self, key: &str) -> Option<MetadataValue> {
        self.tree
            .read()
            .get(&self.namespace)
            .and_then(|dict| dict.get(key))
            .cloned()
    }

    /// Raw value under `key`, or [`MetadataError::KeyNotFound`].
    pub fn get_required(&self, key: &str) -> MetadataResult<MetadataValue> {
        self.get(key).ok_or_else(|| MetadataError::KeyNotFound {
            namespace: self.namespace.clone(),
            key: key.to_string(),
        })
    }

    /// Value under `key` parsed as `T`.
    ///
    /// Returns `Ok(None)` when the key is absent. A string that does not
    /// parse, or a typed payload, is a [`MetadataError::Conversion`].
    pub fn get_as<T>(&self, key: &str) -> MetadataResult<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let target = std::any::type_name::<T>();
        match value {
            MetadataValue::Str(raw) => {
                raw.parse::<T>()
                    .map(Some)
                    .map_err(|e| MetadataError::Conversion {
                        key: key.to_string(),
                        target,
                        reason: e.to_string(),
                    })
            }
            MetadataValue::Any(payload) => Err(MetadataError::Conversion {
                key: key.to_string(),
                target,
                reason: format!("value is a {} payload", payload.type_url),
            }),
        }
    }

    /// Like [`Metadata::get_as`], falling back to `default` when absent.
    pub fn get_or<T>(&self, key: &str, default: T) -> MetadataResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.get_as(key)?.unwrap_or(default))
    }

    /// Typed payload under `key` unpacked as `M`.
    ///
    /// `None` if absent, if the value is a plain string, or if the payload
    /// holds a different or undecodable message.
    pub fn get_message<M: Message>(&self, key: &str) -> Option<M> {
        match self.get(key)? {
            MetadataValue::Any(payload) => payload.unpack(),
            MetadataValue::Str(_) => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.tree
            .read()
            .get(&self.namespace)
            .is_some_and(|dict| dict.contains_key(key))
    }

    /// Set `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Option<MetadataValue> {
        self.tree
            .write()
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.into(), value.into())
    }

    /// Remove `key`, returning its value. A namespace left without keys is
    /// dropped from the tree.
    pub fn remove(&self, key: &str) -> Option<MetadataValue> {
        let mut tree = self.tree.write();
        let dict = tree.get_mut(&self.namespace)?;
        let removed = dict.remove(key);
        if dict.is_empty() {
            tree.remove(&self.namespace);
        }
        if removed.is_some() {
            debug!(namespace = %self.namespace, key, "metadata key removed");
        }
        removed
    }

    /// Insert every pair into the current namespace.
    pub fn update<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        let mut tree = self.tree.write();
        let dict = tree.entry(self.namespace.clone()).or_default();
        for (key, value) in pairs {
            dict.insert(key.into(), value.into());
        }
        if dict.is_empty() {
            tree.remove(&self.namespace);
        }
    }

    /// Remove every key of the current namespace. Other namespaces, including
    /// descendants, are untouched.
    pub fn clear(&self) {
        self.tree.write().remove(&self.namespace);
    }

    pub fn keys(&self) -> Vec<String> {
        self.tree
            .read()
            .get(&self.namespace)
            .map(|dict| dict.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the current namespace's `(key, value)` pairs, in key order.
    pub fn items(&self) -> Vec<(String, MetadataValue)> {
        self.tree
            .read()
            .get(&self.namespace)
            .map(|dict| dict.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tree.read().get(&self.namespace).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Tree structure ─────────────────────────────────────────────

    /// Every absolute namespace holding at least one key.
    pub fn namespaces(&self) -> Vec<Namespace> {
        self.tree
            .read()
            .iter()
            .filter(|(_, dict)| !dict.is_empty())
            .map(|(ns, _)| ns.clone())
            .collect()
    }

    /// Non-empty namespaces at or below the current one, relative to it.
    ///
    /// If the current namespace itself holds keys, the root namespace is
    /// part of the result.
    pub fn subnamespaces(&self) -> Vec<Namespace> {
        self.tree
            .read()
            .iter()
            .filter(|(_, dict)| !dict.is_empty())
            .filter_map(|(ns, _)| ns.strip_prefix(&self.namespace))
            .collect()
    }

    /// Graft `other`'s subtree (at and below its current namespace) under
    /// this view's current namespace.
    ///
    /// Tree structure is preserved. Values from `other` overwrite existing
    /// ones key by key; keys that `other` does not carry are left alone.
    /// `other` is snapshotted first and the merge is committed under a single
    /// write lock, so attaching a view of the same store is safe.
    pub fn attach(&self, other: &Metadata) {
        let snapshot: Vec<(Namespace, Dictionary)> = {
            let tree = other.tree.read();
            tree.iter()
                .filter(|(_, dict)| !dict.is_empty())
                .filter_map(|(ns, dict)| {
                    ns.strip_prefix(&other.namespace)
                        .map(|relative| (relative, dict.clone()))
                })
                .collect()
        };
        if snapshot.is_empty() {
            return;
        }

        let mut tree = self.tree.write();
        for (relative, dict) in &snapshot {
            tree.entry(self.namespace.join(relative))
                .or_default()
                .extend(dict.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        debug!(
            target_namespace = %self.namespace,
            source_namespace = %other.namespace,
            namespaces = snapshot.len(),
            "metadata attached"
        );
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespaces = self.tree.read().len();
        let items = self.items();
        f.debug_struct("Metadata")
            .field("namespace", &self.namespace.encode())
            .field("namespaces", &namespaces)
            .field("items", &items)
            .finish()
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "namespace: {} items: {{", self.namespace)?;
        for (i, (key, value)) in self.items().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Duration {
        seconds: u64,
    }

    impl Message for Duration {
        const TYPE_URL: &'static str = "type.tunegrid/Duration";
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    impl Message for Note {
        const TYPE_URL: &'static str = "type.tunegrid/Note";
    }

    fn sorted(mut namespaces: Vec<Namespace>) -> Vec<Namespace> {
        namespaces.sort();
        namespaces
    }

    // ── Dictionary access ──────────────────────────────────────────

    #[test]
    fn behaves_like_a_dict_at_the_root() {
        let md = Metadata::from_pairs([("foo", "Foo")]);
        assert_eq!(md.get("foo").unwrap(), "Foo");
        assert!(md.get("bar").is_none());

        md.insert("bar", "Bar");
        md.update([("a", "A"), ("gleep", "Gleep")]);
        assert_eq!(md.len(), 4);
        assert_eq!(md.keys(), vec!["a", "bar", "foo", "gleep"]);

        assert_eq!(md.remove("a").unwrap(), "A");
        assert!(md.remove("a").is_none());
        assert_eq!(md.len(), 3);
    }

    #[test]
    fn get_required_reports_missing_key() {
        let md = Metadata::new();
        let err = md.ns("deep").get_required("nope").unwrap_err();
        assert!(matches!(err, MetadataError::KeyNotFound { ref key, .. } if key == "nope"));
        assert!(err.to_string().contains("deep"));
    }

    #[test]
    fn namespaces_are_isolated() {
        let md = Metadata::from_pairs([("foo", "foofoo")]);
        md.ns("NewName").insert("bar", "Bar");

        assert_eq!(md.get("foo").unwrap(), "foofoo");
        assert!(md.get("bar").is_none());
        assert!(md.ns("NewName").get("foo").is_none());
        assert_eq!(md.ns("NewName").get("bar").unwrap(), "Bar");
        assert_eq!(md.abs_ns("NewName").get("bar").unwrap(), "Bar");
        assert!(md.abs_ns("y").get("bar").is_none());
    }

    #[test]
    fn multi_component_namespaces() {
        let md = Metadata::new();
        md.ns("a").ns("b").insert("foo", "AB-foo");
        md.ns("a").insert("foo", "A-foo");

        assert!(md.get("foo").is_none());
        assert_eq!(md.ns("a").get("foo").unwrap(), "A-foo");
        assert_eq!(md.ns("a").ns("b").get("foo").unwrap(), "AB-foo");
        assert_eq!(
            md.abs_ns(Namespace::from_components(["a", "b"])).get("foo").unwrap(),
            "AB-foo"
        );
        assert_eq!(md.abs_ns("a:b").get("foo").unwrap(), "AB-foo");
    }

    #[test]
    fn ns_does_not_parse_but_abs_ns_does() {
        let md = Metadata::new();
        let one_level = md.ns("ab:cd");
        assert_eq!(one_level.current_namespace().len(), 1);
        one_level.insert("k", "v");

        assert!(md.abs_ns("ab:cd").get("k").is_none());
        assert_eq!(md.abs_ns("ab\\:cd").get("k").unwrap(), "v");
        assert_eq!(md.abs_ns(Namespace::from_components(["ab:cd"])).get("k").unwrap(), "v");
        assert_eq!(md.abs_ns("ab:cd").current_namespace().len(), 2);
    }

    #[test]
    fn clear_only_touches_current_namespace() {
        let md = Metadata::from_pairs([("root", "r")]);
        md.ns("child").insert("k", "v");
        md.clear();
        assert!(md.is_empty());
        assert_eq!(md.ns("child").get("k").unwrap(), "v");
    }

    // ── Typed reads ────────────────────────────────────────────────

    #[test]
    fn get_as_parses_numeric_strings() {
        let md = Metadata::from_pairs([("float", "1.2"), ("int", "60")]);
        assert_eq!(md.get_as::<f64>("float").unwrap(), Some(1.2));
        assert_eq!(md.get_as::<i64>("int").unwrap(), Some(60));
        assert_eq!(md.get_as::<i64>("missing").unwrap(), None);
        assert_eq!(md.get_or("badkey", 0.2_f64).unwrap(), 0.2);
        assert_eq!(md.get_or("badkey", 1_i32).unwrap(), 1);
        assert_eq!(md.get_or("int", 1_i32).unwrap(), 60);
        assert_eq!(md.get_as::<String>("float").unwrap().as_deref(), Some("1.2"));
    }

    #[test]
    fn get_as_reports_conversion_failure() {
        let md = Metadata::from_pairs([("float", "1.2")]);
        let err = md.get_as::<i64>("float").unwrap_err();
        assert!(matches!(err, MetadataError::Conversion { ref key, .. } if key == "float"));

        md.insert("dur", MetadataValue::pack(&Duration { seconds: 1 }).unwrap());
        assert!(md.get_as::<f64>("dur").is_err());
    }

    #[test]
    fn get_message_unpacks_matching_payloads() {
        let md = Metadata::new();
        md.insert("duration", MetadataValue::pack(&Duration { seconds: 60 }).unwrap());
        md.insert("plain", "60");

        assert_eq!(md.get_message::<Duration>("duration"), Some(Duration { seconds: 60 }));
        assert_eq!(md.get_message::<Note>("duration"), None);
        assert_eq!(md.get_message::<Duration>("plain"), None);
        assert_eq!(md.get_message::<Duration>("missing"), None);
    }

    // ── Sharing ────────────────────────────────────────────────────

    #[test]
    fn views_share_backing_storage() {
        let origin = Metadata::new();
        let child = origin.ns("x");
        let absolute = origin.abs_ns("x");
        let copy = child.clone();

        child.insert("k", "v1");
        assert_eq!(absolute.get("k").unwrap(), "v1");
        assert_eq!(copy.get("k").unwrap(), "v1");
        assert!(origin.get("k").is_none());

        copy.insert("k", "v2");
        assert_eq!(child.get("k").unwrap(), "v2");
        assert!(copy.ptr_eq(&origin));
        assert_eq!(copy.current_namespace(), child.current_namespace());
    }

    #[test]
    fn deep_copy_is_independent() {
        let md = Metadata::from_pairs([("k", "v")]);
        let copy = md.deep_copy();
        copy.insert("k", "changed");
        md.ns("x").insert("only", "original");

        assert_eq!(md.get("k").unwrap(), "v");
        assert!(copy.ns("x").get("only").is_none());
        assert!(!copy.ptr_eq(&md));
    }

    #[test]
    fn views_outlive_origin() {
        let view = {
            let origin = Metadata::from_pairs([("k", "v")]);
            origin.ns("a")
        };
        view.insert("x", "y");
        assert_eq!(view.abs_ns("").get("k").unwrap(), "v");
    }

    #[test]
    fn views_are_usable_across_threads() {
        let md = Metadata::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let view = md.ns(format!("worker{i}"));
                std::thread::spawn(move || view.insert("id", i.to_string()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(md.namespaces().len(), 4);
        assert_eq!(md.ns("worker2").get("id").unwrap(), "2");
    }

    // ── Tree structure ─────────────────────────────────────────────

    #[test]
    fn namespaces_lists_only_non_empty() {
        let md = Metadata::from_pairs([("r", "1")]);
        md.ns("a").ns("b").insert("k", "v");
        let _unused = md.ns("empty");
        md.ns("gone").insert("k", "v");
        md.ns("gone").remove("k");

        assert_eq!(
            sorted(md.namespaces()),
            vec![Namespace::root(), Namespace::decode("a:b")]
        );
    }

    #[test]
    fn subnamespaces_are_relative() {
        let md = Metadata::new();
        md.abs_ns("foo").insert("k", "v");
        md.abs_ns("foo:bar").insert("k", "v");
        md.abs_ns("foo:bar:baz").insert("k", "v");
        md.abs_ns("other").insert("k", "v");

        assert_eq!(
            sorted(md.abs_ns("foo").subnamespaces()),
            vec![
                Namespace::root(),
                Namespace::decode("bar"),
                Namespace::decode("bar:baz"),
            ]
        );
        assert_eq!(md.abs_ns("foo:bar:baz:qux").subnamespaces(), Vec::<Namespace>::new());
        assert_eq!(md.subnamespaces().len(), 4);
    }

    #[test]
    fn attach_grafts_subtree() {
        let other = Metadata::new();
        other.abs_ns("x:y:z").insert("foo", "bar");
        other.abs_ns("q").insert("ignored", "1");

        let m = Metadata::new();
        m.abs_ns("w:y:z").insert("keep", "me");
        m.abs_ns("w:y:z").insert("foo", "old");
        m.ns("w").attach(&other.ns("x"));

        assert_eq!(m.abs_ns("w:y:z").get("foo").unwrap(), "bar");
        assert_eq!(m.abs_ns("w:y:z").get("keep").unwrap(), "me");
        assert!(m.abs_ns("w:q").get("ignored").is_none());
        assert_eq!(
            sorted(m.namespaces()),
            vec![Namespace::decode("w:y:z")]
        );
    }

    #[test]
    fn attach_is_idempotent_and_empty_is_noop() {
        let other = Metadata::from_pairs([("a", "1")]);
        other.ns("c").insert("b", "2");

        let m = Metadata::new();
        m.attach(&other);
        let once = m.to_entries();
        m.attach(&other);
        assert_eq!(m.to_entries(), once);

        m.ns("z").attach(&Metadata::new());
        m.ns("z").attach(&other.ns("nothing-here"));
        assert_eq!(m.to_entries(), once);
    }

    #[test]
    fn attach_within_the_same_store() {
        let md = Metadata::new();
        md.abs_ns("src:inner").insert("k", "v");
        md.ns("dst").attach(&md.abs_ns("src"));

        assert_eq!(md.abs_ns("dst:inner").get("k").unwrap(), "v");
        assert_eq!(md.abs_ns("src:inner").get("k").unwrap(), "v");
    }

    #[test]
    fn entries_round_trip_every_namespace() {
        let md = Metadata::from_pairs([("root", "r")]);
        md.ns("a:b").insert("colon", "c");
        md.abs_ns("x:y").insert("deep", "d");
        md.abs_ns("x:y")
            .insert("dur", MetadataValue::pack(&Duration { seconds: 5 }).unwrap());

        let entries = md.ns("ignored-view").to_entries();
        assert_eq!(entries.len(), 4);

        let rebuilt = Metadata::from_entries(entries.clone());
        assert!(rebuilt.current_namespace().is_root());
        assert_eq!(rebuilt.to_entries(), entries);
        assert_eq!(rebuilt.ns("a:b").get("colon").unwrap(), "c");
        assert_eq!(
            rebuilt.abs_ns("x:y").get_message::<Duration>("dur"),
            Some(Duration { seconds: 5 })
        );
    }

    #[test]
    fn display_shows_current_namespace() {
        let md = Metadata::new();
        md.ns("a").insert("k", "v");
        assert_eq!(md.ns("a").to_string(), "namespace: a items: {k: v}");
    }
}
