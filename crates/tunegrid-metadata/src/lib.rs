//! tunegrid-metadata — namespaced metadata store for TuneGrid studies and trials.
//!
//! Studies and trials carry free-form annotations organised as a tree of
//! namespaces, each holding a flat `key → value` dictionary. Algorithms
//! write under their own namespace so they never collide with user data at
//! the root.
//!
//! # Architecture
//!
//! - **`namespace`** — [`Namespace`] paths and their `a:b\:c` string encoding
//! - **`store`** — [`Metadata`] views sharing one backing tree
//! - **`types`** — [`MetadataValue`] (string or typed payload) and entries
//!
//! ```
//! use tunegrid_metadata::Metadata;
//!
//! let md = Metadata::from_pairs([("owner", "alice")]);
//! md.ns("designer").insert("seed", "7");
//! assert_eq!(md.abs_ns("designer").get_as::<u64>("seed").unwrap(), Some(7));
//! assert!(md.get("seed").is_none());
//! ```

pub mod error;
pub mod namespace;
pub mod store;
pub mod types;

pub use error::{MetadataError, MetadataResult};
pub use namespace::{Namespace, NamespaceSuffix};
pub use store::Metadata;
pub use types::{AnyPayload, Message, MetadataEntry, MetadataValue};
