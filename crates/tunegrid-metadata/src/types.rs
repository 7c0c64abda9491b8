//! Value types stored in the metadata tree.
//!
//! A metadata value is either a plain string or an opaque typed payload
//! (a type URL plus encoded bytes). Payloads are produced from any
//! [`Message`] and can only be unpacked back into the same message type.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, MetadataResult};
use crate::namespace::Namespace;

/// A structured type that can be packed into an [`AnyPayload`].
///
/// `TYPE_URL` identifies the type; unpacking checks it before decoding.
pub trait Message: Serialize + DeserializeOwned {
    const TYPE_URL: &'static str;
}

/// An opaque typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyPayload {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl AnyPayload {
    /// Encode `message` into a payload tagged with its type URL.
    pub fn pack<M: Message>(message: &M) -> MetadataResult<Self> {
        let value =
            serde_json::to_vec(message).map_err(|e| MetadataError::Payload(e.to_string()))?;
        Ok(Self {
            type_url: M::TYPE_URL.to_string(),
            value,
        })
    }

    /// True if this payload was packed from an `M`.
    pub fn is<M: Message>(&self) -> bool {
        self.type_url == M::TYPE_URL
    }

    /// Decode into `M`. `None` if the type URL differs or the bytes don't decode.
    pub fn unpack<M: Message>(&self) -> Option<M> {
        if !self.is::<M>() {
            return None;
        }
        serde_json::from_slice(&self.value).ok()
    }
}

/// A value held under a key in one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Any(AnyPayload),
}

impl MetadataValue {
    /// Pack a message as a metadata value.
    pub fn pack<M: Message>(message: &M) -> MetadataResult<Self> {
        AnyPayload::pack(message).map(MetadataValue::Any)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            MetadataValue::Any(_) => None,
        }
    }

    pub fn as_payload(&self) -> Option<&AnyPayload> {
        match self {
            MetadataValue::Any(p) => Some(p),
            MetadataValue::Str(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MetadataValue::Str(_) => "string",
            MetadataValue::Any(_) => "payload",
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Str(s) => f.write_str(s),
            MetadataValue::Any(p) => write!(f, "<{} ({} bytes)>", p.type_url, p.value.len()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Str(s)
    }
}

impl From<AnyPayload> for MetadataValue {
    fn from(p: AnyPayload) -> Self {
        MetadataValue::Any(p)
    }
}

impl PartialEq<&str> for MetadataValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// One `(namespace, key, value)` triple of a flattened metadata tree.
///
/// This is the shape in which study and trial records carry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(default)]
    pub ns: Namespace,
    pub key: String,
    pub value: MetadataValue,
}
