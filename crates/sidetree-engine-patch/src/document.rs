//! The DID document model.
//!
//! A document is a JSON object. The engine only interprets a handful of
//! well-known keys; everything else is carried through untouched. The order
//! of `publicKeys` and `service` entries is insertion order and is preserved
//! by every patch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PatchError, Result};

/// Key of the document identifier.
pub const ID: &str = "id";
/// Key of the JSON-LD context.
pub const CONTEXT: &str = "@context";
/// Key of the ordered public key list.
pub const PUBLIC_KEYS: &str = "publicKeys";
/// Key of the ordered service list.
pub const SERVICE: &str = "service";

/// Maximum length of a public key or service id.
pub const MAX_ID_LENGTH: usize = 50;

/// Usages a public key may declare.
pub const ALLOWED_USAGES: &[&str] = &["ops", "general", "auth", "assertion", "agreement"];

/// A DID document: a JSON object with a few well-known keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PatchError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| PatchError::InvalidDocument(e.to_string()))?;
        Self::from_value(value)
    }

    /// The document as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// The underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The document id, if it is a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID).and_then(Value::as_str)
    }

    /// Set the document id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID.to_string(), Value::String(id.into()));
    }

    /// Copy of this document with the id set.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    /// Ids of the public keys, in document order.
    pub fn public_key_ids(&self) -> Vec<String> {
        entry_ids(self.0.get(PUBLIC_KEYS))
    }

    /// Public key entries that parse as [`PublicKey`], in document order.
    pub fn public_keys(&self) -> Vec<PublicKey> {
        typed_entries(self.0.get(PUBLIC_KEYS))
    }

    /// Ids of the services, in document order.
    pub fn service_ids(&self) -> Vec<String> {
        entry_ids(self.0.get(SERVICE))
    }

    /// Check every `publicKeys` and `service` entry and their id uniqueness.
    pub fn validate_entries(&self) -> Result<()> {
        self.validate_public_keys()?;
        self.validate_services()
    }

    /// Check the `publicKeys` list: well-formed entries with unique ids.
    pub fn validate_public_keys(&self) -> Result<()> {
        let keys: Vec<PublicKey> = strict_entries(self.0.get(PUBLIC_KEYS), PUBLIC_KEYS)?;
        let mut seen = HashSet::new();
        for key in &keys {
            key.validate()?;
            if !seen.insert(key.id.as_str()) {
                return Err(PatchError::DuplicatePublicKey(key.id.clone()));
            }
        }
        Ok(())
    }

    /// Check the `service` list: well-formed entries with unique ids.
    pub fn validate_services(&self) -> Result<()> {
        let services: Vec<Service> = strict_entries(self.0.get(SERVICE), SERVICE)?;
        let mut seen = HashSet::new();
        for service in &services {
            service.validate()?;
            if !seen.insert(service.id.as_str()) {
                return Err(PatchError::DuplicateService(service.id.clone()));
            }
        }
        Ok(())
    }

    /// Append public keys, rejecting ids already present.
    pub(crate) fn add_public_keys(&mut self, keys: &[PublicKey]) -> Result<()> {
        let existing = self.public_key_ids();
        let entries = self.array_mut(PUBLIC_KEYS)?;
        for key in keys {
            if existing.iter().any(|id| id == &key.id) {
                return Err(PatchError::DuplicatePublicKey(key.id.clone()));
            }
            entries.push(to_entry(key)?);
        }
        Ok(())
    }

    /// Remove public keys by id. Unknown ids are ignored.
    pub(crate) fn remove_public_keys(&mut self, ids: &[String]) -> Result<()> {
        remove_by_id(self.0.get_mut(PUBLIC_KEYS), ids, PUBLIC_KEYS)
    }

    /// Append services, rejecting ids already present.
    pub(crate) fn add_services(&mut self, services: &[Service]) -> Result<()> {
        let existing = self.service_ids();
        let entries = self.array_mut(SERVICE)?;
        for service in services {
            if existing.iter().any(|id| id == &service.id) {
                return Err(PatchError::DuplicateService(service.id.clone()));
            }
            entries.push(to_entry(service)?);
        }
        Ok(())
    }

    /// Remove services by id. Unknown ids are ignored.
    pub(crate) fn remove_services(&mut self, ids: &[String]) -> Result<()> {
        remove_by_id(self.0.get_mut(SERVICE), ids, SERVICE)
    }

    /// Get (creating if absent) the array stored under `key`.
    fn array_mut(&mut self, key: &str) -> Result<&mut Vec<Value>> {
        let slot = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(entries) => Ok(entries),
            other => Err(PatchError::Apply(format!(
                "{} is {}, not an array",
                key,
                kind_of(other)
            ))),
        }
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Object(document.0)
    }
}

impl TryFrom<Value> for Document {
    type Error = PatchError;

    fn try_from(value: Value) -> Result<Self> {
        Document::from_value(value)
    }
}

/// A public key entry.
///
/// Exactly one key material field must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublicKey {
    /// Key id, unique within the document.
    pub id: String,

    /// What the key may be used for.
    pub usage: Vec<String>,

    /// Verification method type.
    #[serde(rename = "type")]
    pub key_type: String,

    /// Controlling DID, if not the document's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

impl PublicKey {
    /// Validate the entry's structure.
    pub fn validate(&self) -> Result<()> {
        validate_entry_id(&self.id)?;

        if self.usage.is_empty() {
            return Err(malformed(format!("public key '{}' declares no usage", self.id)));
        }
        for usage in &self.usage {
            if !ALLOWED_USAGES.contains(&usage.as_str()) {
                return Err(malformed(format!(
                    "public key '{}' has unknown usage '{}'",
                    self.id, usage
                )));
            }
        }

        if self.key_type.is_empty() {
            return Err(malformed(format!("public key '{}' has no type", self.id)));
        }

        let material = [
            self.public_key_hex.is_some(),
            self.public_key_base58.is_some(),
            self.public_key_jwk.is_some(),
            self.public_key_multibase.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();
        if material != 1 {
            return Err(malformed(format!(
                "public key '{}' must carry exactly one key material field, found {}",
                self.id, material
            )));
        }

        Ok(())
    }
}

/// A service entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Service {
    /// Service id, unique within the document.
    pub id: String,

    /// Service type.
    #[serde(rename = "type")]
    pub service_type: String,

    /// Endpoint: a URI string or a structured value.
    pub service_endpoint: Value,
}

impl Service {
    /// Validate the entry's structure.
    pub fn validate(&self) -> Result<()> {
        validate_entry_id(&self.id)?;

        if self.service_type.is_empty() {
            return Err(malformed(format!("service '{}' has no type", self.id)));
        }

        let empty = match &self.service_endpoint {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if empty {
            return Err(malformed(format!("service '{}' has no endpoint", self.id)));
        }

        Ok(())
    }
}

/// Check a public key or service id.
pub fn validate_entry_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_ID_LENGTH {
        return Err(malformed(format!(
            "id '{}' must be 1 to {} characters",
            id, MAX_ID_LENGTH
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(malformed(format!("id '{}' is not base64url", id)));
    }
    Ok(())
}

fn malformed(msg: String) -> PatchError {
    PatchError::MalformedPatch(msg)
}

fn to_entry<T: Serialize>(entry: &T) -> Result<Value> {
    serde_json::to_value(entry).map_err(|e| PatchError::Apply(e.to_string()))
}

fn entry_ids(entries: Option<&Value>) -> Vec<String> {
    match entries {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get(ID).and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn typed_entries<T: for<'de> Deserialize<'de>>(entries: Option<&Value>) -> Vec<T> {
    match entries {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Every entry must parse; unlike [`typed_entries`] nothing is dropped.
fn strict_entries<T: for<'de> Deserialize<'de>>(
    entries: Option<&Value>,
    key: &str,
) -> Result<Vec<T>> {
    match entries {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item.clone())
                    .map_err(|e| malformed(format!("{}[{}]: {}", key, i, e)))
            })
            .collect(),
        Some(other) => Err(malformed(format!(
            "{} is {}, not an array",
            key,
            kind_of(other)
        ))),
    }
}

fn remove_by_id(entries: Option<&mut Value>, ids: &[String], key: &str) -> Result<()> {
    match entries {
        None => Ok(()),
        Some(Value::Array(items)) => {
            items.retain(|item| {
                !item
                    .get(ID)
                    .and_then(Value::as_str)
                    .map(|id| ids.iter().any(|target| target == id))
                    .unwrap_or(false)
            });
            Ok(())
        }
        Some(other) => Err(PatchError::Apply(format!(
            "{} is {}, not an array",
            key,
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
