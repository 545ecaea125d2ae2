//! Patch kinds and their application.
//!
//! A patch is one atomic document mutation. The set of kinds is closed:
//! adding a kind means adding a variant here, with its own validation and
//! its own arm in [`Patch::apply`].
//!
//! Validation happens in two layers:
//! 1. Structure ([`Patch::validate`]): independent of any document or
//!    protocol version. The text constructors run it before returning.
//! 2. Protocol gating ([`Patch::check_allowed`]): whether the active
//!    protocol version accepts this kind at all.
//!
//! Document-dependent failures (duplicate ids, missing JSON pointer targets)
//! only surface on apply. A JSON patch that touches `publicKeys` or `service`
//! has the touched list re-checked after it applies, so entries written
//! through a pointer obey the same rules as `add-public-keys`.

use json_patch::{Patch as JsonPatchOperations, PatchOperation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use sidetree_engine_core::ProtocolParameters;

use crate::document::{
    validate_entry_id, Document, PublicKey, Service, ID, PUBLIC_KEYS, SERVICE,
};
use crate::error::{PatchError, Result};

/// One document mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Patch {
    /// RFC 6902 operations, restricted to add, remove and replace.
    #[serde(rename = "ietf-json-patch")]
    JsonPatch { patches: JsonPatchOperations },

    /// Append public keys.
    #[serde(rename_all = "camelCase")]
    AddPublicKeys { public_keys: Vec<PublicKey> },

    /// Remove public keys by id.
    #[serde(rename_all = "camelCase")]
    RemovePublicKeys { public_keys: Vec<String> },

    /// Append services.
    #[serde(rename_all = "camelCase")]
    AddServiceEndpoints { service_endpoints: Vec<Service> },

    /// Remove services by id.
    #[serde(rename_all = "camelCase")]
    RemoveServiceEndpoints { service_endpoint_ids: Vec<String> },

    /// Replace the whole document.
    Replace { document: Document },
}

impl Patch {
    /// Build an `ietf-json-patch` patch from a JSON array of operations.
    pub fn json_patch(operations: &str) -> Result<Self> {
        let patches: JsonPatchOperations = parse(operations)?;
        Self::validated(Patch::JsonPatch { patches })
    }

    /// Build an `add-public-keys` patch from a JSON array of key entries.
    pub fn add_public_keys(keys: &str) -> Result<Self> {
        let public_keys: Vec<PublicKey> = parse(keys)?;
        Self::validated(Patch::AddPublicKeys { public_keys })
    }

    /// Build a `remove-public-keys` patch from a JSON array of ids.
    pub fn remove_public_keys(ids: &str) -> Result<Self> {
        let public_keys: Vec<String> = parse(ids)?;
        Self::validated(Patch::RemovePublicKeys { public_keys })
    }

    /// Build an `add-service-endpoints` patch from a JSON array of services.
    pub fn add_service_endpoints(services: &str) -> Result<Self> {
        let service_endpoints: Vec<Service> = parse(services)?;
        Self::validated(Patch::AddServiceEndpoints { service_endpoints })
    }

    /// Build a `remove-service-endpoints` patch from a JSON array of ids.
    pub fn remove_service_endpoints(ids: &str) -> Result<Self> {
        let service_endpoint_ids: Vec<String> = parse(ids)?;
        Self::validated(Patch::RemoveServiceEndpoints {
            service_endpoint_ids,
        })
    }

    /// Build a `replace` patch.
    pub fn replace(document: Document) -> Self {
        Patch::Replace { document }
    }

    /// Parse a complete patch object (`{"action": ...}`) and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let patch: Patch = parse(json)?;
        Self::validated(patch)
    }

    /// The wire name of this patch kind.
    pub fn action(&self) -> &'static str {
        match self {
            Patch::JsonPatch { .. } => "ietf-json-patch",
            Patch::AddPublicKeys { .. } => "add-public-keys",
            Patch::RemovePublicKeys { .. } => "remove-public-keys",
            Patch::AddServiceEndpoints { .. } => "add-service-endpoints",
            Patch::RemoveServiceEndpoints { .. } => "remove-service-endpoints",
            Patch::Replace { .. } => "replace",
        }
    }

    fn validated(patch: Patch) -> Result<Self> {
        patch.validate()?;
        Ok(patch)
    }

    /// Check structural well-formedness, independent of any document.
    pub fn validate(&self) -> Result<()> {
        match self {
            Patch::JsonPatch { patches } => {
                if patches.0.is_empty() {
                    return Err(malformed("ietf-json-patch has no operations"));
                }
                for op in &patches.0 {
                    validate_json_patch_operation(op)?;
                }
                Ok(())
            }
            Patch::AddPublicKeys { public_keys } => {
                if public_keys.is_empty() {
                    return Err(malformed("add-public-keys has no keys"));
                }
                for key in public_keys {
                    key.validate()?;
                }
                ensure_unique(public_keys.iter().map(|k| k.id.as_str()), "public key")
            }
            Patch::RemovePublicKeys { public_keys } => validate_id_list(public_keys, "public key"),
            Patch::AddServiceEndpoints { service_endpoints } => {
                if service_endpoints.is_empty() {
                    return Err(malformed("add-service-endpoints has no services"));
                }
                for service in service_endpoints {
                    service.validate()?;
                }
                ensure_unique(service_endpoints.iter().map(|s| s.id.as_str()), "service")
            }
            Patch::RemoveServiceEndpoints {
                service_endpoint_ids,
            } => validate_id_list(service_endpoint_ids, "service"),
            Patch::Replace { document } => document.validate_entries(),
        }
    }

    /// Whether this patch uses replace semantics.
    pub fn is_replace_style(&self) -> bool {
        match self {
            Patch::Replace { .. } => true,
            Patch::JsonPatch { patches } => patches
                .0
                .iter()
                .any(|op| matches!(op, PatchOperation::Replace(_))),
            _ => false,
        }
    }

    /// Check this patch against the active protocol version.
    pub fn check_allowed(&self, params: &ProtocolParameters) -> Result<()> {
        if self.is_replace_style() && !params.enable_replace_patch {
            return Err(PatchError::ReplaceDisabled);
        }
        Ok(())
    }

    /// Apply this patch, producing a new document. The input is untouched.
    pub fn apply(&self, document: &Document) -> Result<Document> {
        let mut working = document.clone();
        self.apply_in_place(&mut working)?;
        Ok(working)
    }

    /// Apply to a working copy owned by the caller.
    fn apply_in_place(&self, document: &mut Document) -> Result<()> {
        match self {
            Patch::JsonPatch { patches } => {
                let mut value = document.to_value();
                json_patch::patch(&mut value, patches)
                    .map_err(|e| PatchError::Apply(e.to_string()))?;
                let patched = Document::from_value(value)?;
                if touches(patches, PUBLIC_KEYS) {
                    patched.validate_public_keys()?;
                }
                if touches(patches, SERVICE) {
                    patched.validate_services()?;
                }
                *document = patched;
                Ok(())
            }
            Patch::AddPublicKeys { public_keys } => document.add_public_keys(public_keys),
            Patch::RemovePublicKeys { public_keys } => document.remove_public_keys(public_keys),
            Patch::AddServiceEndpoints { service_endpoints } => {
                document.add_services(service_endpoints)
            }
            Patch::RemoveServiceEndpoints {
                service_endpoint_ids,
            } => document.remove_services(service_endpoint_ids),
            Patch::Replace { document: replacement } => {
                replacement.validate_entries()?;
                *document = replacement.clone();
                Ok(())
            }
        }
    }
}

/// Apply patches strictly in order.
///
/// All-or-nothing: on failure the working copy is dropped and the caller's
/// document is unchanged.
pub fn apply_patches(document: &Document, patches: &[Patch]) -> Result<Document> {
    let mut working = document.clone();
    for patch in patches {
        patch.apply_in_place(&mut working)?;
    }
    Ok(working)
}

/// Validate every patch structurally and against the protocol version.
pub fn validate_patches(patches: &[Patch], params: &ProtocolParameters) -> Result<()> {
    for patch in patches {
        patch.validate()?;
        patch.check_allowed(params)?;
    }
    Ok(())
}

/// Whether any operation's path starts at the top-level `key`.
fn touches(patches: &JsonPatchOperations, key: &str) -> bool {
    patches.0.iter().any(|op| {
        let path = match op {
            PatchOperation::Add(add) => &add.path,
            PatchOperation::Remove(remove) => &remove.path,
            PatchOperation::Replace(replace) => &replace.path,
            _ => return false,
        };
        path.strip_prefix('/')
            .and_then(|rest| rest.split('/').next())
            .map_or(false, |first| first == key)
    })
}

fn validate_json_patch_operation(op: &PatchOperation) -> Result<()> {
    let path = match op {
        PatchOperation::Add(add) => &add.path,
        PatchOperation::Remove(remove) => &remove.path,
        PatchOperation::Replace(replace) => &replace.path,
        PatchOperation::Move(_) => return Err(malformed("json patch operation 'move' is not supported")),
        PatchOperation::Copy(_) => return Err(malformed("json patch operation 'copy' is not supported")),
        PatchOperation::Test(_) => return Err(malformed("json patch operation 'test' is not supported")),
    };
    validate_pointer(path)
}

/// A normalized JSON pointer below the document root that leaves `id` alone.
fn validate_pointer(path: &str) -> Result<()> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PatchError::MalformedPatch(format!(
            "path '{}' must start at the document root",
            path
        )));
    };

    let segments: Vec<&str> = rest.split('/').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(PatchError::MalformedPatch(format!(
                "path '{}' has an empty segment",
                path
            )));
        }
        let mut chars = segment.chars();
        while let Some(c) = chars.next() {
            if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
                return Err(PatchError::MalformedPatch(format!(
                    "path '{}' has an invalid escape",
                    path
                )));
            }
        }
    }

    if segments[0] == ID {
        return Err(PatchError::MalformedPatch(format!(
            "path '{}' targets the derived document id",
            path
        )));
    }

    Ok(())
}

fn validate_id_list(ids: &[String], what: &str) -> Result<()> {
    if ids.is_empty() {
        return Err(PatchError::MalformedPatch(format!("no {} ids to remove", what)));
    }
    for id in ids {
        validate_entry_id(id)?;
    }
    Ok(())
}

fn ensure_unique<'a>(ids: impl Iterator<Item = &'a str>, what: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PatchError::MalformedPatch(format!(
                "{} id '{}' appears twice",
                what, id
            )));
        }
    }
    Ok(())
}

fn parse<T: for<'de> Deserialize<'de>>(json: &str) -> Result<T> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| PatchError::MalformedPatch(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| PatchError::MalformedPatch(e.to_string()))
}

fn malformed(msg: &str) -> PatchError {
    PatchError::MalformedPatch(msg.to_string())
}
