use std::{collections::HashMap, sync::Arc};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::CatalogFetchError,
    material::{MaterialDescriptor, MaterialFields},
};

// Entries show up either flat or with their fields nested under `data`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Nested {
        #[serde(default)]
        id: Option<String>,
        data: MaterialFields,
    },
    Flat {
        #[serde(default)]
        id: Option<String>,
        #[serde(flatten)]
        fields: MaterialFields,
    },
}

impl RawEntry {
    fn into_parts(self) -> (Option<String>, MaterialFields) {
        match self {
            RawEntry::Nested { id, data } => (id, data),
            RawEntry::Flat { id, fields } => (id, fields),
        }
    }
}

/// Material descriptors in document order.
///
/// Canonical document: `{ "materials": [ { "id": .., "color": .., "roughness": .. } ] }`.
/// A keyed document `{ "materials": { "<key>": { .. } } }` is normalized into
/// the same shape: the key becomes the id unless the entry has its own, and
/// stays around as a lookup alias.
#[derive(Clone, Debug, Default)]
pub struct MaterialCatalog {
    descriptors: Vec<MaterialDescriptor>,
    by_id: HashMap<String, usize>,
    by_key: HashMap<String, usize>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = MaterialDescriptor>) -> Self {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.insert(descriptor, None);
        }
        catalog
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogFetchError> {
        let document: Value = serde_json::from_slice(bytes)?;

        let materials = document
            .get("materials")
            .ok_or_else(|| CatalogFetchError::Malformed("missing 'materials'".into()))?;

        let mut catalog = Self::new();

        match materials {
            Value::Array(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    match RawEntry::deserialize(entry).map(RawEntry::into_parts) {
                        Ok((Some(id), fields)) => {
                            catalog.insert(MaterialDescriptor::new(id, fields), None);
                        }
                        Ok((None, _)) => {
                            log::warn!("[Catalog] Skipping entry #{index}: no 'id'");
                        }
                        Err(e) => {
                            log::warn!("[Catalog] Skipping entry #{index}: {e}");
                        }
                    }
                }
            }
            Value::Object(entries) => {
                for (key, entry) in entries {
                    match RawEntry::deserialize(entry).map(RawEntry::into_parts) {
                        Ok((id, fields)) => {
                            let id = id.unwrap_or_else(|| key.clone());
                            catalog.insert(MaterialDescriptor::new(id, fields), Some(key.clone()));
                        }
                        Err(e) => {
                            log::warn!("[Catalog] Skipping entry '{key}': {e}");
                        }
                    }
                }
            }
            other => {
                return Err(CatalogFetchError::Malformed(format!(
                    "'materials' must be an array or an object, found {}",
                    value_kind(other)
                )));
            }
        }

        Ok(catalog)
    }

    // First entry wins on duplicate ids
    fn insert(&mut self, descriptor: MaterialDescriptor, key: Option<String>) {
        if self.by_id.contains_key(&descriptor.id) {
            log::warn!(
                "[Catalog] Duplicate material id '{}', keeping the first one",
                descriptor.id
            );
            return;
        }

        let index = self.descriptors.len();
        self.by_id.insert(descriptor.id.clone(), index);
        if let Some(key) = key {
            self.by_key.entry(key).or_insert(index);
        }
        self.descriptors.push(descriptor);
    }

    /// Resolves a metadata reference: by id first, then by entry key.
    pub fn lookup(&self, reference: &str) -> Option<&MaterialDescriptor> {
        self.by_id
            .get(reference)
            .or_else(|| self.by_key.get(reference))
            .map(|&index| &self.descriptors[index])
    }

    pub fn get(&self, id: &str) -> Option<&MaterialDescriptor> {
        self.by_id.get(id).map(|&index| &self.descriptors[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// The catalog the extractor runs against, tagged with its epoch.
/// Epoch 0 is the empty catalog every session starts with.
#[derive(Clone, Debug, Default)]
pub struct VersionedCatalog {
    epoch: u64,
    catalog: Arc<MaterialCatalog>,
}

impl VersionedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    /// Swaps in a new catalog as a whole and returns the new epoch.
    pub fn replace(&mut self, catalog: MaterialCatalog) -> u64 {
        self.catalog = Arc::new(catalog);
        self.epoch += 1;
        self.epoch
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn describe_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string \"{s}\""),
        other => value_kind(other).to_string(),
    }
}
