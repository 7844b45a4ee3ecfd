use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{catalog::describe_value, error::MetadataResolutionError};

/// Free-form annotations on a node (glTF `extras`), sorted by key.
pub type Metadata = BTreeMap<String, Value>;

/// Which metadata keys point at extra materials.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetadataConventions {
    /// Keys starting with this hold a catalog reference.
    pub material_prefix: String,
    /// This key holds a list of colors, either as a JSON array or as a
    /// string containing one.
    pub colors_key: String,
}

impl Default for MetadataConventions {
    fn default() -> Self {
        Self {
            material_prefix: "material".into(),
            colors_key: "extraColors".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MetadataEntry {
    CatalogRef { key: String, id: String },
    InlineColors { key: String, colors: Vec<String> },
    Malformed(MetadataResolutionError),
}

impl MetadataConventions {
    /// Classifies every entry that matches a convention, in key order.
    /// Keys matching neither convention are left alone.
    pub fn classify(&self, metadata: &Metadata) -> Vec<MetadataEntry> {
        let mut entries = Vec::new();

        for (key, value) in metadata {
            if *key == self.colors_key {
                classify_colors(key, value, &mut entries);
            } else if key.starts_with(&self.material_prefix) {
                entries.push(match value {
                    Value::String(id) => MetadataEntry::CatalogRef {
                        key: key.clone(),
                        id: id.clone(),
                    },
                    other => MetadataEntry::Malformed(MetadataResolutionError::UnexpectedValue {
                        key: key.clone(),
                        expected: "a catalog id string",
                        found: describe_value(other),
                    }),
                });
            }
        }

        entries
    }
}

fn classify_colors(key: &str, value: &Value, entries: &mut Vec<MetadataEntry>) {
    let malformed = |reason: String| {
        MetadataEntry::Malformed(MetadataResolutionError::MalformedColorList {
            key: key.to_string(),
            reason,
        })
    };

    // `"[\"#fff\", \"red\"]"` and `["#fff", "red"]` both work
    let decoded;
    let items = match value {
        Value::Array(items) => items,
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => {
                decoded = items;
                &decoded
            }
            Ok(other) => {
                entries.push(malformed(format!(
                    "expected an array, found {}",
                    describe_value(&other)
                )));
                return;
            }
            Err(e) => {
                entries.push(malformed(e.to_string()));
                return;
            }
        },
        other => {
            entries.push(malformed(format!(
                "expected an array, found {}",
                describe_value(other)
            )));
            return;
        }
    };

    let mut colors = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::String(color) => colors.push(color.clone()),
            other => entries.push(malformed(format!(
                "element #{index} is {}, expected a color string",
                describe_value(other)
            ))),
        }
    }

    if !colors.is_empty() {
        entries.push(MetadataEntry::InlineColors {
            key: key.to_string(),
            colors,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn catalog_refs_use_prefix() {
        let entries = MetadataConventions::default().classify(&metadata(json!({
            "material_alt": "leatherBlack",
            "materialB": "oak",
            "other": "ignored"
        })));

        assert_eq!(
            entries,
            vec![
                MetadataEntry::CatalogRef {
                    key: "materialB".into(),
                    id: "oak".into()
                },
                MetadataEntry::CatalogRef {
                    key: "material_alt".into(),
                    id: "leatherBlack".into()
                },
            ]
        );
    }

    #[test]
    fn color_lists_accept_encoded_and_native_arrays() {
        let conventions = MetadataConventions::default();

        let encoded = conventions.classify(&metadata(json!({ "extraColors": "[\"#fff\", \"red\"]" })));
        let native = conventions.classify(&metadata(json!({ "extraColors": ["#fff", "red"] })));

        let expected = vec![MetadataEntry::InlineColors {
            key: "extraColors".into(),
            colors: vec!["#fff".into(), "red".into()],
        }];
        assert_eq!(encoded, expected);
        assert_eq!(native, expected);
    }

    #[test]
    fn wrong_shapes_are_malformed() {
        let entries = MetadataConventions::default().classify(&metadata(json!({
            "extraColors": "{not json",
            "material": 42
        })));

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| matches!(e, MetadataEntry::Malformed(_))));

        let entries = MetadataConventions::default()
            .classify(&metadata(json!({ "extraColors": "{\"a\": 1}" })));
        assert!(matches!(
            entries.as_slice(),
            [MetadataEntry::Malformed(MetadataResolutionError::MalformedColorList { .. })]
        ));
    }

    #[test]
    fn non_string_color_elements_are_dropped_individually() {
        let entries = MetadataConventions::default()
            .classify(&metadata(json!({ "extraColors": ["#fff", 7] })));

        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], MetadataEntry::Malformed(_)));
        assert_eq!(
            entries[1],
            MetadataEntry::InlineColors {
                key: "extraColors".into(),
                colors: vec!["#fff".into()]
            }
        );
    }

    #[test]
    fn custom_conventions() {
        let conventions = MetadataConventions {
            material_prefix: "variant".into(),
            colors_key: "palette".into(),
        };
        let entries = conventions.classify(&metadata(json!({
            "variant1": "oak",
            "material": "ignored-now",
            "palette": ["blue"]
        })));
        assert_eq!(entries.len(), 2);
    }
}
