use std::collections::{HashMap, HashSet};

use tailor_assets::{
    MaterialCreationError, MaterialData, MaterialFactory, MaterialInstance,
    MetadataConventions, MetadataEntry, MetadataResolutionError, NodeIndex, NodeKind, SceneGraph,
    SceneId, VersionedCatalog,
};
use tailor_core::Handle;
use thiserror::Error;

/// A named group of meshes and the materials it can wear.
#[derive(Clone, Debug)]
pub struct Part {
    name: String,
    variants: Vec<MaterialInstance>,
}

impl Part {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discovery order, unique by identity.
    pub fn variants(&self) -> &[MaterialInstance] {
        &self.variants
    }

    pub fn contains(&self, material: &MaterialInstance) -> bool {
        self.variants.contains(material)
    }

    /// Unnamed parts are shown by position, `Part 1`, `Part 2`, ...
    pub fn display_name(&self, position: usize) -> String {
        if self.name.is_empty() {
            format!("Part {}", position + 1)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariantError {
    #[error(transparent)]
    Metadata(#[from] MetadataResolutionError),
    #[error(transparent)]
    Material(#[from] MaterialCreationError),
}

/// A variant that was skipped during extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedVariant {
    pub part: String,
    pub node: NodeIndex,
    pub error: VariantError,
}

/// Every part of one scene, built in a single pass and never patched.
#[derive(Clone, Debug, Default)]
pub struct PartsTable {
    parts: Vec<Part>,
    index: HashMap<String, usize>,
    scene: Option<SceneId>,
    catalog_epoch: u64,
    skipped: Vec<SkippedVariant>,
}

impl PartsTable {
    pub fn get(&self, name: &str) -> Option<&Part> {
        self.index.get(name).map(|&i| &self.parts[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn part_at(&self, position: usize) -> Option<&Part> {
        self.parts.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The scene this table was built from, `None` for the empty table.
    pub fn scene_id(&self) -> Option<SceneId> {
        self.scene
    }

    pub fn catalog_epoch(&self) -> u64 {
        self.catalog_epoch
    }

    pub fn skipped(&self) -> &[SkippedVariant] {
        &self.skipped
    }
}

// What a metadata-derived variant stands for: the catalog id, or the color
// string as written. The same reference on several nodes of one part yields
// one variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum VariantSource {
    Catalog(String),
    Color(String),
}

struct PartBuilder {
    part: Part,
    seen: HashSet<Handle<MaterialData>>,
    sources: HashSet<VariantSource>,
}

impl PartBuilder {
    fn new(name: &str) -> Self {
        Self {
            part: Part {
                name: name.to_string(),
                variants: Vec::new(),
            },
            seen: HashSet::new(),
            sources: HashSet::new(),
        }
    }

    fn add(&mut self, material: MaterialInstance) {
        if self.seen.insert(material.handle()) {
            self.part.variants.push(material);
        }
    }
}

/// Walks the scene once and builds the table of parts.
///
/// Direct materials come first for each node, then whatever its metadata
/// resolves to. Unresolvable references and bad colors are logged, recorded
/// in [`PartsTable::skipped`] and otherwise ignored.
pub fn extract_parts(
    scene: &SceneGraph,
    catalog: &VersionedCatalog,
    conventions: &MetadataConventions,
) -> PartsTable {
    let mut builders: Vec<PartBuilder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = Vec::new();

    for (node_index, node) in scene.traverse() {
        let NodeKind::Mesh(materials) = &node.kind else {
            continue;
        };

        let slot = *index.entry(node.name.clone()).or_insert_with(|| {
            builders.push(PartBuilder::new(&node.name));
            builders.len() - 1
        });
        let builder = &mut builders[slot];

        // 1. Direct assignments
        for material in materials.as_slice() {
            builder.add(material.clone());
        }

        // 2. Metadata references
        for entry in conventions.classify(&node.metadata) {
            let mut skip = |error: VariantError| {
                report_skip(catalog, &node.name, node_index, &error);
                skipped.push(SkippedVariant {
                    part: node.name.clone(),
                    node: node_index,
                    error,
                });
            };

            match entry {
                MetadataEntry::CatalogRef { key, id } => {
                    let Some(descriptor) = catalog.catalog().lookup(&id) else {
                        skip(MetadataResolutionError::UnknownCatalogId { key, id }.into());
                        continue;
                    };

                    let source = VariantSource::Catalog(descriptor.id.clone());
                    if builder.sources.contains(&source) {
                        continue;
                    }

                    match MaterialFactory::from_descriptor(descriptor) {
                        Ok(material) => {
                            builder.sources.insert(source);
                            builder.add(material);
                        }
                        Err(e) => skip(e.into()),
                    }
                }
                MetadataEntry::InlineColors { colors, .. } => {
                    for color in colors {
                        // Keyed as written: "red" and "#ff0000" are two variants
                        let source = VariantSource::Color(color.trim().to_string());
                        if builder.sources.contains(&source) {
                            continue;
                        }

                        match MaterialFactory::from_color(&color) {
                            Ok(material) => {
                                builder.sources.insert(source);
                                builder.add(material);
                            }
                            Err(e) => skip(e.into()),
                        }
                    }
                }
                MetadataEntry::Malformed(e) => skip(e.into()),
            }
        }

        log::debug!(
            "[Extractor] Node #{} '{}': {} variant(s) so far",
            node_index,
            node.name,
            builder.part.variants.len()
        );
    }

    let table = PartsTable {
        parts: builders.into_iter().map(|b| b.part).collect(),
        index,
        scene: Some(scene.id()),
        catalog_epoch: catalog.epoch(),
        skipped,
    };

    log::info!(
        "[Extractor] Scene {} with catalog epoch {}: {} part(s), {} skipped variant(s)",
        scene.id().get(),
        table.catalog_epoch,
        table.len(),
        table.skipped.len()
    );

    table
}

fn report_skip(catalog: &VersionedCatalog, part: &str, node: NodeIndex, error: &VariantError) {
    // Before the first catalog arrives every catalog reference is unknown
    let expected = catalog.epoch() == 0
        && matches!(
            error,
            VariantError::Metadata(MetadataResolutionError::UnknownCatalogId { .. })
        );

    if expected {
        log::debug!("[Extractor] Part '{part}' (node #{node}): {error}, catalog not loaded yet");
    } else {
        log::warn!("[Extractor] Part '{part}' (node #{node}): skipping variant, {error}");
    }
}
