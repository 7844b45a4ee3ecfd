use glam::Vec3;
use tailor_core::Color;

use crate::{
    error::SceneLoadError,
    material::{MaterialFactory, MaterialInstance, MaterialOrigin, MaterialSettings},
    metadata::Metadata,
    scene::{MeshMaterials, NodeIndex, NodeKind, SceneGraph, SceneNode},
};

/// Builds a scene graph from a `.glb` or `.gltf` document.
/// Only the JSON document is read; buffers and images are never touched.
pub fn parse_gltf(bytes: &[u8]) -> Result<SceneGraph, SceneLoadError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let document = &gltf.document;

    // --- STEP 1: MATERIALS ---
    // One instance per glTF material, shared by every primitive using it
    let material_map: Vec<MaterialInstance> = document
        .materials()
        .enumerate()
        .map(|(index, mat)| {
            let pbr = mat.pbr_metallic_roughness();
            let [r, g, b, _a] = pbr.base_color_factor();

            let settings = MaterialSettings {
                base_color: Color::from_linear(Vec3::new(r, g, b)),
                roughness: pbr.roughness_factor(),
                metallic: pbr.metallic_factor(),
                emissive: Color::from_linear(Vec3::from_array(mat.emissive_factor())),
            };

            let name = mat
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Material {index}"));

            MaterialFactory::from_settings(name, settings, MaterialOrigin::Scene { index: Some(index) })
        })
        .collect();

    // Primitives without a material all share this one
    let mut default_material: Option<MaterialInstance> = None;

    // --- STEP 2: NODES ---
    // Arena indices match glTF node indices
    let mut graph = SceneGraph::new();

    for node in document.nodes() {
        let mut metadata = Metadata::new();

        let kind = match node.mesh() {
            Some(mesh) => {
                merge_extras(&mut metadata, mesh.extras(), "mesh", mesh.index());

                let materials = mesh
                    .primitives()
                    .map(|primitive| match primitive.material().index() {
                        Some(index) => material_map[index].clone(),
                        None => default_material
                            .get_or_insert_with(|| {
                                MaterialFactory::from_settings(
                                    "Default",
                                    MaterialSettings::default(),
                                    MaterialOrigin::Scene { index: None },
                                )
                            })
                            .clone(),
                    })
                    .collect();

                NodeKind::Mesh(MeshMaterials::from_vec(materials))
            }
            None => NodeKind::Empty,
        };

        // Node extras win over mesh extras
        merge_extras(&mut metadata, node.extras(), "node", node.index());

        let name = node
            .name()
            .or_else(|| node.mesh().and_then(|m| m.name()))
            .unwrap_or_default();

        let index = graph.add_node(SceneNode {
            name: name.to_string(),
            kind,
            metadata,
            children: node.children().map(|c| c.index()).collect(),
        });
        debug_assert_eq!(index, node.index());
    }

    // --- STEP 3: ROOTS ---
    let roots: Vec<NodeIndex> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => {
            // No scene at all: every node nobody points at is a root
            let mut has_parent = vec![false; document.nodes().len()];
            for node in document.nodes() {
                for child in node.children() {
                    has_parent[child.index()] = true;
                }
            }
            (0..has_parent.len()).filter(|&i| !has_parent[i]).collect()
        }
    };
    graph.set_roots(roots);

    log::debug!(
        "[GltfParser] {} node(s), {} material(s), {} root(s)",
        graph.len(),
        material_map.len(),
        graph.roots().len()
    );

    Ok(graph)
}

fn merge_extras(metadata: &mut Metadata, extras: &gltf::json::Extras, owner: &str, index: usize) {
    let Some(raw) = extras else {
        return;
    };

    match serde_json::from_str::<Metadata>(raw.get()) {
        Ok(values) => metadata.extend(values),
        Err(e) => log::warn!("[GltfParser] Ignoring extras on {owner} #{index}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "Sofa", "children": [1, 2] },
            { "name": "Seat", "mesh": 0, "extras": { "material_alt": "leatherBlack" } },
            { "mesh": 1 }
        ],
        "meshes": [
            { "name": "SeatMesh", "extras": { "extraColors": ["red"], "material_alt": "overridden" },
              "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ] },
            { "name": "Frame",
              "primitives": [
                { "attributes": { "POSITION": 0 }, "material": 1 },
                { "attributes": { "POSITION": 0 } }
              ] }
        ],
        "materials": [
            { "name": "redFabric", "pbrMetallicRoughness": { "baseColorFactor": [1, 0, 0, 1], "roughnessFactor": 0.8 } },
            { "pbrMetallicRoughness": { "metallicFactor": 1.0 } }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 1] }
        ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "buffers": [ { "byteLength": 36 } ]
    }"#;

    #[test]
    fn builds_nodes_materials_and_metadata() {
        let graph = parse_gltf(DOCUMENT.as_bytes()).unwrap();

        assert_eq!(graph.roots(), &[0]);
        let names: Vec<&str> = graph.traverse().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, ["Sofa", "Seat", "Frame"]);

        let seat = graph.node(1).unwrap();
        let MeshMaterials::Single(fabric) = seat.materials().unwrap() else {
            panic!("seat should carry one material");
        };
        assert_eq!(fabric.name(), "redFabric");
        assert_eq!(fabric.swatch(), "#ff0000");
        assert_eq!(seat.metadata["material_alt"], "leatherBlack");
        assert!(seat.metadata.contains_key("extraColors"));

        let frame = graph.node(2).unwrap();
        let MeshMaterials::Multi(parts) = frame.materials().unwrap() else {
            panic!("frame should be multi-material");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].origin(), &MaterialOrigin::Scene { index: None });
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_gltf(b"definitely not gltf"), Err(SceneLoadError::Gltf(_))));
    }
}
