use std::path::PathBuf;

use serde_json::json;
use tailor_assets::{
    MaterialCatalog, MaterialFactory, MeshMaterials, Metadata, MetadataConventions, SceneGraph,
    SceneNode,
};
use tailor_core::IoTaskPool;
use tailor_scene::{Configurator, ConfiguratorEvent, LoadKind, SelectionState};

const LEATHER: &str =
    r##"{ "materials": [ { "id": "leatherBlack", "color": "#111111", "roughness": 0.4 } ] }"##;
const WALNUT: &str = r##"{ "materials": [ { "id": "walnut", "color": "#5d3a1a" } ] }"##;

fn temp_file(extension: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tailor-{}.{extension}", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn configurator() -> Configurator {
    Configurator::new(
        IoTaskPool(tokio::runtime::Handle::current()),
        MetadataConventions::default(),
    )
}

fn seat_scene() -> SceneGraph {
    let metadata: Metadata =
        serde_json::from_value(json!({ "material_alt": "leatherBlack", "materialWood": "walnut" }))
            .unwrap();
    let red_fabric = MaterialFactory::from_color("#aa2222").unwrap();
    let mut scene = SceneGraph::new();
    scene.add_root(SceneNode::mesh("Seat", MeshMaterials::Single(red_fabric)).with_metadata(metadata));
    scene
}

fn seat_variants(configurator: &Configurator) -> Vec<String> {
    configurator
        .parts()
        .get("Seat")
        .map(|p| p.variants().iter().map(|m| m.name().to_string()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn catalog_arrival_adds_variants() {
    let path = temp_file("json", LEATHER);
    let mut configurator = configurator();
    configurator.set_scene(seat_scene());
    assert_eq!(seat_variants(&configurator), ["#aa2222"]);

    configurator.load_catalog(path.to_str().unwrap());
    assert!(configurator.is_loading());

    match configurator.next_event().await.unwrap() {
        ConfiguratorEvent::CatalogUpdated { epoch, materials, .. } => {
            assert_eq!((epoch, materials), (1, 1));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(!configurator.is_loading());
    assert_eq!(seat_variants(&configurator), ["#aa2222", "leatherBlack"]);
    assert_eq!(configurator.parts().catalog_epoch(), 1);

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn failed_catalog_keeps_the_table() {
    let mut configurator = configurator();
    configurator.set_scene(seat_scene());
    configurator.set_catalog(MaterialCatalog::from_json(LEATHER.as_bytes()).unwrap());
    let before = configurator.parts();

    configurator.load_catalog("/definitely/not/here/material.data.json");

    assert!(matches!(
        configurator.next_event().await.unwrap(),
        ConfiguratorEvent::CatalogFailed { .. }
    ));
    assert_eq!(configurator.catalog().epoch(), 1);
    assert!(std::sync::Arc::ptr_eq(&before, &configurator.parts()));
    assert_eq!(seat_variants(&configurator), ["#aa2222", "leatherBlack"]);
}

#[tokio::test]
async fn only_the_latest_catalog_request_applies() {
    let old = temp_file("json", LEATHER);
    let new = temp_file("json", WALNUT);
    let mut configurator = configurator();
    configurator.set_scene(seat_scene());

    configurator.load_catalog(old.to_str().unwrap());
    configurator.load_catalog(new.to_str().unwrap());

    let mut stale = Vec::new();
    let mut updated = Vec::new();
    for _ in 0..2 {
        match configurator.next_event().await.unwrap() {
            ConfiguratorEvent::StaleDiscarded { source, kind } => {
                assert_eq!(kind, LoadKind::Catalog);
                stale.push(source);
            }
            ConfiguratorEvent::CatalogUpdated { source, epoch, .. } => {
                assert_eq!(epoch, 1);
                updated.push(source);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!(stale, [old.to_str().unwrap()]);
    assert_eq!(updated, [new.to_str().unwrap()]);
    assert_eq!(seat_variants(&configurator), ["#aa2222", "walnut"]);

    std::fs::remove_file(old).ok();
    std::fs::remove_file(new).ok();
}

#[tokio::test]
async fn catalog_in_flight_during_scene_swap_is_requested_again() {
    let path = temp_file("json", LEATHER);
    let mut configurator = configurator();
    configurator.set_scene(seat_scene());

    let first = configurator.load_catalog(path.to_str().unwrap());
    configurator.set_scene(seat_scene());
    assert_eq!(configurator.scene_generation(), 2);
    assert!(configurator.is_loading());

    let mut stale = 0;
    let mut applied = 0;
    for _ in 0..2 {
        match configurator.next_event().await.unwrap() {
            ConfiguratorEvent::StaleDiscarded { .. } => stale += 1,
            ConfiguratorEvent::CatalogUpdated { .. } => applied += 1,
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!((stale, applied), (1, 1));
    assert_eq!(first.scene_generation, 1);
    assert_eq!(seat_variants(&configurator), ["#aa2222", "leatherBlack"]);
    assert_eq!(configurator.catalog().epoch(), 1);

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn catalog_reload_reconciles_the_selection() {
    let mut configurator = configurator();
    configurator.set_scene(seat_scene());
    configurator.set_catalog(MaterialCatalog::from_json(LEATHER.as_bytes()).unwrap());

    configurator.select_part("Seat").unwrap();
    assert_eq!(configurator.select_material_at(1), Ok(1));

    // leatherBlack is gone from the catalog but is now the seat's own material
    configurator.set_catalog(MaterialCatalog::from_json(WALNUT.as_bytes()).unwrap());
    assert_eq!(seat_variants(&configurator), ["leatherBlack", "walnut"]);
    assert!(configurator.selection().selected_material().is_some());

    configurator.set_scene(SceneGraph::new());
    assert_eq!(configurator.selection(), &SelectionState::Idle);
    assert!(configurator.parts().is_empty());
}

#[tokio::test]
async fn vanished_part_returns_to_idle() {
    let mut configurator = configurator();
    configurator.set_scene(seat_scene());
    configurator.select_part("Seat").unwrap();

    let mut scene = SceneGraph::new();
    scene.add_root(SceneNode::mesh(
        "Back",
        MeshMaterials::Single(MaterialFactory::from_color("red").unwrap()),
    ));
    configurator.set_scene(scene);

    assert_eq!(configurator.selection(), &SelectionState::Idle);
    assert!(configurator.select_part("Seat").is_err());
    configurator.select_part("Back").unwrap();
}

#[tokio::test]
async fn model_loads_through_the_configurator() {
    let gltf = temp_file(
        "gltf",
        r##"{
            "asset": { "version": "2.0" },
            "scenes": [ { "nodes": [0, 1] } ],
            "nodes": [
                { "name": "Seat", "mesh": 0, "extras": { "material_alt": "leatherBlack" } },
                { "name": "Seat", "mesh": 0 }
            ],
            "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ] } ],
            "materials": [ { "name": "redFabric" } ],
            "accessors": [ { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 1] } ],
            "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
            "buffers": [ { "byteLength": 36 } ]
        }"##,
    );
    let mut configurator = configurator();
    configurator.set_catalog(MaterialCatalog::from_json(LEATHER.as_bytes()).unwrap());

    configurator.load_model("/definitely/not/here/chair.glb");
    configurator.load_model(gltf.to_str().unwrap());

    let mut replaced = 0;
    for _ in 0..2 {
        match configurator.next_event().await.unwrap() {
            ConfiguratorEvent::StaleDiscarded { kind, .. } => assert_eq!(kind, LoadKind::Model),
            ConfiguratorEvent::SceneReplaced { parts, .. } => {
                assert_eq!(parts, 1);
                replaced += 1;
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(replaced, 1);
    assert_eq!(seat_variants(&configurator), ["redFabric", "leatherBlack"]);

    configurator.select_part("Seat").unwrap();
    assert_eq!(configurator.select_material_at(1), Ok(2));

    std::fs::remove_file(gltf).ok();
}

#[tokio::test]
async fn flush_without_loads_is_empty() {
    let mut configurator = configurator();
    assert!(configurator.flush().is_empty());
    assert!(configurator.scene().is_none());
    assert!(configurator.select_material_at(0).is_err());
}
