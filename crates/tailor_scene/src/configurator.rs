use std::sync::Arc;

use tailor_assets::{
    AssetEvents, AssetServer, AssetWorkerMessage, CatalogFetchError, LoadTicket, MaterialCatalog,
    MaterialInstance, MetadataConventions, SceneGraph, SceneLoadError, VersionedCatalog,
};
use tailor_core::IoTaskPool;

use crate::{
    parts::{PartsTable, extract_parts},
    selection::{InvalidSelectionError, Selection, SelectionState},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadKind {
    Catalog,
    Model,
}

/// What `flush` did, for the host to show.
#[derive(Debug)]
pub enum ConfiguratorEvent {
    SceneReplaced { source: String, parts: usize },
    SceneFailed { source: String, error: SceneLoadError },
    CatalogUpdated { source: String, epoch: u64, materials: usize },
    CatalogFailed { source: String, error: CatalogFetchError },
    StaleDiscarded { source: String, kind: LoadKind },
}

#[derive(Clone, Debug)]
struct Pending {
    ticket: LoadTicket,
    source: String,
}

/// One customization session: the live scene, the catalog it is resolved
/// against, the derived parts table and the user's selection.
///
/// Lives on the host thread. Loads run on the I/O pool and only take effect
/// in [`Configurator::flush`].
pub struct Configurator {
    server: AssetServer,
    events: AssetEvents,
    conventions: MetadataConventions,

    scene: Option<SceneGraph>,
    scene_generation: u64,
    catalog: VersionedCatalog,
    parts: Arc<PartsTable>,
    selection: Selection,

    next_request: u64,
    pending_catalog: Option<Pending>,
    pending_model: Option<Pending>,
}

impl Configurator {
    pub fn new(io: IoTaskPool, conventions: MetadataConventions) -> Self {
        let (server, events) = AssetServer::new(io);
        Self {
            server,
            events,
            conventions,
            scene: None,
            scene_generation: 0,
            catalog: VersionedCatalog::new(),
            parts: Arc::new(PartsTable::default()),
            selection: Selection::new(),
            next_request: 0,
            pending_catalog: None,
            pending_model: None,
        }
    }

    fn next_ticket(&mut self) -> LoadTicket {
        self.next_request += 1;
        LoadTicket {
            request: self.next_request,
            scene_generation: self.scene_generation,
        }
    }

    /// Starts loading a model. A later `load_model` or `set_scene` supersedes it.
    pub fn load_model(&mut self, source: &str) -> LoadTicket {
        let ticket = self.next_ticket();
        self.pending_model = Some(Pending {
            ticket,
            source: source.to_string(),
        });
        self.server.load_scene(source, ticket);
        ticket
    }

    /// Starts loading a catalog. Only the latest request for the current
    /// scene is ever applied.
    pub fn load_catalog(&mut self, source: &str) -> LoadTicket {
        let ticket = self.next_ticket();
        self.pending_catalog = Some(Pending {
            ticket,
            source: source.to_string(),
        });
        self.server.load_catalog(source, ticket);
        ticket
    }

    /// Installs an already parsed scene right away.
    pub fn set_scene(&mut self, scene: SceneGraph) {
        if let Some(pending) = self.pending_model.take() {
            log::info!(
                "[Configurator] Model '{}' superseded by a directly set scene",
                pending.source
            );
        }
        self.install_scene(scene);
    }

    /// Installs a catalog right away, bypassing the loader.
    pub fn set_catalog(&mut self, catalog: MaterialCatalog) -> u64 {
        self.pending_catalog = None;
        let epoch = self.catalog.replace(catalog);
        self.reextract();
        epoch
    }

    pub fn is_loading(&self) -> bool {
        self.pending_catalog.is_some() || self.pending_model.is_some()
    }

    /// Applies whatever the loaders delivered since the last call.
    pub fn flush(&mut self) -> Vec<ConfiguratorEvent> {
        self.events
            .drain()
            .into_iter()
            .map(|msg| self.apply(msg))
            .collect()
    }

    /// Waits for the next loader message and applies it.
    /// `None` once the loader side is gone.
    pub async fn next_event(&mut self) -> Option<ConfiguratorEvent> {
        let msg = self.events.recv().await?;
        Some(self.apply(msg))
    }

    fn apply(&mut self, msg: AssetWorkerMessage) -> ConfiguratorEvent {
        match msg {
            AssetWorkerMessage::SceneLoaded {
                ticket,
                source,
                result,
            } => {
                if !is_current(&self.pending_model, ticket) {
                    log::info!("[Configurator] Discarding stale model '{}'", source);
                    return ConfiguratorEvent::StaleDiscarded {
                        source,
                        kind: LoadKind::Model,
                    };
                }
                self.pending_model = None;

                match result {
                    Ok(scene) => {
                        self.install_scene(scene);
                        ConfiguratorEvent::SceneReplaced {
                            source,
                            parts: self.parts.len(),
                        }
                    }
                    Err(error) => {
                        log::warn!("[Configurator] Keeping the current scene: {}", error);
                        ConfiguratorEvent::SceneFailed { source, error }
                    }
                }
            }
            AssetWorkerMessage::CatalogLoaded {
                ticket,
                source,
                result,
            } => {
                if !is_current(&self.pending_catalog, ticket)
                    || ticket.scene_generation != self.scene_generation
                {
                    log::info!("[Configurator] Discarding stale catalog '{}'", source);
                    return ConfiguratorEvent::StaleDiscarded {
                        source,
                        kind: LoadKind::Catalog,
                    };
                }
                self.pending_catalog = None;

                match result {
                    Ok(catalog) => {
                        let materials = catalog.len();
                        let epoch = self.catalog.replace(catalog);
                        log::info!(
                            "[Configurator] Catalog '{}' is now epoch {} ({} material(s))",
                            source,
                            epoch,
                            materials
                        );
                        self.reextract();
                        ConfiguratorEvent::CatalogUpdated {
                            source,
                            epoch,
                            materials,
                        }
                    }
                    Err(error) => {
                        // Degrade to what the scene itself provides
                        log::warn!(
                            "[Configurator] Keeping catalog epoch {}: {}",
                            self.catalog.epoch(),
                            error
                        );
                        ConfiguratorEvent::CatalogFailed { source, error }
                    }
                }
            }
        }
    }

    fn install_scene(&mut self, scene: SceneGraph) {
        self.scene_generation += 1;
        log::info!(
            "[Configurator] Scene {} installed as generation {}",
            scene.id().get(),
            self.scene_generation
        );

        self.scene = Some(scene);
        self.selection.reset();
        self.reextract();

        // An in-flight catalog was requested for the previous scene
        if let Some(pending) = self.pending_catalog.take() {
            log::info!(
                "[Configurator] Re-requesting catalog '{}' for the new scene",
                pending.source
            );
            self.load_catalog(&pending.source);
        }
    }

    // The full table is built first and swapped in with one assignment
    fn reextract(&mut self) {
        let table = match &self.scene {
            Some(scene) => extract_parts(scene, &self.catalog, &self.conventions),
            None => PartsTable::default(),
        };
        self.parts = Arc::new(table);
        self.selection.reconcile(&self.parts);
    }

    pub fn select_part(&mut self, name: &str) -> Result<(), InvalidSelectionError> {
        self.selection.select_part(&self.parts, name)
    }

    pub fn select_material(&mut self, material: &MaterialInstance) -> Result<usize, InvalidSelectionError> {
        let scene = self
            .scene
            .as_mut()
            .ok_or(InvalidSelectionError::NoPartSelected)?;
        self.selection.select_material(&self.parts, scene, material)
    }

    pub fn select_material_at(&mut self, index: usize) -> Result<usize, InvalidSelectionError> {
        let scene = self
            .scene
            .as_mut()
            .ok_or(InvalidSelectionError::NoPartSelected)?;
        self.selection.select_material_at(&self.parts, scene, index)
    }

    /// Snapshot of the current table. Stays valid after later swaps.
    pub fn parts(&self) -> Arc<PartsTable> {
        Arc::clone(&self.parts)
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn scene_generation(&self) -> u64 {
        self.scene_generation
    }

    pub fn catalog(&self) -> &VersionedCatalog {
        &self.catalog
    }

    pub fn conventions(&self) -> &MetadataConventions {
        &self.conventions
    }
}

fn is_current(pending: &Option<Pending>, ticket: LoadTicket) -> bool {
    pending.as_ref().is_some_and(|p| p.ticket == ticket)
}
