use tailor_core::IoTaskPool;
use tokio::runtime::Handle as TokioHandle;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::{
    asset_events::AssetEvents,
    catalog::MaterialCatalog,
    error::{CatalogFetchError, SceneLoadError},
    scene::SceneGraph,
};

pub mod gltf_parser;
pub mod io;

pub use io::AssetSource;

/// Tags a request so its answer can be matched against what the host
/// currently expects. Answers to superseded requests get dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub request: u64,
    pub scene_generation: u64,
}

// Heavy results, handed to the host thread through the channel
#[derive(Debug)]
pub enum AssetWorkerMessage {
    CatalogLoaded {
        ticket: LoadTicket,
        source: String,
        result: Result<MaterialCatalog, CatalogFetchError>,
    },
    SceneLoaded {
        ticket: LoadTicket,
        source: String,
        result: Result<SceneGraph, SceneLoadError>,
    },
}

#[derive(Clone)]
pub struct AssetServer {
    event_sender: UnboundedSender<AssetWorkerMessage>,
    // The "Ticket" to the Async World
    io_handle: TokioHandle,
}

impl AssetServer {
    /// The server side spawns loads, the `AssetEvents` side is drained by the host.
    pub fn new(io: IoTaskPool) -> (Self, AssetEvents) {
        let (tx, rx) = unbounded_channel::<AssetWorkerMessage>();
        let server = Self {
            event_sender: tx,
            io_handle: io.handle().clone(),
        };
        (server, AssetEvents::new(rx))
    }

    /// Single shot, no retry. The answer always comes back as a message,
    /// failures included.
    pub fn load_catalog(&self, source: &str, ticket: LoadTicket) {
        let source = source.to_owned();
        let sender = self.event_sender.clone();

        self.io_handle.spawn(async move {
            log::info!("[AssetServer] Loading catalog: {}", source);

            let result = fetch_catalog(&source).await;
            match &result {
                Ok(catalog) => log::info!(
                    "[AssetServer] Catalog '{}' parsed, {} material(s)",
                    source,
                    catalog.len()
                ),
                Err(e) => log::warn!("[AssetServer] Catalog '{}' failed: {}", source, e),
            }

            if sender
                .send(AssetWorkerMessage::CatalogLoaded { ticket, source, result })
                .is_err()
            {
                log::debug!("[AssetServer] Catalog finished after the host went away");
            }
        });
    }

    pub fn load_scene(&self, source: &str, ticket: LoadTicket) {
        let source = source.to_owned();
        let sender = self.event_sender.clone();

        self.io_handle.spawn(async move {
            log::info!("[AssetServer] Loading model: {}", source);

            let result = fetch_scene(&source).await;
            match &result {
                Ok(scene) => log::info!(
                    "[AssetServer] Model '{}' parsed, {} node(s)",
                    source,
                    scene.len()
                ),
                Err(e) => log::warn!("[AssetServer] Model '{}' failed: {}", source, e),
            }

            if sender
                .send(AssetWorkerMessage::SceneLoaded { ticket, source, result })
                .is_err()
            {
                log::debug!("[AssetServer] Model finished after the host went away");
            }
        });
    }
}

async fn fetch_catalog(source: &str) -> Result<MaterialCatalog, CatalogFetchError> {
    let bytes = AssetSource::parse(source)?.read_bytes().await?;

    tokio::task::spawn_blocking(move || MaterialCatalog::from_json(&bytes))
        .await
        .map_err(|e| CatalogFetchError::TaskFailed(e.to_string()))?
}

async fn fetch_scene(source: &str) -> Result<SceneGraph, SceneLoadError> {
    let source = AssetSource::parse(source)?;
    let bytes = source.read_bytes().await?;
    log::debug!("[AssetServer] {} read, {} byte(s)", source.filename(), bytes.len());

    // Parsing is CPU work, keep it off the async workers
    tokio::task::spawn_blocking(move || gltf_parser::parse_gltf(&bytes))
        .await
        .map_err(|e| SceneLoadError::TaskFailed(e.to_string()))?
}
