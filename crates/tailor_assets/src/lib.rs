pub mod asset_events;
pub mod asset_server;
pub mod catalog;
pub mod error;
pub mod material;
pub mod metadata;
pub mod scene;

pub use asset_events::AssetEvents;
pub use asset_server::{AssetServer, AssetSource, AssetWorkerMessage, LoadTicket};
pub use catalog::{MaterialCatalog, VersionedCatalog};
pub use error::{
    CatalogFetchError, MaterialCreationError, MetadataResolutionError, SceneLoadError,
    SourceError,
};
pub use material::{
    MaterialData, MaterialDescriptor, MaterialFactory, MaterialFields, MaterialInstance,
    MaterialOrigin, MaterialSettings,
};
pub use metadata::{Metadata, MetadataConventions, MetadataEntry};
pub use scene::{MeshMaterials, NodeIndex, NodeKind, SceneGraph, SceneId, SceneNode};
