pub mod configurator;
pub mod parts;
pub mod selection;

pub use configurator::{Configurator, ConfiguratorEvent, LoadKind};
pub use parts::{Part, PartsTable, SkippedVariant, VariantError, extract_parts};
pub use selection::{InvalidSelectionError, Selection, SelectionState};
