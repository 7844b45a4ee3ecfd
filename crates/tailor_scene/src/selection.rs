use tailor_assets::{MaterialInstance, SceneGraph};
use thiserror::Error;

use crate::parts::PartsTable;

/// A selection request that was rejected. The state and the scene are untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidSelectionError {
    #[error("no part is selected")]
    NoPartSelected,

    #[error("unknown part '{0}'")]
    UnknownPart(String),

    #[error("material '{material}' is not a variant of part '{part}'")]
    NotAVariant { part: String, material: String },

    #[error("part '{part}' has no variant #{index}")]
    VariantOutOfRange { part: String, index: usize },

    #[error("the parts table was built for another scene")]
    SceneMismatch,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Idle,
    PartSelected {
        part: String,
    },
    MaterialApplied {
        part: String,
        material: MaterialInstance,
    },
}

impl SelectionState {
    pub fn selected_part(&self) -> Option<&str> {
        match self {
            SelectionState::Idle => None,
            SelectionState::PartSelected { part } | SelectionState::MaterialApplied { part, .. } => {
                Some(part)
            }
        }
    }

    pub fn selected_material(&self) -> Option<&MaterialInstance> {
        match self {
            SelectionState::MaterialApplied { material, .. } => Some(material),
            _ => None,
        }
    }
}

/// Idle -> PartSelected -> MaterialApplied.
///
/// The only component that writes to the scene, and only through
/// `select_material`.
#[derive(Debug, Default)]
pub struct Selection {
    state: SelectionState,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Picking another part drops the applied marker. Whatever the meshes
    /// were last painted with stays on them.
    pub fn select_part(&mut self, parts: &PartsTable, name: &str) -> Result<(), InvalidSelectionError> {
        if parts.get(name).is_none() {
            return Err(InvalidSelectionError::UnknownPart(name.to_string()));
        }

        if self.state.selected_part() != Some(name) {
            log::debug!("[Selection] Part '{}' selected", name);
            self.state = SelectionState::PartSelected {
                part: name.to_string(),
            };
        }
        Ok(())
    }

    /// Binds `material` to every mesh of the selected part.
    /// Returns how many nodes were rebound.
    pub fn select_material(
        &mut self,
        parts: &PartsTable,
        scene: &mut SceneGraph,
        material: &MaterialInstance,
    ) -> Result<usize, InvalidSelectionError> {
        let part_name = self
            .state
            .selected_part()
            .ok_or(InvalidSelectionError::NoPartSelected)?;

        if parts.scene_id() != Some(scene.id()) {
            return Err(InvalidSelectionError::SceneMismatch);
        }

        let part = parts
            .get(part_name)
            .ok_or_else(|| InvalidSelectionError::UnknownPart(part_name.to_string()))?;

        if !part.contains(material) {
            return Err(InvalidSelectionError::NotAVariant {
                part: part_name.to_string(),
                material: material.name().to_string(),
            });
        }

        let rebound = scene.rebind_material(part_name, material);
        log::info!(
            "[Selection] Applied '{}' ({}) to part '{}' on {} node(s)",
            material.name(),
            material.swatch(),
            part_name,
            rebound
        );

        self.state = SelectionState::MaterialApplied {
            part: part_name.to_string(),
            material: material.clone(),
        };
        Ok(rebound)
    }

    /// Positional form of `select_material`, as a swatch row would call it.
    pub fn select_material_at(
        &mut self,
        parts: &PartsTable,
        scene: &mut SceneGraph,
        index: usize,
    ) -> Result<usize, InvalidSelectionError> {
        let part_name = self
            .state
            .selected_part()
            .ok_or(InvalidSelectionError::NoPartSelected)?;

        let material = parts
            .get(part_name)
            .and_then(|part| part.variants().get(index))
            .cloned()
            .ok_or_else(|| InvalidSelectionError::VariantOutOfRange {
                part: part_name.to_string(),
                index,
            })?;

        self.select_material(parts, scene, &material)
    }

    /// Re-establishes the invariants after the table was swapped.
    pub fn reconcile(&mut self, parts: &PartsTable) {
        let next = match &self.state {
            SelectionState::Idle => return,
            SelectionState::PartSelected { part } => match parts.get(part) {
                Some(_) => return,
                None => SelectionState::Idle,
            },
            SelectionState::MaterialApplied { part, material } => match parts.get(part) {
                Some(p) if p.contains(material) => return,
                Some(_) => SelectionState::PartSelected { part: part.clone() },
                None => SelectionState::Idle,
            },
        };

        log::debug!("[Selection] {:?} no longer valid, now {:?}", self.state, next);
        self.state = next;
    }

    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
    }
}
