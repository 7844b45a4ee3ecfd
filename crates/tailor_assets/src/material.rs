use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde::Deserialize;
use tailor_core::{Color, Handle};

use crate::error::MaterialCreationError;

/// Catalog entry as it appears in the material document.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MaterialDescriptor {
    pub id: String,
    #[serde(flatten)]
    pub fields: MaterialFields,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MaterialFields {
    pub color: String,
    #[serde(default = "default_roughness")]
    pub roughness: f32,
    #[serde(default)]
    pub metalness: Option<f32>,
    #[serde(default)]
    pub emissive: Option<String>,
}

fn default_roughness() -> f32 {
    1.0
}

impl MaterialFields {
    pub fn with_color(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            roughness: default_roughness(),
            metalness: None,
            emissive: None,
        }
    }
}

impl MaterialDescriptor {
    pub fn new(id: impl Into<String>, fields: MaterialFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSettings {
    /// sRGB
    pub base_color: Color,
    pub roughness: f32,
    pub metallic: f32,
    pub emissive: Color,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
            roughness: 1.0,
            metallic: 0.0,
            emissive: Color::BLACK,
        }
    }
}

/// Where a material came from. Purely informational, identity is the handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterialOrigin {
    /// Assigned in the model file. `None` is the implicit default material.
    Scene { index: Option<usize> },
    Catalog { id: String },
    InlineColor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub settings: MaterialSettings,
    pub origin: MaterialOrigin,
}

/// A renderable material. Cloning keeps identity; two instances built from
/// the same data are still different materials.
#[derive(Clone)]
pub struct MaterialInstance {
    handle: Handle<MaterialData>,
    data: Arc<MaterialData>,
}

impl MaterialInstance {
    pub fn new(data: MaterialData) -> Self {
        Self {
            handle: Handle::new(),
            data: Arc::new(data),
        }
    }

    pub fn handle(&self) -> Handle<MaterialData> {
        self.handle
    }

    pub fn data(&self) -> &MaterialData {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn settings(&self) -> &MaterialSettings {
        &self.data.settings
    }

    pub fn origin(&self) -> &MaterialOrigin {
        &self.data.origin
    }

    /// Displayable swatch, `#rrggbb` in sRGB.
    pub fn swatch(&self) -> String {
        self.data.settings.base_color.to_hex()
    }
}

impl PartialEq for MaterialInstance {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for MaterialInstance {}

impl Hash for MaterialInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Debug for MaterialInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialInstance")
            .field("handle", &self.handle.id)
            .field("name", &self.data.name)
            .field("swatch", &self.swatch())
            .finish()
    }
}

/// Turns descriptors and raw colors into material instances.
/// Stateless: every call hands out a new handle.
pub struct MaterialFactory;

impl MaterialFactory {
    pub fn from_descriptor(
        descriptor: &MaterialDescriptor,
    ) -> Result<MaterialInstance, MaterialCreationError> {
        let fields = &descriptor.fields;

        let base_color = parse_color("color", &fields.color)?;
        let emissive = match fields.emissive.as_deref() {
            Some(value) => parse_color("emissive", value)?,
            None => Color::BLACK,
        };
        let roughness = unit_factor("roughness", fields.roughness)?;
        let metallic = unit_factor("metalness", fields.metalness.unwrap_or(0.0))?;

        Ok(MaterialInstance::new(MaterialData {
            name: descriptor.id.clone(),
            settings: MaterialSettings {
                base_color,
                roughness,
                metallic,
                emissive,
            },
            origin: MaterialOrigin::Catalog {
                id: descriptor.id.clone(),
            },
        }))
    }

    pub fn from_color(color: &str) -> Result<MaterialInstance, MaterialCreationError> {
        let base_color = parse_color("color", color)?;

        Ok(MaterialInstance::new(MaterialData {
            name: color.trim().to_string(),
            settings: MaterialSettings {
                base_color,
                ..Default::default()
            },
            origin: MaterialOrigin::InlineColor,
        }))
    }

    pub fn from_settings(
        name: impl Into<String>,
        settings: MaterialSettings,
        origin: MaterialOrigin,
    ) -> MaterialInstance {
        MaterialInstance::new(MaterialData {
            name: name.into(),
            settings,
            origin,
        })
    }
}

fn parse_color(field: &'static str, value: &str) -> Result<Color, MaterialCreationError> {
    Color::parse(value).map_err(|source| MaterialCreationError::InvalidColor {
        field,
        value: value.to_string(),
        source,
    })
}

// Out-of-range factors are clamped, only NaN/inf are rejected
fn unit_factor(field: &'static str, value: f32) -> Result<f32, MaterialCreationError> {
    if value.is_finite() {
        Ok(value.clamp(0.0, 1.0))
    } else {
        Err(MaterialCreationError::InvalidFactor { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leather() -> MaterialDescriptor {
        MaterialDescriptor::new(
            "leatherBlack",
            MaterialFields {
                color: "#111111".into(),
                roughness: 0.4,
                metalness: None,
                emissive: None,
            },
        )
    }

    #[test]
    fn descriptor_becomes_catalog_material() {
        let m = MaterialFactory::from_descriptor(&leather()).unwrap();
        assert_eq!(m.swatch(), "#111111");
        assert_eq!(m.settings().roughness, 0.4);
        assert_eq!(m.settings().metallic, 0.0);
        assert_eq!(
            m.origin(),
            &MaterialOrigin::Catalog {
                id: "leatherBlack".into()
            }
        );
    }

    #[test]
    fn equal_data_is_not_equal_identity() {
        let a = MaterialFactory::from_color("red").unwrap();
        let b = MaterialFactory::from_color("red").unwrap();
        assert_eq!(a.data(), b.data());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn bad_colors_and_factors_fail() {
        assert!(matches!(
            MaterialFactory::from_color("not-a-color"),
            Err(MaterialCreationError::InvalidColor { field: "color", .. })
        ));

        let mut d = leather();
        d.fields.emissive = Some("#zz0000".into());
        assert!(matches!(
            MaterialFactory::from_descriptor(&d),
            Err(MaterialCreationError::InvalidColor { field: "emissive", .. })
        ));

        let mut d = leather();
        d.fields.roughness = f32::NAN;
        assert!(matches!(
            MaterialFactory::from_descriptor(&d),
            Err(MaterialCreationError::InvalidFactor { field: "roughness", .. })
        ));
    }
}
