use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::ValidationError;

/// How strongly a test object responds to the alternating field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialClass {
    FerromagneticHigh,
    FerromagneticLow,
    Insulator,
}

impl MaterialClass {
    pub fn efficiency(&self) -> f64 {
        match self {
            MaterialClass::FerromagneticHigh => 1.0,
            MaterialClass::FerromagneticLow => 0.45,
            MaterialClass::Insulator => 0.0,
        }
    }

    /// Insulators never enter the heat-gain branch
    pub fn heats(&self) -> bool {
        !matches!(self, MaterialClass::Insulator)
    }
}

/// Test objects that can be placed on the virtual cooktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Iron,
    Stainless,
    Glass,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Iron, Material::Stainless, Material::Glass];

    pub fn id(&self) -> &'static str {
        match self {
            Material::Iron => "iron",
            Material::Stainless => "stainless",
            Material::Glass => "glass",
        }
    }

    pub fn class(&self) -> MaterialClass {
        match self {
            Material::Iron => MaterialClass::FerromagneticHigh,
            Material::Stainless => MaterialClass::FerromagneticLow,
            Material::Glass => MaterialClass::Insulator,
        }
    }

    pub fn efficiency(&self) -> f64 {
        self.class().efficiency()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Material::Iron => "Cast Iron Pan (เหล็กหล่อ)",
            Material::Stainless => "Stainless Plate (สแตนเลส)",
            Material::Glass => "Glass / Egg (แก้ว/ไข่)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Material::Iron => "CONDUCTIVE & MAGNETIC",
            Material::Stainless => "LOW MAGNETIC RESPONSE",
            Material::Glass => "NON-MAGNETIC INSULATOR",
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Iron
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Material {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownMaterial(s.to_string()))
    }
}
