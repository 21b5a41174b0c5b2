use serde::{Deserialize, Serialize};
use crate::simulation::model::ModelSnapshot;

pub const CANVAS_WIDTH: f64 = 600.0;
pub const CANVAS_HEIGHT: f64 = 400.0;
pub const COIL_Y: f64 = 320.0;
pub const PAN_WIDTH: f64 = 180.0;
pub const PAN_HEIGHT: f64 = 90.0;
pub const COOKTOP_Y: f64 = 280.0;
pub const PLACING_DROP: f64 = 30.0;

const GLOW_THRESHOLD: f64 = 40.0;
const STEAM_THRESHOLD: f64 = 95.0;
const HOT_READOUT_THRESHOLD: f64 = 100.0;
const EDDY_MIN_CURRENT: u32 = 5;

/// Everything the canvas needs to draw one frame. Pure data, no drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualFrame {
    pub flux: Option<FluxLines>,
    pub coil: CoilRings,
    pub pan: PanPlacement,
    pub glow_alpha: Option<f64>,
    pub eddy_rings: Vec<EddyRing>,
    pub steam: Vec<SteamParticle>,
    pub readout: ThermalReadout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluxLines {
    pub strength: f64,
    pub alpha: f64,
    pub dash_offset: f64,
    /// Horizontal offsets of each field line from the canvas centre
    pub x_offsets: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoilRings {
    pub count: u32,
    pub line_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanPlacement {
    pub base_x: f64,
    pub base_y: f64,
    pub drop_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EddyRing {
    pub size: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamParticle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalReadout {
    pub celsius: f64,
    pub display: String,
    pub hot: bool,
}

/// Derive the visual parameters of a frame from the model snapshot and animation time.
pub fn derive_frame(snapshot: &ModelSnapshot, time_ms: f64) -> VisualFrame {
    let heats = snapshot.material.class().heats();
    let temperature = snapshot.temperature;

    let flux = (snapshot.current > 0).then(|| {
        let strength = (snapshot.turns as f64 * snapshot.current as f64) / 3000.0;
        FluxLines {
            strength,
            alpha: (0.1 + strength).min(1.0),
            dash_offset: -(time_ms / 20.0),
            x_offsets: (-6..=6).map(|i| i as f64 * 35.0).collect(),
        }
    });

    let coil = CoilRings {
        count: snapshot.turns / 15,
        line_width: 2.0 + snapshot.current as f64 / 8.0,
    };

    let drop_offset = if snapshot.placing { PLACING_DROP } else { 0.0 };
    let pan = PanPlacement {
        base_x: CANVAS_WIDTH / 2.0 - PAN_WIDTH / 2.0,
        base_y: COOKTOP_Y - drop_offset,
        drop_offset,
    };

    let glow_alpha = (heats && temperature > GLOW_THRESHOLD)
        .then(|| ((temperature - GLOW_THRESHOLD) / 200.0).min(0.7));

    let eddy_rings = if heats && snapshot.current > EDDY_MIN_CURRENT && !snapshot.placing {
        (0..3)
            .map(|e| EddyRing {
                size: 20.0 + e as f64 * 15.0,
                rotation: (time_ms / 500.0) * if e % 2 == 0 { 1.0 } else { -1.0 },
            })
            .collect()
    } else {
        Vec::new()
    };

    let steam = if temperature > STEAM_THRESHOLD && !snapshot.placing {
        (0..4)
            .map(|s| {
                let s = s as f64;
                SteamParticle {
                    x: CANVAS_WIDTH / 2.0 - 50.0 + s * 30.0 + (time_ms / 400.0 + s).sin() * 15.0,
                    y: pan.base_y - PAN_HEIGHT - 10.0 - ((time_ms / 15.0 + s * 20.0) % 60.0),
                    radius: 8.0 + (time_ms / 300.0).sin() * 4.0,
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    VisualFrame {
        flux,
        coil,
        pan,
        glow_alpha,
        eddy_rings,
        steam,
        readout: ThermalReadout {
            celsius: temperature,
            display: format!("{:.1}°C", temperature),
            hot: temperature > HOT_READOUT_THRESHOLD,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::material::Material;

    fn snapshot(material: Material, temperature: f64, placing: bool) -> ModelSnapshot {
        ModelSnapshot { material, turns: 120, current: 15, temperature, placing }
    }

    #[test]
    fn cold_iron_has_flux_and_eddies_but_no_glow() {
        let frame = derive_frame(&snapshot(Material::Iron, 25.0, false), 1000.0);
        let flux = frame.flux.expect("flux lines with current flowing");
        assert!((flux.strength - 0.6).abs() < 1e-12);
        assert!((flux.alpha - 0.7).abs() < 1e-12);
        assert_eq!(flux.x_offsets.len(), 13);
        assert_eq!(frame.coil.count, 8);
        assert_eq!(frame.eddy_rings.len(), 3);
        assert_eq!(frame.eddy_rings[1].rotation, -2.0);
        assert!(frame.glow_alpha.is_none());
        assert!(frame.steam.is_empty());
        assert_eq!(frame.readout.display, "25.0°C");
    }

    #[test]
    fn glow_ramps_and_caps() {
        let warm = derive_frame(&snapshot(Material::Iron, 140.0, false), 0.0);
        assert!((warm.glow_alpha.unwrap() - 0.5).abs() < 1e-12);
        let hot = derive_frame(&snapshot(Material::Iron, 340.0, false), 0.0);
        assert_eq!(hot.glow_alpha, Some(0.7));
        assert!(hot.readout.hot);
        assert_eq!(hot.steam.len(), 4);
    }

    #[test]
    fn placing_suppresses_eddies_and_steam() {
        let frame = derive_frame(&snapshot(Material::Iron, 200.0, true), 0.0);
        assert!(frame.eddy_rings.is_empty());
        assert!(frame.steam.is_empty());
        assert_eq!(frame.pan.base_y, COOKTOP_Y - PLACING_DROP);
        // Thermal glow is not debounced
        assert!(frame.glow_alpha.is_some());
    }

    #[test]
    fn glass_shows_field_but_no_eddies_or_glow() {
        let frame = derive_frame(&snapshot(Material::Glass, 60.0, false), 0.0);
        assert!(frame.flux.is_some());
        assert!(frame.eddy_rings.is_empty());
        assert!(frame.glow_alpha.is_none());
    }

    #[test]
    fn no_current_no_flux() {
        let mut snap = snapshot(Material::Iron, 25.0, false);
        snap.current = 0;
        let frame = derive_frame(&snap, 0.0);
        assert!(frame.flux.is_none());
        assert!(frame.eddy_rings.is_empty());
        assert_eq!(frame.coil.line_width, 2.0);
    }

    #[test]
    fn glow_starts_just_above_forty_degrees() {
        assert!(derive_frame(&snapshot(Material::Iron, 40.0, false), 0.0).glow_alpha.is_none());
        let glow = derive_frame(&snapshot(Material::Iron, 40.0 + 1e-6, false), 0.0).glow_alpha;
        assert!(glow.unwrap() > 0.0);
    }

    #[test]
    fn steam_starts_just_above_ninety_five_degrees() {
        assert!(derive_frame(&snapshot(Material::Iron, 95.0, false), 0.0).steam.is_empty());
        assert_eq!(derive_frame(&snapshot(Material::Iron, 95.0 + 1e-6, false), 0.0).steam.len(), 4);
    }

    #[test]
    fn readout_turns_hot_just_above_one_hundred() {
        assert!(!derive_frame(&snapshot(Material::Iron, 100.0, false), 0.0).readout.hot);
        assert!(derive_frame(&snapshot(Material::Iron, 100.0 + 1e-6, false), 0.0).readout.hot);
    }

    #[test]
    fn eddies_need_more_than_five_amps() {
        let mut snap = snapshot(Material::Iron, 25.0, false);
        snap.current = 5;
        assert!(derive_frame(&snap, 0.0).eddy_rings.is_empty());
        snap.current = 6;
        assert_eq!(derive_frame(&snap, 0.0).eddy_rings.len(), 3);
    }
}
