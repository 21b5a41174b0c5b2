use serde::{Deserialize, Serialize};
use crate::simulation::material::Material;

/// Coil turns slider: min, max, step
pub const TURNS_RANGE: (u32, u32, u32) = (20, 300, 10);
/// Current slider in amperes: min, max, step
pub const CURRENT_RANGE: (u32, u32, u32) = (0, 40, 1);

pub const DEFAULT_TURNS: u32 = 120;
pub const DEFAULT_CURRENT: u32 = 15;

/// Constants of the heating model. Defaults reproduce the lesson's calibrated values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatingParams {
    /// Temperature the object relaxes toward (°C)
    pub ambient: f64,
    /// Fraction of the excess over ambient lost each frame
    pub decay_rate: f64,
    /// Scale applied to power factor times efficiency
    pub gain_scale: f64,
    /// Ampere-turns that give a power factor of 1
    pub reference_ampere_turns: f64,
    pub max_temperature: f64,
    /// How long a freshly placed object suppresses eddy and steam visuals
    pub placing_delay_ms: f64,
}

impl Default for HeatingParams {
    fn default() -> Self {
        HeatingParams {
            ambient: 25.0,
            decay_rate: 0.01,
            gain_scale: 0.15,
            reference_ampere_turns: 1000.0,
            max_temperature: 350.0,
            placing_delay_ms: 500.0,
        }
    }
}

pub fn power_factor(turns: f64, current: f64, params: &HeatingParams) -> f64 {
    ((turns * current) / params.reference_ampere_turns).powi(2)
}

/// Heat added in one frame. Insulators short-circuit to zero for any N and I.
pub fn heat_gain(material: Material, turns: f64, current: f64, params: &HeatingParams) -> f64 {
    if !material.class().heats() {
        return 0.0;
    }
    power_factor(turns, current, params) * material.efficiency() * params.gain_scale
}

/// One frame of heating followed by first-order decay toward ambient, then the clamp.
pub fn next_temperature(temperature: f64, gain: f64, params: &HeatingParams) -> f64 {
    let mut next = temperature + gain;
    next -= (next - params.ambient) * params.decay_rate;
    next.min(params.max_temperature)
}

/// Clamp into [min, max] and snap to the nearest step above min
pub fn snap_to_range(value: u32, (min, max, step): (u32, u32, u32)) -> u32 {
    let clamped = value.clamp(min, max);
    if step <= 1 {
        return clamped;
    }
    let offset = clamped - min;
    let snapped = min + ((offset + step / 2) / step) * step;
    snapped.min(max)
}

/// Immutable view of the model at one instant, used for rendering and readouts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    pub material: Material,
    pub turns: u32,
    pub current: u32,
    pub temperature: f64,
    pub placing: bool,
}

/// Simulation state owned by one mounted simulation view.
/// Time is animation time in milliseconds since the view was mounted.
#[derive(Debug, Clone)]
pub struct InductionModel {
    params: HeatingParams,
    material: Material,
    turns: u32,
    current: u32,
    temperature: f64,
    placing_until_ms: f64,
}

impl InductionModel {
    /// Fresh model at ambient. The initial object counts as just placed.
    pub fn new(params: HeatingParams) -> Self {
        InductionModel {
            params,
            material: Material::default(),
            turns: DEFAULT_TURNS,
            current: DEFAULT_CURRENT,
            temperature: params.ambient,
            placing_until_ms: params.placing_delay_ms,
        }
    }

    pub fn params(&self) -> &HeatingParams {
        &self.params
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Swap the test object. Returns false when the material did not change.
    pub fn set_material(&mut self, material: Material, now_ms: f64) -> bool {
        if material == self.material {
            return false;
        }
        self.material = material;
        self.placing_until_ms = now_ms + self.params.placing_delay_ms;
        tracing::debug!(material = %material, now_ms = now_ms, "Test object placed");
        true
    }

    pub fn set_turns(&mut self, turns: u32) {
        self.turns = snap_to_range(turns, TURNS_RANGE);
    }

    pub fn set_current(&mut self, current: u32) {
        self.current = snap_to_range(current, CURRENT_RANGE);
    }

    pub fn is_placing(&self, now_ms: f64) -> bool {
        now_ms < self.placing_until_ms
    }

    pub fn heat_gain(&self) -> f64 {
        heat_gain(self.material, self.turns as f64, self.current as f64, &self.params)
    }

    /// Advance one rendered frame and return the new temperature
    pub fn step(&mut self) -> f64 {
        self.temperature = next_temperature(self.temperature, self.heat_gain(), &self.params);
        self.temperature
    }

    pub fn snapshot(&self, now_ms: f64) -> ModelSnapshot {
        ModelSnapshot {
            material: self.material,
            turns: self.turns,
            current: self.current,
            temperature: self.temperature,
            placing: self.is_placing(now_ms),
        }
    }
}

impl Default for InductionModel {
    fn default() -> Self {
        Self::new(HeatingParams::default())
    }
}
