//! Environmental circuits - terrain, fluids, and hazards.
//!
//! Terrain tracks stability, temperature, and moisture, and changes phase:
//! water freezes into walkable ice, damaged floors collapse and reveal what
//! they hid.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use world_rules::CircuitId;

use super::{BehaviorCircuit, CircuitState, CircuitType, SpecializedState};
use crate::affordance::AffordanceSet;
use crate::signal::{clamp01, InputSignal, OutputSignal, SignalKind};

/// Family state for terrain and hazards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalState {
    /// Terrain label: "stone", "water", "void", ...
    pub terrain: String,
    /// Whether the terrain is currently a fluid.
    pub fluid: bool,
    /// Structural stability in [0, 1]; zero means collapse.
    pub stability: f32,
    /// Temperature in degrees.
    pub temperature: f32,
    /// Surface moisture in [0, 1].
    pub moisture: f32,
    /// Emitting terrain vents a little of itself every tick.
    pub emitting: bool,
}

impl Default for EnvironmentalState {
    fn default() -> Self {
        Self {
            terrain: "stone".to_string(),
            fluid: false,
            stability: 1.0,
            temperature: 15.0,
            moisture: 0.0,
            emitting: false,
        }
    }
}

impl EnvironmentalState {
    pub fn new(terrain: impl Into<String>, fluid: bool) -> Self {
        Self {
            terrain: terrain.into(),
            fluid,
            moisture: if fluid { 1.0 } else { 0.0 },
            ..Default::default()
        }
    }

    pub(crate) fn respond(
        &mut self,
        core: &mut CircuitState,
        affordances: &mut AffordanceSet,
        input: &InputSignal,
    ) -> Vec<OutputSignal> {
        let strength = input.strength();
        let mut outputs = Vec::new();

        match input.kind() {
            SignalKind::Damage => {
                self.stability = clamp01(self.stability - 0.2 * strength);
                if self.stability <= 0.0 {
                    core.active = false;
                    outputs.push(OutputSignal::new(SignalKind::Collapse, 1.0).with_radius(3.0));
                    outputs.push(OutputSignal::sound("rumble", 0.9));
                    outputs.push(
                        OutputSignal::new(SignalKind::Trigger, 1.0)
                            .with_payload("trigger", Value::from("reveal_hidden"))
                            .non_propagating(),
                    );
                } else {
                    outputs.push(OutputSignal::sound("crack", 0.5 * strength));
                }
            }
            SignalKind::Push => {
                if self.stability < 0.5 {
                    outputs.push(OutputSignal::new(SignalKind::Move, strength).non_propagating());
                }
            }
            SignalKind::Heat => {
                self.temperature += 20.0 * strength;
                if self.fluid && self.temperature > 100.0 {
                    self.moisture = clamp01(self.moisture - 0.2 * strength);
                    outputs.push(OutputSignal::emission("steam", 0.5 * strength));
                }
            }
            SignalKind::Cold => {
                self.temperature -= 20.0 * strength;
                if self.fluid && self.temperature < 0.0 {
                    // Phase change: the surface freezes over.
                    self.fluid = false;
                    affordances.remove("swimmable");
                    affordances.add("walkable");
                    affordances.add("slippery");
                }
            }
            SignalKind::Wet => {
                self.moisture = clamp01(self.moisture + 0.3 * strength);
                if self.moisture > 0.7 {
                    affordances.add("slippery");
                }
            }
            SignalKind::Proximity => {
                if self.terrain == "void" && strength > 0.8 {
                    let mut fall = OutputSignal::new(SignalKind::Damage, 0.8)
                        .with_payload("cause", Value::from("fall"));
                    fall.target = input.signal.source.clone();
                    outputs.push(fall);
                }
            }
            _ => {}
        }
        outputs
    }

    pub(crate) fn tick(&mut self, dt: f64) -> Vec<OutputSignal> {
        if self.emitting && dt > 0.0 {
            vec![OutputSignal::emission("ambient", 0.2)]
        } else {
            Vec::new()
        }
    }
}

impl BehaviorCircuit {
    /// Build an environmental circuit: terrain, a fluid surface, a hazard.
    /// Fluid terrain starts out swimmable; solid terrain walkable.
    pub fn environmental(
        id: impl Into<CircuitId>,
        name: impl Into<String>,
        terrain: impl Into<String>,
        fluid: bool,
    ) -> Self {
        let mut circuit = Self::new(id, name, CircuitType::Environmental)
            .with_accepted([
                SignalKind::Damage,
                SignalKind::Push,
                SignalKind::Heat,
                SignalKind::Cold,
                SignalKind::Wet,
                SignalKind::Proximity,
            ])
            .with_emittable([
                SignalKind::Collapse,
                SignalKind::Sound,
                SignalKind::Emit,
                SignalKind::Damage,
                SignalKind::Trigger,
                SignalKind::Move,
            ])
            .with_special(SpecializedState::Environmental(EnvironmentalState::new(
                terrain, fluid,
            )));
        if fluid {
            circuit.affordances.add("swimmable");
        } else {
            circuit.affordances.add("walkable");
        }
        circuit
    }
}
