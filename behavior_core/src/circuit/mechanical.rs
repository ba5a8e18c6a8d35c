//! Mechanical circuits - doors, levers, crates, and machinery.
//!
//! Mechanisms accumulate wear, jam when badly worn, and may require power.

use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

use world_rules::CircuitId;

use super::{BehaviorCircuit, CircuitState, CircuitType, SpecializedState};
use crate::signal::{clamp01, InputSignal, OutputSignal, SignalKind};

/// What a mechanism is made of. Material gates conductivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Metal,
    Wood,
    Stone,
    Glass,
    Rope,
}

/// Family state for mechanisms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicalState {
    pub material: Material,
    /// Lubrication in [0, 1]; well-oiled mechanisms wear slower.
    pub lubrication: f32,
    /// Accumulated wear in [0, 1]; worn mechanisms fail and jam.
    pub wear: f32,
    /// Whether this mechanism needs power to respond at all.
    pub powered: bool,
    /// A jammed mechanism only responds to very hard stimulation.
    pub jammed: bool,
}

impl Default for MechanicalState {
    fn default() -> Self {
        Self {
            material: Material::default(),
            lubrication: 1.0,
            wear: 0.0,
            powered: false,
            jammed: false,
        }
    }
}

impl MechanicalState {
    pub fn new(material: Material) -> Self {
        Self {
            material,
            ..Default::default()
        }
    }

    /// Chance that a press operates the mechanism cleanly.
    pub fn press_success_chance(&self) -> f32 {
        1.0 - 0.5 * self.wear
    }

    pub(crate) fn respond(
        &mut self,
        core: &mut CircuitState,
        input: &InputSignal,
        rng: &mut SmallRng,
    ) -> Vec<OutputSignal> {
        let strength = input.strength();
        let mut outputs = Vec::new();

        // Jam gate: nothing else happens while jammed.
        if self.jammed {
            if strength > 0.9 {
                self.jammed = false;
                outputs.push(OutputSignal::sound("unjam", 0.6));
            } else {
                outputs.push(OutputSignal::sound("stuck", 0.2 * strength));
            }
            return outputs;
        }

        if self.powered && core.power <= 0.0 {
            return outputs;
        }

        match input.kind() {
            SignalKind::Press => {
                if rng.random::<f32>() < self.press_success_chance() {
                    outputs.push(
                        OutputSignal::new(SignalKind::Activate, strength).non_propagating(),
                    );
                    outputs.push(OutputSignal::sound("click", 0.3));
                } else {
                    self.wear = clamp01(self.wear + 0.05);
                    if self.wear >= 0.8 {
                        self.jammed = true;
                    }
                    outputs.push(OutputSignal::sound("grind", 0.4));
                }
            }
            SignalKind::Kick => {
                self.wear = clamp01(self.wear + 0.1 * strength * (1.0 - 0.5 * self.lubrication));
                let destroyed = core.apply_damage(0.2 * strength);
                outputs.push(OutputSignal::sound("clang", 0.6 * strength));
                if destroyed {
                    outputs.push(OutputSignal::new(SignalKind::Collapse, strength).with_radius(2.0));
                } else if strength > 0.6 {
                    outputs.push(
                        OutputSignal::new(SignalKind::Activate, strength).non_propagating(),
                    );
                }
            }
            SignalKind::Push | SignalKind::Pull => {
                if strength > 0.5 {
                    outputs.push(OutputSignal::new(SignalKind::Move, strength).non_propagating());
                    outputs.push(OutputSignal::sound("scrape", 0.4 * strength));
                }
            }
            SignalKind::Electric => {
                if self.material == Material::Metal {
                    if self.powered {
                        core.power = clamp01(core.power + 0.5 * strength);
                    }
                    outputs.push(OutputSignal::emission("spark", 0.5 * strength));
                }
            }
            SignalKind::Damage => {
                if core.apply_damage(strength) {
                    outputs.push(OutputSignal::new(SignalKind::Collapse, strength).with_radius(2.0));
                    outputs.push(OutputSignal::sound("shatter", 0.8));
                } else {
                    outputs.push(OutputSignal::sound("crunch", 0.4 * strength));
                }
            }
            _ => {}
        }
        outputs
    }
}

impl BehaviorCircuit {
    /// Build a mechanical circuit: a door, lever, crate, or mechanism.
    pub fn mechanical(
        id: impl Into<CircuitId>,
        name: impl Into<String>,
        material: Material,
    ) -> Self {
        Self::new(id, name, CircuitType::Mechanical)
            .with_accepted([
                SignalKind::Press,
                SignalKind::Kick,
                SignalKind::Push,
                SignalKind::Pull,
                SignalKind::Damage,
                SignalKind::Electric,
            ])
            .with_emittable([
                SignalKind::Activate,
                SignalKind::Deactivate,
                SignalKind::Sound,
                SignalKind::Move,
                SignalKind::Collapse,
                SignalKind::Emit,
            ])
            .with_special(SpecializedState::Mechanical(MechanicalState::new(material)))
    }
}
