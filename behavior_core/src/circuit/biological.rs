//! Biological circuits - creatures and NPC bodies.
//!
//! Reactions are driven by a small set of drives: fear, hunger, curiosity,
//! aggression, loyalty. Stimuli shift the drives first, then the drives
//! pick the reaction.

use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use world_rules::CircuitId;

use super::{BehaviorCircuit, CircuitState, CircuitType, SpecializedState};
use crate::signal::{clamp01, InputSignal, OutputSignal, SignalKind};

/// Family state for creatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiologicalState {
    pub species: String,
    pub fear: f32,
    pub hunger: f32,
    pub curiosity: f32,
    pub aggression: f32,
    pub loyalty: f32,
    /// An alert creature has noticed something; alertness fades on its own.
    pub alert: bool,
}

impl Default for BiologicalState {
    fn default() -> Self {
        Self {
            species: "creature".to_string(),
            fear: 0.1,
            hunger: 0.3,
            curiosity: 0.5,
            aggression: 0.3,
            loyalty: 0.5,
            alert: false,
        }
    }
}

impl BiologicalState {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            ..Default::default()
        }
    }

    fn update_drives(&mut self, input: &InputSignal) {
        let strength = input.strength();
        match input.kind() {
            SignalKind::Damage | SignalKind::Kick | SignalKind::Shout => {
                self.fear = clamp01(self.fear + 0.3 * strength);
                self.aggression = clamp01(self.aggression + 0.2 * strength);
                self.alert = true;
            }
            SignalKind::Proximity if strength > 0.5 => {
                self.alert = true;
            }
            SignalKind::Say => {
                self.fear = clamp01(self.fear - 0.1 * strength);
                self.curiosity = clamp01(self.curiosity + 0.15 * strength);
            }
            SignalKind::Look => {
                self.curiosity = clamp01(self.curiosity + 0.05 * strength);
            }
            _ => {}
        }
    }

    pub(crate) fn respond(
        &mut self,
        core: &mut CircuitState,
        input: &InputSignal,
    ) -> Vec<OutputSignal> {
        let strength = input.strength();
        let source = input.signal.source.clone();
        self.update_drives(input);

        let mut outputs = Vec::new();
        match input.kind() {
            SignalKind::Proximity => {
                if self.fear > 0.7 {
                    outputs.push(flee(strength));
                } else if self.aggression > 0.6 && self.fear < 0.4 {
                    outputs.push(attack(strength, source));
                } else if self.curiosity > 0.5 {
                    outputs.push(approach(strength, source));
                }
            }
            SignalKind::Sound if strength > 0.5 => {
                self.alert = true;
                outputs.push(OutputSignal::new(SignalKind::Alert, strength).non_propagating());
                if self.curiosity > self.fear {
                    outputs.push(approach(0.5 * strength, source));
                }
            }
            SignalKind::Damage | SignalKind::Kick => {
                let amount = if input.kind() == SignalKind::Kick {
                    0.2 * strength
                } else {
                    0.4 * strength
                };
                if core.apply_damage(amount) {
                    outputs.push(OutputSignal::new(SignalKind::Collapse, strength));
                } else {
                    outputs.push(OutputSignal::sound("pained cry", 0.7 * strength));
                    if self.aggression > self.fear {
                        outputs.push(attack(strength, source));
                    } else {
                        outputs.push(flee(strength));
                    }
                }
            }
            SignalKind::Say => {
                if self.loyalty > 0.5 {
                    outputs.push(speak("friendly", strength));
                } else if self.fear > 0.5 {
                    outputs.push(speak("nervous", strength));
                }
            }
            _ => {}
        }
        outputs
    }

    /// Per-tick drift: fear calms, hunger grows, alertness fades.
    pub(crate) fn tick(&mut self, dt: f64, rng: &mut SmallRng) -> Vec<OutputSignal> {
        let dt = dt.max(0.0) as f32;
        self.fear = clamp01(self.fear - 0.05 * dt);
        self.hunger = clamp01(self.hunger + 0.005 * dt);
        if self.alert && rng.random::<f32>() < (0.1 * dt).min(1.0) {
            self.alert = false;
        }
        Vec::new()
    }
}

fn flee(strength: f32) -> OutputSignal {
    OutputSignal::new(SignalKind::Flee, strength)
        .with_payload("manner", Value::from("panicked"))
        .non_propagating()
}

fn attack(strength: f32, target: Option<CircuitId>) -> OutputSignal {
    let mut output = OutputSignal::new(SignalKind::Attack, strength).non_propagating();
    output.target = target;
    output
}

fn approach(strength: f32, toward: Option<CircuitId>) -> OutputSignal {
    let mut output = OutputSignal::new(SignalKind::Move, strength)
        .with_payload("manner", Value::from("approach"))
        .non_propagating();
    output.target = toward;
    output
}

fn speak(response: &str, strength: f32) -> OutputSignal {
    OutputSignal::new(SignalKind::Speak, strength)
        .with_payload("response", Value::from(response))
        .non_propagating()
}

impl BehaviorCircuit {
    /// Build a biological circuit: a creature or an NPC's bodily reactions.
    pub fn biological(
        id: impl Into<CircuitId>,
        name: impl Into<String>,
        species: impl Into<String>,
    ) -> Self {
        Self::new(id, name, CircuitType::Biological)
            .with_accepted([
                SignalKind::Proximity,
                SignalKind::Sound,
                SignalKind::Say,
                SignalKind::Shout,
                SignalKind::Damage,
                SignalKind::Kick,
                SignalKind::Look,
            ])
            .with_emittable([
                SignalKind::Move,
                SignalKind::Flee,
                SignalKind::Attack,
                SignalKind::Speak,
                SignalKind::Sound,
                SignalKind::Alert,
                SignalKind::Collapse,
            ])
            .with_special(SpecializedState::Biological(BiologicalState::new(species)))
    }
}
