//! Scenario loading - declarative circuit and hotspot definitions.
//!
//! Scenes are authored as TOML documents: each `[[circuits]]` block becomes
//! a registered circuit, optionally paired with a hotspot installed into the
//! world state. Circuits come into existence here, at scenario/location
//! generation time, and leave it when the host unregisters them.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use world_rules::{CircuitId, FactId, Hotspot, WorldState};

use crate::circuit::{BehaviorCircuit, CircuitType, Material};
use crate::processor::CircuitProcessor;

/// Errors raised while loading or instantiating a scenario document.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate circuit id: {0}")]
    DuplicateCircuit(String),

    #[error("invalid fact id {0:?} on circuit {1}")]
    BadFactId(String, String),
}

/// A parsed scenario document.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioDoc {
    pub scenario: ScenarioMeta,
    #[serde(default)]
    pub circuits: Vec<CircuitDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioMeta {
    pub name: String,
    /// Seed for the processor driving this scenario, when the author wants
    /// a fixed one.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// One declared circuit.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitDef {
    pub id: String,
    pub name: String,
    pub kind: CircuitType,
    /// Mechanical circuits only.
    #[serde(default)]
    pub material: Option<Material>,
    /// Biological circuits only.
    #[serde(default)]
    pub species: Option<String>,
    /// Environmental circuits only.
    #[serde(default)]
    pub terrain: Option<String>,
    #[serde(default)]
    pub fluid: bool,
    #[serde(default)]
    pub affordances: Vec<String>,
    #[serde(default)]
    pub max_history: Option<usize>,
    #[serde(default)]
    pub hotspot: Option<HotspotDef>,
}

/// A hotspot paired with a declared circuit.
#[derive(Debug, Clone, Deserialize)]
pub struct HotspotDef {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    /// UUID of a fact uncovered on destruction or trigger.
    #[serde(default)]
    pub target_fact: Option<String>,
}

impl CircuitDef {
    fn build(&self) -> BehaviorCircuit {
        let mut circuit = match self.kind {
            CircuitType::Mechanical => BehaviorCircuit::mechanical(
                self.id.as_str(),
                self.name.clone(),
                self.material.unwrap_or_default(),
            ),
            CircuitType::Biological => BehaviorCircuit::biological(
                self.id.as_str(),
                self.name.clone(),
                self.species.clone().unwrap_or_else(|| "creature".to_string()),
            ),
            CircuitType::Environmental => BehaviorCircuit::environmental(
                self.id.as_str(),
                self.name.clone(),
                self.terrain.clone().unwrap_or_else(|| "stone".to_string()),
                self.fluid,
            ),
        };
        for tag in &self.affordances {
            circuit.affordances.add(tag.clone());
        }
        if let Some(max_history) = self.max_history {
            circuit = circuit.with_max_history(max_history);
        }
        circuit
    }
}

/// Parse a scenario document from TOML source.
pub fn load_scenario(source: &str) -> Result<ScenarioDoc, ScenarioError> {
    Ok(toml::from_str(source)?)
}

impl ScenarioDoc {
    /// Register every declared circuit and install every declared hotspot.
    pub fn instantiate(
        &self,
        processor: &mut CircuitProcessor,
        world: &mut WorldState,
    ) -> Result<(), ScenarioError> {
        for def in &self.circuits {
            let id = CircuitId::from(def.id.as_str());
            if processor.contains(&id) {
                return Err(ScenarioError::DuplicateCircuit(def.id.clone()));
            }

            let hotspot = match &def.hotspot {
                Some(spec) => {
                    let mut hotspot = Hotspot::new(spec.name.clone()).with_circuit(id.clone());
                    if spec.hidden {
                        hotspot = hotspot.hidden();
                    }
                    if let Some(raw) = &spec.target_fact {
                        let uuid = Uuid::parse_str(raw).map_err(|_| {
                            ScenarioError::BadFactId(raw.clone(), def.id.clone())
                        })?;
                        hotspot = hotspot.with_target_fact(FactId::from_uuid(uuid));
                    }
                    Some(hotspot)
                }
                None => None,
            };

            processor.register(def.build());
            if let Some(hotspot) = hotspot {
                world.add_hotspot(id, hotspot);
            }
        }
        Ok(())
    }
}
