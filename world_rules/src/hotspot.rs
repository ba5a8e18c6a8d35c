//! Hotspots - the interactive points of a scene.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ids::{CircuitId, FactId};

/// An interactive point in a scene: a door, a crate, a crack in the wall.
///
/// A hotspot is the presentation-side handle for an interactive entity. The
/// behavioral side lives in the circuit named by `circuit`; a hotspot with no
/// circuit is inert scenery that can still be looked at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub name: String,
    /// Whether the hotspot still accepts interaction.
    pub active: bool,
    /// Hidden hotspots are invisible until revealed.
    pub hidden: bool,
    /// The behavior circuit driving this hotspot, if any.
    pub circuit: Option<CircuitId>,
    /// A fact uncovered when this hotspot is destroyed or triggered.
    pub target_fact: Option<FactId>,
    /// Host-side annotations (render hints, examine text overrides).
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Hotspot {
    /// Create a new visible, active hotspot.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            hidden: false,
            circuit: None,
            target_fact: None,
            extra: HashMap::new(),
        }
    }

    /// Attach a behavior circuit.
    pub fn with_circuit(mut self, circuit: CircuitId) -> Self {
        self.circuit = Some(circuit);
        self
    }

    /// Attach a fact revealed on destruction or trigger.
    pub fn with_target_fact(mut self, fact: FactId) -> Self {
        self.target_fact = Some(fact);
        self
    }

    /// Start the hotspot hidden.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Stop accepting interaction.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Make a hidden hotspot visible.
    pub fn reveal(&mut self) {
        self.hidden = false;
    }

    /// Whether the hotspot is currently interactable.
    pub fn is_interactable(&self) -> bool {
        self.active && !self.hidden
    }
}
