//! Output signals - consequences a circuit asserts into the world.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use world_rules::CircuitId;

use super::{InputSignal, Signal, SignalKind};
use crate::error::CodecError;

/// A consequence produced by a circuit: a signal plus how far it reaches,
/// whether it feeds back into propagation, and an optional directed target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSignal {
    pub signal: Signal,
    /// Propagation reach in scene units.
    pub radius: f32,
    /// Whether this output is converted back into a stimulus during
    /// chain-reaction propagation.
    pub propagates: bool,
    /// A specific circuit this output is aimed at, if any.
    pub target: Option<CircuitId>,
}

impl OutputSignal {
    /// Create a new propagating output with unit reach.
    pub fn new(kind: SignalKind, strength: f32) -> Self {
        Self {
            signal: Signal::new(kind, strength),
            radius: 1.0,
            propagates: true,
            target: None,
        }
    }

    /// A sound consequence labeled for narration (payload key `sound`).
    pub fn sound(label: &str, strength: f32) -> Self {
        let mut output = Self::new(SignalKind::Sound, strength);
        output.radius = 3.0;
        output
            .signal
            .payload
            .insert("sound".to_string(), Value::from(label));
        output
    }

    /// An emission consequence (payload key `type`): steam, sparks, vapor.
    /// Emissions are cosmetic and do not propagate.
    pub fn emission(kind_label: &str, strength: f32) -> Self {
        let mut output = Self::new(SignalKind::Emit, strength);
        output.propagates = false;
        output
            .signal
            .payload
            .insert("type".to_string(), Value::from(kind_label));
        output
    }

    /// Set the propagation reach.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    /// Aim this output at a specific circuit.
    pub fn with_target(mut self, target: impl Into<CircuitId>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Add a payload entry.
    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.signal.payload.insert(key.into(), value);
        self
    }

    /// Exclude this output from chain-reaction propagation.
    pub fn non_propagating(mut self) -> Self {
        self.propagates = false;
        self
    }

    pub fn kind(&self) -> SignalKind {
        self.signal.kind
    }

    pub fn strength(&self) -> f32 {
        self.signal.strength
    }

    pub fn timestamp(&self) -> f64 {
        self.signal.timestamp
    }

    /// Convert into a stimulus for the next propagation hop, decaying
    /// strength by `decay`. The source is preserved so broadcast can
    /// exclude the emitter.
    pub fn to_input(&self, decay: f32) -> InputSignal {
        InputSignal {
            signal: self.signal.attenuate(decay),
            direction: None,
            distance: 0.0,
        }
    }

    /// Serialize to a plain key-value structure.
    pub fn to_value(&self) -> Result<Value, CodecError> {
        serde_json::to_value(self).map_err(|e| CodecError::Encode("output signal", e))
    }

    /// Deserialize from a plain key-value structure.
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        serde_json::from_value(value).map_err(|e| CodecError::Decode("output signal", e))
    }
}
