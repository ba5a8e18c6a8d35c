//! Signal model - the value types exchanged between the world and circuits.
//!
//! A [`Signal`] is a typed, strength-graded event. [`InputSignal`] is a
//! stimulus arriving at a circuit; [`OutputSignal`] is a consequence a
//! circuit asserts back into the world. Signals are immutable once built:
//! attenuation produces a new value.

mod input;
mod kind;
mod output;

pub use input::*;
pub use kind::*;
pub use output::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use world_rules::CircuitId;

use crate::error::CodecError;

pub(crate) fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// The common shape of every signal: a kind, a clamped strength, an optional
/// emitting circuit, a timestamp, and an open payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    /// Intensity in [0, 1].
    pub strength: f32,
    /// The circuit that emitted this signal, if any.
    pub source: Option<CircuitId>,
    /// Simulation time in seconds.
    pub timestamp: f64,
    /// Open key-value payload carried verbatim through serialization.
    #[serde(default)]
    pub payload: HashMap<String, Value>,
}

impl Signal {
    /// Create a new signal. Strength is clamped into [0, 1].
    pub fn new(kind: SignalKind, strength: f32) -> Self {
        Self {
            kind,
            strength: clamp01(strength),
            source: None,
            timestamp: 0.0,
            payload: HashMap::new(),
        }
    }

    /// A copy of this signal with strength scaled by `factor`, clamped.
    pub fn attenuate(&self, factor: f32) -> Self {
        let mut signal = self.clone();
        signal.strength = clamp01(self.strength * factor);
        signal
    }

    /// String payload entry, if present and a string.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Boolean payload entry; absent or non-boolean reads as false.
    pub fn payload_bool(&self, key: &str) -> bool {
        self.payload
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Serialize to a plain key-value structure for the host's save system.
    pub fn to_value(&self) -> Result<Value, CodecError> {
        serde_json::to_value(self).map_err(|e| CodecError::Encode("signal", e))
    }

    /// Deserialize from a plain key-value structure.
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        serde_json::from_value(value).map_err(|e| CodecError::Decode("signal", e))
    }
}
