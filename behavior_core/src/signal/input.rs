//! Input signals - stimuli arriving at a circuit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use world_rules::CircuitId;

use super::{clamp01, Signal, SignalKind};
use crate::error::CodecError;

/// A stimulus delivered to a circuit: a signal plus where it came from
/// spatially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSignal {
    pub signal: Signal,
    /// Unit-ish direction the stimulus arrived from, if known.
    pub direction: Option<(f32, f32)>,
    /// Distance the stimulus traveled, in scene units.
    pub distance: f32,
}

impl InputSignal {
    /// Create a new stimulus with no spatial information.
    pub fn new(kind: SignalKind, strength: f32) -> Self {
        Self {
            signal: Signal::new(kind, strength),
            direction: None,
            distance: 0.0,
        }
    }

    /// Set the emitting circuit.
    pub fn with_source(mut self, source: impl Into<CircuitId>) -> Self {
        self.signal.source = Some(source.into());
        self
    }

    /// Set the simulation timestamp.
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.signal.timestamp = timestamp;
        self
    }

    /// Set the arrival direction.
    pub fn with_direction(mut self, direction: (f32, f32)) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Set the travel distance.
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance.max(0.0);
        self
    }

    /// Add a payload entry.
    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.signal.payload.insert(key.into(), value);
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

    pub fn source(&self) -> Option<&CircuitId> {
        self.signal.source.as_ref()
    }

    /// A copy with strength scaled by `factor`, clamped.
    pub fn attenuate(&self, factor: f32) -> Self {
        let mut input = self.clone();
        input.signal.strength = clamp01(self.signal.strength * factor);
        input
    }

    /// Serialize to a plain key-value structure.
    pub fn to_value(&self) -> Result<Value, CodecError> {
        serde_json::to_value(self).map_err(|e| CodecError::Encode("input signal", e))
    }

    /// Deserialize from a plain key-value structure.
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        serde_json::from_value(value).map_err(|e| CodecError::Decode("input signal", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let input = InputSignal::new(SignalKind::Proximity, 0.6)
            .with_source("wolf")
            .with_timestamp(3.0)
            .with_direction((0.0, 1.0))
            .with_distance(2.5);

        assert_eq!(input.kind(), SignalKind::Proximity);
        assert_eq!(input.source().map(|s| s.as_str()), Some("wolf"));
        assert_eq!(input.direction, Some((0.0, 1.0)));
        assert!((input.distance - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_negative_distance_clamped() {
        let input = InputSignal::new(SignalKind::Sound, 0.5).with_distance(-4.0);
        assert_eq!(input.distance, 0.0);
    }

    #[test]
    fn test_attenuate() {
        let input = InputSignal::new(SignalKind::Sound, 1.0).with_distance(3.0);
        let faded = input.attenuate(0.8);
        assert!((faded.strength() - 0.8).abs() < 1e-6);
        assert_eq!(faded.distance, input.distance);
    }

    #[test]
    fn test_value_round_trip() {
        let input = InputSignal::new(SignalKind::Heat, 0.9)
            .with_source("brazier")
            .with_payload("fuel", Value::from("oil"))
            .with_direction((1.0, 0.0));

        let back = InputSignal::from_value(input.to_value().unwrap()).unwrap();
        assert_eq!(back, input);
    }
}
