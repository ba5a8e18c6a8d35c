//! Behavior circuits - the per-entity state machine at the heart of the
//! engine.
//!
//! Every interactive entity owns one [`BehaviorCircuit`]: a declared signal
//! vocabulary, bounded numeric state, affordances, a bounded interaction
//! history, and a processing strategy. The three built-in circuit families
//! live in submodules:
//!
//! - **mechanical**: doors, levers, crates - wear, jamming, power
//! - **biological**: creatures and NPC bodies - drives and reactions
//! - **environmental**: terrain and hazards - stability, temperature, phase

mod biological;
mod environmental;
mod mechanical;

pub use biological::*;
pub use environmental::*;
pub use mechanical::*;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use world_rules::CircuitId;

use crate::affordance::AffordanceSet;
use crate::error::CodecError;
use crate::signal::{clamp01, InputSignal, OutputSignal, SignalKind};

/// Default interaction-history capacity.
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// The three built-in circuit families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitType {
    Mechanical,
    Biological,
    Environmental,
}

/// Bounded numeric state shared by every circuit. All mutators clamp into
/// their declared ranges and cannot fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitState {
    /// Structural integrity in [0, 1].
    pub health: f32,
    /// Available energy in [0, 1].
    pub power: f32,
    /// Accumulated exhaustion in [0, 1].
    pub fatigue: f32,
    /// Disposition toward interactors in [0, 1].
    pub trust: f32,
    /// Total simulated seconds lived.
    pub age: f64,
    /// Inactive circuits ignore all stimuli.
    pub active: bool,
    /// Timestamp of the most recent accepted stimulus.
    pub last_interaction: f64,
    /// Open key-value state carried verbatim through serialization.
    #[serde(default)]
    pub custom: HashMap<String, Value>,
}

impl Default for CircuitState {
    fn default() -> Self {
        Self {
            health: 1.0,
            power: 1.0,
            fatigue: 0.0,
            trust: 0.5,
            age: 0.0,
            active: true,
            last_interaction: 0.0,
            custom: HashMap::new(),
        }
    }
}

impl CircuitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance age by `dt` seconds. Negative deltas are ignored.
    pub fn update_age(&mut self, dt: f64) {
        self.age += dt.max(0.0);
    }

    /// Reduce health, clamped at zero. Returns true when the circuit is
    /// destroyed; a destroyed circuit goes inactive, its only self-destruct
    /// behavior.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        self.health = clamp01(self.health - amount.max(0.0));
        if self.health <= 0.0 {
            self.active = false;
            true
        } else {
            false
        }
    }

    /// Accumulate fatigue, clamped at one.
    pub fn apply_fatigue(&mut self, amount: f32) {
        self.fatigue = clamp01(self.fatigue + amount.max(0.0));
    }

    /// Shed fatigue, clamped at zero.
    pub fn recover(&mut self, amount: f32) {
        self.fatigue = clamp01(self.fatigue - amount.max(0.0));
    }

    /// Shift trust by a signed delta, clamped into [0, 1].
    pub fn modify_trust(&mut self, delta: f32) {
        self.trust = clamp01(self.trust + delta);
    }

    /// Serialize to a plain key-value structure.
    pub fn to_value(&self) -> Result<Value, CodecError> {
        serde_json::to_value(self).map_err(|e| CodecError::Encode("circuit state", e))
    }

    /// Deserialize from a plain key-value structure.
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        serde_json::from_value(value).map_err(|e| CodecError::Decode("circuit state", e))
    }
}

/// One entry in a circuit's bounded interaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: f64,
    pub kind: SignalKind,
    pub strength: f32,
    pub source: Option<CircuitId>,
}

/// Family-specific state, owned exclusively by the circuit and mutated only
/// by that circuit's own processing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SpecializedState {
    #[default]
    None,
    Mechanical(MechanicalState),
    Biological(BiologicalState),
    Environmental(EnvironmentalState),
}

impl SpecializedState {
    pub fn as_mechanical(&self) -> Option<&MechanicalState> {
        match self {
            SpecializedState::Mechanical(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_mechanical_mut(&mut self) -> Option<&mut MechanicalState> {
        match self {
            SpecializedState::Mechanical(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_biological(&self) -> Option<&BiologicalState> {
        match self {
            SpecializedState::Biological(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_biological_mut(&mut self) -> Option<&mut BiologicalState> {
        match self {
            SpecializedState::Biological(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_environmental(&self) -> Option<&EnvironmentalState> {
        match self {
            SpecializedState::Environmental(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_environmental_mut(&mut self) -> Option<&mut EnvironmentalState> {
        match self {
            SpecializedState::Environmental(state) => Some(state),
            _ => None,
        }
    }
}

/// A pluggable per-instance processing strategy.
///
/// Attaching a strategy overrides the circuit family's built-in rules for
/// both stimulus response and per-tick behavior. Strategies are shared by
/// reference when a circuit is cloned.
pub trait Strategy: fmt::Debug + Send + Sync {
    /// Decide the outputs for an accepted stimulus. The circuit's gates
    /// (active, accepted kind) and bookkeeping have already run.
    fn process(
        &self,
        circuit: &mut BehaviorCircuit,
        input: &InputSignal,
        rng: &mut SmallRng,
    ) -> Vec<OutputSignal>;

    /// Per-tick behavior. Base aging and fatigue recovery have already run.
    fn tick(
        &self,
        circuit: &mut BehaviorCircuit,
        dt: f64,
        rng: &mut SmallRng,
    ) -> Vec<OutputSignal> {
        let _ = (circuit, dt, rng);
        Vec::new()
    }
}

/// A strategy defined by a closure, for scripted one-off behaviors.
pub struct ScriptedStrategy<F> {
    label: &'static str,
    func: F,
}

impl<F> ScriptedStrategy<F>
where
    F: Fn(&mut BehaviorCircuit, &InputSignal, &mut SmallRng) -> Vec<OutputSignal>
        + Send
        + Sync,
{
    pub fn new(label: &'static str, func: F) -> Self {
        Self { label, func }
    }
}

impl<F> fmt::Debug for ScriptedStrategy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptedStrategy({})", self.label)
    }
}

impl<F> Strategy for ScriptedStrategy<F>
where
    F: Fn(&mut BehaviorCircuit, &InputSignal, &mut SmallRng) -> Vec<OutputSignal>
        + Send
        + Sync,
{
    fn process(
        &self,
        circuit: &mut BehaviorCircuit,
        input: &InputSignal,
        rng: &mut SmallRng,
    ) -> Vec<OutputSignal> {
        (self.func)(circuit, input, rng)
    }
}

/// The behavioral model attached to one interactive entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorCircuit {
    pub id: CircuitId,
    pub name: String,
    kind: CircuitType,
    /// Signal kinds this circuit reacts to.
    pub accepted: HashSet<SignalKind>,
    /// Signal kinds this circuit may emit; anything else is filtered.
    pub emittable: HashSet<SignalKind>,
    pub state: CircuitState,
    pub affordances: AffordanceSet,
    special: SpecializedState,
    history: VecDeque<InteractionRecord>,
    max_history: usize,
    /// Not serialized: a deserialized circuit falls back to its family's
    /// built-in dispatch.
    #[serde(skip)]
    strategy: Option<Arc<dyn Strategy>>,
}

impl PartialEq for BehaviorCircuit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.kind == other.kind
            && self.accepted == other.accepted
            && self.emittable == other.emittable
            && self.state == other.state
            && self.affordances == other.affordances
            && self.special == other.special
            && self.history == other.history
            && self.max_history == other.max_history
    }
}

impl BehaviorCircuit {
    /// Create a bare circuit with empty vocabularies and no specialized
    /// state. Family constructors ([`BehaviorCircuit::mechanical`] and
    /// friends) are the usual entry points.
    pub fn new(id: impl Into<CircuitId>, name: impl Into<String>, kind: CircuitType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            accepted: HashSet::new(),
            emittable: HashSet::new(),
            state: CircuitState::default(),
            affordances: AffordanceSet::new(),
            special: SpecializedState::None,
            history: VecDeque::new(),
            max_history: DEFAULT_MAX_HISTORY,
            strategy: None,
        }
    }

    /// Declare the accepted input vocabulary.
    pub fn with_accepted(mut self, kinds: impl IntoIterator<Item = SignalKind>) -> Self {
        self.accepted.extend(kinds);
        self
    }

    /// Declare the emittable output vocabulary.
    pub fn with_emittable(mut self, kinds: impl IntoIterator<Item = SignalKind>) -> Self {
        self.emittable.extend(kinds);
        self
    }

    /// Attach family-specific state.
    pub fn with_special(mut self, special: SpecializedState) -> Self {
        self.special = special;
        self
    }

    /// Set the interaction-history capacity.
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Add an affordance tag.
    pub fn with_affordance(mut self, tag: &str) -> Self {
        self.affordances.add(tag);
        self
    }

    /// Attach a per-instance strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn set_strategy(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategy = Some(strategy);
    }

    pub fn clear_strategy(&mut self) {
        self.strategy = None;
    }

    pub fn has_strategy(&self) -> bool {
        self.strategy.is_some()
    }

    pub fn kind(&self) -> CircuitType {
        self.kind
    }

    pub fn special(&self) -> &SpecializedState {
        &self.special
    }

    pub fn special_mut(&mut self) -> &mut SpecializedState {
        &mut self.special
    }

    pub fn history(&self) -> &VecDeque<InteractionRecord> {
        &self.history
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Whether this circuit reacts to the given kind.
    pub fn responds_to(&self, kind: SignalKind) -> bool {
        self.accepted.contains(&kind)
    }

    /// Whether this circuit may emit the given kind.
    pub fn can_emit(&self, kind: SignalKind) -> bool {
        self.emittable.contains(&kind)
    }

    /// Deliver a stimulus. Returns no outputs when the circuit is inactive
    /// or the kind is not accepted, leaving history untouched. Otherwise
    /// records the interaction, runs the attached strategy (or the family
    /// built-in, or the generic default), stamps each output with this
    /// circuit's id, and filters outputs through the emittable vocabulary.
    pub fn receive(&mut self, input: &InputSignal, rng: &mut SmallRng) -> Vec<OutputSignal> {
        if !self.state.active || !self.responds_to(input.kind()) {
            return Vec::new();
        }
        self.note_interaction(input);

        let outputs = if let Some(strategy) = self.strategy.clone() {
            strategy.process(self, input, rng)
        } else {
            self.builtin_response(input, rng)
        };
        self.finish_outputs(outputs)
    }

    /// Advance this circuit by `dt` seconds: age, recover a little fatigue,
    /// then run the strategy's or family's per-tick rules. Inactive circuits
    /// do nothing.
    pub fn update(&mut self, dt: f64, rng: &mut SmallRng) -> Vec<OutputSignal> {
        if !self.state.active {
            return Vec::new();
        }
        self.state.update_age(dt);
        self.state.recover((0.01 * dt.max(0.0)) as f32);

        let outputs = if let Some(strategy) = self.strategy.clone() {
            strategy.tick(self, dt, rng)
        } else {
            match &mut self.special {
                SpecializedState::Biological(bio) => bio.tick(dt, rng),
                SpecializedState::Environmental(env) => env.tick(dt),
                _ => Vec::new(),
            }
        };
        self.finish_outputs(outputs)
    }

    /// Deep copy under a new id: fresh empty history, shared strategy
    /// reference, same vocabularies and state.
    pub fn clone_as(&self, new_id: impl Into<CircuitId>) -> Self {
        let mut copy = self.clone();
        copy.id = new_id.into();
        copy.history = VecDeque::new();
        copy
    }

    /// Serialize to a plain key-value structure. The strategy is not data
    /// and is omitted.
    pub fn to_value(&self) -> Result<Value, CodecError> {
        serde_json::to_value(self).map_err(|e| CodecError::Encode("behavior circuit", e))
    }

    /// Deserialize from a plain key-value structure.
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        serde_json::from_value(value).map_err(|e| CodecError::Decode("behavior circuit", e))
    }

    /// Record an accepted stimulus, trimming the oldest entries past
    /// capacity, and bump `last_interaction`.
    pub(crate) fn note_interaction(&mut self, input: &InputSignal) {
        self.history.push_back(InteractionRecord {
            timestamp: input.timestamp(),
            kind: input.kind(),
            strength: input.strength(),
            source: input.signal.source.clone(),
        });
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
        self.state.last_interaction = input.timestamp();
    }

    /// Stamp outputs with this circuit's id and drop anything outside the
    /// declared emittable vocabulary.
    pub(crate) fn finish_outputs(&self, mut outputs: Vec<OutputSignal>) -> Vec<OutputSignal> {
        outputs.retain(|output| self.can_emit(output.kind()));
        for output in &mut outputs {
            output.signal.source = Some(self.id.clone());
        }
        outputs
    }

    fn builtin_response(&mut self, input: &InputSignal, rng: &mut SmallRng) -> Vec<OutputSignal> {
        match &mut self.special {
            SpecializedState::Mechanical(mech) => {
                mech.respond(&mut self.state, input, rng)
            }
            SpecializedState::Biological(bio) => bio.respond(&mut self.state, input),
            SpecializedState::Environmental(env) => {
                env.respond(&mut self.state, &mut self.affordances, input)
            }
            SpecializedState::None => default_response(&mut self.state, &self.emittable, input),
        }
    }
}

/// Generic fallback for circuits with no strategy and no specialized state:
/// hard blows damage, physical contact makes noise, pressing activates when
/// the circuit declares it can.
fn default_response(
    state: &mut CircuitState,
    emittable: &HashSet<SignalKind>,
    input: &InputSignal,
) -> Vec<OutputSignal> {
    let strength = input.strength();
    let mut outputs = Vec::new();

    if matches!(
        input.kind(),
        SignalKind::Kick | SignalKind::Push | SignalKind::Damage
    ) && strength > 0.7
        && state.apply_damage(0.2 * strength)
    {
        outputs.push(OutputSignal::new(SignalKind::Collapse, strength));
    }

    if input.kind().is_physical() {
        outputs.push(OutputSignal::sound("thud", 0.5 * strength));
    }

    if input.kind() == SignalKind::Press && emittable.contains(&SignalKind::Activate) {
        outputs.push(OutputSignal::new(SignalKind::Activate, strength).non_propagating());
    }

    outputs
}
