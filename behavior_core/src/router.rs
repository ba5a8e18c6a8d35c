//! Signal router - translates processing results into world-level effects.
//!
//! The router is a pure translator: it owns nothing but a narration sink and
//! reaches the rest of the world through the narrow collaborator traits
//! defined here. Hosts implement the traits over their own memory, presence,
//! and scene systems; `world_rules` types get implementations below.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use world_rules::{CircuitId, EntityId, FactId, Hotspot, LocationId, WorldState};

use crate::processor::{CircuitProcessor, ProcessingMode, ProcessingResult};
use crate::signal::{InputSignal, OutputSignal, SignalKind};

/// Bound on recursive activation cascades (activate -> press -> activate).
pub const MAX_ACTIVATION_HOPS: usize = 3;

/// How a belief reached its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeliefSource {
    /// Seen or heard first-hand.
    Witnessed,
    /// Told by someone else.
    Reported,
    /// Deduced from other beliefs.
    Inferred,
}

/// What surfaced a discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoverySource {
    /// Something broke open.
    Destruction,
    /// A mechanism or hazard fired.
    Triggered,
    /// Deliberate searching.
    Exploration,
}

/// The host's belief and discovery bookkeeping.
pub trait WorldMemory {
    fn record_witnessed_belief(
        &mut self,
        witness: EntityId,
        content: &str,
        location: LocationId,
        source: BeliefSource,
    );

    fn register_discovery(
        &mut self,
        fact: FactId,
        description: &str,
        location: LocationId,
        source: DiscoverySource,
        is_evidence: bool,
    );
}

/// Who is present to witness an effect.
pub trait Presence {
    fn npc_ids_at(&self, location: LocationId) -> Vec<EntityId>;
}

/// A live handle on one hotspot.
pub trait HotspotHandle {
    fn name(&self) -> &str;
    fn deactivate(&mut self);
    fn reveal(&mut self);
    fn target_fact_id(&self) -> Option<FactId>;
}

/// Lookup of hotspots by the circuit that drives them.
pub trait HotspotDirectory {
    fn hotspot_mut(&mut self, circuit: &CircuitId) -> Option<&mut dyn HotspotHandle>;
}

/// Where narrated lines go.
pub trait NarrationSink {
    fn narrate(&mut self, line: &str);
}

/// A narration sink that keeps every line, for tests and transcript hosts.
#[derive(Debug, Default)]
pub struct NarrationLog {
    pub lines: Vec<String>,
}

impl NarrationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NarrationSink for NarrationLog {
    fn narrate(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// A narration sink that discards everything.
#[derive(Debug, Default)]
pub struct NullNarration;

impl NarrationSink for NullNarration {
    fn narrate(&mut self, _line: &str) {}
}

/// The collaborator handles one routing pass works against.
pub struct RouteContext<'a> {
    pub memory: &'a mut dyn WorldMemory,
    pub presence: &'a dyn Presence,
    pub hotspots: &'a mut dyn HotspotDirectory,
    pub location: Option<LocationId>,
}

/// Translates a processing result's outputs into world-level side effects.
pub struct SignalRouter {
    narration: Box<dyn NarrationSink>,
}

impl std::fmt::Debug for SignalRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRouter").finish()
    }
}

impl SignalRouter {
    pub fn new(narration: Box<dyn NarrationSink>) -> Self {
        Self { narration }
    }

    /// Route every output of a result. A failed or silent result is a no-op.
    pub fn route(
        &mut self,
        result: &ProcessingResult,
        processor: &mut CircuitProcessor,
        ctx: &mut RouteContext<'_>,
    ) {
        self.route_depth(result, processor, ctx, 0);
    }

    fn route_depth(
        &mut self,
        result: &ProcessingResult,
        processor: &mut CircuitProcessor,
        ctx: &mut RouteContext<'_>,
        depth: usize,
    ) {
        if !result.success || result.outputs.is_empty() {
            return;
        }
        for output in &result.outputs {
            match output.kind() {
                SignalKind::Sound => self.route_sound(result, output, ctx),
                SignalKind::Collapse => self.route_collapse(result, ctx),
                SignalKind::Activate => {
                    self.route_activation(result, output, processor, ctx, depth)
                }
                SignalKind::Alert => self.route_alert(result, ctx),
                SignalKind::Trigger => self.route_trigger(output, ctx),
                SignalKind::Emit => self.route_emission(output),
                _ => {}
            }
        }
    }

    fn route_sound(
        &mut self,
        result: &ProcessingResult,
        output: &OutputSignal,
        ctx: &mut RouteContext<'_>,
    ) {
        let label = output.signal.payload_str("sound").unwrap_or("noise");
        if output.strength() > 0.3 {
            self.narration
                .narrate(&format!("A {} rings out nearby.", label));
        }
        if let Some(location) = ctx.location {
            let content = format!("heard a {} from {}", label, result.circuit_id);
            for npc in ctx.presence.npc_ids_at(location) {
                ctx.memory
                    .record_witnessed_belief(npc, &content, location, BeliefSource::Witnessed);
            }
        }
    }

    fn route_collapse(&mut self, result: &ProcessingResult, ctx: &mut RouteContext<'_>) {
        let (name, fact) = match ctx.hotspots.hotspot_mut(&result.circuit_id) {
            Some(hotspot) => {
                hotspot.deactivate();
                (hotspot.name().to_string(), hotspot.target_fact_id())
            }
            None => return,
        };

        self.narration
            .narrate(&format!("{} collapses in a cloud of dust.", name));

        if let Some(location) = ctx.location {
            if let Some(fact) = fact {
                let description = format!("something uncovered in the wreckage of {}", name);
                ctx.memory.register_discovery(
                    fact,
                    &description,
                    location,
                    DiscoverySource::Destruction,
                    true,
                );
                self.narration
                    .narrate(&format!("The wreckage of {} reveals something.", name));
            }
            let content = format!("saw {} collapse", name);
            for npc in ctx.presence.npc_ids_at(location) {
                ctx.memory
                    .record_witnessed_belief(npc, &content, location, BeliefSource::Witnessed);
            }
        }
    }

    fn route_activation(
        &mut self,
        result: &ProcessingResult,
        output: &OutputSignal,
        processor: &mut CircuitProcessor,
        ctx: &mut RouteContext<'_>,
        depth: usize,
    ) {
        let Some(target) = output.target.clone() else {
            return;
        };
        if !processor.contains(&target) || depth + 1 >= MAX_ACTIVATION_HOPS {
            return;
        }

        let press = InputSignal::new(SignalKind::Press, output.strength())
            .with_source(result.circuit_id.clone())
            .with_timestamp(output.timestamp());
        let cascade = processor.process(&target, press, None, ProcessingMode::Rules);
        if cascade.success && !cascade.narrative.is_empty() {
            self.narration.narrate(&cascade.narrative);
        }
        self.route_depth(&cascade, processor, ctx, depth + 1);
    }

    fn route_alert(&mut self, result: &ProcessingResult, ctx: &mut RouteContext<'_>) {
        if let Some(location) = ctx.location {
            let content = format!("noticed sudden wariness near {}", result.circuit_id);
            for npc in ctx.presence.npc_ids_at(location) {
                ctx.memory
                    .record_witnessed_belief(npc, &content, location, BeliefSource::Witnessed);
            }
        }
    }

    fn route_trigger(&mut self, output: &OutputSignal, ctx: &mut RouteContext<'_>) {
        if let (Some(raw), Some(location)) =
            (output.signal.payload_str("fact_id"), ctx.location)
        {
            if let Ok(uuid) = Uuid::parse_str(raw) {
                let description = output
                    .signal
                    .payload_str("description")
                    .unwrap_or("a hidden truth surfaces");
                ctx.memory.register_discovery(
                    FactId::from_uuid(uuid),
                    description,
                    location,
                    DiscoverySource::Triggered,
                    output.signal.payload_bool("evidence"),
                );
            }
        }

        if let Some(reveal) = output.signal.payload_str("reveal") {
            let id = CircuitId::from(reveal);
            if let Some(hotspot) = ctx.hotspots.hotspot_mut(&id) {
                hotspot.reveal();
                let name = hotspot.name().to_string();
                self.narration
                    .narrate(&format!("{} comes into view.", name));
            }
        }
    }

    fn route_emission(&mut self, output: &OutputSignal) {
        let label = output.signal.payload_str("type").unwrap_or("vapor");
        self.narration
            .narrate(&format!("A wisp of {} escapes.", label));
    }
}

impl HotspotHandle for Hotspot {
    fn name(&self) -> &str {
        &self.name
    }

    fn deactivate(&mut self) {
        Hotspot::deactivate(self);
    }

    fn reveal(&mut self) {
        Hotspot::reveal(self);
    }

    fn target_fact_id(&self) -> Option<FactId> {
        self.target_fact
    }
}

impl Presence for WorldState {
    fn npc_ids_at(&self, location: LocationId) -> Vec<EntityId> {
        self.npcs_at(location)
    }
}

impl HotspotDirectory for WorldState {
    fn hotspot_mut(&mut self, circuit: &CircuitId) -> Option<&mut dyn HotspotHandle> {
        self.hotspots
            .get_mut(circuit)
            .map(|hotspot| hotspot as &mut dyn HotspotHandle)
    }
}
