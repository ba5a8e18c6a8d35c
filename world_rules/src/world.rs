//! World state - who is where, and what can be interacted with.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::hotspot::Hotspot;
use crate::ids::{CircuitId, EntityId, LocationId};
use crate::location::Location;

/// The slice of world state the behavioral engine observes: simulation time,
/// locations, NPC presence, and the hotspots of each scene.
///
/// Characters, items, and inventories belong to the host; the engine only
/// ever asks "who is at this location" and "which hotspot owns this circuit".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldState {
    /// Simulation time in seconds.
    pub time: f64,

    /// Location data.
    pub locations: HashMap<LocationId, Location>,

    /// Current location of each NPC.
    pub npc_locations: HashMap<EntityId, LocationId>,

    /// Hotspots keyed by the circuit that drives them.
    pub hotspots: HashMap<CircuitId, Hotspot>,
}

impl WorldState {
    /// Create a new empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance simulation time.
    pub fn advance_time(&mut self, dt: f64) {
        self.time += dt.max(0.0);
    }

    /// Add a location to the world.
    pub fn add_location(&mut self, location: Location) -> LocationId {
        let id = location.id;
        self.locations.insert(id, location);
        id
    }

    /// Place an NPC at a location.
    pub fn place_npc(&mut self, npc: EntityId, location: LocationId) {
        self.npc_locations.insert(npc, location);
    }

    /// Remove an NPC from the world entirely.
    pub fn remove_npc(&mut self, npc: EntityId) -> Option<LocationId> {
        self.npc_locations.remove(&npc)
    }

    /// All NPCs at a location, in stable order so replays see identical
    /// witness lists.
    pub fn npcs_at(&self, location: LocationId) -> Vec<EntityId> {
        let mut present: Vec<EntityId> = self
            .npc_locations
            .iter()
            .filter(|(_, loc)| **loc == location)
            .map(|(npc, _)| *npc)
            .collect();
        present.sort();
        present
    }

    /// Install a hotspot driven by the given circuit.
    pub fn add_hotspot(&mut self, circuit: CircuitId, hotspot: Hotspot) {
        self.hotspots.insert(circuit, hotspot);
    }

    /// Get the hotspot driven by a circuit.
    pub fn hotspot(&self, circuit: &CircuitId) -> Option<&Hotspot> {
        self.hotspots.get(circuit)
    }

    /// Get the hotspot driven by a circuit, mutably.
    pub fn hotspot_mut(&mut self, circuit: &CircuitId) -> Option<&mut Hotspot> {
        self.hotspots.get_mut(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_time() {
        let mut world = WorldState::new();
        world.advance_time(2.5);
        world.advance_time(-1.0);
        assert!((world.time - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_npcs_at_location() {
        let mut world = WorldState::new();
        let chapel = world.add_location(Location::new("Chapel", "Quiet."));
        let crypt = world.add_location(Location::new("Crypt", "Quieter."));

        let a = EntityId::new();
        let b = EntityId::new();
        let c = EntityId::new();
        world.place_npc(a, chapel);
        world.place_npc(b, chapel);
        world.place_npc(c, crypt);

        let present = world.npcs_at(chapel);
        assert_eq!(present.len(), 2);
        assert!(present.contains(&a));
        assert!(present.contains(&b));
        assert!(!present.contains(&c));
    }

    #[test]
    fn test_npcs_at_stable_order() {
        let mut world = WorldState::new();
        let loc = world.add_location(Location::new("Hall", "Long."));
        for _ in 0..8 {
            world.place_npc(EntityId::new(), loc);
        }
        let first = world.npcs_at(loc);
        let second = world.npcs_at(loc);
        assert_eq!(first, second);
    }

    #[test]
    fn test_remove_npc() {
        let mut world = WorldState::new();
        let loc = world.add_location(Location::new("Hall", "Long."));
        let npc = EntityId::new();
        world.place_npc(npc, loc);
        assert_eq!(world.remove_npc(npc), Some(loc));
        assert!(world.npcs_at(loc).is_empty());
    }

    #[test]
    fn test_hotspot_lookup() {
        let mut world = WorldState::new();
        let id = CircuitId::from("iron_door");
        world.add_hotspot(id.clone(), Hotspot::new("the iron door"));

        assert!(world.hotspot(&id).is_some());
        if let Some(hotspot) = world.hotspot_mut(&id) {
            hotspot.deactivate();
        }
        assert!(!world.hotspot(&id).map(|h| h.active).unwrap_or(true));
    }
}
