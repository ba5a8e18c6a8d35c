//! # World Rules
//!
//! The "World Bible" crate - shared identities and world-level structures for
//! Lodestone. Every subsystem speaks in the vocabulary defined here: entity,
//! location, and fact identities, interactive hotspots, and the light world
//! state tracking who is where. This crate contains no behavioral logic.

pub mod hotspot;
pub mod ids;
pub mod location;
pub mod world;

pub use hotspot::*;
pub use ids::*;
pub use location::*;
pub use world::*;
