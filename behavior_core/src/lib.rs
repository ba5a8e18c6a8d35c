//! # Behavior Core (Lodestone)
//!
//! The behavioral-signal engine: one uniform model through which every
//! interactive entity in the world - mechanical, biological, environmental -
//! receives stimuli and produces consequences.
//!
//! ## Core Components
//!
//! - **signal**: immutable stimulus/consequence value types and their kinds
//! - **affordance**: capability tags with blocking and layered inheritance
//! - **circuit**: per-entity behavior state machines and the three built-in
//!   circuit families
//! - **processor**: the registry and dispatcher - single dispatch,
//!   broadcast, bounded chain-reaction propagation, per-tick updates
//! - **router**: translates outputs into world-level effects through narrow
//!   collaborator traits
//! - **scenario**: declarative TOML circuit and hotspot definitions
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: one explicitly seeded random source, id-ordered
//!   dispatch; equal seeds replay equal runs
//! - **Bounded**: chain reactions decay per hop and stop at a fixed depth
//! - **Isolated failure**: a missing circuit or a single failed dispatch
//!   never aborts the rest of the simulation

pub mod affordance;
pub mod circuit;
pub mod error;
pub mod processor;
pub mod router;
pub mod scenario;
pub mod signal;

pub use affordance::*;
pub use circuit::*;
pub use error::*;
pub use processor::*;
pub use router::*;
pub use scenario::*;
pub use signal::*;
