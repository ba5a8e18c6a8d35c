//! Location definitions.

use serde::{Deserialize, Serialize};

use crate::ids::LocationId;

/// Broad location categories used by scene generation and presence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    Wilderness,
    Settlement,
    Ruin,
    Interior,
    Special,
}

/// A location in the game world.
///
/// The behavioral engine only needs enough of a location to say *where*
/// something happened; description and connectivity belong to the host's
/// scene generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub location_type: LocationType,
}

impl Location {
    /// Create a new location with the given name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            description: description.into(),
            location_type: LocationType::Interior,
        }
    }

    /// Set the location type.
    pub fn with_type(mut self, location_type: LocationType) -> Self {
        self.location_type = location_type;
        self
    }
}
