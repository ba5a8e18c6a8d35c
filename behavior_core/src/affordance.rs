//! Affordance sets - capability tags describing what can be done with an
//! entity, with blocking and layered inheritance (terrain -> object ->
//! entity).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A set of capability tags plus a disjoint blocked set that always wins.
///
/// Invariant: `has(tag)` is true exactly when the tag is present and not
/// blocked. Inheriting from a parent never un-blocks a locally blocked tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffordanceSet {
    /// Tag -> optional detail string.
    affordances: HashMap<String, Option<String>>,
    blocked: HashSet<String>,
}

impl AffordanceSet {
    /// Create an empty affordance set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag with no detail.
    pub fn add(&mut self, tag: impl Into<String>) {
        self.affordances.insert(tag.into(), None);
    }

    /// Add a tag with a detail string.
    pub fn add_detailed(&mut self, tag: impl Into<String>, detail: impl Into<String>) {
        self.affordances.insert(tag.into(), Some(detail.into()));
    }

    /// Remove a tag.
    pub fn remove(&mut self, tag: &str) {
        self.affordances.remove(tag);
    }

    /// Block a tag. Blocking wins over membership, present or future.
    pub fn block(&mut self, tag: impl Into<String>) {
        self.blocked.insert(tag.into());
    }

    /// Lift a block.
    pub fn unblock(&mut self, tag: &str) {
        self.blocked.remove(tag);
    }

    /// Whether the tag is available: present and not blocked.
    pub fn has(&self, tag: &str) -> bool {
        self.affordances.contains_key(tag) && !self.blocked.contains(tag)
    }

    /// Detail string for a tag, if any was recorded.
    pub fn detail(&self, tag: &str) -> Option<&str> {
        self.affordances.get(tag).and_then(|d| d.as_deref())
    }

    /// All available tags: membership minus blocks.
    pub fn get_all(&self) -> HashSet<String> {
        self.affordances
            .keys()
            .filter(|tag| !self.blocked.contains(*tag))
            .cloned()
            .collect()
    }

    /// Union the parent's non-blocked tags into this set. Tags already
    /// present locally keep their local detail; local blocks stay blocked.
    pub fn inherit_from(&mut self, parent: &AffordanceSet) {
        for (tag, detail) in &parent.affordances {
            if parent.blocked.contains(tag) {
                continue;
            }
            self.affordances
                .entry(tag.clone())
                .or_insert_with(|| detail.clone());
        }
    }

    /// Non-mutating union with parent-style inheritance applied.
    pub fn merge_with(&self, other: &AffordanceSet) -> AffordanceSet {
        let mut merged = self.clone();
        merged.inherit_from(other);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_has() {
        let mut set = AffordanceSet::new();
        set.add("openable");
        assert!(set.has("openable"));
        assert!(!set.has("climbable"));
    }

    #[test]
    fn test_block_wins_over_membership() {
        let mut set = AffordanceSet::new();
        set.add("openable");
        set.block("openable");
        assert!(!set.has("openable"));
        assert!(!set.get_all().contains("openable"));

        set.unblock("openable");
        assert!(set.has("openable"));
    }

    #[test]
    fn test_detail_storage() {
        let mut set = AffordanceSet::new();
        set.add_detailed("lockable", "iron padlock");
        set.add("pushable");
        assert_eq!(set.detail("lockable"), Some("iron padlock"));
        assert_eq!(set.detail("pushable"), None);
    }

    #[test]
    fn test_inherit_skips_parent_blocks() {
        let mut parent = AffordanceSet::new();
        parent.add("walkable");
        parent.add("diggable");
        parent.block("diggable");

        let mut child = AffordanceSet::new();
        child.inherit_from(&parent);

        assert!(child.has("walkable"));
        assert!(!child.has("diggable"));
    }

    #[test]
    fn test_inherit_respects_local_blocks() {
        let mut parent = AffordanceSet::new();
        parent.add("climbable");

        let mut child = AffordanceSet::new();
        child.block("climbable");
        child.inherit_from(&parent);

        // The tag arrives but stays suppressed by the local block.
        assert!(!child.has("climbable"));
        child.unblock("climbable");
        assert!(child.has("climbable"));
    }

    #[test]
    fn test_inherit_keeps_local_detail() {
        let mut parent = AffordanceSet::new();
        parent.add_detailed("lockable", "rusted chain");

        let mut child = AffordanceSet::new();
        child.add_detailed("lockable", "iron padlock");
        child.inherit_from(&parent);

        assert_eq!(child.detail("lockable"), Some("iron padlock"));
    }

    #[test]
    fn test_merge_with_does_not_mutate() {
        let mut terrain = AffordanceSet::new();
        terrain.add("walkable");
        let mut object = AffordanceSet::new();
        object.add("pushable");

        let merged = object.merge_with(&terrain);
        assert!(merged.has("walkable"));
        assert!(merged.has("pushable"));
        assert!(!object.has("walkable"));
    }

    #[test]
    fn test_layered_inheritance() {
        let mut terrain = AffordanceSet::new();
        terrain.add("walkable");

        let mut object = AffordanceSet::new();
        object.add("pushable");
        object.inherit_from(&terrain);

        let mut entity = AffordanceSet::new();
        entity.add("talkable");
        entity.inherit_from(&object);

        assert!(entity.has("walkable"));
        assert!(entity.has("pushable"));
        assert!(entity.has("talkable"));
    }
}
