//! Signal kinds - the closed vocabulary of stimuli and consequences.

use serde::{Deserialize, Serialize};

/// Every kind of signal the engine can carry.
///
/// Input-leaning kinds describe stimuli arriving at a circuit; output-leaning
/// kinds describe consequences a circuit asserts into the world. The type
/// level does not police the split: each circuit declares which kinds it
/// accepts and which it can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    // Physical contact
    Press,
    Kick,
    Push,
    Pull,
    Poke,
    Throw,
    Climb,

    // Sensory probing
    Look,
    Listen,
    Smell,

    // Social address
    Say,
    Shout,
    Whisper,

    // Environmental exposure
    Heat,
    Cold,
    Wet,
    Electric,
    Proximity,
    Time,
    Damage,

    // Consequences
    Move,
    Sound,
    ChangeState,
    Emit,
    Trigger,
    Collapse,
    Activate,
    Deactivate,
    Alert,
    Flee,
    Attack,
    Speak,
}

impl SignalKind {
    /// Physical-contact stimuli.
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            SignalKind::Press
                | SignalKind::Kick
                | SignalKind::Push
                | SignalKind::Pull
                | SignalKind::Poke
                | SignalKind::Throw
                | SignalKind::Climb
        )
    }

    /// Non-contact probing stimuli.
    pub fn is_sensory(&self) -> bool {
        matches!(self, SignalKind::Look | SignalKind::Listen | SignalKind::Smell)
    }

    /// Spoken or shouted address.
    pub fn is_social(&self) -> bool {
        matches!(self, SignalKind::Say | SignalKind::Shout | SignalKind::Whisper)
    }

    /// Ambient exposure stimuli.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            SignalKind::Heat
                | SignalKind::Cold
                | SignalKind::Wet
                | SignalKind::Electric
                | SignalKind::Proximity
                | SignalKind::Time
                | SignalKind::Damage
        )
    }

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Press => "press",
            SignalKind::Kick => "kick",
            SignalKind::Push => "push",
            SignalKind::Pull => "pull",
            SignalKind::Poke => "poke",
            SignalKind::Throw => "throw",
            SignalKind::Climb => "climb",
            SignalKind::Look => "look",
            SignalKind::Listen => "listen",
            SignalKind::Smell => "smell",
            SignalKind::Say => "say",
            SignalKind::Shout => "shout",
            SignalKind::Whisper => "whisper",
            SignalKind::Heat => "heat",
            SignalKind::Cold => "cold",
            SignalKind::Wet => "wet",
            SignalKind::Electric => "electric",
            SignalKind::Proximity => "proximity",
            SignalKind::Time => "time",
            SignalKind::Damage => "damage",
            SignalKind::Move => "move",
            SignalKind::Sound => "sound",
            SignalKind::ChangeState => "change_state",
            SignalKind::Emit => "emit",
            SignalKind::Trigger => "trigger",
            SignalKind::Collapse => "collapse",
            SignalKind::Activate => "activate",
            SignalKind::Deactivate => "deactivate",
            SignalKind::Alert => "alert",
            SignalKind::Flee => "flee",
            SignalKind::Attack => "attack",
            SignalKind::Speak => "speak",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_disjoint() {
        for kind in [SignalKind::Press, SignalKind::Kick, SignalKind::Climb] {
            assert!(kind.is_physical());
            assert!(!kind.is_sensory());
            assert!(!kind.is_environmental());
        }
        assert!(SignalKind::Look.is_sensory());
        assert!(SignalKind::Shout.is_social());
        assert!(SignalKind::Damage.is_environmental());
        assert!(!SignalKind::Collapse.is_physical());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(SignalKind::ChangeState.to_string(), "change_state");
        assert_eq!(SignalKind::Proximity.to_string(), "proximity");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&SignalKind::ChangeState).unwrap();
        assert_eq!(json, "\"change_state\"");
        let back: SignalKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SignalKind::ChangeState);
    }
}
