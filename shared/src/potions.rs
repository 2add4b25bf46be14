//! Invisibility potion variants.

use serde::{Deserialize, Serialize};

/// Which invisibility potion granted an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PotionKind {
    Lesser = 0,
    Regular = 1,
    Greater = 2,
}

impl PotionKind {
    pub const ALL: [PotionKind; 3] = [PotionKind::Lesser, PotionKind::Regular, PotionKind::Greater];

    /// Parse a kind from user input ("lesser", "regular", "greater")
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "lesser" | "l" => Some(Self::Lesser),
            "regular" | "normal" | "r" => Some(Self::Regular),
            "greater" | "g" => Some(Self::Greater),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lesser => "Lesser Invisibility Potion",
            Self::Regular => "Invisibility Potion",
            Self::Greater => "Greater Invisibility Potion",
        }
    }

    /// Parameters of this variant
    pub fn definition(&self) -> PotionDef {
        match self {
            Self::Lesser => PotionDef {
                kind: *self,
                duration_secs: 30,
                can_attempt_stealth: false,
                stealth_success_chance: 0.0,
                reveal_chance: 100,
            },
            Self::Regular => PotionDef {
                kind: *self,
                duration_secs: 60,
                can_attempt_stealth: false,
                stealth_success_chance: 0.0,
                reveal_chance: 70,
            },
            Self::Greater => PotionDef {
                kind: *self,
                duration_secs: 90,
                can_attempt_stealth: true,
                stealth_success_chance: 0.5,
                reveal_chance: 50,
            },
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.definition().duration_secs
    }

    /// Chance (0-100) that a detection attempt reveals an actor under this potion
    pub fn reveal_chance(&self) -> u8 {
        self.definition().reveal_chance
    }
}

/// Immutable parameters of one potion variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotionDef {
    pub kind: PotionKind,
    /// Effect duration in seconds
    pub duration_secs: u32,
    /// Whether drinking may grant stealth movement
    pub can_attempt_stealth: bool,
    /// Chance (0.0 to 1.0) that the stealth roll succeeds
    pub stealth_success_chance: f64,
    /// Chance (0-100) that Reveal / Detect Hidden uncovers the drinker
    pub reveal_chance: u8,
}

/// All potion variants, lesser first
pub fn get_potion_definitions() -> Vec<PotionDef> {
    PotionKind::ALL.iter().map(|k| k.definition()).collect()
}
