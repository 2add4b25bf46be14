//! Skill names and the stealth step tiers for potion invisibility.

use serde::{Deserialize, Serialize};

/// Skills relevant to hiding and detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SkillName {
    Hiding = 0,
    Stealth = 1,
    DetectHidden = 2,
    Lockpicking = 3,
    Alchemy = 4,
}

impl SkillName {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hiding => "Hiding",
            Self::Stealth => "Stealth",
            Self::DetectHidden => "Detect Hidden",
            Self::Lockpicking => "Lockpicking",
            Self::Alchemy => "Alchemy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "hiding" => Some(Self::Hiding),
            "stealth" => Some(Self::Stealth),
            "detect" | "detecthidden" => Some(Self::DetectHidden),
            "lockpicking" => Some(Self::Lockpicking),
            "alchemy" => Some(Self::Alchemy),
            _ => None,
        }
    }
}

// =============================================================================
// Stealth Steps
// =============================================================================

/// Armor rating at or above which stealth movement is impossible
pub const MAX_STEALTH_ARMOR_RATING: i32 = 42;

/// Remaining-step count below which the player is warned
pub const LOW_STEPS_WARNING_THRESHOLD: u32 = 2;

/// Steps granted below the first tier
pub const DEFAULT_STEALTH_STEPS: u32 = 2;

/// Steps granted when both Stealth and Hiding reach the elite threshold
pub const ELITE_STEALTH_STEPS: u32 = 21;

pub const ELITE_STEALTH_THRESHOLD: f64 = 120.0;
pub const ELITE_HIDING_THRESHOLD: f64 = 120.0;

/// (minimum base Stealth, steps), highest tier first
const STEALTH_STEP_TIERS: [(f64, u32); 9] = [
    (120.0, 18),
    (110.0, 18),
    (100.0, 16),
    (90.0, 14),
    (80.0, 12),
    (70.0, 10),
    (60.0, 8),
    (50.0, 6),
    (30.0, 4),
];

/// Movement steps a potion grants for the given BASE Stealth and Hiding skills.
///
/// Skill modifiers are ignored on purpose: only trained skill counts. The
/// result never refreshes during the effect.
pub fn stealth_steps_for(stealth_base: f64, hiding_base: f64) -> u32 {
    if stealth_base >= ELITE_STEALTH_THRESHOLD && hiding_base >= ELITE_HIDING_THRESHOLD {
        return ELITE_STEALTH_STEPS;
    }

    STEALTH_STEP_TIERS
        .iter()
        .find(|(min_skill, _)| stealth_base >= *min_skill)
        .map(|(_, steps)| *steps)
        .unwrap_or(DEFAULT_STEALTH_STEPS)
}
