//! Potion invisibility.
//!
//! Tracks which actors are invisible from a potion, how far they may still
//! move, and every way the effect can end. All state lives in
//! [`InvisibilityRegistry`]; the world drives it from movement, actions,
//! detection attempts and its timer queue.
//!
//! Ending the effect always goes through [`InvisibilityRegistry::clear`], which
//! also resets the drink lock so the actor can drink again right away.

mod drink;
mod registry;
mod reveal;

pub use drink::DrinkOutcome;
pub use registry::{InvisibilityRecord, InvisibilityRegistry};
pub use reveal::{MoveOutcome, RevealCause, StepOutcome};

use veil_shared::{
    PotionDef, PotionKind, VisualEffect, LOW_STEPS_WARNING_THRESHOLD, MAX_STEALTH_ARMOR_RATING,
};

use crate::entities::ActorId;

/// Localized buff text id for the invisibility icon
pub const BUFF_CLILOC: u32 = 1075825;

/// Shimmer drawn above the drinker's head
pub const SHIMMER_PARTICLES: VisualEffect = VisualEffect::Particles {
    effect_id: 0x376A,
    count: 10,
    speed: 15,
    duration: 5045,
    z_offset: 16,
};

pub const INVISIBILITY_SOUND: VisualEffect = VisualEffect::Sound { sound_id: 0x3C4 };

pub const DRINK_SOUND: VisualEffect = VisualEffect::Sound { sound_id: 0x2D6 };

/// Timer event: the effect granted to `0` has run its course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvisibilityExpiry(pub ActorId);

/// Tunables for potion invisibility
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvisibilityRules {
    /// Chance (0.0 to 1.0) that a greater potion grants stealth movement
    pub greater_stealth_chance: f64,
    /// Armor rating at or above which stealth movement is refused
    pub max_stealth_armor_rating: i32,
    /// Warn when remaining steps drop below this
    pub low_steps_warning_threshold: u32,
}

impl Default for InvisibilityRules {
    fn default() -> Self {
        Self {
            greater_stealth_chance: PotionKind::Greater.definition().stealth_success_chance,
            max_stealth_armor_rating: MAX_STEALTH_ARMOR_RATING,
            low_steps_warning_threshold: LOW_STEPS_WARNING_THRESHOLD,
        }
    }
}

impl InvisibilityRules {
    /// Variant parameters with the configured stealth chance applied
    pub fn definition(&self, kind: PotionKind) -> PotionDef {
        let mut def = kind.definition();
        if def.can_attempt_stealth {
            def.stealth_success_chance = self.greater_stealth_chance.clamp(0.0, 1.0);
        }
        def
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use veil_shared::{AccessLevel, SkillName};

    use crate::entities::ServerPlayer;
    use crate::scheduler::TimerQueue;

    use super::{InvisibilityExpiry, InvisibilityRegistry};

    pub type Timers = TimerQueue<InvisibilityExpiry>;

    pub fn player(id: u64) -> ServerPlayer {
        ServerPlayer::new(id, format!("Player{}", id), AccessLevel::Player)
    }

    pub fn skilled_player(id: u64, stealth: f64, hiding: f64) -> ServerPlayer {
        let mut p = player(id);
        p.set_skill(SkillName::Stealth, stealth);
        p.set_skill(SkillName::Hiding, hiding);
        p
    }

    pub fn setup() -> (InvisibilityRegistry, Timers) {
        (InvisibilityRegistry::default(), TimerQueue::new())
    }

    pub fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }
}
