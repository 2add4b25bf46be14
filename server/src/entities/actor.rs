//! Primitives an entity must offer to carry timed effects.

use std::time::Duration;

use veil_shared::{AccessLevel, BuffIcon, PotionKind, SkillName, VisualEffect};

/// Runtime id of a player or creature
pub type ActorId = u64;

/// Named lock that blocks repeating a behavior until released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionLock {
    InvisibilityPotion(PotionKind),
}

/// Anything that can drink a potion, hide, and move.
///
/// Effect code only talks to entities through this trait so that it can run
/// against players, creatures, or a test double alike.
pub trait Actor {
    fn id(&self) -> ActorId;

    fn access_level(&self) -> AccessLevel;

    fn is_hidden(&self) -> bool;

    fn set_hidden(&mut self, hidden: bool);

    /// Drop the current target and leave war mode
    fn clear_combat(&mut self);

    fn set_stealthing(&mut self, stealthing: bool);

    fn allowed_stealth_steps(&self) -> u32;

    fn set_allowed_stealth_steps(&mut self, steps: u32);

    /// Skill value without item or spell modifiers
    fn base_skill(&self, skill: SkillName) -> f64;

    fn armor_rating(&self) -> i32;

    /// Returns false if the lock is already held
    fn begin_action(&mut self, lock: ActionLock) -> bool;

    fn end_action(&mut self, lock: ActionLock);

    fn send_message(&mut self, hue: u16, text: String);

    fn add_buff(&mut self, icon: BuffIcon, cliloc: u32, duration: Duration);

    fn remove_buff(&mut self, icon: BuffIcon);

    fn play_effect(&mut self, effect: VisualEffect);
}
