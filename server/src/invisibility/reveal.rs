//! Everything that can end an invisibility effect early, plus expiry.

use log::info;
use rand::Rng;
use veil_shared::{SkillName, HUE_ERROR, HUE_WARNING};

use crate::entities::Actor;
use crate::scheduler::{TimerHandle, TimerQueue};

use super::InvisibilityRegistry;

/// Non-movement action that breaks invisibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealCause {
    DrankPotion,
    ThrewPotion,
    TookFromKeg,
    UsedSkill(SkillName),
    UsedItem(String),
    Other,
}

impl RevealCause {
    fn message(&self) -> String {
        match self {
            Self::DrankPotion => "You drank a potion and were revealed!".into(),
            Self::ThrewPotion => "You threw a potion and were revealed!".into(),
            Self::TookFromKeg => "You took a potion from the keg and were revealed!".into(),
            Self::UsedSkill(SkillName::Hiding) => {
                "You let the potion's veil drop to hide on your own.".into()
            }
            Self::UsedSkill(skill) => format!("You used {} and were revealed!", skill.name()),
            Self::UsedItem(name) => format!("You used {} and were revealed!", name),
            Self::Other => "Your action revealed you!".into(),
        }
    }
}

/// Result of checking one movement against an active effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Actor has no potion effect
    NoEffect,
    /// Effect did not allow movement and was cleared
    Revealed,
    /// Still hidden, but the next step or two will reveal
    Warned { steps_left: u32 },
    /// Still hidden
    Concealed { steps_left: u32 },
}

/// Result of spending one stealth step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No stealth-enabled effect to spend from
    NoEffect,
    Remaining(u32),
    /// Budget ran out and the effect was cleared
    Exhausted,
}

impl InvisibilityRegistry {
    /// Evaluate a movement.
    ///
    /// Effects without stealth end on any movement. Stealth effects survive
    /// and warn when the actor's remaining steps run low; spending steps is
    /// [`consume_stealth_step`](Self::consume_stealth_step)'s job.
    pub fn on_move<A, E>(&mut self, actor: &mut A, timers: &mut TimerQueue<E>) -> MoveOutcome
    where
        A: Actor + ?Sized,
    {
        let Some(record) = self.get(actor.id()) else {
            return MoveOutcome::NoEffect;
        };

        if !record.stealth_enabled {
            actor.send_message(HUE_ERROR, "You moved and were revealed!".into());
            self.clear(actor, timers);
            info!("Actor {} revealed by movement", actor.id());
            return MoveOutcome::Revealed;
        }

        let steps_left = actor.allowed_stealth_steps();
        if steps_left > 0 && steps_left < self.rules.low_steps_warning_threshold {
            actor.send_message(
                HUE_WARNING,
                "One false move and you will be revealed!".into(),
            );
            MoveOutcome::Warned { steps_left }
        } else {
            MoveOutcome::Concealed { steps_left }
        }
    }

    /// Spend one stealth step; clears the effect when none are left
    pub fn consume_stealth_step<A, E>(&mut self, actor: &mut A, timers: &mut TimerQueue<E>) -> StepOutcome
    where
        A: Actor + ?Sized,
    {
        match self.get(actor.id()) {
            Some(record) if record.stealth_enabled => {}
            _ => return StepOutcome::NoEffect,
        }

        let remaining = actor.allowed_stealth_steps().saturating_sub(1);
        actor.set_allowed_stealth_steps(remaining);
        if remaining > 0 {
            return StepOutcome::Remaining(remaining);
        }

        actor.send_message(
            HUE_ERROR,
            "You have run out of stealth steps and were revealed!".into(),
        );
        self.clear(actor, timers);
        info!("Actor {} revealed after spending all stealth steps", actor.id());
        StepOutcome::Exhausted
    }

    /// Any non-movement action ends the effect, whatever the potion.
    /// Returns true if there was an effect to end.
    pub fn on_action<A, E>(
        &mut self,
        actor: &mut A,
        timers: &mut TimerQueue<E>,
        cause: RevealCause,
    ) -> bool
    where
        A: Actor + ?Sized,
    {
        if !self.has_active_effect(actor.id()) {
            return false;
        }

        actor.send_message(HUE_ERROR, cause.message());
        self.clear(actor, timers);
        info!("Actor {} revealed by action {:?}", actor.id(), cause);
        true
    }

    /// Handle a fired expiration timer.
    ///
    /// Does nothing unless the actor's current record is the one `handle` was
    /// scheduled for.
    pub fn on_expire<A, E>(
        &mut self,
        actor: &mut A,
        timers: &mut TimerQueue<E>,
        handle: TimerHandle,
    ) -> bool
    where
        A: Actor + ?Sized,
    {
        match self.get(actor.id()) {
            Some(record) if record.timer == handle => {}
            _ => return false,
        }

        actor.send_message(HUE_ERROR, "The invisibility effect has worn off!".into());
        self.clear(actor, timers);
        info!("Actor {} invisibility expired", actor.id());
        true
    }

    /// Detection attempt (Reveal spell, Detect Hidden). Rolls the potion's
    /// reveal chance and clears the effect on success.
    pub fn attempt_detection<A, E, R>(
        &mut self,
        actor: &mut A,
        timers: &mut TimerQueue<E>,
        rng: &mut R,
    ) -> bool
    where
        A: Actor + ?Sized,
        R: Rng + ?Sized,
    {
        let chance = self.reveal_chance(actor.id());
        if chance == 0 || !rng.gen_bool(f64::from(chance.min(100)) / 100.0) {
            return false;
        }

        actor.send_message(HUE_ERROR, "You have been detected!".into());
        self.clear(actor, timers);
        info!("Actor {} detected ({}% reveal chance)", actor.id(), chance);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invisibility::test_support::*;
    use rand::rngs::mock::StepRng;
    use veil_shared::PotionKind;

    /// Rng whose every roll succeeds
    fn lucky() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Rng whose every roll fails
    fn unlucky() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_non_stealth_breaks_on_move() {
        for kind in PotionKind::ALL {
            let (mut registry, mut timers) = setup();
            let mut p = player(1);
            registry.grant(&mut p, &mut timers, kind, false, 0, secs(60));

            assert_eq!(registry.on_move(&mut p, &mut timers), MoveOutcome::Revealed);
            assert!(!registry.has_active_effect(1));
            assert!(!p.hidden);
            assert!(p.pending_texts().contains(&"You moved and were revealed!"));
            assert_eq!(timers.pending_count(), 0);
        }
    }

    #[test]
    fn test_regular_move_ends_lock() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        let lock = registry
            .grant(&mut p, &mut timers, PotionKind::Regular, false, 0, secs(60))
            .map(|r| r.action_lock())
            .unwrap();
        assert!(p.is_action_locked(lock));

        registry.on_move(&mut p, &mut timers);
        assert!(!p.is_action_locked(lock));
    }

    #[test]
    fn test_greater_survives_move_with_steps() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        registry.grant(&mut p, &mut timers, PotionKind::Greater, true, 4, secs(90));

        assert_eq!(
            registry.on_move(&mut p, &mut timers),
            MoveOutcome::Concealed { steps_left: 4 }
        );
        assert!(registry.has_active_effect(1));
        assert!(p.hidden);
    }

    #[test]
    fn test_low_steps_warning_keeps_effect() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        registry.grant(&mut p, &mut timers, PotionKind::Greater, true, 1, secs(90));

        assert_eq!(
            registry.on_move(&mut p, &mut timers),
            MoveOutcome::Warned { steps_left: 1 }
        );
        assert!(registry.has_active_effect(1));
        assert_eq!(
            p.pending_texts().last(),
            Some(&"One false move and you will be revealed!")
        );
    }

    #[test]
    fn test_steps_run_out() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        registry.grant(&mut p, &mut timers, PotionKind::Greater, true, 2, secs(90));

        assert_eq!(registry.consume_stealth_step(&mut p, &mut timers), StepOutcome::Remaining(1));
        assert_eq!(registry.get(1).map(|r| r.allowed_steps), Some(2));
        assert_eq!(registry.consume_stealth_step(&mut p, &mut timers), StepOutcome::Exhausted);
        assert!(!registry.has_active_effect(1));
        assert!(!p.hidden);
        assert_eq!(registry.consume_stealth_step(&mut p, &mut timers), StepOutcome::NoEffect);
    }

    #[test]
    fn test_step_consumption_ignores_non_stealth() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        registry.grant(&mut p, &mut timers, PotionKind::Lesser, false, 0, secs(30));

        assert_eq!(registry.consume_stealth_step(&mut p, &mut timers), StepOutcome::NoEffect);
        assert!(registry.has_active_effect(1));
    }

    #[test]
    fn test_action_always_breaks() {
        for kind in PotionKind::ALL {
            for stealth in [false, true] {
                let (mut registry, mut timers) = setup();
                let mut p = player(1);
                registry.grant(&mut p, &mut timers, kind, stealth, 6, secs(30));

                assert!(registry.on_action(&mut p, &mut timers, RevealCause::Other));
                assert!(!registry.has_active_effect(1));
                assert!(!p.hidden);
            }
        }
    }

    #[test]
    fn test_action_messages() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        assert!(!registry.on_action(&mut p, &mut timers, RevealCause::DrankPotion));
        assert!(p.pending_texts().is_empty());

        registry.grant(&mut p, &mut timers, PotionKind::Lesser, false, 0, secs(30));
        registry.on_action(&mut p, &mut timers, RevealCause::UsedItem("a lockpick".into()));
        assert!(p.pending_texts().contains(&"You used a lockpick and were revealed!"));
    }

    #[test]
    fn test_expiry_clears_effect() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        registry.grant(&mut p, &mut timers, PotionKind::Regular, false, 0, secs(60));

        assert!(timers.advance(secs(59)).is_empty());
        let fired = timers.advance(secs(1));
        assert_eq!(fired.len(), 1);
        let (handle, expiry) = fired[0];
        assert_eq!(expiry.0, 1);

        assert!(registry.on_expire(&mut p, &mut timers, handle));
        assert!(!registry.has_active_effect(1));
        assert!(p.pending_texts().contains(&"The invisibility effect has worn off!"));
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);

        let old_timer = registry
            .grant(&mut p, &mut timers, PotionKind::Lesser, false, 0, secs(30))
            .map(|r| r.timer)
            .unwrap();
        registry.clear(&mut p, &mut timers);
        registry.grant(&mut p, &mut timers, PotionKind::Greater, true, 8, secs(90));

        assert!(!registry.on_expire(&mut p, &mut timers, old_timer));
        assert!(registry.has_active_effect(1));
        assert!(timers.advance(secs(30)).is_empty());
    }

    #[test]
    fn test_detection_rolls_reveal_chance() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        assert!(!registry.attempt_detection(&mut p, &mut timers, &mut lucky()));

        registry.grant(&mut p, &mut timers, PotionKind::Greater, false, 0, secs(90));
        assert!(!registry.attempt_detection(&mut p, &mut timers, &mut unlucky()));
        assert!(registry.has_active_effect(1));

        assert!(registry.attempt_detection(&mut p, &mut timers, &mut lucky()));
        assert!(!registry.has_active_effect(1));
    }

    #[test]
    fn test_lesser_always_detected() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);
        registry.grant(&mut p, &mut timers, PotionKind::Lesser, false, 0, secs(30));
        assert!(registry.attempt_detection(&mut p, &mut timers, &mut unlucky()));
    }
}
