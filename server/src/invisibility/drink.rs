use std::time::Duration;

use log::info;
use rand::Rng;
use veil_shared::{stealth_steps_for, PotionKind, SkillName, HUE_ERROR, HUE_INFO};

use crate::entities::Actor;
use crate::scheduler::TimerQueue;

use super::{
    InvisibilityExpiry, InvisibilityRegistry, DRINK_SOUND, INVISIBILITY_SOUND, SHIMMER_PARTICLES,
};

/// What happened when an actor drank an invisibility potion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrinkOutcome {
    /// An effect was already active; the potion must not be consumed
    Rejected,
    /// Invisible now. `stealth_steps` is 0 unless stealth movement was granted.
    Granted { stealth_steps: u32 },
}

impl DrinkOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

impl InvisibilityRegistry {
    /// Drink a potion of `kind`.
    ///
    /// Stealth movement is rolled once here (greater potions only, and only
    /// under the armor limit). The step budget comes from BASE Stealth and
    /// Hiding and is never refreshed afterwards.
    pub fn drink<A, E, R>(
        &mut self,
        actor: &mut A,
        timers: &mut TimerQueue<E>,
        kind: PotionKind,
        rng: &mut R,
    ) -> DrinkOutcome
    where
        A: Actor + ?Sized,
        E: From<InvisibilityExpiry>,
        R: Rng + ?Sized,
    {
        if self.has_active_effect(actor.id()) {
            actor.send_message(
                HUE_ERROR,
                "You cannot drink another invisibility potion yet.".into(),
            );
            return DrinkOutcome::Rejected;
        }

        let def = self.rules.definition(kind);
        let mut stealth_enabled = false;
        let mut stealth_steps = 0;

        if def.can_attempt_stealth {
            if actor.armor_rating() >= self.rules.max_stealth_armor_rating {
                actor.send_message(
                    HUE_ERROR,
                    "Your armor is too heavy to move stealthily!".into(),
                );
            } else if rng.gen_bool(def.stealth_success_chance) {
                stealth_enabled = true;
                stealth_steps = stealth_steps_for(
                    actor.base_skill(SkillName::Stealth),
                    actor.base_skill(SkillName::Hiding),
                );
            }
        }

        let duration = Duration::from_secs(u64::from(def.duration_secs));
        if self
            .grant(actor, timers, kind, stealth_enabled, stealth_steps, duration)
            .is_none()
        {
            return DrinkOutcome::Rejected;
        }

        actor.play_effect(DRINK_SOUND);
        actor.play_effect(SHIMMER_PARTICLES);
        actor.play_effect(INVISIBILITY_SOUND);

        let text = match (def.can_attempt_stealth, stealth_enabled) {
            (true, true) => format!(
                "You turn invisible and can sneak for up to {} steps! The effect will last {} seconds...",
                stealth_steps, def.duration_secs
            ),
            (true, false) => format!(
                "You turn invisible, but fail to master stealthy movement. The effect will last {} seconds...",
                def.duration_secs
            ),
            _ => format!(
                "You turn invisible! The effect will last {} seconds...",
                def.duration_secs
            ),
        };
        actor.send_message(HUE_INFO, text);

        info!(
            "Actor {} drank {} (stealth steps: {})",
            actor.id(),
            kind.name(),
            stealth_steps
        );
        DrinkOutcome::Granted { stealth_steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invisibility::test_support::*;
    use crate::invisibility::InvisibilityRules;
    use rand::rngs::mock::StepRng;

    fn lucky() -> StepRng {
        StepRng::new(0, 0)
    }

    fn unlucky() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_greater_with_stealth_85() {
        let (mut registry, mut timers) = setup();
        let mut p = skilled_player(1, 85.0, 0.0);

        let outcome = registry.drink(&mut p, &mut timers, PotionKind::Greater, &mut lucky());
        assert_eq!(outcome, DrinkOutcome::Granted { stealth_steps: 12 });

        let record = registry.get(1).unwrap();
        assert!(record.stealth_enabled);
        assert_eq!(record.allowed_steps, 12);
        assert_eq!(p.allowed_stealth_steps, 12);

        let text = p.pending_texts().last().unwrap().to_string();
        assert!(text.contains("12"));
        assert!(text.contains("90"));
    }

    #[test]
    fn test_elite_greater() {
        let (mut registry, mut timers) = setup();
        let mut p = skilled_player(1, 125.0, 125.0);

        let outcome = registry.drink(&mut p, &mut timers, PotionKind::Greater, &mut lucky());
        assert_eq!(outcome, DrinkOutcome::Granted { stealth_steps: 21 });
        assert_eq!(registry.get(1).map(|r| r.allowed_steps), Some(21));
    }

    #[test]
    fn test_second_drink_rejected() {
        let (mut registry, mut timers) = setup();
        let mut p = player(1);

        assert!(registry
            .drink(&mut p, &mut timers, PotionKind::Lesser, &mut lucky())
            .is_granted());
        let original = registry.get(1).cloned();

        let outcome = registry.drink(&mut p, &mut timers, PotionKind::Lesser, &mut lucky());
        assert_eq!(outcome, DrinkOutcome::Rejected);
        assert_eq!(timers.pending_count(), 1);
        assert_eq!(registry.get(1).cloned(), original);
        assert_eq!(
            p.pending_texts().last(),
            Some(&"You cannot drink another invisibility potion yet.")
        );
    }

    #[test]
    fn test_failed_roll_gives_plain_invisibility() {
        let (mut registry, mut timers) = setup();
        let mut p = skilled_player(1, 100.0, 100.0);

        let outcome = registry.drink(&mut p, &mut timers, PotionKind::Greater, &mut unlucky());
        assert_eq!(outcome, DrinkOutcome::Granted { stealth_steps: 0 });
        assert!(!registry.get(1).unwrap().stealth_enabled);
        assert!(p.hidden);
        assert!(p.pending_texts().last().unwrap().contains("fail to master"));
    }

    #[test]
    fn test_heavy_armor_blocks_stealth() {
        let (mut registry, mut timers) = setup();
        let mut p = skilled_player(1, 100.0, 100.0);
        p.armor_rating = 42;

        let outcome = registry.drink(&mut p, &mut timers, PotionKind::Greater, &mut lucky());
        assert_eq!(outcome, DrinkOutcome::Granted { stealth_steps: 0 });
        assert!(p
            .pending_texts()
            .contains(&"Your armor is too heavy to move stealthily!"));
        assert!(registry.has_active_effect(1));
    }

    #[test]
    fn test_armor_just_under_limit_allows_stealth() {
        let (mut registry, mut timers) = setup();
        let mut p = skilled_player(1, 100.0, 100.0);
        p.armor_rating = 41;

        let outcome = registry.drink(&mut p, &mut timers, PotionKind::Greater, &mut lucky());
        assert_eq!(outcome, DrinkOutcome::Granted { stealth_steps: 16 });
        assert!(registry.get(1).unwrap().stealth_enabled);
        assert!(!p
            .pending_texts()
            .contains(&"Your armor is too heavy to move stealthily!"));
    }

    #[test]
    fn test_lesser_and_regular_never_roll() {
        for kind in [PotionKind::Lesser, PotionKind::Regular] {
            let (mut registry, mut timers) = setup();
            let mut p = skilled_player(1, 120.0, 120.0);

            let outcome = registry.drink(&mut p, &mut timers, kind, &mut lucky());
            assert_eq!(outcome, DrinkOutcome::Granted { stealth_steps: 0 });
            let record = registry.get(1).unwrap();
            assert!(!record.stealth_enabled);
            assert_eq!(
                timers.remaining(record.timer),
                Some(secs(u64::from(kind.duration_secs())))
            );
        }
    }

    #[test]
    fn test_configured_stealth_chance() {
        let rules = InvisibilityRules {
            greater_stealth_chance: 0.0,
            ..InvisibilityRules::default()
        };
        let mut registry = InvisibilityRegistry::new(rules);
        let mut timers: Timers = Default::default();
        let mut p = skilled_player(1, 100.0, 100.0);

        let outcome = registry.drink(&mut p, &mut timers, PotionKind::Greater, &mut lucky());
        assert_eq!(outcome, DrinkOutcome::Granted { stealth_steps: 0 });
    }
}
