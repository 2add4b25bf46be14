use std::collections::HashMap;
use std::time::Duration;

use log::debug;
use veil_shared::{BuffIcon, PotionKind};

use crate::entities::{ActionLock, Actor, ActorId};
use crate::scheduler::{TimerHandle, TimerQueue};

use super::{InvisibilityExpiry, InvisibilityRules, BUFF_CLILOC};

/// An active potion invisibility effect
#[derive(Debug, Clone, PartialEq)]
pub struct InvisibilityRecord {
    pub actor_id: ActorId,
    pub potion_kind: PotionKind,
    /// Rolled once on drink, never changes
    pub stealth_enabled: bool,
    /// Step budget computed on drink, never refreshed
    pub allowed_steps: u32,
    pub duration: Duration,
    /// Expiration timer owned by this record
    pub timer: TimerHandle,
}

impl InvisibilityRecord {
    pub fn reveal_chance(&self) -> u8 {
        self.potion_kind.reveal_chance()
    }

    pub fn action_lock(&self) -> ActionLock {
        ActionLock::InvisibilityPotion(self.potion_kind)
    }
}

/// Owner of every active potion invisibility effect
#[derive(Debug, Default)]
pub struct InvisibilityRegistry {
    records: HashMap<ActorId, InvisibilityRecord>,
    pub(super) rules: InvisibilityRules,
}

impl InvisibilityRegistry {
    pub fn new(rules: InvisibilityRules) -> Self {
        Self {
            records: HashMap::new(),
            rules,
        }
    }

    pub fn rules(&self) -> &InvisibilityRules {
        &self.rules
    }

    pub fn has_active_effect(&self, actor_id: ActorId) -> bool {
        self.records.contains_key(&actor_id)
    }

    pub fn get(&self, actor_id: ActorId) -> Option<&InvisibilityRecord> {
        self.records.get(&actor_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reveal chance (0-100) for detection attempts; 0 without an effect
    pub fn reveal_chance(&self, actor_id: ActorId) -> u8 {
        self.records
            .get(&actor_id)
            .map(|r| r.reveal_chance())
            .unwrap_or(0)
    }

    /// Make `actor` invisible and start the expiration timer.
    ///
    /// Returns `None` without touching anything if the actor already has an
    /// effect.
    pub fn grant<A, E>(
        &mut self,
        actor: &mut A,
        timers: &mut TimerQueue<E>,
        potion_kind: PotionKind,
        stealth_enabled: bool,
        allowed_steps: u32,
        duration: Duration,
    ) -> Option<&InvisibilityRecord>
    where
        A: Actor + ?Sized,
        E: From<InvisibilityExpiry>,
    {
        let actor_id = actor.id();
        if self.records.contains_key(&actor_id) {
            return None;
        }

        actor.set_hidden(true);
        actor.clear_combat();

        let allowed_steps = if stealth_enabled { allowed_steps } else { 0 };
        if stealth_enabled {
            actor.set_allowed_stealth_steps(allowed_steps);
            actor.set_stealthing(true);
        }

        actor.remove_buff(BuffIcon::HidingAndOrStealth);
        actor.add_buff(BuffIcon::Invisibility, BUFF_CLILOC, duration);

        let timer = timers.schedule_after(duration, InvisibilityExpiry(actor_id).into());

        let record = InvisibilityRecord {
            actor_id,
            potion_kind,
            stealth_enabled,
            allowed_steps,
            duration,
            timer,
        };
        actor.begin_action(record.action_lock());

        debug!(
            "Actor {} invisible via {:?} for {:?} (stealth: {}, steps: {})",
            actor_id, potion_kind, duration, stealth_enabled, allowed_steps
        );

        Some(&*self.records.entry(actor_id).or_insert(record))
    }

    /// End the actor's effect, if any.
    ///
    /// Stops the timer, resets stealth state, releases the drink lock and
    /// makes the actor visible again. Staff keep their hidden flag.
    pub fn clear<A, E>(&mut self, actor: &mut A, timers: &mut TimerQueue<E>) -> Option<InvisibilityRecord>
    where
        A: Actor + ?Sized,
    {
        let record = self.records.remove(&actor.id())?;

        timers.cancel(record.timer);

        actor.set_stealthing(false);
        actor.set_allowed_stealth_steps(0);
        actor.end_action(record.action_lock());
        actor.remove_buff(BuffIcon::Invisibility);

        if actor.is_hidden() && !actor.access_level().is_staff() {
            actor.set_hidden(false);
        }

        debug!("Actor {} invisibility cleared", record.actor_id);
        Some(record)
    }

    /// Drop every record for an actor that no longer exists
    pub fn forget<E>(&mut self, actor_id: ActorId, timers: &mut TimerQueue<E>) {
        if let Some(record) = self.records.remove(&actor_id) {
            timers.cancel(record.timer);
        }
    }
}
