//! Game world management.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use veil_shared::{
    get_item_by_id, AccessLevel, BuffIcon, ItemEffect, ItemType, PotionKind, ServerMessage,
    SkillName, VisualEffect, EMPTY_BOTTLE, HUE_ERROR, HUE_INFO, HUE_WARNING,
};

use crate::entities::{Actor, ServerPlayer};
use crate::invisibility::{
    DrinkOutcome, InvisibilityExpiry, InvisibilityRegistry, InvisibilityRules, MoveOutcome,
    RevealCause, StepOutcome,
};
use crate::scheduler::TimerQueue;

/// Localized buff text id for skill-based hiding
const HIDING_BUFF_CLILOC: u32 = 1075655;

const KEG_POUR_SOUND: VisualEffect = VisualEffect::Sound { sound_id: 0x240 };

/// Events scheduled on the world's timer queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldTimer {
    InvisibilityExpired(InvisibilityExpiry),
}

impl From<InvisibilityExpiry> for WorldTimer {
    fn from(expiry: InvisibilityExpiry) -> Self {
        Self::InvisibilityExpired(expiry)
    }
}

/// Result of using an inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUse {
    /// An invisibility potion was drunk (or refused)
    Drank(DrinkOutcome),
    /// Any other item. `revealed` is true if it broke potion invisibility.
    Used { revealed: bool },
}

/// The game world containing all players and their effects
pub struct GameWorld {
    players: HashMap<u64, ServerPlayer>,
    invisibility: InvisibilityRegistry,
    timers: TimerQueue<WorldTimer>,
    next_player_id: u64,
}

impl GameWorld {
    pub fn new(rules: InvisibilityRules) -> Self {
        Self {
            players: HashMap::new(),
            invisibility: InvisibilityRegistry::new(rules),
            timers: TimerQueue::new(),
            next_player_id: 1,
        }
    }

    /// Spawn a new player and return its runtime id
    pub fn spawn_player(&mut self, name: String, access_level: AccessLevel) -> u64 {
        let id = self.next_player_id;
        self.next_player_id += 1;

        info!("Player {} ({}) spawned as {}", id, name, access_level.name());
        self.players.insert(id, ServerPlayer::new(id, name, access_level));
        id
    }

    /// Despawn a player, ending any effect first so no timer outlives it
    pub fn despawn_player(&mut self, id: u64) {
        if let Some(mut player) = self.players.remove(&id) {
            self.invisibility.clear(&mut player, &mut self.timers);
            info!("Player {} despawned", id);
        }
        self.invisibility.forget(id, &mut self.timers);
    }

    /// Get a player by ID
    pub fn get_player(&self, id: u64) -> Option<&ServerPlayer> {
        self.players.get(&id)
    }

    /// Get a mutable reference to a player by ID
    pub fn get_player_mut(&mut self, id: u64) -> Option<&mut ServerPlayer> {
        self.players.get_mut(&id)
    }

    pub fn invisibility(&self) -> &InvisibilityRegistry {
        &self.invisibility
    }

    /// Seconds left on a player's invisibility, if any
    pub fn invisibility_remaining(&self, player_id: u64) -> Option<Duration> {
        let record = self.invisibility.get(player_id)?;
        self.timers.remaining(record.timer)
    }

    /// Add item to a player's inventory (for dev commands).
    /// Returns how many fit in the pack.
    pub fn add_item_to_player(&mut self, player_id: u64, item_id: u32, quantity: u32) -> Result<u32, &'static str> {
        let player = self.players.get_mut(&player_id).ok_or("Player not found")?;
        Ok(player.add_to_inventory(item_id, quantity))
    }

    /// Use the item in an inventory slot
    pub fn use_item<R: Rng + ?Sized>(&mut self, player_id: u64, slot: u8, rng: &mut R) -> Result<ItemUse, &'static str> {
        let player = self.players.get_mut(&player_id).ok_or("Player not found")?;
        let item_id = player.item_in_slot(slot).ok_or("That slot is empty")?;
        let item_def = get_item_by_id(item_id).ok_or("Unknown item")?;

        match item_def.effect {
            Some(ItemEffect::Invisibility(kind)) => {
                let outcome = self.invisibility.drink(player, &mut self.timers, kind, rng);
                if outcome.is_granted() {
                    player.consume_one(slot);
                    give_empty_bottle(player);
                }
                return Ok(ItemUse::Drank(outcome));
            }
            Some(ItemEffect::Dispense(potion_id)) => {
                let revealed = self.pour_from_keg(player_id, slot, potion_id)?;
                return Ok(ItemUse::Used { revealed });
            }
            _ => {}
        }

        let cause = match item_def.item_type {
            ItemType::Potion => RevealCause::DrankPotion,
            ItemType::ThrowablePotion => RevealCause::ThrewPotion,
            ItemType::Tool | ItemType::Material | ItemType::Keg => {
                RevealCause::UsedItem(format!("a {}", item_def.name.to_lowercase()))
            }
        };
        let revealed = self.invisibility.on_action(player, &mut self.timers, cause);

        match item_def.effect {
            Some(ItemEffect::RestoreHealth(amount)) => {
                player.heal(amount);
                player.consume_one(slot);
                give_empty_bottle(player);
            }
            Some(ItemEffect::Explode(_)) => {
                player.consume_one(slot);
            }
            _ => {}
        }

        debug!("Player {} used item {} (revealed: {})", player_id, item_id, revealed);
        Ok(ItemUse::Used { revealed })
    }

    /// Fill an empty bottle from the keg in `keg_slot`.
    ///
    /// Taking anything but an invisibility potion breaks potion invisibility.
    fn pour_from_keg(&mut self, player_id: u64, keg_slot: u8, potion_id: u32) -> Result<bool, &'static str> {
        let player = self.players.get_mut(&player_id).ok_or("Player not found")?;
        let bottle_slot = player.find_item(EMPTY_BOTTLE).ok_or("You need an empty bottle")?;

        player.consume_one(bottle_slot);
        if player.add_to_inventory(potion_id, 1) == 0 {
            player.add_to_inventory(EMPTY_BOTTLE, 1);
            return Err("You don't have room for the filled bottle");
        }
        player.consume_one(keg_slot);

        player.send_message(HUE_INFO, "You pour some of the keg's contents into an empty bottle and place it in your pack.".into());
        player.play_effect(KEG_POUR_SOUND);
        if player.item_in_slot(keg_slot).is_none() {
            player.send_message(HUE_INFO, "The keg is now empty.".into());
        }

        let took_invisibility = matches!(
            get_item_by_id(potion_id).and_then(|d| d.effect),
            Some(ItemEffect::Invisibility(_))
        );
        if took_invisibility {
            return Ok(false);
        }
        Ok(self
            .invisibility
            .on_action(player, &mut self.timers, RevealCause::TookFromKeg))
    }

    /// Drink the first invisibility potion of `kind` in the player's pack
    pub fn drink_potion<R: Rng + ?Sized>(&mut self, player_id: u64, kind: PotionKind, rng: &mut R) -> Result<DrinkOutcome, &'static str> {
        let player = self.players.get(&player_id).ok_or("Player not found")?;
        let slot = player
            .find_item(veil_shared::invisibility_potion_id(kind))
            .ok_or("You have no such potion")?;

        match self.use_item(player_id, slot, rng)? {
            ItemUse::Drank(outcome) => Ok(outcome),
            ItemUse::Used { .. } => Err("That is not an invisibility potion"),
        }
    }

    /// Move a player one tile.
    ///
    /// Stealth effects spend a step first, so the low-steps warning arrives
    /// with one step left and the following step reveals. A player hidden by
    /// skill without stealth is revealed by any step.
    pub fn move_player(&mut self, player_id: u64, dx: i32, dy: i32) -> Result<MoveOutcome, &'static str> {
        let player = self.players.get_mut(&player_id).ok_or("Player not found")?;
        player.step(dx, dy);

        if self.invisibility.consume_stealth_step(player, &mut self.timers) == StepOutcome::Exhausted {
            return Ok(MoveOutcome::Revealed);
        }

        match self.invisibility.on_move(player, &mut self.timers) {
            MoveOutcome::NoEffect if is_skill_hidden(player) && !player.is_stealthing => {
                reveal_skill_hidden(player, "You moved and were revealed!");
                info!("Player {} revealed by movement out of hiding", player_id);
                Ok(MoveOutcome::Revealed)
            }
            outcome => Ok(outcome),
        }
    }

    /// Use a skill. Always breaks potion invisibility; Hiding then gets its
    /// own skill check. Returns true if the player ended up hidden.
    pub fn use_skill<R: Rng + ?Sized>(&mut self, player_id: u64, skill: SkillName, rng: &mut R) -> Result<bool, &'static str> {
        let player = self.players.get_mut(&player_id).ok_or("Player not found")?;
        self.invisibility
            .on_action(player, &mut self.timers, RevealCause::UsedSkill(skill));

        if skill != SkillName::Hiding {
            return Ok(false);
        }

        let chance = (player.base_skill(SkillName::Hiding) / 100.0).clamp(0.0, 1.0);
        if rng.gen_bool(chance) {
            player.set_hidden(true);
            player.add_buff(BuffIcon::HidingAndOrStealth, HIDING_BUFF_CLILOC, Duration::ZERO);
            player.send_message(HUE_INFO, "You have hidden yourself well.".into());
            Ok(true)
        } else {
            player.set_hidden(false);
            player.send_message(HUE_ERROR, "You can't seem to hide right now.".into());
            Ok(false)
        }
    }

    /// Chance (0-100) that `detector_id` uncovers `target_id`.
    ///
    /// Potion effects use the potion's reveal chance. Skill hiding pits the
    /// detector's Detect Hidden against the target's Hiding: 50% when equal,
    /// one point per skill point of difference.
    pub fn detection_chance(&self, detector_id: u64, target_id: u64) -> Result<u8, &'static str> {
        let detector = self.players.get(&detector_id).ok_or("Player not found")?;
        let target = self.players.get(&target_id).ok_or("Player not found")?;

        if self.invisibility.has_active_effect(target_id) {
            return Ok(self.invisibility.reveal_chance(target_id));
        }
        if !is_skill_hidden(target) {
            return Ok(0);
        }

        let edge = detector.base_skill(SkillName::DetectHidden) - target.base_skill(SkillName::Hiding);
        Ok((50.0 + edge).clamp(0.0, 100.0).round() as u8)
    }

    /// A detection attempt by one player against another (Reveal spell, Detect Hidden)
    pub fn detect_player<R: Rng + ?Sized>(&mut self, detector_id: u64, target_id: u64, rng: &mut R) -> Result<bool, &'static str> {
        let chance = self.detection_chance(detector_id, target_id)?;
        let target = self.players.get_mut(&target_id).ok_or("Player not found")?;

        if self.invisibility.has_active_effect(target_id) {
            return Ok(self.invisibility.attempt_detection(target, &mut self.timers, rng));
        }
        if chance == 0 || !rng.gen_bool(f64::from(chance) / 100.0) {
            return Ok(false);
        }

        reveal_skill_hidden(target, "You have been detected!");
        info!("Player {} found player {} ({}% chance)", detector_id, target_id, chance);
        Ok(true)
    }

    /// Update the world (called every tick).
    /// Fires due timers and returns every player's queued messages.
    pub fn update(&mut self, delta: Duration) -> Vec<(u64, ServerMessage)> {
        for (handle, event) in self.timers.advance(delta) {
            match event {
                WorldTimer::InvisibilityExpired(InvisibilityExpiry(actor_id)) => {
                    if let Some(player) = self.players.get_mut(&actor_id) {
                        self.invisibility.on_expire(player, &mut self.timers, handle);
                    }
                }
            }
        }

        self.drain_messages()
    }

    /// Take every player's queued messages
    pub fn drain_messages(&mut self) -> Vec<(u64, ServerMessage)> {
        let mut messages = Vec::new();
        for player in self.players.values_mut() {
            let id = player.id;
            messages.extend(player.take_messages().into_iter().map(|m| (id, m)));
        }
        messages
    }
}

/// Hidden without a potion effect, so by the Hiding skill. Staff are exempt.
fn is_skill_hidden(player: &ServerPlayer) -> bool {
    player.hidden && !player.access_level.is_staff()
}

fn reveal_skill_hidden(player: &mut ServerPlayer, text: &str) {
    player.set_hidden(false);
    player.remove_buff(BuffIcon::HidingAndOrStealth);
    player.send_message(HUE_ERROR, text.into());
}

/// Put the bottle left over from a drink back in the pack
fn give_empty_bottle(player: &mut ServerPlayer) {
    if player.add_to_inventory(EMPTY_BOTTLE, 1) == 0 {
        player.send_message(HUE_WARNING, "Your pack is full, the empty bottle is lost.".into());
    }
}
