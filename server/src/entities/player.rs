//! Server-side player entity.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use veil_shared::{
    get_item_by_id, AccessLevel, BuffIcon, InventorySlot, ServerMessage, SkillName, VisualEffect,
};

use super::actor::{ActionLock, Actor, ActorId};

/// Maximum inventory slots
pub const INVENTORY_SIZE: usize = 20;

/// Buff icon currently shown on the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveBuff {
    pub icon: BuffIcon,
    pub cliloc: u32,
    pub duration: Duration,
}

/// Server-side player state
#[derive(Debug)]
pub struct ServerPlayer {
    pub id: u64,
    pub name: String,
    pub access_level: AccessLevel,
    /// Tile position
    pub position: [i32; 2],
    pub hidden: bool,
    pub is_stealthing: bool,
    pub allowed_stealth_steps: u32,
    pub armor_rating: i32,
    pub warmode: bool,
    pub combatant: Option<u64>,
    pub health: u32,
    pub max_health: u32,
    pub skills: HashMap<SkillName, f64>,
    pub buffs: Vec<ActiveBuff>,
    pub inventory: Vec<Option<InventorySlot>>,
    action_locks: HashSet<ActionLock>,
    /// Messages waiting to be sent to this player's client
    outbox: Vec<ServerMessage>,
}

impl ServerPlayer {
    pub fn new(id: u64, name: String, access_level: AccessLevel) -> Self {
        Self {
            id,
            name,
            access_level,
            position: [0, 0],
            hidden: false,
            is_stealthing: false,
            allowed_stealth_steps: 0,
            armor_rating: 0,
            warmode: false,
            combatant: None,
            health: 100,
            max_health: 100,
            skills: HashMap::new(),
            buffs: Vec::new(),
            inventory: vec![None; INVENTORY_SIZE],
            action_locks: HashSet::new(),
            outbox: Vec::new(),
        }
    }

    pub fn set_skill(&mut self, skill: SkillName, value: f64) {
        self.skills.insert(skill, value);
    }

    pub fn has_buff(&self, icon: BuffIcon) -> bool {
        self.buffs.iter().any(|b| b.icon == icon)
    }

    pub fn is_action_locked(&self, lock: ActionLock) -> bool {
        self.action_locks.contains(&lock)
    }

    /// Move one tile. Stops at the edge of the coordinate space.
    pub fn step(&mut self, dx: i32, dy: i32) {
        self.position[0] = self.position[0].saturating_add(dx.signum());
        self.position[1] = self.position[1].saturating_add(dy.signum());
    }

    /// Take all queued outgoing messages
    pub fn take_messages(&mut self) -> Vec<ServerMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Queued system message texts (oldest first)
    pub fn pending_texts(&self) -> Vec<&str> {
        self.outbox.iter().filter_map(|m| m.text()).collect()
    }

    /// Add item to inventory, stacking if possible.
    /// Returns how many were added; anything that did not fit is dropped.
    pub fn add_to_inventory(&mut self, item_id: u32, quantity: u32) -> u32 {
        let max_stack = get_item_by_id(item_id).map(|i| i.max_stack).unwrap_or(1);

        let mut remaining = quantity;

        // Try to stack with existing items
        for inv_slot in self.inventory.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if inv_slot.item_id == item_id && inv_slot.quantity < max_stack {
                let can_add = (max_stack - inv_slot.quantity).min(remaining);
                inv_slot.quantity += can_add;
                remaining -= can_add;
            }
        }

        // Add to empty slots
        for slot in &mut self.inventory {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let add_amount = remaining.min(max_stack);
                *slot = Some(InventorySlot {
                    item_id,
                    quantity: add_amount,
                });
                remaining -= add_amount;
            }
        }

        quantity - remaining
    }

    /// Item id in a slot, if any
    pub fn item_in_slot(&self, slot: u8) -> Option<u32> {
        self.inventory
            .get(slot as usize)
            .and_then(|s| s.as_ref())
            .map(|s| s.item_id)
    }

    /// First slot holding `item_id`
    pub fn find_item(&self, item_id: u32) -> Option<u8> {
        self.inventory
            .iter()
            .position(|s| matches!(s, Some(inv) if inv.item_id == item_id))
            .map(|idx| idx as u8)
    }

    /// Total quantity of `item_id` across all slots
    pub fn count_item(&self, item_id: u32) -> u32 {
        self.inventory
            .iter()
            .flatten()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.quantity)
            .sum()
    }

    /// Remove one item from a slot
    pub fn consume_one(&mut self, slot: u8) -> Option<u32> {
        let slot_idx = slot as usize;
        let inv_slot = self.inventory.get_mut(slot_idx)?.as_mut()?;
        let item_id = inv_slot.item_id;

        inv_slot.quantity -= 1;
        if inv_slot.quantity == 0 {
            self.inventory[slot_idx] = None;
        }

        Some(item_id)
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = (self.health + amount).min(self.max_health);
    }
}

impl Actor for ServerPlayer {
    fn id(&self) -> ActorId {
        self.id
    }

    fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn set_hidden(&mut self, hidden: bool) {
        if self.hidden != hidden {
            self.hidden = hidden;
            self.outbox.push(ServerMessage::HiddenStateChanged {
                entity_id: self.id,
                hidden,
            });
        }
    }

    fn clear_combat(&mut self) {
        self.combatant = None;
        self.warmode = false;
    }

    fn set_stealthing(&mut self, stealthing: bool) {
        self.is_stealthing = stealthing;
    }

    fn allowed_stealth_steps(&self) -> u32 {
        self.allowed_stealth_steps
    }

    fn set_allowed_stealth_steps(&mut self, steps: u32) {
        if self.allowed_stealth_steps != steps {
            self.allowed_stealth_steps = steps;
            self.outbox.push(ServerMessage::StealthStepsUpdate {
                entity_id: self.id,
                steps,
            });
        }
    }

    fn base_skill(&self, skill: SkillName) -> f64 {
        self.skills.get(&skill).copied().unwrap_or(0.0)
    }

    fn armor_rating(&self) -> i32 {
        self.armor_rating
    }

    fn begin_action(&mut self, lock: ActionLock) -> bool {
        self.action_locks.insert(lock)
    }

    fn end_action(&mut self, lock: ActionLock) {
        self.action_locks.remove(&lock);
    }

    fn send_message(&mut self, hue: u16, text: String) {
        self.outbox.push(ServerMessage::SystemMessage { hue, text });
    }

    fn add_buff(&mut self, icon: BuffIcon, cliloc: u32, duration: Duration) {
        self.buffs.retain(|b| b.icon != icon);
        self.buffs.push(ActiveBuff {
            icon,
            cliloc,
            duration,
        });
        self.outbox.push(ServerMessage::BuffAdded {
            entity_id: self.id,
            icon,
            cliloc,
            duration_secs: duration.as_secs() as u32,
        });
    }

    fn remove_buff(&mut self, icon: BuffIcon) {
        let before = self.buffs.len();
        self.buffs.retain(|b| b.icon != icon);
        if self.buffs.len() != before {
            self.outbox.push(ServerMessage::BuffRemoved {
                entity_id: self.id,
                icon,
            });
        }
    }

    fn play_effect(&mut self, effect: VisualEffect) {
        self.outbox.push(ServerMessage::Effect {
            entity_id: self.id,
            effect,
        });
    }
}
