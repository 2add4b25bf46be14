//! Item definitions shared between client and server.

use serde::{Deserialize, Serialize};

use crate::PotionKind;

/// Item definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub item_type: ItemType,
    pub max_stack: u32,
    pub effect: Option<ItemEffect>,
}

/// Item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    /// Drunk on use
    Potion,
    /// Thrown at a target on use
    ThrowablePotion,
    Tool,
    Material,
    /// Pours a potion into an empty bottle on use. Quantity is doses held.
    Keg,
}

/// Effects that items can have
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemEffect {
    Invisibility(PotionKind),
    RestoreHealth(u32),
    Explode(u32),
    /// Item id handed out per dose
    Dispense(u32),
}

/// Inventory slot contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub item_id: u32,
    pub quantity: u32,
}

pub const LESSER_INVISIBILITY_POTION: u32 = 1;
pub const INVISIBILITY_POTION: u32 = 2;
pub const GREATER_INVISIBILITY_POTION: u32 = 3;
pub const HEAL_POTION: u32 = 4;
pub const EXPLOSION_POTION: u32 = 5;
pub const LOCKPICK: u32 = 6;
pub const EMPTY_BOTTLE: u32 = 7;
pub const HEAL_POTION_KEG: u32 = 8;
pub const INVISIBILITY_POTION_KEG: u32 = 9;

/// Item id of the invisibility potion of a given kind
pub fn invisibility_potion_id(kind: PotionKind) -> u32 {
    match kind {
        PotionKind::Lesser => LESSER_INVISIBILITY_POTION,
        PotionKind::Regular => INVISIBILITY_POTION,
        PotionKind::Greater => GREATER_INVISIBILITY_POTION,
    }
}

/// Built-in item definitions
pub fn get_item_definitions() -> Vec<ItemDef> {
    vec![
        ItemDef {
            id: LESSER_INVISIBILITY_POTION,
            name: PotionKind::Lesser.name().into(),
            description: "Brief invisibility. Any movement reveals you.".into(),
            item_type: ItemType::Potion,
            max_stack: 20,
            effect: Some(ItemEffect::Invisibility(PotionKind::Lesser)),
        },
        ItemDef {
            id: INVISIBILITY_POTION,
            name: PotionKind::Regular.name().into(),
            description: "Invisibility for a minute. Any movement reveals you.".into(),
            item_type: ItemType::Potion,
            max_stack: 20,
            effect: Some(ItemEffect::Invisibility(PotionKind::Regular)),
        },
        ItemDef {
            id: GREATER_INVISIBILITY_POTION,
            name: PotionKind::Greater.name().into(),
            description: "Long invisibility with a chance to move unseen.".into(),
            item_type: ItemType::Potion,
            max_stack: 20,
            effect: Some(ItemEffect::Invisibility(PotionKind::Greater)),
        },
        ItemDef {
            id: HEAL_POTION,
            name: "Heal Potion".into(),
            description: "Restores 20 health.".into(),
            item_type: ItemType::Potion,
            max_stack: 20,
            effect: Some(ItemEffect::RestoreHealth(20)),
        },
        ItemDef {
            id: EXPLOSION_POTION,
            name: "Explosion Potion".into(),
            description: "Throw it and stand back.".into(),
            item_type: ItemType::ThrowablePotion,
            max_stack: 20,
            effect: Some(ItemEffect::Explode(15)),
        },
        ItemDef {
            id: LOCKPICK,
            name: "Lockpick".into(),
            description: "Opens locks for the patient.".into(),
            item_type: ItemType::Tool,
            max_stack: 50,
            effect: None,
        },
        ItemDef {
            id: EMPTY_BOTTLE,
            name: "Empty Bottle".into(),
            description: "Left over after drinking a potion.".into(),
            item_type: ItemType::Material,
            max_stack: 99,
            effect: None,
        },
        ItemDef {
            id: HEAL_POTION_KEG,
            name: "Keg of Heal Potions".into(),
            description: "Fill an empty bottle from it.".into(),
            item_type: ItemType::Keg,
            max_stack: 100,
            effect: Some(ItemEffect::Dispense(HEAL_POTION)),
        },
        ItemDef {
            id: INVISIBILITY_POTION_KEG,
            name: "Keg of Invisibility Potions".into(),
            description: "Fill an empty bottle from it.".into(),
            item_type: ItemType::Keg,
            max_stack: 100,
            effect: Some(ItemEffect::Dispense(INVISIBILITY_POTION)),
        },
    ]
}

/// Get item by ID
pub fn get_item_by_id(id: u32) -> Option<ItemDef> {
    get_item_definitions().into_iter().find(|i| i.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kegs_dispense_potions() {
        for def in get_item_definitions().iter().filter(|d| d.item_type == ItemType::Keg) {
            let Some(ItemEffect::Dispense(potion_id)) = def.effect else {
                panic!("{} has no dispense effect", def.name);
            };
            let potion = get_item_by_id(potion_id).unwrap();
            assert_eq!(potion.item_type, ItemType::Potion);
        }
        assert!(matches!(
            get_item_by_id(INVISIBILITY_POTION_KEG).and_then(|d| d.effect),
            Some(ItemEffect::Dispense(INVISIBILITY_POTION))
        ));
    }
}
