//! Protocol definitions shared between client and server.

use serde::{Deserialize, Serialize};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Server tick rate in Hz
pub const SERVER_TICK_RATE: u32 = 20;

// =============================================================================
// Message Hues
// =============================================================================

/// Red, used for rejections and reveals
pub const HUE_ERROR: u16 = 0x22;

/// Yellow, used for warnings
pub const HUE_WARNING: u16 = 0x35;

/// Cyan, used for successful potion effects
pub const HUE_INFO: u16 = 0x59;

// =============================================================================
// Actor Types
// =============================================================================

/// Access level of an account. Anything above `Player` is staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum AccessLevel {
    #[default]
    Player = 0,
    Counselor = 1,
    GameMaster = 2,
    Administrator = 3,
}

impl AccessLevel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Counselor => "Counselor",
            Self::GameMaster => "GameMaster",
            Self::Administrator => "Administrator",
        }
    }

    /// Staff accounts keep their own visibility state
    pub fn is_staff(&self) -> bool {
        *self > Self::Player
    }
}

/// Buff bar icons the client knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BuffIcon {
    HidingAndOrStealth = 0,
    Invisibility = 1,
}

/// Cosmetic effects played at an entity's location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualEffect {
    /// Particle burst drawn at the entity, raised by `z_offset`
    Particles {
        effect_id: u16,
        count: u8,
        speed: u8,
        duration: u16,
        z_offset: i8,
    },
    /// Sound played at the entity
    Sound { sound_id: u16 },
}

// =============================================================================
// Server Messages
// =============================================================================

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Colored system text shown to one player
    SystemMessage {
        hue: u16,
        text: String,
    },
    /// An entity became hidden or visible
    HiddenStateChanged {
        entity_id: u64,
        hidden: bool,
    },
    /// Add a buff icon with a countdown
    BuffAdded {
        entity_id: u64,
        icon: BuffIcon,
        cliloc: u32,
        duration_secs: u32,
    },
    /// Remove a buff icon
    BuffRemoved {
        entity_id: u64,
        icon: BuffIcon,
    },
    /// Play a cosmetic effect
    Effect {
        entity_id: u64,
        effect: VisualEffect,
    },
    /// Remaining stealth steps changed
    StealthStepsUpdate {
        entity_id: u64,
        steps: u32,
    },
}

impl ServerMessage {
    pub fn serialize(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Failed to serialize ServerMessage")
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    /// Text of a system message, if this is one
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::SystemMessage { text, .. } => Some(text),
            _ => None,
        }
    }
}
