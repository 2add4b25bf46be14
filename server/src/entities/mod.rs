//! Server-side entity definitions.

pub mod actor;
pub mod player;

pub use actor::{ActionLock, Actor, ActorId};
pub use player::{ActiveBuff, ServerPlayer, INVENTORY_SIZE};
