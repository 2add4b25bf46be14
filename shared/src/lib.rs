pub mod protocol;
pub mod potions;
pub mod items;
pub mod skills;

pub use protocol::*;
pub use potions::*;
pub use items::*;
pub use skills::*;
