//! Invisibility potion server
//!
//! Authoritative simulation of potion invisibility, stealth movement and the
//! actions that reveal a hidden player.

pub mod commands;
pub mod config;
pub mod entities;
pub mod invisibility;
pub mod scheduler;
pub mod world;
