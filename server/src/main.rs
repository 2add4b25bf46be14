//! Veil Server
//!
//! Runs the world tick loop and drives a single player from stdin commands.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use veil_server::commands;
use veil_server::config::ServerConfig;
use veil_server::world::GameWorld;
use veil_shared::PROTOCOL_VERSION;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServerConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return;
        }
    };

    info!("Starting Veil Server (protocol v{})...", PROTOCOL_VERSION);
    info!("Tick rate: {} Hz", config.tick_rate);

    let mut world = GameWorld::new(config.invisibility_rules());
    let player_id = world.spawn_player(config.console_player_name.clone(), config.console_access_level);
    let is_admin = config.console_access_level.is_staff();

    // Console input arrives on its own task so the tick loop never blocks
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read console input: {}", e);
                    break;
                }
            }
        }
    });

    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(config.tick_rate));
    let mut last_tick = Instant::now();
    let mut rng = rand::thread_rng();

    info!("Server started successfully! Type /help for commands, /quit to exit.");

    // Main game loop
    'tick: loop {
        let tick_start = Instant::now();

        // Process console commands
        loop {
            match rx.try_recv() {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "/quit" {
                        break 'tick;
                    }
                    match commands::parse_and_execute(line, player_id, is_admin, &mut world, &mut rng) {
                        Some(result) if result.success => println!("{}", result.message),
                        Some(result) => println!("Error: {}", result.message),
                        None => println!("Commands start with '/'. Try /help"),
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => break 'tick,
            }
        }

        // Update game world
        let delta = last_tick.elapsed();
        last_tick = Instant::now();
        for (id, message) in world.update(delta) {
            let bytes = message.serialize();
            debug!("-> player {}: {:?} ({} bytes)", id, message, bytes.len());
            if let Some(text) = message.text() {
                println!("[{}] {}", id, text);
            }
        }

        // Sleep until next tick
        let elapsed = tick_start.elapsed();
        if elapsed < tick_duration {
            tokio::time::sleep(tick_duration - elapsed).await;
        }
    }

    world.despawn_player(player_id);
    info!("Server shut down");
}
