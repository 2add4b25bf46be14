//! Chat command system for admin and player commands.

use rand::Rng;
use veil_shared::{get_item_by_id, get_item_definitions, get_potion_definitions, PotionKind, SkillName};

use crate::invisibility::{DrinkOutcome, MoveOutcome};
use crate::world::{GameWorld, ItemUse};

/// Most tiles a single /move may walk
pub const MAX_MOVE_STEPS: u32 = 100;

/// Result of executing a command
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command was successful
    pub success: bool,
    /// Message to display to the user
    pub message: String,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Parse and execute a chat command
/// Returns None if it's not a command (doesn't start with /)
pub fn parse_and_execute<R: Rng + ?Sized>(
    content: &str,
    player_id: u64,
    is_admin: bool,
    world: &mut GameWorld,
    rng: &mut R,
) -> Option<CommandResult> {
    let rest = content.trim().strip_prefix('/')?;

    // Parse command and arguments
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.is_empty() {
        return Some(CommandResult::error("Invalid command"));
    }

    let command = parts[0].to_lowercase();
    let args = &parts[1..];

    // Execute command
    Some(match command.as_str() {
        // === All player commands ===
        "help" => cmd_help(is_admin),
        "items" => cmd_items(),
        "potions" => cmd_potions(),
        "pos" => cmd_pos(player_id, world),
        "status" => cmd_status(player_id, world),
        "drink" => cmd_drink(player_id, args, world, rng),
        "use" => cmd_use(player_id, args, world, rng),
        "move" | "m" => cmd_move(player_id, args, world),
        "hide" => cmd_use_skill(player_id, SkillName::Hiding, world, rng),
        "useskill" => match args.first().and_then(|a| SkillName::parse(a)) {
            Some(skill) => cmd_use_skill(player_id, skill, world, rng),
            None => CommandResult::error("Usage: /useskill <hiding|stealth|detect|lockpicking|alchemy>"),
        },
        "detect" => cmd_detect(player_id, args, world, rng),

        // === Admin-only commands ===
        "skill" => {
            if !is_admin {
                CommandResult::error("This command requires admin privileges")
            } else {
                cmd_skill(player_id, args, world)
            }
        }
        "armor" | "ar" => {
            if !is_admin {
                CommandResult::error("This command requires admin privileges")
            } else {
                cmd_armor(player_id, args, world)
            }
        }
        "give" => {
            if !is_admin {
                CommandResult::error("This command requires admin privileges")
            } else {
                cmd_give(player_id, args, world)
            }
        }

        _ => CommandResult::error(format!("Unknown command: /{}", command)),
    })
}

// =============================================================================
// All Player Commands
// =============================================================================

fn cmd_help(is_admin: bool) -> CommandResult {
    let mut help = String::from("Available commands:\n");
    help.push_str("  /help - Show this help message\n");
    help.push_str("  /items - List all items with IDs\n");
    help.push_str("  /potions - List invisibility potion variants\n");
    help.push_str("  /pos - Show your current position\n");
    help.push_str("  /status - Show invisibility and inventory\n");
    help.push_str("  /drink <lesser|regular|greater> - Drink an invisibility potion\n");
    help.push_str("  /use <slot> - Use the item in an inventory slot\n");
    help.push_str("  /move <n|s|e|w> [steps] - Walk up to 100 tiles\n");
    help.push_str("  /hide - Use the Hiding skill\n");
    help.push_str("  /useskill <name> - Use any skill\n");
    help.push_str("  /detect [player_id] - Search for a hidden player\n");

    if is_admin {
        help.push_str("\nAdmin commands:\n");
        help.push_str("  /skill <name> <value> - Set a base skill\n");
        help.push_str("  /armor <rating> - Set your armor rating\n");
        help.push_str("  /give <id> [qty] - Add item to inventory\n");
    }

    CommandResult::success(help)
}

fn cmd_items() -> CommandResult {
    let items = get_item_definitions();
    let mut msg = String::from("Items:\n");

    for item in items {
        msg.push_str(&format!("  [{}] {} - {}\n", item.id, item.name, item.description));
    }

    CommandResult::success(msg)
}

fn cmd_potions() -> CommandResult {
    let mut msg = String::from("Invisibility potions:\n");

    for def in get_potion_definitions() {
        msg.push_str(&format!(
            "  {} - {}s, reveal chance {}%",
            def.kind.name(),
            def.duration_secs,
            def.reveal_chance
        ));
        if def.can_attempt_stealth {
            msg.push_str(&format!(", stealth chance {:.0}%", def.stealth_success_chance * 100.0));
        }
        msg.push('\n');
    }

    CommandResult::success(msg)
}

fn cmd_pos(player_id: u64, world: &GameWorld) -> CommandResult {
    if let Some(player) = world.get_player(player_id) {
        CommandResult::success(format!(
            "Position: x={}, y={}",
            player.position[0], player.position[1]
        ))
    } else {
        CommandResult::error("Player not found")
    }
}

fn cmd_status(player_id: u64, world: &GameWorld) -> CommandResult {
    let Some(player) = world.get_player(player_id) else {
        return CommandResult::error("Player not found");
    };

    let mut msg = format!(
        "{} [{}] hidden={} armor={}\n",
        player.name,
        player.access_level.name(),
        player.hidden,
        player.armor_rating
    );

    match world.invisibility().get(player_id) {
        Some(record) => {
            let remaining = world
                .invisibility_remaining(player_id)
                .map(|d| d.as_secs_f32())
                .unwrap_or(0.0);
            msg.push_str(&format!(
                "Invisible ({}) for {:.1}s more, stealth={} steps left={}\n",
                record.potion_kind.name(),
                remaining,
                record.stealth_enabled,
                player.allowed_stealth_steps
            ));
        }
        None => msg.push_str("No active invisibility\n"),
    }

    for (slot, inv) in player.inventory.iter().enumerate() {
        if let Some(inv) = inv {
            let name = get_item_by_id(inv.item_id)
                .map(|i| i.name)
                .unwrap_or_else(|| format!("item {}", inv.item_id));
            msg.push_str(&format!("  slot {}: {} x{}\n", slot, name, inv.quantity));
        }
    }

    CommandResult::success(msg)
}

fn cmd_drink<R: Rng + ?Sized>(player_id: u64, args: &[&str], world: &mut GameWorld, rng: &mut R) -> CommandResult {
    let Some(kind) = args.first().and_then(|a| PotionKind::parse(a)) else {
        return CommandResult::error("Usage: /drink <lesser|regular|greater>");
    };

    match world.drink_potion(player_id, kind, rng) {
        Ok(DrinkOutcome::Granted { stealth_steps }) => {
            CommandResult::success(format!("Drank {} (stealth steps: {})", kind.name(), stealth_steps))
        }
        Ok(DrinkOutcome::Rejected) => CommandResult::error("An invisibility potion is already active"),
        Err(e) => CommandResult::error(e),
    }
}

fn cmd_use<R: Rng + ?Sized>(player_id: u64, args: &[&str], world: &mut GameWorld, rng: &mut R) -> CommandResult {
    let slot: u8 = match args.first().map(|a| a.parse()) {
        Some(Ok(s)) => s,
        _ => return CommandResult::error("Usage: /use <slot>"),
    };

    match world.use_item(player_id, slot, rng) {
        Ok(ItemUse::Drank(DrinkOutcome::Rejected)) => {
            CommandResult::error("An invisibility potion is already active")
        }
        Ok(ItemUse::Drank(_)) => CommandResult::success(format!("Drank the potion in slot {}", slot)),
        Ok(ItemUse::Used { revealed }) => CommandResult::success(if revealed {
            format!("Used slot {} (invisibility broken)", slot)
        } else {
            format!("Used slot {}", slot)
        }),
        Err(e) => CommandResult::error(e),
    }
}

fn cmd_move(player_id: u64, args: &[&str], world: &mut GameWorld) -> CommandResult {
    let (dx, dy) = match args.first().map(|a| a.to_lowercase()).as_deref() {
        Some("n") | Some("north") => (0, -1),
        Some("s") | Some("south") => (0, 1),
        Some("e") | Some("east") => (1, 0),
        Some("w") | Some("west") => (-1, 0),
        _ => return CommandResult::error("Usage: /move <n|s|e|w> [steps]"),
    };

    let steps: u32 = match args.get(1).map(|a| a.parse()) {
        None => 1,
        Some(Ok(n)) if (1..=MAX_MOVE_STEPS).contains(&n) => n,
        _ => return CommandResult::error(format!("Steps must be between 1 and {}", MAX_MOVE_STEPS)),
    };

    let mut last = MoveOutcome::NoEffect;
    for taken in 1..=steps {
        last = match world.move_player(player_id, dx, dy) {
            Ok(outcome) => outcome,
            Err(e) => return CommandResult::error(e),
        };
        if last == MoveOutcome::Revealed {
            return CommandResult::success(format!("Revealed after {} step(s)", taken));
        }
    }

    match last {
        MoveOutcome::Warned { steps_left } | MoveOutcome::Concealed { steps_left } => {
            CommandResult::success(format!("Moved {} step(s) unseen, {} left", steps, steps_left))
        }
        _ => CommandResult::success(format!("Moved {} step(s)", steps)),
    }
}

fn cmd_use_skill<R: Rng + ?Sized>(player_id: u64, skill: SkillName, world: &mut GameWorld, rng: &mut R) -> CommandResult {
    match world.use_skill(player_id, skill, rng) {
        Ok(true) => CommandResult::success(format!("{} succeeded", skill.name())),
        Ok(false) if skill == SkillName::Hiding => CommandResult::success(format!("{} failed", skill.name())),
        Ok(false) => CommandResult::success(format!("You use {}", skill.name())),
        Err(e) => CommandResult::error(e),
    }
}

fn cmd_detect<R: Rng + ?Sized>(player_id: u64, args: &[&str], world: &mut GameWorld, rng: &mut R) -> CommandResult {
    let target_id: u64 = match args.first().map(|a| a.parse()) {
        None => player_id,
        Some(Ok(id)) => id,
        Some(Err(_)) => return CommandResult::error("Invalid player ID"),
    };

    let chance = match world.detection_chance(player_id, target_id) {
        Ok(c) => c,
        Err(e) => return CommandResult::error(e),
    };
    match world.detect_player(player_id, target_id, rng) {
        Ok(true) => CommandResult::success(format!("Player {} detected ({}% chance)", target_id, chance)),
        Ok(false) => CommandResult::success(format!("Nothing found ({}% chance)", chance)),
        Err(e) => CommandResult::error(e),
    }
}

// =============================================================================
// Admin Commands
// =============================================================================

fn cmd_skill(player_id: u64, args: &[&str], world: &mut GameWorld) -> CommandResult {
    if args.len() < 2 {
        return CommandResult::error("Usage: /skill <name> <value>");
    }

    let Some(skill) = SkillName::parse(args[0]) else {
        return CommandResult::error(format!("Unknown skill: {}", args[0]));
    };

    let value: f64 = match args[1].parse() {
        Ok(v) if (0.0..=150.0).contains(&v) => v,
        _ => return CommandResult::error("Skill value must be between 0 and 150"),
    };

    if let Some(player) = world.get_player_mut(player_id) {
        player.set_skill(skill, value);
        CommandResult::success(format!("{} set to {:.1}", skill.name(), value))
    } else {
        CommandResult::error("Player not found")
    }
}

fn cmd_armor(player_id: u64, args: &[&str], world: &mut GameWorld) -> CommandResult {
    let rating: i32 = match args.first().map(|a| a.parse()) {
        Some(Ok(r)) if r >= 0 => r,
        _ => return CommandResult::error("Usage: /armor <rating>"),
    };

    if let Some(player) = world.get_player_mut(player_id) {
        player.armor_rating = rating;
        CommandResult::success(format!("Armor rating set to {}", rating))
    } else {
        CommandResult::error("Player not found")
    }
}

fn cmd_give(player_id: u64, args: &[&str], world: &mut GameWorld) -> CommandResult {
    if args.is_empty() {
        return CommandResult::error("Usage: /give <id> [qty]");
    }

    let item_id: u32 = match args[0].parse() {
        Ok(id) => id,
        Err(_) => return CommandResult::error("Invalid item ID"),
    };

    let quantity: u32 = match args.get(1).map(|a| a.parse()) {
        None => 1,
        Some(Ok(q)) if q >= 1 => q,
        _ => return CommandResult::error("Invalid quantity"),
    };

    let Some(item_def) = get_item_by_id(item_id) else {
        return CommandResult::error(format!("Item {} not found", item_id));
    };

    match world.add_item_to_player(player_id, item_id, quantity) {
        Ok(added) if added == quantity => CommandResult::success(format!("Added {}x {}", quantity, item_def.name)),
        Ok(0) => CommandResult::error("Your pack is full"),
        Ok(added) => CommandResult::error(format!(
            "Your pack is full: added {} of {}x {}",
            added, quantity, item_def.name
        )),
        Err(e) => CommandResult::error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invisibility::InvisibilityRules;
    use rand::rngs::mock::StepRng;
    use veil_shared::AccessLevel;

    fn run(world: &mut GameWorld, id: u64, line: &str) -> CommandResult {
        parse_and_execute(line, id, true, world, &mut StepRng::new(0, 0)).unwrap()
    }

    #[test]
    fn test_not_a_command() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::Player);
        assert!(parse_and_execute("hello", id, false, &mut world, &mut StepRng::new(0, 0)).is_none());
    }

    #[test]
    fn test_admin_gate() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::Player);
        let result = parse_and_execute("/skill stealth 90", id, false, &mut world, &mut StepRng::new(0, 0)).unwrap();
        assert!(!result.success);
    }

    #[test]
    fn test_greater_potion_session() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::GameMaster);

        assert!(run(&mut world, id, "/skill stealth 85").success);
        assert!(run(&mut world, id, "/give 3 2").success);

        let drink = run(&mut world, id, "/drink greater");
        assert!(drink.success, "{}", drink.message);
        assert!(drink.message.contains("12"));

        let again = run(&mut world, id, "/drink greater");
        assert!(!again.success);

        let walk = run(&mut world, id, "/move e 3");
        assert_eq!(walk.message, "Moved 3 step(s) unseen, 9 left");

        let status = run(&mut world, id, "/status");
        assert!(status.message.contains("steps left=9"));

        let walk = run(&mut world, id, "/move n 20");
        assert_eq!(walk.message, "Revealed after 9 step(s)");
        assert!(run(&mut world, id, "/drink greater").success);
    }

    #[test]
    fn test_detect_lesser() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::Player);
        world.add_item_to_player(id, veil_shared::LESSER_INVISIBILITY_POTION, 1).unwrap();

        let nothing = parse_and_execute("/detect", id, false, &mut world, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(nothing.message, "Nothing found (0% chance)");

        assert!(parse_and_execute("/use 0", id, false, &mut world, &mut StepRng::new(0, 0)).unwrap().success);
        let found = parse_and_execute("/detect 1", id, false, &mut world, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(found.message, "Player 1 detected (100% chance)");
        assert!(!world.invisibility().has_active_effect(id));
    }

    #[test]
    fn test_move_step_cap() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::Player);

        let too_far = run(&mut world, id, "/move e 200000000");
        assert!(!too_far.success);
        assert_eq!(too_far.message, "Steps must be between 1 and 100");
        assert_eq!(world.get_player(id).unwrap().position, [0, 0]);

        assert!(run(&mut world, id, "/move e 100").success);
        assert_eq!(world.get_player(id).unwrap().position, [100, 0]);
        assert!(!run(&mut world, id, "/move w 0").success);
    }

    #[test]
    fn test_give_reports_overflow() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::Administrator);

        let result = run(&mut world, id, "/give 6 5000");
        assert!(!result.success);
        assert_eq!(result.message, "Your pack is full: added 1000 of 5000x Lockpick");
        assert_eq!(run(&mut world, id, "/give 6").message, "Your pack is full");
    }

    #[test]
    fn test_useskill_breaks_invisibility() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::Player);
        world.add_item_to_player(id, veil_shared::INVISIBILITY_POTION, 1).unwrap();
        assert!(run(&mut world, id, "/drink regular").success);

        let result = run(&mut world, id, "/useskill lockpicking");
        assert_eq!(result.message, "You use Lockpicking");
        assert!(!world.invisibility().has_active_effect(id));
        assert!(world
            .get_player(id)
            .unwrap()
            .pending_texts()
            .contains(&"You used Lockpicking and were revealed!"));

        assert!(!run(&mut world, id, "/useskill juggling").success);
    }

    #[test]
    fn test_potions_listing() {
        let result = cmd_potions();
        assert!(result.success);
        assert_eq!(result.message.lines().count(), 4);
        assert!(result.message.contains("Greater Invisibility Potion - 90s, reveal chance 50%, stealth chance 50%"));
    }

    #[test]
    fn test_bad_arguments() {
        let mut world = GameWorld::new(InvisibilityRules::default());
        let id = world.spawn_player("Shade".into(), AccessLevel::Administrator);

        assert!(!run(&mut world, id, "/drink mana").success);
        assert!(!run(&mut world, id, "/use x").success);
        assert!(!run(&mut world, id, "/use 5").success);
        assert!(!run(&mut world, id, "/move up").success);
        assert!(!run(&mut world, id, "/give 999").success);
        assert!(!run(&mut world, id, "/bogus").success);
    }
}
