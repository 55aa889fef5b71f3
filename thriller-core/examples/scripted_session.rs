//! Plays a few scripted turns without calling the Claude API.
//!
//! ```bash
//! cargo run -p thriller-core --example scripted_session
//! ```

use serde_json::json;
use std::sync::Arc;
use thriller_core::{BlockingSession, GameSession, ScriptedRuntime, ScriptedTurn, SessionConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Scripted Eternal Hunt session ===\n");

    let save_path = std::env::temp_dir().join("thriller_scripted_session.json");
    let runtime = Arc::new(ScriptedRuntime::new(vec![
        ScriptedTurn::narrative("Somewhere below, a truck idles. Your phone is on the nightstand.")
            .with_call("update_game_log", json!({"new_entry": "Woke to an idling truck"})),
        ScriptedTurn::narrative("The screen lights up: 2:14 AM, no signal.")
            .with_call(
                "add_player_item",
                json!({"item_name": "phone", "description": "Cracked screen, 12% battery"}),
            )
            .with_call(
                "update_game_log",
                json!({"new_entry": "Took the phone", "category": "item"}),
            ),
    ]));

    let config = SessionConfig::new().with_save_path(&save_path);
    let mut game = BlockingSession::new(GameSession::new(config, runtime))?;

    for action in ["I listen.", "I grab my phone."] {
        println!("> {action}");
        println!("{}\n", game.respond(action));
    }

    let state = game.snapshot()?;
    println!("Events logged: {}", state.game_log.len());
    for item in &state.items {
        println!("Carrying: {} ({})", item.name, item.description);
    }
    println!("Saved to {}", save_path.display());

    Ok(())
}
