//! Line-oriented game loop.
//!
//! - Lines starting with `#` are commands (save, load, status, log, quit)
//! - Every other line is a player action sent through the router

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use thriller_core::content::{APP_DESC, APP_NAME, EXAMPLE_COMMANDS, TIP_TEXT};
use thriller_core::router::ChatTurn;
use thriller_core::{AutosaveStatus, GameSession, GameState, Router};

/// Entries shown by `#log`.
const LOG_TAIL: usize = 10;

/// Run the game loop until `#quit` or end of input.
pub async fn run(session: Arc<GameSession>) -> io::Result<()> {
    let router = Router::new(session.clone());
    let mut history: Vec<ChatTurn> = Vec::new();

    print_banner();

    let mut stdout = io::stdout();
    prompt(&mut stdout)?;

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            prompt(&mut stdout)?;
            continue;
        }

        // Handle commands
        if let Some(command) = line.strip_prefix('#') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            match parts.first().copied() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("save") => {
                    match session.save(parts.get(1).map(Path::new)).await {
                        Ok(path) => println!("[SAVED] Game saved to {}", path.display()),
                        Err(e) => println!("[ERROR] Save failed: {e}"),
                    }
                }
                Some("load") => {
                    match session.load(parts.get(1).map(Path::new)).await {
                        Ok(path) => {
                            history.clear();
                            println!("[LOADED] Game loaded from {}", path.display());
                            print_status(&session.snapshot().await);
                        }
                        Err(e) => println!("[ERROR] Load failed: {e}"),
                    }
                }
                Some("status") => {
                    print_status(&session.snapshot().await);
                    println!("  Turns this run: {}", session.turn_count());
                    match session.last_autosave().await {
                        Some(AutosaveStatus::Saved { path }) => {
                            println!("  Last autosave: {}", path.display())
                        }
                        Some(AutosaveStatus::Failed { path, error }) => {
                            println!("  Last autosave FAILED ({}): {error}", path.display())
                        }
                        None => println!("  Last autosave: none yet"),
                    }
                }
                Some("log") => print_log(&session.snapshot().await),
                Some("help") => print_help(),
                _ => {
                    println!("[ERROR] Unknown command. Type #help for help.");
                }
            }
            prompt(&mut stdout)?;
            continue;
        }

        // Send player input to the narrator
        print!("[PROCESSING]");
        stdout.flush()?;

        let reply = router.handle(line, &history).await;

        // Clear the processing indicator
        print!("\r            \r");
        println!("[NARRATOR]");
        for para in reply.split("\n\n") {
            println!("{para}");
        }
        println!();

        if let Some(AutosaveStatus::Failed { error, .. }) = session.last_autosave().await {
            println!("[WARNING] Autosave failed: {error}");
        }

        history.push((line.to_string(), reply));
        prompt(&mut stdout)?;
    }

    Ok(())
}

fn prompt(stdout: &mut io::Stdout) -> io::Result<()> {
    print!("> ");
    stdout.flush()
}

fn print_banner() {
    println!("=== {APP_NAME} ===");
    println!("{APP_DESC}");
    println!();
    println!("Try: {}", EXAMPLE_COMMANDS.join(" | "));
    println!("Tip: {TIP_TEXT}");
    println!("Type #help for commands.");
    println!();
}

fn print_help() {
    println!("[HELP]");
    println!("  #quit         - Exit the game");
    println!("  #save [path]  - Save the game");
    println!("  #load [path]  - Load a saved game");
    println!("  #status       - Show inventory and progress");
    println!("  #log          - Show the latest game log entries");
    println!("  #help         - Show this help");
    println!("  (anything else is sent as a player action)");
}

fn print_status(state: &GameState) {
    println!("[STATUS]");
    println!("  Events logged: {}", state.game_log.len());
    println!("  Research notes: {}", state.research_log.len());
    if state.items.is_empty() {
        println!("  Inventory: (empty)");
    } else {
        println!("  Inventory:");
        for item in &state.items {
            if item.description.is_empty() {
                println!("    - {}", item.name);
            } else {
                println!("    - {}: {}", item.name, item.description);
            }
        }
    }
}

fn print_log(state: &GameState) {
    println!("[LOG]");
    if state.game_log.is_empty() {
        println!("  (no events recorded yet)");
        return;
    }
    let skip = state.game_log.len().saturating_sub(LOG_TAIL);
    for entry in state.game_log.iter().skip(skip) {
        println!("  [{}] {}", entry.category, entry.entry);
    }
}
