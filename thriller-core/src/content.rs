//! Story text and front-end copy.

/// Display name of the game.
pub const APP_NAME: &str = "Eternal Hunt: AI Agent Powered Game";

/// One-line pitch shown under the title.
pub const APP_DESC: &str = "You possess a rare gene for extreme longevity. Someone powerful wants it. Run, hide, survive.";

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Suggested first commands.
pub const EXAMPLE_COMMANDS: [&str; 4] = ["Look around", "Check phone", "Open the door", "Run outside"];

/// Hint shown when the player sends nothing.
pub const TIP_TEXT: &str = "\u{201c}Look around\u{201d}, \u{201c}Inventory\u{201d}, \u{201c}Open the door\u{201d}.";

/// The world brief given to the narrator.
pub const GAME_STORY: &str = include_str!("narrator/prompts/story.txt");
