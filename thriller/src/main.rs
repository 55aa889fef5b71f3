//! Eternal Hunt terminal front end.
//!
//! Reads one player action per line, sends it to the narrator and prints the
//! reply. The game autosaves after every turn and resumes from the last
//! save on start.
//!
//! ```bash
//! cargo run -p thriller
//! cargo run -p thriller -- --save runs/alice.json --no-research
//! ```

mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use thriller_core::{ClaudeRuntime, GameSession, SessionConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options.
#[derive(Debug, Default)]
struct Options {
    save_path: Option<PathBuf>,
    fresh: bool,
    no_research: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--save" => {
                if let Some(path) = args.get(i + 1) {
                    options.save_path = Some(PathBuf::from(path));
                    i += 1;
                }
            }
            "--fresh" => options.fresh = true,
            "--no-research" => options.no_research = true,
            "-h" | "--help" => options.help = true,
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    options
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args);
    if options.help {
        print_help();
        return Ok(());
    }

    init_tracing();

    // Check for API key
    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Error: ANTHROPIC_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export ANTHROPIC_API_KEY=your_key_here");
        std::process::exit(1);
    }

    let mut config = SessionConfig::from_env().with_research_agent(!options.no_research);
    if let Some(path) = options.save_path {
        config = config.with_save_path(path);
    }

    let runtime = ClaudeRuntime::from_env()?.with_config(&config);
    let session = Arc::new(GameSession::new(config, Arc::new(runtime)));
    info!(save_path = %session.save_path().display(), "session ready");

    if !options.fresh {
        match session.autoload(None).await {
            Ok(true) => println!("[LOADED] Resumed from {}", session.save_path().display()),
            Ok(false) => {}
            Err(e) => {
                eprintln!("Error: could not resume from {}: {e}", session.save_path().display());
                eprintln!("Fix or move the file, or start over with --fresh.");
                std::process::exit(1);
            }
        }
    }

    repl::run(session).await?;
    Ok(())
}

fn print_help() {
    println!("{} v{}", thriller_core::content::APP_NAME, thriller_core::content::APP_VERSION);
    println!("{}", thriller_core::content::APP_DESC);
    println!();
    println!("USAGE:");
    println!("  thriller [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help        Show this help message");
    println!("  --save <PATH>     Save file (default: $THRILLER_SAVE_PATH or");
    println!("                    {})", thriller_core::persist::DEFAULT_SAVE_PATH);
    println!("  --fresh           Do not resume from the save file");
    println!("  --no-research     Run without the research agent");
    println!();
    println!("ENVIRONMENT:");
    println!("  ANTHROPIC_API_KEY     Required");
    println!("  THRILLER_SAVE_PATH    Save file override");
    println!("  THRILLER_MODEL        Model for both agents");
    println!("  THRILLER_MAX_TOKENS   Response token limit");
    println!("  THRILLER_TEMPERATURE  Sampling temperature (0.0 - 1.0)");
    println!("  RUST_LOG              Log filter (default: info)");
}
