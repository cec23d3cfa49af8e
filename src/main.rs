use std::fs::File;
use std::io::{stdin, stdout};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::{Parser, Subcommand};
use game_core::ledger::LeaderboardTable;
use game_core::prelude::*;
use see_color::console::{Console, ConsoleOptions};
use simplelog::{LevelFilter, WriteLogger};

#[derive(Debug, Parser)]
#[command(name = "see_color", version, about = "Spot the block whose color is slightly off")]
struct Cli {
    /// Write a debug log to debug.log
    #[arg(long, global = true)]
    debug: bool,
    /// Game configuration (TOML). Defaults apply when the file is missing.
    #[arg(long, global = true, default_value = "see_color.toml")]
    config: PathBuf,
    /// Record file. A bare file name lands in the user data directory.
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Keep records in memory only
    #[arg(long, global = true, conflicts_with = "data")]
    memory: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play in the terminal: every stdin line is a chat message
    Play {
        /// Seed for reproducible grids
        #[arg(long)]
        seed: Option<u64>,
        /// Directory for rendered grid images
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Skip the terminal preview of each grid
        #[arg(long)]
        no_preview: bool,
        #[arg(long, default_value = "console")]
        channel: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Print the leaderboard and exit
    Leaderboard,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.debug {
        setup_logging()?;
    }
    let config = load_config(&cli.config)?;
    let store = open_store(&cli)?;

    match cli.command.unwrap_or(Commands::Play {
        seed: None,
        out_dir: None,
        no_preview: false,
        channel: "console".to_string(),
        user: None,
    }) {
        Commands::Play {
            seed,
            out_dir,
            no_preview,
            channel,
            user,
        } => {
            let mut game = SeeColor::new(config, store, RasterRenderer)
                .context("setting up the game")?;
            if let Some(seed) = seed {
                log::info!("Seeding grids with {seed}");
                game = game.with_random_source(RngSource::seeded(seed));
            }
            let options = ConsoleOptions {
                channel,
                user: user.unwrap_or_else(default_user),
                out_dir,
                preview: !no_preview,
            };
            println!(
                "Type '{} start' to begin, '{} help' for commands. Ctrl-D quits.",
                game.config().command_prefix(),
                game.config().command_prefix()
            );
            Console::new(&game, options).run(stdin().lock(), &mut stdout(), now_millis)
        },
        Commands::Leaderboard => {
            let entries = ScoreLedger::new(store)
                .top_n(config.leaderboard_size())
                .context("reading the leaderboard")?;
            println!("{}", LeaderboardTable(&entries));
            Ok(())
        },
    }
}

fn setup_logging() -> anyhow::Result<()> {
    WriteLogger::init(
        LevelFilter::Debug,
        simplelog::ConfigBuilder::new()
            .set_target_level(LevelFilter::Error)
            .build(),
        File::create("debug.log").context("creating debug.log")?,
    )
    .context("installing the logger")
}

fn load_config(path: &Path) -> anyhow::Result<GameConfiguration> {
    if path.exists() {
        log::info!("Reading configuration from {path:?}");
        GameConfiguration::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        log::info!("No configuration at {path:?}, using defaults");
        Ok(GameConfiguration::default())
    }
}

fn open_store(cli: &Cli) -> anyhow::Result<Box<dyn Store>> {
    if cli.memory {
        return Ok(Box::new(MemoryStore::new()));
    }
    let store = match &cli.data {
        Some(path) => JsonFileStore::open(path),
        None => JsonFileStore::open_default(),
    }
    .context("opening the record file")?;
    log::info!("Keeping records in {:?}", store.path());
    Ok(Box::new(store))
}

fn default_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "player".to_string())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
