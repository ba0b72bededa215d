#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Magic Tower in the terminal.

mod archive;
mod config;
mod input;
mod render;
mod script_ops;
mod tower_file;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use magic_tower_core::{Command, GameMode};
use magic_tower_world::{self as world, query, Services, World};
use tracing::debug;

use archive::JsonArchive;
use input::Input;
use script_ops::OpScriptHost;
use tower_file::TowerFile;

/// Upper bound on ticks spent by a single `walk` request.
const WALK_TICK_LIMIT: usize = 1024;

/// Terminal Magic Tower client.
#[derive(Debug, Parser)]
#[command(name = "magic-tower", version, about, long_about = None)]
struct Args {
    /// Tower description (JSON); the bundled demo tower is used when omitted.
    #[arg(long)]
    tower: Option<PathBuf>,
    /// Engine configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding saved games.
    #[arg(long, default_value = "saves")]
    saves: PathBuf,
}

/// Entry point for the Magic Tower command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = config::load(args.config.as_deref())?;
    let tower = TowerFile::load(args.tower.as_deref())?;
    let archives = JsonArchive::new(&args.saves)
        .with_context(|| format!("failed to prepare save directory {}", args.saves.display()))?;

    let world = World::new(tower.save, config).context("tower template is not playable")?;
    let mut client = Client {
        world,
        scripts: OpScriptHost::new(tower.scripts),
        archives,
    };
    client.run()
}

struct Client {
    world: World,
    scripts: OpScriptHost,
    archives: JsonArchive,
}

impl Client {
    fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", render::render(&self.world))?;

        for line in stdin.lock().lines() {
            let line = line.context("failed to read input")?;
            let default_archive = query::config(&self.world).default_archive.clone();
            match input::parse(&line, &default_archive) {
                Ok(Input::Commands(commands)) => {
                    for command in commands {
                        self.apply(command);
                    }
                }
                Ok(Input::Walk) => self.walk(),
                Ok(Input::Help) => {
                    writeln!(stdout, "{}", input::HELP)?;
                    continue;
                }
                Ok(Input::Exit) => break,
                Err(message) => {
                    writeln!(stdout, "{message}")?;
                    continue;
                }
            }

            writeln!(stdout, "{}", render::render(&self.world))?;
            if query::mode(&self.world) == GameMode::GameEnd {
                break;
            }
            stdout.flush()?;
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) {
        let mut events = Vec::new();
        let mut services = Services::new(&mut self.scripts, &mut self.archives);
        world::apply(&mut self.world, &mut services, command, &mut events);
        for event in &events {
            debug!(?event, "world event");
        }
    }

    fn walk(&mut self) {
        for _ in 0..WALK_TICK_LIMIT {
            if query::mode(&self.world) != GameMode::FindPath {
                break;
            }
            self.apply(Command::Tick);
        }
    }
}
