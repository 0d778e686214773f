use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use tomb_core::storage::DiskFileSystem;
use tomb_core::summary::SaveSummary;
use tomb_core::{GameFlow, GameSession};
use tomb_render::{
    JsonStyle, render_layout_json, render_layout_text, render_slots_json, render_slots_text,
    render_summary_json, render_summary_text,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Campaign description in JSON; the built-in campaign is used otherwise.
    #[arg(long, global = true, value_name = "PATH")]
    gameflow: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode the header of a save file.
    Summary {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
        /// Print the byte ranges of the decoded sections instead.
        #[arg(long)]
        layout: bool,
    },
    /// Print the level a slot was saved on.
    Level {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        #[arg(long)]
        slot: usize,
    },
    /// List every save slot in a directory.
    Scan {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let flow = load_gameflow(cli.gameflow.as_deref());

    match cli.command {
        Command::Summary { path, json, layout } => run_summary(&flow, &path, json, layout),
        Command::Level { dir, slot } => run_level(flow, &dir, slot),
        Command::Scan { dir, json } => run_scan(flow, &dir, json),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_gameflow(path: Option<&Path>) -> GameFlow {
    let Some(path) = path else {
        return GameFlow::default();
    };
    GameFlow::from_path(path).unwrap_or_else(|e| {
        eprintln!("Error loading gameflow {}: {e}", path.display());
        process::exit(1);
    })
}

fn run_summary(flow: &GameFlow, path: &Path, json: bool, layout: bool) {
    let bytes = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    debug!(file = %path.display(), len = bytes.len(), "decoding save summary");

    let summary = SaveSummary::decode(&bytes, flow.level_count()).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    });

    if layout {
        let layout = summary.layout();
        if json {
            print_json(&render_layout_json(&layout, JsonStyle::CanonicalV1));
        } else {
            print!("{}", render_layout_text(&layout));
        }
        return;
    }

    if json {
        print_json(&render_summary_json(&summary, flow, JsonStyle::CanonicalV1));
    } else {
        print!("{}", render_summary_text(&summary, flow));
    }
}

fn run_level(flow: GameFlow, dir: &Path, slot: usize) {
    let disk = DiskFileSystem::new(dir);
    let mut session = GameSession::new(flow);
    let level = session.load_header_only(&disk, slot).unwrap_or_else(|e| {
        eprintln!("Error loading slot {slot}: {e}");
        process::exit(1);
    });
    println!("{level} {}", session.flow.level_title(level as usize));
}

fn run_scan(flow: GameFlow, dir: &Path, json: bool) {
    if !dir.is_dir() {
        eprintln!("Error reading {}: not a directory", dir.display());
        process::exit(1);
    }

    let disk = DiskFileSystem::new(dir);
    let mut session = GameSession::new(flow);
    session.scan_saved_games(&disk);

    if json {
        print_json(&render_slots_json(&session.slots, JsonStyle::CanonicalV1));
    } else {
        print!("{}", render_slots_text(&session.slots));
    }
}

fn print_json(value: &JsonValue) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}
