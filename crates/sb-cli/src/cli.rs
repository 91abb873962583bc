use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sb_board::{SoundId, StorageKey, TabId};

#[derive(Parser)]
#[command(
    name = "sb",
    about = "Soundboard: named audio clips organized into tabs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the board (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show tabs, sounds and the library
    Status(StatusArgs),
    /// Create, rename, remove or switch tabs
    Tab(TabArgs),
    /// Add an audio file to a tab
    Add(AddArgs),
    /// Manage reusable library content
    Library(LibraryArgs),
    /// Place a library entry into a tab
    Place(PlaceArgs),
    /// Change a placed sound
    Sound(SoundArgs),
    /// Set the master volume (0-100)
    Volume(VolumeArgs),
    /// Write the whole board to a portable file
    Export(ExportArgs),
    /// Replace the whole board with an exported file
    Import(ImportArgs),
    /// Delete stored content nothing refers to
    Gc(GcArgs),
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct TabArgs {
    #[command(subcommand)]
    pub action: TabAction,
}

#[derive(Subcommand)]
pub enum TabAction {
    New { name: Option<String> },
    Rename { tab: TabId, name: String },
    Rm { tab: TabId },
    Switch { tab: TabId },
}

#[derive(Args)]
pub struct AddArgs {
    pub tab: TabId,
    pub file: String,
    /// Play-only: kept for this process and never stored
    #[arg(long)]
    pub quick: bool,
}

#[derive(Args)]
pub struct LibraryArgs {
    #[command(subcommand)]
    pub action: LibraryAction,
}

#[derive(Subcommand)]
pub enum LibraryAction {
    Ls,
    Add {
        file: String,
        #[arg(long)]
        name: Option<String>,
    },
    Rename { key: StorageKey, name: String },
    Rm {
        key: StorageKey,
        /// Delete even if sounds still use it
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct PlaceArgs {
    pub tab: TabId,
    pub key: StorageKey,
}

#[derive(Args)]
pub struct SoundArgs {
    #[command(subcommand)]
    pub action: SoundAction,
}

#[derive(Subcommand)]
pub enum SoundAction {
    Rename { tab: TabId, sound: SoundId, name: String },
    Rm { tab: TabId, sound: SoundId },
    Volume {
        tab: TabId,
        sound: SoundId,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    Loop { tab: TabId, sound: SoundId },
    /// Move a sound to a zero-based position within its tab
    Move { tab: TabId, sound: SoundId, position: usize },
}

#[derive(Args)]
pub struct VolumeArgs {
    #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
    pub percent: u8,
}

#[derive(Args)]
pub struct ExportArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GcArgs {}
