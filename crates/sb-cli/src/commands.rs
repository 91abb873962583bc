use anyhow::{bail, Context};
use colored::Colorize;
use sb_board::source::name_from_locator;
use sb_board::{Board, BoardConfig, FileSource, SoundSource, TabId};
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    debug!(data_dir = %config.data_dir.display(), "resolved configuration");
    let (mut board, report) = Board::open(&config)
        .await
        .with_context(|| format!("opening board in {}", config.data_dir.display()))?;
    for notice in &report.notices {
        eprintln!("{} {notice}", "warning:".yellow().bold());
    }

    match cli.command {
        Command::Status(_) => cmd_status(&board),
        Command::Tab(args) => cmd_tab(&mut board, args).await,
        Command::Add(args) => cmd_add(&mut board, args).await,
        Command::Library(args) => cmd_library(&mut board, args).await,
        Command::Place(args) => {
            let id = board.add_from_library(args.tab, &args.key).await?;
            println!("{} Placed {} in tab {} as {}", "✓".green(), args.key.to_string().cyan(), args.tab, id.to_string().yellow());
            Ok(())
        }
        Command::Sound(args) => cmd_sound(&mut board, args).await,
        Command::Volume(args) => {
            board.set_master_volume(f64::from(args.percent) / 100.0)?;
            println!("{} Master volume {}%", "✓".green(), args.percent);
            Ok(())
        }
        Command::Export(args) => {
            let doc = board.export_all().await?;
            std::fs::write(&args.file, doc.to_json()?)
                .with_context(|| format!("writing {}", args.file.display()))?;
            println!("{} Exported {} file(s) to {}", "✓".green(), doc.files.len(), args.file.display().to_string().bold());
            Ok(())
        }
        Command::Import(args) => {
            let text = std::fs::read_to_string(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            let (imported, loaded) = board.import_json(&text).await?;
            for skipped in &imported.skipped {
                eprintln!("{} skipped unreadable file {}", "warning:".yellow().bold(), skipped);
            }
            for notice in &loaded.notices {
                eprintln!("{} {notice}", "warning:".yellow().bold());
            }
            println!("{} Imported {} file(s)", "✓".green().bold(), imported.restored.len());
            Ok(())
        }
        Command::Gc(_) => {
            let removed = board.sweep().await?;
            println!("{} GC: {} blob(s) removed.", "✓".green(), removed.len());
            Ok(())
        }
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<BoardConfig> {
    let mut config = match &cli.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn cmd_status(board: &Board) -> anyhow::Result<()> {
    let ws = board.workspace();
    println!("Master volume: {}%", percent(ws.master_volume()).to_string().bold());
    for tab in board.list_tabs() {
        let marker = if tab.id == board.active_tab() { "*".green().bold() } else { " ".normal() };
        println!("{marker} [{}] {} ({} sounds)", tab.id, tab.name.bold(), tab.sounds.len());
        for s in &tab.sounds {
            let key = s.storage_key.as_ref().map(|k| k.to_string()).unwrap_or_else(|| "quick".into());
            let looping = if s.looping { " loop".blue().to_string() } else { String::new() };
            println!("    {}  {}  {}  {}%{looping}", s.id.to_string().yellow(), s.display_name, key.dimmed(), percent(s.volume));
        }
    }
    println!("\nLibrary ({}):", board.list_library().len());
    for entry in board.list_library() {
        let uses = board.library_references(&entry.key).len();
        println!("    {}  {}  ({uses} placed)", entry.key.to_string().cyan(), entry.display_name);
    }
    Ok(())
}

async fn cmd_tab(board: &mut Board, args: TabArgs) -> anyhow::Result<()> {
    match args.action {
        TabAction::New { name } => {
            let id = board.create_tab(name.as_deref().unwrap_or_default())?;
            println!("{} Created tab {}", "✓".green(), id.to_string().yellow());
        }
        TabAction::Rename { tab, name } => {
            if board.rename_tab(tab, &name)? {
                println!("{} Renamed tab {} to {}", "✓".green(), tab, name.bold());
            } else {
                println!("Nothing renamed.");
            }
        }
        TabAction::Rm { tab } => {
            let removed = board.remove_tab(tab).await?;
            println!("{} Removed tab {} ({} blob(s) freed)", "✓".green(), tab, removed.len());
        }
        TabAction::Switch { tab } => {
            board.switch_active(tab)?;
            println!("Switched to tab {}", tab.to_string().yellow().bold());
        }
    }
    Ok(())
}

async fn cmd_add(board: &mut Board, args: AddArgs) -> anyhow::Result<()> {
    let id = board
        .add_sound_from_source(args.tab, &FileSource, &args.file, args.quick)
        .await?;
    println!("{} Added {} to tab {}", "✓".green(), id.to_string().yellow(), args.tab);
    if args.quick {
        println!("  {}", "quick-play sounds end with this process".dimmed());
    }
    Ok(())
}

async fn cmd_library(board: &mut Board, args: LibraryArgs) -> anyhow::Result<()> {
    match args.action {
        LibraryAction::Ls => {
            for entry in board.list_library() {
                println!("{}  {}", entry.key.to_string().cyan(), entry.display_name);
            }
        }
        LibraryAction::Add { file, name } => {
            let content = FileSource.fetch(&file).await?;
            if !content.is_audio() {
                bail!("{file} is not audio ({})", content.media_type);
            }
            let name = name.unwrap_or_else(|| name_from_locator(&file));
            let key = board.add_to_library(content, &name).await?;
            println!("{} Added {} as {}", "✓".green(), name.bold(), key.to_string().cyan());
        }
        LibraryAction::Rename { key, name } => {
            if board.rename_library_entry(&key, &name)? {
                println!("{} Renamed {} to {}", "✓".green(), key.to_string().cyan(), name.bold());
            } else {
                println!("Nothing renamed.");
            }
        }
        LibraryAction::Rm { key, yes } => {
            let references = board.library_references(&key);
            if !references.is_empty() && !yes {
                println!("{} is still placed in:", key.to_string().cyan());
                for (tab, sound) in &references {
                    println!("    tab {tab}: {sound}");
                }
                bail!("refusing to delete a library entry in use; pass --yes to delete anyway");
            }
            let deletion = board.delete_library_entry(&key).await?;
            let outcome = if deletion.blob_removed { "content deleted" } else { "content kept for placed sounds" };
            println!("{} Removed {} ({outcome})", "✓".green(), key.to_string().cyan());
        }
    }
    Ok(())
}

async fn cmd_sound(board: &mut Board, args: SoundArgs) -> anyhow::Result<()> {
    match args.action {
        SoundAction::Rename { tab, sound, name } => {
            board.rename_sound(tab, &sound, &name)?;
            println!("{} Renamed {}", "✓".green(), sound.to_string().yellow());
        }
        SoundAction::Rm { tab, sound } => {
            let removed = board.remove_sound(tab, &sound).await?;
            println!("{} Removed {} ({} blob(s) freed)", "✓".green(), sound.to_string().yellow(), removed.len());
        }
        SoundAction::Volume { tab, sound, percent } => {
            board.set_sound_volume(tab, &sound, f64::from(percent) / 100.0)?;
            println!("{} {} volume {}%", "✓".green(), sound.to_string().yellow(), percent);
        }
        SoundAction::Loop { tab, sound } => {
            let on = board.toggle_loop(tab, &sound)?;
            println!("{} {} loop {}", "✓".green(), sound.to_string().yellow(), if on { "on" } else { "off" });
        }
        SoundAction::Move { tab, sound, position } => {
            let mut order = tab_sounds(board, tab)?;
            let Some(from) = order.iter().position(|id| id == &sound) else {
                bail!("no sound {sound} in tab {tab}");
            };
            let id = order.remove(from);
            order.insert(position.min(order.len()), id);
            board.reorder_sounds(tab, &order)?;
            println!("{} Moved {} to position {}", "✓".green(), sound.to_string().yellow(), position);
        }
    }
    Ok(())
}

fn tab_sounds(board: &Board, tab: TabId) -> anyhow::Result<Vec<sb_board::SoundId>> {
    match board.workspace().tab(tab) {
        Some(t) => Ok(t.sound_ids()),
        None => bail!("no tab {tab}"),
    }
}

fn percent(volume: f64) -> u32 {
    (volume * 100.0).round() as u32
}
