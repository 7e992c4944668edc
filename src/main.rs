use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use notes_cache::commands::{open_hit, refresh, startup_init};
use notes_cache::persist::FsAdapter;
use notes_cache::NotesMutex;

#[derive(Parser)]
#[command(name = "notes-cache", about = "Index cache and hit navigation for a folder of markdown notes")]
struct Cli {
    /// Vault folder holding the notes.
    #[arg(long, default_value = ".")]
    vault: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-index new and modified notes, drop deleted ones.
    Refresh,
    /// Show how many notes are cached.
    Stats,
    /// List link targets that have no note yet.
    Dangling,
    /// Empty the cache (and the persisted file, if enabled).
    Clear,
    /// Open a note at the first occurrence of any of the given words.
    Open {
        path: String,
        #[arg(required = true)]
        words: Vec<String>,
        #[arg(long)]
        new_pane: bool,
        /// Also open the note with the system's default application.
        #[arg(long)]
        launch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    notes_cache::init_tracing();
    let cli = Cli::parse();

    let state = NotesMutex::new(startup_init(cli.vault).await);

    match cli.command {
        Command::Refresh => {
            let stats = refresh(&state).await?;
            println!(
                "{} notes cached: {} indexed, {} removed, {} dangling added, {} dangling resolved",
                stats.total_notes, stats.indexed, stats.removed, stats.dangling_added, stats.dangling_removed
            );
        }
        Command::Stats => {
            let s = state.lock().await;
            let dangling = s.cache.get_dangling().len();
            println!("{} notes cached ({} dangling)", s.cache.len() - dangling, dangling);
        }
        Command::Dangling => {
            let s = state.lock().await;
            for note in s.cache.get_dangling() {
                println!("{}", note.path);
            }
        }
        Command::Clear => {
            let mut s = state.lock().await;
            s.cache.reset();
            if s.settings.store_index_in_file {
                s.cache.save(&FsAdapter::new(&s.vault_root)).await?;
            }
        }
        Command::Open { path, words, new_pane, launch } => {
            let pos = open_hit(&state, &path, words, new_pane, launch).await?;
            println!("{path}:{}", pos.line + 1);
        }
    }
    Ok(())
}
