mod cli;
mod config;
mod database;
mod editor;
mod logging;
mod models;
mod store;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use config::Config;
use database::{SqliteStore, StoreError};
use std::io::{self, Write};
use store::{append, remove_at, TaskStore};
use ui::run_tui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env(cli.db.clone())?;

    if let Err(err) = logging::init_logging(config.log_level, &config.log_dir) {
        eprintln!("Logging disabled: {err:#}");
    }

    let result = dispatch(cli, &config);
    if let Err(err) = &result {
        log::error!("event=app_exit status=error error={err:#}");
    }
    logging::flush();
    result
}

fn dispatch(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Some(Commands::Completions { shell }) => print_completions(&shell, &mut io::stdout()),
        Some(Commands::Tui) | None => {
            let store = TaskStore::new(SqliteStore::open(&config.db_path)?);
            let rt = tokio::runtime::Runtime::new()?;
            let _guard = rt.enter();
            run_tui(store, rt.handle())
        }
        Some(command) => {
            let mut store = TaskStore::new(SqliteStore::open(&config.db_path)?);
            run_command(command, &mut store, &mut io::stdout().lock())
        }
    }
}

/// Runs one of the one-shot list commands against `store`, reporting to `out`.
fn run_command(command: Commands, store: &mut TaskStore, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Add { text } => {
            let list = store.load();
            let next = append(&list, Some(&text));
            if next.len() == list.len() {
                writeln!(out, "Nothing to add.")?;
                return Ok(());
            }
            store.save(&next)?;
            writeln!(out, "Added task {}: {}", next.len() - 1, text)?;
        }
        Commands::Done { index } => {
            let list = store.load();
            match remove_at(&list, index) {
                Ok(next) => {
                    store.save(&next)?;
                    writeln!(out, "Completed: {}", list[index])?;
                }
                Err(err @ StoreError::IndexOutOfRange { .. }) => {
                    writeln!(out, "Error: {err}")?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::List { json } => {
            let list = store.load();
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&models::task_rows(&list))?)?;
            } else if list.is_empty() {
                writeln!(out, "{}", ui::EMPTY_MESSAGE)?;
            } else {
                for row in models::task_rows(&list) {
                    writeln!(out, "{:>3}  {}", row.index, row.text)?;
                }
            }
        }
        Commands::Clear => {
            if store.clear()? {
                writeln!(out, "All tasks cleared.")?;
            } else {
                writeln!(out, "No stored tasks.")?;
            }
        }
        // Handled in dispatch.
        Commands::Tui | Commands::Completions { .. } => {}
    }
    Ok(())
}

fn print_completions(shell: &str, out: &mut dyn Write) -> Result<()> {
    use clap_complete::{generate, Shell};
    let shell_enum = match shell.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" => Shell::PowerShell,
        other => {
            writeln!(out, "Unsupported shell: {}", other)?;
            return Ok(());
        }
    };
    let mut cmd = Cli::command();
    generate(shell_enum, &mut cmd, "taskpad", out);
    Ok(())
}
