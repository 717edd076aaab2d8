use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database file (defaults to $TASKPAD_DB or ~/.taskpad.db)
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task to the end of the list
    Add {
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Complete (remove) the task at a zero-based index
    Done {
        #[arg(value_name = "INDEX")]
        index: usize,
    },
    /// List all tasks
    List {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the stored task list
    Clear,
    /// Launch TUI interface
    Tui,
    /// Print shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["taskpad"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.db.is_none());
    }

    #[test]
    fn parses_done_index_and_global_db() {
        let cli = Cli::try_parse_from(["taskpad", "done", "2", "--db", "/tmp/t.db"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Done { index: 2 })));
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/t.db")));
    }

    #[test]
    fn rejects_negative_index() {
        assert!(Cli::try_parse_from(["taskpad", "done", "-1"]).is_err());
    }
}
