use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jotter")]
#[command(about = "Rich-text notes kept as plain HTML files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Notes directory (overrides the configured one)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "n")]
    New {
        /// Title of the note (defaults to the next "New note N")
        title: Option<String>,

        /// Initial HTML content
        #[arg(short, long)]
        content: Option<String>,
    },

    /// List notes
    #[command(alias = "ls")]
    List,

    /// Print one or more notes
    #[command(alias = "v")]
    View {
        /// Note titles
        #[arg(required = true, num_args = 1..)]
        titles: Vec<String>,
    },

    /// Open an interactive editing session
    #[command(alias = "e")]
    Edit {
        /// Note to open first (created if it does not exist)
        title: Option<String>,
    },

    /// Rename a note
    #[command(alias = "mv")]
    Rename { title: String, new_title: String },

    /// Delete one or more notes permanently
    #[command(alias = "rm")]
    Delete {
        /// Note titles
        #[arg(required = true, num_args = 1..)]
        titles: Vec<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the notes directory
    Path,

    /// Get or set configuration
    Config {
        /// Configuration key (dir, autosave-ms, settle-ms, key.new-note, ...)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
