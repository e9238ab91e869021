use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "supplementctl")]
#[command(about = "Manage supplement nutrition records keyed by GTIN", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Storage backend
    #[arg(
        long,
        global = true,
        value_enum,
        env = "SUPPLEMENT_BACKEND",
        default_value_t = Backend::Sqlite
    )]
    pub backend: Backend,

    /// Database file (sqlite) or collection file (document)
    #[arg(long, global = true, env = "SUPPLEMENT_STORE", default_value = "supplements.sqlite3")]
    pub store: PathBuf,

    /// Log level (trace|debug|info|warn|error); requires --log-dir, defaults by build mode
    #[arg(long, global = true, env = "SUPPLEMENT_LOG_LEVEL", requires = "log_dir")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "SUPPLEMENT_LOG_DIR")]
    pub log_dir: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Relational table in a SQLite file
    Sqlite,
    /// JSON document collection file
    Document,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a supplement from a JSON object (`-` reads stdin)
    Create { payload: String },

    /// Print one supplement as JSON
    Get { gtin: String },

    /// Apply a partial JSON update (`-` reads stdin)
    #[command(alias = "patch")]
    Update { gtin: String, payload: String },

    /// Delete one supplement
    #[command(alias = "rm")]
    Delete { gtin: String },

    /// Print every supplement as a JSON array
    #[command(alias = "ls")]
    List,
}
