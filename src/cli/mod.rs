//! Command-line interface for tally
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::storage::Storage;
use crate::task::TaskStore;

mod owner;
mod stats;
mod task;

/// tally - personal task tracking
///
/// Tracks per-owner tasks with priorities, start/end times, and a
/// Pending/Finished lifecycle, and reports aggregate statistics.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "TALLY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Owner identity for all task operations
    #[arg(long, global = true, env = "TALLY_OWNER")]
    pub owner: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Start time (RFC 3339, e.g. "2024-01-01T09:00:00Z")
        #[arg(long)]
        start: String,

        /// End time / deadline (RFC 3339)
        #[arg(long)]
        end: String,

        /// Priority 1 (highest) to 5; defaults from config
        #[arg(short, long)]
        priority: Option<u8>,

        /// Initial status: pending or finished
        #[arg(long)]
        status: Option<String>,
    },

    /// List tasks
    List {
        /// Only tasks at this priority
        #[arg(short, long)]
        priority: Option<u8>,

        /// Only tasks with this status: pending or finished
        #[arg(long)]
        status: Option<String>,

        /// Sort field: start, end, priority, seq, title (ascending)
        #[arg(long)]
        sort: Option<String>,
    },

    /// Update a task's status, end time, or priority
    Update {
        /// Task reference: sequence number or opaque id
        id: String,

        /// New status (only pending -> finished is allowed)
        #[arg(long)]
        status: Option<String>,

        /// New end time (RFC 3339)
        #[arg(long)]
        end: Option<String>,

        /// New priority 1-5
        #[arg(short, long)]
        priority: Option<u8>,
    },

    /// Mark a task finished (shorthand for update --status finished)
    Done {
        /// Task reference: sequence number or opaque id
        id: String,

        /// Explicit end time; omitted means "now"
        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a task
    Rm {
        /// Task reference: sequence number or opaque id
        id: String,
    },

    /// Show aggregate statistics for the owner's tasks
    Stats,

    /// Owner identity management
    #[command(subcommand)]
    Owner(OwnerCommands),
}

#[derive(Subcommand, Debug)]
pub enum OwnerCommands {
    /// Show the resolved owner
    Show,

    /// Persist the owner identity in the data directory
    Set {
        /// Owner name
        name: String,
    },
}

/// Shared state every command handler needs.
pub(crate) struct Context {
    pub storage: Storage,
    pub config: Config,
    pub output: OutputOptions,
    pub cli_owner: Option<String>,
}

impl Context {
    fn new(cli: &Cli) -> Result<Self> {
        let config = Config::load_default();
        let root = match cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
            Some(root) => root,
            None => Storage::default_root()?,
        };

        Ok(Self {
            storage: Storage::new(root),
            config,
            output: OutputOptions {
                json: cli.json,
                quiet: cli.quiet,
            },
            cli_owner: cli.owner.clone(),
        })
    }

    /// Owner for task operations (flag > env > persisted > config).
    pub fn owner(&self) -> Result<String> {
        crate::owner::resolve_owner(&self.storage, &self.config, self.cli_owner.as_deref())
    }

    pub fn store(&self) -> TaskStore {
        TaskStore::new(self.storage.clone(), self.config.tasks.clone())
    }
}

impl Cli {
    /// Execute the parsed command
    pub fn run(self) -> Result<()> {
        let ctx = Context::new(&self)?;

        match self.command {
            Commands::Add {
                title,
                start,
                end,
                priority,
                status,
            } => task::run_add(
                &ctx,
                task::AddOptions {
                    title,
                    start,
                    end,
                    priority,
                    status,
                },
            ),
            Commands::List {
                priority,
                status,
                sort,
            } => task::run_list(
                &ctx,
                task::ListOptions {
                    priority,
                    status,
                    sort,
                },
            ),
            Commands::Update {
                id,
                status,
                end,
                priority,
            } => task::run_update(
                &ctx,
                task::UpdateOptions {
                    id,
                    status,
                    end,
                    priority,
                },
            ),
            Commands::Done { id, end } => task::run_update(
                &ctx,
                task::UpdateOptions {
                    id,
                    status: Some("finished".to_string()),
                    end,
                    priority: None,
                },
            ),
            Commands::Rm { id } => task::run_rm(&ctx, id),
            Commands::Stats => stats::run_stats(&ctx),
            Commands::Owner(command) => match command {
                OwnerCommands::Show => owner::run_show(&ctx),
                OwnerCommands::Set { name } => owner::run_set(&ctx, name),
            },
        }
    }
}
