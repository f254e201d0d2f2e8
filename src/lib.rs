//! tally - personal task tracking library
//!
//! Core functionality behind the `tally` CLI: per-owner task stores with
//! race-free sequence-number allocation and on-demand statistics.
//!
//! # Core Concepts
//!
//! - **Owners**: every task belongs to one owner; all operations are scoped
//!   to the caller's own tasks
//! - **Sequence numbers**: per-owner, human-facing task ids starting at 1,
//!   allocated from a locked counter
//! - **Statistics**: a point-in-time snapshot computed from the full task
//!   set, never incrementally maintained
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `tally.toml`
//! - `error`: error types and result aliases
//! - `lock`: per-owner file locking
//! - `output`: human/JSON output envelopes
//! - `owner`: owner identity resolution
//! - `stats`: the statistics aggregator
//! - `storage`: data-root layout and atomic JSON IO
//! - `task`: task records and the per-owner store

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod owner;
pub mod stats;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
