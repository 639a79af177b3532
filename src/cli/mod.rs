//! CLI module
//!
//! Subcommands:
//! - `serve`: run the HTTP API server
//! - `flush-cache`: drop all semantic cache entries

pub mod flush_cache;
pub mod serve;

use clap::{Parser, Subcommand};

/// LexRAG - retrieval-augmented question answering over a legal corpus
#[derive(Parser)]
#[command(name = "lexrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Drop all semantic cache entries and the similarity index
    FlushCache,
}
