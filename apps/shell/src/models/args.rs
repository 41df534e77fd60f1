//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "kvo")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Drive a key-value observation registry from the command line")]
pub struct Cli {
    /// Registry configuration file (toml, json, yaml); `KVO__*` variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimum log level: trace, debug, info, warn, error or off
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Observe a user's name from a controller, report a change, then unsubscribe
    Demo {
        /// New value of the observed name
        #[arg(long, default_value = "Alice")]
        name: String,
        /// Previous value of the observed name
        #[arg(long, default_value = "Bob")]
        previous: String,
    },
    /// Subscribe, notify and unsubscribe from many threads against one subject
    Stress {
        #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
        threads: u16,
        /// Subscribe/notify/unsubscribe rounds per thread
        #[arg(short, long, default_value_t = 1_000)]
        iterations: u32,
    },
}
