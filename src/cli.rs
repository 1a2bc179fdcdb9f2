use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quaver")]
#[command(author, version, about = "Self-hosted music quiz server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server
    Start {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Create a user account
    CreateUser {
        /// Username for the new account
        username: String,

        /// Password for the new account
        password: String,

        /// Role for the new account
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Generate a random API key for programmatic access
    GenerateApiKey,

    /// Display version information
    Version,
}
