use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "motorcover")]
#[command(about = "Insurance lookups enriched with vehicle details.")]
#[command(version)]
pub struct CommandLine {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a customer's insurances
    #[command(alias = "i")]
    Insurances {
        /// 12-digit personal identity number
        pin: String,
    },
    /// Look up vehicles by registration number
    #[command(alias = "v")]
    Vehicles {
        /// Registration numbers (2-7 characters)
        #[arg(required = true)]
        keys: Vec<String>,
        /// One request per key instead of batch requests
        #[arg(long)]
        concurrent: bool,
    },
    /// Repeat an insurance lookup, reloading feature toggles from the config file
    #[command(alias = "w")]
    Watch {
        /// 12-digit personal identity number
        pin: String,
        /// Seconds between lookups
        #[arg(long, default_value_t = 30)]
        every: u64,
    },
    /// Validate the configuration and print it
    CheckConfig,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
