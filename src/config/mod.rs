pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::ImageCategory;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "numerology-forecast")]
#[command(about = "Daily numerology forecasts: HTTP service, packages and image import")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "forecast.toml")]
    pub config: String,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Override server.port from config
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the daily number and forecast for a birth date
    Forecast {
        /// Birth date (DD.MM.YYYY, YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long)]
        date: String,

        /// Target date, defaults to today (UTC)
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        lang: Option<String>,
    },

    /// Build the year/month image package for a birth date
    Package {
        #[arg(long)]
        date: String,

        #[arg(long)]
        target: Option<String>,

        /// Override package.output_path from config
        #[arg(long)]
        output: Option<String>,
    },

    /// Upload a folder of gc*.jpg / mc*v*.jpg images and record them
    ImportImages {
        #[arg(long)]
        category: ImageCategory,

        #[arg(long)]
        folder: String,
    },

    /// Check that the content store is reachable
    Ping,
}
