use clap::{Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::theme::Theme;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Base URL of the finance API
    #[arg(long, env = "FINANCE_API_URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "FINANCE_API_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// Theme preference file
    #[arg(long, env = "FINANCE_THEME_FILE")]
    pub theme_file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List recorded balances
    Balances,
    /// Record a month-end balance
    Add {
        /// Month, YYYY-MM
        #[arg(long)]
        date: String,
        /// Amount (must be >= 0)
        #[arg(long, allow_hyphen_values = true)]
        balance: String,
    },
    /// Delete a balance by id
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show delta and summary metrics for a month range
    Metrics {
        /// First month, YYYY-MM (default: six months ago)
        #[arg(long)]
        start: Option<String>,
        /// Last month, YYYY-MM (default: this month)
        #[arg(long)]
        end: Option<String>,
    },
    /// Show the current month snapshot
    CurrentMonth,
    /// Talk to the assistant
    Chat,
    /// Show or change the theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set { theme: Theme },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub theme: ThemeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeConfig {
    pub storage_path: PathBuf,
    /// Stands in for the desktop's dark-mode signal; unset means unknown.
    pub system_prefers_dark: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Layering: defaults < config file < `FINANCE_*` env < CLI flags.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", "http://127.0.0.1:8000")?
            .set_default("api.timeout_secs", 30)?
            .set_default("theme.storage_path", ".finance-client/preferences.json")?
            .set_default("logging.filter", "info")?
            .set_default("logging.json", false)?;

        // Explicit file must exist; ./config.yaml is picked up only when present.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::new(path, FileFormat::Yaml).required(true));
        } else if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::new("config.yaml", FileFormat::Yaml));
        }

        // E.g. FINANCE_API__BASE_URL=http://localhost:9000
        builder = builder.add_source(
            Environment::with_prefix("FINANCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = &cli.base_url {
            builder = builder.set_override("api.base_url", url.as_str())?;
        }
        if let Some(secs) = cli.timeout_secs {
            builder = builder.set_override("api.timeout_secs", secs)?;
        }
        if let Some(path) = &cli.theme_file {
            builder = builder.set_override("theme.storage_path", path.as_str())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
