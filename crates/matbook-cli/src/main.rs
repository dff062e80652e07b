use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use matbook_core::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, MatbookConfig};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "matbook", version, about = "Matbook CLI")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = CONFIG_ENV_VAR, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file and its plan catalog
    Check,

    /// Resolve the plan entitlement for a subscription snapshot (JSON file)
    Plan {
        /// Snapshot file; `null` means no subscription
        #[arg(long)]
        snapshot: PathBuf,

        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        now: Option<String>,
    },

    /// Print the field-level changes between two JSON objects
    Diff {
        /// Current state of the entity
        before: PathBuf,

        /// Partial update
        after: PathBuf,

        /// Only compare these fields (comma separated)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        /// Compare nested values by deep equality
        #[arg(long, default_value_t = false)]
        structural: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `check` reports a broken file itself; fall back to the default filter here.
    let filter = MatbookConfig::load_or_default(&cli.config)
        .map(|config| config.logging.filter)
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&filter);

    match cli.cmd {
        Command::Check => commands::check::run(&cli.config)?,
        Command::Plan { snapshot, now } => {
            commands::plan::run(&cli.config, &snapshot, now.as_deref())?
        }
        Command::Diff {
            before,
            after,
            fields,
            structural,
        } => commands::diff::run(&cli.config, &before, &after, fields.as_deref(), structural)?,
        Command::Serve { bind } => commands::serve::run(&cli.config, bind).await?,
    }

    Ok(())
}

/// Logs go to stderr so command output on stdout stays machine readable.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
