//! aichef CLI: Command-line interface for the AI Chef conversational client

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use aichef_engine::{
    transcript_to_text, Config, ExchangeController, HttpTransport, AICHEF_DIR, CONFIG_FILE,
};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "aichef.log";

/// Ask the AI Chef about recipes, ingredients and photos of your dishes
#[derive(Parser)]
#[command(name = "aichef")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (default: .aichef/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// Send one message and print the conversation
    Send {
        /// Message text
        message: Option<String>,

        /// Image to attach
        #[arg(long)]
        image: Option<PathBuf>,

        /// Output the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Path::new(AICHEF_DIR).join(CONFIG_FILE));

    match cli.command {
        None | Some(Commands::Tui) => {
            if let Err(e) = init_file_logging(cli.verbose) {
                eprintln!("Warning: logging disabled: {e}");
            }
            let config = load_config(&config_path);
            if let Err(e) = aichef_tui::run_tui(&config).await {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            message,
            image,
            json,
        }) => {
            init_stderr_logging(cli.verbose);
            let config = load_config(&config_path);
            cmd_send(&config, message, image, json).await;
        }
        Some(Commands::Config { init }) => {
            init_stderr_logging(cli.verbose);
            cmd_config(&config_path, init);
        }
    }
}

fn log_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(log_filter(verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// The TUI owns the terminal, so logs go to `.aichef/aichef.log`.
fn init_file_logging(verbose: bool) -> std::io::Result<()> {
    let dir = Path::new(AICHEF_DIR);
    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;

    tracing_subscriber::registry()
        .with(log_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn load_config(path: &Path) -> Config {
    match Config::load_or_default(path) {
        Ok(config) => {
            debug!(path = %path.display(), endpoint = %config.endpoint, "Loaded config");
            config
        }
        Err(e) => {
            eprintln!("Error: failed to load {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

async fn cmd_send(config: &Config, message: Option<String>, image: Option<PathBuf>, json: bool) {
    let transport = match HttpTransport::from_config(config) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let mut controller = ExchangeController::new(Arc::new(transport), config.submit_policy);

    if let Some(path) = image {
        if let Err(e) = controller.stage_attachment(&path).await {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
    controller.set_input(message.unwrap_or_default());

    let Some(report) = controller.submit().await else {
        eprintln!("Error: nothing to send. Provide a message or --image.");
        std::process::exit(1);
    };
    info!(
        conversation_id = %controller.conversation_id(),
        failed = report.outcome.is_failure(),
        "Exchange finished"
    );

    if json {
        match serde_json::to_string_pretty(&report.outcome) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", transcript_to_text(controller.transcript()));
    }

    if report.outcome.is_failure() {
        std::process::exit(1);
    }
}

fn cmd_config(path: &Path, init: bool) {
    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            if let Err(e) = Config::default().save(path) {
                eprintln!("Error: failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
            println!("Created {}", path.display());
        }
    }

    let config = load_config(path);
    match serde_json::to_string_pretty(&config) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
