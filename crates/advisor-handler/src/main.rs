use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use advisor_handler::{sample_event, Config, Handler};
use advisor_tools::advisor_registry;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose: includes model request and response payloads
    Trace,
    /// Verbose: agent iterations, tool execution details
    Debug,
    /// Standard: received events
    Info,
    /// Quiet: only warnings and errors
    Warn,
    /// Minimal: only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "alert-advisor")]
#[command(author, version, about = "Emergency alert recommendations from a tool-using model", long_about = None)]
pub struct Cli {
    /// Model to use (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Enable debug logging (shorthand for --log-level debug)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Write logs to file (JSON-lines format)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one event and print the response
    Invoke {
        /// Event JSON file (reads stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Print a sample hurricane event
    Sample,
    /// List the tools offered to the agent
    Tools,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --debug overrides --log-level
    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    let filter = EnvFilter::new(log_level.as_filter());

    if let Some(log_path) = &cli.log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::sync::Mutex::new(file)))
            .init();
    } else {
        // stdout carries the response, so logs go to stderr
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match &cli.command {
        Commands::Invoke { event } => invoke(&cli, event.as_ref()).await,
        Commands::Sample => print_json(&sample_event()),
        Commands::Tools => list_tools(),
        Commands::Config => show_config(&cli),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(model) = &cli.model {
        config.model_id = model.clone();
    }
    Ok(config)
}

async fn invoke(cli: &Cli, event_path: Option<&PathBuf>) -> Result<()> {
    let config = load_config(cli)?;

    let raw = match event_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {:?}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    let event: serde_json::Value =
        serde_json::from_str(&raw).context("Event is not valid JSON")?;

    let handler = Handler::from_config(&config)?;
    let response = handler.handle(&event).await;
    print_json(&response)
}

fn list_tools() -> Result<()> {
    let registry = advisor_registry(Vec::new(), None);
    let definitions = registry.definitions();
    print_json(&definitions)
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    match Config::config_path() {
        Some(path) if path.exists() => println!("# Loaded from {}", path.display()),
        Some(path) => println!("# No config file at {}", path.display()),
        None => println!("# No config directory"),
    }
    print!("{}", toml::to_string_pretty(&config.redacted())?);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
