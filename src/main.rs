// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use unidub::app_config::{Config, LogLevel};
use unidub::file_utils::FileManager;
use unidub::{Controller, DubRequest};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Args, Debug)]
struct DubbingArgs {
    /// Target language code (e.g., 'es', 'fr', 'deu')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Source language code, detected by the service when omitted
    #[arg(short, long)]
    source_language: Option<String>,

    /// Voice to dub with
    #[arg(long)]
    voice: Option<String>,
}

impl From<DubbingArgs> for DubRequest {
    fn from(args: DubbingArgs) -> Self {
        DubRequest {
            target_language: args.target_language,
            source_language: args.source_language,
            voice_id: args.voice,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a media file, dub it and wait for the result
    Dub {
        /// Media file to dub
        #[arg(value_name = "FILE")]
        input_path: PathBuf,

        #[command(flatten)]
        dubbing: DubbingArgs,
    },

    /// Request an upload ticket for a media file and print it
    Prepare {
        /// Media file to describe
        #[arg(value_name = "FILE")]
        input_path: PathBuf,
    },

    /// Upload a media file to a pre-signed URL
    Upload {
        /// Pre-signed upload URL from `prepare`
        upload_url: String,

        /// Media file to upload
        #[arg(value_name = "FILE")]
        input_path: PathBuf,
    },

    /// Start a dubbing pipeline for an uploaded file and print its status
    Start {
        /// File key from the upload ticket
        file_key: String,

        #[command(flatten)]
        dubbing: DubbingArgs,
    },

    /// Print the current status of a pipeline
    Status {
        /// Pipeline identifier
        pipeline_id: String,
    },

    /// Poll a pipeline until it completes or fails
    Poll {
        /// Pipeline identifier
        pipeline_id: String,
    },

    /// Generate shell completions for unidub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// unidub - dub videos with the UniFrame dubbing API
#[derive(Parser, Debug)]
#[command(name = "unidub")]
#[command(version)]
#[command(about = "Command-line client for the UniFrame dubbing API")]
#[command(long_about = "unidub uploads media to the UniFrame dubbing service, starts dubbing pipelines and follows them until they finish.

EXAMPLES:
    unidub dub movie.mp4 -t es                  # Dub into Spanish and wait
    unidub dub movie.mp4 -t fr --voice narrator # Pick a voice
    unidub prepare movie.mp4                    # Print an upload ticket
    unidub status 5f2c9a                        # Print a pipeline status
    unidub poll 5f2c9a                          # Follow a running pipeline
    unidub completions bash > unidub.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. The API URL can also be set through
    UNIDUB_API_URL.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// Base URL of the dubbing API
    #[arg(long, env = "UNIDUB_API_URL", global = true)]
    api_url: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Print a value as pretty JSON on stdout
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger with the most verbose level; the effective level
    // is lowered once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "unidub", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;

    // Override config with CLI options if provided
    if let Some(api_url) = &cli.api_url {
        config.api.base_url = api_url.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    run_command(&controller, cli.command).await
}

async fn run_command(controller: &Controller, command: Commands) -> Result<()> {
    let api = controller.api();

    match command {
        Commands::Dub { input_path, dubbing } => {
            let status = controller.run(&input_path, &dubbing.into()).await?;
            print_json(&status)
        }
        Commands::Prepare { input_path } => {
            let request = FileManager::describe_upload(&input_path)?;
            let ticket = api.prepare_upload(&request).await?;
            print_json(&ticket)
        }
        Commands::Upload { upload_url, input_path } => {
            let payload = FileManager::read_payload(&input_path).await?;
            controller.upload_with_progress(&upload_url, payload).await?;
            info!("Uploaded {:?}", input_path);
            Ok(())
        }
        Commands::Start { file_key, dubbing } => {
            let request = controller.build_start_request_for_key(&file_key, &dubbing.into())?;
            let status = api.start_pipeline(&request).await?;
            print_json(&status)
        }
        Commands::Status { pipeline_id } => {
            let status = api.get_pipeline_status(&pipeline_id).await?;
            print_json(&status)
        }
        Commands::Poll { pipeline_id } => {
            let status = controller.poll(&pipeline_id).await?;
            print_json(&status)
        }
        Commands::Completions { .. } => Ok(()),
    }
}
