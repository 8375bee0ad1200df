use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use avengers_session::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "avengers")]
#[command(about = "Mission coordination for multi-agent work")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a mission and, given subtasks, compute its execution plan
    Assemble {
        /// Mission description (overrides the subtask file's `task`)
        #[arg(long, required_unless_present = "subtasks")]
        task: Option<String>,

        /// JSON file with `{task, subtasks: [...]}`
        #[arg(long)]
        subtasks: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Render dispatch commands for a planned mission
    Execute {
        /// Mission ID
        #[arg(long)]
        mission: String,

        /// Also write the commands to execute_commands.md
        #[arg(long)]
        save: bool,

        /// Render only; do not log or change mission status
        #[arg(long)]
        dry_run: bool,
    },

    /// Show mission progress
    Status {
        /// Mission ID
        #[arg(long)]
        mission: String,

        /// Refresh until every agent has produced its artifact
        #[arg(long)]
        watch: bool,

        /// Refresh interval in seconds (default from config, 10)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate artifacts and write the final report
    Consolidate {
        /// Mission ID
        #[arg(long)]
        mission: String,

        /// Write the report even when validation fails
        #[arg(long)]
        force: bool,

        /// Report path (default: <mission>/FINAL_REPORT.md)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List missions, newest first
    List,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<u8> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Assemble {
            task,
            subtasks,
            format,
        } => commands::assemble::run(
            &config,
            task.as_deref(),
            subtasks.as_deref(),
            format == OutputFormat::Json,
        ),

        Commands::Execute {
            mission,
            save,
            dry_run,
        } => commands::execute::run(&config, &mission, save, dry_run),

        Commands::Status {
            mission,
            watch,
            interval,
            format,
        } => {
            let json = format == OutputFormat::Json;
            if watch {
                let interval = interval.unwrap_or(config.watch_interval_secs);
                commands::status::watch(&config, &mission, interval, json)
            } else {
                commands::status::run(&config, &mission, json)
            }
        }

        Commands::Consolidate {
            mission,
            force,
            output,
            format,
        } => commands::consolidate::run(
            &config,
            &mission,
            force,
            output.as_deref(),
            format == OutputFormat::Json,
        ),

        Commands::List => commands::list::run(&config),
    }
}
