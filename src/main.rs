use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitereport::cli::OutputFormat;
use sitereport::cli::commands::generate::GenerateOptions;
use sitereport::cli::commands::template::TemplateOptions;

#[derive(Parser)]
#[command(name = "sitereport")]
#[command(
    version,
    about = "AI-assisted site inspection reports from photos and notes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze inspection photos and write a report
    Generate {
        #[arg(long = "image", short, help = "Inspection photo (repeatable)")]
        images: Vec<PathBuf>,
        #[arg(long, help = "JSON manifest of images, transcripts and timestamps")]
        manifest: Option<PathBuf>,
        #[arg(long, help = "Inspector notes file")]
        transcript: Option<PathBuf>,
        #[arg(long, help = "Property description used in the report")]
        location: Option<String>,
        #[arg(long, help = "Regional cost multiplier (default from config)")]
        multiplier: Option<f64>,
        #[arg(long, short, help = "Output file (default: stdout)")]
        output: Option<PathBuf>,
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long, help = "Skip the AI writer and use the template report")]
        template_only: bool,
    },

    /// Render the template report from saved analyses (offline)
    Template {
        #[arg(long, help = "Analyses JSON (array, or `generate --format json` output)")]
        analyses: PathBuf,
        #[arg(long, help = "Inspector notes file")]
        transcript: Option<PathBuf>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        multiplier: Option<f64>,
        #[arg(long, help = "Inspection date (YYYY-MM-DD)")]
        date: Option<NaiveDate>,
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Write the default configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mSiteReport encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            images,
            manifest,
            transcript,
            location,
            multiplier,
            output,
            format,
            template_only,
        } => {
            if images.is_empty() && manifest.is_none() {
                anyhow::bail!("no input: pass --image <path> or --manifest <file>");
            }
            sitereport::cli::commands::generate::run(GenerateOptions {
                images,
                manifest,
                transcript,
                location,
                multiplier,
                output,
                format,
                template_only,
            })?;
        }
        Commands::Template {
            analyses,
            transcript,
            location,
            multiplier,
            date,
            output,
            format,
        } => {
            sitereport::cli::commands::template::run(TemplateOptions {
                analyses,
                transcript,
                location,
                multiplier,
                date,
                output,
                format,
            })?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                sitereport::cli::commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                sitereport::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                sitereport::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
