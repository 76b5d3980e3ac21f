use anyhow::Result;
use chrono::Weekday;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use flightscout_cli::OUTPUT_DIR_ENV;
use flightscout_cli::commands::{self, report::Layout, run::RunArgs};
use flightscout_core::report::CalendarMonth;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flightscout")]
#[command(author, version)]
#[command(
    about = "Search airline sites for fares and render a fare calendar",
    long_about = "Flightscout drives a browser through airline booking forms, collects the \
                  fares they show, and renders a calendar of the best fare per day that \
                  every search has reported."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape fares and write the archive and report
    Run(Box<RunArgs>),

    /// Re-render the report from an archived run
    Report {
        /// Archive written by `run` (runs/<run-id>.json)
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Directory to write the report to [default: ~/.flightscout]
        #[arg(short, long, env = OUTPUT_DIR_ENV)]
        output_dir: Option<PathBuf>,

        /// Month to draw as YYYY-MM (repeatable; default every month with fares)
        #[arg(long = "month", value_name = "YYYY-MM")]
        months: Vec<CalendarMonth>,

        /// First day of the calendar week
        #[arg(long, default_value = "sunday")]
        week_start: Weekday,

        /// Report title
        #[arg(long, default_value = "Flight fares")]
        title: String,

        /// Print the plaintext summary as well
        #[arg(long)]
        print: bool,
    },

    /// Export the best fare per search per run as CSV
    History {
        /// Directory holding runs/ [default: ~/.flightscout]
        #[arg(short, long, env = OUTPUT_DIR_ENV)]
        output_dir: Option<PathBuf>,

        /// Only groups matching this glob, e.g. "southwest *"
        #[arg(short, long)]
        group: Option<String>,

        /// Write CSV to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },

    /// List available sources
    Sources,

    /// Generate shell completion scripts
    #[command(
        long_about = "Generate shell completion scripts for flightscout.",
        after_help = "SUPPORTED SHELLS:\n  bash, zsh, fish, powershell, elvish\n\n\
                      INSTALLATION:\n  \
                      bash: flightscout completion --shell bash >> ~/.bashrc\n  \
                      zsh:  flightscout completion --shell zsh > ~/.zfunc/_flightscout\n  \
                      fish: flightscout completion --shell fish > ~/.config/fish/completions/flightscout.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::execute(*args),
        Commands::Report {
            archive,
            output_dir,
            months,
            week_start,
            title,
            print,
        } => {
            let layout = Layout {
                title,
                months,
                week_start,
            };
            commands::report::execute(
                &archive,
                &flightscout_cli::output_dir(output_dir),
                &layout,
                print,
            )
        }
        Commands::History {
            output_dir,
            group,
            csv,
        } => commands::history::execute(
            &flightscout_cli::output_dir(output_dir),
            group.as_deref(),
            csv,
        ),
        Commands::Sources => commands::sources::execute(),
        Commands::Completion { shell } => {
            commands::completion::execute(shell, &mut Cli::command())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "flightscout=debug,flightscout_cli=debug,flightscout_core=debug,\
             flightscout_browser=debug,flightscout_sources=debug",
        )
    } else {
        EnvFilter::new(
            "flightscout=info,flightscout_cli=info,flightscout_core=warn,\
             flightscout_browser=warn,flightscout_sources=warn",
        )
    };

    // stdout carries reports and CSV
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
