//! mathce1 - CE1 math practice in the terminal
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use mathce1::config::{mathce1_home, Config};
use mathce1::core::{Domain, Phase};
use mathce1::error::exit_codes;
use mathce1::storage::{FileStore, KeyValueStore, MemoryStore};

// =============================================================================
// CLI Definition
// =============================================================================

/// mathce1 - CE1 math practice in the terminal
#[derive(Parser)]
#[command(name = "mathce1")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session: type digits or French words, `?` for a hint
    Play {
        /// Child id (registered on first play)
        #[arg(long)]
        child: String,
        /// Domain: numeration, calcul, geometrie, mesures, problemes
        #[arg(long, default_value = "calcul")]
        domain: String,
        /// Number of exercises
        #[arg(long)]
        count: Option<u32>,
        /// Pedagogical phase
        #[arg(long, value_enum, default_value_t = PhaseArg::Abstract)]
        phase: PhaseArg,
        /// Fixed difficulty (1-10) instead of the child's level
        #[arg(long)]
        difficulty: Option<u8>,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Keep nothing on disk
        #[arg(long)]
        memory: bool,
        /// Print the summary as JSON (the dialogue goes to stderr)
        #[arg(long, short)]
        json: bool,
        /// Suppress the summary
        #[arg(long, short)]
        quiet: bool,
    },

    /// Read a number written in French words
    Parse {
        /// Words to parse
        #[arg(required = true)]
        words: Vec<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Spell a number (0-100) in French
    Format {
        number: u32,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print generated exercises with their answers
    Generate {
        #[arg(long, default_value = "calcul")]
        domain: String,
        #[arg(long, default_value_t = 1)]
        difficulty: u8,
        /// Exercise type id (e.g. addition, countSides); random if omitted
        #[arg(long = "type")]
        exercise_type: Option<String>,
        #[arg(long, value_enum, default_value_t = PhaseArg::Abstract)]
        phase: PhaseArg,
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show a child's levels and success rates
    Stats {
        #[arg(long)]
        child: String,
        /// Only this domain
        #[arg(long)]
        domain: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List a child's past sessions, newest first
    History {
        #[arg(long)]
        child: String,
        /// Maximum sessions to show
        #[arg(long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the badge catalog with a child's earned badges
    Badges {
        #[arg(long)]
        child: String,
        /// Only earned badges
        #[arg(long)]
        earned: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PhaseArg {
    Concrete,
    Pictorial,
    Abstract,
}

impl From<PhaseArg> for Phase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Concrete => Phase::Concrete,
            PhaseArg::Pictorial => Phase::Pictorial,
            PhaseArg::Abstract => Phase::Abstract,
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    setup_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mathce1 error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Log to stderr, filtered by `MATHCE1_LOG` (default `warn`), so the
/// dialogue on stdout stays clean.
fn setup_tracing() {
    let filter = EnvFilter::try_from_env("MATHCE1_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Set up the global panic handler.
///
/// On panic, logs to `<home>/crash.log` and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("mathce1 panic: {}", info);

        if let Some(home) = mathce1_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            child,
            domain,
            count,
            phase,
            difficulty,
            seed,
            memory,
            json,
            quiet,
        } => {
            use mathce1::cli::play::PlayOptions;

            let options = PlayOptions {
                json,
                quiet,
                domain: Domain::parse_or_default(&domain),
                phase: phase.into(),
                count,
                difficulty,
                seed,
            };
            if memory {
                run_play(Arc::new(MemoryStore::new()), &child, &options)
            } else {
                run_play(Arc::new(FileStore::new()?), &child, &options)
            }
        }
        Commands::Parse { words, json, quiet } => run_parse(&words.join(" "), json, quiet),
        Commands::Format {
            number,
            json,
            quiet,
        } => run_format(number, json, quiet),
        Commands::Generate {
            domain,
            difficulty,
            exercise_type,
            phase,
            count,
            seed,
            json,
            quiet,
        } => {
            use mathce1::cli::generate::GenerateOptions;

            run_generate(&GenerateOptions {
                json,
                quiet,
                domain: Domain::parse_or_default(&domain),
                difficulty,
                phase: phase.into(),
                exercise_type,
                count,
                seed,
            })
        }
        Commands::Stats {
            child,
            domain,
            json,
            quiet,
        } => {
            let domain = domain.as_deref().map(Domain::parse).transpose()?;
            run_stats(&child, domain, json, quiet)
        }
        Commands::History {
            child,
            limit,
            json,
            quiet,
        } => run_history(&child, limit, json, quiet),
        Commands::Badges {
            child,
            earned,
            json,
            quiet,
        } => run_badges(&child, earned, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

fn run_play<S: KeyValueStore + 'static>(
    store: Arc<S>,
    child: &str,
    options: &mathce1::cli::play::PlayOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use mathce1::cli::play::PlayCommand;

    let config = Config::load();
    let cmd = PlayCommand::new(store, config);

    let stdin = std::io::stdin();
    let output = if options.json {
        cmd.run(child, options, stdin.lock(), &mut std::io::stderr())
    } else {
        cmd.run(child, options, stdin.lock(), &mut std::io::stdout())
    };

    print_formatted(&cmd.format_output(&output, options));
    Ok(success_to_exit_code(output.success))
}

fn run_parse(text: &str, json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use mathce1::cli::numbers::{NumbersCommand, NumbersOptions};

    let cmd = NumbersCommand::new();
    let options = NumbersOptions { json, quiet };

    let output = cmd.parse(text);
    print_formatted(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_format(number: u32, json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use mathce1::cli::numbers::{NumbersCommand, NumbersOptions};

    let cmd = NumbersCommand::new();
    let options = NumbersOptions { json, quiet };

    let output = cmd.format(number);
    print_formatted(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_generate(
    options: &mathce1::cli::generate::GenerateOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use mathce1::cli::generate::GenerateCommand;

    let cmd = GenerateCommand::new();
    let output = cmd.run(options);
    print_formatted(&cmd.format_output(&output, options));
    Ok(success_to_exit_code(output.success))
}

fn run_stats(
    child: &str,
    domain: Option<Domain>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use mathce1::cli::stats::{StatsCommand, StatsOptions};

    let config = Config::load();
    let store = Arc::new(FileStore::new()?);

    let cmd = StatsCommand::new(store, config);
    let options = StatsOptions {
        json,
        quiet,
        domain,
    };

    let output = cmd.run(child, &options);
    print_formatted(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_history(
    child: &str,
    limit: Option<usize>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use mathce1::cli::history::{HistoryCommand, HistoryOptions};

    let config = Config::load();
    let store = Arc::new(FileStore::new()?);

    let cmd = HistoryCommand::new(store, config);
    let options = HistoryOptions { json, quiet, limit };

    let output = cmd.run(child, &options);
    print_formatted(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_badges(
    child: &str,
    earned_only: bool,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use mathce1::cli::badges::{BadgesCommand, BadgesOptions};

    let config = Config::load();
    let store = Arc::new(FileStore::new()?);

    let cmd = BadgesCommand::new(store, config);
    let options = BadgesOptions {
        json,
        quiet,
        earned_only,
    };

    let output = cmd.run(child, &options);
    print_formatted(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}
