//! LeIndex CLI: one verb per op, plus `serve` for the stdio JSON-RPC 2.0
//! transport. Argument parsing and pretty-printing are the only
//! collaborator concerns here; everything this binary does beyond parsing
//! flags and formatting output goes through
//! `leindex_orchestrator::handle_request`, the same entry point `rpc`
//! uses, so CLI and RPC answer identically for the same request.

mod rpc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use leindex_orchestrator::dispatch::{PhaseSelector, Request, SearchFilters, SearchMode};
use leindex_orchestrator::{handle_request, ErrorCategory, LeIndexConfig, ProjectRegistry};

#[derive(Parser)]
#[command(name = "leindex", version, about = "Local code-intelligence engine")]
struct Cli {
    /// Path to a TOML config file; defaults to built-in defaults if absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index (or re-index) a project root.
    Index {
        project_path: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Search an indexed project.
    Search {
        project_id: String,
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, value_enum, default_value = "hybrid")]
        mode: CliSearchMode,
        #[arg(long)]
        language: Option<String>,
    },
    /// Deep-analyze a symbol, file, or natural-language query.
    Analyze {
        project_id: String,
        #[arg(long)]
        file_path: Option<String>,
        #[arg(long)]
        symbol_name: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 2000)]
        budget_tokens: u32,
    },
    /// Print a context window around a file/line.
    Context {
        project_id: String,
        file_path: String,
        line_number: u32,
        #[arg(long, default_value_t = 10)]
        context_lines: u32,
    },
    /// Run the legacy multi-phase indexing report.
    Phase {
        project_path: PathBuf,
        /// `1`..`5` or `all`.
        phase: String,
    },
    /// Print process and per-project diagnostics.
    Diagnostics,
    /// Serve the stdio JSON-RPC 2.0 transport until stdin closes.
    Serve,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliSearchMode {
    Hybrid,
    Lexical,
    Vector,
}

impl From<CliSearchMode> for SearchMode {
    fn from(mode: CliSearchMode) -> Self {
        match mode {
            CliSearchMode::Hybrid => SearchMode::Hybrid,
            CliSearchMode::Lexical => SearchMode::Lexical,
            CliSearchMode::Vector => SearchMode::Vector,
        }
    }
}

fn parse_phase(raw: &str) -> anyhow::Result<PhaseSelector> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(PhaseSelector::All);
    }
    let n: u8 = raw.parse().map_err(|_| anyhow::anyhow!("phase must be 1-5 or \"all\", got {raw}"))?;
    if !(1..=5).contains(&n) {
        anyhow::bail!("phase must be 1-5 or \"all\", got {raw}");
    }
    Ok(PhaseSelector::One(n))
}

/// Exit codes per the CLI surface: 0 success, 1 user error, 2
/// internal error, 3 `Unavailable`/retriable.
fn exit_code_for_category(category: ErrorCategory) -> ExitCode {
    match category {
        ErrorCategory::InvalidInput | ErrorCategory::NotFound | ErrorCategory::Unsupported => {
            ExitCode::from(1)
        }
        ErrorCategory::Unavailable | ErrorCategory::Timeout => ExitCode::from(3),
        ErrorCategory::Corrupted | ErrorCategory::Internal => ExitCode::from(2),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => match LeIndexConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                return exit_code_for_category(err.category);
            }
        },
        None => LeIndexConfig::default(),
    };

    let registry = match ProjectRegistry::new(Arc::new(config)) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_code_for_category(err.category);
        }
    };

    match run(registry, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(leindex_err) = err.downcast_ref::<leindex_orchestrator::LeIndexError>() {
                eprintln!("error: {leindex_err}");
                exit_code_for_category(leindex_err.category)
            } else {
                eprintln!("error: {err}");
                ExitCode::from(1)
            }
        }
    }
}

async fn run(registry: ProjectRegistry, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve => {
            rpc::serve_stdio(Arc::new(registry)).await?;
            Ok(())
        }
        other => {
            let request = to_request(other)?;
            let response = handle_request(&registry, request, None).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

fn to_request(command: Command) -> anyhow::Result<Request> {
    Ok(match command {
        Command::Index { project_path, force } => Request::Index { project_path, force },
        Command::Search {
            project_id,
            query,
            limit,
            mode,
            language,
        } => Request::Search {
            project_id,
            query,
            filters: SearchFilters {
                language,
                ..Default::default()
            },
            limit,
            mode: mode.into(),
            embedding: None,
        },
        Command::Analyze {
            project_id,
            file_path,
            symbol_name,
            query,
            budget_tokens,
        } => Request::Analyze {
            project_id,
            file_path,
            symbol_name,
            query,
            budget_tokens,
        },
        Command::Context {
            project_id,
            file_path,
            line_number,
            context_lines,
        } => Request::Context {
            project_id,
            file_path,
            line_number,
            context_lines,
        },
        Command::Phase { project_path, phase } => Request::Phase {
            project_path,
            phase: parse_phase(&phase)?,
        },
        Command::Diagnostics => Request::Diagnostics,
        Command::Serve => unreachable!("handled in run"),
    })
}
