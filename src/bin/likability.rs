//! # likability
//!
//! Command-line access to the likability aggregator.
//!
//! ## Usage
//! ```sh
//! # Score one figure (JSON on stdout)
//! likability analyze "Narendra Modi"
//!
//! # Bypass the cache
//! likability analyze "Amit Shah" --refresh
//!
//! # Compare two or more figures, with rankings
//! likability compare "Yogi Adityanath" "Akhilesh Yadav"
//!
//! # Interactive chat, one JSON event per line
//! likability chat
//! ```
//!
//! The cache lives for the lifetime of the process, so `cache-stats` and
//! `cache-clear` are mostly useful inside `chat` sessions and scripts.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use likability_analyzer::analyze::{build_summarizer, MAINTENANCE_INTERVAL};
use likability_analyzer::fetch::SignalHub;
use likability_analyzer::model::rank_by_score;
use likability_analyzer::{
    init_tracing, Aggregator, ChatController, CompositeResult, LikabilityError, ScoreCache,
    ScoringConfig, Settings,
};

#[derive(Parser, Debug)]
#[command(
    name = "likability",
    version,
    about = "Public likability scores for public figures",
    long_about = "Aggregates news, trending RSS and social sentiment into a 0-100 likability score."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one public figure
    Analyze {
        name: String,
        /// Ignore any cached result
        #[arg(long)]
        refresh: bool,
    },
    /// Score two or more figures and rank them
    Compare {
        #[arg(required = true, num_args = 2..)]
        names: Vec<String>,
        /// Ignore any cached result
        #[arg(long)]
        refresh: bool,
    },
    /// Print cache statistics
    CacheStats,
    /// Drop every cached result
    CacheClear,
    /// Interactive chat; prints one JSON event per line
    Chat {
        /// Ignore cached results for every turn
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Serialize)]
struct CompareOutput {
    results: Vec<CompositeResult>,
    rankings: Vec<likability_analyzer::model::RankingEntry>,
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: cannot serialize output: {e}");
            ExitCode::FAILURE
        }
    }
}

fn exit_for(err: &LikabilityError) -> ExitCode {
    eprintln!("error: {err}");
    match err {
        LikabilityError::InvalidSubject => ExitCode::from(2),
        LikabilityError::Internal(_) => ExitCode::FAILURE,
    }
}

/// No source returned anything for any subject.
fn total_failure(results: &[CompositeResult]) -> bool {
    !results.is_empty() && results.iter().all(|r| r.breakdown.is_empty())
}

async fn run_chat(controller: Arc<ChatController>, refresh: bool) -> ExitCode {
    eprintln!("Ask about a public figure (\"exit\" to quit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let _ = std::io::stderr().flush();
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                eprintln!("error: reading stdin: {e}");
                return ExitCode::FAILURE;
            }
        };
        let trimmed = line.trim();
        if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            break;
        }

        let mut events = controller.stream(trimmed, refresh);
        while let Some(ev) = events.next().await {
            match serde_json::to_string(&ev) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("error: cannot serialize event: {e}"),
            }
            if ev.is_done() {
                break;
            }
        }
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();
    let args = Args::parse();

    let settings = Settings::from_env();
    let scoring = ScoringConfig::load_or_default(&settings.config_path);
    let cache = Arc::new(ScoreCache::new(settings.cache_ttl));
    let aggregator = Arc::new(Aggregator::new(
        cache.clone(),
        SignalHub::from_settings(&settings),
        build_summarizer(&settings),
        scoring,
    ));

    match args.command {
        Command::Analyze { name, refresh } => {
            eprintln!("Analyzing {}...", name.trim());
            match aggregator.compute(&name, refresh).await {
                Ok(r) => {
                    let failed = total_failure(std::slice::from_ref(&r));
                    let code = print_json(&r);
                    if failed {
                        eprintln!("error: no source returned data");
                        ExitCode::FAILURE
                    } else {
                        code
                    }
                }
                Err(e) => exit_for(&e),
            }
        }
        Command::Compare { names, refresh } => {
            let mut results = Vec::with_capacity(names.len());
            for name in &names {
                eprintln!("Analyzing {}...", name.trim());
                match aggregator.compute(name, refresh).await {
                    Ok(r) => results.push(r),
                    Err(e) => return exit_for(&e),
                }
            }
            let failed = total_failure(&results);
            let rankings = rank_by_score(&results);
            let code = print_json(&CompareOutput { results, rankings });
            if failed {
                eprintln!("error: no source returned data");
                ExitCode::FAILURE
            } else {
                code
            }
        }
        Command::CacheStats => print_json(&cache.stats()),
        Command::CacheClear => print_json(&json!({ "cleared": cache.clear() })),
        Command::Chat { refresh } => {
            let _sweeper = aggregator.spawn_maintenance(MAINTENANCE_INTERVAL);
            let controller = Arc::new(ChatController::new(aggregator));
            run_chat(controller, refresh).await
        }
    }
}
