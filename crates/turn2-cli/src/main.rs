#![deny(unsafe_code)]

mod fs_backend;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fs_backend::{FsObjectStore, FsRecordStore};
use std::io::Read as _;
use std::path::PathBuf;
use turn2_config::Turn2Config;
use turn2_core::{ContentBlock, TokenUsage};
use turn2_llm::{LlmProvider, MockLlmProvider, RawConverseResult};
use turn2_runtime::Turn2Orchestrator;

/// Exit code for a fatal run failure.
const EXIT_RUNTIME_ERROR: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "turn2", version, about = "Turn-2 combined execution core CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one Turn-2 invocation against the given envelope.
    Run {
        /// Path to the invocation envelope JSON. Reads stdin if omitted.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Directory backing the local object store and record store.
        #[arg(long, default_value = ".turn2-data")]
        base_dir: PathBuf,

        /// Path to a text file with the canned assistant response to
        /// return in place of a real Bedrock call. Defaults to a
        /// correct-outcome placeholder.
        #[arg(long)]
        canned_response: Option<PathBuf>,
    },

    /// Parse and validate an invocation envelope without running it.
    Validate {
        /// Path to the invocation envelope JSON. Reads stdin if omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("turn2=debug")
    } else {
        tracing_subscriber::EnvFilter::new("turn2=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Run {
            input,
            base_dir,
            canned_response,
        } => cmd_run(input, base_dir, canned_response).await,
        Commands::Validate { input } => cmd_validate(input),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(EXIT_RUNTIME_ERROR);
    }
}

fn read_envelope(input: Option<PathBuf>) -> Result<serde_json::Value> {
    let raw = match input {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read invocation envelope from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("parse invocation envelope as JSON")
}

fn cmd_validate(input: Option<PathBuf>) -> Result<()> {
    let envelope = read_envelope(input)?;
    match turn2_runtime::transform(&envelope) {
        Ok(request) => {
            println!("valid: {}", request.verification_context.verification_id);
            Ok(())
        }
        Err(err) => anyhow::bail!("invalid envelope: {err}"),
    }
}

async fn cmd_run(
    input: Option<PathBuf>,
    base_dir: PathBuf,
    canned_response: Option<PathBuf>,
) -> Result<()> {
    let envelope = read_envelope(input)?;
    let config = Turn2Config::from_env().context("load configuration from environment")?;

    let object_store =
        FsObjectStore::new(base_dir.join("objects")).context("open local object store")?;
    let record_store =
        FsRecordStore::new(base_dir.join("records")).context("open local record store")?;
    let provider = build_provider(canned_response)?;

    let orchestrator = Turn2Orchestrator::new(&object_store, &record_store, &provider, config);
    let response = orchestrator
        .run(&envelope)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("run Turn-2 invocation")?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn build_provider(canned_response: Option<PathBuf>) -> Result<impl LlmProvider> {
    let text = match canned_response {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("read canned response {}", path.display()))?,
        None => "Verification Outcome: CORRECT\n\nSummary: no discrepancies found.".to_string(),
    };
    Ok(MockLlmProvider::new(RawConverseResult {
        content_blocks: vec![ContentBlock::Text { text }],
        token_usage: TokenUsage::new(0, 0, 0),
        model_id: "local-canned".into(),
        request_id: None,
        stop_reason: "end_turn".into(),
        latency_ms: 0,
    }))
}
