use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sift_analyzer::{Analyzer, AnalyzerConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use sift_core::{
    AnalysisRequest, Classification, ISSUE_FALLBACK, ISSUE_TAXONOMY, PRODUCT_CATALOG,
};
use sift_inference::{WorkersAiClient, WorkersAiConfig, DEFAULT_GATEWAY_BASE_URL};
use sift_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "sift")]
#[command(about = "Classify feedback text by sentiment, product and issue")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze TEXT, or stdin when TEXT is omitted.
    Analyze {
        text: Option<String>,
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Print the three system prompts.
    Prompts,
    /// Print the product catalog and issue taxonomy.
    Catalog,
}

#[derive(Debug, Args)]
struct BackendArgs {
    #[arg(long, env = "SIFT_ACCOUNT_ID")]
    account_id: String,
    #[arg(long, env = "SIFT_API_TOKEN", hide_env_values = true)]
    api_token: String,
    #[arg(long, env = "SIFT_GATEWAY_ID")]
    gateway_id: String,
    #[arg(long, env = "SIFT_GATEWAY_BASE_URL", default_value = DEFAULT_GATEWAY_BASE_URL)]
    base_url: String,
    #[arg(long, env = "SIFT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(long, env = "SIFT_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,
    #[arg(long, env = "SIFT_CALL_TIMEOUT_SECONDS", default_value_t = 20)]
    call_timeout_seconds: u64,
    #[arg(long, env = "SIFT_REQUEST_DEADLINE_SECONDS", default_value_t = 30)]
    deadline_seconds: u64,
    /// Ask the gateway to bypass its cache.
    #[arg(long)]
    skip_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("sift_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze { text, backend } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    io::stdin()
                        .read_to_string(&mut buffer)
                        .context("failed to read text from stdin")?;
                    buffer
                }
            };
            let request = AnalysisRequest::new(&text).context("Text is required")?;

            let analyzer = build_analyzer(backend)?;
            let result = analyzer.analyze(request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Prompts => {
            for axis in Classification::ALL {
                println!("[{axis}]\n{}\n", axis.system_prompt());
            }
        }
        Command::Catalog => {
            println!("{}", serde_json::to_string_pretty(&catalog_json())?);
        }
    }

    Ok(())
}

fn catalog_json() -> serde_json::Value {
    serde_json::json!({
        "products": &PRODUCT_CATALOG[..],
        "issues": &ISSUE_TAXONOMY[..],
        "issue_fallback": ISSUE_FALLBACK,
    })
}

fn build_analyzer(args: BackendArgs) -> Result<Analyzer> {
    let per_call_timeout = Duration::from_secs(args.call_timeout_seconds.max(1));
    let client = WorkersAiClient::connect(
        WorkersAiConfig {
            base_url: args.base_url,
            account_id: args.account_id,
            api_token: args.api_token,
        },
        per_call_timeout,
    )
    .context("failed to build inference client")?;

    let mut config = AnalyzerConfig::new(args.gateway_id);
    config.model = args.model;
    config.max_tokens = args.max_tokens;
    config.per_call_timeout = per_call_timeout;
    config.request_deadline = Duration::from_secs(args.deadline_seconds.max(1));
    config.skip_cache = args.skip_cache;

    Ok(Analyzer::new(
        Arc::new(client),
        config,
        AppMetrics::shared(),
    ))
}
