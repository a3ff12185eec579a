//! dealboard - Business intelligence answers over monday.com boards

mod cli;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dealboard_core::config::{DEFAULT_GROQ_API_URL, DEFAULT_GROQ_MODEL, DEFAULT_MONDAY_API_URL};
use dealboard_core::models::AskRequest;
use dealboard_core::{AppConfig, GroqNarrator, MondayClient, Orchestrator};
use dealboard_web::AppState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dealboard",
    version,
    about = "Business intelligence answers over monday.com Deals and Work Orders boards",
    long_about = "Answers founder-level questions about pipeline and collections.\n\
                  \n\
                  Board data is fetched from monday.com, cleaned, reduced to metrics and\n\
                  narrated by a Groq-hosted model. Board data and answers are cached.\n\
                  \n\
                  Examples:\n\
                    dealboard                                   # Serve the HTTP API (default)\n\
                    dealboard serve --port 9000                 # Custom port\n\
                    dealboard ask \"What's our pipeline?\"        # One question, table output\n\
                    dealboard ask \"Leadership update\" --json    # Full response as JSON\n\
                    dealboard summary                           # Board completeness overview\n\
                  \n\
                  Settings are read from the environment (and a .env file if present):\n\
                    MONDAY_API_KEY, DEALS_BOARD_ID, WORK_ORDERS_BOARD_ID, GROQ_API_KEY (required)\n\
                    MONDAY_API_URL, MONDAY_PAGE_SIZE, GROQ_MODEL, GROQ_API_URL,\n\
                    CACHE_BOARD_TTL, CACHE_RESPONSE_TTL, DEBUG, LOG_LEVEL"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    #[command(flatten)]
    settings: Settings,

    /// Disable ANSI colors in tables
    #[arg(long, global = true, env = "DEALBOARD_NO_COLOR")]
    no_color: bool,
}

#[derive(Args)]
struct Settings {
    /// monday.com API token
    #[arg(long, global = true, env = "MONDAY_API_KEY", hide_env_values = true)]
    monday_api_key: Option<String>,

    /// monday.com GraphQL endpoint
    #[arg(long, global = true, env = "MONDAY_API_URL", default_value = DEFAULT_MONDAY_API_URL)]
    monday_api_url: String,

    /// Deals board id
    #[arg(long, global = true, env = "DEALS_BOARD_ID")]
    deals_board_id: Option<String>,

    /// Work Orders board id
    #[arg(long, global = true, env = "WORK_ORDERS_BOARD_ID")]
    work_orders_board_id: Option<String>,

    /// Items per page when paginating a board
    #[arg(long, global = true, env = "MONDAY_PAGE_SIZE", default_value = "100")]
    monday_page_size: u32,

    /// Groq API key
    #[arg(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    /// Groq model name
    #[arg(long, global = true, env = "GROQ_MODEL", default_value = DEFAULT_GROQ_MODEL)]
    groq_model: String,

    /// Groq OpenAI-compatible API base
    #[arg(long, global = true, env = "GROQ_API_URL", default_value = DEFAULT_GROQ_API_URL)]
    groq_api_url: String,

    /// Board cache TTL in seconds
    #[arg(long, global = true, env = "CACHE_BOARD_TTL", default_value = "180")]
    cache_board_ttl: u64,

    /// Response cache TTL in seconds
    #[arg(long, global = true, env = "CACHE_RESPONSE_TTL", default_value = "300")]
    cache_response_ttl: u64,

    /// Expose internal error detail in API responses
    #[arg(long, global = true, env = "DEBUG")]
    debug: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Settings {
    fn into_config(self) -> AppConfig {
        AppConfig {
            monday_api_key: self.monday_api_key.unwrap_or_default(),
            monday_api_url: self.monday_api_url,
            deals_board_id: self.deals_board_id.unwrap_or_default(),
            work_orders_board_id: self.work_orders_board_id.unwrap_or_default(),
            monday_page_size: self.monday_page_size,
            groq_api_key: self.groq_api_key.unwrap_or_default(),
            groq_model: self.groq_model,
            groq_api_url: self.groq_api_url,
            board_cache_ttl: Duration::from_secs(self.cache_board_ttl),
            response_cache_ttl: Duration::from_secs(self.cache_response_ttl),
            debug: self.debug,
            log_level: self.log_level,
            ..AppConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Mode {
    /// Serve the HTTP API (default)
    Serve {
        /// Bind address
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        /// Port for the web server
        #[arg(long, env = "PORT", default_value = "8000")]
        port: u16,
    },
    /// Ask one question and print the answer
    Ask {
        /// Natural-language question
        question: String,
        /// Output the full response as JSON
        #[arg(long)]
        json: bool,
        /// Include the raw data summary
        #[arg(long)]
        raw: bool,
    },
    /// Show board completeness and data quality
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let no_color = cli.no_color;
    let config = cli.settings.into_config();

    init_logging(&config.log_level);
    config.validate().context("Invalid configuration")?;

    match cli.mode.unwrap_or(Mode::Serve {
        host: config.host.clone(),
        port: config.port,
    }) {
        Mode::Serve { host, port } => {
            let config = AppConfig { host, port, ..config };
            run_serve(config).await?;
        }
        Mode::Ask {
            question,
            json,
            raw,
        } => {
            run_ask(&config, question, json, raw, no_color).await?;
        }
        Mode::Summary { json } => {
            run_summary(&config, json, no_color).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so `--json` output stays clean
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let source = MondayClient::from_config(config).context("Failed to create monday.com client")?;
    let narrator = GroqNarrator::from_config(config).context("Failed to create Groq client")?;

    Ok(Orchestrator::new(
        Arc::new(source),
        Arc::new(narrator),
        config.caches(),
        config,
    ))
}

async fn run_serve(config: AppConfig) -> Result<()> {
    let orchestrator = Arc::new(build_orchestrator(&config)?);
    info!(
        deals_board = %config.deals_board_id,
        work_orders_board = %config.work_orders_board_id,
        model = %config.groq_model,
        board_ttl_secs = config.board_cache_ttl.as_secs(),
        response_ttl_secs = config.response_cache_ttl.as_secs(),
        "Starting dealboard API"
    );

    let state = Arc::new(AppState::new(orchestrator, config.debug));
    dealboard_web::run(state, &config.bind_address()).await
}

async fn run_ask(
    config: &AppConfig,
    question: String,
    json: bool,
    raw: bool,
    no_color: bool,
) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let start = Instant::now();

    let spinner = (!json).then(|| cli::spinner("Fetching boards and generating insights..."));
    let result = orchestrator
        .ask(AskRequest::new(question).with_raw_data(raw))
        .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match result {
        Ok(response) => {
            println!("{}", cli::format_answer(&response, json, no_color));
            if !json {
                eprintln!("✓ Answered in {:.2}s", start.elapsed().as_secs_f64());
            }
            Ok(())
        }
        Err(error) => {
            eprintln!("{}", cli::format_pipeline_error(&error, no_color));
            Err(anyhow::Error::new(error).context("Question could not be answered"))
        }
    }
}

async fn run_summary(config: &AppConfig, json: bool, no_color: bool) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;

    let spinner = (!json).then(|| cli::spinner("Fetching boards..."));
    let result = orchestrator.board_summary().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let summary = result.context("Failed to fetch board data")?;
    println!("{}", cli::format_summary(&summary, json, no_color));
    Ok(())
}
