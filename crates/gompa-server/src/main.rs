//! Gompa — Sikkim monasteries travel-guide chatbot API.

use std::sync::Arc;

use gompa_core::GompaConfig;
use gompa_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn key_status(present: bool) -> &'static str {
    if present {
        "set"
    } else {
        "missing"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" | "help" => {
                println!("Gompa — Sikkim monasteries chatbot API");
                println!();
                println!("Usage: gompa");
                println!();
                println!("Configuration is read from the environment:");
                println!("  PORT, APP_ENV, PROVIDER (groq|openai)");
                println!("  GROQ_API_KEY, GROQ_MODEL, OPENAI_API_KEY, OPENAI_MODEL");
                println!("  LLM_TEMPERATURE, LLM_MAX_TOKENS");
                println!("  USE_WEB_SEARCH, BING_API_KEY, BING_ENDPOINT");
                println!("  SEARCH_MARKET, SEARCH_RESULT_COUNT");
                println!("  REQUEST_TIMEOUT_SECS, CORS_ORIGIN, RUST_LOG");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'gompa help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let config = GompaConfig::from_env();
    let port = config.port;

    info!("Environment: {}", config.environment);
    info!("Provider: {}", config.provider);
    info!(
        "Keys: GROQ={}, OPENAI={}, BING={}",
        key_status(config.groq.is_configured()),
        key_status(config.openai.is_configured()),
        key_status(config.search.api_key.is_some()),
    );
    if config.search.enabled {
        info!("Web search enabled ({} results per query)", config.search.count);
    }

    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gompa chatbot API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
