//! Chorus demo CLI
//!
//! Fans one prompt out across every backend configured in the environment
//! and prints each backend's answer.
//!
//! Run with: cargo run --bin chorus -- "<model>" "why is the sky blue"
//! (model may be empty to use each provider's default)

use chorus::{options, Anthropic, HuggingFace, Ollama, OpenAi, ProviderMap, Settings};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Ctrl-C or this deadline cancels every in-flight provider call.
const DEADLINE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let model = args.next().unwrap_or_default();
    let prompt = args
        .next()
        .unwrap_or_else(|| "why is the sky blue".to_string());

    let settings = Settings::from_env();
    let mut providers = ProviderMap::new();

    // Ollama needs no credential; the vendors join only when a key is set.
    match Ollama::from_settings(&settings) {
        Ok(p) => providers = providers.with(Arc::new(p)),
        Err(err) => eprintln!("skipping ollama: {err}"),
    }
    if settings.openai_api_key.is_some() {
        match OpenAi::from_settings(&settings) {
            Ok(p) => providers = providers.with(Arc::new(p)),
            Err(err) => eprintln!("skipping openai: {err}"),
        }
    }
    if settings.anthropic_api_key.is_some() {
        match Anthropic::from_settings(&settings) {
            Ok(p) => providers = providers.with(Arc::new(p)),
            Err(err) => eprintln!("skipping anthropic: {err}"),
        }
    }
    if settings.huggingface_api_key.is_some() {
        match HuggingFace::from_settings(&settings) {
            Ok(p) => providers = providers.with(Arc::new(p)),
            Err(err) => eprintln!("skipping huggingface: {err}"),
        }
    }

    if providers.is_empty() {
        eprintln!("no providers configured");
        return ExitCode::FAILURE;
    }
    println!("asking: {}", providers.describe());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = tokio::time::sleep(DEADLINE) => {}
        }
        canceller.cancel();
    });

    let opts = [options::model(model), options::user_messages([prompt])];
    match providers.completion_many(&cancel, &opts).await {
        Ok(responses) => {
            for (name, response) in &responses {
                println!("\n=== {name} ===\n{response}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("fan-out failed: {err}");
            ExitCode::FAILURE
        }
    }
}
