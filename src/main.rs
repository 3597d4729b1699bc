use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use dotenvy::dotenv;
use tracing::{info, warn};

mod analysis;
mod auth;
mod db;
mod feedback;
mod server;
mod transcription;

use analysis::Analyzer;
use feedback::{GroqClient, GroqConfig};
use server::AppState;
use transcription::{DeepgramClient, DeepgramConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:data/podium.db?mode=rwc".to_string());
    let db_pool = db::init_db(&database_url)
        .await
        .context("Failed to initialize database")?;
    info!("Database initialized successfully");

    let deepgram_key = std::env::var("DEEPGRAM_API_KEY").unwrap_or_default();
    let groq_key = std::env::var("GROQ_API_KEY").unwrap_or_default();
    if deepgram_key.is_empty() {
        warn!("DEEPGRAM_API_KEY is not set; transcription requests will fail");
    }
    if groq_key.is_empty() {
        warn!("GROQ_API_KEY is not set; coaching feedback will be degraded");
    }
    let deepgram_configured = !deepgram_key.is_empty();
    let groq_configured = !groq_key.is_empty();

    let stt = DeepgramClient::new(DeepgramConfig::new(deepgram_key))
        .context("Failed to build transcription client")?;
    let feedback_client =
        GroqClient::new(GroqConfig::new(groq_key)).context("Failed to build feedback client")?;

    let state = AppState {
        db: db_pool,
        stt: Arc::new(stt),
        feedback: Arc::new(feedback_client),
        analyzer: Arc::new(Analyzer::default()),
        deepgram_configured,
        groq_configured,
    };

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()
        .context("Invalid BIND_ADDR")?;

    server::serve(addr, state).await
}
