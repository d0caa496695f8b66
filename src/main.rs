use osusume::checker::Checker;
use osusume::completion::OpenAiClient;
use osusume::config::{self, AppConfig};
use osusume::gate::AccessGate;
use osusume::server::{start_server, AppState};
use osusume::store::CsvStore;

use anyhow::{Context, Result};
use colored::*;
use std::env;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    if env::args().any(|a| a == "init") {
        return config::init_workspace();
    }

    // 1. Configuration (no module-level state; everything is passed down)
    let config = AppConfig::load(Path::new(config::CONFIG_FILE))?;
    let api_key = config::resolve_api_key().context("CRITICAL: no API key configured")?;

    // 2. Wire up the components
    let client = Arc::new(OpenAiClient::new(
        api_key,
        config.model.clone(),
        config.max_tokens,
    ));
    let checker = Checker::new(client);
    let store = Arc::new(CsvStore::new(&config.log_path));
    let gate = AccessGate::new(config.admin_password.clone());

    println!("{}", "🤖 AI検索・推奨チェッカー".green().bold());
    println!("   - Model: {}", config.model.cyan());
    println!("   - Log:   {}", config.log_path.cyan());

    // 3. Serve until interrupted
    let state = Arc::new(AppState {
        checker,
        store,
        gate,
    });
    start_server(state, &config.bind_addr).await
}
