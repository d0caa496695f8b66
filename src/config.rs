// src/config.rs - File-backed configuration and credential sourcing

use anyhow::{anyhow, Context, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub max_tokens: u32,
    pub log_path: String,
    pub admin_password: String,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            log_path: "search_log.csv".to_string(),
            admin_password: "admin123".to_string(),
            bind_addr: "127.0.0.1:8388".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `config.toml` when present, otherwise falls back to defaults.
    /// A present-but-malformed file is a hard error, not a silent default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Malformed config at {:?}", path))
    }
}

/// Writes a default `config.toml` into the current directory.
pub fn init_workspace() -> Result<()> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        println!("{}", "✅ config.toml already exists.".green());
        return Ok(());
    }
    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config)?;
    fs::write(path, toml)?;
    println!("{}", "✨ Wrote default config.toml".green());
    println!("   Set {} in .env or the environment before starting.", "OPENAI_API_KEY".bold());
    Ok(())
}

/// Resolves the API key: environment (after dotenvy) first, then a
/// free-text console prompt. An empty key is a configuration error and
/// nothing starts without one.
pub fn resolve_api_key() -> Result<String> {
    if let Ok(key) = env::var("OPENAI_API_KEY") {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }

    print!("OPENAI_API_KEY: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    let key = line.trim().to_string();
    if key.is_empty() {
        return Err(anyhow!("APIキーが設定されていません。管理者に連絡してください。"));
    }
    Ok(key)
}
