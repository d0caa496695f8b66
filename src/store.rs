// src/store.rs - Append-only interaction log (CSV file + in-memory impl)

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Byte-order mark written once at the top of the CSV so spreadsheet
/// tools open the Japanese text correctly.
pub const BOM: &str = "\u{feff}";

pub const CSV_HEADER: &str = "timestamp,keyword,brand_name,verdict,answer_excerpt";

const EXCERPT_MAX_CHARS: usize = 80;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Recommended,
    NotRecommended,
}

impl Verdict {
    pub fn from_flag(recommended: bool) -> Self {
        if recommended {
            Verdict::Recommended
        } else {
            Verdict::NotRecommended
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Verdict::Recommended => "〇",
            Verdict::NotRecommended => "×",
        }
    }

    pub fn from_symbol(s: &str) -> Self {
        if s == "〇" {
            Verdict::Recommended
        } else {
            Verdict::NotRecommended
        }
    }
}

/// One logged check. Immutable once written; duplicates are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: String,
    pub keyword: String,
    pub brand_name: String,
    pub verdict: Verdict,
    pub answer_excerpt: String,
}

impl InteractionRecord {
    /// Builds a record stamped with the local time. All free-text fields
    /// are sanitized so one record always occupies exactly one CSV row.
    pub fn new(keyword: &str, brand_name: &str, verdict: Verdict, answer: &str) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            keyword: sanitize_field(keyword),
            brand_name: sanitize_field(brand_name),
            verdict,
            answer_excerpt: sanitize_field(answer).chars().take(EXCERPT_MAX_CHARS).collect(),
        }
    }

    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.timestamp,
            self.keyword,
            self.brand_name,
            self.verdict.symbol(),
            self.answer_excerpt
        )
    }
}

fn sanitize_field(s: &str) -> String {
    s.replace(['\n', '\r'], " ").replace(',', "、").trim().to_string()
}

/// What a full read of the store produced. A corrupt store is a value,
/// not an `Err`: the admin page pairs it with the erase-and-recreate
/// recovery action instead of treating it like an I/O failure.
#[derive(Debug, Clone)]
pub enum LogContents {
    Records(Vec<InteractionRecord>),
    Corrupt { reason: String },
}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Appends one row, creating the store with BOM + header when it is
    /// absent or zero-byte. The header is never written twice.
    async fn append(&self, record: &InteractionRecord) -> Result<()>;

    /// Reads the whole store. An absent or empty store yields empty
    /// `Records`; a header missing the required columns yields `Corrupt`.
    async fn load_all(&self) -> Result<LogContents>;

    /// Deletes the entire store irreversibly. Gating is the caller's job.
    async fn clear(&self) -> Result<()>;

    /// The current store as CSV text, for the download affordance.
    async fn export_csv(&self) -> Result<String>;
}

/// File-backed store. No locking: concurrent writers can interleave
/// rows destructively. Known limitation, single-operator tool.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InteractionStore for CsvStore {
    async fn append(&self, record: &InteractionRecord) -> Result<()> {
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log at {:?}", self.path))?;

        if needs_header {
            writeln!(file, "{}{}", BOM, CSV_HEADER)?;
        }
        writeln!(file, "{}", record.to_csv_row())?;
        Ok(())
    }

    async fn load_all(&self) -> Result<LogContents> {
        if !self.path.exists() {
            return Ok(LogContents::Records(Vec::new()));
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read log at {:?}", self.path))?;
        let raw = raw.strip_prefix(BOM).unwrap_or(&raw);

        let mut lines = raw.lines();
        let header = match lines.next() {
            Some(h) => h,
            None => return Ok(LogContents::Records(Vec::new())),
        };

        let columns: Vec<&str> = header.split(',').map(|c| c.trim()).collect();
        let missing: Vec<&str> = ["timestamp", "keyword"]
            .into_iter()
            .filter(|required| !columns.contains(required))
            .collect();
        if !missing.is_empty() {
            return Ok(LogContents::Corrupt {
                reason: format!("ログのヘッダーに必須列がありません: {}", missing.join(", ")),
            });
        }

        let mut records = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.splitn(5, ',').collect();
            if parts.len() != 5 {
                continue;
            }
            records.push(InteractionRecord {
                timestamp: parts[0].to_string(),
                keyword: parts[1].to_string(),
                brand_name: parts[2].to_string(),
                verdict: Verdict::from_symbol(parts[3]),
                answer_excerpt: parts[4].to_string(),
            });
        }
        Ok(LogContents::Records(records))
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete log at {:?}", self.path))?;
        }
        Ok(())
    }

    async fn export_csv(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        Ok(fs::read_to_string(&self.path)?)
    }
}

/// Vec-backed store for tests and embedding.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<InteractionRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn append(&self, record: &InteractionRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<LogContents> {
        Ok(LogContents::Records(self.records.lock().unwrap().clone()))
    }

    async fn clear(&self) -> Result<()> {
        self.records.lock().unwrap().clear();
        Ok(())
    }

    async fn export_csv(&self) -> Result<String> {
        let records = self.records.lock().unwrap();
        let mut out = format!("{}{}\n", BOM, CSV_HEADER);
        for record in records.iter() {
            out.push_str(&record.to_csv_row());
            out.push('\n');
        }
        Ok(out)
    }
}
