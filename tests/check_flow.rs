//! End-to-end check flow against a stubbed completion service:
//! run the checker, append the outcome, read the log back.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use osusume::checker::Checker;
use osusume::completion::CompletionService;
use osusume::store::{
    CsvStore, InMemoryStore, InteractionRecord, InteractionStore, LogContents, Verdict,
};

struct StubService {
    answer: Result<String, String>,
    calls: AtomicUsize,
}

impl StubService {
    fn ok(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionService for StubService {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(anyhow!("{}", msg)),
        }
    }
}

async fn run_and_log(
    checker: &Checker,
    store: &dyn InteractionStore,
    keyword: &str,
    brand: &str,
) -> Result<()> {
    let outcome = checker.run(keyword, brand).await?;
    let record = InteractionRecord::new(
        keyword,
        brand,
        Verdict::from_flag(outcome.recommended),
        &outcome.answer,
    );
    store.append(&record).await
}

#[tokio::test]
async fn recommended_check_appends_one_record_with_maru_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::new(dir.path().join("search_log.csv"));
    let checker = Checker::new(Arc::new(StubService::ok("〇〇ダイニング がおすすめです")));

    run_and_log(&checker, &store, "渋谷 居酒屋 デート", "〇〇ダイニング")
        .await
        .unwrap();

    match store.load_all().await.unwrap() {
        LogContents::Records(records) => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].keyword, "渋谷 居酒屋 デート");
            assert_eq!(records[0].brand_name, "〇〇ダイニング");
            assert_eq!(records[0].verdict, Verdict::Recommended);
            assert_eq!(records[0].verdict.symbol(), "〇");
        }
        LogContents::Corrupt { reason } => panic!("unexpected corruption: {}", reason),
    }
}

#[tokio::test]
async fn failed_completion_writes_no_record() {
    let store = InMemoryStore::new();
    let checker = Checker::new(Arc::new(StubService::failing("insufficient_quota")));

    let result = run_and_log(&checker, &store, "会計ソフト おすすめ", "freee").await;
    assert!(result.is_err());

    match store.load_all().await.unwrap() {
        LogContents::Records(records) => assert!(records.is_empty()),
        LogContents::Corrupt { .. } => panic!(),
    }
}

#[tokio::test]
async fn empty_inputs_never_reach_the_service_and_log_is_unchanged() {
    let stub = Arc::new(StubService::ok("unused"));
    let store = InMemoryStore::new();
    let checker = Checker::new(stub.clone());

    assert!(run_and_log(&checker, &store, "", "freee").await.is_err());
    assert!(run_and_log(&checker, &store, "会計ソフト", "").await.is_err());

    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    match store.load_all().await.unwrap() {
        LogContents::Records(records) => assert!(records.is_empty()),
        LogContents::Corrupt { .. } => panic!(),
    }
}

#[tokio::test]
async fn n_checks_yield_n_records_then_clear_empties_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::new(dir.path().join("search_log.csv"));
    let checker = Checker::new(Arc::new(StubService::ok("freee is commonly recommended")));

    for i in 0..4 {
        run_and_log(&checker, &store, &format!("キーワード{}", i), "FREEE")
            .await
            .unwrap();
    }

    match store.load_all().await.unwrap() {
        LogContents::Records(records) => {
            assert_eq!(records.len(), 4);
            // Case-insensitive containment: FREEE matches "freee".
            assert!(records.iter().all(|r| r.verdict == Verdict::Recommended));
            assert_eq!(records[0].keyword, "キーワード0");
        }
        LogContents::Corrupt { reason } => panic!("unexpected corruption: {}", reason),
    }

    store.clear().await.unwrap();
    match store.load_all().await.unwrap() {
        LogContents::Records(records) => assert!(records.is_empty()),
        LogContents::Corrupt { .. } => panic!("cleared log must read as empty"),
    }
}
