// src/checker.rs - Verdict Checker: prompt the model, test for the brand

use crate::completion::CompletionService;
use crate::prompt;
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Result of one successful check. A failed completion call never
/// produces an outcome, so the caller only ever logs real answers.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub recommended: bool,
    pub answer: String,
}

/// Case-insensitive substring containment of the brand name in the answer.
///
/// This is a heuristic, not semantic understanding: paraphrases produce
/// false negatives and coincidental substrings produce false positives.
/// No width normalization or brand aliasing is applied.
pub fn classify(brand_name: &str, answer: &str) -> bool {
    answer.to_lowercase().contains(&brand_name.to_lowercase())
}

pub struct Checker {
    service: Arc<dyn CompletionService>,
}

impl Checker {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Runs one check. Pure query: writing the interaction log is the
    /// caller's responsibility.
    pub async fn run(&self, keyword: &str, brand_name: &str) -> Result<CheckOutcome> {
        // Input validation happens before any network traffic.
        if keyword.trim().is_empty() || brand_name.trim().is_empty() {
            return Err(anyhow!("キーワードと自社名を入力してください。"));
        }

        let answer = self
            .service
            .complete(prompt::SYSTEM_PROMPT, &prompt::user_prompt(keyword, brand_name))
            .await?;

        Ok(CheckOutcome {
            recommended: classify(brand_name, &answer),
            answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubService {
        answer: String,
        calls: AtomicUsize,
    }

    impl StubService {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionService for StubService {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert!(classify("freee", "I would recommend FREEE for accounting."));
        assert!(classify("Freee", "freee is a popular choice."));
        assert!(!classify("freee", "MoneyForward is the usual pick."));
    }

    #[test]
    fn test_classify_japanese_brand() {
        assert!(classify("〇〇ダイニング", "〇〇ダイニング がおすすめです"));
        assert!(!classify("〇〇ダイニング", "他の店をおすすめします"));
    }

    #[tokio::test]
    async fn test_run_returns_recommended_on_match() {
        let stub = Arc::new(StubService::new("〇〇ダイニング がおすすめです"));
        let checker = Checker::new(stub.clone());

        let outcome = checker.run("渋谷 居酒屋 デート", "〇〇ダイニング").await.unwrap();
        assert!(outcome.recommended);
        assert_eq!(outcome.answer, "〇〇ダイニング がおすすめです");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_returns_not_recommended_without_match() {
        let stub = Arc::new(StubService::new("推奨されていません。対策としては…"));
        let checker = Checker::new(stub.clone());

        let outcome = checker.run("会計ソフト おすすめ", "freee").await.unwrap();
        assert!(!outcome.recommended);
    }

    #[tokio::test]
    async fn test_empty_inputs_are_rejected_before_any_call() {
        let stub = Arc::new(StubService::new("unused"));
        let checker = Checker::new(stub.clone());

        assert!(checker.run("", "freee").await.is_err());
        assert!(checker.run("会計ソフト", "   ").await.is_err());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }
}
