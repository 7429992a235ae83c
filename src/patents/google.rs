//! Google Patents client
//!
//! Pages live at `https://patents.google.com/patent/{ID}/en`, where `ID` is the
//! jurisdiction, number and kind code without separators (`US7654321B2`).
//! The `/en` suffix asks for the English rendering of foreign patents.

use super::{extract_title, DocumentFetcher, FetchError, TitleError, TitleRules};
use crate::utils::RetryPolicy;
use tracing::{debug, warn};

/// Drop separators and uppercase, e.g. `"us 7,654,321 b2"` -> `"US7654321B2"`
pub fn normalize_patent_id(patent_id: &str) -> String {
    patent_id
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '/' | ',' | '.'))
        .flat_map(char::to_uppercase)
        .collect()
}

pub struct GooglePatents {
    base_url: String,
    fetcher: Box<dyn DocumentFetcher>,
    retry: RetryPolicy,
    rules: TitleRules,
}

impl GooglePatents {
    pub fn new(
        base_url: &str,
        fetcher: Box<dyn DocumentFetcher>,
        retry: RetryPolicy,
        rules: TitleRules,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            fetcher,
            retry,
            rules,
        }
    }

    pub fn page_url(&self, patent_id: &str) -> String {
        format!("{}/patent/{}/en", self.base_url, normalize_patent_id(patent_id))
    }

    /// Fetch the patent page and return its validated title
    pub async fn fetch_title(&self, patent_id: &str) -> Result<String, TitleError> {
        let normalized = normalize_patent_id(patent_id);
        let url = self.page_url(patent_id);
        debug!(patent_id, url = %url, "Fetching patent page");

        let html = self
            .retry
            .run(|| self.fetcher.fetch(&url), FetchError::is_transient)
            .await
            .map_err(|e| match e {
                FetchError::Status(404) => {
                    warn!(patent_id, "English page not found; the patent may only exist in its original language");
                    TitleError::NotFound
                }
                other => TitleError::Fetch(other),
            })?;

        extract_title(&html, &normalized, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Returns the scripted outcomes in order, repeating the last one
    struct ScriptedFetcher {
        outcomes: Vec<Result<String, FetchError>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DocumentFetcher for ScriptedFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes[n.min(self.outcomes.len() - 1)].clone()
        }
    }

    fn client(outcomes: Vec<Result<String, FetchError>>) -> (GooglePatents, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = ScriptedFetcher {
            outcomes,
            calls: calls.clone(),
        };
        let patents = GooglePatents::new(
            "https://patents.google.com/",
            Box::new(fetcher),
            RetryPolicy::new(2, Duration::ZERO),
            TitleRules::default(),
        );
        (patents, calls)
    }

    fn title_page(title: &str) -> String {
        format!(r#"<html><body><span itemprop="title">{}</span></body></html>"#, title)
    }

    #[test]
    fn test_normalize_patent_id() {
        assert_eq!(normalize_patent_id("US 7,654,321 B2"), "US7654321B2");
        assert_eq!(normalize_patent_id("wo2019/123456a1"), "WO2019123456A1");
        assert_eq!(normalize_patent_id("CN-105384684-A"), "CN105384684A");
        assert_eq!(normalize_patent_id("AB1234C1"), "AB1234C1");
    }

    #[test]
    fn test_page_url() {
        let (patents, _) = client(vec![Err(FetchError::Timeout)]);
        assert_eq!(
            patents.page_url("US 7,654,321 B2"),
            "https://patents.google.com/patent/US7654321B2/en"
        );
    }

    #[tokio::test]
    async fn test_title_fetched() {
        let (patents, calls) = client(vec![Ok(title_page("Foo"))]);
        assert_eq!(patents.fetch_title("AB1234C1").await, Ok("Foo".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_retried_once() {
        let (patents, calls) = client(vec![Err(FetchError::Status(503)), Ok(title_page("Foo"))]);
        assert_eq!(patents.fetch_title("AB1234C1").await, Ok("Foo".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_two_timeouts_are_terminal() {
        let (patents, calls) = client(vec![Err(FetchError::Timeout)]);
        assert_eq!(
            patents.fetch_title("AB1234C1").await,
            Err(TitleError::Fetch(FetchError::Timeout))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_not_retried() {
        let (patents, calls) = client(vec![Err(FetchError::Status(404))]);
        assert_eq!(patents.fetch_title("US1").await, Err(TitleError::NotFound));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_against_http_server() {
        let mut server = mockito::Server::new_async().await;
        let found = server
            .mock("GET", "/patent/US7654321B2/en")
            .with_status(200)
            .with_body(title_page("Pyridine derivatives"))
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/patent/EP1000000A1/en")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let fetcher = crate::patents::ReqwestFetcher::new(Duration::from_secs(5)).unwrap();
        let patents = GooglePatents::new(
            &server.url(),
            Box::new(fetcher),
            RetryPolicy::new(2, Duration::ZERO),
            TitleRules::default(),
        );

        assert_eq!(
            patents.fetch_title("US 7,654,321 B2").await,
            Ok("Pyridine derivatives".to_string())
        );
        assert_eq!(patents.fetch_title("EP 1 000 000 A1").await, Err(TitleError::NotFound));

        found.assert_async().await;
        missing.assert_async().await;
    }
}
