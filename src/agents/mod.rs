//! Agent System
//!
//! The two agents behind a patent search:
//!
//! - **Discovery Agent**: asks the LLM (with web search) for candidate patents
//! - **Verification Agent**: checks each candidate's title against Google Patents
//!
//! ## Pipeline Overview
//!
//! ```text
//! Compound name
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Discovery   │  → Candidate patents (possibly none)
//! │    Agent     │
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │ Verification │  → One record per candidate, saved after each
//! │    Agent     │
//! └──────────────┘
//!      │
//!      ▼
//!  Final snapshot + summary
//! ```

pub mod discovery;
pub mod verification;

pub use discovery::{parse_candidates, PatentDiscovery};
pub use verification::{TitleVerifier, VerificationSettings};

use crate::config::Config;
use crate::llm::provider::{LLMProviderConfig, LLM};
use crate::models::{SearchQuery, SearchResult, SearchSummary};
use crate::patents::{GooglePatents, ReqwestFetcher, TitleRules};
use crate::storage::ResultStore;
use crate::types::{AppError, AppResult};
use crate::utils::RetryPolicy;
use tracing::{error, info, warn};

pub struct PatentSearchPipeline {
    discovery: PatentDiscovery,
    verifier: TitleVerifier,
    store: ResultStore,
}

impl PatentSearchPipeline {
    pub fn new(discovery: PatentDiscovery, verifier: TitleVerifier, store: ResultStore) -> Self {
        Self {
            discovery,
            verifier,
            store,
        }
    }

    /// Wire up the production collaborators from a validated config
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let llm = LLM::new(LLMProviderConfig::openai(&config.llm))?;

        let v = &config.verification;
        let fetcher = ReqwestFetcher::new(v.request_timeout())
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let patents = GooglePatents::new(
            &v.patents_base_url,
            Box::new(fetcher),
            RetryPolicy::new(v.max_fetch_attempts, v.retry_delay()),
            TitleRules {
                max_chars: v.title_max_chars,
                max_sentences: v.title_max_sentences,
            },
        );

        Ok(Self::new(
            PatentDiscovery::new(llm),
            TitleVerifier::new(patents, VerificationSettings::from(v)),
            ResultStore::new(&config.output.results_dir),
        ))
    }

    /// Discovery once, then verification of each candidate in discovery
    /// order. Only storage preparation and LLM failures abort the run.
    pub async fn run(&self, query: &SearchQuery) -> AppResult<SearchSummary> {
        info!(
            compound = %query.compound(),
            max_patents = query.max_results(),
            model = %query.model(),
            "Starting patent search"
        );

        let output_path = self.store.prepare(query.compound())?;
        match self.store.load(query.compound()) {
            Ok(Some(previous)) => info!(
                records = previous.verified_patents.len(),
                completed = previous.completed,
                "Replacing previous result for this compound"
            ),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Previous result is unreadable and will be replaced"),
        }

        info!("Step 1: patent discovery");
        let candidates = match self.discovery.discover(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(error = %e, api_error = e.is_api_error(), "Patent discovery failed");
                return Err(e);
            }
        };

        // Fresh snapshot before the first fetch, so an older run's result
        // never stands in for this one
        let mut result = SearchResult::new(query, candidates.len());
        if let Err(e) = self.store.save(&result) {
            warn!(error = %e, "Failed to write initial snapshot");
        }

        if candidates.is_empty() {
            warn!(compound = %query.compound(), "No patents found");
        } else {
            info!("Step 2: title verification");
            self.verifier.verify_all(&candidates, &mut result, &self.store).await;
        }

        result.mark_completed();
        if let Err(e) = self.store.save(&result) {
            warn!(error = %e, "Failed to write final snapshot");
        }

        let summary = SearchSummary::from_result(result, output_path);
        info!(
            found = summary.patents_found,
            verified = summary.patents_verified,
            success_rate = summary.success_rate,
            path = ?summary.output_path,
            "Search complete"
        );
        Ok(summary)
    }
}
