//! Title Verification Agent
//!
//! For every candidate: fetch the canonical title from the patent database,
//! score it against the claimed title and persist the growing result after
//! each record. Per-patent failures never stop the batch; they produce an
//! unverified record instead.

use crate::analysis::{is_non_latin, script::LANGUAGE_NOTE, title_similarity};
use crate::config::VerificationConfig;
use crate::models::{PatentCandidate, SearchResult, VerifiedPatent};
use crate::patents::{GooglePatents, TitleError};
use crate::storage::ResultStore;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Scoring knobs taken from the verification config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationSettings {
    pub similarity_threshold: f64,
    pub non_latin_threshold: f64,
    /// Pause before every page fetch
    pub request_delay: Duration,
}

impl From<&VerificationConfig> for VerificationSettings {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            non_latin_threshold: config.non_latin_threshold,
            request_delay: config.request_delay(),
        }
    }
}

pub struct TitleVerifier {
    patents: GooglePatents,
    settings: VerificationSettings,
}

impl TitleVerifier {
    pub fn new(patents: GooglePatents, settings: VerificationSettings) -> Self {
        Self { patents, settings }
    }

    /// Score a scraped title against the candidate's claimed title
    pub fn score(&self, candidate: &PatentCandidate, scraped_title: String) -> VerifiedPatent {
        let similarity = title_similarity(&candidate.title, &scraped_title).clamp(0.0, 1.0);
        let language_note = is_non_latin(&scraped_title, self.settings.non_latin_threshold)
            .then(|| LANGUAGE_NOTE.to_string());

        VerifiedPatent {
            patent_id: candidate.patent_id.clone(),
            title: candidate.title.clone(),
            relevancy: candidate.relevancy.clone(),
            scraped_title: Some(scraped_title),
            similarity_score: similarity,
            verified: similarity >= self.settings.similarity_threshold,
            language_note,
        }
    }

    /// Verify one candidate. Always yields a record.
    pub async fn verify(&self, candidate: &PatentCandidate) -> VerifiedPatent {
        if !self.settings.request_delay.is_zero() {
            sleep(self.settings.request_delay).await;
        }

        match self.patents.fetch_title(&candidate.patent_id).await {
            Ok(scraped) => {
                let record = self.score(candidate, scraped);
                info!(
                    patent_id = %record.patent_id,
                    similarity = record.similarity_score,
                    claimed = %record.title,
                    actual = record.scraped_title.as_deref().unwrap_or_default(),
                    "Title compared"
                );
                if record.verified {
                    info!(patent_id = %record.patent_id, "Patent verified");
                } else {
                    warn!(patent_id = %record.patent_id, "Patent saved with low similarity");
                }
                if record.language_note.is_some() {
                    info!(patent_id = %record.patent_id, "Scraped title is in a non-Latin script");
                }
                record
            }
            Err(e) => {
                match &e {
                    TitleError::ValidationRejected(reason) => {
                        warn!(patent_id = %candidate.patent_id, reason = %reason, "Scraped text is not a title")
                    }
                    other => warn!(patent_id = %candidate.patent_id, error = %other, "Could not obtain patent title"),
                }
                VerifiedPatent::unverified(candidate)
            }
        }
    }

    /// Verify candidates in order, appending each record to `result` and
    /// writing the snapshot after every append.
    pub async fn verify_all(
        &self,
        candidates: &[PatentCandidate],
        result: &mut SearchResult,
        store: &ResultStore,
    ) {
        info!(count = candidates.len(), "Verifying patents");

        for (i, candidate) in candidates.iter().enumerate() {
            info!(
                index = i + 1,
                total = candidates.len(),
                patent_id = %candidate.patent_id,
                "Verifying patent"
            );

            let record = self.verify(candidate).await;
            result.push(record);

            match store.save(result) {
                Ok(path) => info!(patent_id = %candidate.patent_id, path = ?path, "Saved patent"),
                Err(e) => warn!(patent_id = %candidate.patent_id, error = %e, "Failed to save snapshot"),
            }
        }

        info!(
            verified = result.patents_verified,
            total = candidates.len(),
            "Verification complete"
        );
    }
}
