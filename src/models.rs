// Core records produced and persisted by the search pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One compound search request. Fixed once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    compound: String,
    max_results: usize,
    model: String,
}

impl SearchQuery {
    pub fn new(compound: impl Into<String>, max_results: usize, model: impl Into<String>) -> Self {
        Self {
            compound: compound.into(),
            max_results,
            model: model.into(),
        }
    }

    pub fn compound(&self) -> &str {
        &self.compound
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// A patent reported by the LLM, not yet checked against the patent database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentCandidate {
    pub patent_id: String,
    /// Title as claimed by the model
    pub title: String,
    pub relevancy: String,
}

/// A candidate augmented with the outcome of title verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedPatent {
    pub patent_id: String,
    pub title: String,
    pub relevancy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_title: Option<String>,
    pub similarity_score: f64,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_note: Option<String>,
}

impl VerifiedPatent {
    /// Record for a candidate whose canonical title could not be obtained
    pub fn unverified(candidate: &PatentCandidate) -> Self {
        Self {
            patent_id: candidate.patent_id.clone(),
            title: candidate.title.clone(),
            relevancy: candidate.relevancy.clone(),
            scraped_title: None,
            similarity_score: 0.0,
            verified: false,
            language_note: None,
        }
    }
}

/// Everything known about one compound search. This is the document written
/// to disk after every verified patent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub compound: String,
    pub model: String,
    pub patents_found: usize,
    pub patents_verified: usize,
    pub success_rate: f64,
    /// False while verification is still running
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
    pub verified_patents: Vec<VerifiedPatent>,
}

impl SearchResult {
    pub fn new(query: &SearchQuery, patents_found: usize) -> Self {
        Self {
            compound: query.compound().to_string(),
            model: query.model().to_string(),
            patents_found,
            patents_verified: 0,
            success_rate: 0.0,
            completed: false,
            updated_at: Utc::now(),
            verified_patents: Vec::new(),
        }
    }

    /// Append a record and refresh the counters
    pub fn push(&mut self, patent: VerifiedPatent) {
        if patent.verified {
            self.patents_verified += 1;
        }
        self.verified_patents.push(patent);
        self.success_rate = success_rate(self.patents_verified, self.patents_found);
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.updated_at = Utc::now();
    }
}

/// Final counters and records reported back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub compound: String,
    pub patents_found: usize,
    pub patents_verified: usize,
    pub success_rate: f64,
    pub output_path: PathBuf,
    /// Every record, in discovery order
    pub patents: Vec<VerifiedPatent>,
}

impl SearchSummary {
    pub fn from_result(result: SearchResult, output_path: PathBuf) -> Self {
        Self {
            compound: result.compound,
            patents_found: result.patents_found,
            patents_verified: result.patents_verified,
            success_rate: result.success_rate,
            output_path,
            patents: result.verified_patents,
        }
    }
}

impl std::fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} found, {} verified, success rate {:.1}%",
            self.patents_found,
            self.patents_verified,
            self.success_rate * 100.0
        )
    }
}

/// verified / found, or 0 when nothing was found
pub fn success_rate(verified: usize, found: usize) -> f64 {
    if found == 0 {
        0.0
    } else {
        verified as f64 / found as f64
    }
}
