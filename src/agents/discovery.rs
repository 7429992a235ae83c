//! Patent Discovery Agent
//!
//! Asks the LLM, with web search enabled, for patents describing the synthesis
//! of a compound and turns the answer into typed candidates. The answer must
//! match the requested JSON schema exactly; anything else is treated as a
//! malformed response and yields no candidates.

use crate::llm::provider::LLM;
use crate::models::{PatentCandidate, SearchQuery};
use crate::patents::normalize_patent_id;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, SearchContextSize, WebSearchOptions};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// One element of the model's JSON answer
#[derive(Debug, Deserialize)]
struct CandidateRaw {
    patent_id: String,
    title: String,
    #[serde(default)]
    relevancy: Option<String>,
}

pub struct PatentDiscovery {
    llm: LLM,
}

impl PatentDiscovery {
    pub fn new(llm: LLM) -> Self {
        Self { llm }
    }

    /// Run discovery for one compound.
    ///
    /// LLM failures are returned to the caller. A response that cannot be
    /// parsed is logged and produces an empty list.
    pub async fn discover(&self, query: &SearchQuery) -> AppResult<Vec<PatentCandidate>> {
        info!(
            compound = %query.compound(),
            model = %query.model(),
            provider = %self.llm.provider_name(),
            "Searching for patents"
        );

        let request = LLMRequest {
            model: query.model().to_string(),
            messages: vec![LLMMessage::user(Self::build_search_prompt(
                query.compound(),
                query.max_results(),
            ))],
            web_search: Some(WebSearchOptions {
                search_context_size: SearchContextSize::High,
            }),
        };

        let response = self.llm.create_response(&request).await?;
        info!(
            response_len = response.content.len(),
            finish_reason = %response.finish_reason,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            total_tokens = response.usage.total_tokens,
            "Received discovery response"
        );
        if response.finish_reason != "completed" {
            warn!(finish_reason = %response.finish_reason, "Discovery response may be truncated");
        }

        match parse_candidates(&response.content) {
            Ok(candidates) => {
                let candidates = dedupe_and_limit(candidates, query.max_results());
                info!(count = candidates.len(), "Discovery found candidate patents");
                Ok(candidates)
            }
            Err(e) => {
                error!(error = %e, "Failed to parse discovery response; continuing with no candidates");
                Ok(Vec::new())
            }
        }
    }

    /// Create the patent search prompt
    pub fn build_search_prompt(compound: &str, max_patents: usize) -> String {
        format!(r#"You are an expert patent searcher. Use web search to find the patents most relevant to the chemical compound below, together with their patent ids.

GUIDELINES:
- First collect every patent that specifically focuses on the synthesis of the compound (the synthesis is mentioned directly in the title, abstract or claims).
- Then collect patents that spend a substantial part of their disclosure on synthesizing the compound, for example as an intermediate.
- Search worldwide: US, EP, WO, CN, JP, KR and any other jurisdiction.
- Only report patents that are easy to find online, for example on Google Patents or Espacenet.
- Validate every result against a source. Never invent a patent; if you cannot find any, return an empty list.

OUTPUT FORMAT (respond with ONLY valid JSON, no markdown, no explanations):
{{"patents": [
  {{"patent_id": "US1234567A", "title": "Synthesis of compound X", "relevancy": "High - direct synthesis method described"}}
]}}

- Return up to {max_patents} of the most relevant patents with their patent id, title and the relevant section.
- Write patent ids as jurisdiction, number and kind code without spaces (e.g. US1234567B2, CN105384684A).

COMPOUND: "{compound}""#,
            compound = compound,
            max_patents = max_patents
        )
    }
}

/// Strip optional Markdown code fences around a JSON payload
fn strip_code_fences(response: &str) -> &str {
    if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .unwrap_or(response)
            .trim()
    } else {
        response.trim()
    }
}

/// Parse the model's answer into candidates.
///
/// Accepts either a bare JSON array of candidate objects or an object whose
/// `patents` field is that array. Every element needs a non-empty string
/// `patent_id` and a string `title`; `relevancy` is optional.
pub fn parse_candidates(response: &str) -> AppResult<Vec<PatentCandidate>> {
    let body = strip_code_fences(response);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("Response is not valid JSON: {}", e)))?;

    let items = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("patents")
            .ok_or_else(|| AppError::Parse("Response object has no \"patents\" field".to_string()))?,
        other => {
            return Err(AppError::Parse(format!(
                "Expected a JSON array or object, got {}",
                json_kind(&other)
            )))
        }
    };

    let raw: Vec<CandidateRaw> = serde_json::from_value(items)
        .map_err(|e| AppError::Parse(format!("Unexpected candidate shape: {}", e)))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, c)| {
            let patent_id = c.patent_id.trim().to_string();
            if patent_id.is_empty() {
                return Err(AppError::Parse(format!("Candidate {} has an empty patent_id", index)));
            }
            Ok(PatentCandidate {
                patent_id,
                title: c.title.trim().to_string(),
                relevancy: c.relevancy.unwrap_or_default().trim().to_string(),
            })
        })
        .collect()
}

/// Drop repeated patent ids and cap the list at `max`
fn dedupe_and_limit(candidates: Vec<PatentCandidate>, max: usize) -> Vec<PatentCandidate> {
    let mut seen = HashSet::new();
    let mut unique: Vec<PatentCandidate> = candidates
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(normalize_patent_id(&c.patent_id));
            if !fresh {
                warn!(patent_id = %c.patent_id, "Dropping duplicate candidate");
            }
            fresh
        })
        .collect();

    if unique.len() > max {
        warn!(returned = unique.len(), max, "Model returned more patents than requested; truncating");
        unique.truncate(max);
    }
    unique
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
