use clap::Parser;
use patent_scout::config::{Config, Overrides};
use patent_scout::{PatentSearchPipeline, SearchQuery, SearchSummary};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::{error, info};

const LISTED_TITLE_CHARS: usize = 60;

/// Find patents describing the synthesis of a chemical compound and verify
/// their titles against Google Patents.
#[derive(Debug, Parser)]
#[command(name = "patent-scout", version, about)]
struct Cli {
    /// Compound name, e.g. "3-(trifluoromethyl)pyridine-4-carboxamide"
    compound: String,

    /// Maximum number of patents to request from the model
    #[arg(long)]
    max_patents: Option<usize>,

    /// Minimum title similarity (0-1) for a patent to count as verified
    #[arg(long)]
    threshold: Option<f64>,

    /// Seconds to wait before each patent page request
    #[arg(long)]
    delay: Option<f64>,

    /// LLM model identifier
    #[arg(long)]
    model: Option<String>,

    /// Settings file (TOML, JSON or YAML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory that receives the result files
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            max_patents: self.max_patents,
            similarity_threshold: self.threshold,
            request_delay: self.delay,
            model: self.model.clone(),
            results_dir: self.results_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    patent_scout::utils::init_logger(cli.verbose);

    let config = Config::load(cli.settings.as_deref(), &cli.overrides()).map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    let summary = search(&cli.compound, &config).await?;
    print!("{}", report(&summary));

    Ok(())
}

/// Run one search with a validated config. Errors end the process with a
/// non-zero status; an empty result does not.
async fn search(compound: &str, config: &Config) -> anyhow::Result<SearchSummary> {
    info!(
        model = %config.llm.model,
        max_patents = config.search.max_patents,
        threshold = config.verification.similarity_threshold,
        "Configuration validated"
    );

    let query = SearchQuery::new(compound, config.search.max_patents, config.llm.model.clone());
    let pipeline = PatentSearchPipeline::from_config(config)?;
    Ok(pipeline.run(&query).await?)
}

fn report(summary: &SearchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Compound:          {}", summary.compound);
    let _ = writeln!(out, "Patents found:     {}", summary.patents_found);
    let _ = writeln!(out, "Patents verified:  {}", summary.patents_verified);
    let _ = writeln!(out, "Success rate:      {:.1}%", summary.success_rate * 100.0);
    let _ = writeln!(out, "Results saved to:  {}", summary.output_path.display());

    if !summary.patents.is_empty() {
        let _ = writeln!(out, "\nPatents:");
        for (i, patent) in summary.patents.iter().enumerate() {
            let mark = if patent.verified { "verified" } else { "unverified" };
            let _ = writeln!(
                out,
                "  {}. {} - {} [{}]",
                i + 1,
                patent.patent_id,
                shorten(&patent.title, LISTED_TITLE_CHARS),
                mark
            );
            let _ = writeln!(out, "     Relevancy:  {}", patent.relevancy);
            let _ = writeln!(out, "     Similarity: {:.3}", patent.similarity_score);
        }
    }

    out
}

/// First `max` characters of `text`, with "..." when something was cut
fn shorten(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patent_scout::config::SettingsFile;
    use patent_scout::models::VerifiedPatent;
    use patent_scout::AppError;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("patent-scout").chain(args.iter().copied())).unwrap()
    }

    fn config_for(cli: &Cli, env: &[(&str, String)]) -> patent_scout::AppResult<Config> {
        let env: HashMap<String, String> = env.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Config::from_sources(&SettingsFile::default(), |key| env.get(key).cloned(), &cli.overrides())
    }

    fn record(id: &str, title: &str, score: f64, verified: bool) -> VerifiedPatent {
        VerifiedPatent {
            patent_id: id.to_string(),
            title: title.to_string(),
            relevancy: "High".to_string(),
            scraped_title: Some(title.to_string()),
            similarity_score: score,
            verified,
            language_note: None,
        }
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = cli(&["Caffeine", "--max-patents", "5", "--threshold", "0.9", "--delay", "0"]);
        let overrides = cli.overrides();
        assert_eq!(cli.compound, "Caffeine");
        assert_eq!(overrides.max_patents, Some(5));
        assert_eq!(overrides.similarity_threshold, Some(0.9));
        assert_eq!(overrides.request_delay, Some(0.0));
        assert!(overrides.model.is_none());
    }

    #[test]
    fn test_missing_api_key_fails_before_search() {
        let err = config_for(&cli(&["Caffeine"]), &[]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_zero_candidates_is_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/responses")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status": "completed", "output": [{"type": "message", "content": [
                    {"type": "output_text", "text": "{\"patents\": []}"}
                ]}]}"#,
            )
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cli = cli(&["Caffeine", "--delay", "0"]);
        let config = config_for(
            &cli,
            &[
                ("OPENAI_API_KEY", "sk-test".to_string()),
                ("OPENAI_BASE_URL", server.url()),
                ("RESULTS_DIR", dir.path().display().to_string()),
            ],
        )
        .unwrap();

        let summary = search(&cli.compound, &config).await.unwrap();
        assert_eq!(summary.patents_found, 0);
        assert!(report(&summary).contains("Success rate:      0.0%"));
        assert!(dir.path().join("Caffeine/verified_patents.json").exists());
    }

    #[tokio::test]
    async fn test_rejected_api_key_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/responses")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let cli = cli(&["Caffeine"]);
        let config = config_for(
            &cli,
            &[
                ("OPENAI_API_KEY", "sk-bad".to_string()),
                ("OPENAI_BASE_URL", server.url()),
                ("RESULTS_DIR", dir.path().display().to_string()),
            ],
        )
        .unwrap();

        let err = search(&cli.compound, &config).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Auth(_))));
    }

    #[test]
    fn test_report_lists_every_patent() {
        let long_title = "Process for the preparation of substituted pyridine carboxamides and intermediates";
        let summary = SearchSummary {
            compound: "X".to_string(),
            patents_found: 2,
            patents_verified: 1,
            success_rate: 0.5,
            output_path: PathBuf::from("results/X/verified_patents.json"),
            patents: vec![
                record("AB1234C1", "Foo", 1.0, true),
                record("US2B2", long_title, 0.42, false),
            ],
        };

        let text = report(&summary);
        assert!(text.contains("Success rate:      50.0%"));
        assert!(text.contains("  1. AB1234C1 - Foo [verified]"));
        assert!(text.contains(&format!("  2. US2B2 - {}... [unverified]", &long_title[..60])));
        assert!(text.contains("     Similarity: 0.420"));
    }

    #[test]
    fn test_shorten_counts_characters() {
        assert_eq!(shorten("短い題名", 2), "短い...");
        assert_eq!(shorten("Foo", 60), "Foo");
    }
}
