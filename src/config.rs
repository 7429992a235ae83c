use crate::types::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_PATENTS_BASE_URL: &str = "https://patents.google.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub verification: VerificationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_patents: usize,
}

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub similarity_threshold: f64,
    /// Pause before every patent page fetch, in seconds
    pub request_delay_secs: f64,
    pub request_timeout_secs: u64,
    pub max_fetch_attempts: u32,
    pub retry_delay_secs: f64,
    pub patents_base_url: String,
    pub title_max_chars: usize,
    pub title_max_sentences: usize,
    pub non_latin_threshold: f64,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub results_dir: PathBuf,
}

/// Optional settings file. Every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub model: Option<String>,
    pub llm_timeout: Option<u64>,
    pub max_patents: Option<usize>,
    pub similarity_threshold: Option<f64>,
    pub request_delay: Option<f64>,
    pub request_timeout: Option<u64>,
    pub max_fetch_attempts: Option<u32>,
    pub retry_delay: Option<f64>,
    pub patents_base_url: Option<String>,
    pub title_max_chars: Option<usize>,
    pub title_max_sentences: Option<usize>,
    pub non_latin_threshold: Option<f64>,
    pub results_dir: Option<PathBuf>,
}

impl SettingsFile {
    /// Read a TOML/JSON/YAML settings file; the format follows the extension
    pub fn load(path: &Path) -> AppResult<Self> {
        config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(format!("Failed to read settings file {:?}: {}", path, e)))
    }
}

/// Values supplied on the command line; they win over everything else
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_patents: Option<usize>,
    pub similarity_threshold: Option<f64>,
    pub request_delay: Option<f64>,
    pub model: Option<String>,
    pub results_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig {
                api_key: String::new(),
                base_url: DEFAULT_API_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                timeout_secs: 3600,
            },
            search: SearchConfig { max_patents: 20 },
            verification: VerificationConfig {
                similarity_threshold: 0.8,
                request_delay_secs: 2.0,
                request_timeout_secs: 15,
                max_fetch_attempts: 2,
                retry_delay_secs: 1.0,
                patents_base_url: DEFAULT_PATENTS_BASE_URL.to_string(),
                title_max_chars: 300,
                title_max_sentences: 1,
                non_latin_threshold: 0.3,
            },
            output: OutputConfig {
                results_dir: PathBuf::from("results"),
            },
        }
    }
}

impl Config {
    /// Build the configuration from `.env`, the optional settings file, the
    /// process environment and command line overrides, in that order.
    pub fn load(settings_path: Option<&Path>, overrides: &Overrides) -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let file = match settings_path {
            Some(path) => SettingsFile::load(path)?,
            None => SettingsFile::default(),
        };

        Self::from_sources(&file, |key| env::var(key).ok(), overrides)
    }

    /// Layer the sources over the defaults and validate the result
    pub fn from_sources(
        file: &SettingsFile,
        env_lookup: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> AppResult<Self> {
        let mut config = Config::default();
        config.apply_file(file);
        config.apply_env(&env_lookup)?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: &SettingsFile) {
        let llm = &mut self.llm;
        let verification = &mut self.verification;

        set(&mut llm.api_key, file.api_key.clone());
        set(&mut llm.base_url, file.api_base_url.clone());
        set(&mut llm.model, file.model.clone());
        set(&mut llm.timeout_secs, file.llm_timeout);
        set(&mut self.search.max_patents, file.max_patents);
        set(&mut verification.similarity_threshold, file.similarity_threshold);
        set(&mut verification.request_delay_secs, file.request_delay);
        set(&mut verification.request_timeout_secs, file.request_timeout);
        set(&mut verification.max_fetch_attempts, file.max_fetch_attempts);
        set(&mut verification.retry_delay_secs, file.retry_delay);
        set(&mut verification.patents_base_url, file.patents_base_url.clone());
        set(&mut verification.title_max_chars, file.title_max_chars);
        set(&mut verification.title_max_sentences, file.title_max_sentences);
        set(&mut verification.non_latin_threshold, file.non_latin_threshold);
        set(&mut self.output.results_dir, file.results_dir.clone());
    }

    fn apply_env(&mut self, env_lookup: &impl Fn(&str) -> Option<String>) -> AppResult<()> {
        let llm = &mut self.llm;
        let verification = &mut self.verification;

        set(&mut llm.api_key, env_lookup("OPENAI_API_KEY"));
        set(&mut llm.base_url, env_lookup("OPENAI_BASE_URL"));
        set(&mut llm.model, env_lookup("OPENAI_MODEL"));
        set(&mut llm.timeout_secs, parse_env(env_lookup, "OPENAI_TIMEOUT")?);
        set(&mut self.search.max_patents, parse_env(env_lookup, "MAX_PATENTS")?);
        set(
            &mut verification.similarity_threshold,
            parse_env(env_lookup, "SIMILARITY_THRESHOLD")?,
        );
        set(&mut verification.request_delay_secs, parse_env(env_lookup, "REQUEST_DELAY")?);
        set(&mut verification.request_timeout_secs, parse_env(env_lookup, "REQUEST_TIMEOUT")?);
        set(
            &mut verification.max_fetch_attempts,
            parse_env(env_lookup, "MAX_FETCH_ATTEMPTS")?,
        );
        set(&mut verification.retry_delay_secs, parse_env(env_lookup, "RETRY_DELAY")?);
        set(&mut verification.patents_base_url, env_lookup("PATENTS_BASE_URL"));
        set(&mut verification.title_max_chars, parse_env(env_lookup, "TITLE_MAX_CHARS")?);
        set(
            &mut verification.title_max_sentences,
            parse_env(env_lookup, "TITLE_MAX_SENTENCES")?,
        );
        set(
            &mut verification.non_latin_threshold,
            parse_env(env_lookup, "NON_LATIN_THRESHOLD")?,
        );
        set(&mut self.output.results_dir, env_lookup("RESULTS_DIR").map(PathBuf::from));
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        set(&mut self.search.max_patents, overrides.max_patents);
        set(&mut self.verification.similarity_threshold, overrides.similarity_threshold);
        set(&mut self.verification.request_delay_secs, overrides.request_delay);
        set(&mut self.llm.model, overrides.model.clone());
        set(&mut self.output.results_dir, overrides.results_dir.clone());
    }

    /// Reject settings that would make the run meaningless. Runs before any
    /// network call.
    pub fn validate(&self) -> AppResult<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "OPENAI_API_KEY environment variable is required".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("Model identifier must not be empty".to_string()));
        }
        if self.search.max_patents == 0 {
            return Err(AppError::Config("Max patents must be at least 1".to_string()));
        }

        let v = &self.verification;
        check_unit_interval("Similarity threshold", v.similarity_threshold)?;
        check_unit_interval("Non-Latin threshold", v.non_latin_threshold)?;
        if v.max_fetch_attempts == 0 {
            return Err(AppError::Config("Fetch attempts must be at least 1".to_string()));
        }
        for (name, secs) in [("Request delay", v.request_delay_secs), ("Retry delay", v.retry_delay_secs)] {
            if let Err(e) = Duration::try_from_secs_f64(secs) {
                return Err(AppError::Config(format!(
                    "{} must be a non-negative number of seconds, got {} ({})",
                    name, secs, e
                )));
            }
        }
        if v.request_timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(AppError::Config("Timeouts must be at least one second".to_string()));
        }
        Ok(())
    }
}

// Delays are range-checked in `Config::validate`
impl VerificationConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay_secs).unwrap_or_default()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay_secs).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn parse_env<T>(env_lookup: &impl Fn(&str) -> Option<String>, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {:?} ({})", key, raw, e))),
    }
}

fn check_unit_interval(name: &str, value: f64) -> AppResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::Config(format!("{} must be within [0, 1], got {}", name, value)));
    }
    Ok(())
}
