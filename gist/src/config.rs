use std::env;
use std::path::PathBuf;

use crate::error::{GistError, Result};

/// Directive sent with every document when no question is supplied.
pub const DEFAULT_INSTRUCTION: &str = "Read the following content carefully and write a concise, \
well-structured summary in simple English within 100 words. Focus on the main ideas, key points, \
and overall meaning. Avoid unnecessary details, repetitions, or examples. Ensure the tone is \
professional and easy to understand.\n\nContent to summarize:";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub transcription: TranscriptionConfig,
    pub llm: Option<LlmConfig>,
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub upload_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub languages: String,
    /// Directory holding tesseract's `tessdata`; `None` uses the engine default.
    pub data_path: Option<String>,
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
}

#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_path: Option<String>,
    pub timeout_secs: u64,
    pub max_file_size: u64,
    pub max_duration_secs: u64,
    /// Where video extraction writes its temporary audio track.
    pub scratch_dir: Option<PathBuf>,
}

/// LLM configuration for the remote summarization endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStrategy {
    Truncate,
    MapReduce,
}

impl std::str::FromStr for BudgetStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "truncate" => Ok(BudgetStrategy::Truncate),
            "map_reduce" | "mapreduce" => Ok(BudgetStrategy::MapReduce),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub instruction: String,
    pub max_input_chars: usize,
    pub strategy: BudgetStrategy,
    /// Force the offline stand-in summarizer even when an LLM is configured.
    pub offline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizerKind {
    StandIn,
    Remote,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: "eng".to_string(),
            data_path: None,
            timeout_secs: 60,
            max_image_dimension: 4096,
            min_image_dimension: 50,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "local/whisper-small".to_string(),
            api_key: None,
            base_url: None,
            model_path: None,
            timeout_secs: 300,
            max_file_size: 104857600,
            max_duration_secs: 7200,
            scratch_dir: None,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            max_input_chars: 24000,
            strategy: BudgetStrategy::Truncate,
            offline: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("GIST_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_env_or("GIST_PORT", 3000),
                max_upload_bytes: parse_env_or("GIST_MAX_UPLOAD_BYTES", 104857600),
                upload_dir: env_non_empty("GIST_UPLOAD_DIR").map(PathBuf::from),
            },
            ocr: OcrConfig {
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                data_path: env_non_empty("OCR_DATA_PATH"),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 4096),
                min_image_dimension: parse_env_or("OCR_MIN_DIMENSION", 50),
            },
            transcription: TranscriptionConfig {
                model: env::var("TRANSCRIPTION_MODEL")
                    .unwrap_or_else(|_| "local/whisper-small".to_string()),
                api_key: env_non_empty("TRANSCRIPTION_API_KEY"),
                base_url: env_non_empty("TRANSCRIPTION_BASE_URL"),
                model_path: env_non_empty("TRANSCRIPTION_MODEL_PATH"),
                timeout_secs: parse_env_or("TRANSCRIPTION_TIMEOUT", 300),
                max_file_size: parse_env_or("TRANSCRIPTION_MAX_FILE_SIZE", 104857600),
                max_duration_secs: parse_env_or("TRANSCRIPTION_MAX_DURATION", 7200),
                scratch_dir: env_non_empty("TRANSCRIPTION_SCRATCH_DIR").map(PathBuf::from),
            },
            llm: env_non_empty("LLM_MODEL").map(|model| {
                let api_key = env_non_empty("LLM_API_KEY").or_else(|| {
                    let (provider, _) = parse_llm_provider_model(&model);
                    if provider.eq_ignore_ascii_case("gemini") {
                        env_non_empty("GEMINI_API_KEY")
                    } else {
                        None
                    }
                });
                LlmConfig {
                    model,
                    api_key,
                    base_url: env_non_empty("LLM_BASE_URL"),
                    timeout_secs: parse_env_or("LLM_TIMEOUT", 60),
                    max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
                }
            }),
            summary: SummaryConfig {
                instruction: env_non_empty("SUMMARY_INSTRUCTION")
                    .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
                max_input_chars: parse_env_or("SUMMARY_MAX_INPUT_CHARS", 24000),
                strategy: parse_env_opt("SUMMARY_STRATEGY").unwrap_or(BudgetStrategy::Truncate),
                offline: parse_env_or("GIST_OFFLINE", false),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn summarizer_kind(&self) -> SummarizerKind {
        if self.summary.offline || self.llm.is_none() {
            SummarizerKind::StandIn
        } else {
            SummarizerKind::Remote
        }
    }

    /// Startup checks. A remote provider that needs a credential and has none
    /// is fatal; everything else degrades at request time.
    pub fn validate(&self) -> Result<()> {
        if self.summary.max_input_chars == 0 {
            return Err(GistError::Validation(
                "SUMMARY_MAX_INPUT_CHARS must be greater than zero".to_string(),
            ));
        }

        if self.summarizer_kind() != SummarizerKind::Remote {
            return Ok(());
        }

        if let Some(llm) = &self.llm {
            let (provider, _) = parse_llm_provider_model(&llm.model);
            if llm_provider_needs_api_key(provider) && llm.api_key.is_none() {
                let var = if provider.eq_ignore_ascii_case("gemini") {
                    "LLM_API_KEY (or GEMINI_API_KEY)"
                } else {
                    "LLM_API_KEY"
                };
                return Err(GistError::MissingCredential(var.to_string()));
            }
        }

        Ok(())
    }

    /// The LLM timeout bounds every summarization call; the stand-in uses the default.
    pub fn generation_timeout_secs(&self) -> u64 {
        self.llm.as_ref().map(|l| l.timeout_secs).unwrap_or(60)
    }
}

/// Known providers that use OpenAI-compatible APIs for transcription
const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "local"];

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "gemini", "ollama", "lmstudio"];

/// Parse a model name into (provider, model) tuple.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}

pub fn llm_provider_needs_api_key(provider: &str) -> bool {
    !matches!(
        provider.to_lowercase().as_str(),
        "ollama" | "local" | "lmstudio"
    )
}
