use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the masker services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mask: MaskConfig,

    #[serde(default)]
    pub documents: DocumentsConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Redaction API (`/mask/custom`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskConfig {
    #[serde(default = "default_mask_host")]
    pub host: String,

    #[serde(default = "default_mask_port")]
    pub port: u16,

    #[serde(default = "default_max_chunk_len")]
    pub default_max_chunk_len: usize,
}

/// Document API (`/api/v1/process/*`) and web UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_documents_host")]
    pub host: String,

    #[serde(default = "default_documents_port")]
    pub port: u16,

    #[serde(default = "default_desensitive_service_url")]
    pub desensitive_service_url: String,

    #[serde(default = "default_pdf_parse_api_url")]
    pub pdf_parse_api_url: String,

    /// Also write every result here when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default = "default_debug_dir")]
    pub debug_dir: PathBuf,

    /// Dump intermediate pipeline steps into `debug_dir`
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Timeout for calls to the redaction API
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Built-in rules only, no model
    #[default]
    Rules,
    /// UIE-compatible model server
    Http,
}

/// Semantic extractor used by the redaction API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub kind: ExtractorKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_extractor_timeout_secs")]
    pub timeout_secs: u64,

    /// Cached chunk results; 0 disables the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            host: default_mask_host(),
            port: default_mask_port(),
            default_max_chunk_len: default_max_chunk_len(),
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            host: default_documents_host(),
            port: default_documents_port(),
            desensitive_service_url: default_desensitive_service_url(),
            pdf_parse_api_url: default_pdf_parse_api_url(),
            output_dir: None,
            debug_dir: default_debug_dir(),
            debug: false,
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            kind: ExtractorKind::default(),
            url: None,
            timeout_secs: default_extractor_timeout_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_mask_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mask_port() -> u16 {
    8888
}

fn default_max_chunk_len() -> usize {
    300
}

fn default_documents_host() -> String {
    "0.0.0.0".to_string()
}

fn default_documents_port() -> u16 {
    8002
}

fn default_desensitive_service_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

fn default_pdf_parse_api_url() -> String {
    "http://127.0.0.1:8191".to_string()
}

fn default_debug_dir() -> PathBuf {
    PathBuf::from("debug_outputs")
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_extractor_timeout_secs() -> u64 {
    60
}

fn default_cache_capacity() -> usize {
    1024
}

impl Config {
    /// Load config from `path`, or from the default location.
    ///
    /// A missing file at the default location is created with defaults; an
    /// explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => Self::load_or_create_default()?,
        };
        config.apply_env();
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_or_create_default() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::read(&path)
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            tracing::info!("wrote default config to {}", path.display());
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "masker", "masker") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.masker/config.toml")
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()));
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DESENSITIVE_SERVICE_URL") {
            self.documents.desensitive_service_url = url;
        }

        if let Some(url) = lookup("PDF_PARSE_API_URL") {
            self.documents.pdf_parse_api_url = url;
        }

        if let Some(url) = lookup("WORD_PROCESSOR_URL") {
            match port_of(&url) {
                Some(port) => self.documents.port = port,
                None => tracing::warn!("WORD_PROCESSOR_URL has no usable port: {}", url),
            }
        }

        if let Some(url) = lookup("MASKER_EXTRACTOR_URL") {
            self.extractor.kind = ExtractorKind::Http;
            self.extractor.url = Some(url);
        }
    }
}

/// Port of a URL, explicit or implied by its scheme
fn port_of(url: &str) -> Option<u16> {
    url::Url::parse(url).ok()?.port_or_known_default()
}
