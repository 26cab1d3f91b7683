use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fmt, fs, io};

use dawa_providers::GeminiConfig;
use dawa_types::{ApiKey, Locale, ModelName, ModelParseError, UnknownLocaleError};
use dawa_utils::{AtomicWriteOptions, FileSyncPolicy, PersistMode};
use serde::Deserialize;
use thiserror::Error;

use crate::session::ScanSettings;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 45;
const DEFAULT_MIN_DISPLAY_MS: u64 = 1500;

/// Contents of `~/.dawa/config.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct DawaConfig {
    pub api_keys: Option<ApiKeys>,
    pub google: Option<GoogleConfig>,
    pub scan: Option<ScanConfig>,
    pub history: Option<HistoryConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no Gemini API key: set [api_keys].google in the config or GEMINI_API_KEY")]
    MissingApiKey,
    #[error("invalid model in [google].{field}: {source}")]
    Model {
        field: &'static str,
        #[source]
        source: ModelParseError,
    },
    #[error("invalid [scan].default_locale: {0}")]
    Locale(#[from] UnknownLocaleError),
}

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    pub google: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let google = if self.google.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("ApiKeys").field("google", &google).finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GoogleConfig {
    pub analysis_model: Option<String>,
    pub narrative_model: Option<String>,
    /// Total HTTP timeout per request.
    pub request_timeout_seconds: Option<u64>,
    /// Override the API root (useful with a local proxy).
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanConfig {
    pub default_locale: Option<String>,
    /// Pause between receiving a result and showing it.
    pub min_display_ms: Option<u64>,
    /// Upper bound on one analysis call, after which the scan fails.
    pub analysis_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryConfig {
    /// Explicit history file, bypassing the data directory.
    pub path: Option<PathBuf>,
}

/// Replace `${VAR}` references with environment values (missing vars become empty).
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl DawaConfig {
    /// Load from the default location. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// `~/.dawa/config.toml`.
    #[must_use]
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dawa").join("config.toml"))
    }

    /// API key from the config file, then `GEMINI_API_KEY`.
    pub fn api_key(&self) -> Result<ApiKey, ConfigError> {
        let from_config = self
            .api_keys
            .as_ref()
            .and_then(|keys| keys.google.as_deref())
            .map(expand_env_vars)
            .filter(|key| !key.trim().is_empty());

        let raw = match from_config {
            Some(key) => key,
            None => env::var(ApiKey::ENV_VAR).map_err(|_| ConfigError::MissingApiKey)?,
        };
        ApiKey::new(raw).map_err(|_| ConfigError::MissingApiKey)
    }

    pub fn gemini_config(&self) -> Result<GeminiConfig, ConfigError> {
        let mut config = GeminiConfig::new(self.api_key()?);
        let google = self.google.as_ref();

        if let Some(raw) = google.and_then(|g| g.analysis_model.as_deref()) {
            let model = ModelName::parse(raw).map_err(|source| ConfigError::Model {
                field: "analysis_model",
                source,
            })?;
            config = config.with_analysis_model(model);
        }
        if let Some(raw) = google.and_then(|g| g.narrative_model.as_deref()) {
            let model = ModelName::parse(raw).map_err(|source| ConfigError::Model {
                field: "narrative_model",
                source,
            })?;
            config = config.with_narrative_model(model);
        }
        if let Some(base_url) = google.and_then(|g| g.base_url.as_deref()) {
            config = config.with_base_url(base_url);
        }

        let timeout = google
            .and_then(|g| g.request_timeout_seconds)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Ok(config.with_request_timeout(Duration::from_secs(timeout)))
    }

    pub fn scan_settings(&self) -> Result<ScanSettings, ConfigError> {
        let scan = self.scan.as_ref();
        let default_locale = match scan.and_then(|s| s.default_locale.as_deref()) {
            Some(raw) => raw.parse::<Locale>()?,
            None => Locale::default(),
        };
        let min_display_ms = scan
            .and_then(|s| s.min_display_ms)
            .unwrap_or(DEFAULT_MIN_DISPLAY_MS);
        let analysis_timeout_secs = scan
            .and_then(|s| s.analysis_timeout_seconds)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_ANALYSIS_TIMEOUT_SECS);

        Ok(ScanSettings {
            default_locale,
            min_display: Duration::from_millis(min_display_ms),
            analysis_timeout: Duration::from_secs(analysis_timeout_secs),
        })
    }

    /// Explicit history file from `[history].path`, with `${VAR}` expansion.
    #[must_use]
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history
            .as_ref()
            .and_then(|h| h.path.as_ref())
            .map(|path| PathBuf::from(expand_env_vars(&path.to_string_lossy())))
    }

    /// Write `[scan].default_locale` to the default config file.
    pub fn persist_default_locale(locale: Locale) -> io::Result<()> {
        let path = Self::path().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine config path")
        })?;
        Self::persist_default_locale_at(&path, locale)
    }

    /// Write `[scan].default_locale` into `path`, keeping the rest of the file
    /// (comments included) untouched.
    pub fn persist_default_locale_at(path: &Path, locale: Locale) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            dawa_utils::ensure_secure_dir(parent)?;
        }

        let content = if path.exists() {
            fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut doc = content
            .parse::<toml_edit::DocumentMut>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if !doc.contains_key("scan") {
            doc["scan"] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        doc["scan"]["default_locale"] = toml_edit::value(locale.as_str());

        // Owner-only: the same file may hold a literal API key.
        dawa_utils::atomic_write_with_options(
            path,
            doc.to_string().as_bytes(),
            AtomicWriteOptions {
                file_sync: FileSyncPolicy::SyncAll,
                mode: PersistMode::OwnerOnly,
            },
        )
    }
}
