//! Bridge configuration.
//!
//! Built from defaults, then an optional TOML file, then environment
//! variables:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `DAS_LOCALE` | `locale` | `en` |
//! | `DAS_LOG` | `log_filter` | `info` |
//! | `DAS_TRANSLATIONS` | `translations` | none |

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use das_core::messages::{self, MessageCatalog};
use das_core::{DasException, DasResult, DasStatus};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const ENV_LOCALE: &str = "DAS_LOCALE";
pub const ENV_LOG: &str = "DAS_LOG";
pub const ENV_TRANSLATIONS: &str = "DAS_TRANSLATIONS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Locale for predefined explanations (default: "en").
    pub locale: String,

    /// `tracing` filter directive used when `RUST_LOG` is unset (default: "info").
    pub log_filter: String,

    /// JSON message resource merged into the catalog at startup.
    pub translations: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            locale: messages::FALLBACK_LOCALE.to_string(),
            log_filter: "info".to_string(),
            translations: None,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(text: &str) -> DasResult<Self> {
        toml::from_str(text).map_err(|e| {
            DasException::new(
                DasStatus::INVALID_FILE,
                format!("Invalid bridge configuration: {e}"),
            )
        })
    }

    pub fn load(path: &Path) -> DasResult<Self> {
        let text = read_file(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then the TOML file at `path` when given, then the `DAS_*`
    /// process environment.
    pub fn load_with_env(path: Option<&Path>) -> DasResult<Self> {
        Self::load_layered(path, |key| env::var(key).ok())
    }

    /// Like [`load_with_env`](Self::load_with_env), reading overrides from
    /// `lookup` instead of the environment.
    pub fn load_layered(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> DasResult<Self> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(lookup))
    }

    /// Apply overrides from `lookup`, keyed by the `DAS_*` variable names.
    /// Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(locale) = lookup(ENV_LOCALE) {
            self.locale = locale;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        if let Some(path) = lookup(ENV_TRANSLATIONS) {
            self.translations = Some(PathBuf::from(path));
        }
        self
    }
}

/// Apply `config` to the process: default locale and extra translations.
/// Safe to call repeatedly.
pub fn initialize(config: &BridgeConfig) -> DasResult<()> {
    if let Some(path) = &config.translations {
        let text = read_file(path)?;
        let catalog = MessageCatalog::from_json(&text)?;
        tracing::info!(path = %path.display(), entries = catalog.len(), "loaded translations");
        messages::install_catalog(catalog);
    }
    messages::set_default_locale(&config.locale);
    Ok(())
}

/// Install a `tracing` fmt subscriber. `RUST_LOG` wins over `default_filter`.
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn read_file(path: &Path) -> DasResult<String> {
    fs::read_to_string(path).map_err(|e| {
        let code = match e.kind() {
            io::ErrorKind::NotFound => DasStatus::FILE_NOT_FOUND,
            io::ErrorKind::PermissionDenied => DasStatus::PERMISSION_DENIED,
            io::ErrorKind::InvalidData => DasStatus::INVALID_STRING,
            _ => DasStatus::INVALID_FILE,
        };
        DasException::new(code, format!("Cannot read {}: {e}", path.display()))
    })
}
