//! RON configuration for a search session.
//!
//! The file names a built-in profile and overrides parts of it:
//!
//! ```ron
//! (
//!     profile: "vendor",
//!     action: "/software-vendors",
//!     base_url: Some("http://localhost:3000"),
//!     fields: [("searchTerm", "")],
//!     quiet_period_ms: Some(300),
//!     transport: (request_timeout_ms: Some(10000)),
//! )
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quicksearch_core::{
    ErrorConvention, FormMethod, LoadingStyle, PageLayout, QuietPeriod, SearchForm, SearchProfile,
    SettingsError, StatusUpdateStrategy,
};
use quicksearch_engine::TransportSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("unknown profile `{0}` (expected `glossary` or `vendor`)")]
    UnknownProfile(String),
    #[error("form action must not be empty")]
    MissingAction,
    #[error("invalid base url `{url}`: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("max_bytes must be greater than zero")]
    ZeroMaxBytes,
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MethodConfig {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingStyleConfig {
    Empty,
    Fade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusUpdateConfig {
    CopyFragment { marker_id: String },
    AriaRole { role: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub container_id: String,
    pub content_id: String,
    pub status_id: String,
    #[serde(default = "default_loading_class")]
    pub loading_class: String,
}

fn default_loading_class() -> String {
    "loading".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub profile: String,
    pub action: String,
    pub method: MethodConfig,
    /// Resolves relative actions; required unless `action` is absolute.
    pub base_url: Option<String>,
    /// Initial form controls in document order.
    pub fields: Vec<(String, String)>,
    pub quiet_period_ms: Option<u64>,
    pub loading_style: Option<LoadingStyleConfig>,
    pub status_update: Option<StatusUpdateConfig>,
    pub clear_errors: Option<bool>,
    pub layout: Option<LayoutConfig>,
    pub transport: TransportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: "glossary".to_string(),
            action: String::new(),
            method: MethodConfig::default(),
            base_url: None,
            fields: Vec::new(),
            quiet_period_ms: None,
            loading_style: None,
            status_update: None,
            clear_errors: None,
            layout: None,
            transport: TransportConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Builds the profile: the named preset with this file's overrides applied.
    /// `name_override` (from the command line) wins over the file's `profile`.
    pub fn profile(&self, name_override: Option<&str>) -> Result<SearchProfile, ConfigError> {
        let name = name_override.unwrap_or(&self.profile);
        let mut profile = SearchProfile::by_name(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;

        if let Some(millis) = self.quiet_period_ms {
            profile.quiet_period = QuietPeriod::from_millis(millis)?;
        }
        if let Some(style) = self.loading_style {
            profile.loading_style = match style {
                LoadingStyleConfig::Empty => LoadingStyle::Empty,
                LoadingStyleConfig::Fade => LoadingStyle::Fade,
            };
        }
        if let Some(strategy) = &self.status_update {
            profile.status_update = match strategy.clone() {
                StatusUpdateConfig::CopyFragment { marker_id } => {
                    StatusUpdateStrategy::CopyFragment { marker_id }
                }
                StatusUpdateConfig::AriaRole { role } => StatusUpdateStrategy::AriaRole { role },
            };
        }
        match self.clear_errors {
            Some(true) if profile.errors.is_none() => {
                profile.errors = Some(ErrorConvention::default());
            }
            Some(false) => profile.errors = None,
            _ => {}
        }
        if let Some(layout) = &self.layout {
            profile.layout = PageLayout {
                container_id: layout.container_id.clone(),
                content_id: layout.content_id.clone(),
                status_id: layout.status_id.clone(),
                loading_class: layout.loading_class.clone(),
            };
        }
        Ok(profile)
    }

    pub fn form(&self) -> Result<SearchForm, ConfigError> {
        if self.action.trim().is_empty() {
            return Err(ConfigError::MissingAction);
        }
        let method = match self.method {
            MethodConfig::Get => FormMethod::Get,
            MethodConfig::Post => FormMethod::Post,
        };
        let base = SearchForm::new(self.action.as_str()).with_method(method);
        let form = self.fields.iter().fold(base, |form, (name, value)| {
            form.with_field(name.as_str(), value.as_str())
        });
        Ok(form)
    }

    pub fn transport_settings(&self) -> Result<TransportSettings, ConfigError> {
        let base_url = self
            .base_url
            .as_deref()
            .map(|url| {
                Url::parse(url).map_err(|source| ConfigError::BaseUrl {
                    url: url.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut settings = TransportSettings {
            base_url,
            connect_timeout: self.transport.connect_timeout_ms.map(Duration::from_millis),
            request_timeout: self.transport.request_timeout_ms.map(Duration::from_millis),
            ..TransportSettings::default()
        };
        if let Some(max_bytes) = self.transport.max_bytes {
            if max_bytes == 0 {
                return Err(ConfigError::ZeroMaxBytes);
            }
            settings.max_bytes = max_bytes;
        }
        Ok(settings)
    }
}
