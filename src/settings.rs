//! Persisted user preferences (currently: interface language).
//!
//! The language is resolved in two phases. A freshly constructed
//! [`AppSettings`] holds [`LanguageSetting::Unloaded`], whose effective value
//! is the default language; [`SettingsStore::hydrate`] then overrides it with
//! whatever was persisted. Code that must not act on the default before the
//! stored preference is known can check [`LanguageSetting::is_loaded`].
//!
//! Settings are passed explicitly to the code that needs them; nothing in
//! the crate reads them from global state.

use crate::error::PdfToolsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Environment variable overriding the settings directory.
pub const CONFIG_DIR_ENV: &str = "PDFTOOLS_CONFIG_DIR";

const SETTINGS_FILE: &str = "settings.json";

/// Interface language for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Korean => "ko",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = PdfToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko" | "kor" | "korean" | "한국어" => Ok(Language::Korean),
            "en" | "eng" | "english" => Ok(Language::English),
            other => Err(PdfToolsError::InvalidConfig(format!(
                "unknown language '{other}' (expected 'ko' or 'en')"
            ))),
        }
    }
}

/// Language preference with an explicit "not yet hydrated" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageSetting {
    #[default]
    Unloaded,
    Loaded(Language),
}

impl LanguageSetting {
    /// The language to use right now: the loaded one, or the default.
    pub fn effective(self) -> Language {
        match self {
            LanguageSetting::Unloaded => Language::default(),
            LanguageSetting::Loaded(lang) => lang,
        }
    }

    pub fn is_loaded(self) -> bool {
        matches!(self, LanguageSetting::Loaded(_))
    }
}

/// Application-wide preferences.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub language: LanguageSetting,
}

impl AppSettings {
    pub fn language(&self) -> Language {
        self.language.effective()
    }

    pub fn set_language(&mut self, lang: Language) {
        self.language = LanguageSetting::Loaded(lang);
    }
}

/// On-disk shape of the settings file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(default)]
    language: Option<Language>,
}

/// Reads and writes `settings.json`.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store rooted at an explicit directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SETTINGS_FILE),
        }
    }

    /// Store in `$PDFTOOLS_CONFIG_DIR`, or `<config dir>/pdftools`.
    pub fn default_location() -> Result<Self, PdfToolsError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return Ok(Self::in_dir(PathBuf::from(dir)));
            }
        }
        let base = dirs::config_dir().ok_or_else(|| {
            PdfToolsError::EnvironmentUnavailable("no user configuration directory".into())
        })?;
        Ok(Self::in_dir(base.join("pdftools")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Second phase of initialisation: replace `Unloaded` with the stored value.
    ///
    /// A missing or malformed file yields the default language rather than an
    /// error; the preference is a convenience, not a requirement.
    pub fn hydrate(&self, settings: &mut AppSettings) {
        let stored = match std::fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<StoredSettings>(&bytes) {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("Ignoring malformed settings file {}: {}", self.path.display(), e);
                    StoredSettings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredSettings::default(),
            Err(e) => {
                warn!("Cannot read settings file {}: {}", self.path.display(), e);
                StoredSettings::default()
            }
        };

        let lang = stored.language.unwrap_or_default();
        debug!("Language hydrated to '{}'", lang);
        settings.language = LanguageSetting::Loaded(lang);
    }

    /// Persist the current settings (atomic write).
    pub fn save(&self, settings: &AppSettings) -> Result<(), PdfToolsError> {
        let settings_err = |detail: String| PdfToolsError::Settings {
            path: self.path.clone(),
            detail,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| settings_err(e.to_string()))?;
        }

        let stored = StoredSettings {
            language: Some(settings.language()),
        };
        let json = serde_json::to_vec_pretty(&stored).map_err(|e| settings_err(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| settings_err(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| settings_err(e.to_string()))?;
        Ok(())
    }
}
