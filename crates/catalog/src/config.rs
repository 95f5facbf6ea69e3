use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::language::system_language;
use crate::translator::{BASE_LANGUAGE, DEFAULT_FILE_EXTENSION, DEFAULT_FILE_PREFIX};

const CONFIG_VERSION: u32 = 1;
pub const AUTO_LANGUAGE: &str = "auto";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where catalogs live and which language to activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L10nConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    /// A language code, or `auto` to follow the environment.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("i18n")
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

fn default_file_extension() -> String {
    DEFAULT_FILE_EXTENSION.to_string()
}

fn default_language() -> String {
    AUTO_LANGUAGE.to_string()
}

fn default_fallback_language() -> String {
    BASE_LANGUAGE.to_string()
}

impl Default for L10nConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            catalog_dir: default_catalog_dir(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            language: default_language(),
            fallback_language: default_fallback_language(),
        }
    }
}

impl L10nConfig {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = CONFIG_VERSION;
        }
        if self.catalog_dir.as_os_str().is_empty() {
            self.catalog_dir = default_catalog_dir();
        }
        let extension = self.file_extension.trim().trim_start_matches('.');
        self.file_extension = if extension.is_empty() {
            default_file_extension()
        } else {
            extension.to_string()
        };
        if self.language.trim().is_empty() {
            self.language = default_language();
        }
        if self.fallback_language.trim().is_empty() {
            self.fallback_language = default_fallback_language();
        }
    }

    /// The configured language with `auto` replaced by the environment's
    /// language, or the fallback when the environment names none.
    pub fn resolved_language(&self) -> String {
        if self.language.eq_ignore_ascii_case(AUTO_LANGUAGE) {
            system_language().unwrap_or_else(|| self.fallback_language.clone())
        } else {
            self.language.clone()
        }
    }

    /// Catalog directory, with a relative path taken from `root`.
    pub fn catalog_dir_in(&self, root: &Path) -> PathBuf {
        if self.catalog_dir.is_absolute() {
            self.catalog_dir.clone()
        } else {
            root.join(&self.catalog_dir)
        }
    }
}

#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: L10nConfig,
}

impl ConfigStore {
    /// Loads the config file; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            let mut data = L10nConfig::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: L10nConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn config(&self) -> &L10nConfig {
        &self.data
    }

    pub fn update<F>(&mut self, op: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut L10nConfig),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            ConfigError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| ConfigError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative catalog paths are resolved against.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.data.catalog_dir_in(self.root())
    }
}
