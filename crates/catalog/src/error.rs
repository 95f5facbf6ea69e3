use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal problem in one catalog document: malformed XML or a message that
/// lacks its `source`/`translation`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse catalog {path} at line {line}: {message}")]
pub struct CatalogParseError {
    pub path: PathBuf,
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] CatalogParseError),
    #[error("failed to encode catalog {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },
    #[error("failed to write catalog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to enumerate catalog directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no catalog available for language '{0}'")]
    UnknownLanguage(String),
}

/// Non-fatal findings collected while loading a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    UnknownElement {
        element: String,
        line: usize,
    },
    UnknownStatus {
        value: String,
        line: usize,
    },
    InvalidLocation {
        value: String,
        line: usize,
    },
    PluralFormMismatch {
        context: String,
        source: String,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement { element, line } => {
                write!(f, "line {line}: skipped unknown element <{element}>")
            }
            Self::UnknownStatus { value, line } => {
                write!(f, "line {line}: unknown translation type '{value}'")
            }
            Self::InvalidLocation { value, line } => {
                write!(f, "line {line}: invalid location line '{value}'")
            }
            Self::PluralFormMismatch {
                context,
                source,
                expected,
                found,
            } => write!(
                f,
                "{context}: '{source}' has {found} plural form(s), language expects {expected}"
            ),
        }
    }
}
