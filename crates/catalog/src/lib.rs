//! Qt Linguist `.ts` translation catalogs: loading, lookup with plural
//! selection, serialization and runtime language switching.

pub mod config;
pub mod error;
pub mod language;
mod loader;
pub mod model;
pub mod plural;
mod resolver;
pub mod translator;
mod writer;

pub use config::{ConfigError, ConfigStore, L10nConfig, AUTO_LANGUAGE};
pub use error::{CatalogError, CatalogParseError, CatalogWarning};
pub use language::{negotiate, parse_language, primary_subtag, system_language};
pub use model::{
    Catalog, CatalogStats, Context, Location, Message, Translation, TranslationStatus,
    TS_FORMAT_VERSION,
};
pub use plural::{PluralCategory, PluralRule};
pub use resolver::{render_template, TranslateParams};
pub use translator::{catalog_code, AvailableCatalog, Translator};
