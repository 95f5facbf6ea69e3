use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::OnceCell;

use crate::config::L10nConfig;
use crate::error::CatalogError;
use crate::language::{negotiate, primary_subtag};
use crate::model::Catalog;
use crate::resolver::TranslateParams;

pub const DEFAULT_FILE_PREFIX: &str = "lang_";
pub const DEFAULT_FILE_EXTENSION: &str = "ts";
pub const BASE_LANGUAGE: &str = "en";

static GLOBAL: OnceCell<Translator> = OnceCell::new();

/// A catalog file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableCatalog {
    pub code: String,
    pub path: PathBuf,
}

/// Holds the active catalog and swaps it atomically on language change.
/// Readers take an `Arc<Catalog>` snapshot and never block a switch.
/// （持有目前啟用的翻譯目錄，切換語系時以原子方式替換。）
#[derive(Debug)]
pub struct Translator {
    catalog_dir: Option<PathBuf>,
    base_language: String,
    available: Vec<AvailableCatalog>,
    current: ArcSwap<Catalog>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::base(BASE_LANGUAGE)
    }
}

impl Translator {
    /// A translator with only the empty base catalog: every lookup answers
    /// with its source text.
    /// （僅含空白基礎目錄的翻譯器，所有查詢皆回傳原文。）
    pub fn base(language: &str) -> Self {
        Self {
            catalog_dir: None,
            base_language: language.to_string(),
            available: Vec::new(),
            current: ArcSwap::from_pointee(Catalog::new(language)),
        }
    }

    /// Scans `dir` for `<prefix><code>.<extension>` files. A missing
    /// directory yields a translator without catalogs.
    /// （掃描目錄中符合命名規則的翻譯檔。）
    pub fn discover(
        dir: impl AsRef<Path>,
        file_prefix: &str,
        file_extension: &str,
    ) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut translator = Self::base(BASE_LANGUAGE);
        translator.catalog_dir = Some(dir.to_path_buf());
        translator.available = scan_directory(dir, file_prefix, file_extension)?;
        tracing::debug!(
            dir = %dir.display(),
            languages = translator.available.len(),
            "discovered catalogs"
        );
        Ok(translator)
    }

    /// Discovers catalogs with the default `lang_<code>.ts` naming.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::discover(dir, DEFAULT_FILE_PREFIX, DEFAULT_FILE_EXTENSION)
    }

    /// Builds a translator from configuration and activates the configured
    /// language. An unavailable language leaves the base catalog active.
    /// （依設定建立翻譯器並啟用設定的語系。）
    pub fn from_config(config: &L10nConfig, root: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = config.catalog_dir_in(root.as_ref());
        let mut translator = Self::discover(&dir, &config.file_prefix, &config.file_extension)?;
        translator.base_language = config.fallback_language.clone();
        translator
            .current
            .store(Arc::new(Catalog::new(config.fallback_language.as_str())));

        let requested = config.resolved_language();
        match translator.switch_language(&requested) {
            Ok(_) => {}
            Err(CatalogError::UnknownLanguage(code)) => {
                tracing::info!(language = %code, "no catalog for language, using source text");
            }
            Err(err) => return Err(err),
        }
        Ok(translator)
    }

    /// Process-wide translator; the base catalog until one is installed.
    /// （全域翻譯器實例。）
    pub fn global() -> &'static Translator {
        GLOBAL.get_or_init(Translator::default)
    }

    /// Installs `translator` as the process-wide instance. Fails with the
    /// translator handed back when [`Translator::global`] was already set.
    pub fn install_global(translator: Translator) -> Result<&'static Translator, Translator> {
        GLOBAL.set(translator)?;
        Ok(Self::global())
    }

    pub fn catalog_dir(&self) -> Option<&Path> {
        self.catalog_dir.as_deref()
    }

    /// Language codes with a catalog on disk, sorted.
    pub fn available_languages(&self) -> Vec<&str> {
        self.available
            .iter()
            .map(|catalog| catalog.code.as_str())
            .collect()
    }

    pub fn available_catalogs(&self) -> &[AvailableCatalog] {
        &self.available
    }

    /// Code of the active catalog.
    pub fn language(&self) -> String {
        self.current.load().language().to_string()
    }

    /// Snapshot of the active catalog.
    pub fn current(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Loads the best match for `requested` and makes it active. On any
    /// failure the previously active catalog stays in place.
    /// （載入最符合的語系並切換；失敗時維持原有目錄。）
    pub fn switch_language(&self, requested: &str) -> Result<String, CatalogError> {
        let matched = negotiate(requested, self.available_languages()).map(str::to_string);
        let Some(code) = matched else {
            if primary_subtag(requested) == primary_subtag(&self.base_language) {
                self.current
                    .store(Arc::new(Catalog::new(self.base_language.as_str())));
                tracing::info!(language = %self.base_language, "switched to base catalog");
                return Ok(self.base_language.clone());
            }
            return Err(CatalogError::UnknownLanguage(requested.to_string()));
        };

        let Some(entry) = self.available.iter().find(|catalog| catalog.code == code) else {
            return Err(CatalogError::UnknownLanguage(requested.to_string()));
        };
        let catalog = Catalog::load(&entry.path)?;
        if !catalog.warnings().is_empty() {
            tracing::warn!(
                language = %code,
                warnings = catalog.warnings().len(),
                "catalog loaded with diagnostics"
            );
        }
        self.current.store(Arc::new(catalog));
        tracing::info!(language = %code, requested, "switched catalog");
        Ok(code)
    }

    /// Translates `source` in `context` with the active catalog.
    pub fn tr(&self, context: &str, source: &str) -> String {
        self.current.load().lookup(context, source).to_string()
    }

    /// Plural translation with `%n` rendered.
    pub fn tr_n(&self, context: &str, source: &str, count: i64) -> String {
        self.current.load().translate_plural(context, source, count)
    }

    /// Translation with placeholders rendered from `params`.
    pub fn tr_with(&self, context: &str, source: &str, params: &TranslateParams<'_>) -> String {
        self.current
            .load()
            .translate(context, source, params)
            .into_owned()
    }
}

fn scan_directory(
    dir: &Path,
    file_prefix: &str,
    file_extension: &str,
) -> Result<Vec<AvailableCatalog>, CatalogError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "catalog directory does not exist");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(CatalogError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(code) = catalog_code(&path, file_prefix, file_extension) {
            found.push(AvailableCatalog { code, path });
        }
    }
    found.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(found)
}

/// Language code encoded in a catalog file name, e.g. `nl_NL` for
/// `lang_nl_NL.ts`.
pub fn catalog_code(path: &Path, file_prefix: &str, file_extension: &str) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(file_extension) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let code = stem.strip_prefix(file_prefix)?;
    (!code.is_empty()).then(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_code_requires_prefix_and_extension() {
        assert_eq!(
            catalog_code(Path::new("i18n/lang_nl_NL.ts"), "lang_", "ts").as_deref(),
            Some("nl_NL")
        );
        assert_eq!(catalog_code(Path::new("lang_uk.qm"), "lang_", "ts"), None);
        assert_eq!(catalog_code(Path::new("uk.ts"), "lang_", "ts"), None);
        assert_eq!(catalog_code(Path::new("lang_.ts"), "lang_", "ts"), None);
    }

    #[test]
    fn base_translator_returns_source_text() {
        let translator = Translator::default();
        assert_eq!(translator.language(), "en");
        assert_eq!(translator.tr("Collection", "Cancel"), "Cancel");
        assert_eq!(translator.tr_n("BaseTableView", "%n coin(s) selected", 3), "3 coin(s) selected");
        assert!(translator.available_languages().is_empty());
    }

    #[test]
    fn unknown_language_keeps_current_catalog() {
        let translator = Translator::default();
        let err = translator.switch_language("uk").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownLanguage(code) if code == "uk"));
        assert_eq!(translator.language(), "en");
        assert_eq!(translator.switch_language("en_GB").unwrap(), "en");
    }
}
