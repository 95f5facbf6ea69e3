use std::collections::HashMap;

use serde::Serialize;

use crate::error::CatalogWarning;
use crate::plural::PluralRule;

pub const TS_FORMAT_VERSION: &str = "2.0";

/// Where a message was extracted from; informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub filename: String,
    pub line: Option<u32>,
}

impl Location {
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self {
            filename: filename.into(),
            line: Some(line),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationStatus {
    Translated,
    Unfinished,
    Obsolete,
    Vanished,
}

impl TranslationStatus {
    /// Maps the `type` attribute of `<translation>`.
    pub fn from_type_attr(value: &str) -> Option<Self> {
        match value {
            "unfinished" => Some(Self::Unfinished),
            "obsolete" => Some(Self::Obsolete),
            "vanished" => Some(Self::Vanished),
            _ => None,
        }
    }

    pub fn type_attr(self) -> Option<&'static str> {
        match self {
            Self::Translated => None,
            Self::Unfinished => Some("unfinished"),
            Self::Obsolete => Some("obsolete"),
            Self::Vanished => Some("vanished"),
        }
    }

    pub fn is_obsolete(self) -> bool {
        matches!(self, Self::Obsolete | Self::Vanished)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Single(String),
    Plural(Vec<String>),
}

impl Translation {
    /// Form at `index`; a single translation answers every index.
    pub fn form(&self, index: usize) -> Option<&str> {
        match self {
            Translation::Single(text) => Some(text.as_str()),
            Translation::Plural(forms) => forms.get(index).map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Translation::Single(text) => text.is_empty(),
            Translation::Plural(forms) => forms.iter().all(String::is_empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Option<String>,
    pub source: String,
    pub old_source: Option<String>,
    /// Disambiguation; part of the lookup key together with `source`.
    pub comment: Option<String>,
    pub old_comment: Option<String>,
    pub extra_comment: Option<String>,
    pub translator_comment: Option<String>,
    pub locations: Vec<Location>,
    pub is_plural: bool,
    pub translation: Translation,
    pub status: TranslationStatus,
    pub encoding: Option<String>,
}

impl Message {
    pub fn new(source: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            old_source: None,
            comment: None,
            old_comment: None,
            extra_comment: None,
            translator_comment: None,
            locations: Vec::new(),
            is_plural: false,
            translation: Translation::Single(translation.into()),
            status: TranslationStatus::Translated,
            encoding: None,
        }
    }

    pub fn plural(source: impl Into<String>, forms: Vec<String>) -> Self {
        Self {
            is_plural: true,
            translation: Translation::Plural(forms),
            ..Self::new(source, String::new())
        }
    }

    pub fn unfinished(mut self) -> Self {
        self.status = TranslationStatus::Unfinished;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn is_translated(&self) -> bool {
        self.status == TranslationStatus::Translated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    name: String,
    comment: Option<String>,
    messages: Vec<Message>,
    by_source: HashMap<String, Vec<usize>>,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            messages: Vec::new(),
            by_source: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// First message with this source and disambiguation. A disambiguated
    /// query that finds nothing retries against entries without one.
    pub fn find(&self, source: &str, comment: Option<&str>) -> Option<&Message> {
        let candidates = self.by_source.get(source)?;
        let matching = |wanted: Option<&str>| {
            candidates
                .iter()
                .map(|index| &self.messages[*index])
                .find(|message| message.comment.as_deref() == wanted)
        };
        matching(comment).or_else(|| comment.and_then(|_| matching(None)))
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        if comment.is_some() {
            self.comment = comment;
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        let index = self.messages.len();
        self.by_source
            .entry(message.source.clone())
            .or_default()
            .push(index);
        self.messages.push(message);
    }
}

/// Message counts for one catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub language: String,
    pub contexts: usize,
    pub messages: usize,
    pub translated: usize,
    pub unfinished: usize,
    pub obsolete: usize,
    pub plural: usize,
}

impl CatalogStats {
    /// Share of live (non-obsolete) messages that are translated.
    pub fn completion(&self) -> f64 {
        let live = self.translated + self.unfinished;
        if live == 0 {
            1.0
        } else {
            self.translated as f64 / live as f64
        }
    }
}

/// One language's translations, grouped by context in document order.
#[derive(Debug, Clone)]
pub struct Catalog {
    language: String,
    source_language: Option<String>,
    version: String,
    plural_rule: PluralRule,
    contexts: Vec<Context>,
    context_index: HashMap<String, usize>,
    warnings: Vec<CatalogWarning>,
}

impl Catalog {
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        Self {
            plural_rule: PluralRule::for_language(&language),
            language,
            source_language: None,
            version: TS_FORMAT_VERSION.to_string(),
            contexts: Vec::new(),
            context_index: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn plural_rule(&self) -> PluralRule {
        self.plural_rule
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.context_index
            .get(name)
            .map(|index| &self.contexts[*index])
    }

    pub fn find(&self, context: &str, source: &str, comment: Option<&str>) -> Option<&Message> {
        self.context(context)?.find(source, comment)
    }

    /// Diagnostics recorded while the catalog was loaded.
    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }

    pub fn message_count(&self) -> usize {
        self.contexts
            .iter()
            .map(|context| context.messages.len())
            .sum()
    }

    /// Appends a message, creating the context on first use.
    pub fn push_message(&mut self, context: &str, message: Message) {
        self.context_entry(context).push(message);
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            language: self.language.clone(),
            contexts: self.contexts.len(),
            ..CatalogStats::default()
        };
        for message in self.contexts.iter().flat_map(|context| &context.messages) {
            stats.messages += 1;
            if message.is_plural {
                stats.plural += 1;
            }
            match message.status {
                TranslationStatus::Translated => stats.translated += 1,
                TranslationStatus::Unfinished => stats.unfinished += 1,
                TranslationStatus::Obsolete | TranslationStatus::Vanished => stats.obsolete += 1,
            }
        }
        stats
    }

    /// Unfinished messages with their context, in document order.
    pub fn untranslated(&self) -> impl Iterator<Item = (&Context, &Message)> + '_ {
        self.contexts.iter().flat_map(|context| {
            context
                .messages
                .iter()
                .filter(|message| message.status == TranslationStatus::Unfinished)
                .map(move |message| (context, message))
        })
    }

    pub(crate) fn set_version(&mut self, version: String) {
        self.version = version;
    }

    pub(crate) fn set_source_language(&mut self, language: Option<String>) {
        self.source_language = language;
    }

    pub(crate) fn push_warning(&mut self, warning: CatalogWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn context_entry(&mut self, name: &str) -> &mut Context {
        let index = match self.context_index.get(name) {
            Some(index) => *index,
            None => {
                let index = self.contexts.len();
                self.contexts.push(Context::new(name));
                self.context_index.insert(name.to_string(), index);
                index
            }
        };
        &mut self.contexts[index]
    }
}
