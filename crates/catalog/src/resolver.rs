use std::borrow::Cow;

use crate::model::{Catalog, Translation};

/// Values substituted into a resolved translation: `%n` / `%Ln` take the
/// count, `%1`..`%9` take positional arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslateParams<'a> {
    count: Option<i64>,
    positional: &'a [&'a str],
}

impl<'a> TranslateParams<'a> {
    pub fn new(positional: &'a [&'a str]) -> Self {
        Self {
            count: None,
            positional,
        }
    }

    pub fn with_count(positional: &'a [&'a str], count: i64) -> Self {
        Self {
            count: Some(count),
            positional,
        }
    }

    pub fn count(&self) -> Option<i64> {
        self.count
    }

    pub fn positional(&self) -> &'a [&'a str] {
        self.positional
    }
}

impl TranslateParams<'static> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count_only(count: i64) -> Self {
        Self {
            count: Some(count),
            positional: &[],
        }
    }
}

impl Catalog {
    /// Translation of `source` in `context`, or `source` itself when the
    /// entry is absent, unfinished, obsolete or empty.
    pub fn lookup<'a>(&'a self, context: &str, source: &'a str) -> &'a str {
        self.resolve(context, source, None, None)
    }

    /// Like [`Catalog::lookup`] for entries carrying a `<comment>`
    /// disambiguation.
    pub fn lookup_with_comment<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: &str,
    ) -> &'a str {
        self.resolve(context, source, Some(comment), None)
    }

    /// Plural form selected by this catalog's language rule for `count`.
    /// The returned template still contains `%n`.
    pub fn lookup_plural<'a>(&'a self, context: &str, source: &'a str, count: i64) -> &'a str {
        self.resolve(context, source, None, Some(count))
    }

    /// Plural lookup for an entry disambiguated by `comment`.
    pub fn lookup_plural_with_comment<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: &str,
        count: i64,
    ) -> &'a str {
        self.resolve(context, source, Some(comment), Some(count))
    }

    /// Resolves and renders placeholders.
    pub fn translate<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        params: &TranslateParams<'_>,
    ) -> Cow<'a, str> {
        let template = self.resolve(context, source, None, params.count);
        render_template(template, params)
    }

    /// Plural lookup with `%n` replaced by `count`.
    pub fn translate_plural(&self, context: &str, source: &str, count: i64) -> String {
        let template = self.lookup_plural(context, source, count);
        render_template(template, &TranslateParams::count_only(count)).into_owned()
    }

    fn resolve<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: Option<&str>,
        count: Option<i64>,
    ) -> &'a str {
        let language = self.language();
        let Some(message) = self.find(context, source, comment) else {
            tracing::debug!(language, context, source, "missing translation");
            return source;
        };
        if !message.is_translated() {
            tracing::debug!(language, context, source, status = ?message.status, "translation not usable");
            return source;
        }

        let index = match (&message.translation, count) {
            (Translation::Plural(_), Some(count)) => self.plural_rule().form_index(count),
            _ => 0,
        };
        match message.translation.form(index) {
            Some(text) if !text.is_empty() => text,
            _ => {
                tracing::debug!(language, context, source, index, "empty translation form");
                source
            }
        }
    }
}

/// Substitutes `%n`, `%1`..`%9` and their localized `%Ln` / `%L1`..`%L9`
/// spellings; values are inserted as given, without locale grouping. Unknown `%` sequences (including
/// Python-style `%d` / `%s`) are copied through untouched.
pub fn render_template<'a>(template: &'a str, params: &TranslateParams<'_>) -> Cow<'a, str> {
    if !template.contains('%') || (params.count.is_none() && params.positional.is_empty()) {
        return Cow::Borrowed(template);
    }

    let mut rendered = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            rendered.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('n') if params.count.is_some() => {
                chars.next();
                rendered.push_str(&params.count.unwrap_or_default().to_string());
            }
            Some('L') => {
                let mut lookahead = chars.clone();
                lookahead.next();
                let value = match lookahead.next() {
                    Some('n') => params.count.map(|count| count.to_string()),
                    Some(digit @ '1'..='9') => positional_arg(params, digit).map(str::to_string),
                    _ => None,
                };
                match value {
                    Some(value) => {
                        chars.next();
                        chars.next();
                        rendered.push_str(&value);
                    }
                    None => rendered.push('%'),
                }
            }
            Some(digit @ '1'..='9') => match positional_arg(params, digit) {
                Some(value) => {
                    chars.next();
                    rendered.push_str(value);
                }
                None => rendered.push('%'),
            },
            _ => rendered.push('%'),
        }
    }
    Cow::Owned(rendered)
}

fn positional_arg<'a>(params: &TranslateParams<'a>, digit: char) -> Option<&'a str> {
    let index = digit.to_digit(10)? as usize;
    params.positional.get(index.checked_sub(1)?).copied()
}
