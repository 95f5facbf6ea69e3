use std::env;
use std::str::FromStr;

use icu_locid::LanguageIdentifier;

const LOCALE_ENV_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

/// Parses a catalog language code (`uk`, `nl_NL`, `pt-BR`) or a POSIX locale
/// name (`uk_UA.UTF-8`, `sr_RS@latin`) into a canonical identifier.
/// （將語系代碼或 POSIX 語系名稱解析為標準識別碼。）
pub fn parse_language(code: &str) -> Option<LanguageIdentifier> {
    let trimmed = code
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("C") || trimmed == "POSIX" {
        return None;
    }
    LanguageIdentifier::from_str(&trimmed.replace('_', "-")).ok()
}

/// Lower-case primary language subtag, e.g. `uk` for `uk_UA`.
pub fn primary_subtag(code: &str) -> String {
    match parse_language(code) {
        Some(id) => id.language.as_str().to_string(),
        None => code
            .split(['-', '_', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase(),
    }
}

/// Picks the best available catalog code for a requested language.
/// Exact matches win, then separator/case-insensitive matches, then a shared
/// primary subtag (preferring a catalog without a region).
/// （依序比對完全相符、正規化相符與主要語言子標籤，挑選最合適的語系。）
pub fn negotiate<'a, I>(requested: &str, available: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let available: Vec<&'a str> = available.into_iter().collect();
    if let Some(exact) = available.iter().copied().find(|code| *code == requested) {
        return Some(exact);
    }

    let wanted = parse_language(requested)?;
    let parsed: Vec<(&'a str, LanguageIdentifier)> = available
        .iter()
        .filter_map(|code| parse_language(code).map(|id| (*code, id)))
        .collect();

    if let Some((code, _)) = parsed.iter().find(|(_, id)| *id == wanted) {
        return Some(*code);
    }

    let same_language: Vec<&(&'a str, LanguageIdentifier)> = parsed
        .iter()
        .filter(|(_, id)| id.language == wanted.language)
        .collect();
    same_language
        .iter()
        .find(|(_, id)| id.region.is_none())
        .or_else(|| same_language.first())
        .map(|(code, _)| *code)
}

/// Reads the user's language from `LC_ALL`, `LC_MESSAGES` and `LANG`.
/// （從環境變數偵測使用者語系。）
pub fn system_language() -> Option<String> {
    system_language_from(|name| env::var(name).ok())
}

pub(crate) fn system_language_from<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    LOCALE_ENV_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .find(|value| !value.trim().is_empty())
        .and_then(|value| parse_language(&value))
        .map(|id| id.to_string())
}
