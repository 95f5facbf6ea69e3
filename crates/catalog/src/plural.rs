//! Per-language plural rules for `numerus` messages.
//!
//! A `.ts` plural message stores one `numerusform` per plural category of the
//! target language, in the fixed order zero, one, two, few, many, other
//! (only the categories the language uses). The number of slots and the
//! category chosen for a count are properties of the language, never of the
//! document.

use std::fmt;

use crate::language::primary_subtag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ONE_OTHER: &[PluralCategory] = &[PluralCategory::One, PluralCategory::Other];
const ONE_FEW_MANY_OTHER: &[PluralCategory] = &[
    PluralCategory::One,
    PluralCategory::Few,
    PluralCategory::Many,
    PluralCategory::Other,
];
const OTHER_ONLY: &[PluralCategory] = &[PluralCategory::Other];

/// Plural rule families covering the languages OpenNumismat ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// `one` for exactly 1, `other` otherwise (es, it, sv, nl, de, ...).
    Germanic,
    /// `one` for 0 and 1, `other` otherwise (fr, pt, hi).
    French,
    /// `one` / `few` / `many` by last one and two digits (uk, ru, be).
    EastSlavic,
    /// `one` for 1, `few` for 2-4 except 12-14, `many` otherwise (pl).
    Polish,
    /// `one` for 1, `few` for 2-4, `other` otherwise; `many` is reserved for
    /// fractional values (cs, sk).
    WestSlavic,
    /// No plural distinction (zh, ja, ko, ...).
    Invariant,
}

impl PluralRule {
    /// Picks the rule for a language code such as `uk`, `nl_NL` or `pt-BR`.
    /// Unknown languages use the `one`/`other` rule.
    pub fn for_language(code: &str) -> Self {
        match primary_subtag(code).as_str() {
            "en" | "de" | "nl" | "sv" | "da" | "no" | "nb" | "nn" | "it" | "es" | "el" | "hu"
            | "fi" | "et" | "tr" | "bg" | "ca" | "gl" | "eu" => Self::Germanic,
            "fr" | "pt" | "hi" | "bn" => Self::French,
            "uk" | "ru" | "be" => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::WestSlavic,
            "zh" | "ja" | "ko" | "th" | "vi" | "id" | "ms" => Self::Invariant,
            _ => Self::Germanic,
        }
    }

    /// Categories in `numerusform` slot order.
    pub fn categories(self) -> &'static [PluralCategory] {
        match self {
            Self::Germanic | Self::French => ONE_OTHER,
            Self::EastSlavic | Self::Polish | Self::WestSlavic => ONE_FEW_MANY_OTHER,
            Self::Invariant => OTHER_ONLY,
        }
    }

    /// Number of `numerusform` entries a plural message should carry.
    pub fn form_count(self) -> usize {
        self.categories().len()
    }

    pub fn category(self, count: i64) -> PluralCategory {
        let n = count.unsigned_abs();
        match self {
            Self::Germanic => {
                if n == 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::French => {
                if n <= 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::EastSlavic => east_slavic_rule(n),
            Self::Polish => polish_rule(n),
            Self::WestSlavic => match n {
                1 => PluralCategory::One,
                2..=4 => PluralCategory::Few,
                _ => PluralCategory::Other,
            },
            Self::Invariant => PluralCategory::Other,
        }
    }

    /// Index of the `numerusform` to use for `count`.
    pub fn form_index(self, count: i64) -> usize {
        let categories = self.categories();
        let category = self.category(count);
        categories
            .iter()
            .position(|candidate| *candidate == category)
            .or_else(|| {
                categories
                    .iter()
                    .position(|candidate| *candidate == PluralCategory::Other)
            })
            .unwrap_or(0)
    }
}

fn east_slavic_rule(n: u64) -> PluralCategory {
    let mod10 = n % 10;
    let mod100 = n % 100;

    if mod10 == 1 && mod100 != 11 {
        PluralCategory::One
    } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

fn polish_rule(n: u64) -> PluralCategory {
    let mod10 = n % 10;
    let mod100 = n % 100;

    if n == 1 {
        PluralCategory::One
    } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}
