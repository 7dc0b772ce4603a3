//! The closed translation language catalog.
//!
//! Arabic is always present in the output and is not listed here; at most
//! one translation language is added on top.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use versecast_common::error::VersecastError;

/// One of the ten supported translation languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
    Urdu,
    Turkish,
    Indonesian,
    Bengali,
    Spanish,
    Russian,
    German,
    Chinese,
}

impl Language {
    /// All supported translation languages.
    pub fn all() -> [Language; 10] {
        [
            Language::English,
            Language::French,
            Language::Urdu,
            Language::Turkish,
            Language::Indonesian,
            Language::Bengali,
            Language::Spanish,
            Language::Russian,
            Language::German,
            Language::Chinese,
        ]
    }

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Urdu => "ur",
            Language::Turkish => "tr",
            Language::Indonesian => "id",
            Language::Bengali => "bn",
            Language::Spanish => "es",
            Language::Russian => "ru",
            Language::German => "de",
            Language::Chinese => "zh",
        }
    }

    /// Provider translation edition identifier.
    pub fn edition(&self) -> &'static str {
        match self {
            Language::English => "en.sahih",
            Language::French => "fr.hamidullah",
            Language::Urdu => "ur.jalandhry",
            Language::Turkish => "tr.diyanet",
            Language::Indonesian => "id.indonesian",
            Language::Bengali => "bn.bengali",
            Language::Spanish => "es.cortes",
            Language::Russian => "ru.kuliev",
            Language::German => "de.bubenheim",
            Language::Chinese => "zh.jian",
        }
    }

    /// English display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
            Language::Urdu => "Urdu",
            Language::Turkish => "Turkish",
            Language::Indonesian => "Indonesian",
            Language::Bengali => "Bengali",
            Language::Spanish => "Spanish",
            Language::Russian => "Russian",
            Language::German => "German",
            Language::Chinese => "Chinese",
        }
    }

    /// Whether the script is written right-to-left.
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Urdu)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = VersecastError;

    /// Accepts the ISO code ("en") or the English name ("English",
    /// case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Language::all()
            .into_iter()
            .find(|l| l.code() == needle || l.display_name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                VersecastError::config(format!(
                    "unknown language '{needle}' (known: {})",
                    Language::all()
                        .iter()
                        .map(|l| l.code())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}
