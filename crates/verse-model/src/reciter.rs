//! The closed reciter catalog.
//!
//! Reciter identifiers double as the provider's audio edition codes.
//! Unknown values are rejected at job creation, never mid-pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use versecast_common::error::VersecastError;

/// One of the nine supported reciters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reciter {
    Alafasy,
    AbdulBasit,
    Minshawi,
    Husary,
    Shaatree,
    Sudais,
    MaherMuaiqly,
    MuhammadAyyub,
    SaadAlGhamdi,
}

impl Reciter {
    /// All supported reciters, in catalog order.
    pub fn all() -> [Reciter; 9] {
        [
            Reciter::Alafasy,
            Reciter::AbdulBasit,
            Reciter::Minshawi,
            Reciter::Husary,
            Reciter::Shaatree,
            Reciter::Sudais,
            Reciter::MaherMuaiqly,
            Reciter::MuhammadAyyub,
            Reciter::SaadAlGhamdi,
        ]
    }

    /// Provider edition identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Reciter::Alafasy => "ar.alafasy",
            Reciter::AbdulBasit => "ar.abdulbasitmurattal",
            Reciter::Minshawi => "ar.minshawi",
            Reciter::Husary => "ar.husary",
            Reciter::Shaatree => "ar.shaatree",
            Reciter::Sudais => "ar.abdurrahmaansudais",
            Reciter::MaherMuaiqly => "ar.mahermuaiqly",
            Reciter::MuhammadAyyub => "ar.muhammadayyoub",
            Reciter::SaadAlGhamdi => "ar.saadalghaamidi",
        }
    }

    /// Full display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Reciter::Alafasy => "Mishary Alafasy",
            Reciter::AbdulBasit => "Abdul Basit",
            Reciter::Minshawi => "Al-Minshawi",
            Reciter::Husary => "Al-Husary",
            Reciter::Shaatree => "Ash-Shaatree",
            Reciter::Sudais => "Abdurrahman As-Sudais",
            Reciter::MaherMuaiqly => "Maher Al-Muaiqly",
            Reciter::MuhammadAyyub => "Muhammad Ayyub",
            Reciter::SaadAlGhamdi => "Saad Al-Ghamadi",
        }
    }

    /// Short name used in output filenames.
    pub fn short_name(&self) -> &'static str {
        match self {
            Reciter::Alafasy => "Alafasy",
            Reciter::AbdulBasit => "AbdulBasit",
            Reciter::Minshawi => "Minshawi",
            Reciter::Husary => "Husary",
            Reciter::Shaatree => "Shaatree",
            Reciter::Sudais => "Sudais",
            Reciter::MaherMuaiqly => "MaherMuaiqly",
            Reciter::MuhammadAyyub => "MuhammadAyyub",
            Reciter::SaadAlGhamdi => "SaadAlGhamdi",
        }
    }
}

impl fmt::Display for Reciter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Reciter {
    type Err = VersecastError;

    /// Accepts the provider edition id ("ar.alafasy") or the short name
    /// ("Alafasy", case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Reciter::all()
            .into_iter()
            .find(|r| r.id() == needle || r.short_name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                VersecastError::config(format!(
                    "unknown reciter '{needle}' (known: {})",
                    Reciter::all()
                        .iter()
                        .map(|r| r.short_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}
