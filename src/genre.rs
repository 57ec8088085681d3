//! Genre Profiles
//!
//! The fixed table of genres a track can be retimed to, with their target tempos.
//! The table is a process-wide constant and is checked once by
//! [`validate_profiles`] when a pipeline is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BeatshiftError, Result};

/// Target genre for a retiming run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Hardstyle,
    Techno,
    Trance,
    Hardbass,
    Lofi,
}

impl Genre {
    /// Every supported genre, in table order
    pub const ALL: [Genre; 5] = [
        Genre::Hardstyle,
        Genre::Techno,
        Genre::Trance,
        Genre::Hardbass,
        Genre::Lofi,
    ];

    /// Selector string accepted on input
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Hardstyle => "hardstyle",
            Genre::Techno => "techno",
            Genre::Trance => "trance",
            Genre::Hardbass => "hardbass",
            Genre::Lofi => "lofi",
        }
    }

    /// Target tempo for this genre in BPM
    pub fn target_bpm(&self) -> u32 {
        self.profile().target_bpm
    }

    /// Look up this genre's row in [`GENRE_PROFILES`]
    pub fn profile(&self) -> &'static GenreProfile {
        // The table holds one row per variant in declaration order.
        &GENRE_PROFILES[*self as usize]
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = BeatshiftError;

    /// Parse a genre selector, ignoring surrounding whitespace and ASCII case
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BeatshiftError::UnknownGenre {
                name: s.to_string(),
            })
    }
}

/// One row of the genre table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenreProfile {
    pub genre: Genre,
    pub target_bpm: u32,
}

/// Genre to target tempo table
pub const GENRE_PROFILES: [GenreProfile; 5] = [
    GenreProfile {
        genre: Genre::Hardstyle,
        target_bpm: 150,
    },
    GenreProfile {
        genre: Genre::Techno,
        target_bpm: 130,
    },
    GenreProfile {
        genre: Genre::Trance,
        target_bpm: 138,
    },
    GenreProfile {
        genre: Genre::Hardbass,
        target_bpm: 150,
    },
    GenreProfile {
        genre: Genre::Lofi,
        target_bpm: 90,
    },
];

/// Check the genre table: one row per genre, in order, with a positive tempo
pub fn validate_profiles() -> Result<()> {
    for (index, genre) in Genre::ALL.iter().enumerate() {
        let row = GENRE_PROFILES
            .get(index)
            .ok_or_else(|| BeatshiftError::InvalidConfig {
                reason: format!("genre table has no row for '{}'", genre),
            })?;
        if row.genre != *genre {
            return Err(BeatshiftError::InvalidConfig {
                reason: format!(
                    "genre table row {} is '{}', expected '{}'",
                    index, row.genre, genre
                ),
            });
        }
        if row.target_bpm == 0 {
            return Err(BeatshiftError::InvalidConfig {
                reason: format!("genre '{}' has a zero target tempo", genre),
            });
        }
    }
    Ok(())
}
