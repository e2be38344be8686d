//! Core data types shared by every component.
//!
//! Defines hemispheres, calendar periods, temporality, flag sentinel tables
//! and valid-data ranges used throughout the library.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Polar hemisphere covered by a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Single upper-case letter used in provenance and bad-date tables
    pub fn short_name(&self) -> &'static str {
        match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            Hemisphere::North => "north",
            Hemisphere::South => "south",
        }
    }

    /// Parse from any name whose first letter is `n` or `s`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.chars().next()?.to_ascii_uppercase() {
            'N' => Some(Hemisphere::North),
            'S' => Some(Hemisphere::South),
            _ => None,
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Calendar granularity a gridset represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Temporality {
    Daily,
    Monthly,
    Seasonal,
}

/// One calendar period tied to a stack layer or source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
}

impl Period {
    pub fn month_of(year: i32, month: u32) -> Self {
        Period::Month { year, month }
    }

    pub fn is_daily(&self) -> bool {
        matches!(self, Period::Day(_))
    }

    pub fn year(&self) -> i32 {
        match self {
            Period::Day(date) => date.year(),
            Period::Month { year, .. } => *year,
        }
    }

    pub fn month(&self) -> u32 {
        match self {
            Period::Day(date) => date.month(),
            Period::Month { month, .. } => *month,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Period::Day(date) => Some(*date),
            Period::Month { .. } => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Period::Month { year, month } => write!(f, "{year:04}-{month:02}"),
        }
    }
}

/// Flag sentinel codes for one hemisphere/dataset generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagValues {
    pub pole: f64,
    pub unused: f64,
    pub coast: f64,
    pub land: f64,
    pub missing: f64,
}

impl FlagValues {
    /// Named sentinels excluding the missing value
    pub fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("pole", self.pole),
            ("unused", self.unused),
            ("coast", self.coast),
            ("land", self.land),
        ]
    }

    /// True if `value` is one of the named sentinels or the missing value
    pub fn is_sentinel(&self, value: f64) -> bool {
        value == self.missing || self.named().iter().any(|(_, flag)| *flag == value)
    }

    /// True if `value` marks a cell that is land-like in every product
    pub fn is_landlike(&self, value: f64) -> bool {
        value == self.land || value == self.coast || value == self.missing
    }
}

/// Inclusive range of values interpreted as data rather than flags
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Range spanned by the difference of two values in this range
    pub fn difference_range(&self, other: &ValidRange) -> ValidRange {
        ValidRange::new(self.min - other.max, self.max - other.min)
    }
}
