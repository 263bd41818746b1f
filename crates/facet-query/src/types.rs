//! Small enums shared by every layer of the facet stack.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    /// What was being parsed (e.g. "logic").
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// How selections under one key, or the terms of a free-text query, combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    /// Every constraint must hold.
    #[default]
    And,
    /// Any one constraint suffices.
    Or,
}

impl Logic {
    /// Returns the opposite combination.
    pub fn flipped(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }

    /// Returns the backend spelling (`AND` / `OR`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Logic {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(UnknownVariant {
                kind: "logic",
                value: s.to_string(),
            }),
        }
    }
}

/// Display and request order for a facet's values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetOrder {
    /// Lexicographic, ascending.
    #[default]
    Term,
    /// Lexicographic, descending.
    ReverseTerm,
    /// By count, ascending.
    Count,
    /// By count, descending.
    ReverseCount,
}

impl FacetOrder {
    /// Returns the next order in the sort-toggle cycle.
    ///
    /// The cycle is term, reverse term, count, reverse count, then back to term.
    pub fn next(self) -> Self {
        match self {
            Self::Term => Self::ReverseTerm,
            Self::ReverseTerm => Self::Count,
            Self::Count => Self::ReverseCount,
            Self::ReverseCount => Self::Term,
        }
    }

    /// Returns the backend spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::ReverseTerm => "reverse_term",
            Self::Count => "count",
            Self::ReverseCount => "reverse_count",
        }
    }
}

impl fmt::Display for FacetOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacetOrder {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term" => Ok(Self::Term),
            "reverse_term" | "rterm" => Ok(Self::ReverseTerm),
            "count" => Ok(Self::Count),
            "reverse_count" | "rcount" => Ok(Self::ReverseCount),
            _ => Err(UnknownVariant {
                kind: "facet order",
                value: s.to_string(),
            }),
        }
    }
}
