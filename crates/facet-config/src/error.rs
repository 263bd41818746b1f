//! Error types for facet configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading or processing configuration.
///
/// All of these are fatal: a session never starts from a configuration that
/// produced one.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// A facet entry has no field, or an empty one.
    #[error("facet #{index} has no field")]
    EmptyFacetField {
        /// Zero-based position of the facet in the list.
        index: usize,
    },

    /// Two facets name the same field.
    #[error("facet field defined twice: {field}")]
    DuplicateFacet {
        /// The repeated field.
        field: String,
    },

    /// A hierarchy is declared for a field that is not a facet.
    #[error("hierarchy declared for unknown facet: {facet}")]
    UnknownHierarchyFacet {
        /// Field named by the hierarchy.
        facet: String,
    },

    /// A leaf label appears more than once in one hierarchy.
    #[error("hierarchy for {facet} repeats leaf '{label}'")]
    DuplicateHierarchyLeaf {
        /// Facet owning the hierarchy.
        facet: String,
        /// The repeated label.
        label: String,
    },

    /// A hierarchy entry has an unsupported shape.
    #[error("invalid hierarchy for {facet}: {message}")]
    InvalidHierarchy {
        /// Facet owning the hierarchy.
        facet: String,
        /// What was wrong.
        message: String,
    },

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// Effective settings could not be rendered as TOML.
    #[error("failed to render settings: {0}")]
    SerializeToml(#[from] toml::ser::Error),
}
