//! Query documents for faceted search backends.
//!
//! This crate models the one structured request shape the faceted search
//! front end talks to its backend with:
//!
//! - **Clauses**: `term`, `missing`, `range`, `query_string`, `bool`, `and`,
//!   `nested`, `filtered` and `match_all`, as a tagged tree
//! - **Documents**: the clause tree plus paging, sort, projection and facet
//!   requests
//! - **Fuzzify**: automatic wildcard or fuzzy decoration of free text
//!
//! Clause trees are built compositionally and serialized once, at the
//! boundary. Parsing goes the other way and never fails on unfamiliar
//! shapes: anything unrecognized is kept verbatim as [`Clause::Raw`].
//!
//! # Example
//!
//! ```
//! use facet_query::{Clause, QueryDocument};
//!
//! let doc = QueryDocument::new(Clause::must(vec![Clause::term("size", "S")]));
//! assert!(doc.to_json().contains(r#"{"term":{"size":"S"}}"#));
//! ```

#![warn(missing_docs)]

mod clause;
mod document;
mod error;
mod fuzzify;
mod types;

pub use clause::{Clause, QueryString, scalar_string};
pub use document::QueryDocument;
pub use error::SourceError;
pub use fuzzify::{Fuzzify, fuzzify};
pub use types::{FacetOrder, Logic, UnknownVariant};
