//! Selection state, query compilation and facet aggregation.
//!
//! This crate is the engine behind the facet front end. It holds no UI and
//! owns no global state; everything runs through a [`Session`]:
//!
//! - **State**: [`QueryState`] and the [`Command`]s that mutate it
//! - **Compile**: [`QueryCompiler`] turns state into a [`QueryDocument`]
//! - **Decompile**: [`QueryDecompiler`] recovers commands from a document
//! - **Reduce**: [`ResultReducer`] reads records, counts and pagination out
//!   of a backend response
//! - **Aggregate**: [`FacetAggregator`] turns counts into facet lists and
//!   trees
//! - **Transport**: [`Transport`] and its HTTP implementation
//!
//! [`QueryDocument`]: facet_query::QueryDocument

#![warn(missing_docs)]

mod command;
mod compile;
mod debounce;
mod decompile;
mod error;
mod facets;
mod results;
mod session;
mod share;
mod state;
mod transport;

pub use command::{Command, apply};
pub use compile::QueryCompiler;
pub use debounce::Debouncer;
pub use decompile::QueryDecompiler;
pub use error::{ShareError, TransportError};
pub use facets::{
    CountedNode, FacetAggregator, FacetEntries, FacetValue, FacetView, TreeNodeRecord, flatten,
    rollup, shown_values, sort_values,
};
pub use results::{
    FacetCounts, Pagination, RawHit, RawHits, RawResponse, RawTotal, ResultReducer, SearchResults,
};
pub use session::{SearchStatus, SearchTicket, Session};
pub use share::{SOURCE_PARAM, decode_source, extract_source, share_url};
pub use state::{
    FilterSelection, Paging, QueryState, RangeSelection, SelectionValue, SortDirection, SortSpec,
    UNDEFINED,
};
pub use transport::{HttpTransport, Transport};
