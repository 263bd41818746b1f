//! One search session.
//!
//! A [`Session`] owns a configuration and a [`QueryState`], and is the only
//! place either is mutated. The cycle is: [`Session::dispatch`] commands,
//! [`Session::begin_search`] to compile and take a ticket, send the ticket's
//! document through a [`Transport`], then hand the outcome to
//! [`Session::complete`]. Every ticket carries a generation number; outcomes
//! for anything but the newest ticket are dropped.

use facet_config::Config;
use facet_query::QueryDocument;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    command::{Command, apply},
    compile::QueryCompiler,
    debounce::Debouncer,
    decompile::QueryDecompiler,
    error::{ShareError, TransportError},
    facets::{FacetAggregator, FacetView},
    results::{RawResponse, ResultReducer, SearchResults},
    share::{decode_source, share_url},
    state::{Paging, QueryState},
    transport::Transport,
};

/// Where the session is in its search cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SearchStatus {
    /// No search issued yet.
    #[default]
    Idle,
    /// A search is in flight.
    Pending,
    /// The newest search succeeded.
    Ready,
    /// The newest search failed; earlier results are still shown.
    Failed(String),
}

/// A search waiting for its response.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    /// Generation this ticket was issued at.
    pub generation: u64,
    /// Document to send.
    pub doc: QueryDocument,
    /// Paging the document was compiled with.
    pub paging: Paging,
}

/// Search state for one view.
#[derive(Debug, Clone)]
pub struct Session {
    /// Static configuration, plus facet orders changed at runtime.
    config: Config,
    /// Current selections.
    state: QueryState,
    /// Generation of the newest ticket.
    generation: u64,
    /// Status of the newest search.
    status: SearchStatus,
    /// Last successful results.
    results: Option<SearchResults>,
    /// Facet views from the last successful search.
    facets: Vec<FacetView>,
    /// Whether the next aggregation keeps zero-count values from `facets`.
    retain_facets: bool,
    /// Whether the state changed since the last ticket.
    dirty: bool,
}

impl Session {
    /// Starts a session with an empty selection state.
    pub fn new(config: Config) -> Self {
        let paging = Paging {
            from: config.paging.from,
            size: config.paging.size,
        };
        Self {
            config,
            state: QueryState::new(paging),
            generation: 0,
            status: SearchStatus::Idle,
            results: None,
            facets: Vec::new(),
            retain_facets: false,
            dirty: true,
        }
    }

    /// Starts a session seeded from a share link, query string or raw
    /// document.
    ///
    /// Input that carries no readable document is logged and ignored.
    pub fn from_source(config: Config, input: &str) -> Self {
        let mut session = Self::new(config);
        match decode_source(input) {
            Ok(value) => {
                let commands = QueryDecompiler::new(&session.config).decompile_value(&value);
                for command in commands {
                    session.dispatch(command);
                }
            }
            Err(e) => warn!(error = %e, "ignoring undecodable source; starting empty"),
        }
        session
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the selection state.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Returns the status of the newest search.
    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Returns the last successful results.
    pub fn results(&self) -> Option<&SearchResults> {
        self.results.as_ref()
    }

    /// Returns the facet views from the last successful search.
    pub fn facets(&self) -> &[FacetView] {
        &self.facets
    }

    /// True when the state changed since the last search was issued.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns a debouncer using the configured free-text delay.
    pub fn debouncer(&self) -> Debouncer {
        Debouncer::from_millis(self.config.search.submit_delay_ms)
    }

    /// Applies a command.
    pub fn dispatch(&mut self, command: Command) -> &QueryState {
        let changed = match &command {
            Command::CycleFacetOrder { facet } => {
                self.cycle_facet_order(*facet);
                false
            }
            Command::NextPage if !self.has_next_page() => false,
            other => apply(&mut self.state, other, &self.config),
        };

        if changed {
            debug!(?command, "state changed");
            self.dirty = true;
            if command.changes_selection() {
                self.retain_facets = false;
            }
        }
        &self.state
    }

    /// False only when the last results show this is the final page.
    ///
    /// Results older than the current selections or paging say nothing about
    /// the page count, so they do not bound the move.
    fn has_next_page(&self) -> bool {
        let current = !self.dirty && self.retain_facets;
        let paging = self.state.paging;
        self.results.as_ref().is_none_or(|r| {
            let same_page = r.pagination.from == paging.from && r.pagination.size == paging.size;
            !(current && same_page) || r.pagination.has_next
        })
    }

    /// Advances a facet's order and re-sorts its current view.
    fn cycle_facet_order(&mut self, facet: usize) {
        let Some(spec) = self.config.facets.get_mut(facet) else {
            warn!(facet, "order change on unknown facet");
            return;
        };
        spec.order = spec.order.next();
        debug!(field = %spec.field, order = spec.order.as_str(), "facet order changed");

        if let Some(results) = &self.results {
            let aggregator = FacetAggregator::new(&self.config);
            self.facets = aggregator.aggregate(&results.facets, &self.state, &self.facets);
        }
    }

    /// Compiles the current state.
    pub fn compile(&self) -> QueryDocument {
        QueryCompiler::new(&self.config).compile(&self.state)
    }

    /// Compiles the current state and issues a new generation.
    ///
    /// Any ticket issued earlier becomes stale.
    pub fn begin_search(&mut self) -> SearchTicket {
        self.generation += 1;
        self.status = SearchStatus::Pending;
        self.dirty = false;
        debug!(generation = self.generation, "search issued");
        SearchTicket {
            generation: self.generation,
            doc: self.compile(),
            paging: self.state.paging,
        }
    }

    /// Records the outcome of a search.
    ///
    /// Returns false, changing nothing, when the ticket is stale. A failure
    /// keeps the previous results and facet views.
    pub fn complete(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<RawResponse, TransportError>,
    ) -> bool {
        if ticket.generation != self.generation {
            warn!(
                generation = ticket.generation,
                latest = self.generation,
                "discarding stale search response"
            );
            return false;
        }

        match outcome {
            Ok(response) => {
                let results = ResultReducer::new(&self.config).reduce(&response, ticket.paging);
                let previous: &[FacetView] = if self.retain_facets { &self.facets } else { &[] };
                let facets =
                    FacetAggregator::new(&self.config).aggregate(&results.facets, &self.state, previous);
                info!(found = results.found, "search complete");
                self.facets = facets;
                self.results = Some(results);
                self.retain_facets = true;
                self.status = SearchStatus::Ready;
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                self.status = SearchStatus::Failed(e.to_string());
            }
        }
        true
    }

    /// Runs one search through `transport`.
    pub async fn search(&mut self, transport: &dyn Transport) -> &SearchStatus {
        let ticket = self.begin_search();
        let outcome = transport.search(&ticket.doc).await;
        self.complete(&ticket, outcome);
        &self.status
    }

    /// Builds a share link for the current state.
    pub fn share_link(&self, base: &str) -> Result<Url, ShareError> {
        share_url(
            base,
            &self.compile(),
            self.config.search.include_facets_in_share_link,
        )
    }
}
