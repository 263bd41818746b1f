//! Query decompilation.
//!
//! Recovers selection state from a query document produced elsewhere,
//! typically one carried by a share link. The result is a list of
//! [`Command`]s that, applied to an empty state, select the same records as
//! the input document.
//!
//! Recovery is best effort. Fragments that match a predefined filter are
//! skipped since they are implicit, and shapes that cannot be mapped back to
//! a selection are logged and ignored. Nothing here fails.

use facet_config::Config;
use facet_query::{Clause, Logic, QueryDocument};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    command::Command,
    state::{SelectionValue, SortSpec},
};

/// Recovers selection commands from query documents.
#[derive(Debug, Clone)]
pub struct QueryDecompiler<'a> {
    /// Static configuration.
    config: &'a Config,
    /// Predefined filters, parsed once for comparison.
    predefined: Vec<Clause>,
}

impl<'a> QueryDecompiler<'a> {
    /// Creates a decompiler over `config`.
    pub fn new(config: &'a Config) -> Self {
        let predefined = config
            .predefined_filters
            .values()
            .map(Clause::from_value)
            .collect();
        Self { config, predefined }
    }

    /// Decompiles a JSON document.
    ///
    /// Anything that is not an object yields no commands.
    pub fn decompile_value(&self, value: &Value) -> Vec<Command> {
        match QueryDocument::from_value(value) {
            Ok(doc) => self.decompile(&doc),
            Err(e) => {
                warn!(error = %e, "ignoring undecodable query document");
                Vec::new()
            }
        }
    }

    /// Decompiles a parsed document.
    ///
    /// Paging commands come last, since every selection command returns the
    /// state to the first page.
    pub fn decompile(&self, doc: &QueryDocument) -> Vec<Command> {
        let mut commands = Vec::new();
        self.walk(&doc.query, &mut commands);

        if !doc.sort.is_empty() {
            let sort: Vec<SortSpec> = doc
                .sort
                .iter()
                .filter_map(|v| {
                    let spec = SortSpec::from_value(v);
                    if spec.is_none() {
                        warn!(sort = %v, "ignoring unrecognized sort");
                    }
                    spec
                })
                .collect();
            commands.push(Command::SetSort { sort });
        }
        if let Some(size) = doc.size {
            commands.push(Command::SetPageSize { size });
        }
        if let Some(from) = doc.from {
            commands.push(Command::SetPage { from });
        }

        debug!(commands = commands.len(), "decompiled query");
        commands
    }

    /// Walks one clause in a conjunctive position.
    fn walk(&self, clause: &Clause, out: &mut Vec<Command>) {
        if self.is_predefined(clause) {
            debug!("skipping predefined filter");
            return;
        }

        match clause {
            Clause::MatchAll => {}
            Clause::Term { field, value } => out.push(add(field, value.clone().into(), Logic::And)),
            Clause::Missing { field } => {
                out.push(add(field, SelectionValue::Undefined, Logic::And));
            }
            Clause::Range { field, from, to } => match self.config.facet_index(field) {
                Some(facet) => out.push(Command::SetRange {
                    facet,
                    low: from.clone(),
                    high: to.clone(),
                }),
                None => warn!(field = %field, "ignoring range on a field that is not a facet"),
            },
            Clause::QueryString(qs) => {
                out.push(Command::SetFreeText {
                    text: qs.query.clone(),
                });
                if qs.default_field.is_some() {
                    out.push(Command::SetSearchField {
                        field: qs.default_field.clone(),
                    });
                }
            }
            Clause::Bool { must, should } => {
                for member in must {
                    self.walk(member, out);
                }
                if !should.is_empty() {
                    self.walk_or_group(should, out);
                }
            }
            Clause::And(clauses) => {
                for member in clauses {
                    self.walk(member, out);
                }
            }
            Clause::Nested { query, .. } => self.walk(query, out),
            Clause::Filtered { query, filter } => {
                self.walk(query, out);
                self.walk(filter, out);
            }
            Clause::Raw(value) => warn!(clause = %value, "ignoring unrecognized clause"),
        }
    }

    /// Walks the members of a `should` array as one OR-group.
    ///
    /// Predefined filters only ever sit in conjunctive positions, so every
    /// member here is a user selection, even one equal to a predefined clause.
    fn walk_or_group(&self, members: &[Clause], out: &mut Vec<Command>) {
        for member in members {
            match member {
                Clause::Term { field, value } => {
                    out.push(add(field, value.clone().into(), Logic::Or));
                }
                Clause::Missing { field } => {
                    out.push(add(field, SelectionValue::Undefined, Logic::Or));
                }
                other => warn!(clause = %other.to_value(), "ignoring unsupported OR member"),
            }
        }
    }

    /// True when `clause` is structurally identical to a predefined filter.
    fn is_predefined(&self, clause: &Clause) -> bool {
        self.predefined.iter().any(|p| p == clause)
    }
}

/// Builds an add-selection command with an explicit mode.
fn add(key: &str, value: SelectionValue, logic: Logic) -> Command {
    Command::AddSelection {
        key: key.to_string(),
        value,
        logic: Some(logic),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        command::apply,
        compile::QueryCompiler,
        state::{Paging, QueryState},
    };

    fn config() -> Config {
        Config::from_toml_str(
            r#"
nested = ["stats"]

[search]
fuzzify = "*"

[[facet]]
field = "size"

[[facet]]
field = "stats.year"

[predefined_filters]
type = { term = { type = "article" } }
"#,
        )
        .unwrap()
    }

    fn replay(config: &Config, commands: &[Command]) -> QueryState {
        let mut state = QueryState::new(Paging::default());
        for command in commands {
            apply(&mut state, command, config);
        }
        state
    }

    #[test]
    fn or_group_members_get_or_logic() {
        let config = config();
        let commands = QueryDecompiler::new(&config).decompile_value(&json!({
            "query": {"bool": {"should": [
                {"term": {"size": "S"}},
                {"missing": {"field": "size"}}
            ]}}
        }));
        assert_eq!(
            commands,
            vec![
                add("size", "S".into(), Logic::Or),
                add("size", SelectionValue::Undefined, Logic::Or),
            ]
        );
    }

    #[test]
    fn predefined_filters_are_skipped() {
        let config = config();
        let commands = QueryDecompiler::new(&config).decompile_value(&json!({
            "query": {"bool": {"must": [
                {"term": {"type": "article"}},
                {"term": {"type": "book"}}
            ]}}
        }));
        assert_eq!(commands, vec![add("type", "book".into(), Logic::And)]);
    }

    #[test]
    fn missing_field_array_becomes_undefined_selections() {
        let config = config();
        let commands = QueryDecompiler::new(&config).decompile_value(&json!({
            "query": {"filtered": {
                "query": {"match_all": {}},
                "filter": {"missing": {"field": ["a", "b"]}}
            }}
        }));
        assert_eq!(
            commands,
            vec![
                add("a", SelectionValue::Undefined, Logic::And),
                add("b", SelectionValue::Undefined, Logic::And),
            ]
        );
    }

    #[test]
    fn recovers_free_text_ranges_and_paging() {
        let config = config();
        let commands = QueryDecompiler::new(&config).decompile_value(&json!({
            "query": {"bool": {"must": [
                {"query_string": {"query": "*einstein*", "default_field": "title"}},
                {"nested": {"path": "stats", "query": {"bool": {"must": [
                    {"range": {"stats.year": {"from": 1990, "to": 2000}}}
                ]}}}}
            ]}},
            "from": 20,
            "size": 5,
            "sort": [{"year": {"order": "desc"}}]
        }));
        let state = replay(&config, &commands);
        assert_eq!(state.free_text, "*einstein*");
        assert_eq!(state.search_field.as_deref(), Some("title"));
        assert_eq!(state.ranges.len(), 1);
        assert_eq!(state.ranges[0].facet, 1);
        assert_eq!(state.ranges[0].low, "1990");
        assert_eq!(state.paging, Paging { from: 20, size: 5 });
        assert_eq!(state.sort.len(), 1);
    }

    #[test]
    fn unknown_shapes_are_ignored() {
        let config = config();
        let commands = QueryDecompiler::new(&config).decompile_value(&json!({
            "query": {"bool": {"must": [
                {"geo_distance": {"distance": "10km"}},
                {"term": {"size": "S"}}
            ]}}
        }));
        assert_eq!(commands, vec![add("size", "S".into(), Logic::And)]);
        assert!(
            QueryDecompiler::new(&config)
                .decompile_value(&json!("nope"))
                .is_empty()
        );
    }

    #[test]
    fn compile_decompile_is_idempotent() {
        let config = config();
        let mut state = QueryState::new(Paging::default());
        state.add_selection("size", "S".into(), Logic::Or);
        state.add_selection("size", "undefined".into(), Logic::Or);
        state.add_selection("color", "red".into(), Logic::And);
        state.add_selection("shape", "undefined".into(), Logic::And);
        state.add_selection("stats.year", "2001".into(), Logic::And);
        state.add_selection("stats.source", "web".into(), Logic::Or);
        state.set_range(0, "1", "5");
        state.set_free_text("einstein");
        state.set_page(30);

        let compiler = QueryCompiler::new(&config);
        let decompiler = QueryDecompiler::new(&config);
        let first = compiler.compile(&state);
        let recovered = replay(&config, &decompiler.decompile(&first));
        let second = compiler.compile(&recovered);

        assert_eq!(recovered.selection_signature(), state.selection_signature());
        assert_eq!(recovered.paging, state.paging);
        assert_eq!(first.query, second.query);
        assert_eq!(first.to_json(), second.to_json());
    }

    #[test]
    fn or_member_equal_to_predefined_filter_is_kept() {
        let config = config();
        let mut state = QueryState::new(Paging::default());
        state.add_selection("type", "article".into(), Logic::Or);
        state.add_selection("type", "book".into(), Logic::Or);

        let compiler = QueryCompiler::new(&config);
        let first = compiler.compile(&state);
        let commands = QueryDecompiler::new(&config).decompile(&first);
        assert_eq!(
            commands,
            vec![
                add("type", "article".into(), Logic::Or),
                add("type", "book".into(), Logic::Or),
            ]
        );

        let second = compiler.compile(&replay(&config, &commands));
        assert_eq!(first.to_json(), second.to_json());
    }
}
