//! State mutations as values.
//!
//! Every change to a [`QueryState`] can be expressed as a [`Command`]. The
//! decompiler produces them, the session dispatches them, and a UI layer only
//! has to translate its events into them.

use facet_config::{Config, find_node};
use facet_query::Logic;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::{QueryState, SelectionValue, SortSpec};

/// One mutation of the selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Select a value. Without an explicit mode, the key's current mode is
    /// kept, falling back to the facet's configured operator.
    AddSelection {
        /// Dotted field path.
        key: String,
        /// Value to select.
        value: SelectionValue,
        /// Requested mode.
        logic: Option<Logic>,
    },
    /// Deselect a value.
    RemoveSelection {
        /// Dotted field path.
        key: String,
        /// Value to deselect.
        value: SelectionValue,
    },
    /// Flip a key between AND and OR.
    ToggleKeyLogic {
        /// Dotted field path.
        key: String,
    },
    /// Restrict a facet to an inclusive range.
    SetRange {
        /// Facet position.
        facet: usize,
        /// Lower bound.
        low: String,
        /// Upper bound.
        high: String,
    },
    /// Remove a facet's range.
    ClearRange {
        /// Facet position.
        facet: usize,
    },
    /// Replace the free text.
    SetFreeText {
        /// New text.
        text: String,
    },
    /// Restrict free text to a field.
    SetSearchField {
        /// Field, or `None` for all fields.
        field: Option<String>,
    },
    /// Replace the sort keys.
    SetSort {
        /// Sort keys in priority order.
        sort: Vec<SortSpec>,
    },
    /// Jump to an offset.
    SetPage {
        /// Offset of the first record.
        from: u64,
    },
    /// Change the page size.
    SetPageSize {
        /// Records per page.
        size: u64,
    },
    /// Advance one page.
    NextPage,
    /// Go back one page.
    PreviousPage,
    /// Advance a facet to its next sort order.
    CycleFacetOrder {
        /// Facet position.
        facet: usize,
    },
    /// Select a hierarchy node: a leaf selects itself, a branch every leaf below it.
    SelectNode {
        /// Facet position.
        facet: usize,
        /// Labels from the top level down to the node.
        path: Vec<String>,
    },
    /// Deselect a hierarchy node and every leaf below it.
    DeselectNode {
        /// Facet position.
        facet: usize,
        /// Labels from the top level down to the node.
        path: Vec<String>,
    },
    /// Empty selections, ranges and free text.
    Clear,
}

impl Command {
    /// True when the command can change which records match.
    pub fn changes_selection(&self) -> bool {
        !matches!(
            self,
            Self::SetPage { .. }
                | Self::SetPageSize { .. }
                | Self::NextPage
                | Self::PreviousPage
                | Self::CycleFacetOrder { .. }
                | Self::SetSort { .. }
        )
    }
}

/// Applies a command to a state.
///
/// `CycleFacetOrder` changes configuration, not state, and is ignored here.
/// `NextPage` is not bounded by the result count; callers that know it check
/// first. Returns whether the state changed.
pub fn apply(state: &mut QueryState, command: &Command, config: &Config) -> bool {
    match command {
        Command::AddSelection { key, value, logic } => {
            let logic = resolve_logic(state, config, key, *logic);
            state.add_selection(key, value.clone(), logic)
        }
        Command::RemoveSelection { key, value } => state.remove_selection(key, value),
        Command::ToggleKeyLogic { key } => state.toggle_key_logic(key),
        Command::SetRange { facet, low, high } => {
            state.set_range(*facet, low.clone(), high.clone());
            true
        }
        Command::ClearRange { facet } => state.clear_range(*facet),
        Command::SetFreeText { text } => state.set_free_text(text.clone()),
        Command::SetSearchField { field } => state.set_search_field(field.clone()),
        Command::SetSort { sort } => state.set_sort(sort.clone()),
        Command::SetPage { from } => state.set_page(*from),
        Command::SetPageSize { size } => state.set_page_size(*size),
        Command::NextPage => {
            let from = state.paging.from + state.paging.size;
            state.set_page(from)
        }
        Command::PreviousPage => {
            let from = state.paging.from.saturating_sub(state.paging.size);
            state.set_page(from)
        }
        Command::CycleFacetOrder { .. } => false,
        Command::SelectNode { facet, path } => {
            let Some((key, leaves)) = node_leaves(config, *facet, path) else {
                return false;
            };
            let logic = resolve_logic(state, config, &key, None);
            let mut changed = false;
            for leaf in leaves {
                changed |= state.add_selection(&key, SelectionValue::from(leaf), logic);
            }
            changed
        }
        Command::DeselectNode { facet, path } => {
            let Some((key, leaves)) = node_leaves(config, *facet, path) else {
                return false;
            };
            let mut changed = false;
            for leaf in leaves {
                changed |= state.remove_selection(&key, &SelectionValue::from(leaf));
            }
            changed
        }
        Command::Clear => {
            let changed = !state.is_empty() || state.paging.from != 0;
            state.clear();
            changed
        }
    }
}

/// Picks the mode for a new selection on `key`.
fn resolve_logic(
    state: &QueryState,
    config: &Config,
    key: &str,
    requested: Option<Logic>,
) -> Logic {
    requested
        .or_else(|| state.key_logic(key))
        .or_else(|| config.facet(key).map(|f| f.operator))
        .unwrap_or_default()
}

/// Resolves a hierarchy node to its facet field and leaf values.
fn node_leaves(config: &Config, facet: usize, path: &[String]) -> Option<(String, Vec<String>)> {
    let Some(spec) = config.facets.get(facet) else {
        warn!(facet, "node selection on unknown facet");
        return None;
    };
    let Some(tree) = config.hierarchy(&spec.field) else {
        warn!(field = %spec.field, "node selection on facet without hierarchy");
        return None;
    };
    let path: Vec<&str> = path.iter().map(String::as_str).collect();
    let Some(node) = find_node(tree, &path) else {
        warn!(field = %spec.field, path = ?path, "node selection on unknown node");
        return None;
    };
    let leaves = node.leaves().into_iter().map(String::from).collect();
    Some((spec.field.clone(), leaves))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_toml_str(
            r#"
[[facet]]
field = "subject"

[[facet]]
field = "year"
operator = "OR"

[hierarchy.subject]
Fruit = { Apple = [], Banana = [] }
Vegetable = ["Carrot"]
"#,
        )
        .unwrap()
    }

    fn add(key: &str, value: &str, logic: Option<Logic>) -> Command {
        Command::AddSelection {
            key: key.into(),
            value: value.into(),
            logic,
        }
    }

    #[test]
    fn add_without_logic_uses_facet_operator() {
        let config = config();
        let mut state = QueryState::default();
        apply(&mut state, &add("year", "2001", None), &config);
        apply(&mut state, &add("subject", "Apple", None), &config);
        apply(&mut state, &add("other", "x", None), &config);
        assert_eq!(state.key_logic("year"), Some(Logic::Or));
        assert_eq!(state.key_logic("subject"), Some(Logic::And));
        assert_eq!(state.key_logic("other"), Some(Logic::And));
    }

    #[test]
    fn add_without_logic_keeps_key_mode() {
        let config = config();
        let mut state = QueryState::default();
        apply(&mut state, &add("subject", "Apple", Some(Logic::Or)), &config);
        apply(&mut state, &add("subject", "Banana", None), &config);
        assert!(state.selections_for("subject").all(|s| s.logic == Logic::Or));
    }

    #[test]
    fn select_branch_selects_all_leaves() {
        let config = config();
        let mut state = QueryState::default();
        let select = Command::SelectNode {
            facet: 0,
            path: vec!["Fruit".into()],
        };
        assert!(apply(&mut state, &select, &config));
        let values: Vec<_> = state.selections.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["Apple", "Banana"]);

        let deselect = Command::DeselectNode {
            facet: 0,
            path: vec!["Fruit".into(), "Apple".into()],
        };
        assert!(apply(&mut state, &deselect, &config));
        assert_eq!(state.selections.len(), 1);
    }

    #[test]
    fn select_unknown_node_is_ignored() {
        let config = config();
        let mut state = QueryState::default();
        let select = Command::SelectNode {
            facet: 1,
            path: vec!["Fruit".into()],
        };
        assert!(!apply(&mut state, &select, &config));
        assert!(state.selections.is_empty());
    }

    #[test]
    fn paging_commands() {
        let config = config();
        let mut state = QueryState::default();
        apply(&mut state, &Command::NextPage, &config);
        apply(&mut state, &Command::NextPage, &config);
        assert_eq!(state.paging.from, 20);
        apply(&mut state, &Command::PreviousPage, &config);
        assert_eq!(state.paging.from, 10);
        apply(&mut state, &Command::SetPage { from: 3 }, &config);
        apply(&mut state, &Command::PreviousPage, &config);
        assert_eq!(state.paging.from, 0);
    }

    #[test]
    fn commands_serialize_with_tag() {
        let json = serde_json::to_value(add("size", "S", Some(Logic::Or))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"command": "add_selection", "key": "size", "value": "S", "logic": "OR"})
        );
    }

    #[test]
    fn only_selection_commands_change_selection() {
        assert!(add("a", "b", None).changes_selection());
        assert!(Command::Clear.changes_selection());
        assert!(!Command::NextPage.changes_selection());
        assert!(!Command::CycleFacetOrder { facet: 0 }.changes_selection());
    }
}
