//! Facet count aggregation.
//!
//! Turns raw per-field counts into what a facet list or tree widget shows.
//!
//! # Flat facets
//!
//! Values are sorted by the facet's order. Values shown after the previous
//! search but absent now stay in the list at zero, until the selection set
//! changes and the caller stops passing the previous views. In AND mode,
//! zero-count values are hidden (not removed) when pruning is on.
//!
//! # Hierarchical facets
//!
//! Leaves take their count by exact label match; branches sum their
//! descendants bottom-up. Values without a leaf are dropped. The tree is
//! flattened into [`TreeNodeRecord`]s carrying their parent path, which any
//! tree widget can consume.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use facet_config::{Config, FacetSpec, HierarchyNode};
use facet_query::{FacetOrder, Logic};
use serde::Serialize;
use tracing::trace;

use crate::{
    results::FacetCounts,
    state::{QueryState, UNDEFINED},
};

/// One value of a flat facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    /// The value.
    pub value: String,
    /// Matching records.
    pub count: u64,
    /// Whether the value is shown.
    pub visible: bool,
}

/// One node of a hierarchical facet, flattened for a tree widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNodeRecord {
    /// Node label; for leaves, the facet value.
    pub label: String,
    /// Matching records, rolled up for branches.
    pub count: u64,
    /// Labels of the ancestors, top level first.
    pub parent_path: Vec<String>,
    /// Whether the node is a leaf.
    pub leaf: bool,
    /// Whether the node is shown.
    pub visible: bool,
}

impl TreeNodeRecord {
    /// Returns the full path to this node.
    pub fn path(&self) -> Vec<String> {
        let mut path = self.parent_path.clone();
        path.push(self.label.clone());
        path
    }
}

/// What a facet displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum FacetEntries {
    /// A sorted value list.
    Flat(Vec<FacetValue>),
    /// A flattened tree, depth first.
    Tree(Vec<TreeNodeRecord>),
}

/// Display state of one facet after a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetView {
    /// Facet field.
    pub field: String,
    /// Display label.
    pub label: String,
    /// Current order.
    pub order: FacetOrder,
    /// Current AND/OR mode.
    pub logic: Logic,
    /// Values or nodes.
    pub entries: FacetEntries,
}

impl FacetView {
    /// Returns the flat values, if this is a flat facet.
    pub fn values(&self) -> Option<&[FacetValue]> {
        match &self.entries {
            FacetEntries::Flat(values) => Some(values),
            FacetEntries::Tree(_) => None,
        }
    }
}

/// A hierarchy node with its rolled-up count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedNode {
    /// Node label.
    pub label: String,
    /// Own count for leaves, descendant sum for branches.
    pub count: u64,
    /// Children.
    pub children: Vec<Self>,
}

/// Computes counts for every node of a hierarchy.
///
/// Each node is visited once. Counts for values with no leaf are ignored.
pub fn rollup(nodes: &[HierarchyNode], counts: &HashMap<&str, u64>) -> Vec<CountedNode> {
    nodes
        .iter()
        .map(|node| {
            if node.is_leaf() {
                CountedNode {
                    label: node.label.clone(),
                    count: counts.get(node.label.as_str()).copied().unwrap_or(0),
                    children: Vec::new(),
                }
            } else {
                let children = rollup(&node.children, counts);
                CountedNode {
                    label: node.label.clone(),
                    count: children.iter().map(|c| c.count).sum(),
                    children,
                }
            }
        })
        .collect()
}

/// Compares two `(label, count)` pairs under a facet order.
fn compare(order: FacetOrder, a: (&str, u64), b: (&str, u64)) -> Ordering {
    match order {
        FacetOrder::Term => a.0.cmp(b.0),
        FacetOrder::ReverseTerm => b.0.cmp(a.0),
        FacetOrder::Count => a.1.cmp(&b.1),
        FacetOrder::ReverseCount => b.1.cmp(&a.1),
    }
}

/// Sorts values by `order`. Ties keep their incoming order.
pub fn sort_values(values: &mut [FacetValue], order: FacetOrder) {
    values.sort_by(|a, b| compare(order, (&a.value, a.count), (&b.value, b.count)));
}

/// Flattens a counted tree depth first.
///
/// Siblings keep the configured order under `term`, and the reverse of it
/// under `reverse_term`. The count orders sort them by count.
///
/// With `hide_zero`, nodes counting zero are marked invisible.
pub fn flatten(nodes: &[CountedNode], order: FacetOrder, hide_zero: bool) -> Vec<TreeNodeRecord> {
    let mut out = Vec::new();
    flatten_into(nodes, order, hide_zero, &mut Vec::new(), &mut out);
    out
}

/// Recursive step of [`flatten`].
fn flatten_into(
    nodes: &[CountedNode],
    order: FacetOrder,
    hide_zero: bool,
    parent_path: &mut Vec<String>,
    out: &mut Vec<TreeNodeRecord>,
) {
    let mut sorted: Vec<&CountedNode> = nodes.iter().collect();
    match order {
        FacetOrder::Term => {}
        FacetOrder::ReverseTerm => sorted.reverse(),
        FacetOrder::Count | FacetOrder::ReverseCount => {
            sorted.sort_by(|a, b| compare(order, (&a.label, a.count), (&b.label, b.count)));
        }
    }

    for node in sorted {
        out.push(TreeNodeRecord {
            label: node.label.clone(),
            count: node.count,
            parent_path: parent_path.clone(),
            leaf: node.children.is_empty(),
            visible: !(hide_zero && node.count == 0),
        });
        if !node.children.is_empty() {
            parent_path.push(node.label.clone());
            flatten_into(&node.children, order, hide_zero, parent_path, out);
            parent_path.pop();
        }
    }
}

/// Splits visible values into those shown before "more" and the hidden rest.
///
/// Returns the shown values and how many more there are. Without a
/// `min_size`, or when `expanded`, everything visible is shown.
pub fn shown_values(
    values: &[FacetValue],
    min_size: Option<usize>,
    expanded: bool,
) -> (Vec<&FacetValue>, usize) {
    let visible: Vec<&FacetValue> = values.iter().filter(|v| v.visible).collect();
    match min_size {
        Some(limit) if !expanded && visible.len() > limit => {
            let more = visible.len() - limit;
            (visible.into_iter().take(limit).collect(), more)
        }
        _ => (visible, 0),
    }
}

/// Builds facet views from raw counts.
#[derive(Debug, Clone, Copy)]
pub struct FacetAggregator<'a> {
    /// Static configuration.
    config: &'a Config,
}

impl<'a> FacetAggregator<'a> {
    /// Creates an aggregator over `config`.
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Builds a view for every configured facet.
    ///
    /// `previous` holds the views from the last search; pass an empty slice
    /// after the selection set changed to drop zero-count carry-over.
    pub fn aggregate(
        &self,
        counts: &BTreeMap<String, FacetCounts>,
        state: &QueryState,
        previous: &[FacetView],
    ) -> Vec<FacetView> {
        let empty = FacetCounts::default();
        self.config
            .facets
            .iter()
            .map(|facet| {
                let raw = counts.get(&facet.field).unwrap_or(&empty);
                let logic = state.key_logic(&facet.field).unwrap_or(facet.operator);
                let prior = previous.iter().find(|v| v.field == facet.field);
                self.view(facet, raw, logic, prior)
            })
            .collect()
    }

    /// Builds the view for one facet.
    pub fn view(
        &self,
        facet: &FacetSpec,
        raw: &FacetCounts,
        logic: Logic,
        previous: Option<&FacetView>,
    ) -> FacetView {
        let hide_zero = logic == Logic::And && self.config.search.prune_zero_counts;
        let entries = match self.config.hierarchy(&facet.field) {
            Some(tree) => {
                let lookup: HashMap<&str, u64> =
                    raw.terms.iter().map(|(v, c)| (v.as_str(), *c)).collect();
                FacetEntries::Tree(flatten(&rollup(tree, &lookup), facet.order, hide_zero))
            }
            None => {
                let prior = previous.and_then(FacetView::values).unwrap_or(&[]);
                FacetEntries::Flat(self.flat_values(raw, prior, facet.order, hide_zero))
            }
        };
        trace!(field = %facet.field, "aggregated facet");

        FacetView {
            field: facet.field.clone(),
            label: facet.label().to_string(),
            order: facet.order,
            logic,
            entries,
        }
    }

    /// Merges new counts with previously shown values and sorts them.
    fn flat_values(
        &self,
        raw: &FacetCounts,
        previous: &[FacetValue],
        order: FacetOrder,
        hide_zero: bool,
    ) -> Vec<FacetValue> {
        let mut values: Vec<FacetValue> = raw
            .terms
            .iter()
            .map(|(value, count)| FacetValue {
                value: value.clone(),
                count: *count,
                visible: true,
            })
            .collect();

        if self.config.search.add_undefined
            && raw.missing > 0
            && !values.iter().any(|v| v.value == UNDEFINED)
        {
            values.push(FacetValue {
                value: UNDEFINED.to_string(),
                count: raw.missing,
                visible: true,
            });
        }

        for old in previous {
            if !values.iter().any(|v| v.value == old.value) {
                values.push(FacetValue {
                    value: old.value.clone(),
                    count: 0,
                    visible: true,
                });
            }
        }

        for value in &mut values {
            value.visible = !(hide_zero && value.count == 0);
        }
        sort_values(&mut values, order);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> FacetCounts {
        FacetCounts {
            terms: pairs.iter().map(|(v, c)| (v.to_string(), *c)).collect(),
            missing: 0,
        }
    }

    fn config(extra: &str) -> Config {
        Config::from_toml_str(&format!(
            r#"
[[facet]]
field = "size"
order = "count"

[[facet]]
field = "food"
operator = "OR"

{extra}

[hierarchy.food]
Fruit = {{ Apple = [], Banana = [] }}
Vegetable = ["Carrot"]
"#
        ))
        .unwrap()
    }

    #[test]
    fn hierarchy_rolls_up_leaf_counts() {
        let tree = vec![HierarchyNode::branch(
            "Fruit",
            vec![HierarchyNode::leaf("Apple"), HierarchyNode::leaf("Banana")],
        )];
        let lookup = HashMap::from([("Apple", 3), ("Banana", 5), ("Kiwi", 9)]);
        let counted = rollup(&tree, &lookup);
        assert_eq!(counted[0].count, 8);
        assert_eq!(counted[0].children[0].count, 3);
        assert_eq!(counted[0].children[1].count, 5);
    }

    #[test]
    fn sort_orders_are_stable() {
        let mut values = vec![
            FacetValue { value: "b".into(), count: 2, visible: true },
            FacetValue { value: "a".into(), count: 2, visible: true },
            FacetValue { value: "c".into(), count: 1, visible: true },
        ];
        sort_values(&mut values, FacetOrder::ReverseCount);
        let order: Vec<_> = values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);

        sort_values(&mut values, FacetOrder::ReverseTerm);
        let order: Vec<_> = values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn previous_values_stay_at_zero() {
        let config = config("");
        let aggregator = FacetAggregator::new(&config);
        let state = QueryState::default();
        let first = aggregator.aggregate(
            &BTreeMap::from([("size".to_string(), counts(&[("S", 4), ("M", 2)]))]),
            &state,
            &[],
        );
        let second = aggregator.aggregate(
            &BTreeMap::from([("size".to_string(), counts(&[("S", 1)]))]),
            &state,
            &first,
        );
        let values = second[0].values().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].value, "M");
        assert_eq!(values[0].count, 0);
        assert!(!values[0].visible);

        let reset = aggregator.aggregate(
            &BTreeMap::from([("size".to_string(), counts(&[("S", 1)]))]),
            &state,
            &[],
        );
        assert_eq!(reset[0].values().unwrap().len(), 1);
    }

    #[test]
    fn or_mode_keeps_zero_values_visible() {
        let config = config("");
        let aggregator = FacetAggregator::new(&config);
        let facet = &config.facets[0];
        let prior = FacetView {
            field: "size".into(),
            label: "size".into(),
            order: FacetOrder::Count,
            logic: Logic::Or,
            entries: FacetEntries::Flat(vec![FacetValue {
                value: "XL".into(),
                count: 3,
                visible: true,
            }]),
        };
        let view = aggregator.view(facet, &counts(&[("S", 1)]), Logic::Or, Some(&prior));
        let values = view.values().unwrap();
        assert!(values.iter().all(|v| v.visible));
        assert_eq!(values[0].value, "XL");
    }

    #[test]
    fn undefined_bucket_needs_option_and_missing_count() {
        let config = config("[search]\nadd_undefined = true\n");
        let aggregator = FacetAggregator::new(&config);
        let facet = &config.facets[0];
        let mut raw = counts(&[("S", 1)]);
        raw.missing = 2;
        let view = aggregator.view(facet, &raw, Logic::And, None);
        assert!(view.values().unwrap().iter().any(|v| v.value == "undefined" && v.count == 2));

        raw.missing = 0;
        let view = aggregator.view(facet, &raw, Logic::And, None);
        assert!(!view.values().unwrap().iter().any(|v| v.value == "undefined"));
    }

    #[test]
    fn tree_view_hides_zero_branches_only_in_and_mode() {
        let config = config("");
        let aggregator = FacetAggregator::new(&config);
        let facet = &config.facets[1];
        let raw = counts(&[("Apple", 3), ("Banana", 5), ("Pluto", 2)]);

        let or_view = aggregator.view(facet, &raw, Logic::Or, None);
        let FacetEntries::Tree(nodes) = &or_view.entries else {
            panic!("expected tree");
        };
        let labels: Vec<_> = nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Fruit", "Apple", "Banana", "Vegetable", "Carrot"]);
        assert_eq!(nodes[0].count, 8);
        assert_eq!(nodes[1].parent_path, vec!["Fruit".to_string()]);
        assert!(nodes[1].leaf);
        assert!(nodes.iter().all(|n| n.visible));

        let and_view = aggregator.view(facet, &raw, Logic::And, None);
        let FacetEntries::Tree(nodes) = &and_view.entries else {
            panic!("expected tree");
        };
        let hidden: Vec<_> = nodes
            .iter()
            .filter(|n| !n.visible)
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(hidden, vec!["Vegetable", "Carrot"]);
        assert_eq!(nodes[2].path(), vec!["Fruit".to_string(), "Banana".to_string()]);
    }

    #[test]
    fn tree_siblings_follow_configured_order() {
        let tree = vec![
            HierarchyNode::leaf("Zucchini"),
            HierarchyNode::leaf("Apple"),
            HierarchyNode::leaf("Mango"),
        ];
        let lookup = HashMap::from([("Zucchini", 1), ("Apple", 2), ("Mango", 7)]);
        let counted = rollup(&tree, &lookup);
        let labels = |order: FacetOrder| -> Vec<String> {
            flatten(&counted, order, false)
                .into_iter()
                .map(|n| n.label)
                .collect()
        };

        assert_eq!(labels(FacetOrder::Term), vec!["Zucchini", "Apple", "Mango"]);
        assert_eq!(labels(FacetOrder::ReverseTerm), vec!["Mango", "Apple", "Zucchini"]);
        assert_eq!(labels(FacetOrder::ReverseCount), vec!["Mango", "Apple", "Zucchini"]);
        assert_eq!(labels(FacetOrder::Count), vec!["Zucchini", "Apple", "Mango"]);
    }

    #[test]
    fn shown_values_truncates_to_min_size() {
        let values: Vec<FacetValue> = (0..5)
            .map(|i| FacetValue {
                value: i.to_string(),
                count: 1,
                visible: i != 1,
            })
            .collect();
        let (shown, more) = shown_values(&values, Some(2), false);
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[1].value, "2");
        assert_eq!(more, 2);

        let (shown, more) = shown_values(&values, Some(2), true);
        assert_eq!(shown.len(), 4);
        assert_eq!(more, 0);
    }
}
