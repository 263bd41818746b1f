//! Hierarchies over facet values.
//!
//! A hierarchy groups the flat values of one facet into a tree of labelled
//! branches. Only leaves correspond to real values; branches are display-only
//! groupings whose counts are rolled up from their descendants.

use std::collections::HashSet;

use serde::Serialize;
use toml::{Table, Value as TomlValue};

use crate::ConfigError;

/// A node in a facet value hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    /// Label; for leaves this is the facet value itself.
    pub label: String,
    /// Child nodes. Empty for leaves.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl HierarchyNode {
    /// Creates a leaf.
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Creates a branch over `children`.
    pub fn branch(label: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    /// True when the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the labels of every leaf at or below this node, depth first.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    /// Appends descendant leaf labels to `out`.
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.is_leaf() {
            out.push(&self.label);
            return;
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }
}

/// Finds the node reached by following `path` labels from the top level.
pub fn find_node<'a>(nodes: &'a [HierarchyNode], path: &[&str]) -> Option<&'a HierarchyNode> {
    let (first, rest) = path.split_first()?;
    let node = nodes.iter().find(|n| n.label == *first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        find_node(&node.children, rest)
    }
}

/// Parses a `[hierarchy.<facet>]` table.
///
/// Keys are node labels. A value that is an empty table or empty array marks a
/// leaf; a non-empty table is a branch over its entries; an array is a branch
/// whose strings are leaves and whose tables contribute their entries; a
/// string is a branch with that single leaf.
pub(crate) fn parse_hierarchy(
    facet: &str,
    table: &Table,
) -> Result<Vec<HierarchyNode>, ConfigError> {
    let nodes = parse_table(facet, table)?;
    check_unique_leaves(facet, &nodes)?;
    Ok(nodes)
}

/// Parses every entry of a table into nodes, preserving key order.
fn parse_table(facet: &str, table: &Table) -> Result<Vec<HierarchyNode>, ConfigError> {
    table
        .iter()
        .map(|(label, value)| parse_entry(facet, label, value))
        .collect()
}

/// Parses one `label = value` entry.
fn parse_entry(facet: &str, label: &str, value: &TomlValue) -> Result<HierarchyNode, ConfigError> {
    let children = match value {
        TomlValue::Table(table) => parse_table(facet, table)?,
        TomlValue::Array(items) => parse_array(facet, items)?,
        TomlValue::String(leaf) => vec![HierarchyNode::leaf(leaf.clone())],
        other => {
            return Err(ConfigError::InvalidHierarchy {
                facet: facet.to_string(),
                message: format!("'{label}' has a {} value", other.type_str()),
            });
        }
    };
    Ok(HierarchyNode::branch(label, children))
}

/// Parses an array of leaf strings and nested tables.
fn parse_array(facet: &str, items: &[TomlValue]) -> Result<Vec<HierarchyNode>, ConfigError> {
    let mut nodes = Vec::new();
    for item in items {
        match item {
            TomlValue::String(leaf) => nodes.push(HierarchyNode::leaf(leaf.clone())),
            TomlValue::Table(table) => nodes.extend(parse_table(facet, table)?),
            other => {
                return Err(ConfigError::InvalidHierarchy {
                    facet: facet.to_string(),
                    message: format!("array element is a {}", other.type_str()),
                });
            }
        }
    }
    Ok(nodes)
}

/// Rejects hierarchies where a leaf value appears twice.
fn check_unique_leaves(facet: &str, nodes: &[HierarchyNode]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for node in nodes {
        for leaf in node.leaves() {
            if !seen.insert(leaf) {
                return Err(ConfigError::DuplicateHierarchyLeaf {
                    facet: facet.to_string(),
                    label: leaf.to_string(),
                });
            }
        }
    }
    Ok(())
}
