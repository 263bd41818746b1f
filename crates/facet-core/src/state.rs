//! Selection state.
//!
//! [`QueryState`] is the single mutable unit of a search session: active
//! filter selections, range selections, free text, sort and paging. Every
//! operation that changes the filter set resets the page to the start, since
//! the old offset no longer points at the same records.

use std::{collections::BTreeSet, fmt};

use facet_query::Logic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value reserved for "records with no value for this key".
pub const UNDEFINED: &str = "undefined";

/// The value side of a filter selection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionValue {
    /// An exact term.
    Term(String),
    /// No value at all.
    Undefined,
}

impl SelectionValue {
    /// Returns the value as it appears in facet counts.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Term(term) => term,
            Self::Undefined => UNDEFINED,
        }
    }
}

impl From<String> for SelectionValue {
    fn from(value: String) -> Self {
        if value == UNDEFINED {
            Self::Undefined
        } else {
            Self::Term(value)
        }
    }
}

impl From<&str> for SelectionValue {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<SelectionValue> for String {
    fn from(value: SelectionValue) -> Self {
        match value {
            SelectionValue::Term(term) => term,
            SelectionValue::Undefined => UNDEFINED.to_string(),
        }
    }
}

impl fmt::Display for SelectionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One active filter constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Dotted field path.
    pub key: String,
    /// Selected value.
    pub value: SelectionValue,
    /// How this selection combines with others on the same key.
    pub logic: Logic,
}

/// An inclusive range constraint on one facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    /// Position of the facet in the configuration.
    pub facet: usize,
    /// Lower bound.
    pub low: String,
    /// Upper bound.
    pub high: String,
}

/// Offset and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Offset of the first record.
    pub from: u64,
    /// Records per page.
    pub size: u64,
}

impl Default for Paging {
    fn default() -> Self {
        Self { from: 0, size: 10 }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Returns the backend spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field to sort on.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort key.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Serializes as `{"field": {"order": "asc"}}`.
    pub fn to_value(&self) -> Value {
        let mut order = Map::new();
        order.insert("order".into(), Value::from(self.direction.as_str()));
        let mut spec = Map::new();
        spec.insert(self.field.clone(), Value::Object(order));
        Value::Object(spec)
    }

    /// Reads a sort key from `"field"`, `{"field": "desc"}` or
    /// `{"field": {"order": "desc"}}`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(field) => Some(Self::new(field.clone(), SortDirection::Asc)),
            Value::Object(obj) if obj.len() == 1 => {
                let (field, spec) = obj.iter().next()?;
                let order = match spec {
                    Value::String(order) => order.as_str(),
                    Value::Object(inner) => inner.get("order").and_then(Value::as_str)?,
                    _ => return None,
                };
                let direction = match order.to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => return None,
                };
                Some(Self::new(field.clone(), direction))
            }
            _ => None,
        }
    }
}

/// The complete selection state of one search view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Free-text query, before fuzzification.
    pub free_text: String,
    /// Field the free text is restricted to.
    pub search_field: Option<String>,
    /// Sort keys, in priority order.
    pub sort: Vec<SortSpec>,
    /// Current page.
    pub paging: Paging,
    /// Active filter selections, in the order they were made.
    pub selections: Vec<FilterSelection>,
    /// Active range selections.
    pub ranges: Vec<RangeSelection>,
}

impl QueryState {
    /// Creates an empty state starting at the given page.
    pub fn new(paging: Paging) -> Self {
        Self {
            paging,
            ..Self::default()
        }
    }

    /// Returns the AND/OR mode of `key`, or `None` when it has no selections.
    pub fn key_logic(&self, key: &str) -> Option<Logic> {
        self.selections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.logic)
    }

    /// Iterates over the selections on `key`.
    pub fn selections_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FilterSelection> {
        self.selections.iter().filter(move |s| s.key == key)
    }

    /// True when `(key, value)` is selected.
    pub fn is_selected(&self, key: &str, value: &SelectionValue) -> bool {
        self.selections
            .iter()
            .any(|s| s.key == key && &s.value == value)
    }

    /// Adds a selection.
    ///
    /// When `key` already has selections in the other mode, the whole key
    /// switches to `logic`. Adding a pair that is already present changes
    /// nothing else. Returns whether the state changed.
    pub fn add_selection(&mut self, key: &str, value: SelectionValue, logic: Logic) -> bool {
        let mut changed = false;
        if self.key_logic(key).is_some_and(|current| current != logic) {
            for selection in self.selections.iter_mut().filter(|s| s.key == key) {
                selection.logic = logic;
            }
            changed = true;
        }
        if !self.is_selected(key, &value) {
            self.selections.push(FilterSelection {
                key: key.to_string(),
                value,
                logic,
            });
            changed = true;
        }
        if changed {
            self.paging.from = 0;
        }
        changed
    }

    /// Removes one selection. Returns whether it was present.
    pub fn remove_selection(&mut self, key: &str, value: &SelectionValue) -> bool {
        let Some(index) = self
            .selections
            .iter()
            .position(|s| s.key == key && &s.value == value)
        else {
            return false;
        };
        self.selections.remove(index);
        self.paging.from = 0;
        true
    }

    /// Flips AND/OR for every selection on `key`. Returns whether any existed.
    pub fn toggle_key_logic(&mut self, key: &str) -> bool {
        let Some(current) = self.key_logic(key) else {
            return false;
        };
        let flipped = current.flipped();
        for selection in self.selections.iter_mut().filter(|s| s.key == key) {
            selection.logic = flipped;
        }
        self.paging.from = 0;
        true
    }

    /// Sets the range on a facet, replacing any earlier range on it.
    pub fn set_range(&mut self, facet: usize, low: impl Into<String>, high: impl Into<String>) {
        let range = RangeSelection {
            facet,
            low: low.into(),
            high: high.into(),
        };
        match self.ranges.iter_mut().find(|r| r.facet == facet) {
            Some(existing) => *existing = range,
            None => self.ranges.push(range),
        }
        self.paging.from = 0;
    }

    /// Removes the range on a facet. Returns whether one existed.
    pub fn clear_range(&mut self, facet: usize) -> bool {
        let before = self.ranges.len();
        self.ranges.retain(|r| r.facet != facet);
        let changed = self.ranges.len() != before;
        if changed {
            self.paging.from = 0;
        }
        changed
    }

    /// Sets the free text. Returns whether it changed.
    pub fn set_free_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.free_text == text {
            return false;
        }
        self.free_text = text;
        self.paging.from = 0;
        true
    }

    /// Restricts free text to one field, or lifts the restriction.
    pub fn set_search_field(&mut self, field: Option<String>) -> bool {
        let field = field.filter(|f| !f.is_empty());
        if self.search_field == field {
            return false;
        }
        self.search_field = field;
        self.paging.from = 0;
        true
    }

    /// Replaces the sort keys.
    pub fn set_sort(&mut self, sort: Vec<SortSpec>) -> bool {
        if self.sort == sort {
            return false;
        }
        self.sort = sort;
        self.paging.from = 0;
        true
    }

    /// Moves to the given offset.
    pub fn set_page(&mut self, from: u64) -> bool {
        let changed = self.paging.from != from;
        self.paging.from = from;
        changed
    }

    /// Changes the page size and returns to the first page.
    pub fn set_page_size(&mut self, size: u64) -> bool {
        let changed = self.paging.size != size || self.paging.from != 0;
        self.paging.size = size;
        self.paging.from = 0;
        changed
    }

    /// Empties selections, ranges and free text, and returns to the first page.
    pub fn clear(&mut self) {
        self.selections.clear();
        self.ranges.clear();
        self.free_text.clear();
        self.paging.from = 0;
    }

    /// True when nothing restricts the search.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty() && self.ranges.is_empty() && self.free_text.is_empty()
    }

    /// Returns the selections and ranges as a comparable set.
    ///
    /// Two states with equal signatures select the same records, regardless of
    /// the order selections were made in.
    pub fn selection_signature(&self) -> BTreeSet<String> {
        let mut signature: BTreeSet<String> = self
            .selections
            .iter()
            .map(|s| format!("{}={}:{}", s.key, s.value, s.logic))
            .collect();
        signature.extend(
            self.ranges
                .iter()
                .map(|r| format!("#{}={}..{}", r.facet, r.low, r.high)),
        );
        signature
    }
}
