//! Selection and filter rows, and the row group that keeps exactly one
//! trailing blank row available for editing.

use crate::core::types::Relation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A row whose primary field decides whether it is "filled in"
pub trait GroupRow: Clone {
    /// True when the discriminant field (attribute, relation) is set
    fn is_set(&self) -> bool;
}

/// One attribute constraint: `attribute is one of selected`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRow {
    pub attribute: Option<String>,
    pub selected: BTreeSet<String>,
}

impl SelectionRow {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            selected: BTreeSet::new(),
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = values.into_iter().map(Into::into).collect();
        self
    }
}

impl GroupRow for SelectionRow {
    fn is_set(&self) -> bool {
        self.attribute.is_some()
    }
}

/// One spatial filter: `relation [distance bp from] reference`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRow {
    pub relation: Relation,
    /// Free text, handed to the backend unvalidated
    pub distance: Option<String>,
    pub reference: Option<String>,
}

impl FilterRow {
    pub fn new(relation: Relation, reference: impl Into<String>) -> Self {
        Self {
            relation,
            distance: None,
            reference: Some(reference.into()),
        }
    }

    pub fn with_distance(mut self, distance: impl Into<String>) -> Self {
        self.distance = Some(distance.into());
        self
    }

    /// Distance with surrounding whitespace removed; `None` when blank
    pub fn effective_distance(&self) -> Option<&str> {
        self.distance
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

impl GroupRow for FilterRow {
    fn is_set(&self) -> bool {
        self.relation.is_set()
    }
}

/// What a synchronization pass did to the group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub removed: bool,
    pub appended: bool,
}

/// Ordered rows with one trailing blank row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup<R: GroupRow> {
    rows: Vec<R>,
    blank: R,
}

impl<R: GroupRow> RowGroup<R> {
    /// New group holding a single blank row cloned from `blank`
    pub fn new(blank: R) -> Self {
        Self {
            rows: vec![blank.clone()],
            blank,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.rows.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut R> {
        self.rows.get_mut(index)
    }

    /// Rows whose discriminant is set, in order
    pub fn filled(&self) -> impl Iterator<Item = &R> {
        self.rows.iter().filter(|r| r.is_set())
    }

    /// Re-establish the trailing-blank invariant after the discriminant of
    /// `index` changed.
    ///
    /// A row that became unset is dropped unless it is the only row. If every
    /// remaining row is set, a blank row is appended.
    pub fn on_row_field_changed(&mut self, index: usize) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        if let Some(row) = self.rows.get(index) {
            if !row.is_set() && self.rows.len() > 1 {
                self.rows.remove(index);
                outcome.removed = true;
            }
        }
        if self.rows.iter().all(GroupRow::is_set) {
            self.rows.push(self.blank.clone());
            outcome.appended = true;
        }
        outcome
    }

    /// Exactly one unset row, and it is the last one
    pub fn invariant_holds(&self) -> bool {
        match self.rows.split_last() {
            Some((last, rest)) => !last.is_set() && rest.iter().all(GroupRow::is_set),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(group: &RowGroup<SelectionRow>) -> Vec<Option<&str>> {
        group.rows().iter().map(|r| r.attribute.as_deref()).collect()
    }

    fn set(group: &mut RowGroup<SelectionRow>, index: usize, attribute: Option<&str>) {
        group.get_mut(index).unwrap().attribute = attribute.map(str::to_string);
        group.on_row_field_changed(index);
    }

    #[test]
    fn test_new_group_has_one_blank_row() {
        let group = RowGroup::new(SelectionRow::default());
        assert_eq!(group.len(), 1);
        assert!(group.invariant_holds());
    }

    #[test]
    fn test_filling_trailing_row_appends_blank() {
        let mut group = RowGroup::new(SelectionRow::default());
        group.get_mut(0).unwrap().attribute = Some("chrom".into());
        let outcome = group.on_row_field_changed(0);
        assert_eq!(outcome, SyncOutcome { removed: false, appended: true });
        assert_eq!(attrs(&group), vec![Some("chrom"), None]);
        assert!(group.invariant_holds());
    }

    #[test]
    fn test_clearing_middle_row_closes_gap() {
        let mut group = RowGroup::new(SelectionRow::default());
        set(&mut group, 0, Some("a"));
        set(&mut group, 1, Some("b"));
        set(&mut group, 2, Some("c"));
        assert_eq!(attrs(&group), vec![Some("a"), Some("b"), Some("c"), None]);

        set(&mut group, 1, None);
        assert_eq!(attrs(&group), vec![Some("a"), Some("c"), None]);
        assert!(group.invariant_holds());
    }

    #[test]
    fn test_clearing_trailing_blank_is_stable() {
        let mut group = RowGroup::new(SelectionRow::default());
        set(&mut group, 0, Some("a"));
        set(&mut group, 1, None);
        assert_eq!(attrs(&group), vec![Some("a"), None]);
    }

    #[test]
    fn test_changing_set_row_keeps_it() {
        let mut group = RowGroup::new(SelectionRow::default());
        set(&mut group, 0, Some("a"));
        let outcome = {
            group.get_mut(0).unwrap().attribute = Some("b".into());
            group.on_row_field_changed(0)
        };
        assert_eq!(outcome, SyncOutcome::default());
        assert_eq!(attrs(&group), vec![Some("b"), None]);
    }

    #[test]
    fn test_filter_rows_keyed_on_relation() {
        let mut group = RowGroup::new(FilterRow::default());
        group.get_mut(0).unwrap().relation = Relation::Within;
        group.on_row_field_changed(0);
        assert_eq!(group.len(), 2);
        group.get_mut(0).unwrap().relation = Relation::NoFilter;
        group.on_row_field_changed(0);
        assert_eq!(group.len(), 1);
        assert!(group.invariant_holds());
    }

    #[test]
    fn test_effective_distance() {
        let row = FilterRow::new(Relation::Within, "genes");
        assert_eq!(row.effective_distance(), None);
        assert_eq!(row.clone().with_distance("  ").effective_distance(), None);
        assert_eq!(row.with_distance(" 500 ").effective_distance(), Some("500"));
    }
}
