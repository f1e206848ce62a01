//! Panel: one operand set of a query, the single source of truth for what
//! the panel view draws.

use crate::core::catalog::AppContext;
use crate::core::error::ModelError;
use crate::core::rows::{FilterRow, RowGroup, SelectionRow, SyncOutcome};
use crate::core::types::{PanelRole, ReductionOp, Relation};
use tracing::debug;

/// What an edit means for the rest of the view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelChange {
    /// The selection changed, so the live count must be refreshed
    pub refresh_count: bool,
    /// Row-group synchronization outcome, if a discriminant changed
    pub sync: Option<SyncOutcome>,
}

impl PanelChange {
    fn selection(sync: Option<SyncOutcome>) -> Self {
        Self { refresh_count: true, sync }
    }

    fn filters(sync: Option<SyncOutcome>) -> Self {
        Self { refresh_count: false, sync }
    }
}

/// Backend-computed number of datasets matching the panel's selection
///
/// Every refresh gets a new generation; only the response for the latest
/// generation is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveCount {
    value: Option<u64>,
    issued: u64,
    applied: u64,
}

impl LiveCount {
    pub fn value(&self) -> Option<u64> {
        self.value
    }

    /// A request newer than the displayed value is in flight
    pub fn is_pending(&self) -> bool {
        self.issued > self.applied
    }

    pub fn latest_generation(&self) -> u64 {
        self.issued
    }

    fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn apply(&mut self, generation: u64, count: u64) -> bool {
        if generation != self.issued {
            return false;
        }
        self.value = Some(count);
        self.applied = generation;
        true
    }

    fn abandon(&mut self, generation: u64) {
        if generation == self.issued {
            self.applied = generation;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Panel {
    role: PanelRole,
    ctx: AppContext,
    selection: RowGroup<SelectionRow>,
    filters: RowGroup<FilterRow>,
    reduction: ReductionOp,
    count: LiveCount,
}

impl Panel {
    pub fn new(role: PanelRole, ctx: AppContext) -> Self {
        let blank_filter = FilterRow {
            reference: ctx.registry.first().map(str::to_string),
            ..FilterRow::default()
        };
        Self {
            role,
            selection: RowGroup::new(SelectionRow::default()),
            filters: RowGroup::new(blank_filter),
            reduction: role.reduction_options()[0],
            count: LiveCount::default(),
            ctx,
        }
    }

    pub fn role(&self) -> PanelRole {
        self.role
    }

    pub fn letter(&self) -> &'static str {
        self.role.letter()
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn selection_rows(&self) -> &[SelectionRow] {
        self.selection.rows()
    }

    pub fn filter_rows(&self) -> &[FilterRow] {
        self.filters.rows()
    }

    pub fn selection_group(&self) -> &RowGroup<SelectionRow> {
        &self.selection
    }

    pub fn filter_group(&self) -> &RowGroup<FilterRow> {
        &self.filters
    }

    pub fn reduction(&self) -> ReductionOp {
        self.reduction
    }

    pub fn live_count(&self) -> &LiveCount {
        &self.count
    }

    // --- selection rows ---------------------------------------------------

    /// Assign (or clear, with `None`) the attribute of a selection row.
    ///
    /// Any previous value selection is discarded.
    pub fn set_attribute(&mut self, index: usize, attribute: Option<&str>) -> Result<PanelChange, ModelError> {
        if let Some(name) = attribute {
            if !self.ctx.catalog.contains_key(name) {
                return Err(ModelError::UnknownAttribute(name.to_string()));
            }
        }
        let len = self.selection.len();
        let row = self
            .selection
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, len })?;
        row.attribute = attribute.map(str::to_string);
        row.selected.clear();
        let sync = self.selection.on_row_field_changed(index);
        debug!(panel = %self.role, index, ?attribute, ?sync, "selection row changed");
        Ok(PanelChange::selection(Some(sync)))
    }

    /// Step the attribute of a row through the catalog; the unset choice sits
    /// after the last attribute.
    pub fn cycle_attribute(&mut self, index: usize, forward: bool) -> Result<PanelChange, ModelError> {
        let current = self
            .selection
            .get(index)
            .ok_or(ModelError::RowOutOfRange { index, len: self.selection.len() })?
            .attribute
            .clone();
        let next = {
            let names: Vec<&str> = self.ctx.catalog.attributes().collect();
            let slots = names.len() + 1;
            let pos = current
                .as_deref()
                .and_then(|a| names.iter().position(|n| *n == a))
                .unwrap_or(names.len());
            let next_pos = if forward { (pos + 1) % slots } else { (pos + slots - 1) % slots };
            names.get(next_pos).map(|s| s.to_string())
        };
        self.set_attribute(index, next.as_deref())
    }

    /// Select or deselect one value of a row's attribute
    pub fn toggle_value(&mut self, index: usize, value: &str) -> Result<PanelChange, ModelError> {
        let len = self.selection.len();
        let row = self
            .selection
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, len })?;
        let attribute = row.attribute.clone().ok_or(ModelError::NoAttribute(index))?;
        if !self.ctx.catalog.is_legal(&attribute, value) {
            return Err(ModelError::IllegalValue { attribute, value: value.to_string() });
        }
        if !row.selected.remove(value) {
            row.selected.insert(value.to_string());
        }
        Ok(PanelChange::selection(None))
    }

    /// Replace a row's value selection
    pub fn set_values<I, S>(&mut self, index: usize, values: I) -> Result<PanelChange, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let len = self.selection.len();
        let row = self
            .selection
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, len })?;
        let attribute = row.attribute.clone().ok_or(ModelError::NoAttribute(index))?;
        let mut selected = std::collections::BTreeSet::new();
        for value in values {
            let value = value.as_ref();
            if !self.ctx.catalog.is_legal(&attribute, value) {
                return Err(ModelError::IllegalValue { attribute, value: value.to_string() });
            }
            selected.insert(value.to_string());
        }
        row.selected = selected;
        Ok(PanelChange::selection(None))
    }

    // --- filter rows ------------------------------------------------------

    pub fn set_relation(&mut self, index: usize, relation: Relation) -> Result<PanelChange, ModelError> {
        let len = self.filters.len();
        let row = self
            .filters
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, len })?;
        if relation.is_set() && row.reference.is_none() {
            return Err(ModelError::NoReference(index));
        }
        row.relation = relation;
        let sync = self.filters.on_row_field_changed(index);
        debug!(panel = %self.role, index, ?relation, ?sync, "filter row changed");
        Ok(PanelChange::filters(Some(sync)))
    }

    pub fn cycle_relation(&mut self, index: usize, forward: bool) -> Result<PanelChange, ModelError> {
        let current = self
            .filters
            .get(index)
            .ok_or(ModelError::RowOutOfRange { index, len: self.filters.len() })?
            .relation;
        self.set_relation(index, if forward { current.next() } else { current.prev() })
    }

    pub fn set_distance(&mut self, index: usize, distance: Option<String>) -> Result<PanelChange, ModelError> {
        let len = self.filters.len();
        let row = self
            .filters
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, len })?;
        row.distance = distance;
        Ok(PanelChange::filters(None))
    }

    pub fn set_reference(&mut self, index: usize, reference: &str) -> Result<PanelChange, ModelError> {
        if !self.ctx.registry.contains(reference) {
            return Err(ModelError::UnknownAnnotation(reference.to_string()));
        }
        let len = self.filters.len();
        let row = self
            .filters
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, len })?;
        row.reference = Some(reference.to_string());
        Ok(PanelChange::filters(None))
    }

    pub fn cycle_reference(&mut self, index: usize, forward: bool) -> Result<PanelChange, ModelError> {
        let registry = self.ctx.registry.clone();
        if registry.is_empty() {
            return Ok(PanelChange::default());
        }
        let current = self
            .filters
            .get(index)
            .ok_or(ModelError::RowOutOfRange { index, len: self.filters.len() })?
            .reference
            .clone();
        let pos = current
            .as_deref()
            .and_then(|r| registry.iter().position(|n| n == r));
        let next = match pos {
            Some(p) if forward => (p + 1) % registry.len(),
            Some(p) => (p + registry.len() - 1) % registry.len(),
            None => 0,
        };
        self.set_reference(index, &registry[next])
    }

    // --- reduction --------------------------------------------------------

    pub fn set_reduction(&mut self, op: ReductionOp) -> Result<(), ModelError> {
        if !self.role.reduction_options().contains(&op) {
            return Err(ModelError::ReductionNotOffered { op: op.label().to_string() });
        }
        self.reduction = op;
        Ok(())
    }

    pub fn cycle_reduction(&mut self, forward: bool) {
        self.reduction = self.reduction.cycle(self.role.reduction_options(), forward);
    }

    // --- live count -------------------------------------------------------

    /// Start a count refresh, returning its generation
    pub fn begin_count_request(&mut self) -> u64 {
        self.count.begin()
    }

    /// Apply a count response; stale generations are ignored
    pub fn apply_count(&mut self, generation: u64, count: u64) -> bool {
        let applied = self.count.apply(generation, count);
        if !applied {
            debug!(
                panel = %self.role,
                generation,
                latest = self.count.latest_generation(),
                "discarding stale count response"
            );
        }
        applied
    }

    /// The latest count request failed; keep showing the previous value
    pub fn abandon_count(&mut self, generation: u64) {
        self.count.abandon(generation);
    }
}
