//! Flattening panels into backend query strings.
//!
//! Requests are kept as ordered `(key, value)` pairs. `Display` gives the raw
//! `key=value&key=value` text the backend documents; `to_url` percent-encodes
//! the same pairs onto the endpoint.

use crate::core::error::QueryError;
use crate::core::panel::Panel;
use crate::core::types::ReductionOp;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// How a selection row with an attribute but no chosen value is serialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySelectionPolicy {
    /// The row contributes nothing; the attribute is left unconstrained
    #[default]
    Ignore,
    /// Expand to every legal value of the attribute
    AllValues,
    /// Refuse to build the query
    Reject,
}

/// Ordered query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString(Vec<(String, String)>);

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn extend(&mut self, other: QueryString) {
        self.0.extend(other.0);
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All values for `key`, in order
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The endpoint with these pairs appended, percent-encoded
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if !self.0.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &self.0 {
                pairs.append_pair(k, v);
            }
        }
        url
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

/// Selection clauses of a panel: `{letter}_{attribute}={value}` per chosen value
pub fn selection_pairs(panel: &Panel, policy: EmptySelectionPolicy) -> Result<QueryString, QueryError> {
    let catalog = &panel.context().catalog;
    let mut query = QueryString::new();
    for row in panel.selection_rows() {
        let Some(attribute) = row.attribute.as_deref() else {
            continue;
        };
        let key = format!("{}_{}", panel.letter(), attribute);
        if row.selected.is_empty() {
            match policy {
                EmptySelectionPolicy::Ignore => {}
                EmptySelectionPolicy::AllValues => {
                    for value in catalog.values(attribute) {
                        query.push(key.clone(), value.clone());
                    }
                }
                EmptySelectionPolicy::Reject => {
                    return Err(QueryError::EmptySelection { attribute: attribute.to_string() });
                }
            }
            continue;
        }
        // Catalog order, so the output does not depend on selection order
        for value in catalog.values(attribute) {
            if row.selected.contains(value) {
                query.push(key.clone(), value.clone());
            }
        }
    }
    Ok(query)
}

pub fn serialize_selection(panel: &Panel, policy: EmptySelectionPolicy) -> Result<String, QueryError> {
    selection_pairs(panel, policy).map(|q| q.to_string())
}

/// Reduction expression of a panel: its filter clauses in row order followed
/// by the reduction opcode
pub fn serialize_filters(panel: &Panel) -> String {
    let mut clauses: Vec<String> = Vec::new();
    for row in panel.filter_rows() {
        let Some(relation) = row.relation.as_wire() else {
            continue;
        };
        let mut words = vec![relation];
        if let Some(distance) = row.effective_distance() {
            words.push("extend");
            words.push(distance);
        }
        if let Some(reference) = row.reference.as_deref() {
            words.push(reference);
        }
        clauses.push(words.join(" "));
    }
    clauses.push(panel.reduction().opcode().to_string());
    clauses.join(" ")
}

/// Builds the request for every backend call the client makes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    pub policy: EmptySelectionPolicy,
    /// Addresses the backend notifies when a launched job finishes
    pub notify_emails: Vec<String>,
}

impl QueryBuilder {
    pub fn new(policy: EmptySelectionPolicy) -> Self {
        Self { policy, notify_emails: Vec::new() }
    }

    pub fn with_emails(mut self, emails: Vec<String>) -> Self {
        self.notify_emails = emails;
        self
    }

    fn push_emails(&self, query: &mut QueryString) {
        for email in self.notify_emails.iter().filter(|e| !e.trim().is_empty()) {
            query.push("email", email.trim());
        }
    }

    pub fn annotations(&self) -> QueryString {
        QueryString::new().with("annotations", "1")
    }

    pub fn provenance(&self, dataset: &str) -> QueryString {
        QueryString::new().with("provenance", dataset)
    }

    pub fn count(&self, panel: &Panel) -> Result<QueryString, QueryError> {
        let mut query = QueryString::new().with("count", "true");
        query.extend(selection_pairs(panel, self.policy)?);
        Ok(query)
    }

    pub fn summary(&self, panel: &Panel) -> Result<QueryString, QueryError> {
        let mut query = selection_pairs(panel, self.policy)?;
        query.push("wa", serialize_filters(panel));
        self.push_emails(&mut query);
        Ok(query)
    }

    pub fn comparison(&self, a: &Panel, b: &Panel, combinator: ReductionOp) -> Result<QueryString, QueryError> {
        let mut query = selection_pairs(a, self.policy)?;
        query.extend(selection_pairs(b, self.policy)?);
        query.push("wa", serialize_filters(a));
        query.push("wb", serialize_filters(b));
        query.push("w", combinator.opcode());
        self.push_emails(&mut query);
        Ok(query)
    }

    pub fn annotation(&self, panel: &Panel, annotations: &[String], combinator: ReductionOp) -> Result<QueryString, QueryError> {
        let mut query = selection_pairs(panel, self.policy)?;
        for name in annotations {
            query.push("B_annot_name", name.as_str());
        }
        query.push("wa", serialize_filters(panel));
        query.push("w", combinator.opcode());
        self.push_emails(&mut query);
        Ok(query)
    }

    pub fn upload(&self, url: &str, description: &str) -> Result<QueryString, QueryError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(QueryError::MissingUploadUrl);
        }
        Ok(QueryString::new()
            .with("uploadUrl", url)
            .with("description", description.trim()))
    }

    pub fn result(&self, job_id: &str) -> Result<QueryString, QueryError> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(QueryError::MissingJobId);
        }
        Ok(QueryString::new().with("result", job_id))
    }
}
