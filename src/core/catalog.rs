//! Reference data shared by every panel: the attribute catalog and the
//! annotation registry. Both are loaded once at startup and never mutated.

use derive_deref::Deref;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Attribute name → legal discrete values, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeCatalog(BTreeMap<String, Vec<String>>);

impl AttributeCatalog {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self(entries)
    }

    /// Parse the static catalog resource
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Attribute names, sorted
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Legal values of `attribute`; empty for unknown attributes
    pub fn values(&self, attribute: &str) -> &[String] {
        self.0.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_legal(&self, attribute: &str, value: &str) -> bool {
        self.values(attribute).iter().any(|v| v == value)
    }
}

/// Ordered list of reference annotation datasets known to the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
pub struct AnnotationRegistry(Vec<String>);

impl AnnotationRegistry {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

/// Provenance of one annotation dataset, fetched on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Immutable application context handed to every component that needs
/// reference data
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    pub catalog: Arc<AttributeCatalog>,
    pub registry: Arc<AnnotationRegistry>,
}

impl AppContext {
    pub fn new(catalog: AttributeCatalog, registry: AnnotationRegistry) -> Self {
        Self {
            catalog: Arc::new(catalog),
            registry: Arc::new(registry),
        }
    }
}
