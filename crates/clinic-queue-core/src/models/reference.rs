//! Diagnosis and medicine reference lists.

use serde::{Deserialize, Serialize};

/// Which reference list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Diagnosis,
    Medicine,
}

impl ReferenceKind {
    /// Collection (table) holding this list.
    pub fn collection(&self) -> &'static str {
        match self {
            ReferenceKind::Diagnosis => "diagnoses",
            ReferenceKind::Medicine => "medicines",
        }
    }
}

/// A single reference-list entry. Names are free text; duplicates are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceItem {
    pub id: String,
    pub name: String,
}

impl ReferenceItem {
    pub fn new(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
        }
    }
}
