//! Diagnosis and medicine reference lists.

use tracing::info;

use super::suggest::suggest_with_limit;
use crate::models::{ReferenceItem, ReferenceKind};
use crate::queue::{QueueError, QueueResult};
use crate::store::DocumentStore;

/// Names from both reference lists, loaded once when the consultation
/// screen opens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceLists {
    pub diagnoses: Vec<String>,
    pub medicines: Vec<String>,
}

impl ReferenceLists {
    pub async fn load(store: &dyn DocumentStore) -> QueueResult<Self> {
        let diagnoses = names(store.list_reference(ReferenceKind::Diagnosis).await?);
        let medicines = names(store.list_reference(ReferenceKind::Medicine).await?);

        info!(
            diagnoses = diagnoses.len(),
            medicines = medicines.len(),
            "Loaded reference lists"
        );
        Ok(Self {
            diagnoses,
            medicines,
        })
    }

    pub fn names(&self, kind: ReferenceKind) -> &[String] {
        match kind {
            ReferenceKind::Diagnosis => &self.diagnoses,
            ReferenceKind::Medicine => &self.medicines,
        }
    }

    pub fn suggest(&self, kind: ReferenceKind, query: &str, limit: usize) -> Vec<String> {
        suggest_with_limit(query, self.names(kind), limit)
    }
}

fn names(items: Vec<ReferenceItem>) -> Vec<String> {
    items.into_iter().map(|item| item.name).collect()
}

/// Add a name to a reference list. Blank names are rejected.
pub async fn add_reference_item(
    store: &dyn DocumentStore,
    kind: ReferenceKind,
    name: &str,
) -> QueueResult<ReferenceItem> {
    let name = non_blank(name)?;
    let item = store.add_reference(kind, name).await?;
    info!(list = kind.collection(), id = %item.id, "Added reference item");
    Ok(item)
}

pub async fn rename_reference_item(
    store: &dyn DocumentStore,
    kind: ReferenceKind,
    id: &str,
    name: &str,
) -> QueueResult<()> {
    let name = non_blank(name)?;
    store.rename_reference(kind, id, name).await?;
    info!(list = kind.collection(), id, "Renamed reference item");
    Ok(())
}

pub async fn delete_reference_item(
    store: &dyn DocumentStore,
    kind: ReferenceKind,
    id: &str,
) -> QueueResult<()> {
    store.delete_reference(kind, id).await?;
    info!(list = kind.collection(), id, "Deleted reference item");
    Ok(())
}

fn non_blank(name: &str) -> QueueResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(QueueError::Validation("Name must not be empty".into()));
    }
    Ok(name)
}
