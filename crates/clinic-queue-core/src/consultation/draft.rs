//! Editable consultation draft.

use serde::{Deserialize, Serialize};

use crate::models::{ConsultationData, Diagnosis, MedicalCertificate, Medicine};

/// Whether a medical certificate is issued. `Unset` displays as "No".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum McChoice {
    #[default]
    Unset,
    Yes,
    No,
}

impl McChoice {
    pub fn is_issued(&self) -> bool {
        matches!(self, McChoice::Yes)
    }

    pub fn label(&self) -> &'static str {
        match self {
            McChoice::Yes => "Yes",
            McChoice::Unset | McChoice::No => "No",
        }
    }
}

/// Unsaved consultation for one queue entry.
///
/// Rows are addressed by index; out-of-range indexes are ignored and
/// reported with `false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationDraft {
    pub entry_id: String,
    pub diagnoses: Vec<Diagnosis>,
    pub medicines: Vec<Medicine>,
    pub notes: String,
    pub mc: McChoice,
    /// Only meaningful when `mc` is `Yes`
    pub mc_start: String,
    pub mc_end: String,
    /// Free text, stored as entered
    pub amount: String,
}

impl ConsultationDraft {
    /// Fresh draft with one empty diagnosis row and one empty medicine row.
    pub fn new(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            diagnoses: vec![Diagnosis::default()],
            medicines: vec![Medicine::default()],
            notes: String::new(),
            mc: McChoice::Unset,
            mc_start: String::new(),
            mc_end: String::new(),
            amount: String::new(),
        }
    }

    pub fn add_diagnosis(&mut self) {
        self.diagnoses.push(Diagnosis::default());
    }

    pub fn remove_diagnosis(&mut self, index: usize) -> bool {
        if index >= self.diagnoses.len() {
            return false;
        }
        self.diagnoses.remove(index);
        true
    }

    pub fn set_diagnosis(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.diagnoses.get_mut(index) {
            Some(row) => {
                row.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn add_medicine(&mut self) {
        self.medicines.push(Medicine::default());
    }

    pub fn remove_medicine(&mut self, index: usize) -> bool {
        if index >= self.medicines.len() {
            return false;
        }
        self.medicines.remove(index);
        true
    }

    pub fn set_medicine_name(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.medicines.get_mut(index) {
            Some(row) => {
                row.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn set_medicine_dosage(&mut self, index: usize, dosage: impl Into<String>) -> bool {
        match self.medicines.get_mut(index) {
            Some(row) => {
                row.dosage = dosage.into();
                true
            }
            None => false,
        }
    }

    /// The record written on save.
    ///
    /// Diagnosis rows without a name and medicine rows with neither name nor
    /// dosage are dropped. MC dates are kept only when an MC is issued.
    pub fn to_consultation_data(&self) -> ConsultationData {
        let diagnoses = self
            .diagnoses
            .iter()
            .filter(|d| !d.name.trim().is_empty())
            .cloned()
            .collect();
        let medicines = self
            .medicines
            .iter()
            .filter(|m| !m.name.trim().is_empty() || !m.dosage.trim().is_empty())
            .cloned()
            .collect();
        let mc = self.mc.is_issued().then(|| MedicalCertificate {
            start: self.mc_start.clone(),
            end: self.mc_end.clone(),
        });

        ConsultationData {
            diagnoses,
            medicines,
            notes: self.notes.clone(),
            mc,
            amount: self.amount.clone(),
        }
    }
}
