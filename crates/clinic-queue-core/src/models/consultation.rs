//! Consultation records attached to completed queue entries.

use serde::{Deserialize, Serialize};

/// A diagnosis line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    pub name: String,
}

/// A prescribed medicine line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub name: String,
    /// Free-text dosage (e.g. "500mg 3x daily")
    pub dosage: String,
}

/// Medical certificate period, as entered (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicalCertificate {
    pub start: String,
    pub end: String,
}

/// The saved outcome of one consultation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsultationData {
    pub diagnoses: Vec<Diagnosis>,
    pub medicines: Vec<Medicine>,
    pub notes: String,
    /// Present only when an MC was issued
    pub mc: Option<MedicalCertificate>,
    /// Amount charged, kept exactly as typed
    pub amount: String,
}

impl ConsultationData {
    /// Amount as a number, when it is a valid non-negative value.
    ///
    /// The stored text is never rewritten; this is a read-side helper.
    pub fn amount_value(&self) -> Option<f64> {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
    }

    /// Whether a medical certificate was issued.
    pub fn has_mc(&self) -> bool {
        self.mc.is_some()
    }
}
