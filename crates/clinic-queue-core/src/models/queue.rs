//! Queue entries and their status.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::consultation::ConsultationData;
use super::employee::PatientInfo;

/// Where a patient is in today's visit. Variants are ordered; an entry only
/// ever moves to a later variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueueStatus {
    /// Checked in, not yet seen
    #[serde(rename = "Waiting")]
    Waiting,
    /// With the doctor
    #[serde(rename = "In Consultation")]
    InConsultation,
    /// Visit finished
    #[serde(rename = "Completed")]
    Completed,
}

impl QueueStatus {
    /// Stored label.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "Waiting",
            QueueStatus::InConsultation => "In Consultation",
            QueueStatus::Completed => "Completed",
        }
    }

    /// Parse a stored label, case-insensitively.
    ///
    /// `"Being Attended"` is an older label for a patient with the doctor.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "waiting" => Some(QueueStatus::Waiting),
            "in consultation" | "being attended" => Some(QueueStatus::InConsultation),
            "completed" => Some(QueueStatus::Completed),
            _ => None,
        }
    }

    /// Whether moving to `next` goes forward.
    pub fn can_advance_to(&self, next: QueueStatus) -> bool {
        next > *self
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, QueueStatus::Completed)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A patient's visit record for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    /// Document ID assigned by the store
    pub id: String,
    /// Employee number of the patient
    pub employee_id: String,
    /// Display number, ordered by its integer value
    pub queue_number: String,
    /// Check-in instant
    pub timestamp: DateTime<Utc>,
    pub status: QueueStatus,
    /// Wall-clock arrival stamp (`HH:MM:SS`)
    pub time_in: Option<String>,
    /// Wall-clock departure stamp (`HH:MM:SS`)
    pub time_out: Option<String>,
    /// Set once, when the consultation is saved
    pub consultation: Option<ConsultationData>,
}

impl QueueEntry {
    /// Create a waiting entry, as the check-in kiosk does.
    pub fn new(employee_id: String, queue_number: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id,
            queue_number,
            timestamp,
            status: QueueStatus::Waiting,
            time_in: None,
            time_out: None,
            consultation: None,
        }
    }

    /// Integer value of the queue number.
    pub fn queue_value(&self) -> Option<u64> {
        queue_number_value(&self.queue_number)
    }

    /// Whether the entry was created on `date` (local calendar).
    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.timestamp.with_timezone(&Local).date_naive() == date
    }
}

/// Integer value of a queue number label (`"007"` is 7).
pub fn queue_number_value(label: &str) -> Option<u64> {
    label.trim().parse().ok()
}

/// Queue order: ascending numeric value, unparseable labels last.
pub fn compare_queue_numbers(a: &str, b: &str) -> Ordering {
    match (queue_number_value(a), queue_number_value(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Field-level changes to one queue entry, written in a single update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryUpdate {
    pub status: Option<QueueStatus>,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub consultation: Option<ConsultationData>,
}

impl EntryUpdate {
    pub fn status(status: QueueStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.time_in.is_none()
            && self.time_out.is_none()
            && self.consultation.is_none()
    }

    /// Apply to an in-memory copy. Only the fields present are touched.
    pub fn apply_to(&self, entry: &mut QueueEntry) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(time_in) = &self.time_in {
            entry.time_in = Some(time_in.clone());
        }
        if let Some(time_out) = &self.time_out {
            entry.time_out = Some(time_out.clone());
        }
        if let Some(consultation) = &self.consultation {
            entry.consultation = Some(consultation.clone());
        }
    }
}

/// A queue entry joined with its patient details; one row of today's list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedPatient {
    pub entry: QueueEntry,
    pub patient: PatientInfo,
}

impl QueuedPatient {
    pub fn id(&self) -> &str {
        &self.entry.id
    }

    pub fn status(&self) -> QueueStatus {
        self.entry.status
    }

    pub fn queue_number(&self) -> &str {
        &self.entry.queue_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_order_is_forward() {
        assert!(QueueStatus::Waiting.can_advance_to(QueueStatus::InConsultation));
        assert!(QueueStatus::Waiting.can_advance_to(QueueStatus::Completed));
        assert!(QueueStatus::InConsultation.can_advance_to(QueueStatus::Completed));
        assert!(!QueueStatus::Completed.can_advance_to(QueueStatus::Waiting));
        assert!(!QueueStatus::InConsultation.can_advance_to(QueueStatus::InConsultation));
    }

    #[test]
    fn test_status_parse_labels() {
        assert_eq!(QueueStatus::parse("Waiting"), Some(QueueStatus::Waiting));
        assert_eq!(
            QueueStatus::parse("in consultation"),
            Some(QueueStatus::InConsultation)
        );
        assert_eq!(
            QueueStatus::parse("Being Attended"),
            Some(QueueStatus::InConsultation)
        );
        assert_eq!(QueueStatus::parse("COMPLETED"), Some(QueueStatus::Completed));
        assert_eq!(QueueStatus::parse("Cancelled"), None);
    }

    #[test]
    fn test_status_serde_labels() {
        let json = serde_json::to_string(&QueueStatus::InConsultation).unwrap();
        assert_eq!(json, "\"In Consultation\"");
        let status: QueueStatus = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(status, QueueStatus::Completed);
    }

    #[test]
    fn test_queue_number_ordering() {
        assert_eq!(queue_number_value("007"), Some(7));
        assert_eq!(compare_queue_numbers("9", "10"), Ordering::Less);
        assert_eq!(compare_queue_numbers("010", "9"), Ordering::Greater);
        assert_eq!(compare_queue_numbers("N/A", "1"), Ordering::Greater);
        assert_eq!(compare_queue_numbers("3", "003"), Ordering::Equal);
    }

    #[test]
    fn test_is_on_uses_local_calendar() {
        let local = Local.with_ymd_and_hms(2024, 6, 14, 9, 30, 0).unwrap();
        let entry = QueueEntry::new("E1".into(), "1".into(), local.with_timezone(&Utc));

        assert!(entry.is_on(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()));
        assert!(!entry.is_on(NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()));
    }

    #[test]
    fn test_entry_update_apply() {
        let mut entry = QueueEntry::new("E1".into(), "1".into(), Utc::now());
        let update = EntryUpdate {
            status: Some(QueueStatus::InConsultation),
            time_in: Some("09:00:00".into()),
            ..Default::default()
        };

        update.apply_to(&mut entry);
        assert_eq!(entry.status, QueueStatus::InConsultation);
        assert_eq!(entry.time_in.as_deref(), Some("09:00:00"));
        assert!(entry.time_out.is_none());

        assert!(EntryUpdate::default().is_empty());
        assert!(!update.is_empty());
    }
}
