//! Dashboard statistics.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::queue::{QueueEntry, QueueStatus, QueuedPatient};

/// Summary figures shown above the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    /// Patients checked in today
    pub new_patients: u32,
    pub completed_appointments: u32,
    /// Patients still waiting
    pub pending_appointments: u32,
    /// Mean time between time-in and time-out, e.g. `"12 min"`
    pub avg_waiting_time: String,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            new_patients: 0,
            completed_appointments: 0,
            pending_appointments: 0,
            avg_waiting_time: format_minutes(0),
        }
    }
}

impl Stats {
    /// Recompute from today's list.
    pub fn from_patients(patients: &[QueuedPatient]) -> Self {
        let count = |status: QueueStatus| {
            patients.iter().filter(|p| p.status() == status).count() as u32
        };

        Self {
            new_patients: patients.len() as u32,
            completed_appointments: count(QueueStatus::Completed),
            pending_appointments: count(QueueStatus::Waiting),
            avg_waiting_time: average_waiting_time(patients.iter().map(|p| &p.entry)),
        }
    }
}

/// Average of `time_out - time_in`, rounded to whole minutes.
///
/// Entries missing either stamp, with unparseable stamps, or whose time-out
/// precedes the time-in are skipped. No qualifying entries gives `"0 min"`.
pub fn average_waiting_time<'a>(entries: impl IntoIterator<Item = &'a QueueEntry>) -> String {
    let minutes: Vec<f64> = entries
        .into_iter()
        .filter_map(|entry| {
            let time_in = parse_clock_time(entry.time_in.as_deref()?)?;
            let time_out = parse_clock_time(entry.time_out.as_deref()?)?;
            let seconds = (time_out - time_in).num_seconds();
            (seconds >= 0).then(|| seconds as f64 / 60.0)
        })
        .collect();

    if minutes.is_empty() {
        return format_minutes(0);
    }

    let average = minutes.iter().sum::<f64>() / minutes.len() as f64;
    format_minutes(average.round() as i64)
}

/// Parse a wall-clock stamp: `HH:MM:SS`, `HH:MM`, or the 12-hour
/// `h:MM:SS AM` form older records carry.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    ["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

fn format_minutes(minutes: i64) -> String {
    format!("{} min", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientInfo;
    use chrono::Utc;

    fn entry(time_in: Option<&str>, time_out: Option<&str>) -> QueueEntry {
        let mut entry = QueueEntry::new("E1".into(), "1".into(), Utc::now());
        entry.time_in = time_in.map(String::from);
        entry.time_out = time_out.map(String::from);
        entry
    }

    fn patient(status: QueueStatus) -> QueuedPatient {
        let mut entry = entry(None, None);
        entry.status = status;
        QueuedPatient {
            entry,
            patient: PatientInfo::unknown(),
        }
    }

    #[test]
    fn test_average_waiting_time() {
        let entries = vec![
            entry(Some("09:00:00"), Some("09:15:00")),
            entry(Some("10:00:00"), Some("10:05:00")),
            entry(Some("11:00:00"), None),
        ];
        assert_eq!(average_waiting_time(&entries), "10 min");
    }

    #[test]
    fn test_average_waiting_time_none_qualifying() {
        let entries = vec![entry(None, None), entry(Some("09:00:00"), None)];
        assert_eq!(average_waiting_time(&entries), "0 min");
        assert_eq!(average_waiting_time(&Vec::<QueueEntry>::new()), "0 min");
    }

    #[test]
    fn test_average_rounds_to_nearest_minute() {
        let entries = vec![
            entry(Some("09:00:00"), Some("09:10:00")),
            entry(Some("09:00:00"), Some("09:11:00")),
        ];
        // 10.5 rounds up
        assert_eq!(average_waiting_time(&entries), "11 min");
    }

    #[test]
    fn test_average_skips_bad_stamps() {
        let entries = vec![
            entry(Some("garbage"), Some("09:10:00")),
            entry(Some("10:00:00"), Some("09:00:00")),
            entry(Some("9:00:00 AM"), Some("9:20:00 AM")),
        ];
        assert_eq!(average_waiting_time(&entries), "20 min");
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(
            parse_clock_time("14:05:09"),
            NaiveTime::from_hms_opt(14, 5, 9)
        );
        assert_eq!(parse_clock_time("2:05:09 PM"), NaiveTime::from_hms_opt(14, 5, 9));
        assert_eq!(parse_clock_time("08:30"), NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(parse_clock_time("later"), None);
    }

    #[test]
    fn test_stats_from_patients() {
        let patients = vec![
            patient(QueueStatus::Waiting),
            patient(QueueStatus::Waiting),
            patient(QueueStatus::InConsultation),
            patient(QueueStatus::Completed),
        ];

        let stats = Stats::from_patients(&patients);
        assert_eq!(stats.new_patients, 4);
        assert_eq!(stats.pending_appointments, 2);
        assert_eq!(stats.completed_appointments, 1);
        assert_eq!(stats.avg_waiting_time, "0 min");
    }

    #[test]
    fn test_stats_document_shape() {
        let stats: Stats = serde_json::from_str(
            r#"{"newPatients": 12, "completedAppointments": 5, "avgWaitingTime": "7 min"}"#,
        )
        .unwrap();
        assert_eq!(stats.new_patients, 12);
        assert_eq!(stats.completed_appointments, 5);
        assert_eq!(stats.pending_appointments, 0);
        assert_eq!(stats.avg_waiting_time, "7 min");
    }
}
