//! Employee records and the patient details derived from them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Placeholder shown for any field that cannot be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// Ages above this are treated as bad data.
pub const MAX_PLAUSIBLE_AGE: i32 = 150;

/// An employee record. Clinic patients are employees; this system only reads
/// them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    /// Employee number, referenced by queue entries
    pub employee_id: String,
    /// Full name
    pub name: Option<String>,
    /// Gender as recorded by HR
    pub gender: Option<String>,
    /// Date of birth (`YYYY-MM-DD`, an RFC 3339 timestamp is also accepted)
    pub date_of_birth: Option<String>,
}

impl Employee {
    /// Create an employee with only the required fields.
    pub fn new(employee_id: String, name: String) -> Self {
        Self {
            employee_id,
            name: Some(name),
            gender: None,
            date_of_birth: None,
        }
    }

    /// Parsed date of birth, if present and well formed.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.date_of_birth.as_deref().and_then(parse_birth_date)
    }

    /// Age in whole years on the given day.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date().and_then(|birth| age_on(birth, today))
    }
}

/// Parse a stored date of birth.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        raw.get(..10)
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
    })
}

/// Age in whole years, one less if this year's birthday has not come yet.
///
/// Returns `None` for ages outside `0..=150`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }

    if (0..=MAX_PLAUSIBLE_AGE).contains(&age) {
        Some(age as u32)
    } else {
        None
    }
}

/// Patient details shown next to a queue entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    pub employee_id: String,
    pub name: String,
    pub gender: String,
    pub age: Option<u32>,
}

impl PatientInfo {
    /// Build from the joined employee record; a missing record yields `N/A`
    /// everywhere.
    pub fn from_employee(employee: Option<&Employee>, today: NaiveDate) -> Self {
        let Some(employee) = employee else {
            return Self::unknown();
        };

        Self {
            employee_id: non_empty_or_na(Some(employee.employee_id.as_str())),
            name: non_empty_or_na(employee.name.as_deref()),
            gender: non_empty_or_na(employee.gender.as_deref()),
            age: employee.age_on(today),
        }
    }

    /// Placeholder for a queue entry whose employee is unknown.
    pub fn unknown() -> Self {
        Self {
            employee_id: NOT_AVAILABLE.to_string(),
            name: NOT_AVAILABLE.to_string(),
            gender: NOT_AVAILABLE.to_string(),
            age: None,
        }
    }

    /// Age for display.
    pub fn age_display(&self) -> String {
        self.age
            .map(|age| age.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

fn non_empty_or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_before_birthday() {
        assert_eq!(age_on(date(1990, 6, 15), date(2024, 6, 14)), Some(33));
    }

    #[test]
    fn test_age_on_and_after_birthday() {
        assert_eq!(age_on(date(1990, 6, 15), date(2024, 6, 15)), Some(34));
        assert_eq!(age_on(date(1990, 6, 15), date(2024, 12, 31)), Some(34));
    }

    #[test]
    fn test_age_out_of_range() {
        // Born in the future
        assert_eq!(age_on(date(2030, 1, 1), date(2024, 6, 14)), None);
        assert_eq!(age_on(date(1800, 1, 1), date(2024, 6, 14)), None);
        assert_eq!(age_on(date(1874, 6, 14), date(2024, 6, 14)), Some(150));
    }

    #[test]
    fn test_parse_birth_date_formats() {
        assert_eq!(parse_birth_date("1990-06-15"), Some(date(1990, 6, 15)));
        assert_eq!(
            parse_birth_date("1990-06-15T00:00:00Z"),
            Some(date(1990, 6, 15))
        );
        assert_eq!(parse_birth_date("15/06/1990"), None);
        assert_eq!(parse_birth_date(""), None);
    }

    #[test]
    fn test_patient_info_from_employee() {
        let mut employee = Employee::new("E100".into(), "Aisyah".into());
        employee.gender = Some("Female".into());
        employee.date_of_birth = Some("1990-06-15".into());

        let info = PatientInfo::from_employee(Some(&employee), date(2024, 6, 14));
        assert_eq!(info.employee_id, "E100");
        assert_eq!(info.name, "Aisyah");
        assert_eq!(info.gender, "Female");
        assert_eq!(info.age, Some(33));
    }

    #[test]
    fn test_patient_info_missing_fields() {
        let employee = Employee {
            employee_id: "E7".into(),
            name: Some("  ".into()),
            gender: None,
            date_of_birth: Some("not a date".into()),
        };

        let info = PatientInfo::from_employee(Some(&employee), date(2024, 6, 14));
        assert_eq!(info.name, NOT_AVAILABLE);
        assert_eq!(info.gender, NOT_AVAILABLE);
        assert_eq!(info.age_display(), NOT_AVAILABLE);
    }

    #[test]
    fn test_patient_info_unknown_employee() {
        let info = PatientInfo::from_employee(None, date(2024, 6, 14));
        assert_eq!(info, PatientInfo::unknown());
        assert_eq!(info.employee_id, "N/A");
    }
}
