use serde::{Deserialize, Serialize};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Domain model for a registered patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Patient {
    pub id: String,
    /// Medical record number, `MR` + yy + mm + 4 digits
    pub mr_number: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Age in whole years on `today`
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        age_on(self.date_of_birth, today)
    }
}

/// Whole years between a birth date and `today`; negative for future dates
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Request payload for registering a patient
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RegisterPatientRequest {
    #[validate(length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters"))]
    pub full_name: String,

    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Phone must be between 7 and 20 characters"))]
    pub phone: String,

    pub date_of_birth: NaiveDate,

    #[validate(length(max = 500, message = "Address cannot exceed 500 characters"))]
    pub address: Option<String>,

    #[validate(length(max = 100, message = "Emergency contact cannot exceed 100 characters"))]
    pub emergency_contact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_counts_birthday() {
        let dob = date(1980, 5, 12);
        assert_eq!(age_on(dob, date(2024, 5, 11)), 43);
        assert_eq!(age_on(dob, date(2024, 5, 12)), 44);
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterPatientRequest {
            full_name: "".to_string(),
            email: Some("not-an-email".to_string()),
            phone: "123".to_string(),
            date_of_birth: date(1990, 1, 1),
            address: None,
            emergency_contact: None,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
    }
}
