//! Form payloads and their validation.
//!
//! Forms deserialize into plain strings so that a bad value becomes a flash
//! message instead of a 422. `validate` turns them into typed inputs.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{is_valid_email, normalize_email};

use super::error::ValidationError;
use super::operations::{parse_form_date, parse_form_time};
use super::types::{ApplicationStatus, Role};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MAX_MESSAGE_LEN: usize = 2000;
pub const MAX_EXPERIENCE_YEARS: u8 = 70;
pub const MAX_DURATION_DAYS: u16 = 365;

/// Trims `value` and rejects it when empty or longer than `max` characters.
fn required(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}

/// Like [`required`] but maps blank input to `None`.
fn optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => required(field, value, max).map(Some),
    }
}

fn parse_id(value: &str) -> Result<Uuid, ValidationError> {
    let value = value.trim();
    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidId(value.to_string()))
}

fn parse_in_range(field: &'static str, value: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    let number: i64 = value
        .parse()
        .map_err(|_| ValidationError::InvalidNumber(field))?;
    if !(min..=max).contains(&number) {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(number)
}

fn email(value: &str) -> Result<String, ValidationError> {
    let email = normalize_email(value);
    if email.is_empty() {
        return Err(ValidationError::Required("Email"));
    }
    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

/// Registration form. The password policy is checked separately with
/// [`crate::auth::check_new_password`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Validated name and normalized email of a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<NewAccount, ValidationError> {
        Ok(NewAccount {
            name: required("Name", &self.name, MAX_NAME_LEN)?,
            email: email(&self.email)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub return_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub bio: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self, today: NaiveDate) -> Result<ProfileUpdate, ValidationError> {
        let date_of_birth = match self.date_of_birth.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let date = parse_form_date(raw)?;
                if date > today {
                    return Err(ValidationError::BirthDateInFuture);
                }
                Some(date)
            }
        };

        Ok(ProfileUpdate {
            name: required("Name", &self.name, MAX_NAME_LEN)?,
            phone: optional("Phone", self.phone.as_deref(), 30)?,
            gender: optional("Gender", self.gender.as_deref(), 20)?,
            date_of_birth,
            address: optional("Address", self.address.as_deref(), 255)?,
            bio: optional("Bio", self.bio.as_deref(), MAX_MESSAGE_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecializationForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializationInput {
    pub name: String,
    pub description: Option<String>,
}

impl SpecializationForm {
    pub fn validate(&self) -> Result<SpecializationInput, ValidationError> {
        Ok(SpecializationInput {
            name: required("Name", &self.name, MAX_NAME_LEN)?,
            description: optional("Description", self.description.as_deref(), MAX_REASON_LEN)?,
        })
    }
}

/// Text fields of a doctor application; the document arrives as a separate
/// multipart part.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub specialization_id: String,
    pub qualification: String,
    pub experience_years: String,
    pub license_number: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInput {
    pub specialization_id: Uuid,
    pub qualification: String,
    pub experience_years: u8,
    pub license_number: String,
    pub bio: Option<String>,
}

impl ApplicationForm {
    pub fn validate(&self) -> Result<ApplicationInput, ValidationError> {
        if self.specialization_id.trim().is_empty() {
            return Err(ValidationError::Required("Specialization"));
        }
        let experience_years = parse_in_range(
            "Experience years",
            &self.experience_years,
            0,
            i64::from(MAX_EXPERIENCE_YEARS),
        )?;

        Ok(ApplicationInput {
            specialization_id: parse_id(&self.specialization_id)?,
            qualification: required("Qualification", &self.qualification, 200)?,
            experience_years: experience_years as u8,
            license_number: required("License number", &self.license_number, MAX_NAME_LEN)?,
            bio: optional("Bio", self.bio.as_deref(), MAX_MESSAGE_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotForm {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInput {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl SlotForm {
    pub fn validate(&self, today: NaiveDate) -> Result<SlotInput, ValidationError> {
        let date = parse_form_date(&self.date)?;
        if date < today {
            return Err(ValidationError::DateInPast);
        }
        let start_time = parse_form_time(&self.start_time)?;
        let end_time = parse_form_time(&self.end_time)?;
        if end_time <= start_time {
            return Err(ValidationError::InvalidTimeRange);
        }
        Ok(SlotInput {
            date,
            start_time,
            end_time,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    pub slot_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingInput {
    pub slot_id: Uuid,
    pub reason: Option<String>,
}

impl BookingForm {
    pub fn validate(&self) -> Result<BookingInput, ValidationError> {
        if self.slot_id.trim().is_empty() {
            return Err(ValidationError::Required("Slot"));
        }
        Ok(BookingInput {
            slot_id: parse_id(&self.slot_id)?,
            reason: optional("Reason", self.reason.as_deref(), MAX_REASON_LEN)?,
        })
    }
}

/// Report form. Medicine lines are parallel repeated fields
/// (`medicine_name=..&dosage=..&medicine_name=..`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportForm {
    pub diagnosis: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub medicine_name: Vec<String>,
    #[serde(default)]
    pub dosage: Vec<String>,
    #[serde(default)]
    pub frequency: Vec<String>,
    #[serde(default)]
    pub duration_days: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineInput {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: u16,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInput {
    pub diagnosis: String,
    pub notes: Option<String>,
    pub medicines: Vec<MedicineInput>,
}

impl ReportForm {
    pub fn validate(&self) -> Result<ReportInput, ValidationError> {
        let diagnosis = required("Diagnosis", &self.diagnosis, MAX_MESSAGE_LEN)?;
        let notes = optional("Notes", self.notes.as_deref(), 5000)?;

        let field = |values: &[String], index: usize| -> String {
            values.get(index).map(|v| v.trim().to_string()).unwrap_or_default()
        };

        let mut medicines = Vec::new();
        for index in 0..self.medicine_name.len() {
            let line = index + 1;
            let name = field(&self.medicine_name, index);
            let dosage = field(&self.dosage, index);
            let frequency = field(&self.frequency, index);
            let duration = field(&self.duration_days, index);
            let instructions = field(&self.instructions, index);

            // Blank rows come from the "add medicine" template row.
            if [&name, &dosage, &frequency, &duration, &instructions]
                .iter()
                .all(|v| v.is_empty())
            {
                continue;
            }
            if name.is_empty() || dosage.is_empty() || frequency.is_empty() || duration.is_empty() {
                return Err(ValidationError::IncompleteMedicine(line));
            }

            let duration_days = parse_in_range(
                "Duration (days)",
                &duration,
                1,
                i64::from(MAX_DURATION_DAYS),
            )?;

            medicines.push(MedicineInput {
                name: required("Medicine name", &name, 200)?,
                dosage: required("Dosage", &dosage, MAX_NAME_LEN)?,
                frequency: required("Frequency", &frequency, MAX_NAME_LEN)?,
                duration_days: duration_days as u16,
                instructions: optional("Instructions", Some(instructions.as_str()), MAX_REASON_LEN)?,
            });
        }

        Ok(ReportInput {
            diagnosis,
            notes,
            medicines,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingForm {
    pub score: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingInput {
    pub score: u8,
    pub comment: Option<String>,
}

impl RatingForm {
    pub fn validate(&self) -> Result<RatingInput, ValidationError> {
        let score = parse_in_range("Score", &self.score, 1, 5)?;
        Ok(RatingInput {
            score: score as u8,
            comment: optional("Comment", self.comment.as_deref(), MAX_COMMENT_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatStartForm {
    pub doctor_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatStartInput {
    pub doctor_id: Uuid,
    pub message: Option<String>,
}

impl ChatStartForm {
    pub fn validate(&self) -> Result<ChatStartInput, ValidationError> {
        if self.doctor_id.trim().is_empty() {
            return Err(ValidationError::Required("Doctor"));
        }
        Ok(ChatStartInput {
            doctor_id: parse_id(&self.doctor_id)?,
            message: optional("Message", self.message.as_deref(), MAX_MESSAGE_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageForm {
    pub body: String,
}

impl MessageForm {
    pub fn validate(&self) -> Result<String, ValidationError> {
        required("Message", &self.body, MAX_MESSAGE_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<ContactInput, ValidationError> {
        Ok(ContactInput {
            name: required("Name", &self.name, MAX_NAME_LEN)?,
            email: email(&self.email)?,
            subject: required("Subject", &self.subject, 200)?,
            body: required("Message", &self.message, 5000)?,
        })
    }
}

/// Admin note attached when rejecting an application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectForm {
    #[serde(default)]
    pub note: Option<String>,
}

impl RejectForm {
    pub fn validate(&self) -> Result<Option<String>, ValidationError> {
        optional("Note", self.note.as_deref(), MAX_COMMENT_LEN)
    }
}

/// `?date=YYYY-MM-DD` on the available-slots endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: Option<String>,
}

impl DateQuery {
    pub fn parse(&self) -> Result<NaiveDate, ValidationError> {
        match self.date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_form_date(raw),
            _ => Err(ValidationError::Required("date")),
        }
    }
}

/// `?specialization=<id>` on the doctors directory. Unknown values show everyone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorFilter {
    #[serde(default)]
    pub specialization: Option<String>,
}

impl DoctorFilter {
    pub fn specialization_id(&self) -> Option<Uuid> {
        self.specialization
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    }
}

/// `?role=` on the admin user list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleFilter {
    #[serde(default)]
    pub role: Option<String>,
}

impl RoleFilter {
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|raw| raw.parse().ok())
    }
}

/// `?status=` on the admin application list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFilter {
    #[serde(default)]
    pub status: Option<String>,
}

impl ApplicationFilter {
    pub fn status(&self) -> Option<ApplicationStatus> {
        self.status.as_deref().and_then(|raw| raw.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn register_normalizes_email_and_trims_name() {
        let form = RegisterForm {
            name: "  Ann Lee ".to_string(),
            email: " Ann@Example.COM".to_string(),
            password: "ignored here".to_string(),
            password_confirm: "ignored here".to_string(),
        };
        assert_eq!(
            form.validate().unwrap(),
            NewAccount {
                name: "Ann Lee".to_string(),
                email: "ann@example.com".to_string()
            }
        );
    }

    #[test]
    fn register_rejects_blank_name_and_bad_email() {
        let mut form = RegisterForm {
            name: "   ".to_string(),
            email: "ann@example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::Required("Name")));

        form.name = "Ann".to_string();
        form.email = "not-an-email".to_string();
        assert_eq!(form.validate(), Err(ValidationError::InvalidEmail));

        form.name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(form.validate(), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn profile_rejects_future_birth_date_and_blanks_optional_fields() {
        let form = ProfileForm {
            name: "Ann".to_string(),
            phone: Some("  ".to_string()),
            date_of_birth: Some("2030-01-01".to_string()),
            ..Default::default()
        };
        assert_eq!(form.validate(today()), Err(ValidationError::BirthDateInFuture));

        let form = ProfileForm {
            date_of_birth: Some("1990-05-04".to_string()),
            ..form
        };
        let update = form.validate(today()).unwrap();
        assert_eq!(update.phone, None);
        assert_eq!(update.date_of_birth, NaiveDate::from_ymd_opt(1990, 5, 4));
    }

    #[test]
    fn slot_form_requires_future_date_and_ordered_times() {
        let form = SlotForm {
            date: "2026-02-28".to_string(),
            start_time: "09:00".to_string(),
            end_time: "09:30".to_string(),
        };
        assert_eq!(form.validate(today()), Err(ValidationError::DateInPast));

        let form = SlotForm {
            date: "2026-03-01".to_string(),
            start_time: "10:00".to_string(),
            end_time: "10:00".to_string(),
        };
        assert_eq!(form.validate(today()), Err(ValidationError::InvalidTimeRange));

        let form = SlotForm {
            end_time: "10:30".to_string(),
            ..form
        };
        let input = form.validate(today()).unwrap();
        assert_eq!(input.date, today());
    }

    #[test]
    fn booking_reason_is_limited() {
        let slot_id = Uuid::new_v4();
        let form = BookingForm {
            slot_id: slot_id.to_string(),
            reason: Some("r".repeat(MAX_REASON_LEN + 1)),
        };
        assert!(matches!(form.validate(), Err(ValidationError::TooLong { max: 500, .. })));

        let form = BookingForm {
            slot_id: slot_id.to_string(),
            reason: Some("".to_string()),
        };
        assert_eq!(
            form.validate().unwrap(),
            BookingInput {
                slot_id,
                reason: None
            }
        );

        let form = BookingForm {
            slot_id: "nope".to_string(),
            reason: None,
        };
        assert_eq!(form.validate(), Err(ValidationError::InvalidId("nope".to_string())));
    }

    #[test]
    fn report_skips_blank_medicine_rows_and_flags_partial_ones() {
        let form = ReportForm {
            diagnosis: "Seasonal flu".to_string(),
            notes: None,
            medicine_name: vec!["Paracetamol".to_string(), "".to_string()],
            dosage: vec!["500mg".to_string(), "".to_string()],
            frequency: vec!["3x daily".to_string(), "".to_string()],
            duration_days: vec!["5".to_string(), "".to_string()],
            instructions: vec!["After meals".to_string(), "".to_string()],
        };
        let input = form.validate().unwrap();
        assert_eq!(input.medicines.len(), 1);
        assert_eq!(input.medicines[0].duration_days, 5);
        assert_eq!(input.medicines[0].instructions.as_deref(), Some("After meals"));

        let partial = ReportForm {
            dosage: vec!["500mg".to_string(), "10mg".to_string()],
            ..form.clone()
        };
        assert_eq!(partial.validate(), Err(ValidationError::IncompleteMedicine(2)));

        let too_long = ReportForm {
            duration_days: vec!["400".to_string(), "".to_string()],
            ..form
        };
        assert!(matches!(
            too_long.validate(),
            Err(ValidationError::OutOfRange { min: 1, max: 365, .. })
        ));
    }

    #[test]
    fn report_without_medicines_is_valid() {
        let form = ReportForm {
            diagnosis: "Healthy".to_string(),
            ..Default::default()
        };
        assert!(form.validate().unwrap().medicines.is_empty());
    }

    #[test]
    fn rating_score_bounds() {
        for (raw, ok) in [("0", false), ("1", true), ("5", true), ("6", false), ("x", false), ("", false)] {
            let form = RatingForm {
                score: raw.to_string(),
                comment: None,
            };
            assert_eq!(form.validate().is_ok(), ok, "score {raw:?}");
        }
    }

    #[test]
    fn application_experience_bounds() {
        let form = ApplicationForm {
            specialization_id: Uuid::new_v4().to_string(),
            qualification: "MBBS".to_string(),
            experience_years: "71".to_string(),
            license_number: "LIC-1".to_string(),
            bio: None,
        };
        assert!(matches!(form.validate(), Err(ValidationError::OutOfRange { .. })));

        let form = ApplicationForm {
            experience_years: "12".to_string(),
            ..form
        };
        assert_eq!(form.validate().unwrap().experience_years, 12);
    }

    #[test]
    fn message_body_limits() {
        assert!(MessageForm { body: " ".to_string() }.validate().is_err());
        assert!(MessageForm {
            body: "m".repeat(MAX_MESSAGE_LEN + 1)
        }
        .validate()
        .is_err());
        assert_eq!(
            MessageForm {
                body: " hello ".to_string()
            }
            .validate()
            .unwrap(),
            "hello"
        );
    }

    #[test]
    fn filters_ignore_unknown_values() {
        assert_eq!(
            RoleFilter {
                role: Some("doctor".to_string())
            }
            .role(),
            Some(Role::Doctor)
        );
        assert_eq!(
            RoleFilter {
                role: Some("nurse".to_string())
            }
            .role(),
            None
        );
        assert_eq!(DoctorFilter::default().specialization_id(), None);
        assert!(DateQuery::default().parse().is_err());
    }
}
