use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ParseEnumError;

/// Declares a string-backed status enum with `as_str`, `Display` and `FromStr`.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// The value stored in the database and used in forms.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// Account role. Every account starts as a patient; admins promote doctors.
    Role {
        Patient => "patient",
        Doctor => "doctor",
        Admin => "admin",
    }
);

string_enum!(
    /// Appointment lifecycle.
    AppointmentStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Canceled => "canceled",
    }
);

string_enum!(
    /// One-time-use flag of a prescribed medicine.
    UsedStatus {
        Issued => "ISSUED",
        Used => "USED",
    }
);

string_enum!(
    /// Patient-doctor chat lifecycle.
    ChatStatus {
        Pending => "pending",
        Accepted => "accepted",
        Closed => "closed",
    }
);

string_enum!(
    /// Review state of a doctor application.
    ApplicationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

impl AppointmentStatus {
    /// True while the appointment still holds its slot.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Canceled)
    }

    /// Allowed lifecycle moves: pending -> confirmed -> completed, and
    /// pending/confirmed -> canceled.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Completed)
                | (Self::Pending, Self::Canceled)
                | (Self::Confirmed, Self::Canceled)
        )
    }
}

impl ChatStatus {
    /// pending -> accepted, and pending/accepted -> closed. Closed is terminal.
    pub fn can_transition_to(&self, next: ChatStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted) | (Self::Pending, Self::Closed) | (Self::Accepted, Self::Closed)
        )
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// A registered account (patient, doctor or admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub bio: Option<String>,
    /// Stored upload name of the profile photo.
    pub profile_image: Option<String>,
    /// Set for doctors.
    pub specialization_id: Option<Uuid>,
    pub is_blocked: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new active patient account.
    pub fn new_patient(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::Patient,
            phone: None,
            gender: None,
            date_of_birth: None,
            address: None,
            bio: None,
            profile_image: None,
            specialization_id: None,
            is_blocked: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the role (useful for seeding admins and tests).
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Sets the specialization (doctors).
    pub fn with_specialization(mut self, specialization_id: Uuid) -> Self {
        self.specialization_id = Some(specialization_id);
        self
    }

    /// Whether the account may sign in and keep its sessions.
    pub fn is_active(&self) -> bool {
        !self.is_blocked && !self.is_deleted
    }
}

/// Medical specialization offered by doctors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Specialization {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            created_at: Utc::now(),
        }
    }
}

/// Specialization with the number of active doctors practicing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecializationSummary {
    pub specialization: Specialization,
    pub doctor_count: u32,
}

/// A request from a patient to be promoted to doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization_id: Uuid,
    pub qualification: String,
    pub experience_years: u8,
    pub license_number: String,
    pub bio: Option<String>,
    /// Stored upload name of the supporting document.
    pub document: String,
    pub status: ApplicationStatus,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Application joined with applicant and specialization names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationDetail {
    pub application: DoctorApplication,
    pub applicant_name: String,
    pub applicant_email: String,
    pub specialization_name: String,
}

/// A bookable time unit published by a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(doctor_id: Uuid, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            date,
            start_time,
            end_time,
            created_at: Utc::now(),
        }
    }

    /// Local wall-clock start of the slot.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// A slot as seen by its doctor, with whether an active appointment holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotListing {
    pub slot: Slot,
    pub booked: bool,
}

/// A patient's booking of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_id: Uuid,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Creates a pending appointment for the given slot.
    pub fn new(patient_id: Uuid, slot: &Slot, reason: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: slot.doctor_id,
            slot_id: slot.id,
            reason,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Appointment joined with participant names and slot times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub patient_name: String,
    pub patient_email: String,
    pub doctor_name: String,
    pub doctor_email: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AppointmentDetail {
    /// True when the user is the patient or the doctor of this appointment.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.appointment.patient_id == user_id || self.appointment.doctor_id == user_id
    }
}

/// A doctor's report for a completed appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalReport {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One medicine line of a report; doubles as a one-time printable prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescribedMedicine {
    pub id: Uuid,
    pub report_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: u16,
    pub instructions: Option<String>,
    pub used_status: UsedStatus,
    pub used_at: Option<DateTime<Utc>>,
}

/// Report with its medicines and appointment context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDetail {
    pub report: MedicalReport,
    pub medicines: Vec<PrescribedMedicine>,
    pub patient_name: String,
    pub doctor_name: String,
    pub appointment_date: NaiveDate,
}

/// A single prescription with everything needed to print it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrescriptionDetail {
    pub medicine: PrescribedMedicine,
    pub report_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub diagnosis: String,
    pub issued_on: NaiveDate,
}

/// A patient's rating of a completed appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub score: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rating with the reviewer's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingView {
    pub rating: Rating,
    pub patient_name: String,
}

/// Aggregate of a doctor's ratings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: u32,
}

/// Directory entry for an active doctor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorSummary {
    pub doctor: User,
    pub specialization_name: Option<String>,
    pub rating: RatingSummary,
}

/// Patient-doctor conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub status: ChatStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(patient_id: Uuid, doctor_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            status: ChatStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Chat joined with participant names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatDetail {
    pub chat: Chat,
    pub patient_name: String,
    pub doctor_name: String,
}

impl ChatDetail {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.chat.patient_id == user_id || self.chat.doctor_id == user_id
    }
}

/// A message posted in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: Uuid, sender_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// Message with the sender's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub message: Message,
    pub sender_name: String,
}

/// Message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub patients: u32,
    pub doctors: u32,
    pub pending_appointments: u32,
    pub confirmed_appointments: u32,
    pub completed_appointments: u32,
    pub canceled_appointments: u32,
    pub pending_applications: u32,
    pub unresolved_messages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip_through_from_str() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
        assert_eq!("USED".parse::<UsedStatus>().unwrap(), UsedStatus::Used);
        assert!("used".parse::<UsedStatus>().is_err());
    }

    #[test]
    fn parse_error_names_the_type() {
        let err = "nurse".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "invalid Role: nurse");
    }

    #[test]
    fn appointment_transitions() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Canceled));
        assert!(Confirmed.can_transition_to(Canceled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Pending));
        assert!(!Canceled.can_transition_to(Confirmed));
    }

    #[test]
    fn chat_transitions() {
        use ChatStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Accepted.can_transition_to(Closed));
        assert!(Pending.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Pending));
    }

    #[test]
    fn only_canceled_appointments_release_the_slot() {
        assert!(AppointmentStatus::Pending.is_active());
        assert!(AppointmentStatus::Completed.is_active());
        assert!(!AppointmentStatus::Canceled.is_active());
    }

    #[test]
    fn blocked_or_deleted_users_are_inactive() {
        let mut user = User::new_patient("Ann", "ann@example.com", "hash");
        assert!(user.is_active());
        user.is_blocked = true;
        assert!(!user.is_active());
        user.is_blocked = false;
        user.is_deleted = true;
        assert!(!user.is_active());
    }

    #[test]
    fn user_serialization_skips_password_hash() {
        let user = User::new_patient("Ann", "ann@example.com", "secret-hash");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"patient\""));
    }
}
