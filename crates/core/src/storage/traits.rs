use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::clinic::{
    ApplicationDetail, ApplicationStatus, Appointment, AppointmentDetail, AppointmentStatus, Chat,
    ChatDetail, ChatStatus, ContactMessage, DashboardStats, DoctorApplication, DoctorSummary,
    MedicalReport, MedicineInput, Message, MessageView, PrescriptionDetail, ProfileUpdate, Rating,
    RatingSummary, RatingView, ReportDetail, Role, Slot, SlotListing, Specialization,
    SpecializationInput, SpecializationSummary, User,
};

use super::{NewBooking, Result};

/// Repository for accounts and the doctor directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by ID, including blocked and deleted accounts.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Gets a user by normalized email address.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Creates a user. A taken email is `AlreadyExists`.
    async fn create_user(&self, user: &User) -> Result<()>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<()>;

    async fn set_profile_image(&self, id: Uuid, image: &str) -> Result<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<()>;

    /// Marks the account deleted; rows referencing it are kept.
    async fn soft_delete_user(&self, id: Uuid) -> Result<()>;

    /// Non-deleted users, optionally restricted to one role, newest first.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>>;

    /// Active doctors with their specialization and rating summary.
    async fn list_doctors(&self, specialization_id: Option<Uuid>) -> Result<Vec<DoctorSummary>>;

    /// A single active doctor.
    async fn get_doctor(&self, id: Uuid) -> Result<Option<DoctorSummary>>;
}

#[async_trait]
pub trait SpecializationRepository: Send + Sync {
    /// All specializations by name, with active doctor counts.
    async fn list_specializations(&self) -> Result<Vec<SpecializationSummary>>;

    async fn get_specialization(&self, id: Uuid) -> Result<Option<Specialization>>;

    async fn create_specialization(&self, specialization: &Specialization) -> Result<()>;

    async fn update_specialization(&self, id: Uuid, input: &SpecializationInput) -> Result<()>;

    /// Deletes a specialization that no doctor or application references.
    async fn delete_specialization(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Stores an application. A second pending one for the same user is a conflict.
    async fn create_application(&self, application: &DoctorApplication) -> Result<()>;

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>>;

    /// The user's most recent application, if any.
    async fn latest_application_for_user(&self, user_id: Uuid)
        -> Result<Option<ApplicationDetail>>;

    async fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationDetail>>;

    /// Approves a pending application and promotes the applicant to doctor
    /// in the same transaction.
    async fn approve_application(&self, id: Uuid, now: DateTime<Utc>) -> Result<ApplicationDetail>;

    /// Rejects a pending application.
    async fn reject_application(
        &self,
        id: Uuid,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationDetail>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Creates a slot. Overlapping an existing slot of the doctor is a conflict.
    async fn create_slot(&self, slot: &Slot) -> Result<()>;

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>>;

    /// The doctor's slots from `from` onward with their booked flag.
    async fn list_doctor_slots(&self, doctor_id: Uuid, from: NaiveDate) -> Result<Vec<SlotListing>>;

    /// Slots starting after `now` with no non-canceled appointment.
    async fn available_slots(&self, doctor_id: Uuid, now: NaiveDateTime) -> Result<Vec<Slot>>;

    /// Deletes one of the doctor's slots unless an active appointment holds it.
    async fn delete_slot(&self, doctor_id: Uuid, slot_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Books a slot inside one write transaction.
    ///
    /// Fails with `Conflict` if the slot does not belong to the doctor, has
    /// already started, or is held by a non-canceled appointment.
    async fn book_appointment(&self, booking: &NewBooking, now: NaiveDateTime)
        -> Result<Appointment>;

    async fn get_appointment(&self, id: Uuid) -> Result<Option<AppointmentDetail>>;

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<AppointmentDetail>>;

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<AppointmentDetail>>;

    async fn list_recent_appointments(&self, limit: u32) -> Result<Vec<AppointmentDetail>>;

    /// Moves an appointment from `from` to `to` only if it is still in `from`.
    async fn transition_appointment(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<()>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Inserts a report and its medicines in one transaction.
    ///
    /// The appointment must be completed and not yet reported.
    async fn create_report(&self, report: &MedicalReport, medicines: &[MedicineInput]) -> Result<()>;

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportDetail>>;

    async fn report_for_appointment(&self, appointment_id: Uuid) -> Result<Option<MedicalReport>>;

    async fn list_patient_reports(&self, patient_id: Uuid) -> Result<Vec<ReportDetail>>;

    async fn list_doctor_reports(&self, doctor_id: Uuid) -> Result<Vec<ReportDetail>>;

    async fn get_prescription(&self, medicine_id: Uuid) -> Result<Option<PrescriptionDetail>>;

    /// Flips a prescription from `ISSUED` to `USED` exactly once.
    ///
    /// Only the report's patient may redeem. A prescription that is already
    /// used is a `Conflict`.
    async fn redeem_prescription(
        &self,
        medicine_id: Uuid,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PrescriptionDetail>;
}

#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Stores a rating for a completed appointment of the patient; once only.
    async fn create_rating(&self, rating: &Rating) -> Result<()>;

    async fn rating_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Rating>>;

    async fn list_doctor_ratings(&self, doctor_id: Uuid) -> Result<Vec<RatingView>>;

    async fn doctor_rating_summary(&self, doctor_id: Uuid) -> Result<RatingSummary>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Returns the open chat between the pair or starts a pending one.
    ///
    /// `first_message` is posted by the patient when a chat is created.
    async fn open_chat(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        first_message: Option<String>,
    ) -> Result<Chat>;

    async fn get_chat(&self, id: Uuid) -> Result<Option<ChatDetail>>;

    async fn list_user_chats(&self, user_id: Uuid) -> Result<Vec<ChatDetail>>;

    /// Conditional status change, like appointments.
    async fn transition_chat(&self, id: Uuid, from: ChatStatus, to: ChatStatus) -> Result<()>;

    /// Posts a message; the chat must be accepted at the time of writing.
    async fn add_message(&self, message: &Message) -> Result<()>;

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<MessageView>>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create_contact_message(&self, message: &ContactMessage) -> Result<()>;

    /// Unresolved first, then newest first.
    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>>;

    async fn resolve_contact_message(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn dashboard_stats(&self) -> Result<DashboardStats>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<()>;
}
