//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! Each `row_to_*` documents the column order its query must select.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use mediverse_core::clinic::{
    ApplicationDetail, Appointment, AppointmentDetail, Chat, ChatDetail, ContactMessage,
    DashboardStats, DoctorApplication, DoctorSummary, MedicalReport, Message, MessageView,
    PrescribedMedicine, PrescriptionDetail, Rating, RatingSummary, RatingView, ReportDetail, Slot,
    SlotListing, Specialization, SpecializationSummary, User,
};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

// ============================================================================
// Users
// ============================================================================

/// Columns 0..16: id, name, email, password_hash, role, phone, gender,
/// date_of_birth, address, bio, profile_image, specialization_id, is_blocked,
/// is_deleted, created_at, updated_at
pub fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let role: String = row.get(4)?;
    let date_of_birth: Option<String> = row.get(7)?;
    let specialization_id: Option<String> = row.get(11)?;
    let created_at: String = row.get(14)?;
    let updated_at: String = row.get(15)?;

    Ok(User {
        id: parse_uuid(&id)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: parse_enum(&role)?,
        phone: row.get(5)?,
        gender: row.get(6)?,
        date_of_birth: date_of_birth.as_deref().map(parse_date).transpose()?,
        address: row.get(8)?,
        bio: row.get(9)?,
        profile_image: row.get(10)?,
        specialization_id: specialization_id.as_deref().map(parse_uuid).transpose()?,
        is_blocked: row.get(12)?,
        is_deleted: row.get(13)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// User columns followed by specialization name, rating total and rating count.
pub fn row_to_doctor_summary(row: &Row) -> rusqlite::Result<DoctorSummary> {
    let doctor = row_to_user(row)?;
    let total: i64 = row.get(17)?;
    let count: i64 = row.get(18)?;

    Ok(DoctorSummary {
        doctor,
        specialization_name: row.get(16)?,
        rating: RatingSummary::from_totals(total as u32, count as u32),
    })
}

// ============================================================================
// Specializations and applications
// ============================================================================

/// Columns: id, name, description, created_at
pub fn row_to_specialization(row: &Row) -> rusqlite::Result<Specialization> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;

    Ok(Specialization {
        id: parse_uuid(&id)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Specialization columns followed by the doctor count.
pub fn row_to_specialization_summary(row: &Row) -> rusqlite::Result<SpecializationSummary> {
    let doctor_count: i64 = row.get(4)?;
    Ok(SpecializationSummary {
        specialization: row_to_specialization(row)?,
        doctor_count: doctor_count as u32,
    })
}

/// Columns: id, user_id, specialization_id, qualification, experience_years,
/// license_number, bio, document, status, review_note, created_at, reviewed_at,
/// applicant name, applicant email, specialization name
pub fn row_to_application_detail(row: &Row) -> rusqlite::Result<ApplicationDetail> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let specialization_id: String = row.get(2)?;
    let experience_years: i64 = row.get(4)?;
    let status: String = row.get(8)?;
    let created_at: String = row.get(10)?;
    let reviewed_at: Option<String> = row.get(11)?;

    let application = DoctorApplication {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        specialization_id: parse_uuid(&specialization_id)?,
        qualification: row.get(3)?,
        experience_years: experience_years as u8,
        license_number: row.get(5)?,
        bio: row.get(6)?,
        document: row.get(7)?,
        status: parse_enum(&status)?,
        review_note: row.get(9)?,
        created_at: parse_datetime(&created_at)?,
        reviewed_at: reviewed_at.as_deref().map(parse_datetime).transpose()?,
    };

    Ok(ApplicationDetail {
        application,
        applicant_name: row.get(12)?,
        applicant_email: row.get(13)?,
        specialization_name: row.get(14)?,
    })
}

// ============================================================================
// Slots and appointments
// ============================================================================

/// Columns: id, doctor_id, slot_date, start_time, end_time, created_at
pub fn row_to_slot(row: &Row) -> rusqlite::Result<Slot> {
    let id: String = row.get(0)?;
    let doctor_id: String = row.get(1)?;
    let date: String = row.get(2)?;
    let start_time: String = row.get(3)?;
    let end_time: String = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(Slot {
        id: parse_uuid(&id)?,
        doctor_id: parse_uuid(&doctor_id)?,
        date: parse_date(&date)?,
        start_time: parse_time(&start_time)?,
        end_time: parse_time(&end_time)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Slot columns followed by the booked flag.
pub fn row_to_slot_listing(row: &Row) -> rusqlite::Result<SlotListing> {
    Ok(SlotListing {
        slot: row_to_slot(row)?,
        booked: row.get(6)?,
    })
}

/// Columns: id, patient_id, doctor_id, slot_id, reason, status, created_at,
/// updated_at, patient name, patient email, doctor name, doctor email,
/// slot_date, start_time, end_time
pub fn row_to_appointment_detail(row: &Row) -> rusqlite::Result<AppointmentDetail> {
    let id: String = row.get(0)?;
    let patient_id: String = row.get(1)?;
    let doctor_id: String = row.get(2)?;
    let slot_id: String = row.get(3)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    let date: String = row.get(12)?;
    let start_time: String = row.get(13)?;
    let end_time: String = row.get(14)?;

    let appointment = Appointment {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        doctor_id: parse_uuid(&doctor_id)?,
        slot_id: parse_uuid(&slot_id)?,
        reason: row.get(4)?,
        status: parse_enum(&status)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    };

    Ok(AppointmentDetail {
        appointment,
        patient_name: row.get(8)?,
        patient_email: row.get(9)?,
        doctor_name: row.get(10)?,
        doctor_email: row.get(11)?,
        date: parse_date(&date)?,
        start_time: parse_time(&start_time)?,
        end_time: parse_time(&end_time)?,
    })
}

// ============================================================================
// Reports and prescriptions
// ============================================================================

/// Columns: id, appointment_id, patient_id, doctor_id, diagnosis, notes, created_at
pub fn row_to_report(row: &Row) -> rusqlite::Result<MedicalReport> {
    let id: String = row.get(0)?;
    let appointment_id: String = row.get(1)?;
    let patient_id: String = row.get(2)?;
    let doctor_id: String = row.get(3)?;
    let created_at: String = row.get(6)?;

    Ok(MedicalReport {
        id: parse_uuid(&id)?,
        appointment_id: parse_uuid(&appointment_id)?,
        patient_id: parse_uuid(&patient_id)?,
        doctor_id: parse_uuid(&doctor_id)?,
        diagnosis: row.get(4)?,
        notes: row.get(5)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Report columns followed by patient name, doctor name and appointment date.
/// Medicines are loaded separately and start empty.
pub fn row_to_report_detail(row: &Row) -> rusqlite::Result<ReportDetail> {
    let appointment_date: String = row.get(9)?;
    Ok(ReportDetail {
        report: row_to_report(row)?,
        medicines: Vec::new(),
        patient_name: row.get(7)?,
        doctor_name: row.get(8)?,
        appointment_date: parse_date(&appointment_date)?,
    })
}

/// Columns: id, report_id, medicine name, dosage, frequency, duration_days,
/// instructions, used_status, used_at
pub fn row_to_prescribed_medicine(row: &Row) -> rusqlite::Result<PrescribedMedicine> {
    let id: String = row.get(0)?;
    let report_id: String = row.get(1)?;
    let duration_days: i64 = row.get(5)?;
    let used_status: String = row.get(7)?;
    let used_at: Option<String> = row.get(8)?;

    Ok(PrescribedMedicine {
        id: parse_uuid(&id)?,
        report_id: parse_uuid(&report_id)?,
        medicine_name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        duration_days: duration_days as u16,
        instructions: row.get(6)?,
        used_status: parse_enum(&used_status)?,
        used_at: used_at.as_deref().map(parse_datetime).transpose()?,
    })
}

/// Medicine columns followed by patient_id, patient name, doctor name,
/// diagnosis and the report's created_at.
pub fn row_to_prescription_detail(row: &Row) -> rusqlite::Result<PrescriptionDetail> {
    let medicine = row_to_prescribed_medicine(row)?;
    let patient_id: String = row.get(9)?;
    let report_created_at: String = row.get(13)?;

    Ok(PrescriptionDetail {
        report_id: medicine.report_id,
        medicine,
        patient_id: parse_uuid(&patient_id)?,
        patient_name: row.get(10)?,
        doctor_name: row.get(11)?,
        diagnosis: row.get(12)?,
        issued_on: parse_datetime(&report_created_at)?.date_naive(),
    })
}

// ============================================================================
// Ratings
// ============================================================================

/// Columns: id, appointment_id, patient_id, doctor_id, score, comment, created_at
pub fn row_to_rating(row: &Row) -> rusqlite::Result<Rating> {
    let id: String = row.get(0)?;
    let appointment_id: String = row.get(1)?;
    let patient_id: String = row.get(2)?;
    let doctor_id: String = row.get(3)?;
    let score: i64 = row.get(4)?;
    let created_at: String = row.get(6)?;

    Ok(Rating {
        id: parse_uuid(&id)?,
        appointment_id: parse_uuid(&appointment_id)?,
        patient_id: parse_uuid(&patient_id)?,
        doctor_id: parse_uuid(&doctor_id)?,
        score: score as u8,
        comment: row.get(5)?,
        created_at: parse_datetime(&created_at)?,
    })
}

pub fn row_to_rating_view(row: &Row) -> rusqlite::Result<RatingView> {
    Ok(RatingView {
        rating: row_to_rating(row)?,
        patient_name: row.get(7)?,
    })
}

// ============================================================================
// Chats
// ============================================================================

/// Columns: id, patient_id, doctor_id, status, created_at, updated_at
pub fn row_to_chat(row: &Row) -> rusqlite::Result<Chat> {
    let id: String = row.get(0)?;
    let patient_id: String = row.get(1)?;
    let doctor_id: String = row.get(2)?;
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(Chat {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        doctor_id: parse_uuid(&doctor_id)?,
        status: parse_enum(&status)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// Chat columns followed by patient name and doctor name.
pub fn row_to_chat_detail(row: &Row) -> rusqlite::Result<ChatDetail> {
    Ok(ChatDetail {
        chat: row_to_chat(row)?,
        patient_name: row.get(6)?,
        doctor_name: row.get(7)?,
    })
}

/// Columns: id, chat_id, sender_id, body, created_at, sender name
pub fn row_to_message_view(row: &Row) -> rusqlite::Result<MessageView> {
    let id: String = row.get(0)?;
    let chat_id: String = row.get(1)?;
    let sender_id: String = row.get(2)?;
    let created_at: String = row.get(4)?;

    Ok(MessageView {
        message: Message {
            id: parse_uuid(&id)?,
            chat_id: parse_uuid(&chat_id)?,
            sender_id: parse_uuid(&sender_id)?,
            body: row.get(3)?,
            created_at: parse_datetime(&created_at)?,
        },
        sender_name: row.get(5)?,
    })
}

// ============================================================================
// Contact and admin
// ============================================================================

/// Columns: id, name, email, subject, body, is_resolved, created_at
pub fn row_to_contact_message(row: &Row) -> rusqlite::Result<ContactMessage> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(6)?;

    Ok(ContactMessage {
        id: parse_uuid(&id)?,
        name: row.get(1)?,
        email: row.get(2)?,
        subject: row.get(3)?,
        body: row.get(4)?,
        is_resolved: row.get(5)?,
        created_at: parse_datetime(&created_at)?,
    })
}

pub fn row_to_dashboard_stats(row: &Row) -> rusqlite::Result<DashboardStats> {
    let count = |idx: usize| -> rusqlite::Result<u32> { row.get::<_, i64>(idx).map(|n| n as u32) };

    Ok(DashboardStats {
        patients: count(0)?,
        doctors: count(1)?,
        pending_appointments: count(2)?,
        confirmed_appointments: count(3)?,
        completed_appointments: count(4)?,
        canceled_appointments: count(5)?,
        pending_applications: count(6)?,
        unresolved_messages: count(7)?,
    })
}

// ============================================================================
// Helper functions
// ============================================================================

fn conversion_error(e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
}

fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(conversion_error)
}

/// Parse a date from ISO 8601 string (YYYY-MM-DD).
fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(conversion_error)
}

/// Parse a wall-clock time stored as HH:MM.
fn parse_time(s: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(conversion_error)
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

/// Parse any of the string-backed status enums.
fn parse_enum<T>(s: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse().map_err(conversion_error)
}

/// Format a DateTime for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Format a NaiveDate for SQLite storage (YYYY-MM-DD).
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a slot time for SQLite storage (HH:MM).
pub fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Local wall-clock moment in the `slot_date || ' ' || start_time` shape.
pub fn format_slot_moment(moment: &NaiveDateTime) -> String {
    moment.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediverse_core::clinic::{AppointmentStatus, Role};
    use rusqlite::Connection;

    #[test]
    fn test_format_datetime() {
        let dt = DateTime::parse_from_rfc3339("2024-06-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_datetime(&dt), "2024-06-15T10:30:00+00:00");
    }

    #[test]
    fn test_format_time_drops_seconds() {
        let time = NaiveTime::from_hms_opt(9, 5, 30).unwrap();
        assert_eq!(format_time(&time), "09:05");
    }

    #[test]
    fn slot_moments_compare_as_text() {
        let earlier = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(format_slot_moment(&earlier), "2024-06-15 09:00");
        assert!(format_slot_moment(&earlier) < format_slot_moment(&later));
    }

    #[test]
    fn test_parse_uuid_invalid() {
        assert!(parse_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_parse_time_valid_and_invalid() {
        assert_eq!(
            parse_time("14:45").unwrap(),
            NaiveTime::from_hms_opt(14, 45, 0).unwrap()
        );
        assert!(parse_time("2pm").is_err());
    }

    #[test]
    fn test_parse_enum() {
        assert_eq!(parse_enum::<Role>("doctor").unwrap(), Role::Doctor);
        assert_eq!(
            parse_enum::<AppointmentStatus>("canceled").unwrap(),
            AppointmentStatus::Canceled
        );
        assert!(parse_enum::<Role>("nurse").is_err());
    }

    #[test]
    fn row_to_slot_reads_stored_columns() {
        let conn = Connection::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        let doctor_id = Uuid::new_v4();
        let slot = conn
            .query_row(
                "SELECT ?1, ?2, '2024-06-15', '09:00', '09:30', '2024-06-01T08:00:00+00:00'",
                [id.to_string(), doctor_id.to_string()],
                row_to_slot,
            )
            .unwrap();

        assert_eq!(slot.id, id);
        assert_eq!(slot.doctor_id, doctor_id);
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(slot.end_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn row_to_slot_rejects_corrupt_time() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.query_row(
            "SELECT ?1, ?1, '2024-06-15', 'nine', '09:30', '2024-06-01T08:00:00+00:00'",
            [Uuid::new_v4().to_string()],
            row_to_slot,
        );
        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(..))
        ));
    }
}
