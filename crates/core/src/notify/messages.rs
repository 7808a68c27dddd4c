use chrono::{NaiveDate, NaiveTime};

use crate::clinic::{ApplicationStatus, AppointmentDetail, AppointmentStatus, User};

use super::Email;

fn when(date: NaiveDate, start: NaiveTime) -> String {
    format!("{} at {}", date.format("%A, %B %-d, %Y"), start.format("%H:%M"))
}

pub fn welcome(user: &User) -> Email {
    Email {
        to: user.email.clone(),
        subject: "Welcome to MediVerse".to_string(),
        body: format!(
            "Hello {},\n\nYour MediVerse account is ready. You can now browse doctors \
             and book appointments.\n\nThe MediVerse team",
            user.name
        ),
    }
}

pub fn appointment_booked_patient(detail: &AppointmentDetail) -> Email {
    Email {
        to: detail.patient_email.clone(),
        subject: "Appointment requested".to_string(),
        body: format!(
            "Hello {},\n\nYour appointment with Dr. {} on {} has been requested. \
             You will be notified when the doctor confirms it.\n\nThe MediVerse team",
            detail.patient_name,
            detail.doctor_name,
            when(detail.date, detail.start_time)
        ),
    }
}

pub fn appointment_booked_doctor(detail: &AppointmentDetail) -> Email {
    let reason = detail
        .appointment
        .reason
        .as_deref()
        .map(|r| format!("\nReason: {r}\n"))
        .unwrap_or_default();
    Email {
        to: detail.doctor_email.clone(),
        subject: "New appointment request".to_string(),
        body: format!(
            "Hello Dr. {},\n\n{} booked your slot on {}.\n{}\nPlease confirm or cancel it \
             from your appointments page.\n\nThe MediVerse team",
            detail.doctor_name,
            detail.patient_name,
            when(detail.date, detail.start_time),
            reason
        ),
    }
}

pub fn appointment_status_changed(detail: &AppointmentDetail, status: AppointmentStatus) -> Email {
    Email {
        to: detail.patient_email.clone(),
        subject: format!("Appointment {status}"),
        body: format!(
            "Hello {},\n\nYour appointment with Dr. {} on {} is now {}.\n\nThe MediVerse team",
            detail.patient_name,
            detail.doctor_name,
            when(detail.date, detail.start_time),
            status
        ),
    }
}

pub fn report_ready(detail: &AppointmentDetail) -> Email {
    Email {
        to: detail.patient_email.clone(),
        subject: "Your medical report is available".to_string(),
        body: format!(
            "Hello {},\n\nDr. {} has written the report for your visit on {}. \
             Sign in to MediVerse to read it and print your prescriptions.\n\nThe MediVerse team",
            detail.patient_name,
            detail.doctor_name,
            detail.date.format("%B %-d, %Y")
        ),
    }
}

pub fn application_decided(
    applicant_name: &str,
    applicant_email: &str,
    status: ApplicationStatus,
    note: Option<&str>,
) -> Email {
    let outcome = match status {
        ApplicationStatus::Approved => {
            "has been approved. You can now publish slots and receive appointments."
        }
        ApplicationStatus::Rejected => "has been rejected.",
        ApplicationStatus::Pending => "is still under review.",
    };
    let note = note.map(|n| format!("\n\nNote from the reviewer: {n}")).unwrap_or_default();
    Email {
        to: applicant_email.to_string(),
        subject: format!("Doctor application {status}"),
        body: format!(
            "Hello {applicant_name},\n\nYour application to join MediVerse as a doctor \
             {outcome}{note}\n\nThe MediVerse team"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinic::{Appointment, Slot};
    use uuid::Uuid;

    fn detail() -> AppointmentDetail {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let start = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let end = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let slot = Slot::new(Uuid::new_v4(), date, start, end);
        AppointmentDetail {
            appointment: Appointment::new(Uuid::new_v4(), &slot, Some("Back pain".to_string())),
            patient_name: "Ann".to_string(),
            patient_email: "ann@example.com".to_string(),
            doctor_name: "Bob".to_string(),
            doctor_email: "bob@example.com".to_string(),
            date,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn booking_emails_go_to_each_participant() {
        let patient = appointment_booked_patient(&detail());
        assert_eq!(patient.to, "ann@example.com");
        assert!(patient.body.contains("Monday, March 2, 2026 at 09:30"));

        let doctor = appointment_booked_doctor(&detail());
        assert_eq!(doctor.to, "bob@example.com");
        assert!(doctor.body.contains("Reason: Back pain"));
    }

    #[test]
    fn status_change_subject_names_the_status() {
        let email = appointment_status_changed(&detail(), AppointmentStatus::Confirmed);
        assert_eq!(email.subject, "Appointment confirmed");
        assert!(email.body.contains("is now confirmed"));
    }

    #[test]
    fn rejection_includes_reviewer_note() {
        let email = application_decided(
            "Ann",
            "ann@example.com",
            ApplicationStatus::Rejected,
            Some("License could not be verified"),
        );
        assert_eq!(email.subject, "Doctor application rejected");
        assert!(email.body.contains("License could not be verified"));
    }
}
