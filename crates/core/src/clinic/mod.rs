//! Clinic domain: accounts, scheduling, reports, ratings and chats.

mod error;
mod operations;
mod requests;
mod types;

pub use error::{ParseEnumError, TransitionError, ValidationError};
pub use operations::{
    age_on, available_dates, bookable_slots_on, check_appointment_transition,
    check_chat_transition, find_overlapping_slot, format_time, is_slot_bookable,
    parse_form_date, parse_form_time, times_overlap,
};
pub use requests::*;
pub use types::{
    ApplicationDetail, ApplicationStatus, Appointment, AppointmentDetail, AppointmentStatus, Chat,
    ChatDetail, ChatStatus, ContactMessage, DashboardStats, DoctorApplication, DoctorSummary,
    MedicalReport, Message, MessageView, PrescribedMedicine, PrescriptionDetail, Rating,
    RatingSummary, RatingView, ReportDetail, Role, Slot, SlotListing, Specialization,
    SpecializationSummary, UsedStatus, User,
};
