use uuid::Uuid;

/// A booking request; the repository resolves and locks the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_id: Uuid,
    pub reason: Option<String>,
}
