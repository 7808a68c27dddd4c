use async_trait::async_trait;
use chrono::NaiveDateTime;
use mediverse_core::clinic::{
    is_slot_bookable, Appointment, AppointmentDetail, AppointmentStatus, Slot,
};
use mediverse_core::storage::{AppointmentRepository, NewBooking, RepositoryError, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::super::conversions::{format_datetime, row_to_appointment_detail, row_to_slot};
use super::super::error::{
    domain_err, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err,
};
use super::super::schema;
use super::{now, SqliteRepository};

fn unavailable() -> tokio_rusqlite::Error {
    domain_err(RepositoryError::conflict(
        "This slot is no longer available, please pick another one",
    ))
}

#[async_trait]
impl AppointmentRepository for SqliteRepository {
    async fn book_appointment(
        &self,
        booking: &NewBooking,
        now: NaiveDateTime,
    ) -> Result<Appointment> {
        let booking = booking.clone();
        let slot_id = booking.slot_id.to_string();

        self.conn
            .call(move |conn| {
                // IMMEDIATE takes the write lock before the availability read.
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let slot: Slot = tx
                    .query_row(
                        schema::SELECT_SLOT_BY_ID,
                        [booking.slot_id.to_string()],
                        row_to_slot,
                    )
                    .optional()
                    .map_err(wrap_err)?
                    .ok_or_else(unavailable)?;

                if slot.doctor_id != booking.doctor_id || !is_slot_bookable(&slot, now) {
                    return Err(unavailable());
                }
                if booking.patient_id == booking.doctor_id {
                    return Err(domain_err(RepositoryError::conflict(
                        "You cannot book an appointment with yourself",
                    )));
                }

                let active: i64 = tx
                    .query_row(
                        schema::COUNT_ACTIVE_APPOINTMENTS_FOR_SLOT,
                        [slot.id.to_string()],
                        |row| row.get(0),
                    )
                    .map_err(wrap_err)?;
                if active > 0 {
                    return Err(domain_err(RepositoryError::conflict(
                        "This slot is already booked",
                    )));
                }

                let appointment = Appointment::new(booking.patient_id, &slot, booking.reason);
                tx.execute(
                    schema::INSERT_APPOINTMENT,
                    rusqlite::params![
                        appointment.id.to_string(),
                        appointment.patient_id.to_string(),
                        appointment.doctor_id.to_string(),
                        appointment.slot_id.to_string(),
                        appointment.reason,
                        appointment.status.as_str(),
                        format_datetime(&appointment.created_at),
                        format_datetime(&appointment.updated_at),
                    ],
                )
                .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(appointment)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Appointment", slot_id))
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<AppointmentDetail>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_APPOINTMENT_BY_ID,
                    [&id_str],
                    row_to_appointment_detail,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Appointment", id.to_string()))
    }

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<AppointmentDetail>> {
        self.list_appointments(schema::SELECT_PATIENT_APPOINTMENTS, patient_id.to_string())
            .await
    }

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<AppointmentDetail>> {
        self.list_appointments(schema::SELECT_DOCTOR_APPOINTMENTS, doctor_id.to_string())
            .await
    }

    async fn list_recent_appointments(&self, limit: u32) -> Result<Vec<AppointmentDetail>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_RECENT_APPOINTMENTS)
                    .map_err(wrap_err)?;
                let appointments = stmt
                    .query_map([limit], row_to_appointment_detail)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(appointments)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Appointment"))
    }

    async fn transition_appointment(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::TRANSITION_APPOINTMENT,
                        rusqlite::params![id_str, from.as_str(), to.as_str(), now()],
                    )
                    .map_err(wrap_err)?;
                if rows > 0 {
                    return Ok(());
                }

                // Nothing matched: either the row is gone or someone moved it first.
                let exists: i64 = conn
                    .query_row(schema::APPOINTMENT_EXISTS, [&id_str], |row| row.get(0))
                    .map_err(wrap_err)?;
                if exists == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Err(domain_err(RepositoryError::conflict(format!(
                        "This appointment is no longer {from}"
                    ))))
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Appointment", id.to_string()))
    }
}

impl SqliteRepository {
    async fn list_appointments(
        &self,
        sql: &'static str,
        user_id: String,
    ) -> Result<Vec<AppointmentDetail>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(sql).map_err(wrap_err)?;
                let appointments = stmt
                    .query_map([&user_id], row_to_appointment_detail)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(appointments)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Appointment"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn new_booking(patient_id: Uuid, slot: &Slot) -> NewBooking {
        NewBooking {
            patient_id,
            doctor_id: slot.doctor_id,
            slot_id: slot.id,
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_booking_creates_pending_appointment() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let slot = slot(&repo, &house, tomorrow(), 9).await;

        let appointment = booking(&repo, &ann, &slot).await;
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.doctor_id, house.id);

        let detail = repo.get_appointment(appointment.id).await.unwrap().unwrap();
        assert_eq!(detail.patient_name, "Ann");
        assert_eq!(detail.doctor_email, "house@example.com");
        assert_eq!(detail.start_time, time(9, 0));
        assert_eq!(detail.appointment.reason.as_deref(), Some("Checkup"));
    }

    #[tokio::test]
    async fn test_double_booking_is_conflict() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let bob = patient(&repo, "Bob").await;
        let slot = slot(&repo, &house, tomorrow(), 9).await;

        booking(&repo, &ann, &slot).await;
        let result = repo
            .book_appointment(&new_booking(bob.id, &slot), wall_clock())
            .await;
        assert_eq!(
            result.unwrap_err(),
            RepositoryError::conflict("This slot is already booked")
        );
    }

    #[tokio::test]
    async fn test_concurrent_bookings_hold_one_slot() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let slot = slot(&repo, &house, tomorrow(), 9).await;
        let mut patients = Vec::new();
        for name in ["Ann", "Bob", "Cat", "Dan"] {
            patients.push(patient(&repo, name).await);
        }

        let handles: Vec<_> = patients
            .iter()
            .map(|p| {
                let repo = repo.clone();
                let booking = new_booking(p.id, &slot);
                tokio::spawn(async move { repo.book_appointment(&booking, wall_clock()).await })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(repo.list_doctor_appointments(house.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_booking_rejects_wrong_doctor_or_started_slot() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let wilson = doctor(&repo, "Wilson").await;
        let ann = patient(&repo, "Ann").await;
        let day = tomorrow();
        let slot = slot(&repo, &house, day, 9).await;

        let mut wrong_doctor = new_booking(ann.id, &slot);
        wrong_doctor.doctor_id = wilson.id;
        let result = repo.book_appointment(&wrong_doctor, wall_clock()).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let started = day.and_time(time(9, 5));
        let result = repo.book_appointment(&new_booking(ann.id, &slot), started).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let mut unknown = new_booking(ann.id, &slot);
        unknown.slot_id = Uuid::new_v4();
        let result = repo.book_appointment(&unknown, wall_clock()).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_canceled_slot_can_be_rebooked() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let bob = patient(&repo, "Bob").await;
        let slot = slot(&repo, &house, tomorrow(), 9).await;

        let first = booking(&repo, &ann, &slot).await;
        repo.transition_appointment(first.id, AppointmentStatus::Pending, AppointmentStatus::Canceled)
            .await
            .unwrap();

        let second = booking(&repo, &bob, &slot).await;
        assert_eq!(second.slot_id, slot.id);
    }

    #[tokio::test]
    async fn test_stale_transition_is_conflict() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let slot = slot(&repo, &house, tomorrow(), 9).await;
        let appointment = booking(&repo, &ann, &slot).await;

        repo.transition_appointment(
            appointment.id,
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
        )
        .await
        .unwrap();

        let stale = repo
            .transition_appointment(
                appointment.id,
                AppointmentStatus::Pending,
                AppointmentStatus::Canceled,
            )
            .await;
        assert!(matches!(stale, Err(RepositoryError::Conflict(_))));

        let missing = repo
            .transition_appointment(
                Uuid::new_v4(),
                AppointmentStatus::Pending,
                AppointmentStatus::Confirmed,
            )
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_lists_are_scoped_to_participants() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let bob = patient(&repo, "Bob").await;
        let first = slot(&repo, &house, tomorrow(), 9).await;
        let second = slot(&repo, &house, tomorrow(), 10).await;
        booking(&repo, &ann, &first).await;
        booking(&repo, &bob, &second).await;

        assert_eq!(repo.list_patient_appointments(ann.id).await.unwrap().len(), 1);
        assert_eq!(repo.list_doctor_appointments(house.id).await.unwrap().len(), 2);
        assert_eq!(repo.list_recent_appointments(1).await.unwrap().len(), 1);
    }
}
