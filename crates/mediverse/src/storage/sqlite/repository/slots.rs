use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use mediverse_core::clinic::{find_overlapping_slot, Slot, SlotListing};
use mediverse_core::storage::{RepositoryError, Result, SlotRepository};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::super::conversions::{
    format_date, format_datetime, format_slot_moment, format_time, row_to_slot,
    row_to_slot_listing,
};
use super::super::error::{
    domain_err, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err,
};
use super::super::schema;
use super::SqliteRepository;

#[async_trait]
impl SlotRepository for SqliteRepository {
    async fn create_slot(&self, slot: &Slot) -> Result<()> {
        let slot = slot.clone();
        let slot_id = slot.id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let same_day = {
                    let mut stmt = tx
                        .prepare(schema::SELECT_DOCTOR_SLOTS_ON_DATE)
                        .map_err(wrap_err)?;
                    let rows = stmt
                        .query_map(
                            [slot.doctor_id.to_string(), format_date(&slot.date)],
                            row_to_slot,
                        )
                        .map_err(wrap_err)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()
                        .map_err(wrap_err)?
                };

                if let Some(existing) =
                    find_overlapping_slot(&same_day, slot.date, slot.start_time, slot.end_time)
                {
                    return Err(domain_err(RepositoryError::conflict(format!(
                        "This slot overlaps your existing slot {}-{}",
                        format_time(&existing.start_time),
                        format_time(&existing.end_time)
                    ))));
                }

                tx.execute(
                    schema::INSERT_SLOT,
                    rusqlite::params![
                        slot.id.to_string(),
                        slot.doctor_id.to_string(),
                        format_date(&slot.date),
                        format_time(&slot.start_time),
                        format_time(&slot.end_time),
                        format_datetime(&slot.created_at),
                    ],
                )
                .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Slot", slot_id))
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_SLOT_BY_ID, [&id_str], row_to_slot)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Slot", id.to_string()))
    }

    async fn list_doctor_slots(&self, doctor_id: Uuid, from: NaiveDate) -> Result<Vec<SlotListing>> {
        let doctor_id = doctor_id.to_string();
        let from = format_date(&from);

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_DOCTOR_SLOT_LISTINGS)
                    .map_err(wrap_err)?;
                let listings = stmt
                    .query_map([&doctor_id, &from], row_to_slot_listing)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(listings)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Slot"))
    }

    async fn available_slots(&self, doctor_id: Uuid, now: NaiveDateTime) -> Result<Vec<Slot>> {
        let doctor_id = doctor_id.to_string();
        let now = format_slot_moment(&now);

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_AVAILABLE_SLOTS)
                    .map_err(wrap_err)?;
                let slots = stmt
                    .query_map([&doctor_id, &now], row_to_slot)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(slots)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Slot"))
    }

    async fn delete_slot(&self, doctor_id: Uuid, slot_id: Uuid) -> Result<()> {
        let doctor_id = doctor_id.to_string();
        let slot_id_str = slot_id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let active: i64 = tx
                    .query_row(
                        schema::COUNT_ACTIVE_APPOINTMENTS_FOR_SLOT,
                        [&slot_id_str],
                        |row| row.get(0),
                    )
                    .map_err(wrap_err)?;
                if active > 0 {
                    return Err(domain_err(RepositoryError::conflict(
                        "This slot has an active appointment and cannot be deleted",
                    )));
                }

                let rows = tx
                    .execute(schema::DELETE_SLOT, [&slot_id_str, &doctor_id])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                }

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Slot", slot_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use mediverse_core::clinic::AppointmentStatus;
    use mediverse_core::storage::AppointmentRepository;

    use super::super::fixtures::*;
    use super::*;

    #[tokio::test]
    async fn test_overlapping_slot_is_conflict() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let day = tomorrow();
        slot(&repo, &house, day, 9).await;

        let overlapping = Slot::new(house.id, day, time(9, 15), time(9, 45));
        let result = repo.create_slot(&overlapping).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        // Touching the end of the existing slot is fine.
        let adjacent = Slot::new(house.id, day, time(9, 30), time(10, 0));
        repo.create_slot(&adjacent).await.unwrap();

        // Other doctors are independent.
        let wilson = doctor(&repo, "Wilson").await;
        let same_time = Slot::new(wilson.id, day, time(9, 0), time(9, 30));
        repo.create_slot(&same_time).await.unwrap();
    }

    #[tokio::test]
    async fn test_booked_slot_is_never_available() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let day = tomorrow();
        let booked = slot(&repo, &house, day, 9).await;
        let free = slot(&repo, &house, day, 10).await;

        booking(&repo, &ann, &booked).await;

        let available = repo.available_slots(house.id, wall_clock()).await.unwrap();
        assert_eq!(available.iter().map(|s| s.id).collect::<Vec<_>>(), vec![free.id]);
    }

    #[tokio::test]
    async fn test_canceling_releases_the_slot() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let booked = slot(&repo, &house, tomorrow(), 9).await;
        let appointment = booking(&repo, &ann, &booked).await;

        repo.transition_appointment(
            appointment.id,
            AppointmentStatus::Pending,
            AppointmentStatus::Canceled,
        )
        .await
        .unwrap();

        let available = repo.available_slots(house.id, wall_clock()).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, booked.id);
    }

    #[tokio::test]
    async fn test_past_slots_are_not_available() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let day = tomorrow();
        slot(&repo, &house, day, 9).await;
        let later = slot(&repo, &house, day, 11).await;

        let moment = day.and_time(time(10, 0));
        let available = repo.available_slots(house.id, moment).await.unwrap();
        assert_eq!(available.iter().map(|s| s.id).collect::<Vec<_>>(), vec![later.id]);

        // A slot starting exactly now is no longer bookable.
        let at_start = day.and_time(time(11, 0));
        assert!(repo.available_slots(house.id, at_start).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_flags_booked_slots() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let day = tomorrow();
        let booked = slot(&repo, &house, day, 9).await;
        slot(&repo, &house, day, 10).await;
        booking(&repo, &ann, &booked).await;

        let listings = repo.list_doctor_slots(house.id, day).await.unwrap();
        assert_eq!(listings.len(), 2);
        assert!(listings[0].booked);
        assert!(!listings[1].booked);

        let after = repo
            .list_doctor_slots(house.id, day + Duration::days(1))
            .await
            .unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_delete_slot_rules() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let wilson = doctor(&repo, "Wilson").await;
        let ann = patient(&repo, "Ann").await;
        let booked = slot(&repo, &house, tomorrow(), 9).await;
        let free = slot(&repo, &house, tomorrow(), 10).await;
        booking(&repo, &ann, &booked).await;

        let result = repo.delete_slot(house.id, booked.id).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        // Someone else's slot looks missing.
        let result = repo.delete_slot(wilson.id, free.id).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

        repo.delete_slot(house.id, free.id).await.unwrap();
        assert!(repo.get_slot(free.id).await.unwrap().is_none());
    }
}
