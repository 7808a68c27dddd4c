use async_trait::async_trait;
use mediverse_core::clinic::{AppointmentStatus, Rating, RatingSummary, RatingView};
use mediverse_core::storage::{RatingRepository, RepositoryError, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::super::conversions::{format_datetime, row_to_rating, row_to_rating_view};
use super::super::error::{
    domain_err, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err,
};
use super::super::schema;
use super::SqliteRepository;

#[async_trait]
impl RatingRepository for SqliteRepository {
    async fn create_rating(&self, rating: &Rating) -> Result<()> {
        let rating = rating.clone();
        let appointment_id = rating.appointment_id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let (status, patient_id, doctor_id): (String, String, String) = tx
                    .query_row(
                        schema::SELECT_APPOINTMENT_PARTIES,
                        [rating.appointment_id.to_string()],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()
                    .map_err(wrap_err)?
                    .ok_or_else(|| {
                        domain_err(RepositoryError::not_found(
                            "Appointment",
                            rating.appointment_id,
                        ))
                    })?;

                if patient_id != rating.patient_id.to_string()
                    || doctor_id != rating.doctor_id.to_string()
                {
                    return Err(domain_err(RepositoryError::not_found(
                        "Appointment",
                        rating.appointment_id,
                    )));
                }
                if status != AppointmentStatus::Completed.as_str() {
                    return Err(domain_err(RepositoryError::conflict(
                        "Only completed appointments can be rated",
                    )));
                }

                let existing: i64 = tx
                    .query_row(
                        schema::COUNT_RATINGS_FOR_APPOINTMENT,
                        [rating.appointment_id.to_string()],
                        |row| row.get(0),
                    )
                    .map_err(wrap_err)?;
                if existing > 0 {
                    return Err(domain_err(RepositoryError::conflict(
                        "You have already rated this appointment",
                    )));
                }

                tx.execute(
                    schema::INSERT_RATING,
                    rusqlite::params![
                        rating.id.to_string(),
                        rating.appointment_id.to_string(),
                        rating.patient_id.to_string(),
                        rating.doctor_id.to_string(),
                        rating.score,
                        rating.comment,
                        format_datetime(&rating.created_at),
                    ],
                )
                .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Rating", appointment_id))
    }

    async fn rating_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Rating>> {
        let appointment_id = appointment_id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_RATING_FOR_APPOINTMENT,
                    [&appointment_id],
                    row_to_rating,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Rating"))
    }

    async fn list_doctor_ratings(&self, doctor_id: Uuid) -> Result<Vec<RatingView>> {
        let doctor_id = doctor_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_DOCTOR_RATINGS).map_err(wrap_err)?;
                let ratings = stmt
                    .query_map([&doctor_id], row_to_rating_view)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(ratings)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Rating"))
    }

    async fn doctor_rating_summary(&self, doctor_id: Uuid) -> Result<RatingSummary> {
        let doctor_id = doctor_id.to_string();

        self.conn
            .call(move |conn| {
                let (total, count): (i64, i64) = conn
                    .query_row(schema::SELECT_DOCTOR_RATING_TOTALS, [&doctor_id], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })
                    .map_err(wrap_err)?;
                Ok(RatingSummary::from_totals(total as u32, count as u32))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Rating"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mediverse_core::clinic::{Appointment, User};

    use super::super::fixtures::*;
    use super::*;

    fn rating(appointment: &Appointment, patient: &User, score: u8) -> Rating {
        Rating {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            patient_id: patient.id,
            doctor_id: appointment.doctor_id,
            score,
            comment: Some("Great".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_rating_is_accepted_once_per_appointment() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let appointment = completed_appointment(&repo, &ann, &house, 9).await;

        repo.create_rating(&rating(&appointment, &ann, 5)).await.unwrap();
        let again = repo.create_rating(&rating(&appointment, &ann, 1)).await;
        assert_eq!(
            again.unwrap_err(),
            RepositoryError::conflict("You have already rated this appointment")
        );

        let summary = repo.doctor_rating_summary(house.id).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, Some(5.0));
    }

    #[tokio::test]
    async fn test_only_completed_appointments_can_be_rated() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let pending = booking(&repo, &ann, &slot(&repo, &house, tomorrow(), 9).await).await;

        let result = repo.create_rating(&rating(&pending, &ann, 4)).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert!(repo.rating_for_appointment(pending.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_patients_cannot_rate() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;
        let bob = patient(&repo, "Bob").await;
        let appointment = completed_appointment(&repo, &ann, &house, 9).await;

        let result = repo.create_rating(&rating(&appointment, &bob, 1)).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_summary_and_listing() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let ann = patient(&repo, "Ann").await;

        assert_eq!(
            repo.doctor_rating_summary(house.id).await.unwrap(),
            RatingSummary {
                average: None,
                count: 0
            }
        );

        for (hour, score) in [(9, 5), (10, 4), (11, 4)] {
            let appointment = completed_appointment(&repo, &ann, &house, hour).await;
            repo.create_rating(&rating(&appointment, &ann, score))
                .await
                .unwrap();
        }

        let summary = repo.doctor_rating_summary(house.id).await.unwrap();
        assert_eq!(summary.average, Some(4.3));
        assert_eq!(summary.count, 3);

        let views = repo.list_doctor_ratings(house.id).await.unwrap();
        assert_eq!(views.len(), 3);
        assert!(views.iter().all(|v| v.patient_name == "Ann"));
    }
}
