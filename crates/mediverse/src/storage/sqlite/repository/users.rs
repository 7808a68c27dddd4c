use async_trait::async_trait;
use mediverse_core::clinic::{DoctorSummary, ProfileUpdate, Role, User};
use mediverse_core::storage::{Result, UserRepository};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::super::conversions::{
    format_date, format_datetime, row_to_doctor_summary, row_to_user,
};
use super::super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err};
use super::super::schema;
use super::{now, SqliteRepository};

impl SqliteRepository {
    /// Runs a single-row update on `users` and reports a missing row as NotFound.
    async fn update_user_row(
        &self,
        id: Uuid,
        sql: &'static str,
        params: Vec<Box<dyn rusqlite::ToSql + Send>>,
    ) -> Result<()> {
        let id_str = id.to_string();
        self.conn
            .call(move |conn| {
                let mut all: Vec<&dyn rusqlite::ToSql> = vec![&id_str];
                all.extend(params.iter().map(|p| p.as_ref() as &dyn rusqlite::ToSql));
                let rows = conn.execute(sql, all.as_slice()).map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "User", id.to_string()))
    }
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_USER_BY_ID, [&id_str], row_to_user)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "User", id.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_USER_BY_EMAIL, [&email], row_to_user)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User"))
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let user = user.clone();
        let email = user.email.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_USER,
                    rusqlite::params![
                        user.id.to_string(),
                        user.name,
                        user.email,
                        user.password_hash,
                        user.role.as_str(),
                        user.phone,
                        user.gender,
                        user.date_of_birth.as_ref().map(format_date),
                        user.address,
                        user.bio,
                        user.profile_image,
                        user.specialization_id.map(|id| id.to_string()),
                        user.is_blocked,
                        user.is_deleted,
                        format_datetime(&user.created_at),
                        format_datetime(&user.updated_at),
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "User", email))
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<()> {
        self.update_user_row(
            id,
            schema::UPDATE_PROFILE,
            vec![
                Box::new(update.name.clone()),
                Box::new(update.phone.clone()),
                Box::new(update.gender.clone()),
                Box::new(update.date_of_birth.as_ref().map(format_date)),
                Box::new(update.address.clone()),
                Box::new(update.bio.clone()),
                Box::new(now()),
            ],
        )
        .await
    }

    async fn set_profile_image(&self, id: Uuid, image: &str) -> Result<()> {
        self.update_user_row(
            id,
            schema::UPDATE_PROFILE_IMAGE,
            vec![Box::new(image.to_string()), Box::new(now())],
        )
        .await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        self.update_user_row(
            id,
            schema::UPDATE_PASSWORD,
            vec![Box::new(password_hash.to_string()), Box::new(now())],
        )
        .await
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<()> {
        self.update_user_row(
            id,
            schema::UPDATE_BLOCKED,
            vec![Box::new(blocked), Box::new(now())],
        )
        .await
    }

    async fn soft_delete_user(&self, id: Uuid) -> Result<()> {
        self.update_user_row(id, schema::SOFT_DELETE_USER, vec![Box::new(now())])
            .await
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let role = role.map(|r| r.as_str());

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_USERS).map_err(wrap_err)?;
                let users = stmt
                    .query_map([role], row_to_user)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(users)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User"))
    }

    async fn list_doctors(&self, specialization_id: Option<Uuid>) -> Result<Vec<DoctorSummary>> {
        let specialization_id = specialization_id.map(|id| id.to_string());

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_DOCTORS).map_err(wrap_err)?;
                let doctors = stmt
                    .query_map([specialization_id], row_to_doctor_summary)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(doctors)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Doctor"))
    }

    async fn get_doctor(&self, id: Uuid) -> Result<Option<DoctorSummary>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_DOCTOR_BY_ID, [&id_str], row_to_doctor_summary)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Doctor", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use mediverse_core::clinic::Rating;
    use mediverse_core::storage::{RatingRepository, RepositoryError};

    use super::super::fixtures::*;
    use super::*;

    #[tokio::test]
    async fn test_user_create_and_get() {
        let repo = repo().await;
        let user = patient(&repo, "Ann").await;

        let by_id = repo.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ann@example.com");
        assert_eq!(by_id.role, Role::Patient);

        let by_email = repo.get_user_by_email("ann@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_already_exists() {
        let repo = repo().await;
        patient(&repo, "Ann").await;

        let twin = User::new_patient("Other Ann", "ann@example.com", "hash");
        let result = repo.create_user(&twin).await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_update_profile_round_trips_optional_fields() {
        let repo = repo().await;
        let user = patient(&repo, "Ann").await;

        let update = ProfileUpdate {
            name: "Ann Lee".to_string(),
            phone: Some("555-0100".to_string()),
            gender: None,
            date_of_birth: Some(date(1990, 4, 2)),
            address: None,
            bio: Some("Hello".to_string()),
        };
        repo.update_profile(user.id, &update).await.unwrap();

        let stored = repo.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ann Lee");
        assert_eq!(stored.date_of_birth, Some(date(1990, 4, 2)));
        assert_eq!(stored.bio.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let repo = repo().await;
        let result = repo.set_blocked(Uuid::new_v4(), true).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_users_filters_by_role_and_hides_deleted() {
        let repo = repo().await;
        let ann = patient(&repo, "Ann").await;
        let bob = patient(&repo, "Bob").await;
        doctor(&repo, "House").await;

        repo.soft_delete_user(bob.id).await.unwrap();

        let patients = repo.list_users(Some(Role::Patient)).await.unwrap();
        assert_eq!(patients.iter().map(|u| u.id).collect::<Vec<_>>(), vec![ann.id]);
        assert_eq!(repo.list_users(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_directory_hides_blocked_doctors_and_summarizes_ratings() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        let wilson = doctor(&repo, "Wilson").await;
        let ann = patient(&repo, "Ann").await;

        for (hour, score) in [(9, 5), (10, 4)] {
            let appointment = completed_appointment(&repo, &ann, &house, hour).await;
            let rating = Rating {
                id: Uuid::new_v4(),
                appointment_id: appointment.id,
                patient_id: ann.id,
                doctor_id: house.id,
                score,
                comment: None,
                created_at: chrono::Utc::now(),
            };
            repo.create_rating(&rating).await.unwrap();
        }
        repo.set_blocked(wilson.id, true).await.unwrap();

        let doctors = repo.list_doctors(None).await.unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].doctor.id, house.id);
        assert_eq!(doctors[0].rating.average, Some(4.5));
        assert_eq!(doctors[0].rating.count, 2);
        assert_eq!(doctors[0].specialization_name.as_deref(), Some("House Medicine"));

        assert!(repo.get_doctor(wilson.id).await.unwrap().is_none());
        assert!(repo.get_doctor(ann.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_directory_filters_by_specialization() {
        let repo = repo().await;
        let house = doctor(&repo, "House").await;
        doctor(&repo, "Wilson").await;

        let filtered = repo.list_doctors(house.specialization_id).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].doctor.name, "House");
    }
}
