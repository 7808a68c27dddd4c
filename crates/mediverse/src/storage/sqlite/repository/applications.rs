use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediverse_core::clinic::{ApplicationDetail, ApplicationStatus, DoctorApplication};
use mediverse_core::storage::{ApplicationRepository, RepositoryError, Result};
use rusqlite::{OptionalExtension, Transaction};
use uuid::Uuid;

use super::super::conversions::{format_datetime, row_to_application_detail};
use super::super::error::{
    domain_err, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err,
};
use super::super::schema;
use super::SqliteRepository;

/// Marks a pending application decided, failing if it is missing or no
/// longer pending.
fn decide(
    tx: &Transaction<'_>,
    id: &str,
    status: ApplicationStatus,
    note: Option<&str>,
    reviewed_at: &str,
) -> tokio_rusqlite::Result<ApplicationDetail> {
    let current = tx
        .query_row(schema::SELECT_APPLICATION_BY_ID, [id], row_to_application_detail)
        .optional()
        .map_err(wrap_err)?
        .ok_or_else(|| domain_err(RepositoryError::not_found("DoctorApplication", id)))?;

    if current.application.status != ApplicationStatus::Pending {
        return Err(domain_err(RepositoryError::conflict(format!(
            "This application was already {}",
            current.application.status
        ))));
    }

    tx.execute(
        schema::DECIDE_APPLICATION,
        rusqlite::params![id, status.as_str(), note, reviewed_at],
    )
    .map_err(wrap_err)?;

    let mut decided = current;
    decided.application.status = status;
    decided.application.review_note = note.map(str::to_string);
    Ok(decided)
}

#[async_trait]
impl ApplicationRepository for SqliteRepository {
    async fn create_application(&self, application: &DoctorApplication) -> Result<()> {
        let application = application.clone();
        let user_id = application.user_id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let pending: i64 = tx
                    .query_row(
                        schema::COUNT_PENDING_APPLICATIONS_FOR_USER,
                        [application.user_id.to_string()],
                        |row| row.get(0),
                    )
                    .map_err(wrap_err)?;
                if pending > 0 {
                    return Err(domain_err(RepositoryError::conflict(
                        "You already have an application under review",
                    )));
                }

                tx.execute(
                    schema::INSERT_APPLICATION,
                    rusqlite::params![
                        application.id.to_string(),
                        application.user_id.to_string(),
                        application.specialization_id.to_string(),
                        application.qualification,
                        application.experience_years,
                        application.license_number,
                        application.bio,
                        application.document,
                        application.status.as_str(),
                        application.review_note,
                        format_datetime(&application.created_at),
                        application.reviewed_at.as_ref().map(format_datetime),
                    ],
                )
                .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "DoctorApplication", user_id))
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_APPLICATION_BY_ID,
                    [&id_str],
                    row_to_application_detail,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "DoctorApplication", id.to_string()))
    }

    async fn latest_application_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ApplicationDetail>> {
        let user_id = user_id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_LATEST_APPLICATION_FOR_USER,
                    [&user_id],
                    row_to_application_detail,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "DoctorApplication"))
    }

    async fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationDetail>> {
        let status = status.map(|s| s.as_str());

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_APPLICATIONS).map_err(wrap_err)?;
                let applications = stmt
                    .query_map([status], row_to_application_detail)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(applications)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "DoctorApplication"))
    }

    async fn approve_application(&self, id: Uuid, now: DateTime<Utc>) -> Result<ApplicationDetail> {
        let id_str = id.to_string();
        let reviewed_at = format_datetime(&now);

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let mut decided =
                    decide(&tx, &id_str, ApplicationStatus::Approved, None, &reviewed_at)?;
                tx.execute(
                    schema::PROMOTE_TO_DOCTOR,
                    rusqlite::params![
                        decided.application.user_id.to_string(),
                        decided.application.specialization_id.to_string(),
                        reviewed_at,
                    ],
                )
                .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                decided.application.reviewed_at = Some(now);
                Ok(decided)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "DoctorApplication", id.to_string()))
    }

    async fn reject_application(
        &self,
        id: Uuid,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationDetail> {
        let id_str = id.to_string();
        let reviewed_at = format_datetime(&now);

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let mut decided = decide(
                    &tx,
                    &id_str,
                    ApplicationStatus::Rejected,
                    note.as_deref(),
                    &reviewed_at,
                )?;

                tx.commit().map_err(wrap_err)?;
                decided.application.reviewed_at = Some(now);
                Ok(decided)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "DoctorApplication", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use mediverse_core::clinic::Role;
    use mediverse_core::storage::UserRepository;

    use super::super::fixtures::*;
    use super::*;

    fn application(user_id: Uuid, specialization_id: Uuid) -> DoctorApplication {
        DoctorApplication {
            id: Uuid::new_v4(),
            user_id,
            specialization_id,
            qualification: "MD".to_string(),
            experience_years: 5,
            license_number: "LIC-1".to_string(),
            bio: None,
            document: "documents/license.pdf".to_string(),
            status: ApplicationStatus::Pending,
            review_note: None,
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    #[tokio::test]
    async fn test_only_one_pending_application_per_user() {
        let repo = repo().await;
        let ann = patient(&repo, "Ann").await;
        let cardiology = specialization(&repo, "Cardiology").await;

        repo.create_application(&application(ann.id, cardiology.id))
            .await
            .unwrap();
        let second = repo
            .create_application(&application(ann.id, cardiology.id))
            .await;
        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_approve_promotes_applicant() {
        let repo = repo().await;
        let ann = patient(&repo, "Ann").await;
        let cardiology = specialization(&repo, "Cardiology").await;
        let app = application(ann.id, cardiology.id);
        repo.create_application(&app).await.unwrap();

        let decided = repo.approve_application(app.id, Utc::now()).await.unwrap();
        assert_eq!(decided.application.status, ApplicationStatus::Approved);
        assert_eq!(decided.applicant_email, "ann@example.com");
        assert!(decided.application.reviewed_at.is_some());

        let user = repo.get_user(ann.id).await.unwrap().unwrap();
        assert_eq!(user.role, Role::Doctor);
        assert_eq!(user.specialization_id, Some(cardiology.id));
    }

    #[tokio::test]
    async fn test_only_pending_applications_can_be_decided() {
        let repo = repo().await;
        let ann = patient(&repo, "Ann").await;
        let cardiology = specialization(&repo, "Cardiology").await;
        let app = application(ann.id, cardiology.id);
        repo.create_application(&app).await.unwrap();

        let rejected = repo
            .reject_application(app.id, Some("Blurry scan".to_string()), Utc::now())
            .await
            .unwrap();
        assert_eq!(rejected.application.review_note.as_deref(), Some("Blurry scan"));

        let again = repo.approve_application(app.id, Utc::now()).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));

        let user = repo.get_user(ann.id).await.unwrap().unwrap();
        assert_eq!(user.role, Role::Patient);

        // A rejected applicant may apply again.
        repo.create_application(&application(ann.id, cardiology.id))
            .await
            .unwrap();
        let latest = repo.latest_application_for_user(ann.id).await.unwrap().unwrap();
        assert_eq!(latest.application.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = repo().await;
        let ann = patient(&repo, "Ann").await;
        let bob = patient(&repo, "Bob").await;
        let cardiology = specialization(&repo, "Cardiology").await;
        let first = application(ann.id, cardiology.id);
        repo.create_application(&first).await.unwrap();
        repo.create_application(&application(bob.id, cardiology.id))
            .await
            .unwrap();
        repo.reject_application(first.id, None, Utc::now()).await.unwrap();

        let pending = repo
            .list_applications(Some(ApplicationStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].applicant_name, "Bob");
        assert_eq!(repo.list_applications(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deciding_unknown_application_is_not_found() {
        let repo = repo().await;
        let result = repo.approve_application(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }
}
