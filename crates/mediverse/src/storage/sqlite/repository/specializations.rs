use async_trait::async_trait;
use mediverse_core::clinic::{Specialization, SpecializationInput, SpecializationSummary};
use mediverse_core::storage::{RepositoryError, Result, SpecializationRepository};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::super::conversions::{
    format_datetime, row_to_specialization, row_to_specialization_summary,
};
use super::super::error::{
    domain_err, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err,
};
use super::super::schema;
use super::SqliteRepository;

#[async_trait]
impl SpecializationRepository for SqliteRepository {
    async fn list_specializations(&self) -> Result<Vec<SpecializationSummary>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_SPECIALIZATION_SUMMARIES)
                    .map_err(wrap_err)?;
                let summaries = stmt
                    .query_map([], row_to_specialization_summary)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(summaries)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Specialization"))
    }

    async fn get_specialization(&self, id: Uuid) -> Result<Option<Specialization>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_SPECIALIZATION_BY_ID,
                    [&id_str],
                    row_to_specialization,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Specialization", id.to_string()))
    }

    async fn create_specialization(&self, specialization: &Specialization) -> Result<()> {
        let specialization = specialization.clone();
        let name = specialization.name.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_SPECIALIZATION,
                    rusqlite::params![
                        specialization.id.to_string(),
                        specialization.name,
                        specialization.description,
                        format_datetime(&specialization.created_at),
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Specialization", name))
    }

    async fn update_specialization(&self, id: Uuid, input: &SpecializationInput) -> Result<()> {
        let id_str = id.to_string();
        let input = input.clone();
        let name = input.name.clone();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_SPECIALIZATION,
                        rusqlite::params![id_str, input.name, input.description],
                    )
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(domain_err(RepositoryError::not_found("Specialization", id_str)))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Specialization", name))
    }

    async fn delete_specialization(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let references: i64 = tx
                    .query_row(schema::COUNT_SPECIALIZATION_REFERENCES, [&id_str], |row| {
                        row.get(0)
                    })
                    .map_err(wrap_err)?;
                if references > 0 {
                    return Err(domain_err(RepositoryError::conflict(
                        "This specialization is still used by doctors or applications",
                    )));
                }

                let rows = tx
                    .execute(schema::DELETE_SPECIALIZATION, [&id_str])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                }

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Specialization", id.to_string()))
    }
}
