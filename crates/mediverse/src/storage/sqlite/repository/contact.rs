use async_trait::async_trait;
use mediverse_core::clinic::ContactMessage;
use mediverse_core::storage::{ContactRepository, Result};
use uuid::Uuid;

use super::super::conversions::{format_datetime, row_to_contact_message};
use super::super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err};
use super::super::schema;
use super::SqliteRepository;

#[async_trait]
impl ContactRepository for SqliteRepository {
    async fn create_contact_message(&self, message: &ContactMessage) -> Result<()> {
        let message = message.clone();
        let id = message.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_CONTACT_MESSAGE,
                    rusqlite::params![
                        message.id.to_string(),
                        message.name,
                        message.email,
                        message.subject,
                        message.body,
                        message.is_resolved,
                        format_datetime(&message.created_at),
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "ContactMessage", id))
    }

    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_CONTACT_MESSAGES)
                    .map_err(wrap_err)?;
                let messages = stmt
                    .query_map([], row_to_contact_message)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(messages)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "ContactMessage"))
    }

    async fn resolve_contact_message(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::RESOLVE_CONTACT_MESSAGE, [&id_str])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "ContactMessage", id.to_string()))
    }
}
