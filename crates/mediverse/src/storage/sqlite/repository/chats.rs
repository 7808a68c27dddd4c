use async_trait::async_trait;
use mediverse_core::clinic::{Chat, ChatDetail, ChatStatus, Message, MessageView};
use mediverse_core::storage::{ChatRepository, RepositoryError, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::super::conversions::{
    format_datetime, row_to_chat, row_to_chat_detail, row_to_message_view,
};
use super::super::error::{
    domain_err, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err,
};
use super::super::schema;
use super::{now, SqliteRepository};

#[async_trait]
impl ChatRepository for SqliteRepository {
    async fn open_chat(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        first_message: Option<String>,
    ) -> Result<Chat> {
        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let existing = tx
                    .query_row(
                        schema::SELECT_OPEN_CHAT_FOR_PAIR,
                        [patient_id.to_string(), doctor_id.to_string()],
                        row_to_chat,
                    )
                    .optional()
                    .map_err(wrap_err)?;
                // Pending and accepted chats both take the opening message.
                let chat = match existing {
                    Some(chat) => chat,
                    None => {
                        let chat = Chat::new(patient_id, doctor_id);
                        tx.execute(
                            schema::INSERT_CHAT,
                            rusqlite::params![
                                chat.id.to_string(),
                                chat.patient_id.to_string(),
                                chat.doctor_id.to_string(),
                                chat.status.as_str(),
                                format_datetime(&chat.created_at),
                                format_datetime(&chat.updated_at),
                            ],
                        )
                        .map_err(wrap_err)?;
                        chat
                    }
                };

                if let Some(body) = first_message {
                    let message = Message::new(chat.id, patient_id, body);
                    let created_at = format_datetime(&message.created_at);
                    tx.execute(
                        schema::INSERT_MESSAGE,
                        rusqlite::params![
                            message.id.to_string(),
                            message.chat_id.to_string(),
                            message.sender_id.to_string(),
                            message.body,
                            created_at,
                        ],
                    )
                    .map_err(wrap_err)?;
                    tx.execute(
                        schema::TOUCH_CHAT,
                        rusqlite::params![message.chat_id.to_string(), created_at],
                    )
                    .map_err(wrap_err)?;
                }

                tx.commit().map_err(wrap_err)?;
                Ok(chat)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Chat"))
    }

    async fn get_chat(&self, id: Uuid) -> Result<Option<ChatDetail>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_CHAT_BY_ID, [&id_str], row_to_chat_detail)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Chat", id.to_string()))
    }

    async fn list_user_chats(&self, user_id: Uuid) -> Result<Vec<ChatDetail>> {
        let user_id = user_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_USER_CHATS).map_err(wrap_err)?;
                let chats = stmt
                    .query_map([&user_id], row_to_chat_detail)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(chats)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Chat"))
    }

    async fn transition_chat(&self, id: Uuid, from: ChatStatus, to: ChatStatus) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::TRANSITION_CHAT,
                        rusqlite::params![id_str, from.as_str(), to.as_str(), now()],
                    )
                    .map_err(wrap_err)?;
                if rows > 0 {
                    return Ok(());
                }

                let current: Option<String> = conn
                    .query_row(schema::SELECT_CHAT_STATUS, [&id_str], |row| row.get(0))
                    .optional()
                    .map_err(wrap_err)?;
                match current {
                    None => Err(wrap_err(rusqlite::Error::QueryReturnedNoRows)),
                    Some(status) => Err(domain_err(RepositoryError::conflict(format!(
                        "This chat is already {status}"
                    )))),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Chat", id.to_string()))
    }

    async fn add_message(&self, message: &Message) -> Result<()> {
        let message = message.clone();
        let chat_id = message.chat_id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let status: String = tx
                    .query_row(
                        schema::SELECT_CHAT_STATUS,
                        [message.chat_id.to_string()],
                        |row| row.get(0),
                    )
                    .map_err(wrap_err)?;
                if status != ChatStatus::Accepted.as_str() {
                    return Err(domain_err(RepositoryError::conflict(format!(
                        "Messages can only be sent in an accepted chat (this one is {status})"
                    ))));
                }

                let created_at = format_datetime(&message.created_at);
                tx.execute(
                    schema::INSERT_MESSAGE,
                    rusqlite::params![
                        message.id.to_string(),
                        message.chat_id.to_string(),
                        message.sender_id.to_string(),
                        message.body,
                        created_at,
                    ],
                )
                .map_err(wrap_err)?;
                tx.execute(
                    schema::TOUCH_CHAT,
                    rusqlite::params![message.chat_id.to_string(), created_at],
                )
                .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Chat", chat_id))
    }

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<MessageView>> {
        let chat_id = chat_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_CHAT_MESSAGES).map_err(wrap_err)?;
                let messages = stmt
                    .query_map([&chat_id], row_to_message_view)
                    .map_err(wrap_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(wrap_err)?;
                Ok(messages)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Message"))
    }
}
