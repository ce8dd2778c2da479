//! Group chat storage.

use sqlx::SqlitePool;

use crate::models::Chat;
use crate::{DatabaseError, Result};

/// Create or refresh a chat row, preserving the internal id on conflict.
pub async fn ensure_chat(pool: &SqlitePool, tg_chat_id: i64, title: Option<&str>) -> Result<Chat> {
    sqlx::query(
        r#"
        INSERT INTO chats (tg_chat_id, title)
        VALUES (?, ?)
        ON CONFLICT(tg_chat_id) DO UPDATE SET
            title = COALESCE(excluded.title, chats.title)
        "#,
    )
    .bind(tg_chat_id)
    .bind(title)
    .execute(pool)
    .await?;

    get_chat_by_tg_id(pool, tg_chat_id).await
}

/// Get a chat by internal id.
pub async fn get_chat(pool: &SqlitePool, id: i64) -> Result<Chat> {
    sqlx::query_as::<_, Chat>(
        r#"
        SELECT id, tg_chat_id, title, created_at
        FROM chats
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DatabaseError::NotFound {
        entity: "chat",
        id: id.to_string(),
    })
}

/// Get a chat by Telegram chat id.
pub async fn get_chat_by_tg_id(pool: &SqlitePool, tg_chat_id: i64) -> Result<Chat> {
    sqlx::query_as::<_, Chat>(
        r#"
        SELECT id, tg_chat_id, title, created_at
        FROM chats
        WHERE tg_chat_id = ?
        "#,
    )
    .bind(tg_chat_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DatabaseError::NotFound {
        entity: "chat",
        id: tg_chat_id.to_string(),
    })
}
