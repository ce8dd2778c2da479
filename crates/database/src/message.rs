//! Message log: append-only, both directions.

use sqlx::SqlitePool;

use crate::models::{StoredMessage, Subject};
use crate::Result;

/// Insert a message, ignoring duplicates.
///
/// Returns `true` if the row was inserted, `false` if a message with the
/// same `(subject, tg_message_id)` already exists. The caller uses this as
/// its exactly-once guard.
pub async fn save_message(
    pool: &SqlitePool,
    subject: &Subject,
    tg_message_id: i64,
    from_me: bool,
    date: &str,
    text: Option<&str>,
    reply_to_id: Option<i64>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (subject_kind, subject_id, tg_message_id, from_me, date, text, reply_to_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(subject_kind, subject_id, tg_message_id) DO NOTHING
        "#,
    )
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .bind(tg_message_id)
    .bind(from_me)
    .bind(date)
    .bind(text)
    .bind(reply_to_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Get a stored message by subject and Telegram message id.
pub async fn get_by_tg_id(
    pool: &SqlitePool,
    subject: &Subject,
    tg_message_id: i64,
) -> Result<Option<StoredMessage>> {
    let message = sqlx::query_as::<_, StoredMessage>(
        r#"
        SELECT id, subject_kind, subject_id, tg_message_id, from_me, date, text, reply_to_id, has_media
        FROM messages
        WHERE subject_kind = ? AND subject_id = ? AND tg_message_id = ?
        "#,
    )
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .bind(tg_message_id)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

/// The most recent messages for a subject, oldest first.
///
/// This is the bounded context window handed to the response generator.
pub async fn recent_for_subject(
    pool: &SqlitePool,
    subject: &Subject,
    limit: i64,
) -> Result<Vec<StoredMessage>> {
    let mut messages = sqlx::query_as::<_, StoredMessage>(
        r#"
        SELECT id, subject_kind, subject_id, tg_message_id, from_me, date, text, reply_to_id, has_media
        FROM messages
        WHERE subject_kind = ? AND subject_id = ?
        ORDER BY date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    messages.reverse();
    Ok(messages)
}

/// Whether the account itself sent the given message in this conversation.
///
/// Used by the reply-to-self group trigger.
pub async fn is_own_message(
    pool: &SqlitePool,
    subject: &Subject,
    tg_message_id: i64,
) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT 1
        FROM messages
        WHERE subject_kind = ? AND subject_id = ? AND tg_message_id = ? AND from_me = 1
        "#,
    )
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .bind(tg_message_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Total number of stored messages.
pub async fn count_messages(pool: &SqlitePool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}
