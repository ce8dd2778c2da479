//! Chat trigger storage. Written by the admin surface, read by the engine.

use sqlx::SqlitePool;

use crate::models::ChatTrigger;
use crate::{DatabaseError, Result};

/// Fields for creating a trigger.
#[derive(Debug, Clone)]
pub struct NewTrigger {
    pub chat_id: i64,
    pub kind: String,
    pub keywords: Option<Vec<String>>,
    pub probability: Option<f64>,
    pub cooldown_sec: i64,
    pub daily_cap: i64,
    pub enabled: bool,
}

const TRIGGER_COLUMNS: &str =
    "id, chat_id, kind, keywords, probability, cooldown_sec, daily_cap, enabled, created_at";

/// Create a trigger or replace the existing one of the same kind.
pub async fn upsert_trigger(pool: &SqlitePool, trigger: &NewTrigger) -> Result<ChatTrigger> {
    let keywords_json = trigger
        .keywords
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;

    sqlx::query(
        r#"
        INSERT INTO chat_triggers (chat_id, kind, keywords, probability, cooldown_sec, daily_cap, enabled)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(chat_id, kind) DO UPDATE SET
            keywords = excluded.keywords,
            probability = excluded.probability,
            cooldown_sec = excluded.cooldown_sec,
            daily_cap = excluded.daily_cap,
            enabled = excluded.enabled
        "#,
    )
    .bind(trigger.chat_id)
    .bind(&trigger.kind)
    .bind(keywords_json)
    .bind(trigger.probability)
    .bind(trigger.cooldown_sec)
    .bind(trigger.daily_cap)
    .bind(trigger.enabled)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, ChatTrigger>(&format!(
        r#"
        SELECT {}
        FROM chat_triggers
        WHERE chat_id = ? AND kind = ?
        "#,
        TRIGGER_COLUMNS
    ))
    .bind(trigger.chat_id)
    .bind(&trigger.kind)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Enabled triggers for a chat, oldest first.
pub async fn enabled_for_chat(pool: &SqlitePool, chat_id: i64) -> Result<Vec<ChatTrigger>> {
    let triggers = sqlx::query_as::<_, ChatTrigger>(&format!(
        r#"
        SELECT {}
        FROM chat_triggers
        WHERE chat_id = ? AND enabled = 1
        ORDER BY created_at ASC, id ASC
        "#,
        TRIGGER_COLUMNS
    ))
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    Ok(triggers)
}

/// Delete a trigger by chat and kind.
pub async fn delete_trigger(pool: &SqlitePool, chat_id: i64, kind: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM chat_triggers
        WHERE chat_id = ? AND kind = ?
        "#,
    )
    .bind(chat_id)
    .bind(kind)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "chat trigger",
            id: format!("{}:{}", chat_id, kind),
        });
    }

    Ok(())
}
