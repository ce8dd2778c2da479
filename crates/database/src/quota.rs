//! Per-subject quota state.
//!
//! Counters advance only through [`commit_reply`], which the engine calls
//! after a successful dispatch. Day rollover is handled lazily inside the
//! upsert: a commit on a new calendar day resets the daily counter to one
//! instead of incrementing the stale value.

use sqlx::SqlitePool;

use crate::models::{QuotaState, Subject};
use crate::Result;

const QUOTA_COLUMNS: &str = "account_id, subject_kind, subject_id, replies_today, \
                             new_contact_replies, last_reply_date, last_reply_at, last_message_id";

/// Get the quota state for a subject, if any replies were ever committed.
pub async fn get_state(
    pool: &SqlitePool,
    account_id: i64,
    subject: &Subject,
) -> Result<Option<QuotaState>> {
    let state = sqlx::query_as::<_, QuotaState>(&format!(
        r#"
        SELECT {}
        FROM quota_state
        WHERE account_id = ? AND subject_kind = ? AND subject_id = ?
        "#,
        QUOTA_COLUMNS
    ))
    .bind(account_id)
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .fetch_optional(pool)
    .await?;

    Ok(state)
}

/// Record a sent reply in a single atomic upsert.
///
/// `today` is the calendar day (YYYY-MM-DD) and `now` the RFC 3339 send
/// time. When `new_contact` is set the cumulative new-contact counter
/// advances as well; it never resets on rollover.
pub async fn commit_reply(
    pool: &SqlitePool,
    account_id: i64,
    subject: &Subject,
    today: &str,
    now: &str,
    last_message_id: Option<i64>,
    new_contact: bool,
) -> Result<QuotaState> {
    let contact_delta: i64 = if new_contact { 1 } else { 0 };

    let state = sqlx::query_as::<_, QuotaState>(&format!(
        r#"
        INSERT INTO quota_state
            (account_id, subject_kind, subject_id, replies_today, new_contact_replies,
             last_reply_date, last_reply_at, last_message_id)
        VALUES (?, ?, ?, 1, ?, ?, ?, ?)
        ON CONFLICT(account_id, subject_kind, subject_id) DO UPDATE SET
            replies_today = CASE
                WHEN quota_state.last_reply_date = excluded.last_reply_date
                    THEN quota_state.replies_today + 1
                ELSE 1
            END,
            new_contact_replies = quota_state.new_contact_replies + ?,
            last_reply_date = excluded.last_reply_date,
            last_reply_at = excluded.last_reply_at,
            last_message_id = excluded.last_message_id
        RETURNING {}
        "#,
        QUOTA_COLUMNS
    ))
    .bind(account_id)
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .bind(contact_delta)
    .bind(today)
    .bind(now)
    .bind(last_message_id)
    .bind(contact_delta)
    .fetch_one(pool)
    .await?;

    Ok(state)
}

/// Total replies committed on the given calendar day, across all subjects.
pub async fn count_replies_today(pool: &SqlitePool, account_id: i64, today: &str) -> Result<i64> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(replies_today), 0)
        FROM quota_state
        WHERE account_id = ? AND last_reply_date = ?
        "#,
    )
    .bind(account_id)
    .bind(today)
    .fetch_one(pool)
    .await?;

    Ok(count.0)
}
