//! Reply rule storage. Written by the admin surface, read by the engine.

use sqlx::SqlitePool;

use crate::models::{ReplyRule, Subject};
use crate::{DatabaseError, Result};

/// Fields for creating a rule.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub account_id: i64,
    pub subject: Subject,
    pub mode: String,
    pub template: Option<String>,
    pub prompt: Option<String>,
    pub min_interval_sec: i64,
    pub enabled: bool,
}

const RULE_COLUMNS: &str = "id, account_id, subject_kind, subject_id, mode, template, prompt, \
                            min_interval_sec, enabled, created_at";

/// Create a rule. Fails if one already exists for the subject.
pub async fn create_rule(pool: &SqlitePool, rule: &NewRule) -> Result<ReplyRule> {
    let result = sqlx::query(
        r#"
        INSERT INTO reply_rules (account_id, subject_kind, subject_id, mode, template, prompt, min_interval_sec, enabled)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(rule.account_id)
    .bind(rule.subject.kind.as_str())
    .bind(rule.subject.id)
    .bind(&rule.mode)
    .bind(&rule.template)
    .bind(&rule.prompt)
    .bind(rule.min_interval_sec)
    .bind(rule.enabled)
    .execute(pool)
    .await;

    match result {
        Ok(_) => get_for_subject(pool, rule.account_id, &rule.subject)
            .await?
            .ok_or(DatabaseError::NotFound {
                entity: "reply rule",
                id: rule.subject.to_string(),
            }),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(DatabaseError::AlreadyExists {
                entity: "reply rule",
                id: rule.subject.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a rule or replace the existing one for the subject.
pub async fn upsert_rule(pool: &SqlitePool, rule: &NewRule) -> Result<ReplyRule> {
    sqlx::query(
        r#"
        INSERT INTO reply_rules (account_id, subject_kind, subject_id, mode, template, prompt, min_interval_sec, enabled)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(account_id, subject_kind, subject_id) DO UPDATE SET
            mode = excluded.mode,
            template = excluded.template,
            prompt = excluded.prompt,
            min_interval_sec = excluded.min_interval_sec,
            enabled = excluded.enabled
        "#,
    )
    .bind(rule.account_id)
    .bind(rule.subject.kind.as_str())
    .bind(rule.subject.id)
    .bind(&rule.mode)
    .bind(&rule.template)
    .bind(&rule.prompt)
    .bind(rule.min_interval_sec)
    .bind(rule.enabled)
    .execute(pool)
    .await?;

    get_for_subject(pool, rule.account_id, &rule.subject)
        .await?
        .ok_or(DatabaseError::NotFound {
            entity: "reply rule",
            id: rule.subject.to_string(),
        })
}

/// Get the rule for a subject, if any.
pub async fn get_for_subject(
    pool: &SqlitePool,
    account_id: i64,
    subject: &Subject,
) -> Result<Option<ReplyRule>> {
    let rule = sqlx::query_as::<_, ReplyRule>(&format!(
        r#"
        SELECT {}
        FROM reply_rules
        WHERE account_id = ? AND subject_kind = ? AND subject_id = ?
        "#,
        RULE_COLUMNS
    ))
    .bind(account_id)
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .fetch_optional(pool)
    .await?;

    Ok(rule)
}

/// List all rules for an account, newest first.
pub async fn list_rules(pool: &SqlitePool, account_id: i64) -> Result<Vec<ReplyRule>> {
    let rules = sqlx::query_as::<_, ReplyRule>(&format!(
        r#"
        SELECT {}
        FROM reply_rules
        WHERE account_id = ?
        ORDER BY created_at DESC
        "#,
        RULE_COLUMNS
    ))
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(rules)
}

/// Delete the rule for a subject.
pub async fn delete_rule(pool: &SqlitePool, account_id: i64, subject: &Subject) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM reply_rules
        WHERE account_id = ? AND subject_kind = ? AND subject_id = ?
        "#,
    )
    .bind(account_id)
    .bind(subject.kind.as_str())
    .bind(subject.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "reply rule",
            id: subject.to_string(),
        });
    }

    Ok(())
}

/// Count rules for an account, optionally only enabled ones.
pub async fn count_rules(pool: &SqlitePool, account_id: i64, enabled_only: bool) -> Result<i64> {
    let query = if enabled_only {
        "SELECT COUNT(*) FROM reply_rules WHERE account_id = ? AND enabled = 1"
    } else {
        "SELECT COUNT(*) FROM reply_rules WHERE account_id = ?"
    };

    let count: (i64,) = sqlx::query_as(query).bind(account_id).fetch_one(pool).await?;
    Ok(count.0)
}
