//! Peer storage: upsert on every observed message, personal-folder sync.

use sqlx::SqlitePool;

use crate::models::Peer;
use crate::{DatabaseError, Result};

/// Profile fields observed on an incoming message or dialog sync.
#[derive(Debug, Clone)]
pub struct PeerProfile {
    pub tg_peer_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

/// Create or refresh a peer row, preserving the internal id and the
/// `in_personal` flag on conflict.
pub async fn upsert_peer(pool: &SqlitePool, profile: &PeerProfile) -> Result<Peer> {
    sqlx::query(
        r#"
        INSERT INTO peers (tg_peer_id, username, first_name, last_name, is_bot)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(tg_peer_id) DO UPDATE SET
            username = excluded.username,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            updated_at = datetime('now')
        "#,
    )
    .bind(profile.tg_peer_id)
    .bind(&profile.username)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(profile.is_bot)
    .execute(pool)
    .await?;

    get_peer_by_tg_id(pool, profile.tg_peer_id).await
}

/// Get a peer by internal id.
pub async fn get_peer(pool: &SqlitePool, id: i64) -> Result<Peer> {
    sqlx::query_as::<_, Peer>(
        r#"
        SELECT id, tg_peer_id, username, first_name, last_name, is_bot, in_personal,
               created_at, updated_at
        FROM peers
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DatabaseError::NotFound {
        entity: "peer",
        id: id.to_string(),
    })
}

/// Get a peer by Telegram user id.
pub async fn get_peer_by_tg_id(pool: &SqlitePool, tg_peer_id: i64) -> Result<Peer> {
    sqlx::query_as::<_, Peer>(
        r#"
        SELECT id, tg_peer_id, username, first_name, last_name, is_bot, in_personal,
               created_at, updated_at
        FROM peers
        WHERE tg_peer_id = ?
        "#,
    )
    .bind(tg_peer_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DatabaseError::NotFound {
        entity: "peer",
        id: tg_peer_id.to_string(),
    })
}

/// List non-bot peers, most recently active first.
pub async fn list_peers(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Peer>> {
    let peers = sqlx::query_as::<_, Peer>(
        r#"
        SELECT id, tg_peer_id, username, first_name, last_name, is_bot, in_personal,
               created_at, updated_at
        FROM peers
        WHERE is_bot = 0
        ORDER BY updated_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(peers)
}

/// Replace the personal-folder membership with the given Telegram user ids.
///
/// Resets every flag first so removals from the folder propagate.
pub async fn set_personal_members(pool: &SqlitePool, tg_peer_ids: &[i64]) -> Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE peers SET in_personal = 0")
        .execute(&mut *tx)
        .await?;

    let mut updated = 0u64;
    for tg_peer_id in tg_peer_ids {
        let result = sqlx::query("UPDATE peers SET in_personal = 1 WHERE tg_peer_id = ?")
            .bind(tg_peer_id)
            .execute(&mut *tx)
            .await?;
        updated += result.rows_affected();
    }

    tx.commit().await?;

    tracing::info!("Personal folder sync: {} peers flagged", updated);
    Ok(updated)
}

/// Count non-bot peers.
pub async fn count_peers(pool: &SqlitePool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM peers WHERE is_bot = 0")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn profile(tg_id: i64, name: &str) -> PeerProfile {
        PeerProfile {
            tg_peer_id: tg_id,
            username: None,
            first_name: Some(name.to_string()),
            last_name: None,
            is_bot: false,
        }
    }

    #[tokio::test]
    async fn test_get_missing_peer() {
        let db = test_db().await;
        let result = get_peer(db.pool(), 999).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_personal_sync_resets_removed_members() {
        let db = test_db().await;

        upsert_peer(db.pool(), &profile(1, "A")).await.unwrap();
        upsert_peer(db.pool(), &profile(2, "B")).await.unwrap();

        set_personal_members(db.pool(), &[1, 2]).await.unwrap();
        assert!(get_peer_by_tg_id(db.pool(), 1).await.unwrap().in_personal);

        // B left the folder.
        set_personal_members(db.pool(), &[1]).await.unwrap();
        assert!(get_peer_by_tg_id(db.pool(), 1).await.unwrap().in_personal);
        assert!(!get_peer_by_tg_id(db.pool(), 2).await.unwrap().in_personal);
    }

    #[tokio::test]
    async fn test_upsert_preserves_personal_flag() {
        let db = test_db().await;

        upsert_peer(db.pool(), &profile(5, "E")).await.unwrap();
        set_personal_members(db.pool(), &[5]).await.unwrap();

        // Profile refresh must not clear the flag.
        let refreshed = upsert_peer(db.pool(), &profile(5, "Egor")).await.unwrap();
        assert!(refreshed.in_personal);
        assert_eq!(refreshed.first_name.as_deref(), Some("Egor"));
    }

    #[tokio::test]
    async fn test_list_excludes_bots() {
        let db = test_db().await;

        upsert_peer(db.pool(), &profile(1, "A")).await.unwrap();
        let bot = PeerProfile {
            is_bot: true,
            ..profile(2, "Bot")
        };
        upsert_peer(db.pool(), &bot).await.unwrap();

        let peers = list_peers(db.pool(), 50, 0).await.unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(count_peers(db.pool()).await.unwrap(), 1);
    }
}
