//! SQLite persistence layer for the auto-reply service.
//!
//! This crate provides async database operations for peers, chats, the
//! message log, reply rules, chat triggers, quota state, and key/value
//! settings using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, peer::PeerProfile, peer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:autoreply.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let profile = PeerProfile {
//!         tg_peer_id: 111222333,
//!         username: Some("alice".to_string()),
//!         first_name: Some("Alice".to_string()),
//!         last_name: None,
//!         is_bot: false,
//!     };
//!     peer::upsert_peer(db.pool(), &profile).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod error;
pub mod message;
pub mod models;
pub mod peer;
pub mod quota;
pub mod rule;
pub mod settings;
pub mod trigger;

pub use error::{DatabaseError, Result};
pub use models::{
    Chat, ChatTrigger, Peer, QuotaState, ReplyRule, StoredMessage, Subject, SubjectKind,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub use sqlx::SqlitePool;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent message processing.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for an in-memory database in tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
