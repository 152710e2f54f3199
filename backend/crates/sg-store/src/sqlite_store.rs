use crate::shadow_store::{fold_identity, plan_delete};
use crate::{EventEffect, EventMutation, Result, ShadowStore, StoreError, Upserted};

use sg_core::{Identity, IdentityKey, MergeOutcome, UserRecord, WebhookEvent};

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use log::{debug, info};
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, Transaction};
use tokio::sync::Mutex;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_USER: &str = r#"
    SELECT provider, external_id, email, username, display_name, groups_json,
           last_seen_at, source_event_at, created_at, updated_at, version
    FROM shadow_users
"#;

/// Durable shadow store on a SQLite file.
///
/// Writes take `writer` and run in a transaction, so a read-merge-write for
/// one key never interleaves with another write.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    writer: Mutex<()>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run embedded migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Initialization {
                    message: format!("Failed to create store directory: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool).await?;
        info!("Shadow store opened at {}", path.display());
        Ok(store)
    }

    /// Wrap an existing pool, running migrations first.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration {
                message: format!("Migration failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            pool,
            writer: Mutex::new(()),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ShadowStore for SqliteStore {
    async fn get(&self, key: &IdentityKey) -> Result<UserRecord> {
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut *conn, key)
            .await?
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn upsert(&self, identity: &Identity) -> Result<Upserted> {
        let _writer = self.writer.lock().await;
        let mut tx = self.pool.begin().await?;
        let upserted = upsert_user(&mut tx, identity).await?;
        tx.commit().await?;
        Ok(upserted)
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query(&format!("{} ORDER BY provider, external_id", SELECT_USER))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn delete(&self, key: &IdentityKey, deprovisioned_at: DateTime<Utc>) -> Result<()> {
        let _writer = self.writer.lock().await;
        let mut tx = self.pool.begin().await?;
        let removed = delete_user(&mut tx, key, deprovisioned_at).await?;
        tx.commit().await?;

        if !removed {
            return Err(StoreError::not_found(key));
        }
        Ok(())
    }

    async fn apply_event(
        &self,
        event: &WebhookEvent,
        mutation: EventMutation,
    ) -> Result<EventEffect> {
        let _writer = self.writer.lock().await;
        // Uncommitted work is rolled back when `tx` drops, so an error or a
        // cancelled future leaves no trace of the event.
        let mut tx = self.pool.begin().await?;

        let recorded = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, event_type, occurred_at, received_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(event_id) DO NOTHING
            "#,
        )
        .bind(&event.event_id)
        .bind(event.event_type.as_str())
        .bind(event.occurred_at.timestamp_micros())
        .bind(Utc::now().timestamp_micros())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if recorded == 0 {
            return Ok(EventEffect::Duplicate);
        }

        let effect = match mutation {
            EventMutation::Upsert(identity) => match upsert_user(&mut tx, &identity).await {
                Ok(upserted) => EventEffect::Upserted(upserted),
                Err(StoreError::Superseded { .. }) => EventEffect::Superseded,
                Err(e) => return Err(e),
            },
            EventMutation::Delete {
                key,
                deprovisioned_at,
            } => match delete_user(&mut tx, &key, deprovisioned_at).await {
                Ok(true) => EventEffect::Deleted,
                Ok(false) => EventEffect::NotFound,
                Err(StoreError::Superseded { .. }) => EventEffect::Superseded,
                Err(e) => return Err(e),
            },
        };

        tx.commit().await?;
        debug!("Recorded webhook {}", event.event_id);
        Ok(effect)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// Read-merge-write for one key inside the caller's transaction.
async fn upsert_user(tx: &mut Transaction<'_, Sqlite>, identity: &Identity) -> Result<Upserted> {
    let key = identity.key();

    let existing = fetch_user(&mut **tx, &key).await?;
    let had_record = existing.is_some();
    let tombstone = fetch_tombstone(&mut **tx, &key).await?;

    let upserted = fold_identity(existing, tombstone, identity, Utc::now())?;
    if upserted.outcome == MergeOutcome::Stale {
        return Ok(upserted);
    }

    write_user(&mut **tx, &upserted.record).await?;
    if !had_record && tombstone.is_some() {
        sqlx::query("DELETE FROM shadow_user_tombstones WHERE provider = ? AND external_id = ?")
            .bind(&key.provider)
            .bind(&key.external_id)
            .execute(&mut **tx)
            .await?;
    }

    // Read back the stored form so callers see the persisted precision.
    let record = fetch_user(&mut **tx, &key)
        .await?
        .ok_or_else(|| StoreError::not_found(&key))?;

    debug!("Upserted shadow user {} (version {})", key, record.version);
    Ok(Upserted {
        record,
        outcome: upserted.outcome,
    })
}

/// Write the tombstone and drop the record. Returns whether a record existed.
async fn delete_user(
    tx: &mut Transaction<'_, Sqlite>,
    key: &IdentityKey,
    deprovisioned_at: DateTime<Utc>,
) -> Result<bool> {
    let existing = fetch_user(&mut **tx, key).await?;
    let tombstone = fetch_tombstone(&mut **tx, key).await?;
    let tombstone_at = plan_delete(key, existing.as_ref(), tombstone, deprovisioned_at)?;

    sqlx::query(
        r#"
        INSERT INTO shadow_user_tombstones (provider, external_id, deleted_at)
        VALUES (?, ?, ?)
        ON CONFLICT(provider, external_id) DO UPDATE SET deleted_at = excluded.deleted_at
        "#,
    )
    .bind(&key.provider)
    .bind(&key.external_id)
    .bind(tombstone_at.timestamp_micros())
    .execute(&mut **tx)
    .await?;

    let removed = sqlx::query("DELETE FROM shadow_users WHERE provider = ? AND external_id = ?")
        .bind(&key.provider)
        .bind(&key.external_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    Ok(removed > 0)
}

async fn fetch_user(conn: &mut SqliteConnection, key: &IdentityKey) -> Result<Option<UserRecord>> {
    let row = sqlx::query(&format!(
        "{} WHERE provider = ? AND external_id = ?",
        SELECT_USER
    ))
    .bind(&key.provider)
    .bind(&key.external_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(row_to_record).transpose()
}

async fn fetch_tombstone(
    conn: &mut SqliteConnection,
    key: &IdentityKey,
) -> Result<Option<DateTime<Utc>>> {
    let deleted_at: Option<i64> = sqlx::query_scalar(
        "SELECT deleted_at FROM shadow_user_tombstones WHERE provider = ? AND external_id = ?",
    )
    .bind(&key.provider)
    .bind(&key.external_id)
    .fetch_optional(&mut *conn)
    .await?;

    deleted_at.map(from_micros).transpose()
}

async fn write_user(conn: &mut SqliteConnection, record: &UserRecord) -> Result<()> {
    let groups_json = serde_json::to_string(&record.groups).map_err(|e| StoreError::Corrupt {
        message: format!("Cannot encode groups: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    sqlx::query(
        r#"
        INSERT INTO shadow_users (
            provider, external_id, email, username, display_name, groups_json,
            last_seen_at, source_event_at, created_at, updated_at, version
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(provider, external_id) DO UPDATE SET
            email = excluded.email,
            username = excluded.username,
            display_name = excluded.display_name,
            groups_json = excluded.groups_json,
            last_seen_at = excluded.last_seen_at,
            source_event_at = excluded.source_event_at,
            updated_at = excluded.updated_at,
            version = excluded.version
        "#,
    )
    .bind(&record.provider)
    .bind(&record.external_id)
    .bind(&record.email)
    .bind(&record.username)
    .bind(&record.display_name)
    .bind(groups_json)
    .bind(record.last_seen_at.timestamp_micros())
    .bind(record.source_event_at.map(|t| t.timestamp_micros()))
    .bind(record.created_at.timestamp_micros())
    .bind(record.updated_at.timestamp_micros())
    .bind(record.version)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn row_to_record(row: &SqliteRow) -> Result<UserRecord> {
    let groups_json: String = row.try_get("groups_json")?;
    let groups = serde_json::from_str(&groups_json).map_err(|e| StoreError::Corrupt {
        message: format!("groups_json is not a string array: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;
    let source_event_at: Option<i64> = row.try_get("source_event_at")?;

    Ok(UserRecord {
        provider: row.try_get("provider")?,
        external_id: row.try_get("external_id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        groups,
        last_seen_at: from_micros(row.try_get("last_seen_at")?)?,
        source_event_at: source_event_at.map(from_micros).transpose()?,
        created_at: from_micros(row.try_get("created_at")?)?,
        updated_at: from_micros(row.try_get("updated_at")?)?,
        version: row.try_get("version")?,
    })
}

#[track_caller]
fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| StoreError::Corrupt {
        message: format!("timestamp out of range: {}", micros),
        location: ErrorLocation::from(Location::caller()),
    })
}
