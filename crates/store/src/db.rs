//! SQLite database for the comparison log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use spread_core::{
    format_timestamp, normalize_symbol, now_utc, parse_timestamp, ComparisonLog, ComparisonResult,
    LogError, PersistedEntry, RejectReason,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Malformed row: {0}")]
    Decode(String),
}

impl From<DbError> for LogError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlx(e) => LogError::PersistenceFailed(e.to_string()),
            DbError::Decode(msg) => LogError::Decode(msg),
        }
    }
}

const ENTRY_COLUMNS: &str = "id, symbol, price_cex, price_dex, spread_pct, volume_cex, volume_dex, \
     slippage, trend, source, is_valid, error_kind, error_message, timestamp, created_at";

/// Append-only `price_history` table.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the SQLite database at `database_url`, creating it if needed.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Private in-memory database. A single long-lived connection keeps the
    /// data alive for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                price_cex REAL,
                price_dex REAL,
                spread_pct REAL,
                volume_cex REAL,
                volume_dex REAL,
                slippage REAL,
                trend REAL,
                source TEXT NOT NULL DEFAULT '',
                is_valid INTEGER NOT NULL,
                error_kind TEXT,
                error_message TEXT,
                timestamp TEXT NOT NULL,
                created_at TEXT NOT NULL,
                CHECK (
                    (is_valid = 0 AND error_message IS NOT NULL)
                    OR (is_valid = 1
                        AND price_cex IS NOT NULL
                        AND price_dex IS NOT NULL
                        AND spread_pct IS NOT NULL
                        AND error_message IS NULL)
                )
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_price_history_symbol
            ON price_history(symbol, id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert one attempt and return its row id.
    pub async fn append(&self, result: &ComparisonResult) -> Result<i64, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO price_history (
                symbol, price_cex, price_dex, spread_pct, volume_cex, volume_dex,
                slippage, trend, source, is_valid, error_kind, error_message,
                timestamp, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(result.symbol.as_str())
        .bind(result.price_cex)
        .bind(result.price_dex)
        .bind(result.spread_pct)
        .bind(result.volume_cex)
        .bind(result.volume_dex)
        .bind(result.slippage)
        .bind(result.trend)
        .bind(result.source.as_str())
        .bind(result.is_valid())
        .bind(result.reason().map(RejectReason::as_str))
        .bind(result.error())
        .bind(format_timestamp(&result.timestamp))
        .bind(format_timestamp(&now_utc()))
        .execute(&self.pool)
        .await?;

        let id = row.last_insert_rowid();
        debug!(symbol = %result.symbol, id, valid = result.is_valid(), "Persisted comparison");
        Ok(id)
    }

    /// Most recent entries for `symbol`, newest first.
    pub async fn recent(&self, symbol: &str, limit: usize) -> Result<Vec<PersistedEntry>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM price_history WHERE symbol = ? ORDER BY id DESC LIMIT ?",
            ENTRY_COLUMNS
        ))
        .bind(normalize_symbol(symbol).as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Total number of stored entries.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM price_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn decode_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DbError> {
    parse_timestamp(value).map_err(|e| DbError::Decode(format!("{}: {}", column, e)))
}

fn entry_from_row(row: &SqliteRow) -> Result<PersistedEntry, DbError> {
    let error_kind = match row.try_get::<Option<String>, _>("error_kind")? {
        Some(kind) => Some(
            RejectReason::from_str(&kind).map_err(|e| DbError::Decode(e.to_string()))?,
        ),
        None => None,
    };
    let timestamp: String = row.try_get("timestamp")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(PersistedEntry {
        id: row.try_get("id")?,
        symbol: CompactString::new(row.try_get::<String, _>("symbol")?),
        price_cex: row.try_get::<Option<f64>, _>("price_cex")?.unwrap_or(0.0),
        price_dex: row.try_get::<Option<f64>, _>("price_dex")?.unwrap_or(0.0),
        spread_pct: row.try_get("spread_pct")?,
        volume_cex: row.try_get::<Option<f64>, _>("volume_cex")?.unwrap_or(0.0),
        volume_dex: row.try_get::<Option<f64>, _>("volume_dex")?.unwrap_or(0.0),
        slippage: row.try_get("slippage")?,
        trend: row.try_get("trend")?,
        source: CompactString::new(row.try_get::<String, _>("source")?),
        is_valid: row.try_get("is_valid")?,
        error_kind,
        error_message: row.try_get("error_message")?,
        timestamp: decode_timestamp("timestamp", &timestamp)?,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

#[async_trait]
impl ComparisonLog for Database {
    async fn append(&self, result: &ComparisonResult) -> Result<i64, LogError> {
        Ok(Database::append(self, result).await?)
    }

    async fn read(&self, symbol: &str, limit: usize) -> Result<Vec<PersistedEntry>, LogError> {
        Ok(self.recent(symbol, limit).await?)
    }
}
