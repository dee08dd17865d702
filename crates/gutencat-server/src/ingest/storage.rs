// Catalog Metadata Storage Layer

use crate::config::DatabaseConfig;
use crate::ingest::rdf::{MaskedMetadata, PublicationDate, RawNode};
use crate::ingest::{IngestError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Keyed, idempotent persistence for masked catalog records
///
/// `upsert` replaces the whole stored record for an id; there is no
/// field-level merge. Records without an id are rejected before any write.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn upsert(&self, record: MaskedMetadata) -> Result<()>;

    async fn get(&self, id: i64) -> Result<Option<MaskedMetadata>>;

    async fn count(&self) -> Result<u64>;

    /// Cheap connectivity check for health endpoints
    async fn ping(&self) -> Result<()>;
}

fn require_id(record: &MaskedMetadata) -> Result<i64> {
    record.id.ok_or_else(|| {
        IngestError::Validation("record is missing required field 'id'".to_string())
    })
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// PostgreSQL-backed store
///
/// The table and its indexes are created on construction, so every instance
/// is ready to take writes.
pub struct PgMetadataStore {
    db: PgPool,
    table: String,
}

impl PgMetadataStore {
    /// Open a pool from configuration and prepare the table
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await?;

        info!("Database connection pool established");
        Self::from_pool(db, &config.table).await
    }

    /// Wrap an existing pool and prepare the table
    pub async fn from_pool(db: PgPool, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        let store = Self {
            db,
            table: table.to_string(),
        };
        store.ensure_schema().await?;

        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn ensure_schema(&self) -> Result<()> {
        let t = &self.table;
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {t} (
                    id BIGINT PRIMARY KEY,
                    language TEXT,
                    title JSONB,
                    subjects JSONB NOT NULL DEFAULT '[]'::jsonb,
                    authors TEXT[] NOT NULL DEFAULT '{{}}',
                    rights JSONB NOT NULL DEFAULT '[]'::jsonb,
                    publication_date DATE,
                    publication_date_raw TEXT,
                    publisher JSONB,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
            format!("CREATE INDEX IF NOT EXISTS {t}_title_idx ON {t} (title)"),
            format!("CREATE INDEX IF NOT EXISTS {t}_authors_idx ON {t} USING GIN (authors)"),
            format!(
                "CREATE INDEX IF NOT EXISTS {t}_publication_date_idx ON {t} (publication_date)"
            ),
        ];

        for statement in &statements {
            sqlx::query(statement).execute(&self.db).await?;
        }

        debug!("Ensured table {} and its indexes", t);
        Ok(())
    }

    fn record_from_row(row: &PgRow) -> Result<MaskedMetadata> {
        let date: Option<NaiveDate> = row.try_get("publication_date")?;
        let date_raw: Option<String> = row.try_get("publication_date_raw")?;
        let publication_date = match (date, date_raw) {
            (Some(date), _) => Some(PublicationDate::Valid(date)),
            (None, Some(raw)) => Some(PublicationDate::Invalid(raw)),
            (None, None) => None,
        };

        Ok(MaskedMetadata {
            id: Some(row.try_get("id")?),
            language: row.try_get("language")?,
            title: row
                .try_get::<Option<Json<RawNode>>, _>("title")?
                .map(|j| j.0),
            subjects: row.try_get::<Json<Vec<RawNode>>, _>("subjects")?.0,
            authors: row.try_get("authors")?,
            rights: row.try_get::<Json<Vec<RawNode>>, _>("rights")?.0,
            publication_date,
            publisher: row
                .try_get::<Option<Json<RawNode>>, _>("publisher")?
                .map(|j| j.0),
        })
    }
}

fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && table.len() <= 48 {
        Ok(())
    } else {
        Err(IngestError::Validation(format!("Invalid table name: {:?}", table)))
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn upsert(&self, record: MaskedMetadata) -> Result<()> {
        let id = require_id(&record)?;
        let t = &self.table;

        let (date, date_raw) = match record.publication_date {
            Some(PublicationDate::Valid(date)) => (Some(date), Some(date.to_string())),
            Some(PublicationDate::Invalid(raw)) => (None, Some(raw)),
            None => (None, None),
        };

        sqlx::query(&format!(
            r#"
            INSERT INTO {t} (
                id, language, title, subjects, authors, rights,
                publication_date, publication_date_raw, publisher, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (id) DO UPDATE SET
                language = EXCLUDED.language,
                title = EXCLUDED.title,
                subjects = EXCLUDED.subjects,
                authors = EXCLUDED.authors,
                rights = EXCLUDED.rights,
                publication_date = EXCLUDED.publication_date,
                publication_date_raw = EXCLUDED.publication_date_raw,
                publisher = EXCLUDED.publisher,
                updated_at = NOW()
            "#
        ))
        .bind(id)
        .bind(record.language)
        .bind(record.title.map(Json))
        .bind(Json(record.subjects))
        .bind(record.authors)
        .bind(Json(record.rights))
        .bind(date)
        .bind(date_raw)
        .bind(record.publisher.map(Json))
        .execute(&self.db)
        .await?;

        debug!(id, "Upserted catalog record");
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<MaskedMetadata>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT id, language, title, subjects, authors, rights,
                   publication_date, publication_date_raw, publisher
            FROM {}
            WHERE id = $1
            "#,
            self.table
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store used for dry runs and tests
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<BTreeMap<i64, MaskedMetadata>>,
    writes: AtomicU64,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upserts that reached the map
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Snapshot of all records ordered by id
    pub async fn records(&self) -> Vec<MaskedMetadata> {
        self.records.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn upsert(&self, record: MaskedMetadata) -> Result<()> {
        let id = require_id(&record)?;
        self.records.write().await.insert(id, record);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<MaskedMetadata>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
