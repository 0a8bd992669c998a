//! Remedy repositories
//!
//! Two interchangeable backends:
//! - `LocalRemedyRepository`: one JSON array document in the key-value store
//! - `CollectionRemedyRepository`: the `remedies` table, with ordered
//!   queries and single-statement vote increments

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use vaidya_common::models::{Remedy, VoteDirection};
use vaidya_common::{Error, Result};

use super::kv::{KeyValueStore, TypedStore};

/// Key of the remedy document in the local backend
pub const REMEDIES_KEY: &str = "community-remedies";

/// Storage for submitted (non-seeded) remedies
#[async_trait]
pub trait RemedyRepository: Send + Sync {
    /// All stored remedies, newest first
    async fn list(&self) -> Result<Vec<Remedy>>;

    async fn get(&self, id: &str) -> Result<Option<Remedy>>;

    async fn insert(&self, remedy: &Remedy) -> Result<()>;

    /// Returns false when no such remedy exists
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Add exactly one vote; `None` for unknown ids
    async fn increment_vote(&self, id: &str, direction: VoteDirection) -> Result<Option<Remedy>>;
}

/// Which repository implementation to run with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemedyBackend {
    #[default]
    Local,
    Collection,
}

impl FromStr for RemedyBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(RemedyBackend::Local),
            "collection" | "remote" => Ok(RemedyBackend::Collection),
            other => Err(Error::Config(format!(
                "Unknown remedy_backend '{}', expected 'local' or 'collection'",
                other
            ))),
        }
    }
}

// ============================================================================
// Local document backend
// ============================================================================

/// Remedy list stored as one document, newest first
pub struct LocalRemedyRepository {
    store: TypedStore,
    // Serializes read-modify-write cycles on the document
    write_lock: Mutex<()>,
}

impl LocalRemedyRepository {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: TypedStore::new(kv),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Remedy>> {
        self.store.get_or(REMEDIES_KEY, Vec::<Remedy>::new()).await
    }
}

#[async_trait]
impl RemedyRepository for LocalRemedyRepository {
    async fn list(&self) -> Result<Vec<Remedy>> {
        self.load().await
    }

    async fn get(&self, id: &str) -> Result<Option<Remedy>> {
        Ok(self.load().await?.into_iter().find(|r| r.id == id))
    }

    async fn insert(&self, remedy: &Remedy) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut remedies = self.load().await?;

        if remedies.iter().any(|r| r.id == remedy.id) {
            return Err(Error::InvalidInput(format!("Duplicate remedy id {}", remedy.id)));
        }

        remedies.insert(0, remedy.clone());
        self.store.set(REMEDIES_KEY, &remedies).await
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut remedies = self.load().await?;

        let before = remedies.len();
        remedies.retain(|r| r.id != id);
        if remedies.len() == before {
            return Ok(false);
        }

        self.store.set(REMEDIES_KEY, &remedies).await?;
        Ok(true)
    }

    async fn increment_vote(&self, id: &str, direction: VoteDirection) -> Result<Option<Remedy>> {
        let _guard = self.write_lock.lock().await;
        let mut remedies = self.load().await?;

        let Some(remedy) = remedies.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        match direction {
            VoteDirection::Up => remedy.upvotes = remedy.upvotes.saturating_add(1),
            VoteDirection::Down => remedy.downvotes = remedy.downvotes.saturating_add(1),
        }
        let updated = remedy.clone();

        self.store.set(REMEDIES_KEY, &remedies).await?;
        Ok(Some(updated))
    }
}

// ============================================================================
// Document collection backend
// ============================================================================

#[derive(sqlx::FromRow)]
struct RemedyRow {
    id: String,
    plant_name: String,
    description: String,
    language: String,
    effectiveness_rating: i64,
    photo_data_uri: Option<String>,
    submitted_at: String,
    upvotes: i64,
    downvotes: i64,
    is_plausible: Option<bool>,
    verification_notes: Option<String>,
}

impl TryFrom<RemedyRow> for Remedy {
    type Error = Error;

    fn try_from(row: RemedyRow) -> Result<Self> {
        let submitted_at = DateTime::parse_from_rfc3339(&row.submitted_at)
            .map_err(|e| Error::Internal(format!("Bad submitted_at for {}: {}", row.id, e)))?
            .with_timezone(&Utc);

        Ok(Remedy {
            effectiveness_rating: u8::try_from(row.effectiveness_rating)
                .map_err(|_| Error::Internal(format!("Bad rating for {}", row.id)))?,
            upvotes: u32::try_from(row.upvotes)
                .map_err(|_| Error::Internal(format!("Bad upvotes for {}", row.id)))?,
            downvotes: u32::try_from(row.downvotes)
                .map_err(|_| Error::Internal(format!("Bad downvotes for {}", row.id)))?,
            id: row.id,
            plant_name: row.plant_name,
            description: row.description,
            language: row.language,
            photo_data_uri: row.photo_data_uri,
            submitted_at,
            is_plausible: row.is_plausible,
            verification_notes: row.verification_notes,
        })
    }
}

const SELECT_COLUMNS: &str = "id, plant_name, description, language, effectiveness_rating, \
     photo_data_uri, submitted_at, upvotes, downvotes, is_plausible, verification_notes";

/// Fixed-width timestamps so that text order is chronological order
fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `remedies` table backend
#[derive(Clone)]
pub struct CollectionRemedyRepository {
    db: SqlitePool,
}

impl CollectionRemedyRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RemedyRepository for CollectionRemedyRepository {
    async fn list(&self) -> Result<Vec<Remedy>> {
        let rows: Vec<RemedyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM remedies ORDER BY submitted_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Remedy::try_from).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Remedy>> {
        let row: Option<RemedyRow> =
            sqlx::query_as(&format!("SELECT {} FROM remedies WHERE id = ?", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        row.map(Remedy::try_from).transpose()
    }

    async fn insert(&self, remedy: &Remedy) -> Result<()> {
        sqlx::query(
            "INSERT INTO remedies (id, plant_name, description, language, effectiveness_rating,
                 photo_data_uri, submitted_at, upvotes, downvotes, is_plausible, verification_notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&remedy.id)
        .bind(&remedy.plant_name)
        .bind(&remedy.description)
        .bind(&remedy.language)
        .bind(i64::from(remedy.effectiveness_rating))
        .bind(&remedy.photo_data_uri)
        .bind(timestamp_text(&remedy.submitted_at))
        .bind(i64::from(remedy.upvotes))
        .bind(i64::from(remedy.downvotes))
        .bind(remedy.is_plausible)
        .bind(&remedy.verification_notes)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM remedies WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_vote(&self, id: &str, direction: VoteDirection) -> Result<Option<Remedy>> {
        let column = match direction {
            VoteDirection::Up => "upvotes",
            VoteDirection::Down => "downvotes",
        };

        let row: Option<RemedyRow> = sqlx::query_as(&format!(
            "UPDATE remedies SET {column} = {column} + 1 WHERE id = ? RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Remedy::try_from).transpose()
    }
}
