//! Points, badges and identified-plant tracking per profile
//!
//! Badges are never stored; [`compute_badges`] derives them from the
//! progress document on every read.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;
use vaidya_common::events::{EventBus, VaidyaEvent};
use vaidya_common::models::{Badge, BadgeId, UserProgress};
use vaidya_common::{Error, Result};

use crate::store::TypedStore;

pub const IDENTIFICATION_POINTS: u64 = 25;
pub const REMEDY_POINTS: u64 = 20;
pub const LANGUAGE_PASS_POINTS: u64 = 10;

const MAX_PROFILE_ID_LEN: usize = 64;

pub fn progress_key(profile_id: &str) -> String {
    format!("user-progress:{}", profile_id)
}

/// Profile ids are opaque client tokens: ASCII alphanumerics, `-` and `_`
pub fn validate_profile_id(profile_id: &str) -> Result<()> {
    let valid = !profile_id.is_empty()
        && profile_id.len() <= MAX_PROFILE_ID_LEN
        && profile_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("Invalid profile id '{}'", profile_id)))
    }
}

fn is_unlocked(id: BadgeId, progress: &UserProgress) -> bool {
    match id {
        BadgeId::FirstPlant => !progress.identified_plants.is_empty(),
        BadgeId::FivePlants => progress.identified_plants.len() >= 5,
        BadgeId::FirstRemedy => progress.remedies_contributed >= 1,
        BadgeId::FirstWord => !progress.language_tests.is_empty(),
        BadgeId::HundredPoints => progress.points >= 100,
    }
}

/// All badges in display order with their unlock state
pub fn compute_badges(progress: &UserProgress) -> Vec<Badge> {
    BadgeId::ALL
        .iter()
        .map(|&id| Badge {
            id,
            name: id.name().to_string(),
            description: id.description().to_string(),
            unlocked: is_unlocked(id, progress),
        })
        .collect()
}

/// Progress document plus the derived view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub progress: UserProgress,
    pub badges: Vec<Badge>,
    pub identified_count: usize,
}

impl From<UserProgress> for ProgressSummary {
    fn from(progress: UserProgress) -> Self {
        Self {
            badges: compute_badges(&progress),
            identified_count: progress.identified_plants.len(),
            progress,
        }
    }
}

/// Serialized read-modify-write access to progress documents
pub struct ProgressService {
    store: TypedStore,
    events: EventBus,
    write_lock: Mutex<()>,
}

impl ProgressService {
    pub fn new(store: TypedStore, events: EventBus) -> Self {
        Self {
            store,
            events,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn get(&self, profile_id: &str) -> Result<UserProgress> {
        validate_profile_id(profile_id)?;
        self.store
            .get_or(&progress_key(profile_id), UserProgress::default())
            .await
    }

    pub async fn summary(&self, profile_id: &str) -> Result<ProgressSummary> {
        Ok(self.get(profile_id).await?.into())
    }

    /// Apply `mutate` under the write lock; it returns the points it awarded
    async fn update<F>(&self, profile_id: &str, reason: &str, mutate: F) -> Result<(UserProgress, u64)>
    where
        F: FnOnce(&mut UserProgress) -> u64,
    {
        validate_profile_id(profile_id)?;
        let _guard = self.write_lock.lock().await;

        let key = progress_key(profile_id);
        let mut progress = self
            .store
            .get_or(&key, UserProgress::default())
            .await?;
        let awarded = mutate(&mut progress);
        self.store.set(&key, &progress).await?;

        if awarded > 0 {
            info!(
                profile = %profile_id,
                points = awarded,
                total = progress.points,
                reason = %reason,
                "Points awarded"
            );
            self.events.emit_lossy(VaidyaEvent::PointsAwarded {
                profile_id: profile_id.to_string(),
                points: awarded,
                total: progress.points,
                reason: reason.to_string(),
                timestamp: Utc::now(),
            });
        }

        Ok((progress, awarded))
    }

    /// +25 points only the first time `plant_key` is identified
    pub async fn record_identification(
        &self,
        profile_id: &str,
        plant_key: &str,
    ) -> Result<(UserProgress, u64)> {
        let plant_key = plant_key.trim().to_string();
        if plant_key.is_empty() {
            return Err(Error::InvalidInput("Plant key is empty".to_string()));
        }

        self.update(profile_id, "plant identified", |progress| {
            if progress.has_identified(&plant_key) {
                0
            } else {
                progress.identified_plants.push(plant_key);
                progress.add_points(IDENTIFICATION_POINTS);
                IDENTIFICATION_POINTS
            }
        })
        .await
    }

    pub async fn record_remedy(&self, profile_id: &str) -> Result<UserProgress> {
        let (progress, _) = self
            .update(profile_id, "remedy contributed", |progress| {
                progress.remedies_contributed = progress.remedies_contributed.saturating_add(1);
                progress.add_points(REMEDY_POINTS);
                REMEDY_POINTS
            })
            .await?;
        Ok(progress)
    }

    /// Correct pronunciation of `plant_id`
    pub async fn record_language_pass(
        &self,
        profile_id: &str,
        plant_id: &str,
        score: u32,
    ) -> Result<UserProgress> {
        let plant_id = plant_id.to_string();
        let (progress, _) = self
            .update(profile_id, "pronunciation passed", |progress| {
                let record = progress.language_tests.entry(plant_id).or_default();
                record.attempts = record.attempts.saturating_add(1);
                record.best_score = record.best_score.max(score);
                progress.add_points(LANGUAGE_PASS_POINTS);
                LANGUAGE_PASS_POINTS
            })
            .await?;
        Ok(progress)
    }
}
