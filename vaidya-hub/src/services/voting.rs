//! Vote counting and remedy ordering

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vaidya_common::events::{EventBus, NoticeSeverity, VaidyaEvent};
use vaidya_common::models::{Remedy, VoteDirection};
use vaidya_common::{Error, Result};

use crate::catalog;
use crate::store::RemedyRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// `submittedAt` descending
    #[default]
    Recency,
    /// Net score descending
    Rating,
}

impl FromStr for SortMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recency" | "recent" | "newest" => Ok(SortMode::Recency),
            "rating" | "votes" => Ok(SortMode::Rating),
            other => Err(Error::InvalidInput(format!("Unknown sort mode '{}'", other))),
        }
    }
}

/// Stable sort: equal keys keep their current relative order
pub fn sort_remedies(remedies: &mut [Remedy], mode: SortMode) {
    match mode {
        SortMode::Recency => remedies.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at)),
        SortMode::Rating => remedies.sort_by(|a, b| b.net_score().cmp(&a.net_score())),
    }
}

/// A remedy collection kept in one sort order
#[derive(Debug, Clone)]
pub struct RemedyBoard {
    remedies: Vec<Remedy>,
    mode: SortMode,
}

impl RemedyBoard {
    pub fn new(mut remedies: Vec<Remedy>, mode: SortMode) -> Self {
        sort_remedies(&mut remedies, mode);
        Self { remedies, mode }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    pub fn remedies(&self) -> &[Remedy] {
        &self.remedies
    }

    pub fn into_remedies(self) -> Vec<Remedy> {
        self.remedies
    }

    /// Replace the record with the same id; rating order is refreshed
    ///
    /// Returns false when the board has no such record.
    pub fn apply_update(&mut self, updated: Remedy) -> bool {
        let Some(slot) = self.remedies.iter_mut().find(|r| r.id == updated.id) else {
            return false;
        };
        *slot = updated;
        if self.mode == SortMode::Rating {
            sort_remedies(&mut self.remedies, self.mode);
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Counted(Remedy),
    /// Seeded example; nothing changed
    Immutable,
}

/// Voting and listing over a [`RemedyRepository`]
pub struct VotingService {
    repository: Arc<dyn RemedyRepository>,
    events: EventBus,
}

impl VotingService {
    pub fn new(repository: Arc<dyn RemedyRepository>, events: EventBus) -> Self {
        Self { repository, events }
    }

    /// Seeded examples followed by stored remedies, in `mode` order
    pub async fn board(&self, mode: SortMode) -> Result<RemedyBoard> {
        let mut remedies = catalog::seeded_remedies().to_vec();
        remedies.extend(self.repository.list().await?);
        Ok(RemedyBoard::new(remedies, mode))
    }

    /// Add exactly one vote to a stored remedy
    pub async fn vote(
        &self,
        id: &str,
        direction: VoteDirection,
        profile_id: Option<&str>,
    ) -> Result<VoteOutcome> {
        if catalog::seeded_remedy(id).is_some() {
            debug!(remedy_id = %id, "Vote on seeded remedy ignored");
            self.events.emit_lossy(VaidyaEvent::notice(
                profile_id,
                NoticeSeverity::Info,
                "Can't Vote",
                "This is a pre-built remedy and cannot be voted on.",
            ));
            return Ok(VoteOutcome::Immutable);
        }

        let updated = self
            .repository
            .increment_vote(id, direction)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Remedy {}", id)))?;

        info!(
            remedy_id = %id,
            direction = direction.as_str(),
            upvotes = updated.upvotes,
            downvotes = updated.downvotes,
            "Vote counted"
        );
        self.events.emit_lossy(VaidyaEvent::RemedyVoted {
            remedy_id: updated.id.clone(),
            direction,
            upvotes: updated.upvotes,
            downvotes: updated.downvotes,
            timestamp: Utc::now(),
        });

        Ok(VoteOutcome::Counted(updated))
    }

    /// Vote, then return the board in `mode` order with the vote applied
    pub async fn vote_ranked(
        &self,
        id: &str,
        direction: VoteDirection,
        profile_id: Option<&str>,
        mode: SortMode,
    ) -> Result<(VoteOutcome, RemedyBoard)> {
        let mut board = self.board(mode).await?;
        let outcome = self.vote(id, direction, profile_id).await?;
        if let VoteOutcome::Counted(updated) = &outcome {
            board.apply_update(updated.clone());
        }
        Ok((outcome, board))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocalRemedyRepository, MemoryKvStore};
    use chrono::{Duration, TimeZone};

    fn remedy(id: &str, day: u32, up: u32, down: u32) -> Remedy {
        Remedy {
            id: id.to_string(),
            plant_name: "Neem".to_string(),
            description: "Neem paste for skin".to_string(),
            language: "English".to_string(),
            effectiveness_rating: 3,
            photo_data_uri: None,
            submitted_at: Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap(),
            upvotes: up,
            downvotes: down,
            is_plausible: Some(true),
            verification_notes: None,
        }
    }

    fn ids(remedies: &[Remedy]) -> Vec<&str> {
        remedies.iter().map(|r| r.id.as_str()).collect()
    }

    fn service() -> VotingService {
        let repo = LocalRemedyRepository::new(Arc::new(MemoryKvStore::new()));
        VotingService::new(Arc::new(repo), EventBus::new(16))
    }

    #[test]
    fn test_recency_sort_is_newest_first() {
        let board = RemedyBoard::new(
            vec![remedy("a", 1, 0, 0), remedy("c", 3, 0, 0), remedy("b", 2, 0, 0)],
            SortMode::Recency,
        );
        assert_eq!(ids(board.remedies()), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_rating_sort_uses_net_score_and_is_stable() {
        let board = RemedyBoard::new(
            vec![
                remedy("first", 1, 3, 1),
                remedy("top", 2, 5, 0),
                remedy("second", 3, 2, 0),
                remedy("sunk", 4, 9, 10),
            ],
            SortMode::Rating,
        );
        // "first" and "second" tie at +2
        assert_eq!(ids(board.remedies()), vec!["top", "first", "second", "sunk"]);
    }

    #[test]
    fn test_update_in_rating_mode_resorts() {
        let mut board = RemedyBoard::new(
            vec![remedy("a", 1, 1, 0), remedy("b", 2, 0, 0)],
            SortMode::Rating,
        );
        assert!(board.apply_update(remedy("b", 2, 2, 0)));
        assert_eq!(ids(board.remedies()), vec!["b", "a"]);
        assert!(!board.apply_update(remedy("zzz", 2, 2, 0)));
    }

    #[test]
    fn test_sort_mode_parsing() {
        assert_eq!("Rating".parse::<SortMode>().unwrap(), SortMode::Rating);
        assert_eq!("recency".parse::<SortMode>().unwrap(), SortMode::Recency);
        assert!("alphabetical".parse::<SortMode>().is_err());
    }

    #[tokio::test]
    async fn test_votes_never_decrement() {
        let service = service();
        service.repository.insert(&remedy("r1", 1, 0, 0)).await.unwrap();

        service.vote("r1", VoteDirection::Up, None).await.unwrap();
        let outcome = service.vote("r1", VoteDirection::Down, None).await.unwrap();

        match outcome {
            VoteOutcome::Counted(r) => {
                assert_eq!(r.upvotes, 1);
                assert_eq!(r.downvotes, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_seeded_vote_is_noop_with_notice() {
        let service = service();
        let mut rx = service.events.subscribe();
        let before = service.board(SortMode::Recency).await.unwrap();

        let outcome = service
            .vote("initial-0", VoteDirection::Up, Some("p1"))
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::Immutable);

        let after = service.board(SortMode::Recency).await.unwrap();
        assert_eq!(before.remedies(), after.remedies());

        match rx.recv().await.unwrap() {
            VaidyaEvent::Notice { title, profile_id, .. } => {
                assert_eq!(title, "Can't Vote");
                assert_eq!(profile_id.as_deref(), Some("p1"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let service = service();
        let err = service
            .vote("missing", VoteDirection::Up, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unlisted_initial_id_is_not_found() {
        let service = service();
        let mut rx = service.events.subscribe();

        let err = service
            .vote("initial-99", VoteDirection::Up, Some("p1"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_vote_in_rating_mode_moves_remedy_up() {
        let service = service();
        let mut leader = remedy("leader", 1, 0, 0);
        leader.submitted_at = Utc::now() + Duration::seconds(2);
        let mut climber = remedy("climber", 2, 0, 0);
        climber.submitted_at = Utc::now() + Duration::seconds(1);
        service.repository.insert(&leader).await.unwrap();
        service.repository.insert(&climber).await.unwrap();

        let stored = |board: &RemedyBoard| -> Vec<String> {
            board
                .remedies()
                .iter()
                .filter(|r| !r.is_seeded())
                .map(|r| r.id.clone())
                .collect()
        };

        let (_, board) = service
            .vote_ranked("leader", VoteDirection::Up, None, SortMode::Rating)
            .await
            .unwrap();
        assert_eq!(stored(&board), vec!["leader", "climber"]);

        service
            .vote_ranked("climber", VoteDirection::Up, None, SortMode::Rating)
            .await
            .unwrap();
        let (outcome, board) = service
            .vote_ranked("climber", VoteDirection::Up, None, SortMode::Rating)
            .await
            .unwrap();

        assert!(matches!(outcome, VoteOutcome::Counted(ref r) if r.upvotes == 2));
        assert_eq!(stored(&board), vec!["climber", "leader"]);
        assert_eq!(board.mode(), SortMode::Rating);
    }

    #[tokio::test]
    async fn test_board_merges_seeded_and_stored() {
        let service = service();
        let mut fresh = remedy("fresh", 1, 0, 0);
        fresh.submitted_at = Utc::now() + Duration::seconds(1);
        service.repository.insert(&fresh).await.unwrap();

        let board = service.board(SortMode::Recency).await.unwrap();
        assert_eq!(board.remedies()[0].id, "fresh");
        assert_eq!(
            board.remedies().len(),
            catalog::seeded_remedies().len() + 1
        );
    }
}
