//! Gamified pronunciation tester
//!
//! One [`PronunciationGame`] per client session. States:
//! `Fetching -> Idle -> Listening -> Evaluating -> Result`, with `Fetching`
//! re-entered whenever the plant/language pair changes or a finished round
//! is retried.
//!
//! Every translation fetch takes a fresh request sequence number; a response
//! whose number is no longer current is dropped. A pending debounce or settle
//! timer is cancelled when newer input supersedes it and on teardown.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vaidya_common::events::{EventBus, NoticeSeverity, VaidyaEvent};
use vaidya_common::models::{Plant, TranslationResult, TribalLanguage};

use super::collaborators::{AudioClip, CollaboratorError, SpeechSynthesizer, Translator};
use super::progress::{ProgressService, LANGUAGE_PASS_POINTS};
use crate::catalog;
use crate::config::{GameTiming, MatcherKind};
use crate::error::ApiError;

// ============================================================================
// Matching
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub correct: bool,
    /// 0.0 ..= 1.0
    pub similarity: f64,
}

/// Decides whether a spoken transcript matches the target term
pub trait TranscriptMatcher: Send + Sync {
    fn score(&self, target: &str, transcript: &str) -> MatchScore;
}

/// Trimmed, case-insensitive equality
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl TranscriptMatcher for ExactMatcher {
    fn score(&self, target: &str, transcript: &str) -> MatchScore {
        let correct = target.trim().to_lowercase() == transcript.trim().to_lowercase();
        MatchScore {
            correct,
            similarity: if correct { 1.0 } else { 0.0 },
        }
    }
}

/// Normalized Levenshtein similarity over punctuation-free lowercase text
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    pub threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl TranscriptMatcher for FuzzyMatcher {
    fn score(&self, target: &str, transcript: &str) -> MatchScore {
        let target = normalize(target);
        let transcript = normalize(transcript);
        if target.is_empty() || transcript.is_empty() {
            return MatchScore {
                correct: false,
                similarity: 0.0,
            };
        }
        let similarity = strsim::normalized_levenshtein(&target, &transcript);
        MatchScore {
            correct: similarity >= self.threshold,
            similarity,
        }
    }
}

pub fn matcher_for(kind: MatcherKind) -> Arc<dyn TranscriptMatcher> {
    match kind {
        MatcherKind::Exact => Arc::new(ExactMatcher),
        MatcherKind::Fuzzy => Arc::new(FuzzyMatcher::default()),
    }
}

// ============================================================================
// Game state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Idle,
    Fetching,
    Listening,
    Evaluating,
    Result,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Fetching => "fetching",
            GameState::Listening => "listening",
            GameState::Evaluating => "evaluating",
            GameState::Result => "result",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Unknown plant {0}")]
    UnknownPlant(u32),

    #[error("Unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: GameState,
    },

    /// No usable translation to practice against
    #[error("No translation available for this plant and language")]
    NoTranslation,

    #[error("{0}")]
    CapabilityUnavailable(&'static str),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::UnknownPlant(_) => ApiError::NotFound(err.to_string()),
            GameError::UnknownLanguage(_) => ApiError::BadRequest(err.to_string()),
            GameError::InvalidState { .. } | GameError::NoTranslation => {
                ApiError::Conflict(err.to_string())
            }
            GameError::CapabilityUnavailable(msg) => ApiError::CapabilityUnavailable(msg.to_string()),
            GameError::Collaborator(e) => ApiError::Collaborator(e),
        }
    }
}

/// What the client's speech recognizer produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureReport {
    Transcript(String),
    Error(String),
}

/// Client-visible view of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub session_id: Uuid,
    pub profile_id: String,
    pub state: GameState,
    pub plant_id: u32,
    pub plant_name: String,
    pub language: String,
    pub translation: Option<TranslationResult>,
    /// Listening can start now
    pub capture_enabled: bool,
    pub transcript: Option<String>,
    pub is_correct: Option<bool>,
    pub similarity: Option<f64>,
    pub score: u64,
    pub request_seq: u64,
}

struct Inner {
    state: GameState,
    plant: &'static Plant,
    language: &'static TribalLanguage,
    translation: Option<TranslationResult>,
    transcript: Option<String>,
    outcome: Option<MatchScore>,
    score: u64,
    request_seq: u64,
    /// Pending debounce or settle timer
    timer: Option<CancellationToken>,
}

impl Inner {
    fn capture_enabled(&self) -> bool {
        self.state == GameState::Idle
            && self.translation.as_ref().is_some_and(TranslationResult::is_available)
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }

    fn reset_round(&mut self) {
        self.translation = None;
        self.transcript = None;
        self.outcome = None;
    }
}

/// Shared handles a game needs
#[derive(Clone)]
pub struct GameContext {
    pub progress: Arc<ProgressService>,
    pub events: EventBus,
    pub matcher: Arc<dyn TranscriptMatcher>,
    pub timing: GameTiming,
}

pub struct PronunciationGame {
    id: Uuid,
    profile_id: String,
    inner: Mutex<Inner>,
    translator: Arc<dyn Translator>,
    context: GameContext,
    shutdown: CancellationToken,
}

impl PronunciationGame {
    /// Create a session and start fetching the first translation
    pub async fn start(
        profile_id: &str,
        plant_id: Option<u32>,
        language: Option<&str>,
        translator: Arc<dyn Translator>,
        context: GameContext,
    ) -> Result<Arc<Self>, GameError> {
        let plant = resolve_plant(plant_id)?;
        let language = resolve_language(language)?;

        let game = Arc::new(Self {
            id: Uuid::new_v4(),
            profile_id: profile_id.to_string(),
            inner: Mutex::new(Inner {
                state: GameState::Fetching,
                plant,
                language,
                translation: None,
                transcript: None,
                outcome: None,
                score: 0,
                request_seq: 0,
                timer: None,
            }),
            translator,
            context,
            shutdown: CancellationToken::new(),
        });

        info!(
            session_id = %game.id,
            profile = %game.profile_id,
            plant = %plant.english_name,
            language = %language.name,
            "Pronunciation session started"
        );

        {
            let mut inner = game.inner.lock().await;
            game.schedule_fetch(&mut inner, Duration::ZERO);
        }
        Ok(game)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        let inner = self.inner.lock().await;
        GameSnapshot {
            session_id: self.id,
            profile_id: self.profile_id.clone(),
            state: inner.state,
            plant_id: inner.plant.id,
            plant_name: inner.plant.english_name.clone(),
            language: inner.language.name.clone(),
            translation: inner.translation.clone(),
            capture_enabled: inner.capture_enabled(),
            transcript: inner.transcript.clone(),
            is_correct: inner.outcome.map(|o| o.correct),
            similarity: inner.outcome.map(|o| o.similarity),
            score: inner.score,
            request_seq: inner.request_seq,
        }
    }

    fn set_state(&self, inner: &mut Inner, state: GameState) {
        if inner.state == state {
            return;
        }
        debug!(session_id = %self.id, from = %inner.state, to = %state, "Game state change");
        inner.state = state;
        self.context.events.emit_lossy(VaidyaEvent::GameStateChanged {
            session_id: self.id,
            state: state.as_str().to_string(),
            timestamp: Utc::now(),
        });
    }

    fn notify(&self, severity: NoticeSeverity, title: &str, description: &str) {
        self.context.events.emit_lossy(VaidyaEvent::notice(
            Some(&self.profile_id),
            severity,
            title,
            description,
        ));
    }

    /// Supersede any pending work and fetch the current pair after `delay`
    fn schedule_fetch(self: &Arc<Self>, inner: &mut Inner, delay: Duration) {
        inner.cancel_timer();
        inner.reset_round();
        inner.request_seq += 1;
        self.set_state(inner, GameState::Fetching);

        let seq = inner.request_seq;
        let plant_name = inner.plant.english_name.clone();
        let language_name = inner.language.name.clone();
        let token = self.shutdown.child_token();
        inner.timer = Some(token.clone());

        let game = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(session_id = %game.id, seq, "Translation fetch cancelled before start");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let result = game.translator.translate(&plant_name, &language_name).await;
            game.complete_fetch(seq, result).await;
        });
    }

    async fn complete_fetch(&self, seq: u64, result: Result<TranslationResult, CollaboratorError>) {
        let mut inner = self.inner.lock().await;

        if self.shutdown.is_cancelled() || seq != inner.request_seq || inner.state != GameState::Fetching
        {
            debug!(
                session_id = %self.id,
                seq,
                current = inner.request_seq,
                "Stale translation response discarded"
            );
            return;
        }

        inner.timer = None;
        let translation = match result {
            Ok(t) if t.is_available() => t,
            Ok(_) => TranslationResult::not_available(),
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Translation failed");
                self.notify(
                    NoticeSeverity::Error,
                    "Translation Failed",
                    "Could not fetch the translation for the selected language.",
                );
                TranslationResult::not_available()
            }
        };
        inner.translation = Some(translation);
        self.set_state(&mut inner, GameState::Idle);
    }

    /// Change the plant/language pair; the fetch is debounced
    pub async fn select(
        self: &Arc<Self>,
        plant_id: Option<u32>,
        language: Option<&str>,
    ) -> Result<GameSnapshot, GameError> {
        {
            let mut inner = self.inner.lock().await;
            let plant = match plant_id {
                Some(id) => resolve_plant(Some(id))?,
                None => inner.plant,
            };
            let language = match language {
                Some(name) => resolve_language(Some(name))?,
                None => inner.language,
            };

            inner.plant = plant;
            inner.language = language;
            let delay = self.context.timing.debounce;
            self.schedule_fetch(&mut inner, delay);
        }
        Ok(self.snapshot().await)
    }

    /// Start listening; requires a usable translation and speech capture
    pub async fn listen(&self, speech_capture_supported: bool) -> Result<GameSnapshot, GameError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != GameState::Idle {
                return Err(GameError::InvalidState {
                    action: "listen",
                    state: inner.state,
                });
            }
            if !inner.capture_enabled() {
                return Err(GameError::NoTranslation);
            }
            if !speech_capture_supported {
                self.notify(
                    NoticeSeverity::Error,
                    "Browser not supported",
                    "Speech recognition is not supported in your browser. Try Chrome.",
                );
                return Err(GameError::CapabilityUnavailable(
                    "Speech recognition is not supported on this client",
                ));
            }

            inner.transcript = None;
            inner.outcome = None;
            self.set_state(&mut inner, GameState::Listening);
        }
        Ok(self.snapshot().await)
    }

    /// Stop listening without a result
    pub async fn stop(&self) -> Result<GameSnapshot, GameError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != GameState::Listening {
                return Err(GameError::InvalidState {
                    action: "stop",
                    state: inner.state,
                });
            }
            self.set_state(&mut inner, GameState::Idle);
        }
        Ok(self.snapshot().await)
    }

    /// Accept the recognizer's result and evaluate after the settle delay
    pub async fn capture(self: &Arc<Self>, report: CaptureReport) -> Result<GameSnapshot, GameError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != GameState::Listening {
                return Err(GameError::InvalidState {
                    action: "capture",
                    state: inner.state,
                });
            }

            match report {
                CaptureReport::Error(reason) => {
                    warn!(session_id = %self.id, reason = %reason, "Speech recognition error");
                    self.notify(
                        NoticeSeverity::Error,
                        "Recognition Error",
                        "Could not understand audio. Please try again.",
                    );
                    self.set_state(&mut inner, GameState::Idle);
                }
                CaptureReport::Transcript(transcript) => {
                    inner.transcript = Some(transcript);
                    self.set_state(&mut inner, GameState::Evaluating);
                    self.schedule_evaluation(&mut inner);
                }
            }
        }
        Ok(self.snapshot().await)
    }

    fn schedule_evaluation(self: &Arc<Self>, inner: &mut Inner) {
        inner.cancel_timer();
        let seq = inner.request_seq;
        let token = self.shutdown.child_token();
        inner.timer = Some(token.clone());
        let settle = self.context.timing.settle;

        let game = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(session_id = %game.id, "Evaluation cancelled");
                }
                _ = tokio::time::sleep(settle) => {
                    game.finish_evaluation(seq).await;
                }
            }
        });
    }

    async fn finish_evaluation(&self, seq: u64) {
        let (plant_id, passed, similarity) = {
            let mut inner = self.inner.lock().await;
            if self.shutdown.is_cancelled()
                || seq != inner.request_seq
                || inner.state != GameState::Evaluating
            {
                return;
            }
            inner.timer = None;

            let target = inner
                .translation
                .as_ref()
                .map(|t| t.translated_name.clone())
                .unwrap_or_default();
            let transcript = inner.transcript.clone().unwrap_or_default();
            let outcome = self.context.matcher.score(&target, &transcript);

            inner.outcome = Some(outcome);
            if outcome.correct {
                inner.score += LANGUAGE_PASS_POINTS;
            }
            info!(
                session_id = %self.id,
                target = %target,
                transcript = %transcript,
                correct = outcome.correct,
                "Pronunciation evaluated"
            );
            self.set_state(&mut inner, GameState::Result);
            (inner.plant.id, outcome.correct, outcome.similarity)
        };

        if passed {
            let score = (similarity * 100.0).round() as u32;
            if let Err(e) = self
                .context
                .progress
                .record_language_pass(&self.profile_id, &plant_id.to_string(), score)
                .await
            {
                warn!(session_id = %self.id, error = %e, "Could not record pronunciation pass");
                self.notify(
                    NoticeSeverity::Error,
                    "Progress Not Saved",
                    "Your points could not be saved. Please try again.",
                );
            }
        }
    }

    /// Pick a random different plant/language pair and fetch it
    pub async fn try_another(self: &Arc<Self>) -> Result<GameSnapshot, GameError> {
        {
            let mut inner = self.inner.lock().await;
            if !matches!(inner.state, GameState::Result | GameState::Idle) {
                return Err(GameError::InvalidState {
                    action: "try another",
                    state: inner.state,
                });
            }
            let (plant, language) = random_pair(inner.plant.id, inner.language.id);
            inner.plant = plant;
            inner.language = language;
            self.schedule_fetch(&mut inner, Duration::ZERO);
        }
        Ok(self.snapshot().await)
    }

    /// Fetch the same plant/language pair again for another attempt
    pub async fn retry(self: &Arc<Self>) -> Result<GameSnapshot, GameError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != GameState::Result {
                return Err(GameError::InvalidState {
                    action: "retry",
                    state: inner.state,
                });
            }
            self.schedule_fetch(&mut inner, Duration::ZERO);
        }
        Ok(self.snapshot().await)
    }

    /// Render the current translated name as audio
    pub async fn speak(
        &self,
        speech: Option<&Arc<dyn SpeechSynthesizer>>,
    ) -> Result<AudioClip, GameError> {
        let text = {
            let inner = self.inner.lock().await;
            match inner.translation.as_ref().filter(|t| t.is_available()) {
                Some(t) => t.translated_name.clone(),
                None => return Err(GameError::NoTranslation),
            }
        };

        let Some(speech) = speech else {
            return Err(GameError::CapabilityUnavailable("Text-to-speech is not configured"));
        };

        speech.speak(&text).await.map_err(|e| {
            warn!(session_id = %self.id, error = %e, "Speech synthesis failed");
            self.notify(NoticeSeverity::Error, "Audio Error", "Could not play audio.");
            GameError::from(e)
        })
    }

    /// Cancel every pending timer; late responses are ignored afterwards
    pub async fn teardown(&self) {
        self.shutdown.cancel();
        let mut inner = self.inner.lock().await;
        inner.timer = None;
        self.set_state(&mut inner, GameState::Idle);
        info!(session_id = %self.id, "Pronunciation session ended");
    }
}

fn resolve_plant(plant_id: Option<u32>) -> Result<&'static Plant, GameError> {
    match plant_id {
        Some(id) => catalog::plant_by_id(id).ok_or(GameError::UnknownPlant(id)),
        None => catalog::plants().first().ok_or(GameError::UnknownPlant(0)),
    }
}

fn resolve_language(name: Option<&str>) -> Result<&'static TribalLanguage, GameError> {
    match name {
        Some(name) => {
            catalog::language_by_name(name).ok_or_else(|| GameError::UnknownLanguage(name.to_string()))
        }
        None => catalog::tribal_languages()
            .first()
            .ok_or_else(|| GameError::UnknownLanguage(String::new())),
    }
}

/// A random catalog pair other than the current one when possible
fn random_pair(plant_id: u32, language_id: u32) -> (&'static Plant, &'static TribalLanguage) {
    let plants = catalog::plants();
    let languages = catalog::tribal_languages();
    let pairs: Vec<(&'static Plant, &'static TribalLanguage)> = plants
        .iter()
        .flat_map(|p| languages.iter().map(move |l| (p, l)))
        .filter(|(p, l)| p.id != plant_id || l.id != language_id)
        .collect();

    let mut rng = rand::thread_rng();
    match pairs.choose(&mut rng) {
        Some(pair) => *pair,
        None => (&plants[0], &languages[0]),
    }
}

// ============================================================================
// Session registry
// ============================================================================

/// Sessions untouched for this long are torn down by the sweeper
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct SessionEntry {
    game: Arc<PronunciationGame>,
    last_access: Instant,
}

/// Live sessions keyed by id
#[derive(Clone, Default)]
pub struct GameSessions {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl GameSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, game: Arc<PronunciationGame>) {
        let entry = SessionEntry {
            game: game.clone(),
            last_access: Instant::now(),
        };
        self.sessions.write().await.insert(game.id(), entry);
    }

    /// Look up a session and mark it as used
    pub async fn get(&self, id: Uuid) -> Option<Arc<PronunciationGame>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_access = Instant::now();
        Some(entry.game.clone())
    }

    /// Remove and tear down; false when unknown
    pub async fn remove(&self, id: Uuid) -> bool {
        let entry = self.sessions.write().await.remove(&id);
        match entry {
            Some(entry) => {
                entry.game.teardown().await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Tear down sessions idle for longer than `ttl`; returns how many
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let expired: Vec<Arc<PronunciationGame>> = {
            let mut sessions = self.sessions.write().await;
            let now = Instant::now();
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, entry)| now.duration_since(entry.last_access) > ttl)
                .map(|(id, _)| *id)
                .collect();
            ids.iter()
                .filter_map(|id| sessions.remove(id))
                .map(|entry| entry.game)
                .collect()
        };

        for game in &expired {
            debug!(session_id = %game.id(), "Expiring idle pronunciation session");
            game.teardown().await;
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Idle pronunciation sessions removed");
        }
        expired.len()
    }

    /// Run `sweep_idle` every `every` until `token` is cancelled
    pub fn spawn_sweeper(
        &self,
        ttl: Duration,
        every: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        sessions.sweep_idle(ttl).await;
                    }
                }
            }
            debug!("Session sweeper stopped");
        })
    }

    pub async fn teardown_all(&self) {
        let games: Vec<_> = self
            .sessions
            .write()
            .await
            .drain()
            .map(|(_, entry)| entry.game)
            .collect();
        for game in games {
            game.teardown().await;
        }
    }
}
