//! Shared fixtures for vaidya-hub integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;
use vaidya_common::events::{EventBus, VaidyaEvent};
use vaidya_common::models::{IdentificationResult, TranslationResult};
use vaidya_common::{Error, Result};
use vaidya_hub::config::{GameTiming, HubConfig};
use vaidya_hub::services::collaborators::{
    AudioClip, CollaboratorError, KnowledgeChat, PlantIdentifier, RemedySuggester,
    RemedySuggestion, RemedyVerifier, SpeechSynthesizer, Translator, Verdict,
    VerificationRequest,
};
use vaidya_hub::services::pronunciation::{matcher_for, GameContext};
use vaidya_hub::services::{Collaborators, ProgressService};
use vaidya_hub::store::{KeyValueStore, MemoryKvStore, TypedStore};
use vaidya_hub::AppState;

// ============================================================================
// Fake collaborators
// ============================================================================

#[derive(Clone)]
pub enum Reply {
    Name(&'static str),
    Fail,
}

/// Translator with a scripted reply and delay per (plant, language)
///
/// Unscripted pairs answer "Not Available" immediately.
#[derive(Default)]
pub struct FakeTranslator {
    replies: Mutex<HashMap<(String, String), (Reply, Duration)>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeTranslator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, plant: &str, language: &str, reply: Reply, delay: Duration) {
        self.replies
            .lock()
            .unwrap()
            .insert((plant.to_string(), language.to_string()), (reply, delay));
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(
        &self,
        plant_name: &str,
        language_name: &str,
    ) -> std::result::Result<TranslationResult, CollaboratorError> {
        self.calls
            .lock()
            .unwrap()
            .push((plant_name.to_string(), language_name.to_string()));
        let scripted = self
            .replies
            .lock()
            .unwrap()
            .get(&(plant_name.to_string(), language_name.to_string()))
            .cloned();

        match scripted {
            Some((reply, delay)) => {
                tokio::time::sleep(delay).await;
                match reply {
                    Reply::Name(name) => Ok(TranslationResult {
                        translated_name: name.to_string(),
                        pronunciation: name.to_lowercase(),
                    }),
                    Reply::Fail => Err(CollaboratorError::NetworkError("offline".to_string())),
                }
            }
            None => Ok(TranslationResult::not_available()),
        }
    }
}

/// Verifier returning a fixed verdict, or failing when none is set
pub struct FakeVerifier {
    verdict: Mutex<Option<Verdict>>,
    calls: Mutex<Vec<VerificationRequest>>,
}

impl FakeVerifier {
    pub fn plausible() -> Arc<Self> {
        Self::with(Some(Verdict {
            is_plausible: true,
            notes: "Consistent with traditional use.".to_string(),
        }))
    }

    pub fn implausible(notes: &str) -> Arc<Self> {
        Self::with(Some(Verdict {
            is_plausible: false,
            notes: notes.to_string(),
        }))
    }

    pub fn failing() -> Arc<Self> {
        Self::with(None)
    }

    fn with(verdict: Option<Verdict>) -> Arc<Self> {
        Arc::new(Self {
            verdict: Mutex::new(verdict),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RemedyVerifier for FakeVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> std::result::Result<Verdict, CollaboratorError> {
        self.calls.lock().unwrap().push(request.clone());
        self.verdict
            .lock()
            .unwrap()
            .clone()
            .ok_or(CollaboratorError::ApiError(500, "verification down".to_string()))
    }
}

pub struct FakeIdentifier(pub IdentificationResult);

impl FakeIdentifier {
    pub fn neem() -> Arc<Self> {
        Arc::new(Self(IdentificationResult {
            is_plant: true,
            common_name: "Neem".to_string(),
            scientific_name: "Azadirachta indica".to_string(),
            family: "Meliaceae".to_string(),
            other_names: vec!["Indian Lilac".to_string()],
            description: "Evergreen tree".to_string(),
            is_medicinal: true,
            is_poisonous: false,
            medicinal_uses: "Skin conditions".to_string(),
            warnings: String::new(),
        }))
    }

    pub fn not_a_plant() -> Arc<Self> {
        Arc::new(Self(IdentificationResult {
            is_plant: false,
            common_name: String::new(),
            scientific_name: String::new(),
            family: String::new(),
            other_names: Vec::new(),
            description: String::new(),
            is_medicinal: false,
            is_poisonous: false,
            medicinal_uses: String::new(),
            warnings: String::new(),
        }))
    }
}

#[async_trait]
impl PlantIdentifier for FakeIdentifier {
    async fn identify(
        &self,
        _photo_data_uri: &str,
    ) -> std::result::Result<IdentificationResult, CollaboratorError> {
        Ok(self.0.clone())
    }
}

pub struct FakeChat;

#[async_trait]
impl KnowledgeChat for FakeChat {
    async fn answer(&self, query: &str) -> std::result::Result<String, CollaboratorError> {
        Ok(format!("About {}: consult a practitioner.", query))
    }
}

pub struct FakeSuggester;

#[async_trait]
impl RemedySuggester for FakeSuggester {
    async fn suggest(
        &self,
        plant_name: &str,
        _photo_data_uri: &str,
    ) -> std::result::Result<RemedySuggestion, CollaboratorError> {
        Ok(RemedySuggestion {
            suggested_description: format!("Leaves of {} boiled in water.", plant_name),
            suggested_effectiveness: 3,
        })
    }
}

pub struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn speak(&self, _text: &str) -> std::result::Result<AudioClip, CollaboratorError> {
        Ok(AudioClip {
            media: "data:audio/wav;base64,UklGRg==".to_string(),
        })
    }
}

pub fn collaborators(
    translator: Arc<FakeTranslator>,
    verifier: Arc<FakeVerifier>,
    identifier: Arc<FakeIdentifier>,
) -> Collaborators {
    Collaborators {
        identifier,
        chat: Arc::new(FakeChat),
        translator,
        verifier,
        suggester: Arc::new(FakeSuggester),
        speech: Some(Arc::new(FakeSpeech)),
    }
}

// ============================================================================
// Stores
// ============================================================================

/// Memory store whose writes fail for keys starting with `prefix`
pub struct FailingKvStore {
    inner: MemoryKvStore,
    prefix: String,
}

impl FailingKvStore {
    pub fn failing_writes(prefix: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryKvStore::new(),
            prefix: prefix.to_string(),
        })
    }
}

#[async_trait]
impl KeyValueStore for FailingKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if key.starts_with(&self.prefix) {
            return Err(Error::Internal(format!("write refused for {}", key)));
        }
        self.inner.set(key, value).await
    }
}

// ============================================================================
// Game fixtures
// ============================================================================

pub fn fast_timing() -> GameTiming {
    GameTiming {
        debounce: Duration::from_millis(20),
        settle: Duration::from_millis(20),
    }
}

/// Memory-backed game context with the default matcher and timing
pub fn game_context(events: EventBus) -> (GameContext, Arc<ProgressService>) {
    let config = HubConfig::default();
    let progress = Arc::new(ProgressService::new(
        TypedStore::new(Arc::new(MemoryKvStore::new())),
        events.clone(),
    ));
    let context = GameContext {
        progress: progress.clone(),
        events,
        matcher: matcher_for(config.matcher),
        timing: config.game_timing,
    };
    (context, progress)
}

/// Every notice title currently queued on `rx`
pub fn drain_notice_titles(
    rx: &mut tokio::sync::broadcast::Receiver<VaidyaEvent>,
) -> Vec<String> {
    let mut titles = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let VaidyaEvent::Notice { title, .. } = event {
            titles.push(title);
        }
    }
    titles
}

// ============================================================================
// HTTP fixtures
// ============================================================================

pub struct TestApp {
    pub state: AppState,
    pub translator: Arc<FakeTranslator>,
    pub verifier: Arc<FakeVerifier>,
}

impl TestApp {
    /// In-memory database, fake collaborators, short game timings
    pub async fn new(verifier: Arc<FakeVerifier>) -> Self {
        let db = vaidya_common::db::init_memory_database()
            .await
            .expect("Failed to create in-memory database");
        let translator = FakeTranslator::new();
        let config = HubConfig {
            game_timing: fast_timing(),
            ..HubConfig::default()
        };
        let state = AppState::new(
            db,
            EventBus::new(100),
            config,
            collaborators(translator.clone(), verifier.clone(), FakeIdentifier::neem()),
        );
        Self {
            state,
            translator,
            verifier,
        }
    }

    /// Send one request through a fresh router
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let app = vaidya_hub::build_router(self.state.clone());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }
}

/// Smallest byte sequence sniffed as PNG
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ]
}

pub fn png_data_uri() -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png_bytes())
    )
}
