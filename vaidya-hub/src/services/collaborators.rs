//! External collaborator interfaces
//!
//! Every AI capability the hub depends on sits behind one of these traits so
//! workflows can run against [`GenAiClient`](super::genai::GenAiClient) in
//! production and against fakes in tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vaidya_common::models::{IdentificationResult, TranslationResult};

/// Collaborator client errors
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// The model returned no usable candidate
    #[error("Empty response")]
    EmptyResponse,

    /// No API key has been configured
    #[error("AI service not configured")]
    NotConfigured,
}

/// Input of the remedy verification collaborator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub plant_name: String,
    pub remedy_description: String,
    pub language: String,
    pub effectiveness_rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_data_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_plausible: bool,
    #[serde(default, alias = "verificationNotes")]
    pub notes: String,
}

/// AI-drafted remedy for a photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedySuggestion {
    pub suggested_description: String,
    pub suggested_effectiveness: u8,
}

/// Playable audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioClip {
    /// `data:audio/wav;base64,...`
    pub media: String,
}

#[async_trait]
pub trait PlantIdentifier: Send + Sync {
    async fn identify(&self, photo_data_uri: &str)
        -> Result<IdentificationResult, CollaboratorError>;
}

#[async_trait]
pub trait KnowledgeChat: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Unknown names come back as the "Not Available" sentinel
    async fn translate(
        &self,
        plant_name: &str,
        language_name: &str,
    ) -> Result<TranslationResult, CollaboratorError>;
}

#[async_trait]
pub trait RemedyVerifier: Send + Sync {
    async fn verify(&self, request: &VerificationRequest) -> Result<Verdict, CollaboratorError>;
}

#[async_trait]
pub trait RemedySuggester: Send + Sync {
    async fn suggest(
        &self,
        plant_name: &str,
        photo_data_uri: &str,
    ) -> Result<RemedySuggestion, CollaboratorError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> Result<AudioClip, CollaboratorError>;
}

/// Handles to every collaborator the workflows use
///
/// Speech synthesis is optional: `None` means the capability is absent.
#[derive(Clone)]
pub struct Collaborators {
    pub identifier: Arc<dyn PlantIdentifier>,
    pub chat: Arc<dyn KnowledgeChat>,
    pub translator: Arc<dyn Translator>,
    pub verifier: Arc<dyn RemedyVerifier>,
    pub suggester: Arc<dyn RemedySuggester>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Collaborators {
    /// Every call fails with [`CollaboratorError::NotConfigured`]
    pub fn unconfigured() -> Self {
        let unconfigured = Arc::new(Unconfigured);
        Self {
            identifier: unconfigured.clone(),
            chat: unconfigured.clone(),
            translator: unconfigured.clone(),
            verifier: unconfigured.clone(),
            suggester: unconfigured,
            speech: None,
        }
    }

    /// All capabilities served by one generative-language client
    pub fn from_genai(client: Arc<super::genai::GenAiClient>) -> Self {
        Self {
            identifier: client.clone(),
            chat: client.clone(),
            translator: client.clone(),
            verifier: client.clone(),
            suggester: client.clone(),
            speech: Some(client),
        }
    }
}

/// Stand-in used until an API key is configured
struct Unconfigured;

#[async_trait]
impl PlantIdentifier for Unconfigured {
    async fn identify(&self, _: &str) -> Result<IdentificationResult, CollaboratorError> {
        Err(CollaboratorError::NotConfigured)
    }
}

#[async_trait]
impl KnowledgeChat for Unconfigured {
    async fn answer(&self, _: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::NotConfigured)
    }
}

#[async_trait]
impl Translator for Unconfigured {
    async fn translate(&self, _: &str, _: &str) -> Result<TranslationResult, CollaboratorError> {
        Err(CollaboratorError::NotConfigured)
    }
}

#[async_trait]
impl RemedyVerifier for Unconfigured {
    async fn verify(&self, _: &VerificationRequest) -> Result<Verdict, CollaboratorError> {
        Err(CollaboratorError::NotConfigured)
    }
}

#[async_trait]
impl RemedySuggester for Unconfigured {
    async fn suggest(&self, _: &str, _: &str) -> Result<RemedySuggestion, CollaboratorError> {
        Err(CollaboratorError::NotConfigured)
    }
}
